use crate::color::{FractionalLightColor, LightColor};
use crate::objects::{CircleShape, PolygonShape, Wall};
use crate::vec2::Point;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of a scene primitive. Strictly increasing for the lifetime of
/// the process; used by rays to remember which surface they just left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeId(u64);

static NEXT_SHAPE_ID: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(1));

/// Allocates the next shape id. Wraparound would take longer than the
/// machine will live; ids stay strictly increasing.
pub fn next_shape_id() -> ShapeId {
    ShapeId(NEXT_SHAPE_ID.fetch_add(1, Ordering::SeqCst))
}

/// Optical surface and volume attributes of a scene primitive. Free space
/// is represented by the same type with an index of refraction of 1.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeAttributes {
    /// Fraction of each channel absorbed at every hit.
    pub absorption: FractionalLightColor,
    /// Maximum angular perturbation at reflection, in [0, 1].
    /// 0 is a perfect mirror.
    pub diffusion: f64,
    /// Refractive index; >= 1, free space is exactly 1.
    pub index_of_refraction: f64,
    /// Whether refracted rays are spawned at this surface.
    pub translucent: bool,
}

impl ShapeAttributes {
    /// The medium rays travel through when inside no shape.
    pub fn free_space() -> ShapeAttributes {
        ShapeAttributes {
            absorption: FractionalLightColor::NONE,
            diffusion: 0.0,
            index_of_refraction: 1.0,
            translucent: false,
        }
    }

    /// A surface that terminates every ray it meets. Used for the
    /// containment walls around the simulation area.
    pub fn fully_absorbing() -> ShapeAttributes {
        ShapeAttributes {
            absorption: FractionalLightColor::FULL,
            diffusion: 0.0,
            index_of_refraction: 1.0,
            translucent: false,
        }
    }
}

/// A point light source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub pos: Point,
    pub color: LightColor,
}

impl Light {
    pub fn new(pos: Point, color: LightColor) -> Light {
        Light { pos, color }
    }
}

/// Dimensions of the simulation area in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationSize {
    pub width: u32,
    pub height: u32,
}

impl SimulationSize {
    pub fn new(width: u32, height: u32) -> SimulationSize {
        SimulationSize { width, height }
    }
}

/// A complete description of the scene at one instant. Immutable once
/// built; the editor constructs a fresh layout (with a larger version) for
/// every scene change, and concurrent tracers share it read-only.
///
/// The version is how stale work is detected: the grid refuses batches
/// traced against a layout older than the newest one it has seen.
#[derive(Debug, Clone)]
pub struct SimulationLayout {
    pub version: u64,
    pub lights: Vec<Light>,
    pub walls: Vec<Wall>,
    pub circles: Vec<CircleShape>,
    pub polygons: Vec<PolygonShape>,
}

impl SimulationLayout {
    pub fn new(
        version: u64,
        lights: Vec<Light>,
        walls: Vec<Wall>,
        circles: Vec<CircleShape>,
        polygons: Vec<PolygonShape>,
    ) -> SimulationLayout {
        SimulationLayout {
            version,
            lights,
            walls,
            circles,
            polygons,
        }
    }

    /// A scene with nothing in it, not even lights.
    pub fn empty(version: u64) -> SimulationLayout {
        SimulationLayout::new(version, vec![], vec![], vec![], vec![])
    }
}
