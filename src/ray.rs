use crate::color::LightColor;
use crate::scene::{ShapeAttributes, ShapeId};
use crate::vec2::{Point, Vec2};

/// A ray in flight inside the tracer. `direction` is always unit length.
///
/// `source_id` remembers the surface the ray was spawned from so the
/// intersection pass can nudge the origin off that surface instead of
/// re-hitting it at distance zero. `medium` carries the attributes of the
/// volume the ray is currently travelling through (free space unless the
/// ray refracted into a translucent shape).
#[derive(Debug, Clone)]
pub struct LightRay {
    pub source_id: Option<ShapeId>,
    pub origin: Point,
    pub direction: Vec2,
    pub color: LightColor,
    pub medium: ShapeAttributes,
}

impl LightRay {
    pub fn new(
        source_id: Option<ShapeId>,
        origin: Point,
        direction: Vec2,
        color: LightColor,
        medium: ShapeAttributes,
    ) -> LightRay {
        debug_assert!(direction.length_squared() > 0.0, "ray direction must be non-zero");
        LightRay {
            source_id,
            origin,
            direction,
            color,
            medium,
        }
    }
}

/// One traced, lit line segment: the tracer's unit of output and the
/// grid's unit of input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSegment {
    pub p1: Point,
    pub p2: Point,
    pub color: LightColor,
}

impl LightSegment {
    pub fn new(p1: Point, p2: Point, color: LightColor) -> LightSegment {
        LightSegment { p1, p2, color }
    }
}
