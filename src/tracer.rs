use crate::fresnel;
use crate::objects::{Hit, Traceable, Wall};
use crate::queue::BoundedQueue;
use crate::ray::{LightRay, LightSegment};
use crate::scene::{ShapeAttributes, SimulationLayout, SimulationSize};
use crate::utils::{random, PI};
use crate::vec2::{Point, Vec2};
use rand::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Rays whose channel sum falls below this aren't worth tracing further.
const DIM_RAY_CUTOFF: u32 = 50;

/// Distance a ray origin is advanced along its direction when re-testing
/// the surface it was spawned from, so it can't re-hit that surface at
/// distance zero.
const SURFACE_NUDGE: f64 = 0.1;

/// Distance past a hit point sampled to decide which medium a transmitted
/// ray enters.
const MEDIUM_PROBE_STEP: f64 = 0.1;

/// Widest diffuse perturbation, reached at diffusion = 1.
const MAX_DIFFUSE_ANGLE: f64 = PI / 8.0;

/// Keeps diffusely scattered rays from grazing along the surface itself.
const TANGENT_MARGIN: f64 = 0.1;

/// Absorption at or above this on every channel ends the ray outright.
const OPAQUE_ABSORPTION: f64 = 0.99;

/// Cooperative cancellation flag shared between the simulator and its
/// in-flight tracer jobs. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> CancellationToken {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Traces rays through `layout` until `segments_to_trace` lit segments have
/// been produced or `cancel` fires, and returns the segments.
///
/// Pure over its inputs: the layout is only read, so any number of
/// invocations may run concurrently against the same layout. On
/// cancellation whatever has been accumulated so far is returned; the
/// caller decides whether to keep it.
///
/// # Panics
///
/// Panics if the layout has no lights. Callers reset the grid to black
/// instead of tracing an empty scene.
pub fn trace(
    layout: &SimulationLayout,
    size: SimulationSize,
    segments_to_trace: usize,
    cancel: &CancellationToken,
) -> Vec<LightSegment> {
    assert!(
        !layout.lights.is_empty(),
        "tracing a layout with no lights is a caller bug"
    );

    let containment = containment_walls(size);
    let mut shapes: Vec<&dyn Traceable> = Vec::with_capacity(
        containment.len() + layout.walls.len() + layout.circles.len() + layout.polygons.len(),
    );
    // Containment always sits ahead of user primitives.
    for wall in &containment {
        shapes.push(wall);
    }
    for wall in &layout.walls {
        shapes.push(wall);
    }
    for circle in &layout.circles {
        shapes.push(circle);
    }
    for polygon in &layout.polygons {
        shapes.push(polygon);
    }

    let mut segments = Vec::with_capacity(segments_to_trace);
    let mut pending = BoundedQueue::new(segments_to_trace);

    while segments.len() < segments_to_trace {
        if cancel.is_cancelled() {
            break;
        }

        // Bounce and refraction rays first; mint a fresh root ray off a
        // light only when none are pending.
        let ray = match pending.pop() {
            Some(ray) => ray,
            None => root_ray(layout),
        };

        if ray.color.aggregate() < DIM_RAY_CUTOFF {
            continue;
        }
        if !inside_simulation(ray.origin, size) {
            continue;
        }

        let Some((hit, shape)) = closest_intersection(&ray, &shapes) else {
            continue;
        };

        segments.push(LightSegment::new(ray.origin, hit.point, ray.color));

        let attrs = shape.attributes();
        if attrs.absorption.r >= OPAQUE_ABSORPTION
            && attrs.absorption.g >= OPAQUE_ABSORPTION
            && attrs.absorption.b >= OPAQUE_ABSORPTION
        {
            continue;
        }
        let color_after_absorption = ray.color.attenuated(&attrs.absorption.complement());

        let normals = shape.normals(&ray, &hit);
        let reverse = -ray.direction;
        let incoming_angle = normals.reflection.signed_angle_to(&reverse);

        let reflected_direction = reflect(reverse, incoming_angle, attrs.diffusion);

        let mut reflected_color = color_after_absorption;
        let mut refracted = None;
        if attrs.translucent {
            let probe = hit.point.advanced(&ray.direction, MEDIUM_PROBE_STEP);
            let new_medium = medium_at(layout, probe);
            let n_from = ray.medium.index_of_refraction;
            let n_to = new_medium.index_of_refraction;

            let percent_reflected = fresnel::reflectance(incoming_angle, n_from, n_to);
            let refracted_angle = fresnel::refraction_angle(incoming_angle, n_from, n_to);

            reflected_color = color_after_absorption.scaled(percent_reflected);
            refracted = Some(LightRay::new(
                Some(shape.id()),
                hit.point,
                normals.refraction.rotated(refracted_angle),
                color_after_absorption.scaled(1.0 - percent_reflected),
                new_medium,
            ));
        }

        pending.push(LightRay::new(
            Some(shape.id()),
            hit.point,
            reflected_direction,
            reflected_color,
            ray.medium.clone(),
        ));
        if let Some(ray) = refracted {
            pending.push(ray);
        }
    }

    segments
}

/// Four fully absorbing walls inset one pixel from the simulation border.
/// They are not part of the layout; every scene is enclosed by them.
fn containment_walls(size: SimulationSize) -> [Wall; 4] {
    let min = 1.0;
    let max_x = (size.width - 2) as f64;
    let max_y = (size.height - 2) as f64;
    [
        Wall::new(
            Point::new(min, min),
            Point::new(max_x, min),
            ShapeAttributes::fully_absorbing(),
        ),
        Wall::new(
            Point::new(max_x, min),
            Point::new(max_x, max_y),
            ShapeAttributes::fully_absorbing(),
        ),
        Wall::new(
            Point::new(max_x, max_y),
            Point::new(min, max_y),
            ShapeAttributes::fully_absorbing(),
        ),
        Wall::new(
            Point::new(min, max_y),
            Point::new(min, min),
            ShapeAttributes::fully_absorbing(),
        ),
    ]
}

fn inside_simulation(point: Point, size: SimulationSize) -> bool {
    point.x >= 1.0
        && point.x <= (size.width - 2) as f64
        && point.y >= 1.0
        && point.y <= (size.height - 2) as f64
}

/// A fresh ray off a randomly chosen light, aimed uniformly around the
/// unit circle, travelling in free space.
fn root_ray(layout: &SimulationLayout) -> LightRay {
    let light = &layout.lights[thread_rng().gen_range(0..layout.lights.len())];
    LightRay::new(
        None,
        light.pos,
        Vec2::from_angle(random(0.0, 2.0 * PI)),
        light.color,
        ShapeAttributes::free_space(),
    )
}

/// Intersects the ray against every shape and keeps the nearest hit by
/// squared distance (ties go to the earlier shape). The shape the ray was
/// spawned from is tested with a nudged origin so the ray can't re-hit it
/// where it started.
fn closest_intersection<'a>(
    ray: &LightRay,
    shapes: &[&'a dyn Traceable],
) -> Option<(Hit, &'a dyn Traceable)> {
    let mut closest: Option<(Hit, &'a dyn Traceable)> = None;
    for &shape in shapes {
        let hit = if ray.source_id == Some(shape.id()) {
            let mut nudged = ray.clone();
            nudged.origin = ray.origin.advanced(&ray.direction, SURFACE_NUDGE);
            shape.intersect(&nudged)
        } else {
            shape.intersect(ray)
        };
        if let Some(mut hit) = hit {
            hit.distance_squared = ray.origin.distance_squared_to(&hit.point);
            let closer = match &closest {
                Some((best, _)) => hit.distance_squared < best.distance_squared,
                None => true,
            };
            if closer {
                closest = Some((hit, shape));
            }
        }
    }
    closest
}

/// Mirror reflection of the reversed incoming direction, optionally
/// perturbed by a uniform diffuse offset. The offset is clamped so the
/// scattered ray stays clear of the surface tangent.
fn reflect(reverse: Vec2, incoming_angle: f64, diffusion: f64) -> Vec2 {
    let mirror = reverse.rotated(-2.0 * incoming_angle);
    if diffusion <= 0.0 {
        return mirror;
    }
    let tangent_gap = PI / 2.0 - incoming_angle.abs() - TANGENT_MARGIN;
    let limit = f64::max(f64::min(MAX_DIFFUSE_ANGLE * diffusion, tangent_gap), 0.0);
    mirror.rotated(random(-limit, limit))
}

/// The medium a transmitted ray enters: the attributes of the first
/// translucent shape containing the probe point, or free space.
fn medium_at(layout: &SimulationLayout, probe: Point) -> ShapeAttributes {
    for circle in &layout.circles {
        if circle.attributes().translucent && circle.contains(probe) {
            return circle.attributes().clone();
        }
    }
    for polygon in &layout.polygons {
        if polygon.attributes().translucent && polygon.contains(probe) {
            return polygon.attributes().clone();
        }
    }
    ShapeAttributes::free_space()
}
