use crate::objects::segment::ShapeSegment;
use crate::ray::LightRay;
use crate::scene::{ShapeAttributes, ShapeId};
use crate::vec2::{Point, Vec2};

/// Where a ray met a primitive.
///
/// `edge` is the struck line segment for primitives made of segments
/// (walls, polygon edges); circles have none. Keeping it in the record lets
/// normal selection reuse the intersection's work instead of re-finding the
/// edge.
#[derive(Debug, Clone)]
pub struct Hit {
    pub point: Point,
    pub distance_squared: f64,
    pub edge: Option<ShapeSegment>,
}

/// The pair of unit normals at a hit. The reflection normal points into the
/// half-plane the incoming ray arrived from; the refraction normal is its
/// opposite, pointing into the material a transmitted ray continues into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceNormals {
    pub reflection: Vec2,
    pub refraction: Vec2,
}

/// An object a ray can interact with. Implementations must be usable from
/// several tracer threads at once over a shared layout.
pub trait Traceable: Send + Sync {
    fn id(&self) -> ShapeId;

    fn attributes(&self) -> &ShapeAttributes;

    /// The nearest forward intersection of `ray` with this primitive, if any.
    fn intersect(&self, ray: &LightRay) -> Option<Hit>;

    /// Reflection/refraction normals for a hit previously returned by
    /// [`Traceable::intersect`] on the same ray.
    fn normals(&self, ray: &LightRay, hit: &Hit) -> SurfaceNormals;

    /// Whether `point` lies inside this primitive's volume. Primitives
    /// without a volume always answer no.
    fn contains(&self, point: Point) -> bool;
}

/// Picks the reflection normal as whichever of the segment's two outward
/// normals faces the incoming ray (within a quarter turn of its reverse);
/// the other becomes the refraction normal. Shared by walls and polygons.
pub(crate) fn segment_normals(segment: &ShapeSegment, ray: &LightRay) -> SurfaceNormals {
    let (a, b) = segment.normal_pair();
    let reverse = -ray.direction;
    if a.dot(&reverse) >= 0.0 {
        SurfaceNormals {
            reflection: a,
            refraction: b,
        }
    } else {
        SurfaceNormals {
            reflection: b,
            refraction: a,
        }
    }
}
