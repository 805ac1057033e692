use crate::objects::segment::ShapeSegment;
use crate::objects::traceable::{segment_normals, Hit, SurfaceNormals, Traceable};
use crate::ray::LightRay;
use crate::scene::{next_shape_id, ShapeAttributes, ShapeId};
use crate::vec2::Point;

/// A closed polygonal obstacle. The vertex ring is closed implicitly (last
/// vertex connects back to the first) and every edge's segment is
/// precomputed at construction.
#[derive(Debug, Clone)]
pub struct PolygonShape {
    id: ShapeId,
    vertices: Vec<Point>,
    segments: Vec<ShapeSegment>,
    attrs: ShapeAttributes,
}

impl PolygonShape {
    /// Fewer than three vertices or a self-intersecting ring is a caller
    /// bug; behavior of non-simple polygons is deliberately left undefined
    /// and rejected here instead.
    pub fn new(vertices: Vec<Point>, attrs: ShapeAttributes) -> PolygonShape {
        debug_assert!(vertices.len() >= 3, "a polygon needs at least 3 vertices");
        debug_assert!(ring_is_simple(&vertices), "polygon ring must not self-intersect");
        let segments = (0..vertices.len())
            .map(|i| ShapeSegment::new(vertices[i], vertices[(i + 1) % vertices.len()]))
            .collect();
        PolygonShape {
            id: next_shape_id(),
            vertices,
            segments,
            attrs,
        }
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn segments(&self) -> &[ShapeSegment] {
        &self.segments
    }
}

impl Traceable for PolygonShape {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn attributes(&self) -> &ShapeAttributes {
        &self.attrs
    }

    /// Closest edge hit wins; the struck edge rides along in the record for
    /// normal selection.
    fn intersect(&self, ray: &LightRay) -> Option<Hit> {
        self.segments
            .iter()
            .fold(None, |closest: Option<Hit>, segment| {
                let point = match segment.intersect_ray(ray.origin, ray.direction) {
                    Some(point) => point,
                    None => return closest,
                };
                let distance_squared = ray.origin.distance_squared_to(&point);
                match closest {
                    Some(hit) if hit.distance_squared <= distance_squared => Some(hit),
                    _ => Some(Hit {
                        point,
                        distance_squared,
                        edge: Some(*segment),
                    }),
                }
            })
    }

    fn normals(&self, ray: &LightRay, hit: &Hit) -> SurfaceNormals {
        let edge = hit
            .edge
            .as_ref()
            .expect("polygon hits always record the struck edge");
        segment_normals(edge, ray)
    }

    /// Even-odd rule: a ray cast toward +x from `point` crosses the
    /// boundary an odd number of times iff the point is inside.
    fn contains(&self, point: Point) -> bool {
        let mut inside = false;
        let mut j = self.vertices.len() - 1;
        for i in 0..self.vertices.len() {
            let vi = self.vertices[i];
            let vj = self.vertices[j];
            if (vi.y > point.y) != (vj.y > point.y)
                && point.x < (vj.x - vi.x) * (point.y - vi.y) / (vj.y - vi.y) + vi.x
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

fn orientation(p: Point, q: Point, r: Point) -> f64 {
    (q - p).cross(&(r - p))
}

/// True when no two non-adjacent edges of the closed ring properly cross.
fn ring_is_simple(vertices: &[Point]) -> bool {
    let n = vertices.len();
    for i in 0..n {
        let (a1, a2) = (vertices[i], vertices[(i + 1) % n]);
        for j in i + 1..n {
            // Skip the edge itself and the two edges sharing a vertex.
            if j == i || (j + 1) % n == i || (i + 1) % n == j {
                continue;
            }
            let (b1, b2) = (vertices[j], vertices[(j + 1) % n]);
            let d1 = orientation(b1, b2, a1);
            let d2 = orientation(b1, b2, a2);
            let d3 = orientation(a1, a2, b1);
            let d4 = orientation(a1, a2, b2);
            if d1 * d2 < 0.0 && d3 * d4 < 0.0 {
                return false;
            }
        }
    }
    true
}
