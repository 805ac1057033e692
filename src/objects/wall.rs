use crate::objects::segment::ShapeSegment;
use crate::objects::traceable::{segment_normals, Hit, SurfaceNormals, Traceable};
use crate::ray::LightRay;
use crate::scene::{next_shape_id, ShapeAttributes, ShapeId};
use crate::vec2::Point;

/// An oriented line-segment obstacle. Walls have surface attributes but no
/// volume, so they never contain a point and never change a ray's medium.
#[derive(Debug, Clone)]
pub struct Wall {
    id: ShapeId,
    segment: ShapeSegment,
    attrs: ShapeAttributes,
}

impl Wall {
    pub fn new(p1: Point, p2: Point, attrs: ShapeAttributes) -> Wall {
        Wall {
            id: next_shape_id(),
            segment: ShapeSegment::new(p1, p2),
            attrs,
        }
    }

    pub fn segment(&self) -> &ShapeSegment {
        &self.segment
    }
}

impl Traceable for Wall {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn attributes(&self) -> &ShapeAttributes {
        &self.attrs
    }

    fn intersect(&self, ray: &LightRay) -> Option<Hit> {
        let point = self.segment.intersect_ray(ray.origin, ray.direction)?;
        Some(Hit {
            point,
            distance_squared: ray.origin.distance_squared_to(&point),
            edge: Some(self.segment),
        })
    }

    fn normals(&self, ray: &LightRay, _hit: &Hit) -> SurfaceNormals {
        segment_normals(&self.segment, ray)
    }

    fn contains(&self, _point: Point) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::LightColor;
    use crate::vec2::Vec2;

    fn ray(origin: Point, direction: Vec2) -> LightRay {
        LightRay::new(
            None,
            origin,
            direction,
            LightColor::WHITE,
            ShapeAttributes::free_space(),
        )
    }

    #[test]
    fn reflection_normal_faces_the_ray() {
        let wall = Wall::new(
            Point::new(0.0, 50.0),
            Point::new(100.0, 50.0),
            ShapeAttributes::free_space(),
        );
        // Arriving from below: reflection normal must point back down.
        let from_below = ray(Point::new(30.0, 10.0), Vec2::new(0.0, 1.0));
        let hit = wall.intersect(&from_below).unwrap();
        let normals = wall.normals(&from_below, &hit);
        assert!(normals.reflection.y < 0.0);
        assert!(normals.refraction.y > 0.0);
        assert_eq!(normals.refraction, -normals.reflection);

        // Arriving from above: the pair flips.
        let from_above = ray(Point::new(30.0, 90.0), Vec2::new(0.0, -1.0));
        let hit = wall.intersect(&from_above).unwrap();
        let normals = wall.normals(&from_above, &hit);
        assert!(normals.reflection.y > 0.0);
    }

    #[test]
    fn walls_contain_nothing() {
        let wall = Wall::new(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            ShapeAttributes::free_space(),
        );
        assert!(!wall.contains(Point::new(5.0, 0.0)));
    }
}
