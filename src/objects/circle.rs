use crate::objects::traceable::{Hit, SurfaceNormals, Traceable};
use crate::ray::LightRay;
use crate::scene::{next_shape_id, ShapeAttributes, ShapeId};
use crate::vec2::Point;

/// Far enough that the extended ray endpoint is outside any plausible
/// simulation area.
const FAR_EXTENT: f64 = 1.0e5;

/// A circular obstacle with a volume: rays can refract into it.
#[derive(Debug, Clone)]
pub struct CircleShape {
    id: ShapeId,
    center: Point,
    radius: f64,
    attrs: ShapeAttributes,
}

impl CircleShape {
    pub fn new(center: Point, radius: f64, attrs: ShapeAttributes) -> CircleShape {
        debug_assert!(radius > 0.0, "circle radius must be positive");
        CircleShape {
            id: next_shape_id(),
            center,
            radius,
            attrs,
        }
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl Traceable for CircleShape {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn attributes(&self) -> &ShapeAttributes {
        &self.attrs
    }

    /// Extends the ray to a far endpoint and solves the line/circle
    /// quadratic for the parameter t along that extent; the smaller
    /// positive root is the first crossing.
    fn intersect(&self, ray: &LightRay) -> Option<Hit> {
        let far = ray.origin.advanced(&ray.direction, FAR_EXTENT);
        let dx = far.x - ray.origin.x;
        let dy = far.y - ray.origin.y;
        let ox = ray.origin.x - self.center.x;
        let oy = ray.origin.y - self.center.y;

        let a = dx * dx + dy * dy;
        let b = 2.0 * (dx * ox + dy * oy);
        let c = ox * ox + oy * oy - self.radius * self.radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();

        let near = (-b - root) / (2.0 * a);
        let t = if near > 0.0 {
            near
        } else {
            let t = (-b + root) / (2.0 * a);
            if t > 0.0 {
                t
            } else {
                return None;
            }
        };

        let point = Point::new(ray.origin.x + dx * t, ray.origin.y + dy * t);
        Some(Hit {
            point,
            distance_squared: ray.origin.distance_squared_to(&point),
            edge: None,
        })
    }

    /// Radial normals. A ray arriving from outside reflects off the normal
    /// pointing away from the center; a ray arriving from inside (hitting
    /// the far boundary) reflects off the normal pointing back in.
    fn normals(&self, ray: &LightRay, hit: &Hit) -> SurfaceNormals {
        let outward = (hit.point - self.center).unit_vector();
        let origin_outside =
            ray.origin.distance_squared_to(&self.center) > self.radius * self.radius;
        if origin_outside {
            SurfaceNormals {
                reflection: outward,
                refraction: -outward,
            }
        } else {
            SurfaceNormals {
                reflection: -outward,
                refraction: outward,
            }
        }
    }

    fn contains(&self, point: Point) -> bool {
        point.distance_squared_to(&self.center) <= self.radius * self.radius
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

    fn circle() -> CircleShape {
        CircleShape::new(Point::new(50.0, 50.0), 10.0, ShapeAttributes::free_space())
    }

    #[test]
    fn head_on_ray_hits_near_rim() {
        let c = circle();
        let hit = c
            .intersect(&ray(Point::new(0.0, 50.0), Vec2::new(1.0, 0.0)))
            .unwrap();
        assert!((hit.point.x - 40.0).abs() < 1e-6);
        assert!((hit.point.y - 50.0).abs() < 1e-6);
        assert!((hit.distance_squared - 1600.0).abs() < 1e-3);
    }

    #[test]
    fn ray_from_inside_hits_far_rim() {
        let c = circle();
        let hit = c
            .intersect(&ray(Point::new(50.0, 50.0), Vec2::new(1.0, 0.0)))
            .unwrap();
        assert!((hit.point.x - 60.0).abs() < 1e-6);
    }

    #[test]
    fn ray_pointing_away_misses() {
        let c = circle();
        assert!(c
            .intersect(&ray(Point::new(0.0, 50.0), Vec2::new(-1.0, 0.0)))
            .is_none());
    }

    #[test]
    fn offset_ray_misses() {
        let c = circle();
        assert!(c
            .intersect(&ray(Point::new(0.0, 65.0), Vec2::new(1.0, 0.0)))
            .is_none());
    }

    #[test]
    fn normals_flip_with_origin_side() {
        let c = circle();
        let outside = ray(Point::new(0.0, 50.0), Vec2::new(1.0, 0.0));
        let hit = c.intersect(&outside).unwrap();
        let normals = c.normals(&outside, &hit);
        // Hit on the left rim, arriving from the left: reflection points left.
        assert!(normals.reflection.x < 0.0);

        let inside = ray(Point::new(50.0, 50.0), Vec2::new(1.0, 0.0));
        let hit = c.intersect(&inside).unwrap();
        let normals = c.normals(&inside, &hit);
        // Hit on the right rim from inside: reflection points back toward
        // the center.
        assert!(normals.reflection.x < 0.0);
        assert_eq!(normals.refraction, -normals.reflection);
    }

    #[test]
    fn containment_matches_radius() {
        let c = circle();
        assert!(c.contains(Point::new(50.0, 50.0)));
        assert!(c.contains(Point::new(59.9, 50.0)));
        assert!(c.contains(Point::new(60.0, 50.0)));
        assert!(!c.contains(Point::new(60.1, 50.0)));
        assert!(!c.contains(Point::new(0.0, 0.0)));
    }
}
