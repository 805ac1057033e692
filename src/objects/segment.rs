use crate::utils::safe_divide;
use crate::vec2::{Point, Vec2};

/// Slopes closer than this are treated as parallel: the intersection of two
/// nearly parallel lines is numerically meaningless at simulation scale.
const PARALLEL_EPSILON: f64 = 1e-4;

/// How far beyond each endpoint an intersection may land and still count as
/// on the segment. Covers rounding at segment joints.
const RANGE_PADDING: f64 = 0.5;

/// A line segment with everything a ray intersection needs precomputed:
/// slope (finite even for vertical segments), y-intercept, padded coordinate
/// ranges, and the two outward unit normals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeSegment {
    p1: Point,
    p2: Point,
    slope: f64,
    y_intercept: f64,
    x_range: (f64, f64),
    y_range: (f64, f64),
    normals: (Vec2, Vec2),
}

impl ShapeSegment {
    pub fn new(p1: Point, p2: Point) -> ShapeSegment {
        let slope = safe_divide(p2.y - p1.y, p2.x - p1.x);
        let y_intercept = p1.y - slope * p1.x;
        let x_range = (
            p1.x.min(p2.x) - RANGE_PADDING,
            p1.x.max(p2.x) + RANGE_PADDING,
        );
        let y_range = (
            p1.y.min(p2.y) - RANGE_PADDING,
            p1.y.max(p2.y) + RANGE_PADDING,
        );
        let along = (p2 - p1).unit_vector();
        let normal = Vec2::new(-along.y, along.x);
        ShapeSegment {
            p1,
            p2,
            slope,
            y_intercept,
            x_range,
            y_range,
            normals: (normal, -normal),
        }
    }

    pub fn p1(&self) -> Point {
        self.p1
    }

    pub fn p2(&self) -> Point {
        self.p2
    }

    pub fn direction(&self) -> Vec2 {
        self.p2 - self.p1
    }

    /// Both outward unit normals. Which one faces a given ray is decided at
    /// hit time.
    pub fn normal_pair(&self) -> (Vec2, Vec2) {
        self.normals
    }

    /// Intersects a ray (given by origin and direction) with this segment.
    ///
    /// Solves the two line equations, rejects near-parallel pairs, then
    /// requires the solution to lie forward along the ray and inside the
    /// segment's padded ranges.
    pub fn intersect_ray(&self, origin: Point, direction: Vec2) -> Option<Point> {
        let ray_slope = safe_divide(direction.y, direction.x);
        if (ray_slope - self.slope).abs() < PARALLEL_EPSILON {
            return None;
        }
        let ray_intercept = origin.y - ray_slope * origin.x;

        let x = (self.y_intercept - ray_intercept) / (ray_slope - self.slope);
        // Evaluate y on the shallower line; the steeper one amplifies the
        // rounding in x.
        let y = if ray_slope.abs() < self.slope.abs() {
            ray_slope * x + ray_intercept
        } else {
            self.slope * x + self.y_intercept
        };

        // Forward side of the ray only.
        if (x - origin.x) * direction.x < 0.0 || (y - origin.y) * direction.y < 0.0 {
            return None;
        }

        if x < self.x_range.0 || x > self.x_range.1 || y < self.y_range.0 || y > self.y_range.1 {
            return None;
        }

        Some(Point::new(x, y))
    }
}
