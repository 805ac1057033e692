use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// A 2D vector. Doubles as a position when used through the [`Point`] alias.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

/// Positions in simulation space share the vector representation.
pub type Point = Vec2;

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Vec2 {
        Vec2 { x, y }
    }

    /// Unit vector at `angle` radians counterclockwise from the +x axis.
    pub fn from_angle(angle: f64) -> Vec2 {
        Vec2 {
            x: angle.cos(),
            y: angle.sin(),
        }
    }

    pub fn length(&self) -> f64 {
        f64::sqrt(self.length_squared())
    }

    pub fn length_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub fn dot(&self, rhs: &Vec2) -> f64 {
        self.x * rhs.x + self.y * rhs.y
    }

    /// The z component of the 3D cross product; its sign gives the winding
    /// from `self` to `rhs`.
    pub fn cross(&self, rhs: &Vec2) -> f64 {
        self.x * rhs.y - self.y * rhs.x
    }

    pub fn unit_vector(&self) -> Vec2 {
        *self / self.length()
    }

    /// Rotated counterclockwise by `angle` radians.
    pub fn rotated(&self, angle: f64) -> Vec2 {
        let (sin, cos) = angle.sin_cos();
        Vec2 {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    /// Signed angle that rotates `self` onto `rhs`, in (-PI, PI].
    /// Counterclockwise is positive.
    pub fn signed_angle_to(&self, rhs: &Vec2) -> f64 {
        f64::atan2(self.cross(rhs), self.dot(rhs))
    }

    /// The point reached by travelling `distance` along `direction` from
    /// `self`. `direction` is expected to be unit length.
    pub fn advanced(&self, direction: &Vec2, distance: f64) -> Point {
        *self + *direction * distance
    }

    pub fn distance_squared_to(&self, rhs: &Point) -> f64 {
        (*rhs - *self).length_squared()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Mul<Vec2> for f64 {
    type Output = Vec2;

    fn mul(self, rhs: Vec2) -> Vec2 {
        rhs * self
    }
}

impl Div<f64> for Vec2 {
    type Output = Vec2;

    fn div(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}
