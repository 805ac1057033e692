mod circle;
mod polygon;
mod segment;
mod traceable;
mod wall;

pub use circle::CircleShape;
pub use polygon::PolygonShape;
pub use segment::ShapeSegment;
pub use traceable::{Hit, SurfaceNormals, Traceable};
pub use wall::Wall;
