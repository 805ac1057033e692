mod color;
mod configuration;
mod fresnel;
mod grid;
mod queue;
mod raster;
mod ray;
mod scene;
mod simulator;
mod tracer;
mod vec2;

// Export the shape primitives and math helpers for use in other crates.
pub mod objects;
pub mod utils;

pub use color::{FractionalLightColor, LightColor};
pub use configuration::{load_configuration, DemoSettings, ImageFormat};
pub use grid::{LightGrid, RenderProperties, SimulationSnapshot, SnapshotHandler};
pub use queue::BoundedQueue;
pub use ray::{LightRay, LightSegment};
pub use scene::{next_shape_id, Light, ShapeAttributes, ShapeId, SimulationLayout, SimulationSize};
pub use simulator::{Simulator, SimulatorSettings};
pub use tracer::{trace, CancellationToken};
pub use vec2::{Point, Vec2};
