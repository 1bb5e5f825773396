pub mod bounds;
pub mod projector;

pub use bounds::Bounds;
pub use projector::Projector;
