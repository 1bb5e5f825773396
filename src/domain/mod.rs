pub mod feature;
pub mod geometry;

pub use feature::{Feature, FeatureCollection};
pub use geometry::{Geometry, GeometryError};
