//! wfs2svg - Query OGC WFS endpoints and render polygon features as SVG

pub mod api;
pub mod config;
pub mod domain;
pub mod geometry;
pub mod svg;

pub use api::WfsLayer;
pub use geometry::{Bounds, Projector};
pub use svg::{CanvasSpec, SvgDocument, polygon_to_svg};
