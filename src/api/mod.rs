pub mod wfs;

pub use wfs::{ResultType, WfsLayer};
