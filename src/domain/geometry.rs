use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Decoded GeoJSON geometry from a WFS GetFeature response.
///
/// Only the polygonal kinds carry typed coordinates. The other kinds keep
/// their raw JSON so a mixed collection still deserializes, and the renderer
/// can reject them by name instead of sniffing the source text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon {
        coordinates: Vec<Vec<(f64, f64)>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<(f64, f64)>>>,
    },
    Point {
        coordinates: Value,
    },
    MultiPoint {
        coordinates: Value,
    },
    LineString {
        coordinates: Value,
    },
    MultiLineString {
        coordinates: Value,
    },
    GeometryCollection {
        geometries: Value,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("unsupported geometry type: {0}")]
    Unsupported(String),
    #[error("geometry contains no polygons")]
    Empty,
    #[error("polygon has no rings")]
    NoRings,
    #[error("outer ring has no points")]
    EmptyRing,
}

impl Geometry {
    /// GeoJSON type name of this geometry.
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Polygon { .. } => "Polygon",
            Geometry::MultiPolygon { .. } => "MultiPolygon",
            Geometry::Point { .. } => "Point",
            Geometry::MultiPoint { .. } => "MultiPoint",
            Geometry::LineString { .. } => "LineString",
            Geometry::MultiLineString { .. } => "MultiLineString",
            Geometry::GeometryCollection { .. } => "GeometryCollection",
        }
    }

    /// Outer boundary of each constituent polygon, in order.
    ///
    /// A polygon's first ring is its exterior; inner rings (holes) are never
    /// rendered. Non-polygonal kinds and empty ring lists are hard errors.
    pub fn outer_rings(&self) -> Result<Vec<&[(f64, f64)]>, GeometryError> {
        match self {
            Geometry::Polygon { coordinates } => Ok(vec![outer_ring(coordinates)?]),
            Geometry::MultiPolygon { coordinates } => {
                if coordinates.is_empty() {
                    return Err(GeometryError::Empty);
                }
                coordinates.iter().map(|rings| outer_ring(rings)).collect()
            }
            other => Err(GeometryError::Unsupported(other.kind().to_string())),
        }
    }
}

fn outer_ring(rings: &[Vec<(f64, f64)>]) -> Result<&[(f64, f64)], GeometryError> {
    let outer = rings.first().ok_or(GeometryError::NoRings)?;
    if outer.is_empty() {
        return Err(GeometryError::EmptyRing);
    }
    Ok(outer.as_slice())
}
