use geo::{BoundingRect, LineString, MultiPolygon, Polygon};

use crate::domain::{Geometry, GeometryError};

/// Axis-aligned bounding box in source (planar) coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Compute the bounding box of the full geometry — every ring of every
    /// polygon contributes, including holes.
    pub fn from_geometry(geometry: &Geometry) -> Result<Self, GeometryError> {
        let polygons: Vec<Polygon<f64>> = match geometry {
            Geometry::Polygon { coordinates } => vec![to_geo_polygon(coordinates)?],
            Geometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .map(|rings| to_geo_polygon(rings))
                .collect::<Result<_, _>>()?,
            other => return Err(GeometryError::Unsupported(other.kind().to_string())),
        };

        let rect = MultiPolygon::new(polygons)
            .bounding_rect()
            .ok_or(GeometryError::Empty)?;

        Ok(Self {
            min_x: rect.min().x,
            max_x: rect.max().x,
            min_y: rect.min().y,
            max_y: rect.max().y,
        })
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

fn to_geo_polygon(rings: &[Vec<(f64, f64)>]) -> Result<Polygon<f64>, GeometryError> {
    let mut line_strings = rings.iter().map(|ring| LineString::from(ring.clone()));
    let exterior = line_strings.next().ok_or(GeometryError::NoRings)?;
    if exterior.0.is_empty() {
        return Err(GeometryError::EmptyRing);
    }
    Ok(Polygon::new(exterior, line_strings.collect()))
}
