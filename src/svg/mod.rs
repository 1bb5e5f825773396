use std::fmt;

use crate::domain::{Geometry, GeometryError};
use crate::geometry::{Bounds, Projector};

/// Canvas size and pass-through style attributes for the rendered SVG.
///
/// The color/opacity/width fields are opaque: they are written into the
/// output verbatim, no validation beyond being printable.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasSpec {
    /// Square canvas edge length, in pixel-equivalent units.
    pub size: u32,
    pub fill: String,
    pub fill_opacity: f64,
    pub stroke: String,
    pub stroke_width: f64,
    /// Free-form inline style appended to the svg container element.
    pub style: String,
}

impl Default for CanvasSpec {
    fn default() -> Self {
        Self {
            size: 200,
            fill: "#3388ff".to_string(),
            fill_opacity: 0.3,
            stroke: "#3388ff".to_string(),
            stroke_width: 1.0,
            style: String::new(),
        }
    }
}

/// A projected drawing: one point-sequence per outer ring, already scaled
/// into canvas coordinates and rounded. `Display` emits the SVG fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgDocument {
    spec: CanvasSpec,
    rings: Vec<Vec<(f64, f64)>>,
}

impl SvgDocument {
    pub fn size(&self) -> u32 {
        self.spec.size
    }

    /// Projected outer rings in visit order.
    pub fn rings(&self) -> &[Vec<(f64, f64)>] {
        &self.rings
    }
}

impl fmt::Display for SvgDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"<svg height="{size}" width="{size}" style="{style}">"#,
            size = self.spec.size,
            style = self.spec.style,
        )?;
        for ring in &self.rings {
            let points = ring
                .iter()
                .map(|&(x, y)| format!("{},{}", x, y))
                .collect::<Vec<_>>()
                .join(" ");
            write!(
                f,
                r#"<polygon points="{points}" style="fill:{fill};fill-opacity:{opacity};stroke:{stroke};stroke-width:{width}" />"#,
                points = points,
                fill = self.spec.fill,
                opacity = self.spec.fill_opacity,
                stroke = self.spec.stroke,
                width = self.spec.stroke_width,
            )?;
        }
        write!(f, "</svg>")
    }
}

/// Project a polygonal geometry into a fixed square canvas.
///
/// Returns `Ok(None)` when there is nothing to draw: absent geometry, or a
/// bounding box whose larger extent truncates to zero. Malformed geometry
/// (no rings, an empty outer ring) and non-polygonal kinds are errors —
/// never a partial canvas.
pub fn polygon_to_svg(
    geometry: Option<&Geometry>,
    spec: &CanvasSpec,
) -> Result<Option<SvgDocument>, GeometryError> {
    let Some(geometry) = geometry else {
        return Ok(None);
    };

    let outer_rings = geometry.outer_rings()?;
    // One shared bounding box for the whole geometry, never per polygon
    let bounds = Bounds::from_geometry(geometry)?;

    let Some(projector) = Projector::fit(&bounds, spec.size) else {
        return Ok(None);
    };

    let rings = outer_rings
        .iter()
        .map(|ring| projector.project_ring(ring))
        .collect();

    Ok(Some(SvgDocument {
        spec: spec.clone(),
        rings,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Geometry {
        Geometry::Polygon {
            coordinates: vec![vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]],
        }
    }

    #[test]
    fn test_unit_square_default_spec() {
        let doc = polygon_to_svg(Some(&unit_square()), &CanvasSpec::default())
            .unwrap()
            .unwrap();

        assert_eq!(
            doc.to_string(),
            r#"<svg height="200" width="200" style=""><polygon points="0,200 200,200 200,0 0,0" style="fill:#3388ff;fill-opacity:0.3;stroke:#3388ff;stroke-width:1" /></svg>"#
        );
    }

    #[test]
    fn test_absent_geometry_is_not_renderable() {
        let result = polygon_to_svg(None, &CanvasSpec::default()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_degenerate_bbox_is_not_renderable() {
        let point_like = Geometry::Polygon {
            coordinates: vec![vec![(5.0, 5.0), (5.0, 5.0), (5.0, 5.0)]],
        };
        let result = polygon_to_svg(Some(&point_like), &CanvasSpec::default()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_unsupported_kind_is_an_error() {
        let point = Geometry::Point {
            coordinates: serde_json::json!([4.35, 50.85]),
        };
        assert_eq!(
            polygon_to_svg(Some(&point), &CanvasSpec::default()),
            Err(GeometryError::Unsupported("Point".to_string()))
        );
    }

    #[test]
    fn test_empty_ring_is_an_error() {
        let malformed = Geometry::Polygon {
            coordinates: vec![vec![]],
        };
        assert_eq!(
            polygon_to_svg(Some(&malformed), &CanvasSpec::default()),
            Err(GeometryError::EmptyRing)
        );
    }

    #[test]
    fn test_wide_rectangle_offsets_y() {
        let rectangle = Geometry::Polygon {
            coordinates: vec![vec![(0.0, 0.0), (2.0, 0.0), (2.0, 1.0), (0.0, 1.0)]],
        };
        let spec = CanvasSpec {
            size: 100,
            ..CanvasSpec::default()
        };

        let doc = polygon_to_svg(Some(&rectangle), &spec).unwrap().unwrap();
        assert_eq!(
            doc.rings(),
            &[vec![(0.0, 75.0), (100.0, 75.0), (100.0, 25.0), (0.0, 25.0)]]
        );
    }

    #[test]
    fn test_multipolygon_shares_overall_bbox() {
        // Two unit squares side by side: overall extent 3 x 1, so each is
        // normalized against the shared box, not its own
        let multi = Geometry::MultiPolygon {
            coordinates: vec![
                vec![vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]],
                vec![vec![(2.0, 0.0), (3.0, 0.0), (3.0, 1.0), (2.0, 1.0)]],
            ],
        };
        let spec = CanvasSpec {
            size: 300,
            ..CanvasSpec::default()
        };

        let doc = polygon_to_svg(Some(&multi), &spec).unwrap().unwrap();
        assert_eq!(doc.rings().len(), 2);
        assert_eq!(
            doc.rings()[0],
            vec![(0.0, 200.0), (100.0, 200.0), (100.0, 100.0), (0.0, 100.0)]
        );
        assert_eq!(
            doc.rings()[1],
            vec![(200.0, 200.0), (300.0, 200.0), (300.0, 100.0), (200.0, 100.0)]
        );
        assert_eq!(doc.to_string().matches("<polygon").count(), 2);
    }

    #[test]
    fn test_ring_point_counts_preserved() {
        let doc = polygon_to_svg(Some(&unit_square()), &CanvasSpec::default())
            .unwrap()
            .unwrap();
        assert_eq!(doc.rings().len(), 1);
        assert_eq!(doc.rings()[0].len(), 4);
    }

    #[test]
    fn test_projection_is_idempotent() {
        let spec = CanvasSpec {
            size: 150,
            style: "border:1px solid red".to_string(),
            ..CanvasSpec::default()
        };
        let first = polygon_to_svg(Some(&unit_square()), &spec).unwrap().unwrap();
        let second = polygon_to_svg(Some(&unit_square()), &spec).unwrap().unwrap();

        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn test_style_passthrough() {
        let spec = CanvasSpec {
            size: 200,
            fill: "red".to_string(),
            fill_opacity: 0.5,
            stroke: "black".to_string(),
            stroke_width: 2.5,
            style: "display:block".to_string(),
        };

        let svg = polygon_to_svg(Some(&unit_square()), &spec)
            .unwrap()
            .unwrap()
            .to_string();
        assert!(svg.starts_with(r#"<svg height="200" width="200" style="display:block">"#));
        assert!(svg.contains("fill:red;fill-opacity:0.5;stroke:black;stroke-width:2.5"));
    }
}
