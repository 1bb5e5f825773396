use crate::geometry::Bounds;

/// Fits a bounding box into a square canvas of a given size.
///
/// Both axes use the same scale factor (`size / max extent`) so the shape
/// keeps its aspect ratio; the shorter dimension is centered by offsetting
/// the non-dominant axis. The y axis is flipped because canvas coordinates
/// grow downward while source coordinates grow upward.
#[derive(Debug, Clone)]
pub struct Projector {
    min_x: f64,
    min_y: f64,
    scale: f64,
    x_offset: f64,
    y_offset: f64,
    size: f64,
}

impl Projector {
    /// Build a projector for the given bounds and canvas size.
    ///
    /// Returns `None` when the larger extent truncates to zero, i.e. the
    /// geometry collapses to a point at integer precision. Callers treat
    /// that as "nothing to draw", not as an error.
    pub fn fit(bounds: &Bounds, size: u32) -> Option<Self> {
        let x_diff = bounds.width();
        let y_diff = bounds.height();
        let max_diff = x_diff.max(y_diff);
        if max_diff.trunc() == 0.0 {
            return None;
        }

        let size = size as f64;
        let centering = (x_diff - y_diff).abs() / 2.0 * size / max_diff;
        let (x_offset, y_offset) = if x_diff > y_diff {
            (0.0, centering)
        } else {
            (centering, 0.0)
        };

        Some(Self {
            min_x: bounds.min_x,
            min_y: bounds.min_y,
            scale: size / max_diff,
            x_offset,
            y_offset,
            size,
        })
    }

    /// Project one source point into canvas coordinates, rounded to two
    /// decimal places.
    pub fn project(&self, x: f64, y: f64) -> (f64, f64) {
        let px = (x - self.min_x) * self.scale + self.x_offset;
        let py = self.size - ((y - self.min_y) * self.scale + self.y_offset);
        (round2(px), round2(py))
    }

    /// Project a ring of points, preserving their order.
    pub fn project_ring(&self, points: &[(f64, f64)]) -> Vec<(f64, f64)> {
        points.iter().map(|&(x, y)| self.project(x, y)).collect()
    }
}

/// Round half away from zero to two decimal places, normalizing -0.0 so it
/// never leaks into the output.
fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 { 0.0 } else { rounded }
}
