//! Tip-position density heatmaps.
//!
//! Density is a 2-D Gaussian kernel density estimate with a full
//! covariance kernel scaled by a bandwidth factor (Scott's rule by
//! default), evaluated on a regular grid spanning the data bounds.

use scopetrace_common::config::AxisRange;
use scopetrace_common::error::{ScopetraceError, ScopetraceResult};

/// Kernel bandwidth selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bandwidth {
    /// `n^(-1/6)` for two dimensions.
    Scott,
    /// `(n * (d + 2) / 4)^(-1/(d + 4))`; equal to Scott in two dimensions.
    Silverman,
    /// Fixed factor applied to the data covariance.
    Factor(f64),
}

/// Grid configuration for heatmap generation.
#[derive(Debug, Clone, Copy)]
pub struct HeatmapConfig {
    pub cols: usize,
    pub rows: usize,
    pub bandwidth: Bandwidth,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            cols: 400,
            rows: 400,
            bandwidth: Bandwidth::Scott,
        }
    }
}

/// Gaussian KDE over 2-D points.
#[derive(Debug, Clone)]
pub struct GaussianKde {
    points: Vec<(f64, f64)>,
    /// Inverse of the kernel covariance, row-major `[a, b; b, d]`.
    inv_cov: [f64; 3],
    norm: f64,
    factor: f64,
}

impl GaussianKde {
    pub fn new(points: &[(f64, f64)], bandwidth: Bandwidth) -> ScopetraceResult<Self> {
        let n = points.len();
        if n < 2 {
            return Err(ScopetraceError::processing(format!(
                "density estimate needs at least 2 points, got {n}"
            )));
        }

        let nf = n as f64;
        let mean_x = points.iter().map(|p| p.0).sum::<f64>() / nf;
        let mean_y = points.iter().map(|p| p.1).sum::<f64>() / nf;
        let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
        for (x, y) in points {
            let dx = x - mean_x;
            let dy = y - mean_y;
            sxx += dx * dx;
            syy += dy * dy;
            sxy += dx * dy;
        }
        let denom = nf - 1.0;

        let factor = match bandwidth {
            Bandwidth::Scott => nf.powf(-1.0 / 6.0),
            Bandwidth::Silverman => (nf * (2.0 + 2.0) / 4.0).powf(-1.0 / 6.0),
            Bandwidth::Factor(f) => f,
        };
        let f2 = factor * factor;
        let (cxx, cyy, cxy) = (sxx / denom * f2, syy / denom * f2, sxy / denom * f2);

        let det = cxx * cyy - cxy * cxy;
        if !det.is_finite() || det <= f64::EPSILON * (cxx.abs() * cyy.abs()).max(f64::MIN_POSITIVE) {
            return Err(ScopetraceError::processing(
                "density estimate covariance is singular (points are collinear or identical)",
            ));
        }

        Ok(Self {
            points: points.to_vec(),
            inv_cov: [cyy / det, -cxy / det, cxx / det],
            norm: 1.0 / (nf * 2.0 * std::f64::consts::PI * det.sqrt()),
            factor,
        })
    }

    /// Bandwidth factor actually used.
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Density at `(x, y)`.
    pub fn evaluate(&self, x: f64, y: f64) -> f64 {
        let [a, b, d] = self.inv_cov;
        let sum: f64 = self
            .points
            .iter()
            .map(|(px, py)| {
                let dx = x - px;
                let dy = y - py;
                let q = a * dx * dx + 2.0 * b * dx * dy + d * dy * dy;
                (-0.5 * q).exp()
            })
            .sum();
        sum * self.norm
    }
}

/// Density sampled on a regular grid.
///
/// Row 0 is the lowest Y value; column 0 the lowest X value. Grid lines
/// include both bounds.
#[derive(Debug, Clone)]
pub struct DensityGrid {
    pub cols: usize,
    pub rows: usize,
    pub cells: Vec<f64>,
    pub max_density: f64,
    pub x_range: AxisRange,
    pub y_range: AxisRange,
}

impl DensityGrid {
    /// Estimate density over the bounding box of `points`.
    pub fn from_points(points: &[(f64, f64)], config: HeatmapConfig) -> ScopetraceResult<Self> {
        let kde = GaussianKde::new(points, config.bandwidth)?;
        let cols = config.cols.max(2);
        let rows = config.rows.max(2);

        let bounds = |sel: fn(&(f64, f64)) -> f64| {
            points.iter().map(sel).fold(
                AxisRange::new(f64::INFINITY, f64::NEG_INFINITY),
                |r, v| AxisRange::new(r.min.min(v), r.max.max(v)),
            )
        };
        let x_range = bounds(|p| p.0);
        let y_range = bounds(|p| p.1);

        let mut cells = Vec::with_capacity(cols * rows);
        for row in 0..rows {
            let y = y_range.min + y_range.span() * row as f64 / (rows - 1) as f64;
            for col in 0..cols {
                let x = x_range.min + x_range.span() * col as f64 / (cols - 1) as f64;
                cells.push(kde.evaluate(x, y));
            }
        }

        let max_density = cells.iter().copied().fold(0.0_f64, f64::max);
        tracing::debug!(
            points = points.len(),
            cols,
            rows,
            factor = kde.factor(),
            max_density,
            "Evaluated density grid"
        );
        Ok(Self {
            cols,
            rows,
            cells,
            max_density,
            x_range,
            y_range,
        })
    }

    pub fn cell(&self, col: usize, row: usize) -> Option<f64> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        Some(self.cells[row * self.cols + col])
    }

    pub fn normalized_cell(&self, col: usize, row: usize) -> Option<f64> {
        let value = self.cell(col, row)?;
        if self.max_density <= 0.0 {
            return Some(0.0);
        }
        Some(value / self.max_density)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster() -> Vec<(f64, f64)> {
        let mut points = vec![];
        for i in 0..20 {
            let a = i as f64 * 0.7;
            points.push((a.cos(), a.sin() * 0.5));
        }
        points.push((8.0, 8.0));
        points
    }

    #[test]
    fn test_density_peaks_near_cluster() {
        let grid = DensityGrid::from_points(
            &cluster(),
            HeatmapConfig {
                cols: 30,
                rows: 30,
                bandwidth: Bandwidth::Scott,
            },
        )
        .unwrap();

        // Cluster sits in the lower-left of the bounding box, outlier at the top-right.
        let near_cluster = grid.cell(3, 3).unwrap();
        let empty_corner = grid.cell(3, 29).unwrap();
        assert!(near_cluster > empty_corner);
        assert!(grid.max_density >= near_cluster);
        assert!((grid.normalized_cell(3, 3).unwrap() - near_cluster / grid.max_density).abs() < 1e-12);
        assert!(grid.cell(30, 0).is_none());
    }

    #[test]
    fn test_grid_spans_bounds() {
        let grid = DensityGrid::from_points(&cluster(), HeatmapConfig {
            cols: 5,
            rows: 5,
            bandwidth: Bandwidth::Factor(0.5),
        })
        .unwrap();
        assert_eq!(grid.cells.len(), 25);
        assert!((grid.x_range.max - 8.0).abs() < 1e-12);
        assert!((grid.y_range.max - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_kde_integrates_to_one() {
        let points = vec![(0.0, 0.0), (1.0, 0.5), (0.5, 1.5), (-0.5, 0.2)];
        let kde = GaussianKde::new(&points, Bandwidth::Scott).unwrap();
        let step = 0.05;
        let mut total = 0.0;
        let mut x = -8.0;
        while x < 9.0 {
            let mut y = -8.0;
            while y < 9.0 {
                total += kde.evaluate(x, y) * step * step;
                y += step;
            }
            x += step;
        }
        assert!((total - 1.0).abs() < 1e-2, "total = {total}");
    }

    #[test]
    fn test_degenerate_points_rejected() {
        assert!(GaussianKde::new(&[(1.0, 1.0)], Bandwidth::Scott).is_err());
        assert!(GaussianKde::new(&[(1.0, 1.0), (1.0, 1.0), (1.0, 1.0)], Bandwidth::Scott).is_err());
        assert!(GaussianKde::new(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)], Bandwidth::Scott).is_err());
    }

    #[test]
    fn test_scott_and_silverman_agree_in_2d() {
        let points = cluster();
        let scott = GaussianKde::new(&points, Bandwidth::Scott).unwrap();
        let silverman = GaussianKde::new(&points, Bandwidth::Silverman).unwrap();
        assert!((scott.factor() - silverman.factor()).abs() < 1e-12);
    }
}
