//! Trajectory segments cut at landmark indices.
//!
//! Plots view the scope from the patient's side, so tip coordinates are
//! negated on every axis before use.

use serde::{Deserialize, Serialize};

use scopetrace_trace_model::series::{Axis, CoordinateSeries};

use crate::landmarks::LandmarkIndexes;

/// Negated tip-coil coordinates over a sample range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TipPath {
    /// Index of the first sample in the source series.
    pub offset: usize,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

impl TipPath {
    /// Negated tip over `[start, end)`, clamped to the series.
    pub fn between(series: &CoordinateSeries, start: usize, end: usize) -> Self {
        let negated = |axis| {
            series
                .coil_slice(axis, 0, start, end)
                .into_iter()
                .map(|v| -v)
                .collect::<Vec<_>>()
        };
        Self {
            offset: start,
            x: negated(Axis::X),
            y: negated(Axis::Y),
            z: negated(Axis::Z),
        }
    }

    /// Insertion phase: Start up to (not including) Cecum.
    pub fn insertion_phase(series: &CoordinateSeries, landmarks: &LandmarkIndexes) -> Self {
        Self::between(series, landmarks.start, landmarks.cecum)
    }

    /// Insertion phase with the first `skip` samples dropped and every
    /// point shifted so the first remaining point is the origin.
    pub fn zero_referenced(
        series: &CoordinateSeries,
        landmarks: &LandmarkIndexes,
        skip: usize,
    ) -> Self {
        let mut path = Self::between(series, landmarks.start + skip, landmarks.cecum);
        for axis in [&mut path.x, &mut path.y, &mut path.z] {
            if let Some(&origin) = axis.first() {
                axis.iter_mut().for_each(|v| *v -= origin);
            }
        }
        path
    }

    /// Number of points (shortest axis).
    pub fn len(&self) -> usize {
        self.x.len().min(self.y.len()).min(self.z.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(z, y)` pairs: the side view used by tip-path plots and heatmaps.
    pub fn zy_points(&self) -> Vec<(f64, f64)> {
        self.z.iter().copied().zip(self.y.iter().copied()).collect()
    }

    /// Position of a source-series index within this path, if covered.
    pub fn local_index(&self, series_index: usize) -> Option<usize> {
        series_index
            .checked_sub(self.offset)
            .filter(|local| *local < self.len())
    }
}

/// Evenly spaced progress indices into a sequence of length `len`.
///
/// Yields `floor(len * k / fraction)` for `k = 1..fraction` followed by
/// `len - 1`. Empty when `len` or `fraction` is 0.
pub fn fractional_indexes(len: usize, fraction: usize) -> Vec<usize> {
    if len == 0 || fraction == 0 {
        return vec![];
    }
    let mut indexes: Vec<usize> = (1..fraction).map(|k| len * k / fraction).collect();
    indexes.push(len - 1);
    indexes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_series(n: usize) -> CoordinateSeries {
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let y: Vec<f64> = (0..n).map(|i| 10.0 + i as f64).collect();
        let z: Vec<f64> = (0..n).map(|i| 100.0 + 2.0 * i as f64).collect();
        let t: Vec<f64> = (0..n).map(|i| i as f64 * 10.0).collect();
        CoordinateSeries::from_tip(&x, &y, &z, t)
    }

    #[test]
    fn test_insertion_phase_is_negated_half_open() {
        let series = ramp_series(10);
        let lm = LandmarkIndexes {
            start: 2,
            cecum: 5,
            ..Default::default()
        };
        let path = TipPath::insertion_phase(&series, &lm);
        assert_eq!(path.x, vec![-2.0, -3.0, -4.0]);
        assert_eq!(path.z, vec![-104.0, -106.0, -108.0]);
        assert_eq!(path.offset, 2);
    }

    #[test]
    fn test_insertion_phase_empty_when_cecum_precedes_start() {
        let series = ramp_series(10);
        let lm = LandmarkIndexes {
            start: 6,
            cecum: 3,
            ..Default::default()
        };
        assert!(TipPath::insertion_phase(&series, &lm).is_empty());
    }

    #[test]
    fn test_zero_referenced_starts_at_origin() {
        let series = ramp_series(20);
        let lm = LandmarkIndexes {
            start: 1,
            cecum: 12,
            ..Default::default()
        };
        let path = TipPath::zero_referenced(&series, &lm, 5);
        assert_eq!(path.len(), 6);
        assert_eq!(path.z[0], 0.0);
        assert_eq!(path.y[0], 0.0);
        // Negated ramp: z decreases by 2 per sample.
        assert_eq!(path.z[3], -6.0);
    }

    #[test]
    fn test_local_index() {
        let series = ramp_series(10);
        let path = TipPath::between(&series, 3, 7);
        assert_eq!(path.local_index(3), Some(0));
        assert_eq!(path.local_index(6), Some(3));
        assert_eq!(path.local_index(7), None);
        assert_eq!(path.local_index(1), None);
    }

    #[test]
    fn test_fractional_indexes() {
        assert_eq!(fractional_indexes(24, 12).len(), 12);
        assert_eq!(fractional_indexes(10, 4), vec![2, 5, 7, 9]);
        assert_eq!(fractional_indexes(10, 1), vec![9]);
        assert!(fractional_indexes(0, 12).is_empty());
    }
}
