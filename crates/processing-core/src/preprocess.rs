//! Raw sensor CSV to per-coil trajectories.
//!
//! Raw exports are comma-separated with a header line and a trailing
//! comma on every row. The first configured column holds wall-clock time
//! as `HH:MM:SS:ffffff`; the coordinate columns and their packing into
//! coils depend on the tracking device and come from [`PreprocessConfig`].
//!
//! Stages:
//! 1. wall-clock time → milliseconds since the first sample
//! 2. column selection → rows of `[t, c0, c1, ...]`
//! 3. reshape into one `{T, X, Y, Z}` trajectory per coil
//! 4. per-coil linear transform, rounded to 0.01
//! 5. smoothing per axis, running average unless configured otherwise

use std::path::Path;

use serde::{Deserialize, Serialize};

use scopetrace_common::clock::{parse_sample_time, relative_ms};
use scopetrace_common::config::{CoilLayout, CoilTransform, PreprocessConfig};
use scopetrace_common::error::{ScopetraceError, ScopetraceResult};
use scopetrace_trace_model::series::CoordinateSeries;

use crate::smoothing::Smoother;

/// One coil's samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoilTrajectory {
    pub t: Vec<f64>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

impl CoilTrajectory {
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    fn push(&mut self, t: f64, x: f64, y: f64, z: f64) {
        self.t.push(t);
        self.x.push(x);
        self.y.push(y);
        self.z.push(z);
    }
}

/// Every stage's output for one sensor file.
#[derive(Debug, Clone)]
pub struct ProcessedSensor {
    /// Selected rows, `[t_ms, coordinates...]`.
    pub selected: Vec<Vec<f64>>,
    /// Untransformed per-coil trajectories.
    pub raw: Vec<CoilTrajectory>,
    /// After the linear transform.
    pub transformed: Vec<CoilTrajectory>,
    /// After smoothing.
    pub averaged: Vec<CoilTrajectory>,
}

/// Read a raw sensor CSV: header skipped, trailing empty field dropped.
pub fn load_raw_rows(path: impl AsRef<Path>) -> ScopetraceResult<Vec<Vec<String>>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ScopetraceError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let file = std::fs::File::open(path)?;
    parse_raw_rows(file)
}

/// Parse raw sensor CSV content from any reader.
pub fn parse_raw_rows<R: std::io::Read>(reader: R) -> ScopetraceResult<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let mut fields: Vec<String> = record.iter().map(|f| f.trim().to_string()).collect();
        if fields.last().is_some_and(String::is_empty) {
            fields.pop();
        }
        if fields.iter().all(String::is_empty) {
            continue;
        }
        rows.push(fields);
    }
    Ok(rows)
}

/// Convert the time column to milliseconds since the first row.
pub fn relative_times(rows: &[Vec<String>], time_column: usize) -> ScopetraceResult<Vec<f64>> {
    let mut parsed = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let raw = row.get(time_column).ok_or_else(|| {
            ScopetraceError::parse(format!("row {} has no time column {time_column}", i + 1))
        })?;
        parsed.push(parse_sample_time(raw)?);
    }
    let Some(&first) = parsed.first() else {
        return Ok(vec![]);
    };
    Ok(parsed.into_iter().map(|t| relative_ms(first, t)).collect())
}

/// Select the configured columns, producing `[t_ms, c...]` rows.
pub fn select_columns(
    rows: &[Vec<String>],
    config: &PreprocessConfig,
) -> ScopetraceResult<Vec<Vec<f64>>> {
    let times = relative_times(rows, config.time_column)?;
    let mut selected = Vec::with_capacity(rows.len());

    for (i, (row, t)) in rows.iter().zip(times).enumerate() {
        let columns: Vec<usize> = if config.coordinate_columns.is_empty() {
            (0..row.len()).filter(|c| *c != config.time_column).collect()
        } else {
            config.coordinate_columns.clone()
        };

        let mut out = Vec::with_capacity(columns.len() + 1);
        out.push(t);
        for c in columns {
            let field = row.get(c).ok_or_else(|| {
                ScopetraceError::parse(format!("row {} has no column {c}", i + 1))
            })?;
            let value = field.parse::<f64>().map_err(|e| {
                ScopetraceError::parse(format!("row {} column {c}: {field:?}: {e}", i + 1))
            })?;
            out.push(value);
        }
        selected.push(out);
    }
    Ok(selected)
}

/// Split selected rows into per-coil trajectories.
///
/// A coil whose columns run past the end of a row is skipped for that row.
pub fn shape_coils(rows: &[Vec<f64>], layout: &CoilLayout) -> Vec<CoilTrajectory> {
    let mut coils = vec![CoilTrajectory::default(); layout.coil_count];
    let [ox, oy, oz] = layout.axis_offsets;
    let widest = ox.max(oy).max(oz);

    for row in rows {
        let Some(&t) = row.first() else {
            continue;
        };
        for (n, coil) in coils.iter_mut().enumerate() {
            let base = layout.first_column + n * layout.stride;
            if base + widest >= row.len() {
                continue;
            }
            coil.push(t, row[base + ox], row[base + oy], row[base + oz]);
        }
    }
    coils
}

/// Apply `coord * scale + translation` to every sample, rounded to 0.01.
pub fn transform_coils(
    coils: &[CoilTrajectory],
    transform: &CoilTransform,
) -> ScopetraceResult<Vec<CoilTrajectory>> {
    let apply = |values: &[f64], axis: usize| -> ScopetraceResult<Vec<f64>> {
        values
            .iter()
            .map(|v| round2(v * transform.scale + transform.translation[axis]))
            .collect()
    };
    coils
        .iter()
        .map(|c| {
            Ok(CoilTrajectory {
                t: c.t.clone(),
                x: apply(&c.x, 0)?,
                y: apply(&c.y, 1)?,
                z: apply(&c.z, 2)?,
            })
        })
        .collect()
}

/// Smooth every axis of every coil.
///
/// When the smoother shortens a column, the times are cut to the window
/// centres so `t` stays aligned with the coordinates.
pub fn average_coils(coils: &[CoilTrajectory], smoother: &Smoother) -> Vec<CoilTrajectory> {
    coils
        .iter()
        .map(|c| {
            let x = smoother.smooth(&c.x);
            let offset = c.t.len().saturating_sub(x.len()) / 2;
            let t = c
                .t
                .get(offset..offset + x.len())
                .map(<[f64]>::to_vec)
                .unwrap_or_default();
            CoilTrajectory {
                t,
                x,
                y: smoother.smooth(&c.y),
                z: smoother.smooth(&c.z),
            }
        })
        .collect()
}

/// Arrange trajectories as a coordinate series: one row per tip sample,
/// one column per coil that has a sample at that row.
pub fn coils_to_series(coils: &[CoilTrajectory]) -> CoordinateSeries {
    let Some(tip) = coils.first() else {
        return CoordinateSeries::default();
    };
    let n = tip.len();
    let column = |axis: usize| -> Vec<Vec<f64>> {
        (0..n)
            .map(|i| {
                coils
                    .iter()
                    .filter_map(|c| {
                        let values = match axis {
                            0 => &c.x,
                            1 => &c.y,
                            _ => &c.z,
                        };
                        values.get(i).copied()
                    })
                    .collect()
            })
            .collect()
    };
    CoordinateSeries::new(column(0), column(1), column(2), tip.t.clone())
}

/// Run every stage on already-read rows.
pub fn preprocess_rows(
    rows: &[Vec<String>],
    config: &PreprocessConfig,
) -> ScopetraceResult<ProcessedSensor> {
    let selected = select_columns(rows, config)?;
    let raw = shape_coils(&selected, &config.layout);
    let transformed = transform_coils(&raw, &config.transform)?;
    let smoother = Smoother::from_config(config);
    let averaged = average_coils(&transformed, &smoother);

    tracing::debug!(
        rows = selected.len(),
        coils = raw.len(),
        tip_samples = raw.first().map(CoilTrajectory::len).unwrap_or(0),
        smoothing = ?smoother.algorithm(),
        "Preprocessed sensor rows"
    );
    Ok(ProcessedSensor {
        selected,
        raw,
        transformed,
        averaged,
    })
}

/// Read and preprocess one raw sensor file.
pub fn preprocess_sensor_file(
    path: impl AsRef<Path>,
    config: &PreprocessConfig,
) -> ScopetraceResult<ProcessedSensor> {
    let rows = load_raw_rows(path)?;
    preprocess_rows(&rows, config)
}

/// Round through two-decimal formatting: the nearest two-decimal value to
/// the exact binary number, so `2.625` becomes `2.62`.
fn round2(value: f64) -> ScopetraceResult<f64> {
    format!("{value:.2}")
        .parse::<f64>()
        .map_err(|e| ScopetraceError::processing(format!("cannot round {value}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopetrace_common::config::SmoothingMethod;

    const RAW: &str = "time,c1,c2,c3,c4,c5,c6,\n\
        10:00:00:000000,1.0,2.0,3.0,10.0,20.0,30.0,\n\
        10:00:00:100000,1.5,2.5,3.5,11.0,21.0,31.0,\n\
        10:00:00:250000,2.0,3.0,4.0,12.0,22.0,\n";

    fn two_coil_config() -> PreprocessConfig {
        PreprocessConfig {
            layout: CoilLayout {
                coil_count: 2,
                first_column: 1,
                stride: 3,
                axis_offsets: [0, 1, 2],
            },
            ..PreprocessConfig::default()
        }
    }

    #[test]
    fn test_parse_raw_rows_drops_header_and_terminator() {
        let rows = parse_raw_rows(RAW.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].len(), 7);
        assert_eq!(rows[2].len(), 6);
    }

    #[test]
    fn test_relative_times_in_ms() {
        let rows = parse_raw_rows(RAW.as_bytes()).unwrap();
        let times = relative_times(&rows, 0).unwrap();
        assert_eq!(times.len(), 3);
        assert!((times[0]).abs() < 1e-9);
        assert!((times[1] - 100.0).abs() < 1e-9);
        assert!((times[2] - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_explicit_columns_and_missing_column_error() {
        let rows = parse_raw_rows(RAW.as_bytes()).unwrap();
        let config = PreprocessConfig {
            coordinate_columns: vec![3, 1],
            ..PreprocessConfig::default()
        };
        let selected = select_columns(&rows, &config).unwrap();
        assert_eq!(selected[1], vec![100.0, 3.5, 1.5]);

        let config = PreprocessConfig {
            coordinate_columns: vec![6],
            ..PreprocessConfig::default()
        };
        assert!(select_columns(&rows, &config).is_err());
    }

    #[test]
    fn test_short_row_skips_incomplete_coil() {
        let rows = parse_raw_rows(RAW.as_bytes()).unwrap();
        let out = preprocess_rows(&rows, &two_coil_config()).unwrap();
        assert_eq!(out.raw[0].len(), 3);
        assert_eq!(out.raw[1].len(), 2);
        assert_eq!(out.raw[1].z, vec![30.0, 31.0]);
    }

    #[test]
    fn test_transform_scales_translates_and_rounds() {
        let coil = CoilTrajectory {
            t: vec![0.0],
            x: vec![1.0],
            y: vec![2.0],
            z: vec![3.333],
        };
        let out = transform_coils(
            &[coil],
            &CoilTransform {
                scale: 2.0,
                translation: [10.0, -1.0, 0.0],
            },
        )
        .unwrap();
        assert_eq!(out[0].x, vec![12.0]);
        assert_eq!(out[0].y, vec![3.0]);
        assert_eq!(out[0].z, vec![6.67]);
        assert_eq!(out[0].t, vec![0.0]);
    }

    #[test]
    fn test_rounding_breaks_ties_like_decimal_formatting() {
        assert_eq!(round2(2.625).unwrap(), 2.62);
        assert_eq!(round2(-1.125).unwrap(), -1.12);
        assert_eq!(round2(1.125).unwrap(), 1.12);
        assert_eq!(round2(0.375).unwrap(), 0.38);
        assert_eq!(round2(6.666).unwrap(), 6.67);

        let coil = CoilTrajectory {
            t: vec![0.0, 1.0],
            x: vec![2.625, -1.125],
            y: vec![0.0, 0.0],
            z: vec![0.0, 0.0],
        };
        let out = transform_coils(&[coil], &CoilTransform::default()).unwrap();
        assert_eq!(out[0].x, vec![2.62, -1.12]);
    }

    #[test]
    fn test_moving_average_trims_times_to_window_centres() {
        let rows = parse_raw_rows(RAW.as_bytes()).unwrap();
        let config = PreprocessConfig {
            smoothing: SmoothingMethod::Moving,
            smoothing_window: 2,
            ..two_coil_config()
        };
        let out = preprocess_rows(&rows, &config).unwrap();
        let tip = &out.averaged[0];
        assert_eq!(tip.x, vec![1.25, 1.75]);
        assert_eq!(tip.t, vec![0.0, 100.0]);
        assert_eq!(out.averaged[1].x, vec![10.5]);
        assert_eq!(out.averaged[1].t, vec![0.0]);
    }

    #[test]
    fn test_no_smoothing_passes_transformed_through() {
        let rows = parse_raw_rows(RAW.as_bytes()).unwrap();
        let config = PreprocessConfig {
            smoothing: SmoothingMethod::None,
            ..two_coil_config()
        };
        let out = preprocess_rows(&rows, &config).unwrap();
        assert_eq!(out.averaged, out.transformed);
    }

    #[test]
    fn test_averaged_keeps_length() {
        let rows = parse_raw_rows(RAW.as_bytes()).unwrap();
        let out = preprocess_rows(&rows, &two_coil_config()).unwrap();
        for (avg, raw) in out.averaged.iter().zip(&out.raw) {
            assert_eq!(avg.x.len(), raw.x.len());
            assert_eq!(avg.t, raw.t);
        }
    }

    #[test]
    fn test_coils_to_series_rows_per_tip_sample() {
        let rows = parse_raw_rows(RAW.as_bytes()).unwrap();
        let out = preprocess_rows(&rows, &two_coil_config()).unwrap();
        let series = coils_to_series(&out.raw);
        assert_eq!(series.len(), 3);
        assert_eq!(series.x[0], vec![1.0, 10.0]);
        assert_eq!(series.x[2], vec![2.0]);
        assert_eq!(series.t, vec![0.0, 100.0, 250.0]);
    }

    #[test]
    fn test_bad_time_is_error() {
        let raw = "time,a,\nnoon,1.0,\n";
        let rows = parse_raw_rows(raw.as_bytes()).unwrap();
        assert!(relative_times(&rows, 0).is_err());
    }
}
