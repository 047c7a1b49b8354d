//! Coordinate series: per-axis sample rows plus a time column.
//!
//! On disk each axis is a text file with one row per sample and one value
//! per coil, semicolon-delimited and terminated by a trailing `;`:
//!
//! ```text
//! 12.50;40.10;-3.00;
//! 12.61;40.02;-2.95;
//! ```
//!
//! Column 0 is the scope tip. `T.txt` uses the same format; only its first
//! column is read.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TraceError;

/// Spatial axis of a coordinate series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// File name holding this axis inside a recording directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Axis::X => "X.txt",
            Axis::Y => "Y.txt",
            Axis::Z => "Z.txt",
        }
    }
}

/// File name of the time column inside a recording directory.
pub const TIME_FILE: &str = "T.txt";

/// Per-sample coordinate rows for X, Y, Z and the sample time column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoordinateSeries {
    /// One row per sample, one value per coil.
    pub x: Vec<Vec<f64>>,
    pub y: Vec<Vec<f64>>,
    pub z: Vec<Vec<f64>>,
    /// Sample time in milliseconds.
    pub t: Vec<f64>,
}

impl CoordinateSeries {
    pub fn new(x: Vec<Vec<f64>>, y: Vec<Vec<f64>>, z: Vec<Vec<f64>>, t: Vec<f64>) -> Self {
        Self { x, y, z, t }
    }

    /// Build a single-coil series from flat per-axis columns.
    pub fn from_tip(x: &[f64], y: &[f64], z: &[f64], t: Vec<f64>) -> Self {
        let rows = |values: &[f64]| values.iter().map(|v| vec![*v]).collect();
        Self {
            x: rows(x),
            y: rows(y),
            z: rows(z),
            t,
        }
    }

    /// Load `X.txt`, `Y.txt`, `Z.txt` and `T.txt` from a directory.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, TraceError> {
        let dir = dir.as_ref();
        let x = read_float_rows(dir.join(Axis::X.file_name()))?;
        let y = read_float_rows(dir.join(Axis::Y.file_name()))?;
        let z = read_float_rows(dir.join(Axis::Z.file_name()))?;
        let t_path = dir.join(TIME_FILE);
        let t = read_float_rows(&t_path)?
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                row.first().copied().ok_or_else(|| {
                    TraceError::parse(&t_path, i as u64 + 1, "time row has no values")
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(dir = %dir.display(), samples = t.len(), "Loaded coordinate series");
        Ok(Self { x, y, z, t })
    }

    /// Write the four series files into a directory, creating it if needed.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<(), TraceError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| TraceError::io(dir, e))?;
        for axis in Axis::ALL {
            write_float_rows(dir.join(axis.file_name()), self.axis(axis))?;
        }
        let t_rows: Vec<Vec<f64>> = self.t.iter().map(|t| vec![*t]).collect();
        write_float_rows(dir.join(TIME_FILE), &t_rows)
    }

    /// Number of time samples.
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// Timestamp of the final sample.
    pub fn last_time(&self) -> Option<f64> {
        self.t.last().copied()
    }

    /// All rows of one axis.
    pub fn axis(&self, axis: Axis) -> &[Vec<f64>] {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }

    /// Values of one coil along one axis, for rows `range`.
    ///
    /// The range is clamped to the available rows; rows too short to hold
    /// `coil` are skipped.
    pub fn coil_slice(&self, axis: Axis, coil: usize, start: usize, end: usize) -> Vec<f64> {
        let rows = self.axis(axis);
        let end = end.min(rows.len());
        if start >= end {
            return Vec::new();
        }
        rows[start..end]
            .iter()
            .filter_map(|row| row.get(coil).copied())
            .collect()
    }

    /// Whole tip (coil 0) column of one axis.
    pub fn tip(&self, axis: Axis) -> Vec<f64> {
        self.coil_slice(axis, 0, 0, usize::MAX)
    }

    /// Whether the time column never decreases.
    pub fn is_time_monotonic(&self) -> bool {
        self.t.windows(2).all(|w| w[0] <= w[1])
    }

    /// Human-readable descriptions of structural problems.
    pub fn consistency_issues(&self) -> Vec<String> {
        let mut issues = vec![];
        if self.t.is_empty() {
            issues.push("T.txt has no samples".to_string());
        }
        for axis in Axis::ALL {
            let rows = self.axis(axis);
            if rows.len() != self.t.len() {
                issues.push(format!(
                    "{} has {} rows but T.txt has {}",
                    axis.file_name(),
                    rows.len(),
                    self.t.len()
                ));
            }
            if let Some(i) = rows.iter().position(|row| row.is_empty()) {
                issues.push(format!("{} row {} has no values", axis.file_name(), i + 1));
            }
        }
        if let Some(i) = self.t.windows(2).position(|w| w[1] < w[0]) {
            issues.push(format!(
                "T.txt decreases at row {} ({} -> {})",
                i + 2,
                self.t[i],
                self.t[i + 1]
            ));
        }
        issues
    }
}

/// Read a semicolon-delimited float table.
pub fn read_float_rows(path: impl AsRef<Path>) -> Result<Vec<Vec<f64>>, TraceError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| TraceError::io(path, e))?;
    parse_float_rows(file, path)
}

/// Parse a semicolon-delimited float table from any reader.
///
/// A single trailing empty field (the row terminator `;`) is dropped.
/// Blank rows are skipped.
pub fn parse_float_rows<R: Read>(reader: R, origin: &Path) -> Result<Vec<Vec<f64>>, TraceError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b';')
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| TraceError::CsvError {
            path: origin.to_path_buf(),
            source: e,
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let mut fields: Vec<&str> = record.iter().map(str::trim).collect();
        if fields.last().is_some_and(|f| f.is_empty()) {
            fields.pop();
        }
        if fields.is_empty() || fields.iter().all(|f| f.is_empty()) {
            continue;
        }

        let row = fields
            .iter()
            .map(|field| {
                field.parse::<f64>().map_err(|e| {
                    TraceError::parse(origin, line, format!("invalid number {field:?}: {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(row);
    }
    Ok(rows)
}

/// Write a float table in the semicolon/trailing-terminator format.
pub fn write_float_rows(path: impl AsRef<Path>, rows: &[Vec<f64>]) -> Result<(), TraceError> {
    let path = path.as_ref();
    let csv_err = |e| TraceError::CsvError {
        path: path.to_path_buf(),
        source: e,
    };
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .delimiter(b';')
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    for row in rows {
        let mut fields: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        fields.push(String::new());
        wtr.write_record(&fields).map_err(csv_err)?;
    }
    wtr.flush().map_err(|e| TraceError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Vec<Vec<f64>> {
        parse_float_rows(text.as_bytes(), Path::new("inline.txt")).unwrap()
    }

    #[test]
    fn test_trailing_terminator_dropped() {
        let rows = parse("1.5;2.5;\n-3;4e2;\n");
        assert_eq!(rows, vec![vec![1.5, 2.5], vec![-3.0, 400.0]]);
    }

    #[test]
    fn test_row_without_terminator_keeps_all_values() {
        let rows = parse("1;2;3\n");
        assert_eq!(rows, vec![vec![1.0, 2.0, 3.0]]);
    }

    #[test]
    fn test_blank_rows_skipped() {
        let rows = parse("1;\n\n2;\n");
        assert_eq!(rows, vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn test_invalid_number_reports_line() {
        let err = parse_float_rows("1;\nabc;\n".as_bytes(), Path::new("X.txt")).unwrap_err();
        match err {
            TraceError::ParseError { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_coil_slice_clamps_range() {
        let series = CoordinateSeries::from_tip(
            &[1.0, 2.0, 3.0],
            &[4.0, 5.0, 6.0],
            &[7.0, 8.0, 9.0],
            vec![0.0, 10.0, 20.0],
        );
        assert_eq!(series.coil_slice(Axis::X, 0, 1, 99), vec![2.0, 3.0]);
        assert!(series.coil_slice(Axis::X, 0, 2, 1).is_empty());
        assert!(series.coil_slice(Axis::X, 1, 0, 3).is_empty());
    }

    #[test]
    fn test_consistency_issues_detects_length_and_order() {
        let mut series = CoordinateSeries::from_tip(
            &[1.0, 2.0],
            &[1.0, 2.0],
            &[1.0, 2.0],
            vec![0.0, 10.0],
        );
        assert!(series.consistency_issues().is_empty());
        assert!(series.is_time_monotonic());

        series.t = vec![10.0, 0.0, 20.0];
        let issues = series.consistency_issues();
        assert!(issues.iter().any(|i| i.contains("X.txt has 2 rows")));
        assert!(issues.iter().any(|i| i.contains("decreases at row 2")));
        assert!(!series.is_time_monotonic());
    }

    #[test]
    fn test_save_and_load_directory() {
        let dir = std::env::temp_dir().join("scopetrace_test_series");
        let _ = std::fs::remove_dir_all(&dir);

        let series = CoordinateSeries::new(
            vec![vec![1.25, -2.0], vec![1.5, -2.5]],
            vec![vec![0.0, 3.0], vec![0.1, 3.1]],
            vec![vec![9.0, 8.0], vec![9.5, 8.5]],
            vec![0.0, 16.5],
        );
        series.save(&dir).unwrap();

        let x_text = std::fs::read_to_string(dir.join("X.txt")).unwrap();
        assert_eq!(x_text.lines().next(), Some("1.25;-2;"));

        let loaded = CoordinateSeries::load(&dir).unwrap();
        assert_eq!(loaded, series);

        std::fs::remove_dir_all(&dir).ok();
    }
}
