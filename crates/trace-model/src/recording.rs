//! Processed recording directories.
//!
//! A recording directory holds one case:
//!
//! ```text
//! <case>/
//!   X.txt Y.txt Z.txt T.txt      coordinate series
//!   LogFile_P.txt | LogFile.txt  procedure event log
//!   animation.mp4                optional
//! ```

use std::path::{Path, PathBuf};

use crate::error::TraceError;
use crate::event_log::{EventLog, PROCESSED_LOG_FILE, RAW_LOG_FILE};
use crate::series::{Axis, CoordinateSeries, TIME_FILE};

/// A recording directory on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingDir {
    pub root: PathBuf,
}

/// A fully loaded recording.
#[derive(Debug, Clone)]
pub struct Recording {
    pub root: PathBuf,
    pub series: CoordinateSeries,
    pub log: EventLog,
}

impl RecordingDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Paths of the X, Y, Z and T files.
    pub fn coordinate_paths(&self) -> [PathBuf; 4] {
        [
            self.root.join(Axis::X.file_name()),
            self.root.join(Axis::Y.file_name()),
            self.root.join(Axis::Z.file_name()),
            self.root.join(TIME_FILE),
        ]
    }

    /// The event log path, preferring the processed log when it exists.
    pub fn log_path(&self) -> PathBuf {
        let processed = self.root.join(PROCESSED_LOG_FILE);
        if processed.exists() {
            return processed;
        }
        let raw = self.root.join(RAW_LOG_FILE);
        if raw.exists() {
            return raw;
        }
        processed
    }

    pub fn load_series(&self) -> Result<CoordinateSeries, TraceError> {
        CoordinateSeries::load(&self.root)
    }

    pub fn load_log(&self) -> Result<EventLog, TraceError> {
        EventLog::load(self.log_path())
    }

    /// Load series and log together.
    pub fn load(&self) -> Result<Recording, TraceError> {
        Ok(Recording {
            root: self.root.clone(),
            series: self.load_series()?,
            log: self.load_log()?,
        })
    }

    /// Check that every expected file exists and the series is consistent.
    pub fn validate_sources(&self) -> Vec<String> {
        let mut errors = vec![];

        for path in self.coordinate_paths() {
            if !path.exists() {
                errors.push(format!("Coordinate file missing: {}", display_name(&path)));
            }
        }
        if !self.log_path().exists() {
            errors.push(format!(
                "Event log missing: expected {PROCESSED_LOG_FILE} or {RAW_LOG_FILE}"
            ));
        }
        if !errors.is_empty() {
            return errors;
        }

        match self.load_series() {
            Ok(series) => errors.extend(series.consistency_issues()),
            Err(e) => errors.push(format!("Coordinate series unreadable: {e}")),
        }
        if let Err(e) = self.load_log() {
            errors.push(format!("Event log unreadable: {e}"));
        }

        errors
    }
}

impl Recording {
    /// Load a recording from a directory.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, TraceError> {
        RecordingDir::new(root.as_ref()).load()
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
