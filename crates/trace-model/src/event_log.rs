//! Procedure event logs.
//!
//! Logs are semicolon-delimited text, `timestamp;event;...` per line, with
//! a header on the first line. Timestamps are seconds on the logging
//! application's own clock, unrelated to the coordinate clock except that
//! both streams end together.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::TraceError;

/// Preferred event log file name (post-processed log).
pub const PROCESSED_LOG_FILE: &str = "LogFile_P.txt";

/// Event log file name as written by the simulator.
pub const RAW_LOG_FILE: &str = "LogFile.txt";

/// Discrete procedure events tracked by exact label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProcedureEvent {
    Flush,
    Biopsy,
    Polyp,
    Polypectomi,
}

impl ProcedureEvent {
    pub const ALL: [ProcedureEvent; 4] = [
        ProcedureEvent::Flush,
        ProcedureEvent::Biopsy,
        ProcedureEvent::Polyp,
        ProcedureEvent::Polypectomi,
    ];

    /// Label as it appears in the log.
    pub fn label(self) -> &'static str {
        match self {
            ProcedureEvent::Flush => "Flush",
            ProcedureEvent::Biopsy => "Biopsy",
            ProcedureEvent::Polyp => "Polyp",
            ProcedureEvent::Polypectomi => "Polypectomi",
        }
    }

    /// Exact (whitespace-trimmed) label match; `"Polyp"` never matches `Polypectomi`.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|e| e.label() == label)
    }
}

/// One non-blank line of an event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    /// 1-based line number in the source file.
    pub line_no: u64,
    /// First field, unparsed.
    pub timestamp: String,
    /// Second field.
    pub label: String,
}

impl LogLine {
    /// Whether the label contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.label.contains(needle)
    }
}

/// A parsed event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLog {
    /// Where the log was read from (empty for in-memory logs).
    pub path: PathBuf,
    /// All lines with at least two fields, in file order.
    pub lines: Vec<LogLine>,
    /// Timestamp of the last non-blank line, in seconds.
    pub end_secs: f64,
}

impl EventLog {
    /// Read and parse a log file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| TraceError::io(path, e))?;
        Self::parse(&content, path)
    }

    /// Parse log text. `origin` is used for error messages only.
    ///
    /// Lines without a `;` are skipped. The last non-blank line must start
    /// with a numeric timestamp: it anchors the log clock to the end of
    /// the coordinate series.
    pub fn parse(content: &str, origin: impl AsRef<Path>) -> Result<Self, TraceError> {
        let origin = origin.as_ref();
        let mut lines = Vec::new();
        let mut last_non_blank: Option<(u64, &str)> = None;

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx as u64 + 1;
            let raw = raw.trim_end_matches('\r');
            if raw.trim().is_empty() {
                continue;
            }
            last_non_blank = Some((line_no, raw));

            let mut fields = raw.split(';');
            let (Some(timestamp), Some(label)) = (fields.next(), fields.next()) else {
                tracing::debug!(line = line_no, "Skipping log line without event field");
                continue;
            };
            lines.push(LogLine {
                line_no,
                timestamp: timestamp.to_string(),
                label: label.to_string(),
            });
        }

        let (end_line, end_raw) = last_non_blank.ok_or_else(|| TraceError::ValidationError {
            message: format!("event log {} is empty", origin.display()),
        })?;
        let end_field = end_raw.split(';').next().unwrap_or_default();
        let end_secs = parse_timestamp(end_field)
            .map_err(|message| TraceError::parse(origin, end_line, message))?;

        Ok(Self {
            path: origin.to_path_buf(),
            lines,
            end_secs,
        })
    }

    /// Log end time in milliseconds.
    pub fn end_ms(&self) -> f64 {
        scopetrace_common::clock::secs_to_ms(self.end_secs)
    }

    /// Lines after the header (the first line of the file).
    pub fn body(&self) -> impl Iterator<Item = &LogLine> {
        self.lines.iter().filter(|l| l.line_no > 1)
    }

    /// Parse a line's timestamp, attributing failures to this log.
    pub fn timestamp_of(&self, line: &LogLine) -> Result<f64, TraceError> {
        parse_timestamp(&line.timestamp)
            .map_err(|message| TraceError::parse(&self.path, line.line_no, message))
    }
}

fn parse_timestamp(field: &str) -> Result<f64, String> {
    let field = field.trim();
    field
        .parse::<f64>()
        .map_err(|e| format!("invalid timestamp {field:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Time;Event;Info\n\
        1.0;Endoscopy started;\n\
        5.5;Fleksur L;\n\
        7.25;Flush;\n\
        9.0;Cecum;\n\
        12.0;Recording ended;\n";

    #[test]
    fn test_parse_keeps_header_and_end_time() {
        let log = EventLog::parse(SAMPLE, "LogFile_P.txt").unwrap();
        assert_eq!(log.lines.len(), 6);
        assert_eq!(log.lines[0].label, "Event");
        assert!((log.end_secs - 12.0).abs() < 1e-12);
        assert!((log.end_ms() - 12_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_body_skips_first_line() {
        let log = EventLog::parse(SAMPLE, "log").unwrap();
        let labels: Vec<&str> = log.body().map(|l| l.label.as_str()).collect();
        assert_eq!(labels.first(), Some(&"Endoscopy started"));
        assert_eq!(labels.len(), 5);
    }

    #[test]
    fn test_lines_without_event_field_skipped() {
        let log = EventLog::parse("Time;Event\ngarbage\n\n3.0;Flush;\n", "log").unwrap();
        assert_eq!(log.lines.len(), 2);
        assert_eq!(log.lines[1].line_no, 4);
    }

    #[test]
    fn test_trailing_blank_lines_do_not_affect_end() {
        let log = EventLog::parse("Time;Event\n4.5;Flush;\n\n  \n", "log").unwrap();
        assert!((log.end_secs - 4.5).abs() < 1e-12);
    }

    #[test]
    fn test_non_numeric_end_is_error() {
        let err = EventLog::parse("Time;Event\n", "log").unwrap_err();
        assert!(matches!(err, TraceError::ParseError { line: 1, .. }));
        assert!(EventLog::parse("", "log").is_err());
    }

    #[test]
    fn test_procedure_event_exact_labels() {
        assert_eq!(ProcedureEvent::from_label("Polyp"), Some(ProcedureEvent::Polyp));
        assert_eq!(
            ProcedureEvent::from_label(" Polypectomi "),
            Some(ProcedureEvent::Polypectomi)
        );
        assert_eq!(ProcedureEvent::from_label("Polyp found"), None);
    }

    #[test]
    fn test_timestamp_of_reports_line() {
        let log = EventLog::parse("Time;Event\nxx;Cecum;\n1;End\n", "log").unwrap();
        let err = log.timestamp_of(&log.lines[1]).unwrap_err();
        assert!(matches!(err, TraceError::ParseError { line: 2, .. }));
    }
}
