//! Errors raised while reading or writing recording files.

use std::path::PathBuf;

use scopetrace_common::error::ScopetraceError;

/// Errors that can occur when working with recording files.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    CsvError { path: PathBuf, source: csv::Error },

    #[error("Parse error in {path} line {line}: {message}")]
    ParseError {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("Invalid recording: {message}")]
    ValidationError { message: String },
}

impl TraceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, line: u64, message: impl Into<String>) -> Self {
        Self::ParseError {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}

impl From<TraceError> for ScopetraceError {
    fn from(err: TraceError) -> Self {
        match err {
            TraceError::IoError { path, source }
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                ScopetraceError::FileNotFound { path }
            }
            TraceError::IoError { .. } | TraceError::CsvError { .. } => {
                ScopetraceError::Other(anyhow::Error::new(err))
            }
            TraceError::ParseError { .. } => ScopetraceError::parse(err.to_string()),
            TraceError::ValidationError { message } => ScopetraceError::processing(message),
        }
    }
}
