//! Error types shared across scopetrace crates.

use std::path::PathBuf;

/// Top-level error type for scopetrace operations.
#[derive(Debug, thiserror::Error)]
pub enum ScopetraceError {
    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Event log error: {message}")]
    Log { message: String },

    #[error("Processing error: {message}")]
    Processing { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Coordinate series is empty: {context}")]
    EmptySeries { context: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ScopetraceError.
pub type ScopetraceResult<T> = Result<T, ScopetraceError>;

impl ScopetraceError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    pub fn log(msg: impl Into<String>) -> Self {
        Self::Log {
            message: msg.into(),
        }
    }

    pub fn processing(msg: impl Into<String>) -> Self {
        Self::Processing {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn empty_series(context: impl Into<String>) -> Self {
        Self::EmptySeries {
            context: context.into(),
        }
    }
}
