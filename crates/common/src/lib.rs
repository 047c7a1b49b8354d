//! Scopetrace Common Utilities
//!
//! Shared infrastructure for all scopetrace crates:
//! - Error types and result aliases
//! - Clock conversions between event-log and coordinate time
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
