//! Scopetrace Trace Model
//!
//! Defines the on-disk data contracts for endoscopy recordings:
//! - **Series:** per-axis coordinate rows (one value per coil) and sample times
//! - **Event log:** semicolon-delimited procedure events on their own clock
//! - **Recording:** directory layout tying series and log together
//! - **Meta:** the `SIMMETA.txt` case index written by preprocessing
//!
//! Coordinate times are milliseconds relative to the first raw sample;
//! event-log times are seconds.

pub mod error;
pub mod event_log;
pub mod meta;
pub mod recording;
pub mod series;

pub use error::*;
pub use event_log::*;
pub use meta::*;
pub use recording::*;
pub use series::*;
