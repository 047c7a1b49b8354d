//! Scopetrace Processing Core
//!
//! Turns loaded recordings into analysis results:
//! - **Alignment:** Map event-log times onto the coordinate series clock
//! - **Landmarks:** Resolve procedural landmarks and discrete events to indices
//! - **Preprocessing:** Raw sensor CSV to per-coil smoothed trajectories
//! - **Segments:** Tip paths cut at landmarks
//! - **Heatmaps:** Gaussian kernel density of tip positions
//!
//! Apart from reading raw sensor files in [`preprocess`], this crate is
//! pure computation.

pub mod alignment;
pub mod heatmap;
pub mod landmarks;
pub mod preprocess;
pub mod segment;
pub mod smoothing;

pub use alignment::{calculate_index, nearest_index, SearchStrategy, TimestampReconciler};
pub use heatmap::{Bandwidth, DensityGrid, GaussianKde, HeatmapConfig};
pub use landmarks::{extract_events, extract_landmarks, EventIndexes, LandmarkIndexes};
pub use preprocess::{preprocess_sensor_file, CoilTrajectory, ProcessedSensor};
pub use segment::{fractional_indexes, TipPath};
pub use smoothing::{moving_average, running_average, Smoother, SmoothingAlgorithm};
