pub mod annotate;
pub mod heatmaps;
pub mod landmarks;
pub mod preprocess;
pub mod report;
pub mod tip_paths;
pub mod validate;
