//! Scopetrace Render Engine
//!
//! Turns processed data into files on disk:
//!
//! ```text
//! raw sensor CSVs ──► batch ──► case dirs (X/Y/Z/T, LogFile) + animation
//!                                    │
//! SIMMETA.txt ───────────────────────┤
//!                                    ├──► <key>_tip_path.png
//!                                    ├──► <key>_kde.png
//!                                    └──► annotated case PNG
//! ```

pub mod animation;
pub mod batch;
pub mod canvas;
pub mod colormap;
pub mod plots;
pub mod report;
pub mod text;

pub use animation::{AnimationBackend, AnimationMode, FfmpegBackend, PngFrameBackend};
pub use batch::{run_batch, BatchCase, BatchJob, BatchSummary};
pub use report::{
    annotate_case, full_report, plot_multiple_case_tip_paths, zeroed_heatmaps, ReportContext,
    ReportSummary,
};
pub use text::LabelFont;
