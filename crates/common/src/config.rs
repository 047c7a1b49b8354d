//! Application configuration.
//!
//! Device-specific constants (column layout, coil count, scaling) are not
//! known to the pipeline; they arrive through [`PreprocessConfig`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ScopetraceError, ScopetraceResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Event-log labels that mark procedural landmarks.
    pub labels: LandmarkLabels,

    /// Raw sensor preprocessing parameters.
    pub preprocess: PreprocessConfig,

    /// Plot output parameters.
    pub plots: PlotConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "scopetrace=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

/// Labels searched for in the event log when resolving landmarks.
///
/// Matching is by substring on the event field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkLabels {
    pub start: String,
    pub cecum: String,
    pub flexure_left: String,
    pub flexure_right: String,
    /// Any of these marks the end of the procedure.
    pub end: Vec<String>,
}

/// Raw sensor CSV preprocessing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Column holding the `HH:MM:SS:ffffff` acquisition time.
    pub time_column: usize,

    /// Raw columns kept after the time column, in output order.
    /// Empty keeps every column after the time column.
    pub coordinate_columns: Vec<usize>,

    /// How coil coordinates are packed into a selected row.
    pub layout: CoilLayout,

    /// Linear transform applied to every coil sample.
    pub transform: CoilTransform,

    /// Smoothing applied to every coil axis.
    pub smoothing: SmoothingMethod,

    /// Smoothing window in samples.
    pub smoothing_window: usize,

    /// Animation rendering parameters.
    pub animation: AnimationConfig,
}

/// Box-window smoothing applied after the coil transform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingMethod {
    /// Centered average, same length as the input.
    #[default]
    Running,
    /// Full windows only; each coil loses `window - 1` samples.
    Moving,
    /// No smoothing.
    None,
}

/// Position of each coil's coordinates inside a selected row.
///
/// Selected rows are `[t, c...]`; coil `n` reads its X/Y/Z from
/// `first_column + n * stride + axis_offsets[axis]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoilLayout {
    pub coil_count: usize,
    pub first_column: usize,
    pub stride: usize,
    pub axis_offsets: [usize; 3],
}

/// Per-coil linear transform: `coord * scale + translation`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoilTransform {
    pub scale: f64,
    pub translation: [f64; 3],
}

/// Closed value range used for plot axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Map `value` into `[0, 1]`; values outside the range fall outside too.
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.span();
        if span.abs() < f64::EPSILON {
            return 0.5;
        }
        (value - self.min) / span
    }
}

/// Animation rendering parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    /// XY panel window (plots `X` against `-Y`).
    pub xy_x: AxisRange,
    pub xy_y: AxisRange,
    /// ZY panel window (plots `Z` against `-Y`).
    pub zy_x: AxisRange,
    pub zy_y: AxisRange,
}

/// Plot output parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub width: u32,
    pub height: u32,
    /// Tip-path plot window on the negated Z axis.
    pub tip_path_x: AxisRange,
    /// Tip-path plot window on the negated Y axis.
    pub tip_path_y: AxisRange,
    /// KDE grid resolution per axis.
    pub heatmap_grid: usize,
    /// Samples dropped after Start before zero-referencing.
    pub zero_reference_skip: usize,
    /// Number of progress ticks on annotated case plots.
    pub progress_fractions: usize,
    /// TrueType font for titles and axis labels. Unset searches the usual
    /// system font locations; without any font the plots carry no text.
    pub font: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl Default for LandmarkLabels {
    fn default() -> Self {
        Self {
            start: "Endoscopy started".to_string(),
            cecum: "Cecum".to_string(),
            flexure_left: "Fleksur L".to_string(),
            flexure_right: "Fleksur R".to_string(),
            end: vec!["Recording ended".to_string(), "Endoscopy ended".to_string()],
        }
    }
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            time_column: 0,
            coordinate_columns: Vec::new(),
            layout: CoilLayout::default(),
            transform: CoilTransform::default(),
            smoothing: SmoothingMethod::Running,
            smoothing_window: 5,
            animation: AnimationConfig::default(),
        }
    }
}

impl Default for CoilLayout {
    fn default() -> Self {
        Self {
            coil_count: 1,
            first_column: 1,
            stride: 3,
            axis_offsets: [0, 1, 2],
        }
    }
}

impl Default for CoilTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translation: [0.0; 3],
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            fps: 5,
            width: 1000,
            height: 500,
            xy_x: AxisRange::new(-250.0, 250.0),
            xy_y: AxisRange::new(-250.0, 250.0),
            zy_x: AxisRange::new(0.0, 500.0),
            zy_y: AxisRange::new(-250.0, 250.0),
        }
    }
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 1500,
            height: 1000,
            tip_path_x: AxisRange::new(-500.0, 0.0),
            tip_path_y: AxisRange::new(-250.0, 300.0),
            heatmap_grid: 400,
            zero_reference_skip: 5,
            progress_fractions: 12,
            font: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load and validate config from an explicit path.
    pub fn load_from(path: impl AsRef<Path>) -> ScopetraceResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScopetraceError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject parameter combinations the pipeline cannot run with.
    pub fn validate(&self) -> ScopetraceResult<()> {
        let pre = &self.preprocess;
        if pre.smoothing_window == 0 {
            return Err(ScopetraceError::config("smoothing_window must be at least 1"));
        }
        if pre.layout.coil_count == 0 {
            return Err(ScopetraceError::config("layout.coil_count must be at least 1"));
        }
        if pre.layout.coil_count > 1 && pre.layout.stride == 0 {
            return Err(ScopetraceError::config(
                "layout.stride must be non-zero with more than one coil",
            ));
        }
        if pre.layout.first_column == 0 {
            return Err(ScopetraceError::config(
                "layout.first_column 0 is the time column",
            ));
        }
        if pre.animation.fps == 0 {
            return Err(ScopetraceError::config("animation.fps must be at least 1"));
        }
        for (name, range) in [
            ("plots.tip_path_x", self.plots.tip_path_x),
            ("plots.tip_path_y", self.plots.tip_path_y),
            ("animation.xy_x", pre.animation.xy_x),
            ("animation.xy_y", pre.animation.xy_y),
            ("animation.zy_x", pre.animation.zy_x),
            ("animation.zy_y", pre.animation.zy_y),
        ] {
            if range.max <= range.min {
                return Err(ScopetraceError::config(format!(
                    "{name}: max must exceed min"
                )));
            }
        }
        if self.plots.heatmap_grid < 2 {
            return Err(ScopetraceError::config("plots.heatmap_grid must be at least 2"));
        }
        Ok(())
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("scopetrace").join("config.json")
}
