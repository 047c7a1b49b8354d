//! Coil-motion animation export.
//!
//! Each frame draws the scope shape at one sample: a polyline through every
//! coil's position, in an XY panel (`X` against `-Y`) and a ZY panel (`Z`
//! against `-Y`) side by side.

use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use scopetrace_common::config::AnimationConfig;
use scopetrace_common::error::{ScopetraceError, ScopetraceResult};
use scopetrace_processing_core::preprocess::CoilTrajectory;

use crate::canvas::{save_png, Margins, PlotCanvas, BLACK};

/// Default file name of an encoded animation inside a case directory.
pub const ANIMATION_FILE: &str = "animation.mp4";

/// Default directory name for PNG frame output inside a case directory.
pub const FRAMES_DIR: &str = "frames";

const ZY_COLOR: Rgb<u8> = Rgb([31, 119, 180]);

/// What the batch driver produces per case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationMode {
    /// Encode `animation.mp4` through ffmpeg.
    #[default]
    Ffmpeg,
    /// Write numbered PNG frames.
    Frames,
    /// Skip animation.
    None,
}

impl AnimationMode {
    /// Backend for this mode, or `None` when animation is disabled.
    pub fn backend(self) -> Option<Box<dyn AnimationBackend>> {
        match self {
            AnimationMode::Ffmpeg => Some(Box::new(FfmpegBackend::new())),
            AnimationMode::Frames => Some(Box::new(PngFrameBackend)),
            AnimationMode::None => None,
        }
    }

    /// Output path for this mode inside `case_dir`.
    pub fn output_path(self, case_dir: &Path) -> Option<PathBuf> {
        match self {
            AnimationMode::Ffmpeg => Some(case_dir.join(ANIMATION_FILE)),
            AnimationMode::Frames => Some(case_dir.join(FRAMES_DIR)),
            AnimationMode::None => None,
        }
    }
}

/// Trait for animation encoders.
pub trait AnimationBackend: Send {
    /// Render every frame of `coils` to `output`.
    fn encode(
        &mut self,
        coils: &[CoilTrajectory],
        config: &AnimationConfig,
        output: &Path,
    ) -> ScopetraceResult<u64>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Number of frames: one per tip sample.
pub fn frame_count(coils: &[CoilTrajectory]) -> usize {
    coils.first().map(CoilTrajectory::len).unwrap_or(0)
}

/// Frame dimensions, rounded down to even values for yuv420p.
pub fn frame_size(config: &AnimationConfig) -> (u32, u32) {
    ((config.width & !1).max(2), (config.height & !1).max(2))
}

/// Render the scope shape at sample `frame`.
///
/// Coils without a sample at `frame` are left out of the polyline.
pub fn render_frame(coils: &[CoilTrajectory], frame: usize, config: &AnimationConfig) -> RgbImage {
    let (width, height) = frame_size(config);
    let panel_width = width / 2;
    let margins = Margins::uniform(20);

    let shape: Vec<(f64, f64, f64)> = coils
        .iter()
        .filter_map(|c| Some((*c.x.get(frame)?, *c.y.get(frame)?, *c.z.get(frame)?)))
        .collect();
    let xy: Vec<(f64, f64)> = shape.iter().map(|&(x, y, _)| (x, -y)).collect();
    let zy: Vec<(f64, f64)> = shape.iter().map(|&(_, y, z)| (z, -y)).collect();

    let mut left = PlotCanvas::new(panel_width, height, margins, config.xy_x, config.xy_y);
    left.draw_frame();
    left.draw_polyline(&xy, BLACK);
    for &(x, y) in &xy {
        left.draw_point(x, y, 2, BLACK);
    }

    let mut right = PlotCanvas::new(width - panel_width, height, margins, config.zy_x, config.zy_y);
    right.draw_frame();
    right.draw_polyline(&zy, ZY_COLOR);
    for &(z, y) in &zy {
        right.draw_point(z, y, 2, ZY_COLOR);
    }

    let mut image = RgbImage::new(width, height);
    image::imageops::replace(&mut image, left.image(), 0, 0);
    image::imageops::replace(&mut image, right.image(), panel_width as i64, 0);
    image
}

/// Pipes raw RGB frames into an ffmpeg child process.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    binary: String,
}

impl FfmpegBackend {
    pub fn new() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
        }
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn args(&self, config: &AnimationConfig, output: &Path) -> Vec<String> {
        let (width, height) = frame_size(config);
        vec![
            "-y".into(),
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-f".into(),
            "rawvideo".into(),
            "-pix_fmt".into(),
            "rgb24".into(),
            "-s".into(),
            format!("{width}x{height}"),
            "-r".into(),
            config.fps.to_string(),
            "-i".into(),
            "-".into(),
            "-c:v".into(),
            "libx264".into(),
            "-pix_fmt".into(),
            "yuv420p".into(),
            output.display().to_string(),
        ]
    }
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationBackend for FfmpegBackend {
    fn encode(
        &mut self,
        coils: &[CoilTrajectory],
        config: &AnimationConfig,
        output: &Path,
    ) -> ScopetraceResult<u64> {
        let args = self.args(config, output);
        tracing::debug!(args = ?args, "Running ffmpeg");

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ScopetraceError::render(format!("Failed to start {}: {e}", self.binary)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ScopetraceError::render("Failed to open ffmpeg stdin"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ScopetraceError::render("Failed to capture ffmpeg stderr"))?;

        // ffmpeg blocks once its stderr pipe fills; drain it on a helper thread.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let total = frame_count(coils);
        let mut written = 0u64;
        let mut write_error = None;
        for frame in 0..total {
            let image = render_frame(coils, frame, config);
            if let Err(e) = stdin.write_all(image.as_raw()) {
                write_error = Some(e);
                break;
            }
            written += 1;
        }
        drop(stdin);

        let status = child
            .wait()
            .map_err(|e| ScopetraceError::render(format!("Failed to wait on ffmpeg: {e}")))?;
        let stderr_output = stderr_task
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(ScopetraceError::render(format!(
                "ffmpeg animation failed (status {}): {}",
                status,
                stderr_output.trim()
            )));
        }
        if let Some(e) = write_error {
            return Err(ScopetraceError::render(format!(
                "ffmpeg closed its input after {written} of {total} frames: {e}"
            )));
        }

        tracing::info!(output = %output.display(), frames = written, fps = config.fps, "Encoded animation");
        Ok(written)
    }

    fn is_available(&self) -> bool {
        command_exists(&self.binary)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Writes `frame_00000.png`, `frame_00001.png`, ... into a directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngFrameBackend;

impl AnimationBackend for PngFrameBackend {
    fn encode(
        &mut self,
        coils: &[CoilTrajectory],
        config: &AnimationConfig,
        output: &Path,
    ) -> ScopetraceResult<u64> {
        std::fs::create_dir_all(output)?;
        let total = frame_count(coils);
        for frame in 0..total {
            let image = render_frame(coils, frame, config);
            save_png(&image, output.join(format!("frame_{frame:05}.png")))?;
        }
        tracing::info!(output = %output.display(), frames = total, "Wrote animation frames");
        Ok(total as u64)
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "png-frames"
    }
}

fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
