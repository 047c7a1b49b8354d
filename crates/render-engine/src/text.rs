//! Plot titles and axis labels.
//!
//! No font ships with the crate: one is loaded at runtime from
//! [`PlotConfig::font`] or a well-known system location.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ab_glyph::FontVec;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};

use scopetrace_common::config::PlotConfig;
use scopetrace_common::error::{ScopetraceError, ScopetraceResult};

/// Searched in order when no font is configured.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// A loaded TrueType font, cheap to clone.
#[derive(Clone)]
pub struct LabelFont {
    font: Arc<FontVec>,
    path: PathBuf,
}

impl fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelFont").field("path", &self.path).finish()
    }
}

impl LabelFont {
    pub fn load(path: impl AsRef<Path>) -> ScopetraceResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScopetraceError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let data = std::fs::read(path)?;
        let font = FontVec::try_from_vec(data).map_err(|e| {
            ScopetraceError::render(format!("invalid font {}: {e}", path.display()))
        })?;
        Ok(Self {
            font: Arc::new(font),
            path: path.to_path_buf(),
        })
    }

    /// The configured font, else the first system font that loads.
    pub fn for_plots(config: &PlotConfig) -> Option<Self> {
        if let Some(path) = &config.font {
            match Self::load(path) {
                Ok(font) => return Some(font),
                Err(e) => tracing::warn!(
                    font = %path.display(),
                    error = %e,
                    "Cannot load plot font, trying system fonts"
                ),
            }
        }
        let found = SYSTEM_FONTS
            .iter()
            .map(Path::new)
            .filter(|p| p.exists())
            .find_map(|p| Self::load(p).ok());
        match &found {
            Some(font) => tracing::debug!(font = %font.path.display(), "Using plot font"),
            None => tracing::debug!("No plot font found; plots carry no labels"),
        }
        found
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Width and height in pixels of `text` at `size`.
    pub fn measure(&self, text: &str, size: f32) -> (u32, u32) {
        text_size(size, &*self.font, text)
    }

    /// Draw `text` with its top-left corner at `(x, y)`.
    pub fn draw(&self, image: &mut RgbImage, text: &str, x: i32, y: i32, size: f32, color: Rgb<u8>) {
        draw_text_mut(image, color, x, y, size, &*self.font, text);
    }

    /// Draw `text` horizontally centred on `center_x`.
    pub fn draw_centered(
        &self,
        image: &mut RgbImage,
        text: &str,
        center_x: i32,
        y: i32,
        size: f32,
        color: Rgb<u8>,
    ) {
        let (width, _) = self.measure(text, size);
        self.draw(image, text, center_x - width as i32 / 2, y, size, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_rejects_missing_and_invalid_fonts() {
        let dir = std::env::temp_dir().join("scopetrace_test_label_font");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        assert!(matches!(
            LabelFont::load(dir.join("none.ttf")),
            Err(ScopetraceError::FileNotFound { .. })
        ));

        let bogus = dir.join("bogus.ttf");
        std::fs::write(&bogus, b"not a font").unwrap();
        assert!(LabelFont::load(&bogus).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_unloadable_configured_font_falls_back() {
        let config = PlotConfig {
            font: Some(PathBuf::from("/nonexistent/scopetrace.ttf")),
            ..PlotConfig::default()
        };
        if let Some(font) = LabelFont::for_plots(&config) {
            assert_ne!(font.path(), Path::new("/nonexistent/scopetrace.ttf"));
        }
    }

    #[test]
    fn test_draw_marks_pixels() {
        let Some(font) = LabelFont::for_plots(&PlotConfig::default()) else {
            return;
        };
        let mut image = RgbImage::from_pixel(120, 40, Rgb([255, 255, 255]));
        font.draw_centered(&mut image, "Set 1", 60, 10, 18.0, Rgb([0, 0, 0]));
        assert!(image.pixels().any(|p| p.0[0] < 128));
        let (width, height) = font.measure("Set 1", 18.0);
        assert!(width > 0 && height > 0);
    }
}
