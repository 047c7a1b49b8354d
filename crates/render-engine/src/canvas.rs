//! Raster canvas with a data-space plot window.
//!
//! Data coordinates are mapped into a rectangular plot area inside the
//! image; the Y axis points up. Anything outside the configured window is
//! clipped.

use std::path::Path;

use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_cross_mut, draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut,
    draw_line_segment_mut,
};
use imageproc::rect::Rect;

use scopetrace_common::config::AxisRange;
use scopetrace_common::error::ScopetraceResult;

use crate::colormap::ColorRamp;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const AXIS_GREY: Rgb<u8> = Rgb([90, 90, 90]);

/// Pixel margins around the plot area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Margins {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl Margins {
    pub const fn uniform(px: u32) -> Self {
        Self {
            left: px,
            right: px,
            top: px,
            bottom: px,
        }
    }
}

/// Plot area in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotArea {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl PlotArea {
    pub fn right(&self) -> u32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.top + self.height
    }
}

#[derive(Debug, Clone)]
pub struct PlotCanvas {
    image: RgbImage,
    area: PlotArea,
    x_range: AxisRange,
    y_range: AxisRange,
}

impl PlotCanvas {
    /// White canvas of `width x height` with the plot area inset by `margins`.
    pub fn new(
        width: u32,
        height: u32,
        margins: Margins,
        x_range: AxisRange,
        y_range: AxisRange,
    ) -> Self {
        let width = width.max(margins.left + margins.right + 2);
        let height = height.max(margins.top + margins.bottom + 2);
        let area = PlotArea {
            left: margins.left,
            top: margins.top,
            width: width - margins.left - margins.right,
            height: height - margins.top - margins.bottom,
        };
        Self {
            image: RgbImage::from_pixel(width, height, WHITE),
            area,
            x_range,
            y_range,
        }
    }

    pub fn area(&self) -> PlotArea {
        self.area
    }

    pub fn x_range(&self) -> AxisRange {
        self.x_range
    }

    pub fn y_range(&self) -> AxisRange {
        self.y_range
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbImage {
        &mut self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Pixel position of a data point, or `None` when it falls outside the
    /// window or is not finite.
    pub fn project(&self, x: f64, y: f64) -> Option<(f32, f32)> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let nx = self.x_range.normalize(x);
        let ny = self.y_range.normalize(y);
        if !(0.0..=1.0).contains(&nx) || !(0.0..=1.0).contains(&ny) {
            return None;
        }
        let px = self.area.left as f64 + nx * (self.area.width - 1) as f64;
        let py = self.area.top as f64 + (1.0 - ny) * (self.area.height - 1) as f64;
        Some((px as f32, py as f32))
    }

    pub fn draw_point(&mut self, x: f64, y: f64, radius: i32, color: Rgb<u8>) {
        if let Some((px, py)) = self.project(x, y) {
            draw_filled_circle_mut(&mut self.image, (px.round() as i32, py.round() as i32), radius, color);
        }
    }

    pub fn draw_cross(&mut self, x: f64, y: f64, color: Rgb<u8>) {
        if let Some((px, py)) = self.project(x, y) {
            draw_cross_mut(&mut self.image, color, px.round() as i32, py.round() as i32);
        }
    }

    /// Connect consecutive points; segments with a clipped end are skipped.
    pub fn draw_polyline(&mut self, points: &[(f64, f64)], color: Rgb<u8>) {
        for pair in points.windows(2) {
            let a = self.project(pair[0].0, pair[0].1);
            let b = self.project(pair[1].0, pair[1].1);
            if let (Some(a), Some(b)) = (a, b) {
                draw_line_segment_mut(&mut self.image, a, b, color);
            }
        }
    }

    /// Outline of the plot area.
    pub fn draw_frame(&mut self) {
        let rect = Rect::at(self.area.left as i32 - 1, self.area.top as i32 - 1)
            .of_size(self.area.width + 2, self.area.height + 2);
        draw_hollow_rect_mut(&mut self.image, rect, AXIS_GREY);
    }

    /// Horizontal colour bar, low end on the left.
    pub fn draw_horizontal_colorbar(&mut self, ramp: ColorRamp, rect: PlotArea) {
        let steps = rect.width.max(1);
        for i in 0..steps {
            let color = ramp.sample(i as f64 / (steps.max(2) - 1) as f64);
            let column = Rect::at((rect.left + i) as i32, rect.top as i32).of_size(1, rect.height.max(1));
            draw_filled_rect_mut(&mut self.image, column, color);
        }
        self.outline(rect);
    }

    /// Vertical colour bar, low end at the bottom.
    pub fn draw_vertical_colorbar(&mut self, ramp: ColorRamp, rect: PlotArea) {
        let steps = rect.height.max(1);
        for i in 0..steps {
            let color = ramp.sample(1.0 - i as f64 / (steps.max(2) - 1) as f64);
            let row = Rect::at(rect.left as i32, (rect.top + i) as i32).of_size(rect.width.max(1), 1);
            draw_filled_rect_mut(&mut self.image, row, color);
        }
        self.outline(rect);
    }

    fn outline(&mut self, rect: PlotArea) {
        let frame = Rect::at(rect.left as i32 - 1, rect.top as i32 - 1)
            .of_size(rect.width.max(1) + 2, rect.height.max(1) + 2);
        draw_hollow_rect_mut(&mut self.image, frame, AXIS_GREY);
    }
}

/// Write `image` as PNG, creating parent directories.
pub fn save_png(image: &RgbImage, path: impl AsRef<Path>) -> ScopetraceResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    image.save_with_format(path, image::ImageFormat::Png)?;
    tracing::debug!(path = %path.display(), width = image.width(), height = image.height(), "Wrote PNG");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> PlotCanvas {
        PlotCanvas::new(
            120,
            100,
            Margins::uniform(10),
            AxisRange::new(0.0, 10.0),
            AxisRange::new(-5.0, 5.0),
        )
    }

    #[test]
    fn test_project_corners_and_flip() {
        let c = canvas();
        assert_eq!(c.project(0.0, -5.0), Some((10.0, 89.0)));
        assert_eq!(c.project(10.0, 5.0), Some((109.0, 10.0)));
    }

    #[test]
    fn test_project_clips_outside_window() {
        let c = canvas();
        assert!(c.project(-0.1, 0.0).is_none());
        assert!(c.project(5.0, 5.1).is_none());
        assert!(c.project(f64::NAN, 0.0).is_none());
    }

    #[test]
    fn test_draw_point_colours_pixels() {
        let mut c = canvas();
        c.draw_point(5.0, 0.0, 2, BLACK);
        let (px, py) = c.project(5.0, 0.0).unwrap();
        assert_eq!(*c.image().get_pixel(px.round() as u32, py.round() as u32), BLACK);
        assert_eq!(*c.image().get_pixel(0, 0), WHITE);
    }

    #[test]
    fn test_vertical_colorbar_high_end_on_top() {
        let mut c = canvas();
        let bar = PlotArea {
            left: 112,
            top: 10,
            width: 4,
            height: 50,
        };
        c.draw_vertical_colorbar(ColorRamp::Inferno, bar);
        assert_eq!(*c.image().get_pixel(113, 10), ColorRamp::Inferno.sample(1.0));
        assert_eq!(*c.image().get_pixel(113, 59), ColorRamp::Inferno.sample(0.0));
    }

    #[test]
    fn test_save_png_round_trip() {
        let dir = std::env::temp_dir().join("scopetrace_test_canvas_png");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("plot.png");
        save_png(canvas().image(), &path).unwrap();
        let loaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(loaded.dimensions(), (120, 100));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
