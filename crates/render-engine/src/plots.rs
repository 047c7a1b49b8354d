//! Static plots: multi-case tip paths, density heatmaps and annotated cases.
//!
//! All plots use the patient-side view: negated Z on the horizontal axis,
//! negated Y on the vertical axis.

use image::{Rgb, RgbImage};

use scopetrace_common::config::PlotConfig;
use scopetrace_processing_core::heatmap::DensityGrid;
use scopetrace_processing_core::landmarks::{EventIndexes, LandmarkIndexes};
use scopetrace_processing_core::segment::{fractional_indexes, TipPath};
use scopetrace_trace_model::event_log::ProcedureEvent;
use scopetrace_trace_model::series::CoordinateSeries;

use crate::canvas::{Margins, PlotArea, PlotCanvas, BLACK};
use crate::colormap::ColorRamp;
use crate::text::LabelFont;

const POINT_RADIUS: i32 = 3;
const MARKER_RADIUS: i32 = 9;
const COLORBAR_COLUMN: u32 = 200;
const TITLE_SIZE: f32 = 22.0;
const LABEL_SIZE: f32 = 16.0;

pub const TIP_PATH_TITLE: &str = "Scope Tip Intubation Path";
pub const HEATMAP_TITLE: &str = "Scope Tip Position Density";
pub const ANNOTATION_TITLE: &str = "Scope Tip Path with Landmarks";

/// Title above the plot area, X label below it, Y label at its left.
fn label_axes(
    canvas: &mut PlotCanvas,
    font: Option<&LabelFont>,
    title: &str,
    x_label: &str,
    y_label: &str,
) {
    let Some(font) = font else {
        return;
    };
    let area = canvas.area();
    let center = (area.left + area.width / 2) as i32;
    let image = canvas.image_mut();
    font.draw_centered(image, title, center, area.top as i32 - 36, TITLE_SIZE, BLACK);
    font.draw_centered(image, x_label, center, area.bottom() as i32 + 12, LABEL_SIZE, BLACK);
    let (_, height) = font.measure(y_label, LABEL_SIZE);
    let middle = (area.top + area.height / 2) as i32 - height as i32 / 2;
    font.draw(image, y_label, 6, middle, LABEL_SIZE, BLACK);
}

/// Scatter each case's insertion path coloured by progress along its own
/// ramp, with one horizontal colour bar per case stacked right of the plot.
///
/// With a font, the bars are labelled `Set 1`, `Set 2`, ... in case order.
pub fn render_tip_paths(
    paths: &[TipPath],
    config: &PlotConfig,
    font: Option<&LabelFont>,
) -> RgbImage {
    let margins = Margins {
        left: 60,
        right: COLORBAR_COLUMN + 40,
        top: 50,
        bottom: 60,
    };
    let mut canvas = PlotCanvas::new(
        config.width,
        config.height,
        margins,
        config.tip_path_x,
        config.tip_path_y,
    );
    canvas.draw_frame();

    let area = canvas.area();
    let bar_height = (area.height / 14).max(4);
    let bar_spacing = (area.height / 10).max(bar_height + 4);

    for (index, path) in paths.iter().enumerate() {
        let ramp = ColorRamp::for_case(index);
        let colors = ramp.linspace(path.len());
        for ((z, y), color) in path.zy_points().into_iter().zip(colors) {
            canvas.draw_point(z, y, POINT_RADIUS, color);
        }

        let top = area.top + index as u32 * (bar_height + bar_spacing);
        if top + bar_height <= area.bottom() {
            let bar = PlotArea {
                left: area.right() + 20,
                top,
                width: COLORBAR_COLUMN,
                height: bar_height,
            };
            canvas.draw_horizontal_colorbar(ramp, bar);
            if let Some(font) = font {
                let label = format!("Set {}", index + 1);
                let y = bar.top as i32 - LABEL_SIZE as i32 - 2;
                font.draw(canvas.image_mut(), &label, bar.left as i32, y, LABEL_SIZE, BLACK);
            }
        }
    }
    label_axes(&mut canvas, font, TIP_PATH_TITLE, "-Z", "-Y");

    canvas.into_image()
}

/// Density grid drawn with origin at the lower left, plus a vertical colour
/// bar on the right.
pub fn render_heatmap(
    grid: &DensityGrid,
    config: &PlotConfig,
    font: Option<&LabelFont>,
) -> RgbImage {
    let margins = Margins {
        left: 40,
        right: 140,
        top: 50,
        bottom: 40,
    };
    let mut canvas = PlotCanvas::new(
        config.width,
        config.height,
        margins,
        grid.x_range,
        grid.y_range,
    );
    let area = canvas.area();
    let ramp = ColorRamp::Inferno;

    for py in 0..area.height {
        // Image rows run downwards, grid rows upwards.
        let v = 1.0 - py as f64 / (area.height - 1).max(1) as f64;
        let row = nearest_cell(v, grid.rows);
        for px in 0..area.width {
            let u = px as f64 / (area.width - 1).max(1) as f64;
            let col = nearest_cell(u, grid.cols);
            let value = grid.normalized_cell(col, row).unwrap_or(0.0);
            canvas
                .image_mut()
                .put_pixel(area.left + px, area.top + py, ramp.sample(value));
        }
    }
    canvas.draw_frame();
    let bar = PlotArea {
        left: area.right() + 40,
        top: area.top,
        width: 30,
        height: area.height,
    };
    canvas.draw_vertical_colorbar(ramp, bar);
    if let Some(font) = font {
        let center = (bar.left + bar.width / 2) as i32;
        let y = bar.top as i32 - LABEL_SIZE as i32 - 4;
        font.draw_centered(canvas.image_mut(), "Density", center, y, LABEL_SIZE, BLACK);
    }
    label_axes(&mut canvas, font, HEATMAP_TITLE, "-Z (from Start)", "-Y");

    canvas.into_image()
}

/// Landmark marker colours, in [`LandmarkIndexes::named`] order.
const LANDMARK_COLORS: [Rgb<u8>; 5] = [
    Rgb([44, 160, 44]),
    Rgb([31, 119, 180]),
    Rgb([148, 103, 189]),
    Rgb([214, 39, 40]),
    Rgb([0, 0, 0]),
];

fn event_color(event: ProcedureEvent) -> Rgb<u8> {
    match event {
        ProcedureEvent::Flush => Rgb([23, 190, 207]),
        ProcedureEvent::Biopsy => Rgb([255, 127, 14]),
        ProcedureEvent::Polyp => Rgb([227, 119, 194]),
        ProcedureEvent::Polypectomi => Rgb([140, 86, 75]),
    }
}

/// Tip path from Start through End with landmark markers, discrete-event
/// crosses and progress ticks at fractional indexes.
///
/// Landmarks and events outside the drawn span are left off.
pub fn render_case_annotation(
    series: &CoordinateSeries,
    landmarks: &LandmarkIndexes,
    events: &EventIndexes,
    config: &PlotConfig,
    font: Option<&LabelFont>,
) -> RgbImage {
    let end = landmarks.end.max(landmarks.start).saturating_add(1);
    let path = TipPath::between(series, landmarks.start, end);
    let points = path.zy_points();

    let mut canvas = PlotCanvas::new(
        config.width,
        config.height,
        Margins::uniform(50),
        config.tip_path_x,
        config.tip_path_y,
    );
    canvas.draw_frame();

    let ramp = ColorRamp::Greys.linspace(points.len());
    canvas.draw_polyline(&points, Rgb([170, 170, 170]));
    for (&(z, y), color) in points.iter().zip(ramp) {
        canvas.draw_point(z, y, 1, color);
    }

    for index in fractional_indexes(points.len(), config.progress_fractions) {
        let (z, y) = points[index];
        canvas.draw_point(z, y, POINT_RADIUS + 1, BLACK);
    }

    for (event, indexes) in events.iter() {
        for &i in indexes {
            if let Some(local) = path.local_index(i) {
                let (z, y) = points[local];
                canvas.draw_point(z, y, POINT_RADIUS + 2, event_color(event));
                canvas.draw_cross(z, y, BLACK);
            }
        }
    }

    for ((name, i), color) in landmarks.named().into_iter().zip(LANDMARK_COLORS) {
        match path.local_index(i) {
            Some(local) => {
                let (z, y) = points[local];
                canvas.draw_point(z, y, MARKER_RADIUS, color);
            }
            None => tracing::debug!(landmark = name, index = i, "Landmark outside drawn span"),
        }
    }
    label_axes(&mut canvas, font, ANNOTATION_TITLE, "-Z", "-Y");

    canvas.into_image()
}

fn nearest_cell(fraction: f64, cells: usize) -> usize {
    ((fraction * (cells - 1) as f64).round() as usize).min(cells - 1)
}
