//! Multi-case reports driven by the case metadata file.
//!
//! Cases listed in the metadata are grouped by key; every group yields one
//! tip-path plot (`<key>_tip_path.png`) and one density heatmap
//! (`<key>_kde.png`). A group that cannot be rendered is logged and skipped.

use std::path::{Path, PathBuf};

use image::RgbImage;

use scopetrace_common::config::{LandmarkLabels, PlotConfig};
use scopetrace_common::error::{ScopetraceError, ScopetraceResult};
use scopetrace_processing_core::heatmap::{Bandwidth, DensityGrid, HeatmapConfig};
use scopetrace_processing_core::landmarks::{extract_events, extract_landmarks, LandmarkIndexes};
use scopetrace_processing_core::segment::TipPath;
use scopetrace_trace_model::meta::CaseGroups;
use scopetrace_trace_model::recording::Recording;

use crate::canvas::save_png;
use crate::plots::{render_case_annotation, render_heatmap, render_tip_paths};
use crate::text::LabelFont;

/// Default output directory for tip-path plots.
pub const TIP_PATH_DIR: &str = "Multi_tip_case_plots";

/// Default output directory for heatmaps.
pub const HEATMAP_DIR: &str = "Multi_tip_case_HeatMaps";

/// Shared inputs for report rendering.
#[derive(Debug, Clone)]
pub struct ReportContext {
    /// Directory holding one processed case directory per case id.
    pub source_dir: PathBuf,
    pub labels: LandmarkLabels,
    pub plots: PlotConfig,
    /// Font for plot text; `None` renders unlabelled plots.
    pub font: Option<LabelFont>,
}

/// Files written and groups skipped by a report run.
#[derive(Debug, Clone, Default)]
pub struct ReportSummary {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(String, String)>,
}

impl ReportSummary {
    fn merge(&mut self, other: ReportSummary) {
        self.written.extend(other.written);
        self.failed.extend(other.failed);
    }
}

impl ReportContext {
    /// Context with the plot font resolved from `plots`.
    pub fn new(source_dir: impl Into<PathBuf>, labels: LandmarkLabels, plots: PlotConfig) -> Self {
        let font = LabelFont::for_plots(&plots);
        Self {
            source_dir: source_dir.into(),
            labels,
            plots,
            font,
        }
    }

    fn load_case(&self, case_id: &str) -> ScopetraceResult<(Recording, LandmarkIndexes)> {
        let recording = Recording::load(self.source_dir.join(case_id))?;
        let landmarks = extract_landmarks(&recording.log, &recording.series.t, &self.labels)?;
        Ok((recording, landmarks))
    }

    fn tip_path_plot(&self, case_ids: &[String]) -> ScopetraceResult<RgbImage> {
        let mut paths = Vec::with_capacity(case_ids.len());
        for id in case_ids {
            let (recording, landmarks) = self.load_case(id)?;
            paths.push(TipPath::insertion_phase(&recording.series, &landmarks));
        }
        Ok(render_tip_paths(&paths, &self.plots, self.font.as_ref()))
    }

    fn heatmap_plot(&self, case_ids: &[String]) -> ScopetraceResult<RgbImage> {
        let mut points = Vec::new();
        for id in case_ids {
            let (recording, landmarks) = self.load_case(id)?;
            let path = TipPath::zero_referenced(
                &recording.series,
                &landmarks,
                self.plots.zero_reference_skip,
            );
            points.extend(path.zy_points());
        }
        let grid = DensityGrid::from_points(
            &points,
            HeatmapConfig {
                cols: self.plots.heatmap_grid,
                rows: self.plots.heatmap_grid,
                bandwidth: Bandwidth::Scott,
            },
        )?;
        Ok(render_heatmap(&grid, &self.plots, self.font.as_ref()))
    }
}

/// One tip-path plot per case group.
pub fn plot_multiple_case_tip_paths(
    ctx: &ReportContext,
    groups: &CaseGroups,
    output_dir: &Path,
) -> ScopetraceResult<ReportSummary> {
    render_groups(groups, output_dir, "tip_path", |ids| ctx.tip_path_plot(ids))
}

/// One zero-referenced density heatmap per case group.
pub fn zeroed_heatmaps(
    ctx: &ReportContext,
    groups: &CaseGroups,
    output_dir: &Path,
) -> ScopetraceResult<ReportSummary> {
    render_groups(groups, output_dir, "kde", |ids| ctx.heatmap_plot(ids))
}

/// Heatmaps and tip-path plots into their default directories under `output_root`.
pub fn full_report(
    ctx: &ReportContext,
    groups: &CaseGroups,
    output_root: &Path,
) -> ScopetraceResult<ReportSummary> {
    let mut summary = zeroed_heatmaps(ctx, groups, &output_root.join(HEATMAP_DIR))?;
    summary.merge(plot_multiple_case_tip_paths(
        ctx,
        groups,
        &output_root.join(TIP_PATH_DIR),
    )?);
    Ok(summary)
}

/// Annotated plot of a single case directory.
pub fn annotate_case(
    case_dir: &Path,
    output: &Path,
    labels: &LandmarkLabels,
    plots: &PlotConfig,
) -> ScopetraceResult<LandmarkIndexes> {
    let recording = Recording::load(case_dir)?;
    let landmarks = extract_landmarks(&recording.log, &recording.series.t, labels)?;
    let events = extract_events(&recording.log, &recording.series.t)?;
    let font = LabelFont::for_plots(plots);
    let image = render_case_annotation(
        &recording.series,
        &landmarks,
        &events,
        plots,
        font.as_ref(),
    );
    save_png(&image, output)?;
    tracing::info!(
        case = %case_dir.display(),
        output = %output.display(),
        events = events.total(),
        "Wrote annotated case plot"
    );
    Ok(landmarks)
}

fn render_groups<F>(
    groups: &CaseGroups,
    output_dir: &Path,
    suffix: &str,
    mut render: F,
) -> ScopetraceResult<ReportSummary>
where
    F: FnMut(&[String]) -> ScopetraceResult<RgbImage>,
{
    std::fs::create_dir_all(output_dir)?;
    let mut summary = ReportSummary::default();

    for (key, ids) in groups.iter() {
        let path = output_dir.join(format!("{key}_{suffix}.png"));
        let result = render(ids).and_then(|image| save_png(&image, &path));
        match result {
            Ok(()) => {
                tracing::info!(key, cases = ids.len(), output = %path.display(), "Wrote group plot");
                summary.written.push(path);
            }
            Err(e) => {
                tracing::warn!(key, cases = ids.len(), error = %e, "Skipping case group");
                summary.failed.push((key.to_string(), e.to_string()));
            }
        }
    }

    if summary.written.is_empty() && !summary.failed.is_empty() {
        return Err(ScopetraceError::render(format!(
            "every case group failed ({} groups)",
            summary.failed.len()
        )));
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopetrace_trace_model::series::CoordinateSeries;

    fn write_case(root: &Path, id: &str, phase: f64) {
        let dir = root.join(id);
        std::fs::create_dir_all(&dir).unwrap();
        let n = 101;
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let y: Vec<f64> = (0..n).map(|i| -30.0 - 40.0 * (i as f64 / 9.0 + phase).sin()).collect();
        let z: Vec<f64> = (0..n).map(|i| 20.0 + 3.5 * i as f64).collect();
        let t: Vec<f64> = (0..n).map(|i| i as f64 * 10.0).collect();
        CoordinateSeries::from_tip(&x, &y, &z, t).save(&dir).unwrap();
        std::fs::write(
            dir.join("LogFile_P.txt"),
            "Time;Event;\n199.1;Endoscopy started;\n199.7;Cecum;\n200;Recording ended;\n",
        )
        .unwrap();
    }

    fn context(root: &Path) -> ReportContext {
        ReportContext::new(
            root,
            LandmarkLabels::default(),
            PlotConfig {
                width: 300,
                height: 200,
                heatmap_grid: 30,
                ..PlotConfig::default()
            },
        )
    }

    #[test]
    fn test_group_plots_written_and_bad_group_skipped() {
        let root = std::env::temp_dir().join("scopetrace_test_report_groups");
        let _ = std::fs::remove_dir_all(&root);
        write_case(&root, "caseA", 0.0);
        write_case(&root, "caseB", 1.3);

        let groups = CaseGroups::parse(
            "in//simA01;sensor.csv;caseA;out/caseA/;\n\
             in//simA01;sensor.csv;caseB;out/caseB/;\n\
             in//simB02;sensor.csv;missing;out/missing/;\n",
        );
        let ctx = context(&root);
        let out = root.join("report");

        let summary = full_report(&ctx, &groups, &out).unwrap();
        assert!(out.join(HEATMAP_DIR).join("A01_kde.png").exists());
        assert!(out.join(TIP_PATH_DIR).join("A01_tip_path.png").exists());
        assert_eq!(summary.written.len(), 2);
        assert_eq!(summary.failed.len(), 2);
        assert!(summary.failed.iter().all(|(key, _)| key == "B02"));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_all_groups_failing_is_error() {
        let root = std::env::temp_dir().join("scopetrace_test_report_all_fail");
        let _ = std::fs::remove_dir_all(&root);
        let groups = CaseGroups::parse("in//x01;sensor.csv;nope;out/nope/;\n");
        let result = zeroed_heatmaps(&context(&root), &groups, &root.join("out"));
        assert!(result.is_err());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_annotate_case_writes_png() {
        let root = std::env::temp_dir().join("scopetrace_test_report_annotate");
        let _ = std::fs::remove_dir_all(&root);
        write_case(&root, "caseA", 0.0);
        let output = root.join("plots").join("caseA.png");
        let landmarks = annotate_case(
            &root.join("caseA"),
            &output,
            &LandmarkLabels::default(),
            &context(&root).plots,
        )
        .unwrap();
        assert_eq!(landmarks.start, 10);
        assert_eq!(landmarks.cecum, 70);
        assert_eq!(landmarks.end, 100);
        assert!(output.exists());
        let _ = std::fs::remove_dir_all(&root);
    }
}
