use std::path::PathBuf;

use scopetrace_common::config::LandmarkLabels;
use scopetrace_processing_core::heatmap::{DensityGrid, HeatmapConfig};
use scopetrace_processing_core::landmarks::{extract_events, extract_landmarks};
use scopetrace_processing_core::segment::{fractional_indexes, TipPath};
use scopetrace_trace_model::event_log::ProcedureEvent;
use scopetrace_trace_model::recording::Recording;

fn sample_case() -> Recording {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("sample-case");
    Recording::load(root).expect("fixture recording should load")
}

#[test]
fn sample_case_landmarks_are_stable() {
    let recording = sample_case();
    assert_eq!(recording.series.len(), 101);

    let landmarks = extract_landmarks(
        &recording.log,
        &recording.series.t,
        &LandmarkLabels::default(),
    )
    .unwrap();

    assert_eq!(landmarks.as_tuple(), (60, 40, 0, 100, 20));

    let json = serde_json::to_value(landmarks).unwrap();
    assert_eq!(json["cecum"], 60);
    assert_eq!(json["flexure_right"], 0);
}

#[test]
fn sample_case_events_are_stable() {
    let recording = sample_case();
    let events = extract_events(&recording.log, &recording.series.t).unwrap();

    assert_eq!(events.get(ProcedureEvent::Flush), &[50]);
    assert_eq!(events.get(ProcedureEvent::Biopsy), &[65]);
    assert_eq!(events.get(ProcedureEvent::Polyp), &[80]);
    assert_eq!(events.get(ProcedureEvent::Polypectomi), &[85]);
    assert_eq!(events.total(), 4);
}

#[test]
fn sample_case_segments_and_density() {
    let recording = sample_case();
    let landmarks = extract_landmarks(
        &recording.log,
        &recording.series.t,
        &LandmarkLabels::default(),
    )
    .unwrap();

    let path = TipPath::insertion_phase(&recording.series, &landmarks);
    assert_eq!(path.len(), 40);
    assert_eq!(path.offset, 20);
    assert_eq!(path.x[0], -recording.series.x[20][0]);

    let zeroed = TipPath::zero_referenced(&recording.series, &landmarks, 5);
    assert_eq!(zeroed.len(), 35);
    assert_eq!(zeroed.zy_points()[0], (0.0, 0.0));

    let ticks = fractional_indexes(path.len(), 12);
    assert_eq!(ticks.len(), 12);
    assert_eq!(*ticks.last().unwrap(), 39);

    let grid = DensityGrid::from_points(
        &zeroed.zy_points(),
        HeatmapConfig {
            cols: 40,
            rows: 40,
            ..HeatmapConfig::default()
        },
    )
    .unwrap();
    assert!(grid.max_density > 0.0);
    assert!(grid.cells.iter().all(|v| v.is_finite() && *v >= 0.0));
}
