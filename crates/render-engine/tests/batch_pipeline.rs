use std::path::PathBuf;

use scopetrace_common::config::{CoilLayout, PreprocessConfig};
use scopetrace_render_engine::animation::AnimationMode;
use scopetrace_render_engine::batch::{run_batch, BatchJob};
use scopetrace_trace_model::meta::{process_line, CaseGroups};
use scopetrace_trace_model::recording::RecordingDir;

fn raw_fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("raw")
}

fn two_coil_config() -> PreprocessConfig {
    PreprocessConfig {
        layout: CoilLayout {
            coil_count: 2,
            ..CoilLayout::default()
        },
        smoothing_window: 3,
        ..PreprocessConfig::default()
    }
}

fn job(name: &str, animation: AnimationMode) -> BatchJob {
    let work = std::env::temp_dir().join(name);
    BatchJob {
        input_dir: raw_fixture_dir(),
        output_dir: work.join("processed"),
        meta_path: work.join("SIMMETA.txt"),
        config: two_coil_config(),
        animation,
        clean: true,
    }
}

#[test]
fn batch_writes_loadable_case_directories() {
    let job = job("scopetrace_batch_cases", AnimationMode::None);
    let summary = run_batch(&job).unwrap();

    assert_eq!(summary.cases.len(), 1);
    assert!(summary.failed.is_empty());

    let case = &summary.cases[0];
    assert_eq!(case.case_id.len(), 12);
    assert_eq!(case.samples, 40);
    assert_eq!(case.coils, 2);
    assert!(case.log_copied);
    assert!(case.animation.is_none());

    let dir = RecordingDir::new(&case.dest_dir);
    assert!(dir.validate_sources().is_empty(), "{:?}", dir.validate_sources());
    let recording = dir.load().unwrap();
    assert_eq!(recording.series.t[1], 100.0);
    assert_eq!(recording.series.x[0].len(), 2);

    let meta = std::fs::read_to_string(&job.meta_path).unwrap();
    let line = meta.lines().next().unwrap();
    assert_eq!(process_line(line), Some(case.case_id.as_str()));
    assert!(line.contains("sensor_data.csv"));

    let groups = CaseGroups::parse(&meta);
    assert_eq!(groups.get("001").map(|ids| ids.len()), Some(1));
}

#[test]
fn batch_clean_resets_metadata() {
    let job = job("scopetrace_batch_clean", AnimationMode::None);
    run_batch(&job).unwrap();

    let append = BatchJob {
        clean: false,
        ..job.clone()
    };
    run_batch(&append).unwrap();
    let meta = std::fs::read_to_string(&job.meta_path).unwrap();
    assert_eq!(meta.lines().count(), 2);

    run_batch(&job).unwrap();
    let meta = std::fs::read_to_string(&job.meta_path).unwrap();
    assert_eq!(meta.lines().count(), 1);
    assert_eq!(std::fs::read_dir(&job.output_dir).unwrap().count(), 1);
}

#[test]
fn batch_frames_mode_writes_one_png_per_sample() {
    let mut job = job("scopetrace_batch_frames", AnimationMode::Frames);
    job.config.animation.width = 200;
    job.config.animation.height = 100;

    let summary = run_batch(&job).unwrap();
    let frames = summary.cases[0].animation.clone().unwrap();
    assert_eq!(std::fs::read_dir(frames).unwrap().count(), 40);
}
