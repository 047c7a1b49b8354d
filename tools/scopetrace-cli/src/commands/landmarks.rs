//! Show landmark and discrete-event indices for a case.

use std::path::PathBuf;

use serde::Serialize;

use scopetrace_common::config::AppConfig;
use scopetrace_processing_core::alignment::TimestampReconciler;
use scopetrace_processing_core::landmarks::{
    extract_events, extract_landmarks, EventIndexes, LandmarkIndexes,
};
use scopetrace_trace_model::recording::Recording;

#[derive(Serialize)]
struct CaseIndexes<'a> {
    case: &'a str,
    samples: usize,
    landmarks: LandmarkIndexes,
    events: EventIndexes,
}

pub fn run(config: &AppConfig, path: PathBuf, json: bool) -> anyhow::Result<()> {
    let recording =
        Recording::load(&path).map_err(|e| anyhow::anyhow!("Failed to load case: {e}"))?;
    let times = &recording.series.t;

    let landmarks = extract_landmarks(&recording.log, times, &config.labels)?;
    let events = extract_events(&recording.log, times)?;

    if json {
        let case = path.display().to_string();
        let out = CaseIndexes {
            case: &case,
            samples: recording.series.len(),
            landmarks,
            events,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let reconciler = TimestampReconciler::new(times, recording.log.end_ms())?;
    println!("Case: {}", path.display());
    println!("  Samples: {}", recording.series.len());
    println!("  Event log: {}", recording.log.path.display());
    println!(
        "  Clock shift: {:.1} ms ({:?} search)",
        reconciler.offset().shift_ms(),
        reconciler.strategy()
    );
    println!();

    println!("Landmarks:");
    for (name, index) in landmarks.named() {
        let t = times.get(index).copied().unwrap_or_default();
        println!("  {name:<10} {index:>7}  (T = {t:.1} ms)");
    }
    println!();

    println!("Events:");
    for (event, indexes) in events.iter() {
        if indexes.is_empty() {
            println!("  {:<12} -", event.label());
        } else {
            println!("  {:<12} {indexes:?}", event.label());
        }
    }

    Ok(())
}
