//! Validate a processed case directory.

use std::path::PathBuf;

use scopetrace_trace_model::recording::RecordingDir;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating case at: {}", path.display());

    let dir = RecordingDir::new(&path);
    let errors = dir.validate_sources();
    if !errors.is_empty() {
        println!("\nValidation issues:");
        for error in &errors {
            println!("  - {error}");
        }
        anyhow::bail!("{} issue(s) found in {}", errors.len(), path.display());
    }

    let recording = dir
        .load()
        .map_err(|e| anyhow::anyhow!("Failed to load case: {e}"))?;
    let series = &recording.series;
    println!("  Samples: {}", series.len());
    println!(
        "  Coils: {}",
        series.x.iter().map(Vec::len).max().unwrap_or(0)
    );
    println!(
        "  Duration: {:.1} s",
        series.last_time().unwrap_or_default() / 1000.0
    );
    println!("  Event log lines: {}", recording.log.lines.len());
    println!("  Event log end: {:.1} s", recording.log.end_secs);
    println!("\nCase is valid.");

    Ok(())
}
