//! Batch-convert raw sensor exports into processed case directories.

use std::path::PathBuf;

use scopetrace_common::config::AppConfig;
use scopetrace_render_engine::animation::AnimationMode;
use scopetrace_render_engine::batch::{run_batch, BatchJob};

pub fn run(
    config: &AppConfig,
    input: PathBuf,
    output: PathBuf,
    meta: PathBuf,
    animation: AnimationMode,
    clean: bool,
) -> anyhow::Result<()> {
    println!("Preprocessing sensor exports in: {}", input.display());

    let job = BatchJob {
        input_dir: input,
        output_dir: output,
        meta_path: meta,
        config: config.preprocess.clone(),
        animation,
        clean,
    };
    let summary = run_batch(&job).map_err(|e| anyhow::anyhow!("Batch preprocessing failed: {e}"))?;

    for case in &summary.cases {
        println!(
            "  {} <- {} ({} samples, {} coils)",
            case.case_id,
            case.source.display(),
            case.samples,
            case.coils
        );
        if !case.log_copied {
            println!("    warning: no event log copied");
        }
        if let Some(animation) = &case.animation {
            println!("    animation: {}", animation.display());
        }
    }

    if !summary.failed.is_empty() {
        println!("\nFailed:");
        for (source, reason) in &summary.failed {
            println!("  - {}: {reason}", source.display());
        }
    }

    println!(
        "\n{} case(s) written to {}, metadata in {}",
        summary.cases.len(),
        job.output_dir.display(),
        job.meta_path.display()
    );
    Ok(())
}
