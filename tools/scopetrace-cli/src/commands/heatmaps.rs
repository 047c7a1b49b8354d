//! Render every case group's zero-referenced density heatmap.

use std::path::PathBuf;

use scopetrace_common::config::AppConfig;
use scopetrace_render_engine::report::zeroed_heatmaps;

use super::report::{load_groups, print_summary, report_context};

pub fn run(
    config: &AppConfig,
    source: PathBuf,
    meta: PathBuf,
    output: PathBuf,
) -> anyhow::Result<()> {
    let groups = load_groups(&meta)?;
    println!("Rendering heatmaps for {} group(s)", groups.len());

    let ctx = report_context(config, source);
    let summary = zeroed_heatmaps(&ctx, &groups, &output)?;
    print_summary(&summary);
    Ok(())
}
