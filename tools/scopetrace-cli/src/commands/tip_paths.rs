//! Plot every case group's insertion tip paths.

use std::path::PathBuf;

use scopetrace_common::config::AppConfig;
use scopetrace_render_engine::report::plot_multiple_case_tip_paths;

use super::report::{load_groups, print_summary, report_context};

pub fn run(
    config: &AppConfig,
    source: PathBuf,
    meta: PathBuf,
    output: PathBuf,
) -> anyhow::Result<()> {
    let groups = load_groups(&meta)?;
    println!("Plotting tip paths for {} group(s)", groups.len());

    let ctx = report_context(config, source);
    let summary = plot_multiple_case_tip_paths(&ctx, &groups, &output)?;
    print_summary(&summary);
    Ok(())
}
