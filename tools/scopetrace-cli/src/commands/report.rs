//! Heatmaps and tip-path plots for every case group.

use std::path::{Path, PathBuf};

use scopetrace_common::config::AppConfig;
use scopetrace_render_engine::report::{full_report, ReportContext, ReportSummary};
use scopetrace_trace_model::meta::CaseGroups;

pub fn run(
    config: &AppConfig,
    source: PathBuf,
    meta: PathBuf,
    output: PathBuf,
) -> anyhow::Result<()> {
    let groups = load_groups(&meta)?;
    println!(
        "Rendering report for {} group(s) into {}",
        groups.len(),
        output.display()
    );

    let ctx = report_context(config, source);
    let summary = full_report(&ctx, &groups, &output)?;
    print_summary(&summary);
    Ok(())
}

pub(crate) fn load_groups(meta: &Path) -> anyhow::Result<CaseGroups> {
    let groups = CaseGroups::load(meta)
        .map_err(|e| anyhow::anyhow!("Failed to read case metadata: {e}"))?;
    if groups.is_empty() {
        anyhow::bail!("No cases listed in {}", meta.display());
    }
    for (key, ids) in groups.iter() {
        tracing::debug!(key, cases = ids.len(), "Case group");
    }
    Ok(groups)
}

pub(crate) fn report_context(config: &AppConfig, source: PathBuf) -> ReportContext {
    ReportContext::new(source, config.labels.clone(), config.plots.clone())
}

pub(crate) fn print_summary(summary: &ReportSummary) {
    for path in &summary.written {
        println!("  wrote {}", path.display());
    }
    if !summary.failed.is_empty() {
        println!("\nSkipped groups:");
        for (key, reason) in &summary.failed {
            println!("  - {key}: {reason}");
        }
    }
}
