//! scopetrace CLI: preprocessing, case inspection and report rendering.
//!
//! Usage:
//!   scopetrace preprocess --input <DIR> --output <DIR>   Batch-convert raw sensor exports
//!   scopetrace landmarks <CASE>                          Show landmark and event indices
//!   scopetrace validate <CASE>                           Check a processed case directory
//!   scopetrace tip-paths --source <DIR> --meta <FILE>    Per-group tip-path plots
//!   scopetrace heatmaps --source <DIR> --meta <FILE>     Per-group density heatmaps
//!   scopetrace annotate <CASE> --output <PNG>            Annotated single-case plot
//!   scopetrace report --source <DIR> --meta <FILE>       Heatmaps and tip paths together

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use scopetrace_common::config::AppConfig;
use scopetrace_render_engine::animation::AnimationMode;
use scopetrace_trace_model::meta::META_FILE;

mod commands;

#[derive(Parser)]
#[command(
    name = "scopetrace",
    about = "Endoscope tip tracking: align event logs, index landmarks, render reports",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AnimationArg {
    Ffmpeg,
    Frames,
    None,
}

impl From<AnimationArg> for AnimationMode {
    fn from(arg: AnimationArg) -> Self {
        match arg {
            AnimationArg::Ffmpeg => AnimationMode::Ffmpeg,
            AnimationArg::Frames => AnimationMode::Frames,
            AnimationArg::None => AnimationMode::None,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Convert raw sensor CSV exports into processed case directories
    Preprocess {
        /// Directory searched recursively for *sensor*.csv files
        #[arg(short, long)]
        input: PathBuf,

        /// Directory receiving one sub-directory per case
        #[arg(short, long)]
        output: PathBuf,

        /// Case metadata file to append to
        #[arg(long, default_value = META_FILE)]
        meta: PathBuf,

        /// Animation output per case
        #[arg(long, value_enum, default_value = "ffmpeg")]
        animation: AnimationArg,

        /// Reset the metadata file and recreate the output directory first
        #[arg(long)]
        clean: bool,
    },

    /// Show landmark and discrete-event indices for a case
    Landmarks {
        /// Path to the case directory
        path: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Validate a processed case directory
    Validate {
        /// Path to the case directory
        path: PathBuf,
    },

    /// Plot every group's insertion tip paths
    TipPaths {
        /// Directory holding the processed case directories
        #[arg(short, long)]
        source: PathBuf,

        /// Case metadata file
        #[arg(long, default_value = META_FILE)]
        meta: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = scopetrace_render_engine::report::TIP_PATH_DIR)]
        output: PathBuf,
    },

    /// Render every group's zero-referenced density heatmap
    Heatmaps {
        /// Directory holding the processed case directories
        #[arg(short, long)]
        source: PathBuf,

        /// Case metadata file
        #[arg(long, default_value = META_FILE)]
        meta: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = scopetrace_render_engine::report::HEATMAP_DIR)]
        output: PathBuf,
    },

    /// Plot one case with landmarks, events and progress ticks
    Annotate {
        /// Path to the case directory
        path: PathBuf,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Render heatmaps and tip-path plots into their default directories
    Report {
        /// Directory holding the processed case directories
        #[arg(short, long)]
        source: PathBuf,

        /// Case metadata file
        #[arg(long, default_value = META_FILE)]
        meta: PathBuf,

        /// Root directory for the report folders
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display()))?,
        None => AppConfig::load(),
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    scopetrace_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Preprocess {
            input,
            output,
            meta,
            animation,
            clean,
        } => commands::preprocess::run(&config, input, output, meta, animation.into(), clean),
        Commands::Landmarks { path, json } => commands::landmarks::run(&config, path, json),
        Commands::Validate { path } => commands::validate::run(path),
        Commands::TipPaths {
            source,
            meta,
            output,
        } => commands::tip_paths::run(&config, source, meta, output),
        Commands::Heatmaps {
            source,
            meta,
            output,
        } => commands::heatmaps::run(&config, source, meta, output),
        Commands::Annotate { path, output } => commands::annotate::run(&config, path, output),
        Commands::Report {
            source,
            meta,
            output,
        } => commands::report::run(&config, source, meta, output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_preprocess_defaults() {
        let cli = Cli::parse_from(["scopetrace", "preprocess", "-i", "raw", "-o", "out"]);
        match cli.command {
            Commands::Preprocess {
                meta,
                animation,
                clean,
                ..
            } => {
                assert_eq!(meta, PathBuf::from(META_FILE));
                assert!(matches!(animation, AnimationArg::Ffmpeg));
                assert!(!clean);
            }
            _ => panic!("expected preprocess"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["scopetrace", "landmarks", "case", "--json", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Landmarks { json: true, .. }));
    }
}
