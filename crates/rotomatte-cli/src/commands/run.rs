use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use rotomatte_core::pipeline::{ExistingPolicy, PipelineBuilder};
use rotomatte_core::segment::LumaKeySegmenter;

use crate::progress::BarReporter;
use crate::summary::{print_pipeline_summary, print_run_report};

#[derive(Args)]
pub struct RunArgs {
    /// Pipeline config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Artifact root directory (overrides the config)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Run only this stage (repeatable, runs in declared order)
    #[arg(long = "stage")]
    pub stages: Vec<String>,

    /// Worker threads for per-frame processing (0 = all cores)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Leave artifacts that already exist untouched
    #[arg(long)]
    pub keep_existing: bool,

    /// Use a luminance keyer for segment stages (foreground above this level)
    #[arg(long)]
    pub luma_key: Option<u8>,

    /// Key foreground at or below the luma level instead
    #[arg(long, requires = "luma_key")]
    pub invert_key: bool,

    /// Write the run report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Exit with an error if any frame was skipped or a stage had no input
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let mut config = super::load_config(args.config.as_deref())?;
    if let Some(ref dir) = args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if args.keep_existing {
        config.existing = ExistingPolicy::Keep;
    }

    print_pipeline_summary(&config, &args.stages);

    let mut builder = PipelineBuilder::new(config).reporter(Arc::new(BarReporter::new()?));
    if let Some(level) = args.luma_key {
        builder = builder.segmenter(Arc::new(LumaKeySegmenter {
            level,
            invert: args.invert_key,
        }));
    }
    let pipeline = builder.build().context("Invalid pipeline")?;

    let report = if args.stages.is_empty() {
        pipeline.run()
    } else {
        pipeline.run_stages(&args.stages)?
    };

    print_run_report(&report);

    if let Some(ref path) = args.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        println!("Report saved to {}", path.display());
    }

    if args.strict && !report.is_clean() {
        bail!(
            "{} frame(s) skipped, {} stage(s) without input",
            report.total_skipped(),
            report.stage_failures()
        );
    }
    Ok(())
}
