use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

#[derive(Args)]
pub struct CleanArgs {
    /// Stages whose artifacts are deleted
    #[arg(required = true)]
    pub stages: Vec<String>,

    /// Pipeline config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Artifact root directory (overrides the config)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

pub fn run(args: &CleanArgs) -> Result<()> {
    let store = super::open_store(args.config.as_deref(), args.output_dir.as_ref())?;

    for stage in &args.stages {
        let removed = store
            .clear_stage(stage)
            .with_context(|| format!("Failed to clean stage '{stage}'"))?;
        info!(stage = %stage, removed, "Stage cleaned");
        println!("{stage}: removed {removed} artifact(s)");
    }
    Ok(())
}
