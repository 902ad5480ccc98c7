use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use rotomatte_core::extract::{FfmpegExtractor, SequenceExtractor};
use rotomatte_core::pipeline::config::{FRAMES_STAGE, MOTION_VECTORS_STAGE};

#[derive(Clone, Copy, ValueEnum)]
pub enum ExtractMode {
    /// Frames with codec motion vectors drawn on them
    Motion,
    /// Plain decoded frames
    Frames,
}

#[derive(Args)]
pub struct ExtractArgs {
    /// Input video file
    pub video: PathBuf,

    /// What to extract
    #[arg(long, value_enum, default_value = "motion")]
    pub mode: ExtractMode,

    /// Target stage (defaults to motion_vectors or frames)
    #[arg(long)]
    pub stage: Option<String>,

    /// Pipeline config file (TOML), for the output directory and layout
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Artifact root directory (overrides the config)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// ffmpeg executable
    #[arg(long, default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,

    /// JPEG/PNG encoder quality passed as -q:v
    #[arg(long, default_value = "2")]
    pub quality: u8,
}

pub fn run(args: &ExtractArgs) -> Result<()> {
    let store = super::open_store(args.config.as_deref(), args.output_dir.as_ref())?;

    let (mut extractor, default_stage) = match args.mode {
        ExtractMode::Motion => (FfmpegExtractor::motion_vectors(), MOTION_VECTORS_STAGE),
        ExtractMode::Frames => (FfmpegExtractor::frames(), FRAMES_STAGE),
    };
    extractor.program = args.ffmpeg.clone();
    extractor.quality = args.quality;
    let stage = args.stage.as_deref().unwrap_or(default_stage);

    let count = extractor
        .extract(&args.video, &store, stage)
        .with_context(|| format!("Failed to extract {}", args.video.display()))?;
    println!(
        "{count} frame(s) in {}",
        store.stage_dir(stage).display()
    );
    Ok(())
}
