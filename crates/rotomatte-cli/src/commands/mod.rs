pub mod clean;
pub mod config;
pub mod extract;
pub mod inventory;
pub mod run;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rotomatte_core::io::FrameStore;
use rotomatte_core::pipeline::PipelineConfig;

/// Read a TOML pipeline config, or fall back to the default chain.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("Invalid pipeline config {}", path.display()))
}

/// Frame store for a config, with the output directory optionally overridden.
pub fn open_store(config_path: Option<&Path>, output_dir: Option<&PathBuf>) -> Result<FrameStore> {
    let config = load_config(config_path)?;
    let root = output_dir.cloned().unwrap_or(config.output_dir);
    Ok(FrameStore::new(root, config.layout))
}
