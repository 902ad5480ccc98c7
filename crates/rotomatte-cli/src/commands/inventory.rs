use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::summary::print_inventory;

#[derive(Args)]
pub struct InventoryArgs {
    /// Pipeline config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Artifact root directory (overrides the config)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Print the inventory as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &InventoryArgs) -> Result<()> {
    let store = super::open_store(args.config.as_deref(), args.output_dir.as_ref())?;
    let inventory = store.inventory();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&inventory)?);
    } else {
        print_inventory(store.root(), &inventory);
    }
    Ok(())
}
