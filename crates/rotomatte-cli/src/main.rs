mod commands;
mod progress;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rotomatte", about = "Rotoscoping mask refinement and cutout pipeline")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the stage pipeline over the frame store
    Run(commands::run::RunArgs),
    /// Decode a video into an image sequence stage with ffmpeg
    Extract(commands::extract::ExtractArgs),
    /// List stage directories and their frames
    Inventory(commands::inventory::InventoryArgs),
    /// Delete the artifacts of one or more stages
    Clean(commands::clean::CleanArgs),
    /// Print or save the default pipeline config
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Extract(args) => commands::extract::run(args),
        Commands::Inventory(args) => commands::inventory::run(args),
        Commands::Clean(args) => commands::clean::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
