//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

/// infopost: posts a short generated fact with hashtags to Bluesky every few minutes
#[derive(Parser, Debug)]
#[command(name = "infopost")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Generate and log posts without publishing them
    #[arg(long)]
    pub dry_run: bool,
}
