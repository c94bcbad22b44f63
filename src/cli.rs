use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dupscan", version)]
#[command(about = "Find duplicate files by size, then by content hash")]
pub struct Cli {
    /// Directories to scan for duplicates
    #[arg(required = true)]
    pub roots: Vec<PathBuf>,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Only consider files strictly larger than this many bytes (default: 1024)
    #[arg(short, long)]
    pub min_size: Option<u64>,

    /// Number of worker threads (default: number of CPU cores)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// TOML file providing defaults for the options above
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Hide progress spinners
    #[arg(long)]
    pub no_progress: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
