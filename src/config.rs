//! Optional TOML defaults, overridden by command-line flags.
//!
//! ```toml
//! recursive = true
//! min_size = 4096
//! threads = 8
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cli::Cli;
use crate::scanner::{DEFAULT_MIN_SIZE, ScanOptions};

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub recursive: Option<bool>,
    pub min_size: Option<u64>,
    pub threads: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: '{}'", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file: '{}'", path.display()))
    }

    /// Merges with the command line; an explicit flag always wins.
    pub fn into_options(self, cli: &Cli, shutdown: Arc<AtomicBool>) -> ScanOptions {
        ScanOptions {
            recursive: cli.recursive || self.recursive.unwrap_or(false),
            min_size: cli.min_size.or(self.min_size).unwrap_or(DEFAULT_MIN_SIZE),
            threads: cli.threads.or(self.threads),
            show_progress: !cli.no_progress && !cli.json,
            shutdown,
        }
    }
}
