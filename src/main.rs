use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

use dupscan::{Cli, FileConfig, find_duplicates, format_human_elapsed, print_results};

fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let mut builder = ConfigBuilder::new();
    // keeps UTC timestamps if the local offset cannot be determined
    let _ = builder.set_time_offset_to_local();
    let config = builder.build();
    if let Err(err) = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto) {
        eprintln!("Failed to initialize logging: {err}");
    }
}

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    info!("Starting dupscan v{}", env!("CARGO_PKG_VERSION"));
    debug!("Command line arguments: {:?}", cli);

    let file_config = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        warn!("Interrupted, stopping...");
        flag.store(true, Ordering::Relaxed);
    })
    .context("Failed to install Ctrl+C handler")?;

    let options = file_config.into_options(&cli, shutdown);
    debug!("Scan options: {:?}", options);

    let report = find_duplicates(&cli.roots, &options)?;
    if cli.json {
        println!("{}", report.to_json().context("Failed to encode report as JSON")?);
    } else {
        print_results(&report);
    }

    info!("Completed in {}", format_human_elapsed(start_time.elapsed()));
    Ok(())
}
