pub mod cli;
pub mod config;
pub mod digest;
pub mod duplicates;
pub mod error;
pub mod index;
pub mod scanner;
pub mod utils;

use std::path::PathBuf;

use log::{error, info};

pub use cli::Cli;
pub use config::FileConfig;
pub use digest::{Digest, digest_file};
pub use duplicates::{DuplicateGroup, DuplicateReport, GroupingOutcome, group_duplicates, print_results};
pub use error::ScanError;
pub use index::SizeIndex;
pub use scanner::{DEFAULT_MIN_SIZE, ScanOptions, ScanSummary, resolve_roots, scan, scan_dir};
pub use utils::{FileRecord, format_human_elapsed};

/// Runs the whole pipeline: validate roots, scan, wait for every traversal
/// task, then group the size buckets by content.
///
/// Recoverable problems end up in [`DuplicateReport::errors`] next to the
/// groups that could still be computed.
pub fn find_duplicates(roots: &[PathBuf], options: &ScanOptions) -> error::Result<DuplicateReport> {
    let (valid_roots, mut errors) = resolve_roots(roots);
    if valid_roots.is_empty() {
        for err in &errors {
            error!("{err}");
        }
        return Err(ScanError::NoValidRoots);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.threads.unwrap_or(0))
        .build()?;
    info!("Using {} worker threads", pool.current_num_threads());

    pool.install(|| {
        let index = SizeIndex::new();
        let summary = scan(&valid_roots, options, &index);
        if options.is_cancelled() {
            return Err(ScanError::Interrupted);
        }

        let outcome = group_duplicates(&index.into_snapshot(), options);
        if options.is_cancelled() {
            return Err(ScanError::Interrupted);
        }

        errors.extend(summary.errors);
        errors.extend(outcome.failures);
        Ok(DuplicateReport {
            groups: outcome.groups,
            errors,
            dirs_visited: summary.dirs_visited,
            files_indexed: summary.files_indexed,
            files_hashed: outcome.files_hashed,
        })
    })
}
