//! Parallel directory traversal feeding the [`SizeIndex`].
//!
//! Every directory is listed by its own rayon task. Subdirectories are
//! spawned into the same scope instead of being walked inline, so the
//! scope's return is the barrier: it only completes once the whole
//! fan-out tree has finished. Tasks push their failures into a shared
//! channel that is drained after the barrier.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crossbeam_channel::{Sender, unbounded};
use indicatif::{HumanCount, ProgressBar};
use log::{debug, info};

use crate::error::ScanError;
use crate::index::SizeIndex;
use crate::utils::{FileRecord, new_spinner};

/// Files of this size or smaller are ignored unless configured otherwise.
pub const DEFAULT_MIN_SIZE: u64 = 1024;

/// Knobs shared by the traversal and grouping stages.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Only files strictly larger than this many bytes are indexed.
    pub min_size: u64,
    /// Worker threads; `None` uses one per CPU core.
    pub threads: Option<usize>,
    pub show_progress: bool,
    /// Set from outside (Ctrl+C) to stop the run early.
    pub shutdown: Arc<AtomicBool>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            min_size: DEFAULT_MIN_SIZE,
            threads: None,
            show_progress: false,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl ScanOptions {
    pub fn is_cancelled(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

/// What a traversal produced besides the index entries themselves.
#[derive(Debug, Default)]
pub struct ScanSummary {
    pub errors: Vec<ScanError>,
    pub dirs_visited: u64,
    pub files_indexed: u64,
    pub files_skipped: u64,
}

/// Checks every root up front and turns the usable ones into absolute paths.
///
/// A bad root is reported and left out; it never prevents the others from
/// being scanned. Roots resolving to the same directory are kept once.
pub fn resolve_roots(paths: &[PathBuf]) -> (Vec<PathBuf>, Vec<ScanError>) {
    let mut roots = BTreeSet::new();
    let mut errors = Vec::new();

    for path in paths {
        match fs::metadata(path) {
            Err(err) if err.kind() == ErrorKind::NotFound => {
                errors.push(ScanError::MissingRoot(path.clone()));
            }
            Err(source) => errors.push(ScanError::Traversal {
                path: path.clone(),
                source,
            }),
            Ok(metadata) if !metadata.is_dir() => {
                errors.push(ScanError::NotADirectory(path.clone()));
            }
            Ok(_) => match path.canonicalize() {
                Ok(absolute) => {
                    roots.insert(absolute);
                }
                Err(source) => errors.push(ScanError::Traversal {
                    path: path.clone(),
                    source,
                }),
            },
        }
    }

    (roots.into_iter().collect(), errors)
}

/// State shared by every task of one traversal.
struct Walk<'a> {
    options: &'a ScanOptions,
    index: &'a SizeIndex,
    errors: Sender<ScanError>,
    progress: ProgressBar,
    dirs_visited: AtomicU64,
    files_indexed: AtomicU64,
    files_skipped: AtomicU64,
}

impl Walk<'_> {
    fn report(&self, err: ScanError) {
        debug!("{err}");
        // the receiver lives until the scope has joined
        let _ = self.errors.send(err);
    }

    fn index_file(&self, path: PathBuf, size: u64) {
        if size <= self.options.min_size {
            self.files_skipped.fetch_add(1, Ordering::Relaxed);
            return;
        }
        if self.index.insert(FileRecord::new(path, size)) {
            let indexed = self.files_indexed.fetch_add(1, Ordering::Relaxed) + 1;
            self.progress
                .set_message(format!("Scanning... {} files indexed", HumanCount(indexed)));
        }
    }
}

/// Walks `roots` on the current rayon pool, recording every eligible file in `index`.
///
/// Returns once all traversal tasks, including every recursively spawned
/// one, have completed.
pub fn scan(roots: &[PathBuf], options: &ScanOptions, index: &SizeIndex) -> ScanSummary {
    let (sender, receiver) = unbounded();
    let walk = Walk {
        options,
        index,
        errors: sender,
        progress: new_spinner(options.show_progress, "Scanning..."),
        dirs_visited: AtomicU64::new(0),
        files_indexed: AtomicU64::new(0),
        files_skipped: AtomicU64::new(0),
    };

    for root in roots {
        info!("Scanning {}", root.display());
    }

    let walk_ref = &walk;
    rayon::scope(|scope| {
        for root in roots {
            scope.spawn(move |scope| walk_dir(scope, root.clone(), walk_ref));
        }
    });

    walk.progress.finish_and_clear();
    let summary = ScanSummary {
        errors: receiver.try_iter().collect(),
        dirs_visited: walk.dirs_visited.load(Ordering::Relaxed),
        files_indexed: walk.files_indexed.load(Ordering::Relaxed),
        files_skipped: walk.files_skipped.load(Ordering::Relaxed),
    };
    info!(
        "Visited {} directories, indexed {} files in {} size buckets ({} too small)",
        HumanCount(summary.dirs_visited),
        HumanCount(summary.files_indexed),
        HumanCount(index.len() as u64),
        HumanCount(summary.files_skipped)
    );
    summary
}

fn walk_dir<'s>(scope: &rayon::Scope<'s>, dir: PathBuf, walk: &'s Walk<'s>) {
    if walk.options.is_cancelled() {
        return;
    }
    walk.dirs_visited.fetch_add(1, Ordering::Relaxed);

    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(source) => {
            walk.report(ScanError::Traversal { path: dir, source });
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) => {
                walk.report(ScanError::Traversal {
                    path: dir.clone(),
                    source,
                });
                continue;
            }
        };
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(source) => {
                walk.report(ScanError::Traversal { path, source });
                continue;
            }
        };

        if file_type.is_dir() {
            if walk.options.recursive && !walk.options.is_cancelled() {
                scope.spawn(move |scope| walk_dir(scope, path, walk));
            }
            continue;
        }
        if !file_type.is_file() {
            debug!("Skipping '{}': not a regular file", path.display());
            continue;
        }

        match entry.metadata() {
            Ok(metadata) => walk.index_file(path, metadata.len()),
            Err(source) => walk.report(ScanError::Traversal { path, source }),
        }
    }
}

/// Convenience for callers that only need a single directory scanned.
pub fn scan_dir(root: &Path, options: &ScanOptions, index: &SizeIndex) -> ScanSummary {
    let (roots, mut errors) = resolve_roots(&[root.to_path_buf()]);
    let mut summary = scan(&roots, options, index);
    errors.append(&mut summary.errors);
    summary.errors = errors;
    summary
}
