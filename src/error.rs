//! Error types shared by the scanner, digest and grouping stages.

use std::io;
use std::path::PathBuf;

/// Everything that can go wrong while looking for duplicates.
///
/// Most variants are recoverable: they are collected into the report and
/// the run carries on. Only `NoValidRoots`, `ThreadPool` and `Interrupted`
/// stop the pipeline.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// A root supplied by the caller does not exist.
    #[error("'{0}' does not exist")]
    MissingRoot(PathBuf),

    /// A root supplied by the caller exists but is not a directory.
    #[error("'{0}' is not a directory")]
    NotADirectory(PathBuf),

    /// A directory could not be listed or one of its entries could not be resolved.
    #[error("Failed to read '{path}': {source}")]
    Traversal {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A candidate file could not be opened or read while fingerprinting.
    #[error("Failed to hash '{path}': {source}")]
    Digest {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("None of the supplied directories can be scanned")]
    NoValidRoots,

    #[error("Interrupted")]
    Interrupted,

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, ScanError>;
