//! Size-keyed aggregation shared by all traversal tasks.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;

use crate::utils::FileRecord;

/// The paths observed for one file size, guarded by their own lock.
pub type Bucket = Arc<Mutex<BTreeSet<PathBuf>>>;

/// Concurrent mapping from file size to every path seen with that size.
///
/// Buckets are created on first use and never removed. Creation goes through
/// the map's entry API, so concurrent first insertions for the same size end
/// up sharing one bucket. Appending only takes that bucket's mutex, which
/// keeps writers for different sizes from contending with each other.
#[derive(Debug, Default)]
pub struct SizeIndex {
    buckets: DashMap<u64, Bucket>,
}

impl SizeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bucket for `size`, creating it if this is the first file of that size.
    pub fn bucket(&self, size: u64) -> Bucket {
        Arc::clone(self.buckets.entry(size).or_default().value())
    }

    /// Adds a record to its size bucket. Returns `false` if the path was already present.
    pub fn insert(&self, record: FileRecord) -> bool {
        let bucket = self.bucket(record.size);
        let mut paths = bucket.lock().unwrap_or_else(PoisonError::into_inner);
        paths.insert(record.path)
    }

    /// Number of distinct sizes seen so far.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Freezes the index into an ordered `size -> paths` map.
    ///
    /// Taking `self` by value means every writer borrowing the index has
    /// already finished.
    pub fn into_snapshot(self) -> BTreeMap<u64, Vec<PathBuf>> {
        self.buckets
            .into_iter()
            .map(|(size, bucket)| {
                let paths = match Arc::try_unwrap(bucket) {
                    Ok(mutex) => mutex.into_inner().unwrap_or_else(PoisonError::into_inner),
                    Err(shared) => shared.lock().unwrap_or_else(PoisonError::into_inner).clone(),
                };
                (size, paths.into_iter().collect())
            })
            .collect()
    }
}
