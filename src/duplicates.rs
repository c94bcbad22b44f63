use std::collections::BTreeMap;
use std::path::PathBuf;

use colored::Colorize;
use indicatif::{HumanBytes, HumanCount};
use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::digest::{Digest, digest_file};
use crate::error::ScanError;
use crate::scanner::ScanOptions;
use crate::utils::new_bar;

/// Files sharing one digest. All members have the same size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub size: u64,
    pub paths: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Bytes freed by keeping a single copy.
    pub fn reclaimable_bytes(&self) -> u64 {
        self.size * (self.paths.len() as u64).saturating_sub(1)
    }
}

/// Result of the hashing pass over the size buckets.
#[derive(Debug, Default)]
pub struct GroupingOutcome {
    /// Only digests shared by at least two files.
    pub groups: BTreeMap<Digest, DuplicateGroup>,
    /// Files that could not be hashed; each one is simply left out of `groups`.
    pub failures: Vec<ScanError>,
    pub files_hashed: u64,
}

/// Hashes every file whose size is shared with another file and groups them by digest.
///
/// All candidates are hashed before any group is assembled, so a group is
/// never reported with members missing. A failure on one file never stops
/// the others.
pub fn group_duplicates(
    sizes: &BTreeMap<u64, Vec<PathBuf>>,
    options: &ScanOptions,
) -> GroupingOutcome {
    let candidates: Vec<(u64, &PathBuf)> = sizes
        .iter()
        .filter(|(_, paths)| paths.len() >= 2)
        .flat_map(|(size, paths)| paths.iter().map(move |path| (*size, path)))
        .collect();

    let total_bytes: u64 = candidates.iter().map(|(size, _)| size).sum();
    info!(
        "Hashing {} candidate files ({})",
        HumanCount(candidates.len() as u64),
        HumanBytes(total_bytes)
    );

    let progress = new_bar(options.show_progress, total_bytes);
    let hashed: Vec<(u64, &PathBuf, Result<Digest, ScanError>)> = candidates
        .par_iter()
        .filter(|_| !options.is_cancelled())
        .map(|&(size, path)| {
            let digest = digest_file(path);
            progress.inc(size);
            (size, path, digest)
        })
        .collect();
    progress.finish_and_clear();

    let mut outcome = GroupingOutcome::default();
    for (size, path, digest) in hashed {
        match digest {
            Ok(digest) => {
                outcome.files_hashed += 1;
                outcome
                    .groups
                    .entry(digest)
                    .or_insert_with(|| DuplicateGroup {
                        size,
                        paths: Vec::new(),
                    })
                    .paths
                    .push(path.clone());
            }
            Err(err) => outcome.failures.push(err),
        }
    }

    // a shared size without shared content is not a duplicate
    outcome.groups.retain(|_, group| group.paths.len() >= 2);
    for group in outcome.groups.values_mut() {
        group.paths.sort();
    }

    info!(
        "Found {} duplicate groups among {} hashed files",
        HumanCount(outcome.groups.len() as u64),
        HumanCount(outcome.files_hashed)
    );
    outcome
}

/// Everything a run produced: the duplicate groups plus every recoverable error.
#[derive(Debug, Default)]
pub struct DuplicateReport {
    pub groups: BTreeMap<Digest, DuplicateGroup>,
    pub errors: Vec<ScanError>,
    pub dirs_visited: u64,
    pub files_indexed: u64,
    pub files_hashed: u64,
}

impl DuplicateReport {
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Files across all groups, counting every copy.
    pub fn duplicate_file_count(&self) -> usize {
        self.groups.values().map(|group| group.paths.len()).sum()
    }

    pub fn reclaimable_bytes(&self) -> u64 {
        self.groups.values().map(DuplicateGroup::reclaimable_bytes).sum()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct JsonGroup<'a> {
            digest: &'a Digest,
            size: u64,
            paths: &'a [PathBuf],
        }

        #[derive(Serialize)]
        struct JsonReport<'a> {
            group_count: usize,
            duplicate_file_count: usize,
            reclaimable_bytes: u64,
            groups: Vec<JsonGroup<'a>>,
            errors: Vec<String>,
        }

        let report = JsonReport {
            group_count: self.group_count(),
            duplicate_file_count: self.duplicate_file_count(),
            reclaimable_bytes: self.reclaimable_bytes(),
            groups: self
                .groups
                .iter()
                .map(|(digest, group)| JsonGroup {
                    digest,
                    size: group.size,
                    paths: &group.paths,
                })
                .collect(),
            errors: self.errors.iter().map(ToString::to_string).collect(),
        };
        serde_json::to_string_pretty(&report)
    }
}

pub fn print_results(report: &DuplicateReport) {
    for err in &report.errors {
        warn!("{err}");
    }
    if !report.errors.is_empty() {
        warn!(
            "{} files or directories could not be processed",
            HumanCount(report.errors.len() as u64)
        );
    }

    if report.groups.is_empty() {
        println!("{}", "No duplicate files found!".green());
        return;
    }

    // Largest savings first
    let mut sorted_groups: Vec<_> = report.groups.iter().collect();
    sorted_groups.sort_by(|a, b| b.1.reclaimable_bytes().cmp(&a.1.reclaimable_bytes()));

    for (digest, group) in sorted_groups {
        println!(
            "{} ({}, {} files)",
            digest.to_string().yellow(),
            HumanBytes(group.size),
            group.paths.len()
        );
        for path in &group.paths {
            println!("  {}", path.display());
        }
        println!();
    }

    println!(
        "{}",
        format!(
            "Found {} duplicate groups, {} files, {} reclaimable",
            HumanCount(report.group_count() as u64),
            HumanCount(report.duplicate_file_count() as u64),
            HumanBytes(report.reclaimable_bytes())
        )
        .bold()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn write(path: &Path, byte: u8, len: usize) -> PathBuf {
        fs::write(path, vec![byte; len]).unwrap();
        path.to_path_buf()
    }

    #[test]
    fn same_size_different_content_is_dropped() {
        let dir = tempdir().unwrap();
        let a = write(&dir.path().join("a.bin"), b'X', 2048);
        let b = write(&dir.path().join("b.bin"), b'X', 2048);
        let c = write(&dir.path().join("c.bin"), b'Y', 2048);

        let sizes = BTreeMap::from([(2048, vec![a.clone(), b.clone(), c])]);
        let outcome = group_duplicates(&sizes, &ScanOptions::default());

        assert_eq!(outcome.files_hashed, 3);
        assert!(outcome.failures.is_empty());
        let groups: Vec<_> = outcome.groups.values().collect();
        assert_eq!(
            groups,
            vec![&DuplicateGroup {
                size: 2048,
                paths: vec![a, b]
            }]
        );
    }

    #[test]
    fn singleton_buckets_are_never_hashed() {
        let dir = tempdir().unwrap();
        // does not exist: hashing it would produce a failure
        let ghost = dir.path().join("ghost.bin");

        let sizes = BTreeMap::from([(4096, vec![ghost])]);
        let outcome = group_duplicates(&sizes, &ScanOptions::default());

        assert_eq!(outcome.files_hashed, 0);
        assert!(outcome.failures.is_empty());
        assert!(outcome.groups.is_empty());
    }

    #[test]
    fn unreadable_candidate_does_not_stop_grouping() {
        let dir = tempdir().unwrap();
        let a = write(&dir.path().join("a.bin"), b'X', 2048);
        let b = write(&dir.path().join("b.bin"), b'X', 2048);
        let gone = dir.path().join("gone.bin");
        let e = write(&dir.path().join("e.bin"), b'Z', 3000);
        let f = write(&dir.path().join("f.bin"), b'Z', 3000);

        let sizes = BTreeMap::from([
            (2048, vec![a.clone(), b.clone(), gone.clone()]),
            (3000, vec![e.clone(), f.clone()]),
        ]);
        let outcome = group_duplicates(&sizes, &ScanOptions::default());

        assert_eq!(outcome.groups.len(), 2);
        assert!(outcome.groups.values().any(|g| g.paths == vec![a.clone(), b.clone()]));
        assert!(outcome.groups.values().any(|g| g.paths == vec![e.clone(), f.clone()]));
        assert!(matches!(
            &outcome.failures[..],
            [ScanError::Digest { path, .. }] if *path == gone
        ));
    }

    #[test]
    fn report_counts() {
        let digest = Digest::from(blake3::hash(b"x"));
        let other = Digest::from(blake3::hash(b"y"));
        let report = DuplicateReport {
            groups: BTreeMap::from([
                (
                    digest,
                    DuplicateGroup {
                        size: 100,
                        paths: vec!["/a".into(), "/b".into(), "/c".into()],
                    },
                ),
                (
                    other,
                    DuplicateGroup {
                        size: 10,
                        paths: vec!["/d".into(), "/e".into()],
                    },
                ),
            ]),
            ..DuplicateReport::default()
        };

        assert_eq!(report.group_count(), 2);
        assert_eq!(report.duplicate_file_count(), 5);
        assert_eq!(report.reclaimable_bytes(), 210);
    }

    #[test]
    fn json_lists_groups_and_errors() {
        let digest = Digest::from(blake3::hash(b"x"));
        let report = DuplicateReport {
            groups: BTreeMap::from([(
                digest,
                DuplicateGroup {
                    size: 2048,
                    paths: vec!["/data/a.bin".into(), "/data/b.bin".into()],
                },
            )]),
            errors: vec![ScanError::MissingRoot("/missing".into())],
            ..DuplicateReport::default()
        };

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["group_count"], 1);
        assert_eq!(value["duplicate_file_count"], 2);
        assert_eq!(value["groups"][0]["digest"], digest.to_string());
        assert_eq!(value["groups"][0]["paths"][1], "/data/b.bin");
        assert_eq!(value["errors"][0], "'/missing' does not exist");
    }
}
