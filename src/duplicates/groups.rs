//! Size bucketing and duplicate group types.
//!
//! Grouping files by exact byte size is the cheapest elimination step in the
//! pipeline: files with different sizes cannot be identical, so every file
//! whose size is unique across the scan is discarded before any content is
//! read. In typical file collections this removes the large majority of
//! candidates using metadata alone.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::scanner::{digest_to_hex, Digest, FileRecord};

/// A confirmed group of identical files.
///
/// Every member of a group has been established as identical to every other
/// member, at the certainty level of the strictness mode the scan ran under.
/// Groups always contain at least two files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Full-content BLAKE3 digest shared by the group.
    ///
    /// Always present on groups produced by the finder, which only emits
    /// digest-phase survivors; optional so callers can assemble groups
    /// without hashing.
    pub digest: Option<Digest>,
    /// Byte size of every file in the group.
    pub size: u64,
    /// Member files, ordered by discovery index.
    pub files: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    #[must_use]
    pub fn new(digest: Option<Digest>, size: u64, files: Vec<FileRecord>) -> Self {
        Self { digest, size, files }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the group has no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total bytes occupied by all copies.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size * self.files.len() as u64
    }

    /// Bytes reclaimable by keeping a single copy.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        if self.files.len() > 1 {
            self.size * (self.files.len() as u64 - 1)
        } else {
            0
        }
    }

    /// Number of redundant copies (total minus the one to keep).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Hexadecimal rendering of the group digest, if present.
    #[must_use]
    pub fn digest_hex(&self) -> Option<String> {
        self.digest.as_ref().map(digest_to_hex)
    }

    /// Discovery index of the earliest-discovered member.
    ///
    /// Used to order groups deterministically in the final report.
    #[must_use]
    pub fn first_index(&self) -> usize {
        self.files.iter().map(|f| f.index).min().unwrap_or(0)
    }

    /// Paths of all member files.
    #[must_use]
    pub fn paths(&self) -> Vec<&std::path::Path> {
        self.files.iter().map(|f| f.path.as_path()).collect()
    }
}

/// Statistics from the size bucketing phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BucketStats {
    /// Total files examined
    pub total_files: usize,
    /// Total bytes across all examined files
    pub total_size: u64,
    /// Number of distinct file sizes seen
    pub unique_sizes: usize,
    /// Files sharing a size with at least one other file
    pub potential_duplicates: usize,
    /// Files eliminated because their size was unique
    pub eliminated_unique: usize,
    /// Buckets containing two or more files
    pub duplicate_buckets: usize,
}

impl BucketStats {
    /// Fraction of files eliminated by size alone, as a percentage.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Partition files by exact byte size, discarding unique sizes.
///
/// Returns the surviving buckets keyed by size, plus phase statistics.
/// Bucket members keep their input order, so deterministic input yields
/// deterministic buckets.
///
/// Empty files participate like any other size: all zero-byte files land in
/// the `0` bucket and, being trivially identical, will form a single group.
///
/// # Example
///
/// ```
/// use justone::duplicates::group_by_size;
/// use justone::scanner::{FileRecord, StatSignature};
/// use std::path::PathBuf;
///
/// let files = vec![
///     FileRecord::new(PathBuf::from("/a"), 100, StatSignature::default()),
///     FileRecord::new(PathBuf::from("/b"), 100, StatSignature::default()),
///     FileRecord::new(PathBuf::from("/c"), 200, StatSignature::default()),
/// ];
/// let (buckets, stats) = group_by_size(files);
/// assert_eq!(buckets.len(), 1);
/// assert_eq!(buckets[&100].len(), 2);
/// assert_eq!(stats.eliminated_unique, 1);
/// ```
pub fn group_by_size(
    files: impl IntoIterator<Item = FileRecord>,
) -> (HashMap<u64, Vec<FileRecord>>, BucketStats) {
    let mut buckets: HashMap<u64, Vec<FileRecord>> = HashMap::new();
    let mut stats = BucketStats::default();

    for file in files {
        stats.total_files += 1;
        stats.total_size += file.size;
        buckets.entry(file.size).or_default().push(file);
    }

    stats.unique_sizes = buckets.len();

    buckets.retain(|_size, members| {
        if members.len() > 1 {
            stats.potential_duplicates += members.len();
            stats.duplicate_buckets += 1;
            true
        } else {
            stats.eliminated_unique += members.len();
            false
        }
    });

    log::debug!(
        "Size bucketing: {} files -> {} buckets, {} eliminated ({:.1}%)",
        stats.total_files,
        stats.duplicate_buckets,
        stats.eliminated_unique,
        stats.elimination_rate()
    );

    (buckets, stats)
}
