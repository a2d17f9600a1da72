//! Main duplicate detection engine.
//!
//! [`DuplicateFinder`] orchestrates the detection pipeline:
//!
//! 1. **Walk**: collect a [`FileRecord`] for every regular file under the
//!    requested roots, in deterministic discovery order.
//! 2. **Size buckets**: discard every file whose size is unique.
//! 3. **Prehash**: 4KB BLAKE3 prehash of each remaining file, discarding
//!    size buckets that split apart on the prehash alone.
//! 4. **Full digest**: full-content BLAKE3 of the survivors, bucketing by
//!    `(size, digest)`.
//! 5. **Resolve**: within each digest bucket, confirm identity at the
//!    configured [`StrictnessMode`] and emit [`DuplicateGroup`]s.
//!
//! Hashing phases fan out over a bounded rayon pool sized by
//! [`FinderConfig::io_threads`]; everything is cancellable through a shared
//! shutdown flag.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::progress::ProgressCallback;
use crate::scanner::{Digest, FileRecord, Hasher, ScanError, Walker, WalkerConfig};

use super::groups::{group_by_size, BucketStats, DuplicateGroup};
use super::verify::partition_candidates;

/// How much certainty a scan demands before calling two files duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrictnessMode {
    /// Level 0: a shared full-content digest is the verdict.
    #[default]
    Hash,
    /// Level 1: matching stat signatures skip the read; digest-equal files
    /// with differing signatures are byte-verified.
    Shallow,
    /// Level 2: every pair relationship is established by byte comparison.
    Exhaustive,
}

impl StrictnessMode {
    /// Parse a numeric strictness level.
    #[must_use]
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Self::Hash),
            1 => Some(Self::Shallow),
            2 => Some(Self::Exhaustive),
            _ => None,
        }
    }

    /// The numeric level of this mode.
    #[must_use]
    pub fn level(&self) -> u8 {
        match self {
            Self::Hash => 0,
            Self::Shallow => 1,
            Self::Exhaustive => 2,
        }
    }
}

impl fmt::Display for StrictnessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Hash => "hash",
            Self::Shallow => "shallow",
            Self::Exhaustive => "exhaustive",
        };
        write!(f, "{name}")
    }
}

/// Errors from the detection pipeline.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// Scan was interrupted by a shutdown request
    #[error("scan interrupted")]
    Interrupted,

    /// A requested root does not exist
    #[error("path not found: {0}")]
    PathNotFound(PathBuf),

    /// A requested root is not a directory
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The I/O thread pool could not be built
    #[error("failed to build I/O thread pool: {0}")]
    ThreadPool(String),

    /// A fatal scan error (error policy is fail-fast)
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Configuration for a duplicate scan.
#[derive(Clone, Default)]
pub struct FinderConfig {
    /// Certainty level for duplicate verdicts
    pub strictness: StrictnessMode,
    /// Exclude unreadable files instead of failing the scan
    pub ignore_errors: bool,
    /// Threads for hashing and comparison (0 = default of 4)
    pub io_threads: usize,
    /// Traversal options
    pub walker_config: WalkerConfig,
    /// Shared cancellation flag
    pub shutdown_flag: Option<Arc<std::sync::atomic::AtomicBool>>,
    /// Progress reporting sink
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinderConfig")
            .field("strictness", &self.strictness)
            .field("ignore_errors", &self.ignore_errors)
            .field("io_threads", &self.io_threads)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag.is_some())
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl FinderConfig {
    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the strictness mode.
    #[must_use]
    pub fn with_strictness(mut self, mode: StrictnessMode) -> Self {
        self.strictness = mode;
        self
    }

    /// Set the error policy.
    #[must_use]
    pub fn with_ignore_errors(mut self, ignore: bool) -> Self {
        self.ignore_errors = ignore;
        self
    }

    /// Set the I/O thread count.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads;
        self
    }

    /// Set traversal options.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<std::sync::atomic::AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Effective I/O thread count.
    #[must_use]
    pub fn effective_io_threads(&self) -> usize {
        if self.io_threads == 0 {
            4
        } else {
            self.io_threads
        }
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Statistics from the hashing phases.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DigestStats {
    /// Files that received a prehash
    pub prehashed: usize,
    /// Files eliminated by prehash disagreement
    pub eliminated_by_prehash: usize,
    /// Files that received a full digest
    pub digested: usize,
    /// Files eliminated by full digest disagreement
    pub eliminated_by_digest: usize,
}

/// Statistics from the resolution phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyStats {
    /// Byte comparisons performed
    pub comparisons: u64,
    /// Matches decided by stat signature alone
    pub shallow_matches: u64,
}

/// Summary of a completed scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Regular files discovered under the roots
    pub total_files: usize,
    /// Total bytes across discovered files
    pub total_size: u64,
    /// Files eliminated because their size was unique
    pub eliminated_by_size: usize,
    /// Hashing phase statistics
    pub digest_stats: DigestStats,
    /// Resolution phase statistics
    pub verify_stats: VerifyStats,
    /// Number of duplicate groups found
    pub duplicate_groups: usize,
    /// Files that are redundant copies
    pub duplicate_files: usize,
    /// Bytes reclaimable by deduplication
    pub reclaimable_space: u64,
    /// Wall-clock scan duration
    pub scan_duration: Duration,
    /// Errors from excluded files (ignore-errors policy)
    pub scan_errors: Vec<ScanError>,
}

impl ScanSummary {
    /// Reclaimable space as a percentage of total scanned bytes.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Human-readable reclaimable space.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        bytesize::ByteSize(self.reclaimable_space).to_string()
    }
}

/// The duplicate detection engine.
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Arc<Hasher>,
}

impl DuplicateFinder {
    /// Create a finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new();
        if let Some(flag) = &config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(Arc::clone(flag));
        }
        Self {
            config,
            hasher: Arc::new(hasher),
        }
    }

    /// Create a finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Run the full pipeline over the given roots.
    ///
    /// Returns confirmed duplicate groups in deterministic order (by the
    /// discovery index of each group's earliest member) plus a summary.
    ///
    /// # Errors
    ///
    /// Fails on nonexistent or non-directory roots, on shutdown, and, with
    /// `ignore_errors` off, on the first unreadable file.
    pub fn find_duplicates(
        &self,
        roots: &[PathBuf],
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start = Instant::now();

        // Canonicalize up front so every record carries an absolute,
        // normalized path even when roots are given relative.
        let mut resolved = Vec::with_capacity(roots.len());
        for root in roots {
            if !root.exists() {
                return Err(FinderError::PathNotFound(root.clone()));
            }
            if !root.is_dir() {
                return Err(FinderError::NotADirectory(root.clone()));
            }
            let canonical = root.canonicalize().map_err(|e| {
                FinderError::Scan(ScanError::Io {
                    path: root.clone(),
                    source: Arc::new(e),
                })
            })?;
            resolved.push(canonical);
        }

        let mut summary = ScanSummary::default();

        // Phase 1: walk the roots.
        let files = self.collect_files(&resolved, &mut summary)?;
        summary.total_files = files.len();
        log::info!("Discovered {} files", summary.total_files);

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        // Phase 2: size buckets.
        let (size_buckets, bucket_stats) = group_by_size(files);
        summary.total_size = bucket_stats.total_size;
        summary.eliminated_by_size = bucket_stats.eliminated_unique;
        self.log_bucket_stats(&bucket_stats);

        // Phases 3 and 4: prehash then full digest, on a bounded pool.
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.effective_io_threads())
            .thread_name(|i| format!("justone-io-{i}"))
            .build()
            .map_err(|e| FinderError::ThreadPool(e.to_string()))?;

        let digest_buckets = self.digest_phase(&pool, size_buckets, &mut summary)?;

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        // Phase 5: resolve each digest bucket at the configured certainty.
        let groups = self.resolve_buckets(digest_buckets, &mut summary)?;

        summary.duplicate_groups = groups.len();
        summary.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        summary.reclaimable_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
        summary.scan_duration = start.elapsed();

        log::info!(
            "Scan complete: {} groups, {} redundant files, {} reclaimable, {:.2?}",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display(),
            summary.scan_duration
        );

        Ok((groups, summary))
    }

    /// Walk the roots, assigning each record its discovery index.
    fn collect_files(
        &self,
        roots: &[PathBuf],
        summary: &mut ScanSummary,
    ) -> Result<Vec<FileRecord>, FinderError> {
        self.notify_phase_start("scan", 0);

        let mut walker = Walker::new(roots, self.config.walker_config.clone());
        if let Some(flag) = &self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        let mut files = Vec::new();
        for entry in walker.walk() {
            match entry {
                Ok(mut record) => {
                    record.index = files.len();
                    self.notify_progress(files.len() as u64, 0);
                    files.push(record);
                }
                Err(e) => {
                    if self.config.ignore_errors {
                        log::warn!("Excluding: {e}");
                        summary.scan_errors.push(e);
                    } else {
                        return Err(e.into());
                    }
                }
            }
        }

        self.notify_phase_end("scan");

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }
        Ok(files)
    }

    /// Prehash then fully digest the size-bucket survivors.
    ///
    /// Returns digest buckets ordered by each bucket's earliest discovery
    /// index, members ordered by index within each bucket.
    fn digest_phase(
        &self,
        pool: &rayon::ThreadPool,
        size_buckets: HashMap<u64, Vec<FileRecord>>,
        summary: &mut ScanSummary,
    ) -> Result<Vec<Vec<FileRecord>>, FinderError> {
        // Prehash pass: bucket by (size, prehash).
        let candidates: Vec<FileRecord> = size_buckets.into_values().flatten().collect();
        summary.digest_stats.prehashed = candidates.len();
        self.notify_phase_start("prehash", candidates.len() as u64);

        let prehashed = self.hash_pass(pool, candidates, summary, |hasher, record| {
            hasher.prehash(&record.path)
        })?;

        let mut prehash_buckets: HashMap<(u64, Digest), Vec<FileRecord>> = HashMap::new();
        for (record, digest) in prehashed {
            prehash_buckets.entry((record.size, digest)).or_default().push(record);
        }
        let survivors: Vec<FileRecord> = prehash_buckets
            .into_values()
            .filter_map(|members| {
                if members.len() > 1 {
                    Some(members)
                } else {
                    summary.digest_stats.eliminated_by_prehash += members.len();
                    None
                }
            })
            .flatten()
            .collect();
        self.notify_phase_end("prehash");

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        // Full digest pass: bucket by (size, digest).
        summary.digest_stats.digested = survivors.len();
        self.notify_phase_start("digest", survivors.len() as u64);

        let digested = self.hash_pass(pool, survivors, summary, |hasher, record| {
            hasher.digest(&record.path, record.size)
        })?;

        let mut digest_buckets: HashMap<(u64, Digest), Vec<FileRecord>> = HashMap::new();
        for (mut record, digest) in digested {
            record.digest = Some(digest);
            digest_buckets.entry((record.size, digest)).or_default().push(record);
        }
        self.notify_phase_end("digest");

        let mut buckets: Vec<Vec<FileRecord>> = digest_buckets
            .into_values()
            .filter_map(|mut members| {
                if members.len() > 1 {
                    members.sort_by_key(|f| f.index);
                    Some(members)
                } else {
                    summary.digest_stats.eliminated_by_digest += members.len();
                    None
                }
            })
            .collect();
        buckets.sort_by_key(|members| members[0].index);

        log::debug!(
            "Digest phase: {} prehashed, {} digested, {} buckets survive",
            summary.digest_stats.prehashed,
            summary.digest_stats.digested,
            buckets.len()
        );

        Ok(buckets)
    }

    /// Run one hashing function over all candidates on the bounded pool.
    fn hash_pass<F>(
        &self,
        pool: &rayon::ThreadPool,
        candidates: Vec<FileRecord>,
        summary: &mut ScanSummary,
        hash_fn: F,
    ) -> Result<Vec<(FileRecord, Digest)>, FinderError>
    where
        F: Fn(&Hasher, &FileRecord) -> Result<Digest, crate::scanner::HashError> + Send + Sync,
    {
        let hasher = Arc::clone(&self.hasher);
        let results: Vec<(FileRecord, Result<Digest, crate::scanner::HashError>)> =
            pool.install(|| {
                candidates
                    .into_par_iter()
                    .map(|record| {
                        let result = hash_fn(&hasher, &record);
                        self.notify_item(record.size);
                        (record, result)
                    })
                    .collect()
            });

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let mut hashed = Vec::with_capacity(results.len());
        for (record, result) in results {
            match result {
                Ok(digest) => hashed.push((record, digest)),
                Err(e) => {
                    if self.config.ignore_errors {
                        log::warn!("Excluding {}: {e}", record.path.display());
                        summary.scan_errors.push(ScanError::Hash(e));
                    } else {
                        return Err(ScanError::Hash(e).into());
                    }
                }
            }
        }
        Ok(hashed)
    }

    /// Resolve digest buckets into confirmed groups.
    fn resolve_buckets(
        &self,
        buckets: Vec<Vec<FileRecord>>,
        summary: &mut ScanSummary,
    ) -> Result<Vec<DuplicateGroup>, FinderError> {
        self.notify_phase_start("verify", buckets.len() as u64);

        let shutdown = self.config.shutdown_flag.as_deref();
        let mut groups = Vec::new();

        for members in buckets {
            if self.config.is_shutdown_requested() {
                return Err(FinderError::Interrupted);
            }

            let size = members[0].size;
            let digest = members[0].digest;
            let outcome = partition_candidates(
                members,
                self.config.strictness,
                shutdown,
                self.config.ignore_errors,
            )
            .map_err(|e| {
                if e.is_interrupted() {
                    FinderError::Interrupted
                } else {
                    ScanError::Hash(e).into()
                }
            })?;

            summary.verify_stats.comparisons += outcome.comparisons;
            summary.verify_stats.shallow_matches += outcome.shallow_matches;
            summary
                .scan_errors
                .extend(outcome.errors.into_iter().map(ScanError::Hash));

            for class in outcome.classes {
                if class.len() > 1 {
                    groups.push(DuplicateGroup::new(digest, size, class));
                }
            }
            self.notify_item(0);
        }

        self.notify_phase_end("verify");

        groups.sort_by_key(DuplicateGroup::first_index);
        Ok(groups)
    }

    fn log_bucket_stats(&self, stats: &BucketStats) {
        log::info!(
            "Size buckets: {} candidates in {} buckets, {} files need no further work",
            stats.potential_duplicates,
            stats.duplicate_buckets,
            stats.eliminated_unique
        );
    }

    fn notify_phase_start(&self, phase: &str, total: u64) {
        if let Some(cb) = &self.config.progress_callback {
            cb.on_phase_start(phase, total);
        }
    }

    fn notify_progress(&self, current: u64, total: u64) {
        if let Some(cb) = &self.config.progress_callback {
            cb.on_progress(current, total);
        }
    }

    fn notify_item(&self, bytes: u64) {
        if let Some(cb) = &self.config.progress_callback {
            cb.on_item_completed(bytes);
        }
    }

    fn notify_phase_end(&self, phase: &str) {
        if let Some(cb) = &self.config.progress_callback {
            cb.on_phase_end(phase);
        }
    }
}
