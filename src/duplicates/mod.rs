//! Duplicate detection pipeline.
//!
//! This module implements the multi-phase detection pipeline:
//!
//! 1. **Size bucketing** ([`groups`]): files are partitioned by exact byte
//!    size. Files with a unique size cannot have a duplicate and are
//!    eliminated without any file I/O.
//! 2. **Digesting** ([`finder`]): files in multi-member size buckets get a
//!    4KB prehash, then a full-content BLAKE3 digest, eliminating most
//!    non-duplicates cheaply.
//! 3. **Resolution** ([`verify`]): digest-equal files are confirmed as
//!    duplicates according to the configured [`StrictnessMode`], from
//!    trusting the digest outright up to exhaustive byte comparison.
//!
//! The entry point is [`DuplicateFinder::find_duplicates`], which runs the
//! whole pipeline and returns deterministic [`DuplicateGroup`]s plus a
//! [`ScanSummary`] of per-phase statistics.

pub mod finder;
pub mod groups;
pub mod verify;

pub use finder::{
    DigestStats, DuplicateFinder, FinderConfig, FinderError, ScanSummary, StrictnessMode,
    VerifyStats,
};
pub use groups::{group_by_size, BucketStats, DuplicateGroup};
pub use verify::{files_identical, partition_candidates, VerifyOutcome};
