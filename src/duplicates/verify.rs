//! Certainty resolution for digest-equal files.
//!
//! A shared full-content digest is overwhelming but not absolute evidence of
//! identity. This module upgrades digest matches to the certainty level the
//! caller asked for:
//!
//! - [`StrictnessMode::Hash`]: the digest is the verdict, no further I/O.
//! - [`StrictnessMode::Shallow`]: files whose stat signatures match (same
//!   device and inode, same mtime) are accepted without reading; everything
//!   else is byte-compared.
//! - [`StrictnessMode::Exhaustive`]: every pair relationship is established
//!   by byte comparison, with the digest serving only as a pre-filter.
//!
//! Candidates are partitioned into equivalence classes by comparing each file
//! against one representative per existing class, so confirming `n` identical
//! files costs `n - 1` comparisons rather than a full pairwise sweep.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::scanner::{FileRecord, HashError};

use super::finder::StrictnessMode;

/// Chunk size for streaming byte comparison.
const COMPARE_CHUNK: usize = 64 * 1024;

/// Result of partitioning one digest bucket into identity classes.
#[derive(Debug, Default)]
pub struct VerifyOutcome {
    /// Equivalence classes; members keep their input order.
    pub classes: Vec<Vec<FileRecord>>,
    /// Files dropped due to read errors (ignore-errors policy).
    pub errors: Vec<HashError>,
    /// Byte comparisons performed.
    pub comparisons: u64,
    /// Matches decided by stat signature without reading content.
    pub shallow_matches: u64,
}

/// Fill `buf` from `reader`, tolerating short reads.
///
/// Returns the number of bytes read, which is less than `buf.len()` only at
/// end of file.
fn read_chunk(reader: &mut File, buf: &mut [u8], path: &Path) -> Result<usize, HashError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(HashError::from_io(path, e)),
        }
    }
    Ok(filled)
}

/// Compare two files byte by byte.
///
/// Returns `false` as soon as a differing chunk (or a length mismatch) is
/// found. The shutdown flag, if set, aborts the comparison with an
/// interrupted error.
pub fn files_identical(
    a: &Path,
    b: &Path,
    shutdown: Option<&AtomicBool>,
) -> Result<bool, HashError> {
    let mut file_a = File::open(a).map_err(|e| HashError::from_io(a, e))?;
    let mut file_b = File::open(b).map_err(|e| HashError::from_io(b, e))?;

    let mut buf_a = vec![0u8; COMPARE_CHUNK];
    let mut buf_b = vec![0u8; COMPARE_CHUNK];

    loop {
        if shutdown.is_some_and(|f| f.load(Ordering::SeqCst)) {
            return Err(HashError::interrupted(a));
        }

        let read_a = read_chunk(&mut file_a, &mut buf_a, a)?;
        let read_b = read_chunk(&mut file_b, &mut buf_b, b)?;

        if read_a != read_b || buf_a[..read_a] != buf_b[..read_b] {
            return Ok(false);
        }
        if read_a == 0 {
            return Ok(true);
        }
    }
}

/// Partition a digest bucket into identity classes at the given certainty.
///
/// Each candidate is tested against the representative (first member) of
/// every existing class; on a match it joins that class, otherwise it opens
/// a new one. With `ignore_errors` set, a candidate whose comparison fails
/// is excluded from the result and its error recorded; without it, the first
/// comparison error is returned.
pub fn partition_candidates(
    candidates: Vec<FileRecord>,
    mode: StrictnessMode,
    shutdown: Option<&AtomicBool>,
    ignore_errors: bool,
) -> Result<VerifyOutcome, HashError> {
    let mut outcome = VerifyOutcome::default();

    if mode == StrictnessMode::Hash {
        // The digest is the verdict: the whole bucket is one class.
        outcome.classes.push(candidates);
        return Ok(outcome);
    }

    'candidates: for candidate in candidates {
        for class in &mut outcome.classes {
            let representative = &class[0];

            if mode == StrictnessMode::Shallow
                && candidate.signature.matches(&representative.signature)
            {
                outcome.shallow_matches += 1;
                class.push(candidate);
                continue 'candidates;
            }

            outcome.comparisons += 1;
            match files_identical(&candidate.path, &representative.path, shutdown) {
                Ok(true) => {
                    class.push(candidate);
                    continue 'candidates;
                }
                Ok(false) => {}
                Err(e) => {
                    // A shutdown abort is not a read failure; it must
                    // propagate no matter what the error policy says.
                    if ignore_errors && !e.is_interrupted() {
                        log::warn!("Excluding {}: {}", candidate.path.display(), e);
                        outcome.errors.push(e);
                        continue 'candidates;
                    }
                    return Err(e);
                }
            }
        }
        outcome.classes.push(vec![candidate]);
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{FileRecord, StatSignature};
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicBool;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(content).unwrap();
        path
    }

    fn record_for(path: PathBuf) -> FileRecord {
        let metadata = std::fs::symlink_metadata(&path).unwrap();
        FileRecord::new(path, metadata.len(), StatSignature::from_metadata(&metadata))
    }

    #[test]
    fn test_identical_files() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a", b"same content");
        let b = write_file(&dir, "b", b"same content");

        assert!(files_identical(&a, &b, None).unwrap());
    }

    #[test]
    fn test_differing_final_byte() {
        let dir = TempDir::new().unwrap();
        let content_a = vec![0x42u8; 200_000];
        let mut content_b = content_a.clone();
        *content_b.last_mut().unwrap() = 0x43;

        let a = write_file(&dir, "a", &content_a);
        let b = write_file(&dir, "b", &content_b);

        assert!(!files_identical(&a, &b, None).unwrap());
    }

    #[test]
    fn test_length_mismatch() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a", b"prefix");
        let b = write_file(&dir, "b", b"prefix plus");

        assert!(!files_identical(&a, &b, None).unwrap());
    }

    #[test]
    fn test_empty_files_identical() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a", b"");
        let b = write_file(&dir, "b", b"");

        assert!(files_identical(&a, &b, None).unwrap());
    }

    #[test]
    fn test_missing_file_error() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a", b"x");
        let missing = dir.path().join("missing");

        assert!(files_identical(&a, &missing, None).is_err());
    }

    #[test]
    fn test_shutdown_aborts_comparison() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a", b"data");
        let b = write_file(&dir, "b", b"data");

        let shutdown = AtomicBool::new(true);
        assert!(files_identical(&a, &b, Some(&shutdown)).is_err());
    }

    #[test]
    fn test_partition_hash_mode_trusts_digest() {
        let dir = TempDir::new().unwrap();
        // Contents differ, but hash mode never reads them.
        let a = record_for(write_file(&dir, "a", b"one"));
        let b = record_for(write_file(&dir, "b", b"two"));

        let outcome =
            partition_candidates(vec![a, b], StrictnessMode::Hash, None, false).unwrap();
        assert_eq!(outcome.classes.len(), 1);
        assert_eq!(outcome.classes[0].len(), 2);
        assert_eq!(outcome.comparisons, 0);
    }

    #[test]
    fn test_partition_exhaustive_splits_classes() {
        let dir = TempDir::new().unwrap();
        let a = record_for(write_file(&dir, "a", b"alpha"));
        let b = record_for(write_file(&dir, "b", b"alpha"));
        let c = record_for(write_file(&dir, "c", b"bravo"));
        let d = record_for(write_file(&dir, "d", b"bravo"));

        let outcome =
            partition_candidates(vec![a, b, c, d], StrictnessMode::Exhaustive, None, false)
                .unwrap();

        assert_eq!(outcome.classes.len(), 2);
        assert!(outcome.classes.iter().all(|c| c.len() == 2));
    }

    #[test]
    fn test_partition_singleton_classes_for_distinct_content() {
        let dir = TempDir::new().unwrap();
        let a = record_for(write_file(&dir, "a", b"one"));
        let b = record_for(write_file(&dir, "b", b"two"));
        let c = record_for(write_file(&dir, "c", b"six"));

        let outcome =
            partition_candidates(vec![a, b, c], StrictnessMode::Exhaustive, None, false).unwrap();

        assert_eq!(outcome.classes.len(), 3);
        // Second candidate compares against one class, third against two.
        assert_eq!(outcome.comparisons, 3);
    }

    #[test]
    #[cfg(unix)]
    fn test_partition_shallow_short_circuits_hardlinks() {
        let dir = TempDir::new().unwrap();
        let a_path = write_file(&dir, "a", b"linked content");
        let b_path = dir.path().join("b");
        std::fs::hard_link(&a_path, &b_path).unwrap();

        let a = record_for(a_path);
        let b = record_for(b_path);

        let outcome =
            partition_candidates(vec![a, b], StrictnessMode::Shallow, None, false).unwrap();

        assert_eq!(outcome.classes.len(), 1);
        assert_eq!(outcome.shallow_matches, 1);
        assert_eq!(outcome.comparisons, 0);
    }

    #[test]
    fn test_partition_ignore_errors_drops_candidate() {
        let dir = TempDir::new().unwrap();
        let a = record_for(write_file(&dir, "a", b"stuff"));
        let mut missing = a.clone();
        missing.path = dir.path().join("gone");

        let outcome = partition_candidates(
            vec![a, missing],
            StrictnessMode::Exhaustive,
            None,
            true,
        )
        .unwrap();

        assert_eq!(outcome.classes.len(), 1);
        assert_eq!(outcome.classes[0].len(), 1);
        assert_eq!(outcome.errors.len(), 1);
    }

    #[test]
    fn test_partition_shutdown_propagates_despite_ignore_errors() {
        let dir = TempDir::new().unwrap();
        let a = record_for(write_file(&dir, "a", b"same bytes"));
        let b = record_for(write_file(&dir, "b", b"same bytes"));

        let shutdown = AtomicBool::new(true);
        let err = partition_candidates(
            vec![a, b],
            StrictnessMode::Exhaustive,
            Some(&shutdown),
            true,
        )
        .unwrap_err();

        // The abort surfaces as an error rather than being recorded as an
        // excluded unreadable file.
        assert!(err.is_interrupted());
    }

    #[test]
    fn test_partition_fatal_error_without_ignore() {
        let dir = TempDir::new().unwrap();
        let a = record_for(write_file(&dir, "a", b"stuff"));
        let mut missing = a.clone();
        missing.path = dir.path().join("gone");

        let result =
            partition_candidates(vec![a, missing], StrictnessMode::Exhaustive, None, false);
        assert!(result.is_err());
    }

    #[test]
    fn test_partition_preserves_input_order() {
        let dir = TempDir::new().unwrap();
        let mut records = Vec::new();
        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            let mut r = record_for(write_file(&dir, name, b"same"));
            r.index = i;
            records.push(r);
        }

        let outcome =
            partition_candidates(records, StrictnessMode::Exhaustive, None, false).unwrap();
        assert_eq!(outcome.classes.len(), 1);
        assert_eq!(
            outcome.classes[0].iter().map(|f| f.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }
}
