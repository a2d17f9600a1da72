//! BLAKE3 file digests with streaming support.
//!
//! # Overview
//!
//! The [`Hasher`] computes content digests without ever holding a whole file
//! in memory: small files are streamed through a fixed-size buffer, large
//! files are memory-mapped and hashed with BLAKE3's internal rayon
//! parallelism. A cheap prehash over the first 4 KiB serves as a pre-filter
//! before full digests are computed.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::HashError;

/// A BLAKE3 content digest.
pub type Digest = [u8; 32];

/// Number of leading bytes covered by the prehash.
pub const PREHASH_SIZE: u64 = 4096;

/// Buffer size for streamed digest computation.
const CHUNK_SIZE: usize = 64 * 1024;

/// Files at or above this size are memory-mapped and hashed in parallel.
const MMAP_THRESHOLD: u64 = 16 * 1024 * 1024;

/// Streaming BLAKE3 hasher for file content.
///
/// Cheap to construct; hold one in an `Arc` and share it across the worker
/// pool. An optional shutdown flag makes long-running digests abort promptly.
#[derive(Debug, Default)]
pub struct Hasher {
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Hasher {
    /// Create a new hasher.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set mid-stream, the current digest is abandoned and
    /// an interrupted error is returned.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Digest of the first [`PREHASH_SIZE`] bytes of a file.
    ///
    /// For files shorter than the prehash window this equals the full digest.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read.
    pub fn prehash(&self, path: &Path) -> Result<Digest, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let mut buf = vec![0u8; PREHASH_SIZE as usize];
        let mut filled = 0;

        while filled < buf.len() {
            let n = file
                .read(&mut buf[filled..])
                .map_err(|e| HashError::from_io(path, e))?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        Ok(*blake3::hash(&buf[..filled]).as_bytes())
    }

    /// Digest of the entire file content.
    ///
    /// Cost scales with file size; memory use stays at one chunk. Files of
    /// [`MMAP_THRESHOLD`] bytes or more are memory-mapped and hashed across
    /// the rayon pool, which is where BLAKE3's multi-threaded throughput
    /// pays off.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read, or if a
    /// shutdown was requested mid-stream.
    pub fn digest(&self, path: &Path, size: u64) -> Result<Digest, HashError> {
        if size >= MMAP_THRESHOLD {
            let mut hasher = blake3::Hasher::new();
            hasher
                .update_mmap_rayon(path)
                .map_err(|e| HashError::from_io(path, e))?;
            return Ok(*hasher.finalize().as_bytes());
        }

        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let mut hasher = blake3::Hasher::new();
        let mut buf = vec![0u8; CHUNK_SIZE];

        loop {
            if self.is_shutdown_requested() {
                return Err(HashError::interrupted(path));
            }
            let n = file
                .read(&mut buf)
                .map_err(|e| HashError::from_io(path, e))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }

        Ok(*hasher.finalize().as_bytes())
    }
}

/// Format a digest as a lowercase hexadecimal string.
#[must_use]
pub fn digest_to_hex(digest: &Digest) -> String {
    blake3::Hash::from_bytes(*digest).to_hex().to_string()
}
