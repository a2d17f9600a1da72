//! Scanner module for directory traversal, file identity, and content hashing.
//!
//! This module provides functionality for:
//! - Parallel directory walking using jwalk
//! - Platform stat signatures (device/inode/mtime) for the shallow tier
//! - Content digests with BLAKE3 (streaming)
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`identity`]: Stat signatures used as a shallow equality heuristic
//! - [`hasher`]: BLAKE3 file digests (streaming)
//!
//! # Example
//!
//! ```no_run
//! use justone::scanner::{Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let config = WalkerConfig {
//!     skip_hidden: true,
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(&[PathBuf::from(".")], config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod identity;
pub mod walker;

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

// Re-export main types
pub use hasher::{digest_to_hex, Digest, Hasher, PREHASH_SIZE};
pub use identity::StatSignature;
pub use walker::Walker;

/// Metadata for a discovered file.
///
/// One record is created per regular file during traversal and flows through
/// the detection pipeline. The content digest is populated lazily once the
/// signature engine has run; everything else is immutable after discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Platform stat signature (device, inode-equivalent, mtime)
    pub signature: StatSignature,
    /// Full-content digest, computed lazily by the signature engine
    pub digest: Option<Digest>,
    /// Discovery rank, used for deterministic output ordering
    #[serde(default)]
    pub index: usize,
}

impl FileRecord {
    /// Create a new record for a discovered file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the file
    /// * `size` - File size in bytes
    /// * `signature` - Platform stat signature
    #[must_use]
    pub fn new(path: PathBuf, size: u64, signature: StatSignature) -> Self {
        Self {
            path,
            size,
            signature,
            digest: None,
            index: 0,
        }
    }
}

/// Configuration for directory walking.
///
/// Controls filtering and other walk behavior. Symbolic links are never
/// followed into new trees; the walker skips them unconditionally.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Minimum file size to include (in bytes).
    /// Files smaller than this are skipped.
    pub min_size: Option<u64>,

    /// Maximum file size to include (in bytes).
    /// Files larger than this are skipped.
    pub max_size: Option<u64>,

    /// Glob patterns to ignore (gitignore-style).
    /// These are applied in addition to any .gitignore files.
    pub ignore_patterns: Vec<String>,
}

impl WalkerConfig {
    /// Create a new configuration from CLI arguments.
    #[must_use]
    pub fn new(
        skip_hidden: bool,
        min_size: Option<u64>,
        max_size: Option<u64>,
        ignore_patterns: Vec<String>,
    ) -> Self {
        Self {
            skip_hidden,
            min_size,
            max_size,
            ignore_patterns,
        }
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug, Clone)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A read failure during digest computation or byte comparison.
    #[error(transparent)]
    Hash(#[from] HashError),
}

/// Errors that can occur while reading file content (digesting or comparing).
#[derive(thiserror::Error, Debug, Clone)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl HashError {
    /// Classify a raw I/O error against the path that produced it.
    #[must_use]
    pub fn from_io(path: &std::path::Path, source: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match source.kind() {
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: Arc::new(source),
            },
        }
    }

    /// Error representing work abandoned due to a shutdown request.
    #[must_use]
    pub fn interrupted(path: &std::path::Path) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source: Arc::new(std::io::Error::new(
                std::io::ErrorKind::Interrupted,
                "interrupted",
            )),
        }
    }

    /// Whether this error comes from a shutdown request rather than I/O.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(
            self,
            Self::Io { source, .. } if source.kind() == std::io::ErrorKind::Interrupted
        )
    }

    /// The path this error refers to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) => p,
            Self::Io { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_record_new() {
        let record = FileRecord::new(
            PathBuf::from("/test/file.txt"),
            1024,
            StatSignature::default(),
        );

        assert_eq!(record.path, PathBuf::from("/test/file.txt"));
        assert_eq!(record.size, 1024);
        assert!(record.digest.is_none());
        assert_eq!(record.index, 0);
    }

    #[test]
    fn test_walker_config_default() {
        let config = WalkerConfig::default();

        assert!(!config.skip_hidden);
        assert!(config.min_size.is_none());
        assert!(config.max_size.is_none());
        assert!(config.ignore_patterns.is_empty());
    }

    #[test]
    fn test_walker_config_new() {
        let config = WalkerConfig::new(
            true,
            Some(1024),
            Some(1_000_000),
            vec!["*.tmp".to_string()],
        );

        assert!(config.skip_hidden);
        assert_eq!(config.min_size, Some(1024));
        assert_eq!(config.max_size, Some(1_000_000));
        assert_eq!(config.ignore_patterns, vec!["*.tmp".to_string()]);
    }

    #[test]
    fn test_scan_error_display() {
        let err = ScanError::PermissionDenied(PathBuf::from("/test"));
        assert_eq!(err.to_string(), "Permission denied: /test");

        let err = ScanError::NotFound(PathBuf::from("/missing"));
        assert_eq!(err.to_string(), "Path not found: /missing");
    }

    #[test]
    fn test_hash_error_classification() {
        let err = HashError::from_io(
            std::path::Path::new("/secret"),
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, HashError::PermissionDenied(_)));
        assert_eq!(err.path(), std::path::Path::new("/secret"));

        let err = HashError::from_io(
            std::path::Path::new("/gone"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, HashError::NotFound(_)));

        let err = HashError::from_io(
            std::path::Path::new("/dev/weird"),
            std::io::Error::other("boom"),
        );
        assert!(matches!(err, HashError::Io { .. }));
    }

    #[test]
    fn test_hash_error_interrupted() {
        let err = HashError::interrupted(std::path::Path::new("/busy"));
        assert!(err.is_interrupted());
        match err {
            HashError::Io { ref source, .. } => {
                assert_eq!(source.kind(), std::io::ErrorKind::Interrupted);
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }
}
