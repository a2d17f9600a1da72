//! Platform stat signatures used as a shallow equality heuristic.
//!
//! # Overview
//!
//! A stat signature captures the OS-reported identity of a file: the device
//! and inode-equivalent identifier plus the modification time. Two directory
//! entries with matching signatures are either hardlinks to the same inode or
//! the same file reached through overlapping roots; in both cases their
//! content is identical without reading a single byte. The shallow strictness
//! tier uses this as its short-circuit.
//!
//! # Platform Support
//!
//! - **Unix**: (device_id, inode) pairs from file metadata
//! - **Other**: no inode-equivalent is available; signatures never match and
//!   the resolver falls back to byte comparison

use std::fs::Metadata;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// OS-reported file identity: device + inode-equivalent + mtime.
///
/// Signatures only ever report a match when the platform exposes a stable
/// file identity. On platforms without one, [`matches`](Self::matches) is
/// always `false`, which degrades the shallow tier to byte comparison rather
/// than risking a false positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatSignature {
    /// (device id, inode) on supporting platforms, `None` elsewhere
    identity: Option<(u64, u64)>,
    /// Last modification time
    mtime: SystemTime,
}

impl StatSignature {
    /// Build a signature from file metadata.
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            identity: platform_identity(metadata),
            mtime: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        }
    }

    /// Shallow equality: same device, same inode-equivalent, same mtime.
    ///
    /// Returns `false` whenever either side lacks a platform identity, so a
    /// missing inode can never be mistaken for a match.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        match (self.identity, other.identity) {
            (Some(a), Some(b)) => a == b && self.mtime == other.mtime,
            _ => false,
        }
    }

    /// The file's modification time.
    #[must_use]
    pub fn mtime(&self) -> SystemTime {
        self.mtime
    }

    /// Whether this platform exposes a stable file identity.
    #[must_use]
    pub const fn identity_supported() -> bool {
        cfg!(unix)
    }
}

impl Default for StatSignature {
    fn default() -> Self {
        Self {
            identity: None,
            mtime: SystemTime::UNIX_EPOCH,
        }
    }
}

#[cfg(unix)]
fn platform_identity(metadata: &Metadata) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    Some((metadata.dev(), metadata.ino()))
}

#[cfg(not(unix))]
fn platform_identity(_metadata: &Metadata) -> Option<(u64, u64)> {
    // Windows would need GetFileInformationByHandle to get a file index;
    // std::fs::Metadata does not expose it. Without an identity the shallow
    // tier falls back to byte comparison, which is always correct.
    None
}
