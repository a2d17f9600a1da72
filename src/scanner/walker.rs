//! Directory walker implementation using jwalk for parallel traversal.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing one or more root
//! folders and collecting a [`FileRecord`] per regular file. It uses
//! [`jwalk`] for parallel directory walking with per-directory child sorting,
//! so discovery order is deterministic run to run.
//!
//! # Features
//!
//! - Parallel traversal using the rayon thread pool
//! - Multiple roots, walked in argument order
//! - Symbolic links are never followed into new trees
//! - Gitignore-style pattern matching via the `ignore` crate
//! - Size filtering (min/max) and hidden file filtering
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use justone::scanner::{Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let walker = Walker::new(&[PathBuf::from("/home/user/Downloads")], WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use jwalk::WalkDir;

use super::{FileRecord, ScanError, StatSignature, WalkerConfig};

/// Directory walker for parallel file discovery across multiple roots.
#[derive(Debug)]
pub struct Walker {
    /// Root paths to walk, in argument order
    roots: Vec<PathBuf>,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given roots.
    ///
    /// # Arguments
    ///
    /// * `roots` - Root directories to scan, walked in order
    /// * `config` - Walker configuration options
    #[must_use]
    pub fn new(roots: &[PathBuf], config: WalkerConfig) -> Self {
        Self {
            roots: roots.to_vec(),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops iteration as soon as
    /// possible. This allows for clean Ctrl+C handling.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Build a gitignore matcher from config patterns and the root's .gitignore.
    fn build_gitignore(&self, root: &Path) -> Option<Gitignore> {
        let mut builder = GitignoreBuilder::new(root);

        let gitignore_path = root.join(".gitignore");
        if gitignore_path.exists() {
            if let Some(e) = builder.add(&gitignore_path) {
                log::warn!(
                    "Failed to load .gitignore from {}: {}",
                    gitignore_path.display(),
                    e
                );
            } else {
                log::debug!("Loaded .gitignore from {}", gitignore_path.display());
            }
        }

        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) => {
                if gitignore.is_empty() {
                    None
                } else {
                    Some(gitignore)
                }
            }
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    /// Check if a path should be ignored based on configured patterns.
    fn should_ignore(
        &self,
        root: &Path,
        path: &Path,
        is_dir: bool,
        gitignore: &Option<Gitignore>,
    ) -> bool {
        if let Some(gi) = gitignore {
            // Gitignore matching expects paths relative to the root,
            // with forward slashes even on Windows.
            let relative_path = path.strip_prefix(root).unwrap_or(path);
            let path_str = relative_path.to_string_lossy();
            let normalized_path = if cfg!(windows) {
                path_str.replace('\\', "/")
            } else {
                path_str.into_owned()
            };

            gi.matched_path_or_any_parents(normalized_path, is_dir)
                .is_ignore()
        } else {
            false
        }
    }

    /// Check if a file passes size filters.
    fn passes_size_filter(&self, size: u64) -> bool {
        if let Some(min) = self.config.min_size {
            if size < min {
                return false;
            }
        }
        if let Some(max) = self.config.max_size {
            if size > max {
                return false;
            }
        }
        true
    }

    /// Walk all roots in order, yielding one record per regular file.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration; the caller decides whether they are fatal.
    ///
    /// # Determinism
    ///
    /// Children of every directory are sorted by name before emission, so
    /// repeated walks over an unchanged tree yield files in the same order.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileRecord, ScanError>> + '_ {
        self.roots
            .clone()
            .into_iter()
            .flat_map(move |root| self.walk_root(root))
    }

    /// Walk a single root.
    fn walk_root(&self, root: PathBuf) -> impl Iterator<Item = Result<FileRecord, ScanError>> + '_ {
        let gitignore = self.build_gitignore(&root);

        let walk_dir = WalkDir::new(&root)
            .follow_links(false)
            .skip_hidden(self.config.skip_hidden)
            .process_read_dir(move |_depth, _path, _read_dir_state, children| {
                // Sort children for deterministic output
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        walk_dir.into_iter().filter_map(move |entry_result| {
            if self.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping iteration");
                return None;
            }

            match entry_result {
                Ok(entry) => {
                    let path = entry.path();

                    // Skip the root directory itself
                    if path == root {
                        return None;
                    }

                    let file_type = entry.file_type();

                    // Skip directories (we only want files)
                    if file_type.is_dir() {
                        if self.should_ignore(&root, &path, true, &gitignore) {
                            log::trace!("Ignoring directory: {}", path.display());
                        }
                        return None;
                    }

                    // Symbolic links are never followed into new trees
                    if file_type.is_symlink() {
                        log::trace!("Skipping symlink: {}", path.display());
                        return None;
                    }

                    // Check ignore patterns
                    if self.should_ignore(&root, &path, false, &gitignore) {
                        log::trace!("Ignoring file: {}", path.display());
                        return None;
                    }

                    let metadata = match std::fs::symlink_metadata(&path) {
                        Ok(m) => m,
                        Err(e) => {
                            return Some(Err(handle_io_error(&path, e)));
                        }
                    };

                    // Skip anything that is not a regular file (fifos, sockets)
                    if !metadata.is_file() {
                        return None;
                    }

                    let size = metadata.len();
                    if !self.passes_size_filter(size) {
                        log::trace!(
                            "Skipping file due to size filter ({}): {}",
                            size,
                            path.display()
                        );
                        return None;
                    }

                    let signature = StatSignature::from_metadata(&metadata);
                    Some(Ok(FileRecord::new(path, size, signature)))
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| root.clone(), std::borrow::ToOwned::to_owned);
                    Some(Err(handle_walk_error(path, &e)))
                }
            }
        })
    }
}

/// Classify I/O errors during file access.
fn handle_io_error(path: &Path, error: std::io::Error) -> ScanError {
    use std::io::ErrorKind;

    match error.kind() {
        ErrorKind::PermissionDenied => {
            log::warn!("Permission denied: {}", path.display());
            ScanError::PermissionDenied(path.to_path_buf())
        }
        ErrorKind::NotFound => {
            log::debug!("File not found (may have been deleted): {}", path.display());
            ScanError::NotFound(path.to_path_buf())
        }
        _ => {
            log::warn!("I/O error for {}: {}", path.display(), error);
            ScanError::Io {
                path: path.to_path_buf(),
                source: Arc::new(error),
            }
        }
    }
}

/// Classify jwalk traversal errors.
fn handle_walk_error(path: PathBuf, error: &jwalk::Error) -> ScanError {
    use std::io::ErrorKind;

    log::warn!("Walker error for {}: {}", path.display(), error);
    match error.io_error().map(std::io::Error::kind) {
        Some(ErrorKind::PermissionDenied) => ScanError::PermissionDenied(path),
        Some(ErrorKind::NotFound) => ScanError::NotFound(path),
        _ => ScanError::Io {
            path,
            source: Arc::new(std::io::Error::other(error.to_string())),
        },
    }
}
