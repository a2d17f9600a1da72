//! Command-line interface definition.

use std::path::PathBuf;
use std::str::FromStr;

use bytesize::ByteSize;
use clap::Parser;

use crate::duplicates::StrictnessMode;

/// Duplicate file finder with tiered certainty verification.
///
/// Scans one or more folders, partitions files by size and BLAKE3 content
/// digest, then confirms duplicates at the requested strictness level.
#[derive(Parser, Debug)]
#[command(name = "justone", version, about, long_about = None)]
pub struct Cli {
    /// Folders to scan for duplicates
    #[arg(required = true, value_name = "FOLDER")]
    pub roots: Vec<PathBuf>,

    /// Certainty level: 0/hash, 1/shallow, 2/exhaustive
    #[arg(short, long, value_parser = parse_strictness, default_value = "0")]
    pub strictness: StrictnessMode,

    /// Exclude unreadable files from the scan instead of failing
    #[arg(long)]
    pub ignore_errors: bool,

    /// Threads for hashing and byte comparison
    #[arg(long, default_value_t = 4, value_name = "N")]
    pub io_threads: usize,

    /// Skip files smaller than this size (e.g. "1KB", "10MiB")
    #[arg(long, value_parser = parse_size, value_name = "SIZE")]
    pub min_size: Option<u64>,

    /// Skip files larger than this size
    #[arg(long, value_parser = parse_size, value_name = "SIZE")]
    pub max_size: Option<u64>,

    /// Gitignore-style patterns to exclude (repeatable)
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Skip hidden files and directories
    #[arg(long)]
    pub skip_hidden: bool,

    /// Emit results as JSON
    #[arg(long)]
    pub json: bool,

    /// Emit top-level errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Parse a strictness argument, numeric or named.
fn parse_strictness(s: &str) -> Result<StrictnessMode, String> {
    match s.to_ascii_lowercase().as_str() {
        "0" | "hash" => Ok(StrictnessMode::Hash),
        "1" | "shallow" => Ok(StrictnessMode::Shallow),
        "2" | "exhaustive" => Ok(StrictnessMode::Exhaustive),
        other => Err(format!(
            "invalid strictness '{other}' (expected 0/hash, 1/shallow, or 2/exhaustive)"
        )),
    }
}

/// Parse a human-readable size ("4KB", "10MiB", "1048576").
fn parse_size(s: &str) -> Result<u64, String> {
    ByteSize::from_str(s)
        .map(|b| b.as_u64())
        .map_err(|e| format!("invalid size '{s}': {e}"))
}
