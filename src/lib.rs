//! justone - duplicate file finder with tiered certainty verification.
//!
//! Scans one or more folders and reports groups of identical files. Files
//! are partitioned by size, then by BLAKE3 content digest, and finally
//! confirmed at a configurable strictness level: trust the digest, accept
//! stat-signature matches, or byte-compare everything.

pub mod cli;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::sync::Arc;

use anyhow::Context;

use cli::Cli;
use duplicates::{DuplicateFinder, DuplicateGroup, FinderConfig, ScanSummary};
use error::ExitCode;
use progress::Progress;
use scanner::WalkerConfig;

/// Run a scan from parsed CLI arguments and report the results.
///
/// Returns the exit code for a completed scan; fatal errors (bad roots,
/// fail-fast I/O errors, interruption) surface as `Err`.
///
/// # Errors
///
/// Fails on nonexistent or non-directory roots, on interruption, and, with
/// `--ignore-errors` off, on the first unreadable file.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    for root in &cli.roots {
        if !root.exists() {
            anyhow::bail!("folder does not exist: {}", root.display());
        }
        if !root.is_dir() {
            anyhow::bail!("not a folder: {}", root.display());
        }
    }

    let handler = signal::install_handler().context("failed to set up signal handling")?;

    let walker_config = WalkerConfig::new(
        cli.skip_hidden,
        cli.min_size,
        cli.max_size,
        cli.ignore_patterns.clone(),
    );

    let mut config = FinderConfig::new()
        .with_strictness(cli.strictness)
        .with_ignore_errors(cli.ignore_errors)
        .with_io_threads(cli.io_threads)
        .with_walker_config(walker_config)
        .with_shutdown_flag(handler.get_flag());

    // Progress bars would corrupt JSON on stdout.
    if !cli.quiet && !cli.json {
        config = config.with_progress_callback(Arc::new(Progress::new(false)));
    }

    log::info!(
        "Scanning {} folder(s) at strictness '{}'",
        cli.roots.len(),
        cli.strictness
    );

    let finder = DuplicateFinder::new(config);
    let (groups, summary) = finder.find_duplicates(&cli.roots)?;

    if cli.json {
        print_json_report(&groups, &summary)?;
    } else if !cli.quiet {
        print_text_report(&groups, &summary);
    }

    if !summary.scan_errors.is_empty() {
        Ok(ExitCode::PartialSuccess)
    } else if groups.is_empty() {
        Ok(ExitCode::NoDuplicates)
    } else {
        Ok(ExitCode::Success)
    }
}

/// Print the plain-text report to stdout.
fn print_text_report(groups: &[DuplicateGroup], summary: &ScanSummary) {
    for group in groups {
        println!("Duplicate found:");
        for file in &group.files {
            println!("  {}", file.path.display());
        }
        println!();
    }

    if groups.is_empty() {
        println!("No duplicates found.");
    } else {
        println!(
            "{} duplicate group(s), {} redundant file(s), {} reclaimable ({:.1}% of scanned data)",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display(),
            summary.wasted_percentage()
        );
    }
    println!(
        "Scanned {} file(s), {} in {:.2?}",
        summary.total_files,
        bytesize::ByteSize(summary.total_size),
        summary.scan_duration
    );

    if !summary.scan_errors.is_empty() {
        println!(
            "Warning: excluding {} unreadable file(s):",
            summary.scan_errors.len()
        );
        for err in &summary.scan_errors {
            println!("  {err}");
        }
    }
}

/// Print the report as JSON on stdout.
fn print_json_report(groups: &[DuplicateGroup], summary: &ScanSummary) -> anyhow::Result<()> {
    let report = serde_json::json!({
        "groups": groups.iter().map(|g| {
            serde_json::json!({
                "digest": g.digest_hex(),
                "size": g.size,
                "files": g.files.iter().map(|f| f.path.display().to_string()).collect::<Vec<_>>(),
                "wasted_space": g.wasted_space(),
            })
        }).collect::<Vec<_>>(),
        "summary": {
            "total_files": summary.total_files,
            "total_size": summary.total_size,
            "eliminated_by_size": summary.eliminated_by_size,
            "eliminated_by_prehash": summary.digest_stats.eliminated_by_prehash,
            "eliminated_by_digest": summary.digest_stats.eliminated_by_digest,
            "comparisons": summary.verify_stats.comparisons,
            "shallow_matches": summary.verify_stats.shallow_matches,
            "duplicate_groups": summary.duplicate_groups,
            "duplicate_files": summary.duplicate_files,
            "reclaimable_space": summary.reclaimable_space,
            "scan_duration_ms": summary.scan_duration.as_millis() as u64,
            "excluded_files": summary.scan_errors.len(),
        },
        "errors": summary.scan_errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
    });

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
