//! Progress reporting utilities using indicatif.
//!
//! The pipeline reports through the [`ProgressCallback`] trait; the
//! [`Progress`] struct is the terminal implementation, one bar per phase
//! under a shared [`MultiProgress`].

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Progress callback for the detection pipeline phases.
///
/// Phases arrive in order: `scan`, `prehash`, `digest`, `verify`.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// `total` is the number of items the phase will process, or 0 when the
    /// count is not known up front (the scan phase).
    fn on_phase_start(&self, phase: &str, total: u64);

    /// Called with a running count during unbounded phases.
    fn on_progress(&self, current: u64, total: u64);

    /// Called when one item of a bounded phase completes.
    ///
    /// `bytes` is the item's size, for throughput tracking.
    fn on_item_completed(&self, _bytes: u64) {}

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);

    /// Called to update the status message.
    fn on_message(&self, _message: &str) {}
}

/// Terminal progress reporter.
///
/// Manages one progress bar per pipeline phase. With `quiet` set, every
/// callback is a no-op.
pub struct Progress {
    multi: MultiProgress,
    scan: Mutex<Option<ProgressBar>>,
    prehash: Mutex<Option<ProgressBar>>,
    digest: Mutex<Option<ProgressBar>>,
    verify: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Examples
    ///
    /// ```
    /// use justone::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            scan: Mutex::new(None),
            prehash: Mutex::new(None),
            digest: Mutex::new(None),
            verify: Mutex::new(None),
            quiet,
        }
    }

    /// Spinner style for the scan phase.
    fn scan_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    /// Bar style for the hashing phases.
    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    /// Bar style for the verification phase (throughput shown).
    fn verify_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.green/blue}] {pos}/{len} ({percent}%) {msg} {per_sec} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn slot(&self, phase: &str) -> Option<&Mutex<Option<ProgressBar>>> {
        match phase {
            "scan" => Some(&self.scan),
            "prehash" => Some(&self.prehash),
            "digest" => Some(&self.digest),
            "verify" => Some(&self.verify),
            _ => None,
        }
    }

    /// The bar for the phase furthest along, if any.
    fn active_bar(&self) -> Option<ProgressBar> {
        for slot in [&self.verify, &self.digest, &self.prehash, &self.scan] {
            if let Some(pb) = slot.lock().unwrap().as_ref() {
                return Some(pb.clone());
            }
        }
        None
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: u64) {
        if self.quiet {
            return;
        }

        let (pb, message) = match phase {
            "scan" => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::scan_style());
                pb.enable_steady_tick(Duration::from_millis(100));
                (pb, "Scanning")
            }
            "prehash" => {
                let pb = self.multi.add(ProgressBar::new(total));
                pb.set_style(Self::bar_style());
                (pb, "Prehashing")
            }
            "digest" => {
                let pb = self.multi.add(ProgressBar::new(total));
                pb.set_style(Self::bar_style());
                (pb, "Hashing")
            }
            "verify" => {
                let pb = self.multi.add(ProgressBar::new(total));
                pb.set_style(Self::verify_style());
                (pb, "Verifying")
            }
            _ => return,
        };
        pb.set_message(message);

        if let Some(slot) = self.slot(phase) {
            *slot.lock().unwrap() = Some(pb);
        }
    }

    fn on_progress(&self, current: u64, _total: u64) {
        if self.quiet {
            return;
        }
        if let Some(pb) = self.active_bar() {
            pb.set_position(current);
        }
    }

    fn on_item_completed(&self, _bytes: u64) {
        if self.quiet {
            return;
        }
        if let Some(pb) = self.active_bar() {
            pb.inc(1);
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        let message = match phase {
            "scan" => "Scan complete",
            "prehash" => "Prehash complete",
            "digest" => "Hashing complete",
            "verify" => "Verification complete",
            _ => return,
        };
        if let Some(slot) = self.slot(phase) {
            if let Some(pb) = slot.lock().unwrap().take() {
                pb.finish_with_message(message);
            }
        }
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }
        if let Some(pb) = self.active_bar() {
            pb.set_message(message.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_progress_is_noop() {
        let progress = Progress::new(true);
        progress.on_phase_start("prehash", 10);
        progress.on_item_completed(100);
        progress.on_phase_end("prehash");
        assert!(progress.prehash.lock().unwrap().is_none());
    }

    #[test]
    fn test_phase_lifecycle() {
        let progress = Progress::new(false);

        progress.on_phase_start("digest", 5);
        assert!(progress.digest.lock().unwrap().is_some());

        progress.on_item_completed(1024);
        progress.on_phase_end("digest");
        assert!(progress.digest.lock().unwrap().is_none());
    }

    #[test]
    fn test_unknown_phase_ignored() {
        let progress = Progress::new(false);
        progress.on_phase_start("nonsense", 3);
        progress.on_phase_end("nonsense");
        assert!(progress.active_bar().is_none());
    }

    #[test]
    fn test_active_bar_prefers_later_phase() {
        let progress = Progress::new(false);
        progress.on_phase_start("scan", 0);
        progress.on_phase_start("verify", 2);

        progress.on_item_completed(0);
        let verify = progress.verify.lock().unwrap();
        assert_eq!(verify.as_ref().unwrap().position(), 1);
    }
}
