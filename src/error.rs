//! Exit codes and structured error output.

use serde::Serialize;

/// Process exit codes.
///
/// - 0: scan completed and duplicates were found
/// - 1: unexpected failure
/// - 2: scan completed, no duplicates
/// - 3: scan completed but some files were excluded as unreadable
/// - 130: interrupted by Ctrl+C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Scan completed; duplicates were found.
    Success = 0,
    /// Unexpected error.
    GeneralError = 1,
    /// Scan completed; no duplicates.
    NoDuplicates = 2,
    /// Scan completed with non-fatal errors.
    PartialSuccess = 3,
    /// Interrupted by the user.
    Interrupted = 130,
}

impl ExitCode {
    /// The numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// The machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "JO000",
            Self::GeneralError => "JO001",
            Self::NoDuplicates => "JO002",
            Self::PartialSuccess => "JO003",
            Self::Interrupted => "JO130",
        }
    }
}

/// Structured error payload for `--json-errors` output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// Machine-readable code (e.g. "JO001")
    pub code: String,
    /// Numeric exit code
    pub exit_code: i32,
    /// Human-readable message
    pub message: String,
    /// Whether the scan was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Build a structured error from a top-level error and its exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: err.to_string(),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
