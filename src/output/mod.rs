//! Terminal output for the reapack-index CLI.
//!
//! Messages go to stderr so stdout stays clean for listings. Verbosity is
//! global: quiet hides informational lines, verbose adds detail.

mod progress;

use crate::indexer::{CheckFailure, ScanWarning};
use colored::Colorize;
use std::sync::atomic::{AtomicU8, Ordering};

pub use progress::Progress;

/// Verbosity level for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Only warnings and errors.
    Quiet = 0,
    /// Standard messages.
    Normal = 1,
    /// Standard messages plus detail.
    Verbose = 2,
}

static VERBOSITY: AtomicU8 = AtomicU8::new(1);

/// Sets the global verbosity level.
pub fn set_verbosity(level: Verbosity) {
    VERBOSITY.store(level as u8, Ordering::Relaxed);
}

/// Gets the current global verbosity level.
pub fn get_verbosity() -> Verbosity {
    match VERBOSITY.load(Ordering::Relaxed) {
        0 => Verbosity::Quiet,
        2 => Verbosity::Verbose,
        _ => Verbosity::Normal,
    }
}

/// Prints a success message in green (respects quiet mode).
pub fn success(message: &str) {
    if get_verbosity() == Verbosity::Quiet {
        return;
    }
    eprintln!("{}", message.green());
}

/// Prints a warning message in bold yellow (always shown).
pub fn warning(message: &str) {
    eprintln!("{}", message.yellow().bold());
}

/// Prints an informational message in dimmed color (respects quiet mode).
pub fn info(message: &str) {
    if get_verbosity() == Verbosity::Quiet {
        return;
    }
    eprintln!("{}", message.dimmed());
}

/// Prints a message only in verbose mode.
pub fn verbose(message: &str) {
    if get_verbosity() != Verbosity::Verbose {
        return;
    }
    eprintln!("{}", message.dimmed());
}

/// Abbreviated revision id for display.
#[must_use]
pub fn short_id(id: &str) -> &str {
    id.get(..7).unwrap_or(id)
}

/// One line per skipped file, `<commit>: <path>: <message>`.
#[must_use]
pub fn format_warning(warning: &ScanWarning) -> String {
    format!(
        "{}: {}: {}",
        short_id(&warning.revision),
        warning.path,
        warning.message.replace('\n', "\n    ")
    )
}

/// Prints the files skipped during a scan (always shown).
pub fn scan_warnings(warnings: &[ScanWarning]) {
    if warnings.is_empty() {
        return;
    }
    warning(&format!(
        "{} file{} skipped:",
        warnings.len(),
        if warnings.len() == 1 { "" } else { "s" }
    ));
    for item in warnings {
        eprintln!("  {}", format_warning(item));
    }
}

/// Prints the files rejected by a check (always shown).
pub fn check_failures(failures: &[CheckFailure]) {
    for failure in failures {
        eprintln!(
            "{} {}",
            format!("{}:", failure.path).red().bold(),
            failure.message.replace('\n', "\n  ")
        );
    }
}

/// Starts a counter for replayed revisions.
#[must_use]
pub fn start_progress(title: &str, total: usize) -> Progress {
    Progress::new(title, total)
}
