//! Inline revision counter for history replay.

use colored::Colorize;
use std::io::{self, IsTerminal, Write};

/// A counter that redraws in place on TTY terminals and stays silent otherwise.
///
/// Renders as "Indexing commits: 50% (3/6) 1a2b3c4".
pub struct Progress {
    /// Title displayed before the counter
    title: String,
    /// Total number of revisions
    total: usize,
    /// Revisions processed so far
    current: usize,
    /// Label of the revision being processed
    label: String,
    /// Whether stderr is a TTY
    is_tty: bool,
}

impl Progress {
    /// Creates a counter for `total` items.
    #[must_use]
    pub fn new(title: &str, total: usize) -> Self {
        Self {
            title: title.to_string(),
            total,
            current: 0,
            label: String::new(),
            is_tty: io::stderr().is_terminal(),
        }
    }

    /// Advances by one item, labelled with `label`.
    pub fn tick(&mut self, label: &str) {
        self.current = (self.current + 1).min(self.total);
        self.label = label.to_string();
        if self.is_tty {
            self.display();
        }
    }

    /// Completion percentage, 0 when there is nothing to do.
    #[must_use]
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            0
        } else {
            self.current * 100 / self.total
        }
    }

    /// Prints the final "done" line.
    pub fn finish(self) {
        if self.is_tty && self.current > 0 {
            eprintln!(
                "\r{}: 100% ({}/{}), done.\x1b[K",
                self.title.dimmed(),
                self.total,
                self.total
            );
        }
    }

    fn display(&self) {
        eprint!(
            "\r{}: {}% ({}/{}) {}\x1b[K",
            self.title.dimmed(),
            self.percent(),
            self.current,
            self.total,
            self.label.dimmed()
        );
        let _ = io::stderr().flush();
    }
}
