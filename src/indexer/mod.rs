//! Replays repository history into an [`Index`].
//!
//! Revisions are processed oldest first. Each file change is routed to
//! [`Index::scan`] or [`Index::remove`]; a file that fails to scan becomes a
//! warning and keeps its previous state, so one broken header never stops
//! the rest of the repository from being indexed.

mod history;

pub use history::{ChangeStatus, FileChange, History, Revision, Tree};

use crate::index::Index;
use crate::types::PackageType;
use anyhow::{Context, Result};
use tracing::{Level, debug, info, span, trace, warn};

/// Template used by checks when the index has none configured.
pub const CHECK_URL_TEMPLATE: &str = "https://localhost/$path";

/// A file that failed to scan during replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanWarning {
    /// Revision the file was scanned at
    pub revision: String,
    /// Repository-relative path
    pub path: String,
    /// Error message
    pub message: String,
}

/// Outcome of replaying a batch of revisions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Number of revisions processed
    pub revisions: usize,
    /// Files that failed to scan
    pub warnings: Vec<ScanWarning>,
}

/// A file rejected by [`Indexer::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFailure {
    /// Repository-relative path
    pub path: String,
    /// Error message
    pub message: String,
}

/// Revisions left to index after the stored watermark.
#[derive(Debug)]
pub enum Pending<R> {
    /// Revisions to replay, oldest first
    Revisions(Vec<R>),
    /// The watermark is not part of the history
    UnknownWatermark(String),
}

/// Result of [`Indexer::resume`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// New revisions were replayed
    Scanned(ScanReport),
    /// The watermark is not part of the history; nothing was done
    UnknownWatermark(String),
}

/// Drives an index through history.
pub struct Indexer<'a> {
    index: &'a mut Index,
}

impl<'a> Indexer<'a> {
    /// Wrap the index to update.
    pub fn new(index: &'a mut Index) -> Self {
        Self { index }
    }

    /// The index being updated.
    #[must_use]
    pub fn index(&self) -> &Index {
        self.index
    }

    /// Apply every file change of one revision and advance the watermark.
    ///
    /// # Errors
    ///
    /// Returns an error if the revision's tree or diff cannot be read.
    /// Per-file scan failures are returned as warnings instead.
    pub fn process<R: Revision>(&mut self, revision: &R) -> Result<Vec<ScanWarning>> {
        let span = span!(Level::DEBUG, "revision", id = revision.id());
        let _enter = span.enter();

        let files = revision
            .files()
            .with_context(|| format!("Failed to list files of {}", revision.id()))?;

        let changes = if revision.is_root() {
            files
                .iter()
                .map(|path| FileChange::new(ChangeStatus::Added, path.as_str()))
                .collect()
        } else {
            revision
                .changes()
                .with_context(|| format!("Failed to diff {}", revision.id()))?
        };

        self.index.set_files(files);
        self.index.set_time(Some(revision.time()));
        self.index.set_commit(Some(revision.id()));

        let mut warnings = Vec::new();
        for change in changes {
            if PackageType::from_path(&change.path).is_none() {
                trace!(path = %change.path, "skipping non-package file");
                continue;
            }

            let outcome = match change.status {
                ChangeStatus::Deleted => {
                    self.index.remove(&change.path);
                    Ok(())
                }
                ChangeStatus::Added | ChangeStatus::Modified => revision
                    .read(&change.path)
                    .and_then(|content| Ok(self.index.scan(&change.path, &content)?)),
            };

            if let Err(e) = outcome {
                warn!(revision = revision.id(), path = %change.path, error = %e, "file skipped");
                warnings.push(ScanWarning {
                    revision: revision.id().to_string(),
                    path: change.path,
                    message: e.to_string(),
                });
            }
        }

        debug!(warnings = warnings.len(), "revision indexed");
        Ok(warnings)
    }

    /// Process revisions in order.
    ///
    /// # Errors
    ///
    /// Returns the first revision-level error; earlier revisions stay applied.
    pub fn replay<R: Revision>(&mut self, revisions: impl IntoIterator<Item = R>) -> Result<ScanReport> {
        let mut report = ScanReport::default();
        for revision in revisions {
            report.warnings.extend(self.process(&revision)?);
            report.revisions += 1;
        }
        info!(
            revisions = report.revisions,
            warnings = report.warnings.len(),
            "replay finished"
        );
        Ok(report)
    }

    /// Replay the whole history from its root.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be enumerated or replayed.
    pub fn rebuild<H: History>(&mut self, history: &H) -> Result<ScanReport> {
        let revisions = history.revisions().context("Failed to list revisions")?;
        self.replay(revisions)
    }

    /// Revisions after the stored watermark, or all of them without one.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be enumerated.
    pub fn pending<H: History>(&self, history: &H) -> Result<Pending<H::Revision>> {
        let Some(watermark) = self.index.commit() else {
            return Ok(Pending::Revisions(
                history.revisions().context("Failed to list revisions")?,
            ));
        };

        match history
            .revisions_since(watermark)
            .with_context(|| format!("Failed to list revisions since {watermark}"))?
        {
            Some(revisions) => Ok(Pending::Revisions(revisions)),
            None => Ok(Pending::UnknownWatermark(watermark.to_string())),
        }
    }

    /// Replay the revisions after the stored watermark.
    ///
    /// An unknown watermark is reported, not acted upon.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be enumerated or replayed.
    pub fn resume<H: History>(&mut self, history: &H) -> Result<ResumeOutcome> {
        match self.pending(history)? {
            Pending::Revisions(revisions) => Ok(ResumeOutcome::Scanned(self.replay(revisions)?)),
            Pending::UnknownWatermark(id) => {
                warn!(watermark = %id, "watermark not found in history");
                Ok(ResumeOutcome::UnknownWatermark(id))
            }
        }
    }

    /// Validate every package file of a working tree.
    ///
    /// Runs against a copy of `index` with amend enabled, so published
    /// sources are checked for conflicts but `index` itself is untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be listed. Unreadable or invalid
    /// files are reported as failures.
    pub fn check<T: Tree>(index: &Index, tree: &T) -> Result<Vec<CheckFailure>> {
        let mut scratch = index.clone();
        scratch.set_amend(true);
        if scratch.url_template().is_none() {
            scratch.set_url_template(Some(CHECK_URL_TEMPLATE))?;
        }

        let mut files = tree.files().context("Failed to list working tree")?;
        files.sort();
        scratch.set_files(files.iter().cloned());

        let mut failures = Vec::new();
        for path in files.iter().filter(|p| PackageType::from_path(p).is_some()) {
            let outcome = tree
                .read(path)
                .and_then(|content| Ok(scratch.scan(path, &content)?));

            if let Err(e) = outcome {
                debug!(path = %path, error = %e, "check failed");
                failures.push(CheckFailure {
                    path: path.clone(),
                    message: e.to_string(),
                });
            }
        }
        Ok(failures)
    }
}
