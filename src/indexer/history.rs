use anyhow::Result;
use chrono::{DateTime, Utc};

/// How a file changed in a revision, relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    /// File created
    Added,
    /// File content changed
    Modified,
    /// File removed
    Deleted,
}

/// One entry of a revision's diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// How the file changed
    pub status: ChangeStatus,
    /// Repository-relative path
    pub path: String,
}

impl FileChange {
    /// Build a change entry.
    #[must_use]
    pub fn new(status: ChangeStatus, path: impl Into<String>) -> Self {
        Self {
            status,
            path: path.into(),
        }
    }
}

/// A snapshot of the repository at one point of its history.
pub trait Revision {
    /// Revision identifier, stored as the index watermark.
    fn id(&self) -> &str;

    /// Commit time, given to versions first seen in this revision.
    fn time(&self) -> DateTime<Utc>;

    /// Whether this revision has no parent.
    fn is_root(&self) -> bool;

    /// Files changed since the parent revision.
    ///
    /// # Errors
    ///
    /// Returns an error if the diff cannot be computed.
    fn changes(&self) -> Result<Vec<FileChange>>;

    /// Every file present in this revision.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be listed.
    fn files(&self) -> Result<Vec<String>>;

    /// Content of a file in this revision.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist in this revision.
    fn read(&self, path: &str) -> Result<Vec<u8>>;
}

/// Ordered, restartable source of revisions.
pub trait History {
    /// Revision type yielded by this history.
    type Revision: Revision;

    /// Every revision, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be enumerated.
    fn revisions(&self) -> Result<Vec<Self::Revision>>;

    /// Revisions strictly after `id`, oldest first.
    ///
    /// Returns `None` when `id` is not part of this history.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be enumerated.
    fn revisions_since(&self, id: &str) -> Result<Option<Vec<Self::Revision>>>;
}

/// Files of a working directory, for checks outside of history.
pub trait Tree {
    /// Every file, repository-relative with `/` separators.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be listed.
    fn files(&self) -> Result<Vec<String>>;

    /// Content of a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    fn read(&self, path: &str) -> Result<Vec<u8>>;
}
