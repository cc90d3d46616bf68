#![allow(dead_code)]

use anyhow::{Result, anyhow};
use chrono::{DateTime, Duration, TimeZone, Utc};
use reapack_index::indexer::{ChangeStatus, FileChange, History, Revision, Tree};
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

pub const URL_TEMPLATE: &str = "https://example.com/$commit/$path";

/// One commit of a [`MemoryHistory`]
#[derive(Debug, Clone)]
pub struct MemoryRevision {
    pub id: String,
    pub time: DateTime<Utc>,
    pub root: bool,
    pub changes: Vec<FileChange>,
    pub tree: BTreeMap<String, Vec<u8>>,
}

impl Revision for MemoryRevision {
    fn id(&self) -> &str {
        &self.id
    }

    fn time(&self) -> DateTime<Utc> {
        self.time
    }

    fn is_root(&self) -> bool {
        self.root
    }

    fn changes(&self) -> Result<Vec<FileChange>> {
        Ok(self.changes.clone())
    }

    fn files(&self) -> Result<Vec<String>> {
        Ok(self.tree.keys().cloned().collect())
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.tree
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("{path} not found in {}", self.id))
    }
}

/// Linear in-memory history built commit by commit
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    pub revisions: Vec<MemoryRevision>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a commit writing `writes` and deleting `deletes`; returns its id
    pub fn commit(&mut self, writes: &[(&str, &str)], deletes: &[&str]) -> String {
        let mut tree = self
            .revisions
            .last()
            .map(|r| r.tree.clone())
            .unwrap_or_default();

        let mut changes = Vec::new();
        for (path, content) in writes {
            let status = if tree.contains_key(*path) {
                ChangeStatus::Modified
            } else {
                ChangeStatus::Added
            };
            tree.insert((*path).to_string(), content.as_bytes().to_vec());
            changes.push(FileChange::new(status, *path));
        }
        for path in deletes {
            tree.remove(*path);
            changes.push(FileChange::new(ChangeStatus::Deleted, *path));
        }

        let n = self.revisions.len();
        let id = format!("{:040x}", n + 1);
        self.revisions.push(MemoryRevision {
            id: id.clone(),
            time: base_time() + Duration::hours(n as i64),
            root: n == 0,
            changes,
            tree,
        });
        id
    }
}

impl History for MemoryHistory {
    type Revision = MemoryRevision;

    fn revisions(&self) -> Result<Vec<MemoryRevision>> {
        Ok(self.revisions.clone())
    }

    fn revisions_since(&self, id: &str) -> Result<Option<Vec<MemoryRevision>>> {
        Ok(self
            .revisions
            .iter()
            .position(|r| r.id == id)
            .map(|position| self.revisions[position + 1..].to_vec()))
    }
}

/// Working tree held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryTree {
    pub files: BTreeMap<String, Vec<u8>>,
}

impl MemoryTree {
    pub fn with(files: &[(&str, &str)]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(path, content)| ((*path).to_string(), content.as_bytes().to_vec()))
                .collect(),
        }
    }
}

impl Tree for MemoryTree {
    fn files(&self) -> Result<Vec<String>> {
        Ok(self.files.keys().cloned().collect())
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("{path} not found"))
    }
}

/// Time of the first commit of every [`MemoryHistory`]
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2016, 2, 12, 1, 16, 40)
        .single()
        .unwrap_or_default()
}

/// Whether a usable `git` executable is on the PATH
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

/// Run git in `dir` with a fixed identity, failing on non-zero exit
pub fn git(dir: &Path, args: &[&str]) -> Result<()> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "Test")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "Test")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .output()?;
    if !output.status.success() {
        return Err(anyhow!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr)
        ));
    }
    Ok(())
}
