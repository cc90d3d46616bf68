//! Repository access through the `git` executable.
//!
//! [`GitHistory`] feeds the indexer from a repository's first-parent
//! history; [`WorkingTree`] exposes a plain directory for checks.

use crate::indexer::{ChangeStatus, FileChange, History, Revision, Tree};
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::trace;
use walkdir::WalkDir;

const LOG_FORMAT: &str = "--format=%H%x09%P%x09%cI";

fn git(repo: &Path, args: &[&str]) -> Result<Vec<u8>> {
    trace!(?args, "git");
    let output = Command::new("git")
        .args(args)
        .current_dir(repo)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("Failed to run git {}", args.join(" ")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git {} failed: {}", args.join(" "), stderr.trim());
    }
    Ok(output.stdout)
}

fn git_succeeds(repo: &Path, args: &[&str]) -> Result<bool> {
    let status = Command::new("git")
        .args(args)
        .current_dir(repo)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .with_context(|| format!("Failed to run git {}", args.join(" ")))?;
    Ok(status.success())
}

fn split_nul(output: &[u8]) -> impl Iterator<Item = String> + '_ {
    output
        .split(|&b| b == 0)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
}

/// First-parent history of a git repository.
#[derive(Debug, Clone)]
pub struct GitHistory {
    repo: PathBuf,
}

impl GitHistory {
    /// Open the repository containing `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not inside a git work tree.
    pub fn open(path: &Path) -> Result<Self> {
        let top = git(path, &["rev-parse", "--show-toplevel"])
            .with_context(|| format!("{} is not a git repository", path.display()))?;
        let top = String::from_utf8_lossy(&top).trim().to_string();
        Ok(Self {
            repo: PathBuf::from(top),
        })
    }

    /// Root of the work tree.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.repo
    }

    fn has_head(&self) -> Result<bool> {
        git_succeeds(&self.repo, &["rev-parse", "--verify", "--quiet", "HEAD"])
    }

    fn log(&self, range: &str) -> Result<Vec<GitRevision>> {
        let output = git(
            &self.repo,
            &["log", "--first-parent", "--reverse", LOG_FORMAT, range],
        )?;

        String::from_utf8_lossy(&output)
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| self.parse_log_line(line))
            .collect()
    }

    fn parse_log_line(&self, line: &str) -> Result<GitRevision> {
        let mut fields = line.split('\t');
        let (Some(id), Some(parents), Some(time)) = (fields.next(), fields.next(), fields.next())
        else {
            bail!("Unexpected git log output: {line}");
        };

        let time = DateTime::parse_from_rfc3339(time)
            .with_context(|| format!("Invalid commit time for {id}: {time}"))?
            .with_timezone(&Utc);

        Ok(GitRevision {
            repo: self.repo.clone(),
            id: id.to_string(),
            parent: parents.split_whitespace().next().map(str::to_string),
            time,
        })
    }
}

impl History for GitHistory {
    type Revision = GitRevision;

    fn revisions(&self) -> Result<Vec<GitRevision>> {
        if !self.has_head()? {
            return Ok(Vec::new());
        }
        self.log("HEAD")
    }

    fn revisions_since(&self, id: &str) -> Result<Option<Vec<GitRevision>>> {
        if !self.has_head()? {
            return Ok(None);
        }
        if !git_succeeds(&self.repo, &["merge-base", "--is-ancestor", id, "HEAD"])? {
            return Ok(None);
        }
        self.log(&format!("{id}..HEAD")).map(Some)
    }
}

/// One commit of a [`GitHistory`].
#[derive(Debug, Clone)]
pub struct GitRevision {
    repo: PathBuf,
    id: String,
    parent: Option<String>,
    time: DateTime<Utc>,
}

impl Revision for GitRevision {
    fn id(&self) -> &str {
        &self.id
    }

    fn time(&self) -> DateTime<Utc> {
        self.time
    }

    fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    fn changes(&self) -> Result<Vec<FileChange>> {
        let Some(parent) = &self.parent else {
            return Ok(self
                .files()?
                .into_iter()
                .map(|path| FileChange::new(ChangeStatus::Added, path))
                .collect());
        };

        let output = git(
            &self.repo,
            &[
                "diff-tree",
                "-r",
                "-z",
                "--no-commit-id",
                "--name-status",
                "--no-renames",
                parent.as_str(),
                self.id.as_str(),
            ],
        )?;

        let mut changes = Vec::new();
        let mut fields = split_nul(&output);
        while let (Some(status), Some(path)) = (fields.next(), fields.next()) {
            let status = match status.chars().next() {
                Some('A') => ChangeStatus::Added,
                Some('D') => ChangeStatus::Deleted,
                _ => ChangeStatus::Modified,
            };
            changes.push(FileChange::new(status, path));
        }
        Ok(changes)
    }

    fn files(&self) -> Result<Vec<String>> {
        let output = git(&self.repo, &["ls-tree", "-r", "-z", "--name-only", self.id.as_str()])?;
        Ok(split_nul(&output).collect())
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let object = format!("{}:{path}", self.id);
        git(&self.repo, &["show", object.as_str()])
            .with_context(|| format!("Failed to read {path} at {}", self.id))
    }
}

/// Files of a directory on disk, ignoring `.git`.
#[derive(Debug, Clone)]
pub struct WorkingTree {
    root: PathBuf,
}

impl WorkingTree {
    /// Expose the directory at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Tree for WorkingTree {
    fn files(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|entry| entry.file_name() != ".git");

        for entry in walker {
            let entry = entry.context("Failed to walk working tree")?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .context("Walked outside of the working tree")?;
            let components: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            files.push(components.join("/"));
        }

        files.sort();
        Ok(files)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        fs::read(self.root.join(path)).with_context(|| format!("Failed to read {path}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_working_tree_lists_relative_paths() -> Result<()> {
        let dir = TempDir::new()?;
        fs::create_dir_all(dir.path().join("Category/Sub"))?;
        fs::create_dir_all(dir.path().join(".git"))?;
        fs::write(dir.path().join("Category/a.lua"), "-- @version 1.0")?;
        fs::write(dir.path().join("Category/Sub/b.png"), "png")?;
        fs::write(dir.path().join(".git/HEAD"), "ref")?;

        let tree = WorkingTree::new(dir.path());
        assert_eq!(tree.files()?, vec!["Category/Sub/b.png", "Category/a.lua"]);
        assert_eq!(tree.read("Category/a.lua")?, b"-- @version 1.0");
        assert!(tree.read("missing.lua").is_err());
        Ok(())
    }

    #[test]
    fn test_parse_log_line() -> Result<()> {
        let history = GitHistory {
            repo: PathBuf::from("."),
        };
        let revision = history.parse_log_line("abc\t\t2016-02-12T01:16:40+00:00")?;
        assert!(revision.is_root());
        assert_eq!(revision.id(), "abc");

        let revision = history.parse_log_line("def\tabc 123\t2016-02-12T02:16:40+01:00")?;
        assert!(!revision.is_root());
        assert_eq!(revision.parent.as_deref(), Some("abc"));
        assert_eq!(revision.time(), history.parse_log_line("x\t\t2016-02-12T01:16:40Z")?.time());

        assert!(history.parse_log_line("garbage").is_err());
        Ok(())
    }
}
