use super::changes::Change;
use super::source::Source;
use chrono::{DateTime, Utc};

/// One released version of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    name: String,
    author: Option<String>,
    time: Option<DateTime<Utc>>,
    changelog: Option<String>,
    sources: Vec<Source>,
    pub(crate) change: Change,
}

impl Version {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            author: None,
            time: None,
            changelog: None,
            sources: Vec::new(),
            change: Change::New,
        }
    }

    /// Version name as written in the header.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Author, if any.
    #[must_use]
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    /// Release time.
    #[must_use]
    pub const fn time(&self) -> Option<DateTime<Utc>> {
        self.time
    }

    /// Changelog text.
    #[must_use]
    pub fn changelog(&self) -> Option<&str> {
        self.changelog.as_deref()
    }

    /// Installable files, in declaration order.
    #[must_use]
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Whether this version was created since the last write.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.change == Change::New
    }

    /// Set the author; an identical value is not a modification.
    pub fn set_author(&mut self, author: Option<&str>) {
        let author = author.map(str::trim).filter(|a| !a.is_empty());
        if self.author.as_deref() != author {
            self.author = author.map(str::to_string);
            self.change.touch();
        }
    }

    /// Set the changelog text; an identical value is not a modification.
    pub fn set_changelog(&mut self, changelog: Option<&str>) {
        let changelog = changelog.map(str::trim).filter(|c| !c.is_empty());
        if self.changelog.as_deref() != changelog {
            self.changelog = changelog.map(str::to_string);
            self.change.touch();
        }
    }

    /// Set the release time unless one is already recorded.
    pub fn stamp(&mut self, time: Option<DateTime<Utc>>) {
        if self.time.is_none() && time.is_some() {
            self.time = time;
            self.change.touch();
        }
    }

    /// Replace the source list; an identical list is not a modification.
    pub fn replace_sources(&mut self, sources: Vec<Source>) {
        if self.sources != sources {
            self.sources = sources;
            self.change.touch();
        }
    }

    pub(crate) fn set_loaded(
        &mut self,
        author: Option<String>,
        time: Option<DateTime<Utc>>,
        changelog: Option<String>,
    ) {
        self.author = author;
        self.time = time;
        self.changelog = changelog;
    }

    pub(crate) fn push_loaded_source(&mut self, source: Source) {
        self.sources.push(source);
    }
}

/// Comparable identity of a version name.
///
/// Each dot-separated segment loses its redundant leading zeros and
/// trailing empty segments are dropped, so `1.01` and `1.1` compare
/// equal while letters still compare literally.
#[must_use]
pub fn normalize(name: &str) -> Vec<String> {
    let mut segments: Vec<String> = name.split('.').map(strip_leading_zeros).collect();
    while segments.last().is_some_and(String::is_empty) {
        segments.pop();
    }
    segments
}

fn strip_leading_zeros(segment: &str) -> String {
    let zeros = segment.len() - segment.trim_start_matches('0').len();
    let rest = &segment[zeros..];
    let keep = if rest.starts_with(|c: char| c.is_ascii_digit()) || zeros == 0 {
        0
    } else {
        1
    };
    format!("{}{rest}", "0".repeat(keep))
}

/// Whether two version names denote the same release.
#[must_use]
pub fn same_version(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}
