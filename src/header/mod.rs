//! Metadata header extraction.
//!
//! Package files carry their metadata as `@tag value` lines inside their
//! leading comment block:
//!
//! ```text
//! -- @description Quantize selected items
//! -- @version 1.2
//! -- @changelog
//! --   Fixed rounding of negative offsets
//! --   Added swing option
//! -- @provides [main] Helpers/*.lua
//! ```
//!
//! [`Header::parse`] only extracts the raw tags; [`rules`] aliases and
//! validates them.

pub mod rules;

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<prefix>[^\w@]*?)@(?P<tag>\w+):?(?:\s+(?P<value>.*?))?\s*$")
        .expect("header tag pattern is a valid literal")
});

/// Raw value of one header tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValue {
    /// Tag present without any value
    Flag,
    /// Tag text, possibly spanning several lines
    Text(String),
}

/// Tags extracted from a file's leading comment block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    tags: BTreeMap<String, TagValue>,
}

/// A tag whose continuation lines are still being collected.
struct PendingTag {
    name: String,
    marker: String,
    indent: usize,
    inline: Option<String>,
    lines: Vec<String>,
}

impl PendingTag {
    /// Returns the continuation text when `line` extends this tag.
    fn continuation<'a>(&self, line: &'a str) -> Option<&'a str> {
        let rest = line.strip_prefix(self.marker.as_str())?;
        if rest.trim().is_empty() {
            return Some("");
        }
        (leading_whitespace(rest) > self.indent).then_some(rest)
    }

    fn finish(mut self) -> (String, TagValue) {
        while self.lines.last().is_some_and(String::is_empty) {
            self.lines.pop();
        }

        let common = self
            .lines
            .iter()
            .filter(|l| !l.is_empty())
            .map(|l| leading_whitespace(l))
            .min()
            .unwrap_or(0);

        let mut text: Vec<String> = self.inline.into_iter().collect();
        text.extend(
            self.lines
                .iter()
                .map(|l| l.get(common..).unwrap_or_default().trim_end().to_string()),
        );

        let value = if text.is_empty() {
            TagValue::Flag
        } else {
            TagValue::Text(text.join("\n"))
        };
        (self.name, value)
    }
}

fn leading_whitespace(s: &str) -> usize {
    s.len() - s.trim_start().len()
}

fn is_comment_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || ["--", "//", "#", ";", "*", "/*", "]]"]
            .iter()
            .any(|marker| trimmed.starts_with(marker))
}

impl Header {
    /// Extract tags from file content.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    #[must_use]
    pub fn parse(content: &[u8]) -> Self {
        let text = String::from_utf8_lossy(content);
        let mut header = Self::default();
        let mut pending: Option<PendingTag> = None;
        let mut seen_tag = false;

        for line in text.lines() {
            let line = line.trim_end();

            if let Some(caps) = TAG_REGEX.captures(line) {
                if let Some(tag) = pending.take() {
                    header.insert_first(tag);
                }

                let prefix = caps.name("prefix").map_or("", |m| m.as_str());
                let marker = prefix.trim_end();
                pending = Some(PendingTag {
                    name: caps["tag"].to_lowercase(),
                    marker: marker.to_string(),
                    indent: prefix.len() - marker.len(),
                    inline: caps
                        .name("value")
                        .map(|m| m.as_str().trim().to_string())
                        .filter(|v| !v.is_empty()),
                    lines: Vec::new(),
                });
                seen_tag = true;
                continue;
            }

            if let Some(tag) = pending.as_mut() {
                if let Some(rest) = tag.continuation(line) {
                    tag.lines.push(rest.to_string());
                    continue;
                }
            }

            if let Some(tag) = pending.take() {
                header.insert_first(tag);
            }

            if seen_tag && !is_comment_line(line) {
                break;
            }
        }

        if let Some(tag) = pending.take() {
            header.insert_first(tag);
        }

        header
    }

    fn insert_first(&mut self, tag: PendingTag) {
        let (name, value) = tag.finish();
        self.tags.entry(name).or_insert(value);
    }

    /// Raw value of a tag.
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&TagValue> {
        self.tags.get(tag)
    }

    /// Text value of a tag, `None` for absent tags and flags.
    #[must_use]
    pub fn text(&self, tag: &str) -> Option<&str> {
        match self.tags.get(tag)? {
            TagValue::Text(text) => Some(text),
            TagValue::Flag => None,
        }
    }

    /// Whether a tag is present at all.
    #[must_use]
    pub fn has(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }

    /// Set a tag unless it is already present.
    pub fn insert(&mut self, tag: &str, value: TagValue) {
        self.tags.entry(tag.to_string()).or_insert(value);
    }

    /// Remove a tag, returning its value.
    pub fn remove(&mut self, tag: &str) -> Option<TagValue> {
        self.tags.remove(tag)
    }

    /// Iterate over tags in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagValue)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether no tag was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
