//! Parser for `@provides` lines.
//!
//! One line describes one or more files shipped with a package version:
//!
//! ```text
//! [windows main=main,midi_editor] Resources/*.dat
//! [effect] Effects/filter.jsfx
//! lib/helper.lua > Helpers/
//! docs.pdf https://example.com/$version/docs.pdf
//! ```

use crate::error::{IndexError, Result};
use crate::types::{PackageType, Platform, Section};
use regex::Regex;
use std::sync::LazyLock;

/// Splits the part following the option list into pattern, URL and target.
static LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<file>.+?)(?:\s+(?P<url>(?:https?|file)://\S+))?(?:\s*>\s*(?P<target>.+))?$")
        .expect("provides line pattern is a valid literal")
});

/// How a source registers into the host's UI sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MainSpec {
    /// `main`: detect the section from the file's directory
    Auto,
    /// `main=a,b`: explicit section list
    Sections(Vec<Section>),
    /// `nomain`: register nowhere
    Disabled,
}

/// Parsed form of one provides line, before expansion into sources.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Provision {
    /// File path or glob pattern, relative to the package's category
    pub file_pattern: String,
    /// Explicit download URL (may contain placeholders)
    pub url_template: Option<String>,
    /// Rename target; a trailing separator denotes a directory
    pub target: Option<String>,
    /// Platform scope override
    pub platform: Option<Platform>,
    /// Type override
    pub package_type: Option<PackageType>,
    /// Section override
    pub main: Option<MainSpec>,
}

impl Provision {
    /// Parse a single provides line.
    ///
    /// Returns `Ok(None)` for blank lines.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Parse`] for a malformed line and
    /// [`IndexError::UnknownOption`] for an unrecognized option token.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let mut provision = Self::default();

        let rest = if let Some(stripped) = line.strip_prefix('[') {
            let end = stripped
                .find(']')
                .ok_or_else(|| IndexError::Parse(line.to_string()))?;
            provision.apply_options(&stripped[..end])?;
            stripped[end + 1..].trim()
        } else {
            line
        };

        let captures = LINE_REGEX
            .captures(rest)
            .ok_or_else(|| IndexError::Parse(line.to_string()))?;

        let file = captures
            .name("file")
            .map(|m| m.as_str().trim())
            .unwrap_or_default();
        if file.is_empty() || file.contains('>') {
            return Err(IndexError::Parse(line.to_string()));
        }

        provision.file_pattern = file.to_string();
        provision.url_template = captures.name("url").map(|m| m.as_str().to_string());
        provision.target = captures.name("target").map(|m| m.as_str().trim().to_string());

        Ok(Some(provision))
    }

    /// Parse every line of a multi-line provides value.
    ///
    /// # Errors
    ///
    /// Returns the first line error encountered.
    pub fn parse_all(value: &str) -> Result<Vec<Self>> {
        let mut provisions = Vec::new();
        for line in value.lines() {
            if let Some(provision) = Self::parse(line)? {
                provisions.push(provision);
            }
        }
        Ok(provisions)
    }

    /// Classify each option token: platform, then type, then section spec.
    fn apply_options(&mut self, options: &str) -> Result<()> {
        for word in options.split_whitespace() {
            let word = word.to_ascii_lowercase();
            let tokens: Vec<&str> = if word.starts_with("main=") {
                vec![word.as_str()]
            } else {
                word.split(',').filter(|t| !t.is_empty()).collect()
            };

            for token in tokens {
                if let Ok(platform) = token.parse::<Platform>() {
                    self.platform = Some(platform);
                } else if let Ok(package_type) = token.parse::<PackageType>() {
                    self.package_type = Some(package_type);
                } else if let Some(main) = parse_main(token)? {
                    self.main = Some(main);
                } else {
                    return Err(IndexError::UnknownOption(token.to_string()));
                }
            }
        }
        Ok(())
    }

    /// Whether the rename target names a directory.
    #[must_use]
    pub fn targets_directory(&self) -> bool {
        self.target
            .as_deref()
            .is_some_and(|t| t.ends_with('/') || t.ends_with('\\'))
    }

    /// Destination for a matched file, relative to the category.
    ///
    /// `basename` is the matched file's own name, appended when the target
    /// is a directory.
    #[must_use]
    pub fn destination(&self, basename: &str) -> Option<String> {
        let target = self.target.as_deref()?;
        if self.targets_directory() {
            let dir = target.trim_end_matches(['/', '\\']);
            if dir.is_empty() {
                Some(format!("/{basename}"))
            } else {
                Some(format!("{dir}/{basename}"))
            }
        } else {
            Some(target.to_string())
        }
    }
}

fn parse_main(token: &str) -> Result<Option<MainSpec>> {
    match token {
        "main" => Ok(Some(MainSpec::Auto)),
        "nomain" => Ok(Some(MainSpec::Disabled)),
        _ => {
            let Some(list) = token.strip_prefix("main=") else {
                return Ok(None);
            };

            let mut sections = Vec::new();
            for name in list.split(',').filter(|s| !s.is_empty()) {
                let section = name
                    .parse::<Section>()
                    .map_err(|_| IndexError::UnknownOption(token.to_string()))?;
                if !sections.contains(&section) {
                    sections.push(section);
                }
            }

            if sections.is_empty() {
                return Err(IndexError::UnknownOption(token.to_string()));
            }
            Ok(Some(MainSpec::Sections(sections)))
        }
    }
}
