//! Links and "about" text attached to the index and to packages.

use super::changes::{Change, Changelog, Tally};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static LINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<name>.+?)\s*[=\s]\s*)?(?P<url>[a-zA-Z][\w+.-]*://\S+)$")
        .expect("link pattern is a valid literal")
});

/// Link category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LinkRel {
    /// Project homepage
    Website,
    /// Donation page
    Donation,
    /// Screenshot image
    Screenshot,
}

impl LinkRel {
    /// Every link category, in serialization order.
    pub const ALL: [Self; 3] = [Self::Website, Self::Donation, Self::Screenshot];

    /// Name used in the index document and as header tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Website => "website",
            Self::Donation => "donation",
            Self::Screenshot => "screenshot",
        }
    }
}

impl fmt::Display for LinkRel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkRel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|rel| rel.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// One named or anonymous hyperlink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Category
    pub rel: LinkRel,
    /// Display name, `None` when the URL is shown as-is
    pub name: Option<String>,
    /// Target URL
    pub href: String,
    pub(crate) change: Change,
}

impl Link {
    /// Create a link from its parts.
    #[must_use]
    pub fn new(rel: LinkRel, name: Option<String>, href: String) -> Self {
        Self {
            rel,
            name,
            href,
            change: Change::New,
        }
    }

    /// Parse `name=url`, `name url` or a bare URL.
    ///
    /// # Errors
    ///
    /// Returns the rejection reason when no http(s) URL is found.
    pub fn parse(rel: LinkRel, line: &str) -> Result<Self, String> {
        let line = line.trim();
        let caps = LINK_REGEX
            .captures(line)
            .ok_or_else(|| format!("invalid link '{line}'"))?;

        let url = &caps["url"];
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(format!("invalid link '{line}': only http(s) URLs are allowed"));
        }

        let name = caps
            .name("name")
            .map(|m| m.as_str().trim().to_string())
            .filter(|n| !n.is_empty());
        Ok(Self::new(rel, name, url.to_string()))
    }

    /// Text shown for the link: its name, or the URL itself.
    #[must_use]
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.href)
    }
}

/// Links and about text of the index or of a package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    links: Vec<Link>,
    about: Option<String>,
    about_changed: bool,
    removed_links: BTreeMap<LinkRel, usize>,
}

impl Metadata {
    /// All links, grouped by category.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        LinkRel::ALL
            .into_iter()
            .flat_map(|rel| self.links.iter().filter(move |l| l.rel == rel))
    }

    /// Links of one category.
    pub fn links_of(&self, rel: LinkRel) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |l| l.rel == rel)
    }

    /// About text.
    #[must_use]
    pub fn about(&self) -> Option<&str> {
        self.about.as_deref()
    }

    /// Replace the about text; unchanged text is not a modification.
    pub fn set_about(&mut self, about: Option<&str>) {
        let about = about.map(str::trim).filter(|a| !a.is_empty());
        if self.about.as_deref() != about {
            self.about = about.map(str::to_string);
            self.about_changed = true;
        }
    }

    /// Add a link, or rename the existing link with the same URL.
    ///
    /// # Errors
    ///
    /// Returns the rejection reason for an invalid line.
    pub fn push_link(&mut self, rel: LinkRel, line: &str) -> Result<(), String> {
        let link = Link::parse(rel, line)?;
        self.upsert(link);
        Ok(())
    }

    fn upsert(&mut self, link: Link) {
        match self
            .links
            .iter_mut()
            .find(|l| l.rel == link.rel && l.href == link.href)
        {
            Some(existing) => {
                if existing.name != link.name {
                    existing.name = link.name;
                    existing.change.touch();
                }
            }
            None => self.links.push(link),
        }
    }

    /// Remove a link by name or URL.
    pub fn remove_link(&mut self, rel: LinkRel, name_or_url: &str) -> bool {
        let Some(position) = self.links.iter().position(|l| {
            l.rel == rel && (l.href == name_or_url || l.name.as_deref() == Some(name_or_url))
        }) else {
            return false;
        };

        let removed = self.links.remove(position);
        if removed.change != Change::New {
            *self.removed_links.entry(rel).or_default() += 1;
        }
        true
    }

    /// Replace every link of one category, keeping unchanged ones clean.
    pub fn replace_links(&mut self, rel: LinkRel, links: Vec<Link>) {
        let previous: Vec<Link> = self.links.iter().filter(|l| l.rel == rel).cloned().collect();

        for old in &previous {
            if !links.iter().any(|l| l.href == old.href) {
                self.remove_link(rel, &old.href);
            }
        }

        let mut kept: Vec<Link> = Vec::with_capacity(links.len());
        for link in links {
            if kept.iter().any(|l| l.href == link.href) {
                continue;
            }
            let merged = match self.links.iter().find(|l| l.rel == rel && l.href == link.href) {
                Some(existing) if existing.name == link.name => existing.clone(),
                Some(existing) => {
                    let mut renamed = existing.clone();
                    renamed.name = link.name;
                    renamed.change.touch();
                    renamed
                }
                None => link,
            };
            kept.push(merged);
        }

        self.links.retain(|l| l.rel != rel);
        self.links.extend(kept);
    }

    /// Whether there is nothing to serialize.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty() && self.about.is_none()
    }

    /// Whether anything changed since the last write.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.about_changed
            || !self.removed_links.is_empty()
            || self.links.iter().any(|l| l.change.is_dirty())
    }

    /// Add link and metadata counts to a changelog.
    pub(crate) fn tally_links(&self, tallies: &mut BTreeMap<LinkRel, Tally>) {
        for link in &self.links {
            tallies.entry(link.rel).or_default().record(link.change);
        }
        for (rel, count) in &self.removed_links {
            tallies.entry(*rel).or_default().removed += count;
        }
    }

    pub(crate) fn about_changed(&self) -> bool {
        self.about_changed
    }

    pub(crate) fn clear_changes(&mut self) {
        self.about_changed = false;
        self.removed_links.clear();
        for link in &mut self.links {
            link.change = Change::Clean;
        }
    }

    pub(crate) fn push_loaded(&mut self, mut link: Link) {
        link.change = Change::Clean;
        self.links.push(link);
    }

    pub(crate) fn set_loaded_about(&mut self, about: String) {
        self.about = Some(about);
    }
}

/// Append per-category link counts in a fixed order.
pub(crate) fn log_links(log: &mut Changelog, tallies: &BTreeMap<LinkRel, Tally>) {
    for rel in LinkRel::ALL {
        if let Some(tally) = tallies.get(&rel) {
            let singular = format!("{rel} link");
            let plural = format!("{rel} links");
            log.add(*tally, &singular, &plural);
        }
    }
}
