//! The persisted package index.
//!
//! An [`Index`] owns categories, which own packages, which own versions and
//! their sources. Every mutation is tracked so [`Index::changelog`] can
//! summarize what changed since the document was loaded or last written.

pub mod changes;
pub mod metadata;
pub mod naming;
mod package;
mod source;
pub mod url;
pub mod version;
mod xml;

pub use metadata::{Link, LinkRel, Metadata};
pub use package::{Category, Package};
pub use source::Source;
pub use version::Version;

use crate::conflicts::ConflictDetector;
use crate::error::Result;
use crate::header::Header;
use crate::scanner::{ScanContext, Scanner};
use crate::types::PackageType;
use crate::utils::paths;
use changes::{Change, Changelog, Tally};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::{Level, debug, info, span, trace};

/// Current document format version.
pub const FORMAT_VERSION: u32 = 1;

/// Marker appended to the changelog when no package is left.
pub const EMPTY_INDEX: &str = "empty index";

/// Root of the package index document.
#[derive(Debug, Clone)]
pub struct Index {
    version: u32,
    commit: Option<String>,
    name: Option<String>,
    url_template: Option<String>,
    metadata: Metadata,
    categories: BTreeMap<String, Category>,
    files: BTreeSet<String>,
    time: Option<DateTime<Utc>>,
    amend: bool,
    cdetector: ConflictDetector,
    removed_categories: usize,
    removed_packages: usize,
    name_changed: bool,
    commit_changed: bool,
}

impl Default for Index {
    fn default() -> Self {
        Self::new()
    }
}

/// State needed to undo a failed scan of one package.
struct Snapshot {
    category_existed: bool,
    package: Option<Package>,
}

impl Index {
    /// Create an empty index at the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: FORMAT_VERSION,
            commit: None,
            name: None,
            url_template: None,
            metadata: Metadata::default(),
            categories: BTreeMap::new(),
            files: BTreeSet::new(),
            time: None,
            amend: false,
            cdetector: ConflictDetector::new(),
            removed_categories: 0,
            removed_packages: 0,
            name_changed: false,
            commit_changed: false,
        }
    }

    /// Load an index from disk
    ///
    /// A missing file yields an empty index.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The document is not a well-formed index
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no index document, starting empty");
            return Ok(Self::new());
        }

        let xml = fs::read_to_string(path)?;
        Self::from_xml(&xml)
    }

    /// Parse an index document.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::CorruptDocument`](crate::IndexError::CorruptDocument)
    /// or an XML error for malformed input.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut index = xml::read(xml)?;
        index.cdetector.load(index.categories.values());
        index.clear_changes();
        Ok(index)
    }

    /// Serialize the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the XML writer fails.
    pub fn to_xml(&self) -> Result<String> {
        xml::write(self)
    }

    /// Write the document to disk and reset change tracking
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Serialization fails
    /// - The parent directory cannot be created
    /// - The file cannot be written
    pub fn write(&mut self, path: &Path) -> Result<()> {
        self.categories.retain(|_, category| !category.is_empty());
        let xml = self.to_xml()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, xml)?;

        info!(path = %path.display(), "index written");
        self.clear_changes();
        Ok(())
    }

    /// Document format version.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Last indexed revision.
    #[must_use]
    pub fn commit(&self) -> Option<&str> {
        self.commit.as_deref()
    }

    /// Record the revision being indexed.
    pub fn set_commit(&mut self, commit: Option<&str>) {
        if self.commit.as_deref() != commit {
            self.commit = commit.map(str::to_string);
            self.commit_changed = true;
        }
    }

    /// Display name of the repository.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set the display name.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidName`](crate::IndexError::InvalidName)
    /// when the name breaks the naming rules.
    pub fn set_name(&mut self, name: Option<&str>) -> Result<()> {
        if let Some(name) = name {
            naming::validate_name(name)?;
        }
        if self.name.as_deref() != name {
            self.name = name.map(str::to_string);
            self.name_changed = true;
        }
        Ok(())
    }

    /// Download URL template.
    #[must_use]
    pub fn url_template(&self) -> Option<&str> {
        self.url_template.as_deref()
    }

    /// Set the download URL template.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidTemplate`](crate::IndexError::InvalidTemplate)
    /// when `$path` is missing.
    pub fn set_url_template(&mut self, template: Option<&str>) -> Result<()> {
        if let Some(template) = template {
            url::check_template(template)?;
        }
        self.url_template = template.map(str::to_string);
        Ok(())
    }

    /// Repository-wide links and about text.
    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Mutable repository-wide links and about text.
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// Files of the tree being scanned.
    #[must_use]
    pub const fn files(&self) -> &BTreeSet<String> {
        &self.files
    }

    /// Replace the pool of known files.
    pub fn set_files(&mut self, files: impl IntoIterator<Item = String>) {
        self.files = files.into_iter().collect();
    }

    /// Time given to versions created by the next scans.
    #[must_use]
    pub const fn time(&self) -> Option<DateTime<Utc>> {
        self.time
    }

    /// Set the time given to new versions.
    pub fn set_time(&mut self, time: Option<DateTime<Utc>>) {
        self.time = time;
    }

    /// Whether existing versions are re-processed.
    #[must_use]
    pub const fn amend(&self) -> bool {
        self.amend
    }

    /// Enable or disable re-processing of existing versions.
    pub fn set_amend(&mut self, amend: bool) {
        self.amend = amend;
    }

    /// File claims of every indexed source.
    #[must_use]
    pub const fn conflicts(&self) -> &ConflictDetector {
        &self.cdetector
    }

    /// Categories sorted by name.
    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    /// Find a category by name.
    #[must_use]
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.get(name)
    }

    /// Get a category by name, or create it.
    pub fn category_mut_or_create(&mut self, name: &str) -> &mut Category {
        self.categories
            .entry(name.to_string())
            .or_insert_with(|| Category::new(name))
    }

    /// Find a package by its file path.
    #[must_use]
    pub fn package(&self, path: &str) -> Option<&Package> {
        let (category, name) = paths::split_package_path(path).ok()?;
        self.categories.get(category)?.package(name)
    }

    /// Number of packages in every category.
    #[must_use]
    pub fn package_count(&self) -> usize {
        self.categories.values().map(|c| c.packages().count()).sum()
    }

    /// Index one package file.
    ///
    /// Files that are not packages are ignored and files tagged `@noindex`
    /// are removed. On failure the package is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns any naming, validation, version, provides or conflict error
    /// raised for this file.
    pub fn scan(&mut self, path: &str, content: &[u8]) -> Result<()> {
        let span = span!(Level::DEBUG, "scan", path);
        let _enter = span.enter();

        let Some(package_type) = PackageType::from_path(path) else {
            trace!("not a package file");
            return Ok(());
        };

        let header = Header::parse(content);
        if header.has("noindex") {
            debug!("noindex tag present");
            self.remove(path);
            return Ok(());
        }

        let (category, name) = paths::split_package_path(path)?;
        naming::validate_name(name)?;

        let snapshot = Snapshot {
            category_existed: self.categories.contains_key(category),
            package: self.package(path).cloned(),
        };

        let result = self.scan_package(category, name, package_type, header);
        if result.is_err() {
            self.restore(category, name, snapshot);
        }
        result
    }

    fn scan_package(
        &mut self,
        category: &str,
        name: &str,
        package_type: PackageType,
        header: Header,
    ) -> Result<()> {
        let context = ScanContext {
            files: &self.files,
            url_template: self.url_template.as_deref(),
            commit: self.commit.as_deref(),
            time: self.time,
            amend: self.amend,
        };

        let package = self
            .categories
            .entry(category.to_string())
            .or_insert_with(|| Category::new(category))
            .package_mut_or_create(name)?;
        package.set_type(Some(package_type));

        Scanner::new(category, package, header, context, &mut self.cdetector).run()
    }

    fn restore(&mut self, category: &str, name: &str, snapshot: Snapshot) {
        match snapshot.package {
            Some(package) => {
                if let Some(existing) = self.categories.get_mut(category) {
                    existing.insert_package(package);
                }
            }
            None => {
                if let Some(existing) = self.categories.get_mut(category) {
                    existing.remove_package(name);
                }
                if !snapshot.category_existed {
                    self.categories.remove(category);
                }
            }
        }
    }

    /// Remove the package stored at `path`.
    ///
    /// Its category is dropped when it becomes empty. Returns whether a
    /// package was removed.
    pub fn remove(&mut self, path: &str) -> bool {
        let Ok((category_name, name)) = paths::split_package_path(path) else {
            return false;
        };
        let Some(category) = self.categories.get_mut(category_name) else {
            return false;
        };
        let Some(package) = category.remove_package(name) else {
            return false;
        };

        let emptied = category.is_empty();
        let category_was_new = category.change == Change::New;

        self.cdetector.clear(path);
        if package.change != Change::New {
            self.removed_packages += 1;
        }
        if emptied {
            self.categories.remove(category_name);
            if !category_was_new {
                self.removed_categories += 1;
            }
        }

        debug!(path, "package removed");
        true
    }

    /// Drop every package and forget the watermark, keeping repository
    /// metadata. Used before replaying history from scratch.
    pub fn clear_packages(&mut self) {
        for category in std::mem::take(&mut self.categories).into_values() {
            if category.change != Change::New {
                self.removed_categories += 1;
            }
            self.removed_packages += category
                .packages()
                .filter(|package| package.change != Change::New)
                .count();
        }
        self.cdetector = ConflictDetector::new();
        self.set_commit(None);
        debug!("packages cleared");
    }

    /// Whether anything changed since the last load or write.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.name_changed
            || self.commit_changed
            || self.removed_packages > 0
            || self.removed_categories > 0
            || self.metadata.is_modified()
            || self.categories.values().any(|c| {
                c.change.is_dirty() || c.packages().any(Package::is_modified)
            })
    }

    /// Summary of changes since the last load or write.
    ///
    /// Example: `"1 new category, 2 new packages, 1 modified version"`.
    #[must_use]
    pub fn changelog(&self) -> String {
        let mut categories = Tally {
            removed: self.removed_categories,
            ..Tally::default()
        };
        let mut packages = Tally {
            removed: self.removed_packages,
            ..Tally::default()
        };
        let mut versions = Tally::default();
        let mut metadata = Tally::default();
        let mut links = BTreeMap::new();

        self.metadata.tally_links(&mut links);
        if self.name_changed || self.metadata.about_changed() {
            metadata.modified += 1;
        }

        for category in self.categories.values() {
            categories.record(category.change);
            for package in category.packages() {
                packages.record(package.change);
                for version in package.versions() {
                    versions.record(version.change);
                }
                package.metadata().tally_links(&mut links);
                if package.change != Change::New && package.metadata().about_changed() {
                    metadata.modified += 1;
                }
            }
        }

        let mut log = Changelog::default();
        log.add(categories, "category", "categories");
        log.add(packages, "package", "packages");
        log.add(versions, "version", "versions");
        metadata::log_links(&mut log, &links);
        log.add(metadata, "metadata", "metadata");
        if self.package_count() == 0 {
            log.note(EMPTY_INDEX);
        }
        log.finish()
    }

    fn clear_changes(&mut self) {
        self.removed_categories = 0;
        self.removed_packages = 0;
        self.name_changed = false;
        self.commit_changed = false;
        self.metadata.clear_changes();
        for category in self.categories.values_mut() {
            category.clear_changes();
        }
    }
}
