use super::changes::Change;
use super::metadata::Metadata;
use super::naming::validate_name;
use super::version::{Version, same_version};
use crate::error::{IndexError, Result};
use crate::types::PackageType;
use std::collections::BTreeMap;

/// Named, versioned unit of distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    name: String,
    package_type: Option<PackageType>,
    description: Option<String>,
    metadata: Metadata,
    versions: Vec<Version>,
    pub(crate) change: Change,
}

impl Package {
    /// Create an empty package.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidName`] for names rejected by the naming rules.
    pub fn new(name: &str) -> Result<Self> {
        validate_name(name)?;
        Ok(Self {
            name: name.to_string(),
            package_type: None,
            description: None,
            metadata: Metadata::default(),
            versions: Vec::new(),
            change: Change::New,
        })
    }

    /// File name of the package.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Package type.
    #[must_use]
    pub const fn package_type(&self) -> Option<PackageType> {
        self.package_type
    }

    /// One-line description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Links and about text.
    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Mutable links and about text.
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// Versions in the order they were released.
    #[must_use]
    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    /// Most recently added version.
    #[must_use]
    pub fn last_version(&self) -> Option<&Version> {
        self.versions.last()
    }

    /// Set the type; an identical value is not a modification.
    pub fn set_type(&mut self, package_type: Option<PackageType>) {
        if self.package_type != package_type {
            self.package_type = package_type;
            self.change.touch();
        }
    }

    /// Set the description; an identical value is not a modification.
    pub fn set_description(&mut self, description: Option<&str>) {
        let description = description.map(str::trim).filter(|d| !d.is_empty());
        if self.description.as_deref() != description {
            self.description = description.map(str::to_string);
            self.change.touch();
        }
    }

    /// Find a version by its exact name.
    #[must_use]
    pub fn version(&self, name: &str) -> Option<&Version> {
        self.versions.iter().find(|v| v.name() == name)
    }

    /// Get a version by exact name, or create it.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::DuplicateVersion`] when a differently spelled
    /// version with the same identity exists; the package is left untouched.
    pub fn version_mut_or_create(&mut self, name: &str) -> Result<&mut Version> {
        if let Some(position) = self.versions.iter().position(|v| v.name() == name) {
            return Ok(&mut self.versions[position]);
        }

        if let Some(existing) = self.versions.iter().find(|v| same_version(v.name(), name)) {
            return Err(IndexError::DuplicateVersion(existing.name().to_string()));
        }

        self.versions.push(Version::new(name));
        let last = self.versions.len() - 1;
        Ok(&mut self.versions[last])
    }

    /// Whether this package or anything it owns changed.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.change.is_dirty()
            || self.metadata.is_modified()
            || self.versions.iter().any(|v| v.change.is_dirty())
    }

    pub(crate) fn clear_changes(&mut self) {
        self.change = Change::Clean;
        self.metadata.clear_changes();
        for version in &mut self.versions {
            version.change = Change::Clean;
        }
    }

    pub(crate) fn set_loaded(&mut self, package_type: Option<PackageType>, description: Option<String>) {
        self.package_type = package_type;
        self.description = description;
    }

    pub(crate) fn push_loaded_version(&mut self, version: Version) {
        self.versions.push(version);
    }
}

/// Named group of packages, usually a repository directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    name: String,
    packages: BTreeMap<String, Package>,
    pub(crate) change: Change,
}

impl Category {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            packages: BTreeMap::new(),
            change: Change::New,
        }
    }

    /// Category name, possibly containing `/`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Packages sorted by name.
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    /// Find a package by name.
    #[must_use]
    pub fn package(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }

    /// Get a package by name, or create it.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidName`] when creating a package with an
    /// invalid name.
    pub fn package_mut_or_create(&mut self, name: &str) -> Result<&mut Package> {
        if !self.packages.contains_key(name) {
            self.packages.insert(name.to_string(), Package::new(name)?);
        }
        self.packages
            .get_mut(name)
            .ok_or_else(|| IndexError::InvalidName(name.to_string()))
    }

    pub(crate) fn package_mut(&mut self, name: &str) -> Option<&mut Package> {
        self.packages.get_mut(name)
    }

    pub(crate) fn insert_package(&mut self, package: Package) {
        self.packages.insert(package.name.clone(), package);
    }

    pub(crate) fn remove_package(&mut self, name: &str) -> Option<Package> {
        self.packages.remove(name)
    }

    /// Whether the category owns no package.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub(crate) fn clear_changes(&mut self) {
        self.change = Change::Clean;
        for package in self.packages.values_mut() {
            package.clear_changes();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_version_rejected() {
        let mut package = Package::new("script.lua").unwrap();
        package.version_mut_or_create("1.1").unwrap();

        let err = package.version_mut_or_create("1.01").unwrap_err();
        assert!(matches!(err, IndexError::DuplicateVersion(ref v) if v == "1.1"));
        assert_eq!(package.versions().len(), 1);

        assert!(package.version_mut_or_create("1.1").is_ok());
        assert_eq!(package.versions().len(), 1);
    }

    #[test]
    fn test_versions_keep_release_order() {
        let mut package = Package::new("script.lua").unwrap();
        for name in ["1.10", "1.9", "2.0"] {
            package.version_mut_or_create(name).unwrap();
        }
        let names: Vec<&str> = package.versions().iter().map(Version::name).collect();
        assert_eq!(names, vec!["1.10", "1.9", "2.0"]);
    }

    #[test]
    fn test_invalid_package_name() {
        let mut category = Category::new("Cat");
        assert!(matches!(
            category.package_mut_or_create(".hidden.lua").unwrap_err(),
            IndexError::InvalidName(_)
        ));
        assert!(category.is_empty());
    }

    #[test]
    fn test_unchanged_description_is_clean() {
        let mut package = Package::new("a.lua").unwrap();
        package.set_description(Some("Hello"));
        package.clear_changes();
        package.set_description(Some("Hello"));
        assert!(!package.is_modified());
    }
}
