//! Turns one package file's header into package, version and source records.

/// Provision expansion into concrete sources
pub mod sources;

use crate::conflicts::ConflictDetector;
use crate::error::{IndexError, Result, ValidationError};
use crate::header::{Header, rules};
use crate::index::Package;
use crate::index::metadata::{Link, LinkRel};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::{Level, debug, span};

pub use sources::PlannedSource;

/// Index state a scan reads but does not own.
#[derive(Debug, Clone, Copy)]
pub struct ScanContext<'a> {
    /// Files present in the scanned tree
    pub files: &'a BTreeSet<String>,
    /// Download URL template
    pub url_template: Option<&'a str>,
    /// Revision being scanned
    pub commit: Option<&'a str>,
    /// Time given to new versions
    pub time: Option<DateTime<Utc>>,
    /// Re-process versions that already exist
    pub amend: bool,
}

/// Applies one parsed header to its package.
pub struct Scanner<'a> {
    category: &'a str,
    package: &'a mut Package,
    header: Header,
    context: ScanContext<'a>,
    cdetector: &'a mut ConflictDetector,
}

impl<'a> Scanner<'a> {
    /// Prepare a scan of `package`, which lives in `category`.
    #[must_use]
    pub fn new(
        category: &'a str,
        package: &'a mut Package,
        header: Header,
        context: ScanContext<'a>,
        cdetector: &'a mut ConflictDetector,
    ) -> Self {
        Self {
            category,
            package,
            header,
            context,
            cdetector,
        }
    }

    /// Path of the package file, also its conflict owner key.
    #[must_use]
    pub fn package_path(&self) -> String {
        format!("{}/{}", self.category, self.package.name())
    }

    /// Validate the header and apply it.
    ///
    /// The package may be partially updated when this fails; the caller
    /// restores it. The conflict detector is only changed on success.
    ///
    /// # Errors
    ///
    /// Returns the first failure among header validation, version
    /// creation, source expansion and conflict checking.
    pub fn run(mut self) -> Result<()> {
        let package_path = self.package_path();
        let span = span!(Level::DEBUG, "scanner", package = %package_path);
        let _enter = span.enter();

        rules::apply_aliases(&mut self.header);
        rules::validate(&self.header)?;

        self.package.set_description(self.header.text("description"));
        self.package
            .metadata_mut()
            .set_about(self.header.text("about"));

        for rel in LinkRel::ALL {
            let links = self.links(rel)?;
            self.package.metadata_mut().replace_links(rel, links);
        }

        let version_name = self
            .header
            .text("version")
            .map(str::to_string)
            .ok_or_else(|| ValidationError::new(vec!["missing tag 'version'".to_string()]))?;

        let is_new = self.package.version_mut_or_create(&version_name)?.is_new();
        if !is_new && !self.context.amend {
            debug!(version = %version_name, "version already indexed");
            return Ok(());
        }

        let planned = self.plan_sources(&version_name, &package_path)?;
        let claims = planned
            .iter()
            .map(|p| (p.source.platform, p.install_path.clone()))
            .collect();
        self.cdetector.replace(&package_path, claims)?;

        let version = self.package.version_mut_or_create(&version_name)?;
        version.set_author(self.header.text("author"));
        version.set_changelog(self.header.text("changelog"));
        version.stamp(self.context.time);
        version.replace_sources(planned.into_iter().map(|p| p.source).collect());

        debug!(version = %version_name, new = is_new, "version indexed");
        Ok(())
    }

    fn links(&self, rel: LinkRel) -> Result<Vec<Link>> {
        let Some(value) = self.header.text(rel.as_str()) else {
            return Ok(Vec::new());
        };

        value
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                Link::parse(rel, line).map_err(|reason| {
                    IndexError::from(ValidationError::new(vec![format!(
                        "invalid value for tag '{rel}': {reason}"
                    )]))
                })
            })
            .collect()
    }
}
