use super::Scanner;
use crate::error::{IndexError, Result};
use crate::index::Source;
use crate::index::url::{self, UrlVars};
use crate::provides::{MainSpec, Provision};
use crate::types::{PackageType, Section};
use crate::utils::{glob, paths};
use tracing::trace;

/// A source together with the install path it claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSource {
    /// Install path relative to the repository root
    pub install_path: String,
    /// Whether the downloaded file is the package file itself
    pub is_self: bool,
    /// The record stored in the version
    pub source: Source,
}

impl Scanner<'_> {
    /// Expand the provides tag into sources, in declaration order.
    ///
    /// The package file itself is prepended unless a provision already
    /// covers it or the package is a metapackage.
    pub(super) fn plan_sources(&self, version: &str, package_path: &str) -> Result<Vec<PlannedSource>> {
        let provisions = Provision::parse_all(self.header.text("provides").unwrap_or_default())?;
        let metapackage = self.header.has("metapackage");

        let mut planned = Vec::new();
        for provision in &provisions {
            for file in self.expand(provision, package_path)? {
                planned.push(self.make_source(Some(provision), &file, version, package_path, metapackage)?);
            }
        }

        if !metapackage && !planned.iter().any(|p| p.is_self) {
            let own = self.make_source(None, package_path, version, package_path, metapackage)?;
            planned.insert(0, own);
        }

        Ok(planned)
    }

    /// Files a provision refers to, repository-relative.
    fn expand(&self, provision: &Provision, package_path: &str) -> Result<Vec<String>> {
        let pattern = paths::join(self.category, &provision.file_pattern)
            .ok_or_else(|| IndexError::FileNotFound(provision.file_pattern.clone()))?;

        if pattern == package_path || provision.url_template.is_some() {
            return Ok(vec![pattern]);
        }

        let matched = glob::match_pool(&pattern, self.context.files)?;
        if matched.is_empty() {
            return Err(IndexError::FileNotFound(provision.file_pattern.clone()));
        }
        trace!(pattern = %pattern, count = matched.len(), "pattern expanded");
        Ok(matched.into_iter().collect())
    }

    fn make_source(
        &self,
        provision: Option<&Provision>,
        file: &str,
        version: &str,
        package_path: &str,
        metapackage: bool,
    ) -> Result<PlannedSource> {
        let install_path = match provision.and_then(|p| p.destination(paths::basename(file))) {
            Some(destination) => paths::join(self.category, &destination)
                .ok_or(IndexError::FileNotFound(destination))?,
            None => file.to_string(),
        };

        let explicit_url = provision.and_then(|p| p.url_template.as_deref());
        let mut source = Source::new(self.make_url(file, explicit_url, version, package_path)?);
        source.platform = provision.and_then(|p| p.platform).unwrap_or_default();
        source.package_type = provision.and_then(|p| p.package_type);
        if install_path != package_path {
            source.file = Some(paths::relative_to(&install_path, self.category));
        }

        let is_self = file == package_path;
        let effective_type = source.package_type.or(self.package.package_type());
        let section = || Section::detect(paths::basename(paths::dirname(&install_path)));
        source.sections = match provision.and_then(|p| p.main.as_ref()) {
            Some(MainSpec::Disabled) => Vec::new(),
            Some(MainSpec::Sections(sections)) => sections.clone(),
            Some(MainSpec::Auto) => vec![section()],
            None if is_self && !metapackage && effective_type == Some(PackageType::Script) => {
                vec![section()]
            }
            None => Vec::new(),
        };

        Ok(PlannedSource {
            install_path,
            is_self,
            source,
        })
    }

    /// Build the download URL of `path`.
    ///
    /// An explicit URL from the provides line is used as-is after placeholder
    /// expansion; otherwise the index template applies and the file must be
    /// part of the scanned tree.
    fn make_url(
        &self,
        path: &str,
        explicit: Option<&str>,
        version: &str,
        package_path: &str,
    ) -> Result<String> {
        let template = match explicit {
            Some(template) => template,
            None => {
                let template = self.context.url_template.ok_or(IndexError::MissingTemplate)?;
                if !self.context.files.contains(path) {
                    return Err(IndexError::FileNotFound(path.to_string()));
                }
                template
            }
        };

        Ok(url::expand(
            template,
            &UrlVars {
                path,
                commit: self.context.commit,
                version,
                package: package_path,
            },
        ))
    }
}
