use crate::types::{PackageType, Platform, Section};

/// One downloadable file of a version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Absolute download URL
    pub url: String,
    /// Install path relative to the category, `None` for the package's own file
    pub file: Option<String>,
    /// Platform scope
    pub platform: Platform,
    /// Type override
    pub package_type: Option<PackageType>,
    /// Action list sections the file registers into
    pub sections: Vec<Section>,
}

impl Source {
    /// A source for `url` installed on every platform.
    #[must_use]
    pub fn new(url: String) -> Self {
        Self {
            url,
            file: None,
            platform: Platform::All,
            package_type: None,
            sections: Vec::new(),
        }
    }

    /// Space-separated section list as written in the `main` attribute.
    #[must_use]
    pub fn main_attribute(&self) -> Option<String> {
        if self.sections.is_empty() {
            return None;
        }
        Some(
            self.sections
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        )
    }
}
