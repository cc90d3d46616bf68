pub mod validator;

use crate::index::{Index, LinkRel};
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Configuration file name, looked up at the repository root.
pub const CONFIG_FILE: &str = ".reapack-index.toml";

/// Environment variable overriding `index.output`.
pub const ENV_OUTPUT: &str = "REAPACK_INDEX_OUTPUT";
/// Environment variable overriding `index.amend`.
pub const ENV_AMEND: &str = "REAPACK_INDEX_AMEND";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,

    /// Repository-wide links, one `name=url` line per entry
    #[serde(default)]
    pub links: LinksConfig,

    #[serde(default)]
    pub about: AboutConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Index document path, relative to the repository root
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url_template: Option<String>,
    /// Re-process versions that are already indexed
    #[serde(default)]
    pub amend: bool,
    /// Fail the scan when any file is skipped
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LinksConfig {
    #[serde(default)]
    pub website: Vec<String>,
    #[serde(default)]
    pub donation: Vec<String>,
    #[serde(default)]
    pub screenshot: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AboutConfig {
    /// File holding the repository's about text
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_output() -> PathBuf {
    PathBuf::from("index.xml")
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            name: None,
            url_template: None,
            amend: false,
            strict: false,
        }
    }
}

impl LinksConfig {
    /// Configured lines of one link category
    #[must_use]
    pub fn get(&self, rel: LinkRel) -> &[String] {
        match rel {
            LinkRel::Website => &self.website,
            LinkRel::Donation => &self.donation,
            LinkRel::Screenshot => &self.screenshot,
        }
    }
}

impl Config {
    /// Load configuration from a file, then apply environment overrides
    ///
    /// A missing file yields the defaults; nothing is written.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration file cannot be read
    /// - The file contains invalid TOML or unexpected value types
    /// - An environment override has an invalid value
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `REAPACK_INDEX_*` overrides read through `lookup`
    ///
    /// # Errors
    ///
    /// Returns an error if the amend override is not a boolean.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(output) = lookup(ENV_OUTPUT).filter(|v| !v.is_empty()) {
            self.index.output = PathBuf::from(output);
        }

        if let Some(amend) = lookup(ENV_AMEND) {
            self.index.amend = match amend.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                other => return Err(anyhow!("Invalid value for {ENV_AMEND}: {other}")),
            };
        }
        Ok(())
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create parent directories
    /// - Cannot write to the file
    /// - TOML serialization fails
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        let mut file = std::fs::File::create(path)?;
        file.write_all(toml_str.as_bytes())?;
        Ok(())
    }

    /// Copy the repository-wide settings onto an index
    ///
    /// Only settings present in the configuration are applied, so values
    /// stored in the document are kept otherwise. Links are added, never
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the name, template or a link line is invalid, or
    /// if the about file cannot be read.
    pub fn apply_to(&self, index: &mut Index, repo_root: &Path) -> Result<()> {
        if let Some(name) = &self.index.name {
            index.set_name(Some(name))?;
        }
        if let Some(template) = &self.index.url_template {
            index.set_url_template(Some(template))?;
        }
        index.set_amend(self.index.amend);

        for rel in LinkRel::ALL {
            for line in self.links.get(rel) {
                index
                    .metadata_mut()
                    .push_link(rel, line)
                    .map_err(|reason| anyhow!("Invalid {rel} link in {CONFIG_FILE}: {reason}"))?;
            }
        }

        if let Some(file) = &self.about.file {
            let path = repo_root.join(file);
            let about = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read about file: {}", path.display()))?;
            index.metadata_mut().set_about(Some(&about));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join(CONFIG_FILE);
        let mut config = Config::load(&path)?;
        config.apply_overrides(|_| None)?;

        assert_eq!(config.index.output, PathBuf::from("index.xml"));
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn test_parse_sections() -> Result<()> {
        let config: Config = toml::from_str(
            r#"
            [index]
            name = "My Scripts"
            url_template = "https://example.com/$commit/$path"
            strict = true

            [links]
            website = ["Homepage=https://example.com"]

            [about]
            file = "ABOUT.md"
            "#,
        )?;

        assert_eq!(config.index.name.as_deref(), Some("My Scripts"));
        assert!(config.index.strict);
        assert!(!config.index.amend);
        assert_eq!(config.links.get(LinkRel::Website).len(), 1);
        assert_eq!(config.about.file, Some(PathBuf::from("ABOUT.md")));
        Ok(())
    }

    #[test]
    fn test_env_overrides() -> Result<()> {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            ENV_OUTPUT => Some("out/index.xml".to_string()),
            ENV_AMEND => Some("yes".to_string()),
            _ => None,
        })?;
        assert_eq!(config.index.output, PathBuf::from("out/index.xml"));
        assert!(config.index.amend);

        assert!(
            config
                .apply_overrides(|key| (key == ENV_AMEND).then(|| "maybe".to_string()))
                .is_err()
        );
        Ok(())
    }

    #[test]
    fn test_save_and_reload() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join(CONFIG_FILE);

        let mut config = Config::default();
        config.index.name = Some("Saved".to_string());
        config.links.donation.push("https://paypal.me/x".to_string());
        config.save(&path)?;

        let content = std::fs::read_to_string(&path)?;
        let reloaded: Config = toml::from_str(&content)?;
        assert_eq!(reloaded.index.name.as_deref(), Some("Saved"));
        assert_eq!(reloaded.links.donation, vec!["https://paypal.me/x"]);
        Ok(())
    }

    #[test]
    fn test_apply_to_index() -> Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("ABOUT.md"), "# Repository\n")?;

        let mut config = Config::default();
        config.index.name = Some("Repo".to_string());
        config.index.url_template = Some("https://x.com/$path".to_string());
        config.links.website.push("https://x.com".to_string());
        config.about.file = Some(PathBuf::from("ABOUT.md"));

        let mut index = Index::new();
        config.apply_to(&mut index, dir.path())?;

        assert_eq!(index.name(), Some("Repo"));
        assert_eq!(index.url_template(), Some("https://x.com/$path"));
        assert_eq!(index.metadata().about(), Some("# Repository"));
        assert_eq!(index.metadata().links().count(), 1);
        Ok(())
    }
}
