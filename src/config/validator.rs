use crate::index::{Link, LinkRel, url};
use anyhow::{Context, Result};
use colored::Colorize;
use std::collections::HashSet;
use std::path::Path;

/// Checks a configuration file for keys and values the indexer cannot use
pub struct ConfigValidator {
    /// Fully qualified keys recognized in `.reapack-index.toml`
    known_fields: HashSet<&'static str>,
}

impl ConfigValidator {
    #[must_use]
    pub fn new() -> Self {
        let known_fields = [
            "index.output",
            "index.name",
            "index.url_template",
            "index.amend",
            "index.strict",
            "links.website",
            "links.donation",
            "links.screenshot",
            "about.file",
        ]
        .into_iter()
        .collect();

        Self { known_fields }
    }

    /// Validate a configuration file and print warnings about issues
    ///
    /// A missing file is valid.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub fn validate_config_file(&self, config_path: &Path) -> Result<()> {
        if !config_path.exists() {
            return Ok(());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
        let warnings = self.check(&content)?;

        if !warnings.is_empty() {
            eprintln!("{}", "Configuration warnings:".yellow().bold());
            for warning in warnings {
                eprintln!("  {warning}");
            }
            eprintln!();
        }

        Ok(())
    }

    /// Collect warnings for a configuration document
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML
    pub fn check(&self, content: &str) -> Result<Vec<String>> {
        let parsed: toml::Value = toml::from_str(content)?;

        let mut unknown = Vec::new();
        self.check_table(&parsed, "", &mut unknown);

        let mut warnings: Vec<String> = unknown
            .iter()
            .map(|field| format!("Unknown configuration field: {}", field.yellow()))
            .collect();

        if let Some(template) = parsed
            .get("index")
            .and_then(|index| index.get("url_template"))
            .and_then(toml::Value::as_str)
            && let Err(e) = url::check_template(template)
        {
            warnings.push(format!("Invalid {}: {}", "index.url_template".yellow(), e));
        }

        for rel in LinkRel::ALL {
            let Some(lines) = parsed
                .get("links")
                .and_then(|links| links.get(rel.as_str()))
                .and_then(toml::Value::as_array)
            else {
                continue;
            };

            for line in lines {
                let reason = match line.as_str() {
                    Some(line) => Link::parse(rel, line).err(),
                    None => Some("expected a string".to_string()),
                };
                if let Some(reason) = reason {
                    warnings.push(format!(
                        "Invalid entry in {}: {}",
                        format!("links.{rel}").yellow(),
                        reason.dimmed()
                    ));
                }
            }
        }

        Ok(warnings)
    }

    /// Recursively collects keys absent from the known field set
    ///
    /// # Arguments
    ///
    /// * `table` - The TOML value to validate (expected to be a table)
    /// * `prefix` - The current path prefix (e.g., "index")
    /// * `unknown` - Vector to collect unknown field paths
    fn check_table(&self, table: &toml::Value, prefix: &str, unknown: &mut Vec<String>) {
        let toml::Value::Table(map) = table else {
            return;
        };

        for (key, value) in map {
            let full_key = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };

            if self.known_fields.contains(full_key.as_str()) {
                continue;
            }

            if let toml::Value::Table(_) = value {
                self.check_table(value, &full_key, unknown);
            } else {
                unknown.push(full_key);
            }
        }
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}
