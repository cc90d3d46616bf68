//! Download URL templates.

use crate::error::{IndexError, Result};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Branch substituted for `$commit` before any revision is known.
pub const DEFAULT_BRANCH: &str = "master";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(path|commit|version|package)")
        .expect("placeholder pattern is a valid literal")
});

/// Values substituted into a template.
#[derive(Debug, Clone, Copy)]
pub struct UrlVars<'a> {
    /// Repository-relative path of the downloaded file
    pub path: &'a str,
    /// Revision id, if any
    pub commit: Option<&'a str>,
    /// Version being scanned
    pub version: &'a str,
    /// Path of the package file
    pub package: &'a str,
}

/// Require the `$path` placeholder in a template.
///
/// # Errors
///
/// Returns [`IndexError::InvalidTemplate`] when the placeholder is missing.
pub fn check_template(template: &str) -> Result<()> {
    if template.contains("$path") {
        Ok(())
    } else {
        Err(IndexError::InvalidTemplate(template.to_string()))
    }
}

/// Substitute every placeholder in a single pass.
///
/// `$path` is percent-encoded one segment at a time so its slashes survive.
#[must_use]
pub fn expand(template: &str, vars: &UrlVars<'_>) -> String {
    let expanded = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| match &caps[1] {
        "path" => encode_path(vars.path),
        "commit" => vars.commit.unwrap_or(DEFAULT_BRANCH).to_string(),
        "version" => vars.version.to_string(),
        _ => vars.package.to_string(),
    });
    escape(&expanded)
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Percent-escape whitespace, control and non-ASCII characters.
fn escape(url: &str) -> String {
    let mut escaped = String::with_capacity(url.len());
    for c in url.chars() {
        if c.is_ascii_graphic() {
            escaped.push(c);
        } else {
            let mut buf = [0; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                escaped.push_str(&format!("%{byte:02X}"));
            }
        }
    }
    escaped
}
