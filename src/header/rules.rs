//! Tag aliases and validation rules for metadata headers.

use super::{Header, TagValue};
use crate::error::ValidationError;
use crate::index::metadata::{Link, LinkRel};
use crate::provides::Provision;

/// Whether a tag describes the whole package or one version of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Applies to every version of the package
    Package,
    /// Applies to the version being scanned
    Version,
}

/// Expected form of a tag's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Text value; `multiline` allows continuation lines
    Value {
        /// Whether the value may span several lines
        multiline: bool,
    },
    /// Presence-only boolean
    Flag,
}

/// Validation rule for one canonical tag.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// Canonical tag name
    pub tag: &'static str,
    /// Package-wide or version-specific
    pub scope: Scope,
    /// Whether the tag must be present
    pub required: bool,
    /// Value shape
    pub shape: Shape,
    /// Extra check on the value, returning one reason per problem
    pub check: Option<fn(&str) -> Vec<String>>,
}

const SINGLE: Shape = Shape::Value { multiline: false };
const MULTI: Shape = Shape::Value { multiline: true };

/// Default rule table.
pub static RULES: &[Rule] = &[
    Rule { tag: "description", scope: Scope::Package, required: false, shape: SINGLE, check: None },
    Rule { tag: "about", scope: Scope::Package, required: false, shape: MULTI, check: None },
    Rule { tag: "website", scope: Scope::Package, required: false, shape: MULTI, check: Some(check_website) },
    Rule { tag: "screenshot", scope: Scope::Package, required: false, shape: MULTI, check: Some(check_screenshot) },
    Rule { tag: "donation", scope: Scope::Package, required: false, shape: MULTI, check: Some(check_donation) },
    Rule { tag: "noindex", scope: Scope::Package, required: false, shape: Shape::Flag, check: None },
    Rule { tag: "version", scope: Scope::Version, required: true, shape: SINGLE, check: Some(check_version) },
    Rule { tag: "author", scope: Scope::Version, required: false, shape: SINGLE, check: None },
    Rule { tag: "changelog", scope: Scope::Version, required: false, shape: MULTI, check: None },
    Rule { tag: "provides", scope: Scope::Version, required: false, shape: MULTI, check: Some(check_provides) },
    Rule { tag: "metapackage", scope: Scope::Version, required: false, shape: Shape::Flag, check: None },
];

/// Alternative spellings mapped onto canonical tags, in priority order.
pub static ALIASES: &[(&str, &[&str])] = &[
    (
        "description",
        &[
            "desc",
            "reascript_name",
            "jsfx_name",
            "theme_name",
            "extension_name",
            "langpack_name",
            "webinterface_name",
            "projecttpl_name",
            "tracktpl_name",
            "midinotenames_name",
            "autoitem_name",
        ],
    ),
    ("website", &["link", "links"]),
    ("donation", &["donate"]),
    ("screenshot", &["screenshots"]),
    ("about", &["instructions"]),
    ("changelog", &["changes"]),
    ("author", &["by"]),
];

/// Rewrite aliased tags onto their canonical names.
///
/// An alias never replaces a canonical tag that is already present.
pub fn apply_aliases(header: &mut Header) {
    for (canonical, aliases) in ALIASES {
        for alias in *aliases {
            if header.has(canonical) {
                break;
            }
            if let Some(value) = header.remove(alias) {
                header.insert(canonical, value);
            }
        }
    }
}

/// Check every rule and collect all violations.
///
/// # Errors
///
/// Returns a [`ValidationError`] listing each violation.
pub fn validate(header: &Header) -> Result<(), ValidationError> {
    let mut messages = Vec::new();

    for rule in RULES {
        let Some(value) = header.get(rule.tag) else {
            if rule.required {
                messages.push(format!("missing tag '{}'", rule.tag));
            }
            continue;
        };

        match (rule.shape, value) {
            (Shape::Flag, TagValue::Flag) => {}
            (Shape::Flag, TagValue::Text(_)) => {
                messages.push(format!("tag '{}' does not take a value", rule.tag));
            }
            (Shape::Value { .. }, TagValue::Flag) => {
                messages.push(format!("missing value for tag '{}'", rule.tag));
            }
            (Shape::Value { multiline }, TagValue::Text(text)) => {
                if !multiline && text.contains('\n') {
                    messages.push(format!("tag '{}' must be singleline", rule.tag));
                    continue;
                }
                if let Some(check) = rule.check {
                    messages.extend(
                        check(text)
                            .into_iter()
                            .map(|reason| format!("invalid value for tag '{}': {reason}", rule.tag)),
                    );
                }
            }
        }
    }

    if messages.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(messages))
    }
}

fn check_version(value: &str) -> Vec<String> {
    if !value.starts_with(|c: char| c.is_ascii_digit()) {
        return vec!["must start with a digit".to_string()];
    }

    let mut reasons = Vec::new();
    for run in value
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
    {
        let digits = run.trim_start_matches('0');
        let overflow = digits.len() > 5 || digits.parse::<u32>().is_ok_and(|n| n > u32::from(u16::MAX));
        if overflow {
            reasons.push(format!("segment overflow ({run} > {})", u16::MAX));
        }
    }
    reasons
}

fn check_links(rel: LinkRel, value: &str) -> Vec<String> {
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| Link::parse(rel, line).err())
        .collect()
}

fn check_website(value: &str) -> Vec<String> {
    check_links(LinkRel::Website, value)
}

fn check_screenshot(value: &str) -> Vec<String> {
    check_links(LinkRel::Screenshot, value)
}

fn check_donation(value: &str) -> Vec<String> {
    check_links(LinkRel::Donation, value)
}

fn check_provides(value: &str) -> Vec<String> {
    value
        .lines()
        .filter_map(|line| Provision::parse(line).err())
        .map(|e| e.to_string())
        .collect()
}
