//! File ownership conflict detection
//!
//! Every source a package installs is registered as a claim on its install
//! path. Two claims on the same path collide when their platform scopes
//! overlap: a package providing the same file twice is a duplicate, two
//! packages providing it is a conflict.

use crate::error::{IndexError, Result};
use crate::index::Category;
use crate::types::Platform;
use crate::utils::paths;
use std::collections::HashMap;
use tracing::{debug, trace};

/// A single claim of an install path by a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    /// Owner key, the package's category/name path
    pub owner: String,
    /// Platform scope the file is installed on
    pub platform: Platform,
    /// Install path, relative to the repository root
    pub path: String,
}

/// Tracks claimed install paths and reports collisions
///
/// Claims are kept in insertion order; that order decides which claim is
/// reported as the original when several collide.
#[derive(Debug, Clone, Default)]
pub struct ConflictDetector {
    claims: Vec<Claim>,
}

impl ConflictDetector {
    /// Create an empty detector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a claim
    ///
    /// # Arguments
    ///
    /// * `owner` - Owner key of the claiming package
    /// * `platform` - Platform scope of the claim
    /// * `path` - Install path being claimed
    pub fn add(&mut self, owner: &str, platform: Platform, path: &str) {
        trace!(owner, %platform, path, "claim");
        self.claims.push(Claim {
            owner: owner.to_string(),
            platform,
            path: path.to_string(),
        });
    }

    /// Drop every claim made by `owner`
    pub fn clear(&mut self, owner: &str) {
        self.claims.retain(|c| c.owner != owner);
    }

    /// Claims made by `owner`, in insertion order
    pub fn claims_of<'a>(&'a self, owner: &'a str) -> impl Iterator<Item = &'a Claim> {
        self.claims.iter().filter(move |c| c.owner == owner)
    }

    /// Number of registered claims
    #[must_use]
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Whether no claim is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Replace every claim of `owner`, keeping the previous ones on failure
    ///
    /// The new claims are swapped in and checked with [`resolve`]; when any
    /// collision involves `owner`, the detector is restored exactly as it
    /// was before the call.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Conflict`] carrying the first collision message.
    ///
    /// [`resolve`]: ConflictDetector::resolve
    pub fn replace(&mut self, owner: &str, claims: Vec<(Platform, String)>) -> Result<()> {
        let previous = self.claims.clone();

        self.clear(owner);
        for (platform, path) in claims {
            self.add(owner, platform, &path);
        }

        match self.resolve(Some(owner)).into_iter().next() {
            None => Ok(()),
            Some(message) => {
                debug!(owner, %message, "conflict, restoring previous claims");
                self.claims = previous;
                Err(IndexError::Conflict(message))
            }
        }
    }

    /// Seed from the latest version of every package of a loaded index
    pub fn load<'a>(&mut self, categories: impl IntoIterator<Item = &'a Category>) {
        for category in categories {
            for package in category.packages() {
                let owner = format!("{}/{}", category.name(), package.name());
                let Some(version) = package.last_version() else {
                    continue;
                };

                for source in version.sources() {
                    let file = source.file.as_deref().unwrap_or(package.name());
                    if let Some(path) = paths::join(category.name(), file) {
                        self.add(&owner, source.platform, &path);
                    }
                }
            }
        }
        debug!(claims = self.claims.len(), "conflict detector seeded");
    }

    /// Report colliding claims
    ///
    /// # Arguments
    ///
    /// * `scope` - Only report collisions involving this owner. Without a
    ///   scope every collision is reported as a duplicate; with one, claims
    ///   of other owners are reported as conflicts.
    ///
    /// # Returns
    ///
    /// One message per colliding path, in the order paths were first
    /// claimed. Empty when nothing collides.
    #[must_use]
    pub fn resolve(&self, scope: Option<&str>) -> Vec<String> {
        let mut order: Vec<&str> = Vec::new();
        let mut groups: HashMap<&str, Vec<&Claim>> = HashMap::new();
        for claim in &self.claims {
            groups
                .entry(claim.path.as_str())
                .or_insert_with(|| {
                    order.push(claim.path.as_str());
                    Vec::new()
                })
                .push(claim);
        }

        let mut messages = Vec::new();
        for path in order {
            let group = &groups[path];
            if group.len() < 2 {
                continue;
            }
            if let Some(owner) = scope {
                if !group.iter().any(|c| c.owner == owner) {
                    continue;
                }
            }
            if !has_overlap(group, scope) {
                continue;
            }

            let first_owner = &group[0].owner;
            let single_owner = group.iter().all(|c| &c.owner == first_owner);
            let Some(owner) = scope.filter(|_| !single_owner) else {
                let mut by_depth = group.clone();
                by_depth.sort_by_key(|c| c.platform.depth());
                let original = by_depth[1];
                messages.push(format!(
                    "duplicate file '{path}'{}",
                    platform_suffix(original.platform)
                ));
                continue;
            };

            if let Some(original) = most_specific(group.iter().copied().filter(|c| c.owner != owner)) {
                messages.push(format!(
                    "'{path}' conflicts with '{}'{}",
                    original.owner,
                    platform_suffix(original.platform)
                ));
            }
        }
        messages
    }
}

/// Whether two claims of the group have overlapping scopes.
///
/// With a scope, one of the pair must belong to the scoped owner.
fn has_overlap(group: &[&Claim], scope: Option<&str>) -> bool {
    group.iter().enumerate().any(|(i, a)| {
        group[i + 1..].iter().any(|b| {
            let involved = scope.is_none_or(|owner| a.owner == owner || b.owner == owner);
            involved && a.platform.overlaps(b.platform)
        })
    })
}

/// Deepest claim, the first one inserted on ties.
fn most_specific<'a>(claims: impl Iterator<Item = &'a Claim>) -> Option<&'a Claim> {
    claims.fold(None, |best: Option<&Claim>, claim| match best {
        Some(b) if b.platform.depth() >= claim.platform.depth() => Some(b),
        _ => Some(claim),
    })
}

fn platform_suffix(platform: Platform) -> String {
    if platform == Platform::All {
        String::new()
    } else {
        format!(" on {platform}")
    }
}
