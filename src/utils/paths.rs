use crate::error::{IndexError, Result};

/// Resolves `.` and `..` components of a slash-separated relative path.
///
/// Returns `None` when the path climbs above the repository root.
#[must_use]
pub fn normalize(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for component in path.split(['/', '\\']) {
        match component {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

/// Joins `relative` onto `directory`, both repository-relative.
///
/// A leading `/` makes `relative` repository-root-relative.
#[must_use]
pub fn join(directory: &str, relative: &str) -> Option<String> {
    if let Some(rooted) = relative.strip_prefix('/') {
        return normalize(rooted);
    }
    if directory.is_empty() {
        return normalize(relative);
    }
    normalize(&format!("{directory}/{relative}"))
}

/// Expresses `path` relative to `directory`, using `..` to climb out.
#[must_use]
pub fn relative_to(path: &str, directory: &str) -> String {
    let target: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
    let base: Vec<&str> = directory.split('/').filter(|c| !c.is_empty()).collect();

    let common = target
        .iter()
        .zip(&base)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; base.len() - common];
    parts.extend(&target[common..]);
    parts.join("/")
}

/// Directory part of a slash-separated path (empty at the root).
#[must_use]
pub fn dirname(path: &str) -> &str {
    path.rfind('/').map_or("", |i| &path[..i])
}

/// Last component of a slash-separated path.
#[must_use]
pub fn basename(path: &str) -> &str {
    path.rfind('/').map_or(path, |i| &path[i + 1..])
}

/// Splits a package file path into its category and package name.
///
/// # Errors
///
/// Returns [`IndexError::InvalidPath`] for files at the repository root.
pub fn split_package_path(path: &str) -> Result<(&str, &str)> {
    let category = dirname(path);
    let name = basename(path);
    if category.is_empty() || name.is_empty() {
        return Err(IndexError::InvalidPath(path.to_string()));
    }
    Ok((category, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("a/./b/../c").as_deref(), Some("a/c"));
        assert_eq!(normalize("Category/../Resources/x.dat").as_deref(), Some("Resources/x.dat"));
        assert_eq!(normalize("a//b/").as_deref(), Some("a/b"));
        assert_eq!(normalize("../outside"), None);
    }

    #[test]
    fn test_join() {
        assert_eq!(join("Category", "test.png").as_deref(), Some("Category/test.png"));
        assert_eq!(
            join("Category", "../Resources/unicode.dat").as_deref(),
            Some("Resources/unicode.dat")
        );
        assert_eq!(join("A/B", "/Root/file").as_deref(), Some("Root/file"));
        assert_eq!(join("Category", "../../x"), None);
    }

    #[test]
    fn test_relative_to() {
        assert_eq!(relative_to("Category/test.png", "Category"), "test.png");
        assert_eq!(
            relative_to("Resources/unicode.dat", "Category"),
            "../Resources/unicode.dat"
        );
        assert_eq!(relative_to("A/B/c/d.lua", "A/B"), "c/d.lua");
        assert_eq!(relative_to("A/x.lua", "A/B/C"), "../../x.lua");
    }

    #[test]
    fn test_split_package_path() {
        assert_eq!(split_package_path("Cat/a.lua").unwrap(), ("Cat", "a.lua"));
        assert_eq!(split_package_path("A/B/a.lua").unwrap(), ("A/B", "a.lua"));
        assert!(matches!(
            split_package_path("a.lua").unwrap_err(),
            IndexError::InvalidPath(_)
        ));
    }
}
