use crate::error::{IndexError, Result};
use ::glob::{MatchOptions, Pattern};
use std::collections::BTreeSet;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Expands `{a,b}` alternations into every literal combination.
///
/// Braces without a top-level comma are kept as-is.
#[must_use]
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some((open, close)) = find_alternation(pattern) else {
        return vec![pattern.to_string()];
    };

    let prefix = &pattern[..open];
    let suffix = &pattern[close + 1..];

    split_top_level(&pattern[open + 1..close])
        .into_iter()
        .flat_map(|alternative| expand_braces(&format!("{prefix}{alternative}{suffix}")))
        .collect()
}

/// Locates the first brace pair that contains a comma at its own depth.
fn find_alternation(pattern: &str) -> Option<(usize, usize)> {
    let bytes = pattern.as_bytes();
    let mut start = 0;

    while let Some(offset) = pattern[start..].find('{') {
        let open = start + offset;
        let mut depth = 0;
        let mut has_comma = false;

        for (i, &byte) in bytes.iter().enumerate().skip(open) {
            match byte {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        if has_comma {
                            return Some((open, i));
                        }
                        break;
                    }
                }
                b',' if depth == 1 => has_comma = true,
                _ => {}
            }
        }
        start = open + 1;
    }
    None
}

fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0;
    let mut last = 0;

    for (i, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&body[last..i]);
                last = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[last..]);
    parts
}

/// Returns every pool entry matched by `pattern`, sorted.
///
/// # Errors
///
/// Returns [`IndexError::Parse`] when a brace alternative is not a valid glob.
pub fn match_pool(pattern: &str, pool: &BTreeSet<String>) -> Result<BTreeSet<String>> {
    let mut matches = BTreeSet::new();

    for alternative in expand_braces(pattern) {
        let compiled =
            Pattern::new(&alternative).map_err(|_| IndexError::Parse(pattern.to_string()))?;
        matches.extend(
            pool.iter()
                .filter(|file| compiled.matches_with(file, MATCH_OPTIONS))
                .cloned(),
        );
    }

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(files: &[&str]) -> BTreeSet<String> {
        files.iter().map(|f| (*f).to_string()).collect()
    }

    #[test]
    fn test_expand_braces() {
        assert_eq!(expand_braces("a.lua"), vec!["a.lua"]);
        assert_eq!(expand_braces("*.{lua,eel}"), vec!["*.lua", "*.eel"]);
        assert_eq!(
            expand_braces("{a,b}/{c,d}"),
            vec!["a/c", "a/d", "b/c", "b/d"]
        );
        assert_eq!(expand_braces("x{a,{b,c}}"), vec!["xa", "xb", "xc"]);
        assert_eq!(expand_braces("{single}"), vec!["{single}"]);
    }

    #[test]
    fn test_star_does_not_cross_directories() {
        let files = pool(&["Cat/a.png", "Cat/sub/b.png", "Cat/c.lua"]);
        let matched = match_pool("Cat/*.png", &files).unwrap();
        assert_eq!(matched, pool(&["Cat/a.png"]));
    }

    #[test]
    fn test_recursive_wildcard() {
        let files = pool(&["Cat/a.png", "Cat/sub/b.png", "Other/c.png"]);
        let matched = match_pool("Cat/**/*.png", &files).unwrap();
        assert!(matched.contains("Cat/sub/b.png"));
        assert!(!matched.contains("Other/c.png"));
    }

    #[test]
    fn test_alternation_against_pool() {
        let files = pool(&["Cat/a.lua", "Cat/b.eel", "Cat/c.py"]);
        let matched = match_pool("Cat/*.{lua,eel}", &files).unwrap();
        assert_eq!(matched, pool(&["Cat/a.lua", "Cat/b.eel"]));
    }

    #[test]
    fn test_no_match_is_empty() {
        let files = pool(&["Cat/a.lua"]);
        assert!(match_pool("Cat/*.png", &files).unwrap().is_empty());
    }
}
