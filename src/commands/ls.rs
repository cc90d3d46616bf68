use crate::RepoContext;
use crate::commands::context::CommandContext;
use crate::index::{Index, Package};
use anyhow::{Result, bail};
use colored::Colorize;
use std::fmt::Write;

/// Execute the ls command to print indexed packages
///
/// # Errors
///
/// Returns an error if the index cannot be loaded or the category is unknown
pub fn execute(ctx: &RepoContext, category: Option<&str>, all: bool) -> Result<()> {
    let index = ctx.load_index()?;
    print!("{}", render(&index, category, all)?);
    Ok(())
}

/// Format the package listing.
///
/// # Errors
///
/// Returns an error if `category` is not in the index
pub fn render(index: &Index, category: Option<&str>, all: bool) -> Result<String> {
    let categories: Vec<_> = match category {
        Some(name) => match index.category(name) {
            Some(found) => vec![found],
            None => bail!("Category '{name}' is not indexed"),
        },
        None => index.categories().collect(),
    };

    let mut out = String::new();
    for category in categories {
        writeln!(out, "{}", format!("{}/", category.name()).bold())?;
        for package in category.packages() {
            write_package(&mut out, package, all)?;
        }
    }
    Ok(out)
}

fn write_package(out: &mut String, package: &Package, all: bool) -> Result<()> {
    let kind = package
        .package_type()
        .map(|t| format!(" ({})", t.as_str()))
        .unwrap_or_default();

    let Some(last) = package.last_version() else {
        writeln!(out, "  {}{kind}", package.name())?;
        return Ok(());
    };

    writeln!(out, "  {} v{}{kind}", package.name(), last.name().green())?;
    if let Some(description) = package.description() {
        writeln!(out, "    {}", description.dimmed())?;
    }

    if all {
        for version in package.versions() {
            let author = version
                .author()
                .map(|a| format!(" by {a}"))
                .unwrap_or_default();
            let time = version
                .time()
                .map(|t| format!(" {}", t.format("%Y-%m-%d")))
                .unwrap_or_default();
            writeln!(
                out,
                "    v{}{author}{time}, {} source{}",
                version.name(),
                version.sources().len(),
                if version.sources().len() == 1 { "" } else { "s" }
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Index {
        let mut index = Index::new();
        index
            .set_url_template(Some("https://example.com/$path"))
            .unwrap();
        index.set_files(["Tools/a.lua".to_string()]);
        index
            .scan(
                "Tools/a.lua",
                b"-- @description Does things\n-- @version 1.0\n-- @author me\n",
            )
            .unwrap();
        index
    }

    #[test]
    fn test_render_lists_packages() {
        colored::control::set_override(false);
        let out = render(&sample(), None, true).unwrap();
        assert_eq!(
            out,
            "Tools/\n  a.lua v1.0 (script)\n    Does things\n    v1.0 by me, 1 source\n"
        );
    }

    #[test]
    fn test_render_unknown_category() {
        assert!(render(&sample(), Some("Missing"), false).is_err());
    }
}
