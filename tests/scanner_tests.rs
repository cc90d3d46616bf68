mod common;

use anyhow::Result;
use common::URL_TEMPLATE;
use reapack_index::index::{Index, LinkRel};
use reapack_index::types::{Platform, Section};
use reapack_index::IndexError;
use tempfile::TempDir;

fn index_with(files: &[&str]) -> Result<Index> {
    let mut index = Index::new();
    index.set_url_template(Some(URL_TEMPLATE))?;
    index.set_files(files.iter().map(|f| (*f).to_string()));
    Ok(index)
}

/// Persist to a scratch file so change tracking starts over.
fn commit(index: &mut Index) -> Result<()> {
    let dir = TempDir::new()?;
    index.write(&dir.path().join("index.xml"))?;
    Ok(())
}

#[test]
fn test_provides_expansion() -> Result<()> {
    let mut index = index_with(&[
        "Category/script.lua",
        "Resources/unicode.dat",
        "Category/test.png",
    ])?;

    index.scan(
        "Category/script.lua",
        b"-- @version 1.0\n-- @provides\n--   [windows] ../Resources/unicode.dat\n--   test.png\n",
    )?;

    let package = index.package("Category/script.lua").unwrap();
    let sources = package.version("1.0").unwrap().sources();
    assert_eq!(sources.len(), 3);

    assert_eq!(sources[0].file, None);
    assert_eq!(sources[0].platform, Platform::All);
    assert_eq!(sources[0].sections, vec![Section::Main]);
    assert_eq!(
        sources[0].url,
        "https://example.com/master/Category/script.lua"
    );

    assert_eq!(sources[1].file.as_deref(), Some("../Resources/unicode.dat"));
    assert_eq!(sources[1].platform, Platform::Windows);
    assert!(sources[1].sections.is_empty());
    assert_eq!(
        sources[1].url,
        "https://example.com/master/Resources/unicode.dat"
    );

    assert_eq!(sources[2].file.as_deref(), Some("test.png"));
    assert_eq!(sources[2].platform, Platform::All);
    Ok(())
}

#[test]
fn test_glob_and_rename() -> Result<()> {
    let mut index = index_with(&[
        "Category/script.lua",
        "Category/data/a.txt",
        "Category/data/b.txt",
    ])?;

    index.scan(
        "Category/script.lua",
        b"-- @version 1.0\n-- @provides\n--   data/*.txt > Stuff/\n",
    )?;

    let sources = index
        .package("Category/script.lua")
        .unwrap()
        .version("1.0")
        .unwrap()
        .sources();
    let files: Vec<_> = sources.iter().map(|s| s.file.as_deref()).collect();
    assert_eq!(files, vec![None, Some("Stuff/a.txt"), Some("Stuff/b.txt")]);
    assert_eq!(
        sources[1].url,
        "https://example.com/master/Category/data/a.txt"
    );
    Ok(())
}

#[test]
fn test_missing_provided_file() -> Result<()> {
    let mut index = index_with(&["Category/script.lua"])?;
    let result = index.scan(
        "Category/script.lua",
        b"-- @version 1.0\n-- @provides missing.png\n",
    );

    assert!(matches!(result, Err(IndexError::FileNotFound(ref p)) if p == "missing.png"));
    assert!(index.package("Category/script.lua").is_none());
    assert!(index.category("Category").is_none());
    Ok(())
}

#[test]
fn test_missing_template() -> Result<()> {
    let mut index = Index::new();
    index.set_files(["Category/script.lua".to_string()]);

    let result = index.scan("Category/script.lua", b"-- @version 1.0\n");
    assert!(matches!(result, Err(IndexError::MissingTemplate)));
    Ok(())
}

#[test]
fn test_explicit_url_needs_no_template() -> Result<()> {
    let mut index = Index::new();
    index.set_files(["Category/pack.lua".to_string()]);

    index.scan(
        "Category/pack.lua",
        b"-- @metapackage\n-- @version 1.0\n-- @provides\n--   lib.dll https://cdn.example.com/$version/lib.dll\n",
    )?;

    let sources = index
        .package("Category/pack.lua")
        .unwrap()
        .version("1.0")
        .unwrap()
        .sources();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].url, "https://cdn.example.com/1.0/lib.dll");
    assert_eq!(sources[0].file.as_deref(), Some("lib.dll"));
    Ok(())
}

#[test]
fn test_metapackage_has_no_self_source() -> Result<()> {
    let mut index = index_with(&["Category/pack.lua", "Category/x.lua", "Category/y.lua"])?;

    index.scan(
        "Category/pack.lua",
        b"-- @metapackage\n-- @version 1.0\n-- @provides\n--   [main] x.lua\n--   y.lua\n",
    )?;

    let sources = index
        .package("Category/pack.lua")
        .unwrap()
        .version("1.0")
        .unwrap()
        .sources();
    assert_eq!(sources.len(), 2);
    assert_eq!(sources[0].sections, vec![Section::Main]);
    assert!(sources[1].sections.is_empty());
    Ok(())
}

#[test]
fn test_section_detected_from_directory() -> Result<()> {
    let mut index = index_with(&["MIDI Editor/tool.lua"])?;
    index.scan("MIDI Editor/tool.lua", b"-- @version 1.0\n")?;

    let source = &index
        .package("MIDI Editor/tool.lua")
        .unwrap()
        .version("1.0")
        .unwrap()
        .sources()[0];
    assert_eq!(source.sections, vec![Section::MidiEditor]);
    Ok(())
}

#[test]
fn test_rescan_is_idempotent() -> Result<()> {
    let mut index = index_with(&["Category/script.lua"])?;
    let content = b"-- @description Hello\n-- @version 1.0\n-- @website https://example.com\n";

    index.scan("Category/script.lua", content)?;
    assert_eq!(
        index.changelog(),
        "1 new category, 1 new package, 1 new version, 1 new website link"
    );
    commit(&mut index)?;

    index.scan("Category/script.lua", content)?;
    assert!(!index.is_modified());
    assert_eq!(index.changelog(), "");
    Ok(())
}

#[test]
fn test_amend_updates_existing_version() -> Result<()> {
    let mut index = index_with(&["Category/script.lua"])?;
    index.scan("Category/script.lua", b"-- @version 1.0\n-- @author first\n")?;
    commit(&mut index)?;

    index.scan("Category/script.lua", b"-- @version 1.0\n-- @author second\n")?;
    assert!(!index.is_modified());

    index.set_amend(true);
    index.scan("Category/script.lua", b"-- @version 1.0\n-- @author second\n")?;
    assert_eq!(index.changelog(), "1 modified version");

    let version = index
        .package("Category/script.lua")
        .unwrap()
        .version("1.0")
        .unwrap();
    assert_eq!(version.author(), Some("second"));
    Ok(())
}

#[test]
fn test_duplicate_version_identity() -> Result<()> {
    let mut index = index_with(&["Category/script.lua"])?;
    index.scan("Category/script.lua", b"-- @version 1.1\n")?;

    let result = index.scan("Category/script.lua", b"-- @version 1.01\n");
    assert!(matches!(result, Err(IndexError::DuplicateVersion(ref v)) if v == "1.1"));
    assert_eq!(
        index.package("Category/script.lua").unwrap().versions().len(),
        1
    );
    Ok(())
}

#[test]
fn test_cross_package_conflict_is_atomic() -> Result<()> {
    let mut index = index_with(&["Cat/a.lua", "Cat/b.lua", "Cat/shared.dat"])?;
    index.scan("Cat/a.lua", b"-- @version 1.0\n-- @provides shared.dat\n")?;
    index.scan("Cat/b.lua", b"-- @version 1.0\n")?;
    commit(&mut index)?;
    let claims_before = index.conflicts().len();

    let result = index.scan("Cat/b.lua", b"-- @version 1.1\n-- @provides shared.dat\n");
    match result {
        Err(IndexError::Conflict(message)) => {
            assert_eq!(message, "'Cat/shared.dat' conflicts with 'Cat/a.lua'");
        }
        other => panic!("expected a conflict, got {other:?}"),
    }

    let package = index.package("Cat/b.lua").unwrap();
    assert_eq!(package.versions().len(), 1);
    assert_eq!(index.conflicts().len(), claims_before);
    assert!(!index.is_modified());
    Ok(())
}

#[test]
fn test_new_package_conflict_leaves_no_trace() -> Result<()> {
    let mut index = index_with(&["Cat/a.lua", "Other/b.lua", "Cat/shared.dat"])?;
    index.scan("Cat/a.lua", b"-- @version 1.0\n-- @provides shared.dat\n")?;

    let result = index.scan(
        "Other/b.lua",
        b"-- @version 1.0\n-- @provides /Cat/shared.dat\n",
    );
    assert!(matches!(result, Err(IndexError::Conflict(_))));
    assert!(index.category("Other").is_none());
    Ok(())
}

#[test]
fn test_validation_errors_are_aggregated() -> Result<()> {
    let mut index = index_with(&["Category/script.lua"])?;
    let result = index.scan(
        "Category/script.lua",
        b"-- @version\n-- @author\n--   first\n--   second\n-- @metapackage yes\n",
    );

    match result {
        Err(IndexError::Validation(e)) => assert_eq!(
            e.messages,
            vec![
                "missing value for tag 'version'",
                "tag 'author' must be singleline",
                "tag 'metapackage' does not take a value",
            ]
        ),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(index.package("Category/script.lua").is_none());
    Ok(())
}

#[test]
fn test_noindex_removes_package() -> Result<()> {
    let mut index = index_with(&["Category/script.lua"])?;
    index.scan("Category/script.lua", b"-- @version 1.0\n")?;
    commit(&mut index)?;

    index.scan("Category/script.lua", b"-- @noindex\n")?;
    assert!(index.package("Category/script.lua").is_none());
    assert_eq!(
        index.changelog(),
        "1 removed category, 1 removed package, empty index"
    );
    Ok(())
}

#[test]
fn test_links_are_replaced() -> Result<()> {
    let mut index = index_with(&["Category/script.lua"])?;
    index.scan(
        "Category/script.lua",
        b"-- @version 1.0\n-- @donation\n--   Paypal https://paypal.me/a\n--   https://ko-fi.com/a\n",
    )?;
    commit(&mut index)?;

    index.scan(
        "Category/script.lua",
        b"-- @version 1.0\n-- @donate https://ko-fi.com/a\n",
    )?;

    let package = index.package("Category/script.lua").unwrap();
    let links: Vec<_> = package.metadata().links_of(LinkRel::Donation).collect();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].href, "https://ko-fi.com/a");
    assert_eq!(index.changelog(), "1 removed donation link");
    Ok(())
}

#[test]
fn test_non_package_and_root_files() -> Result<()> {
    let mut index = index_with(&["README.md", "script.lua"])?;
    index.scan("Category/README.md", b"-- @version 1.0\n")?;
    assert_eq!(index.package_count(), 0);

    let result = index.scan("script.lua", b"-- @version 1.0\n");
    assert!(matches!(result, Err(IndexError::InvalidPath(_))));
    Ok(())
}
