mod common;

use anyhow::Result;
use common::URL_TEMPLATE;
use reapack_index::index::naming::validate_name;
use reapack_index::index::{Index, LinkRel};
use reapack_index::IndexError;
use rstest::rstest;
use std::fs;
use tempfile::TempDir;

fn populated() -> Result<Index> {
    let mut index = Index::new();
    index.set_url_template(Some(URL_TEMPLATE))?;
    index.set_name(Some("Test Repository"))?;
    index.set_files(
        [
            "Category/My Script.lua",
            "Category/data.bin",
            "Effects/gain.jsfx",
        ]
        .map(String::from),
    );

    index.scan(
        "Category/My Script.lua",
        b"-- @description Does things\n-- @version 1.0\n-- @author Jane\n-- @about\n--   # Usage\n--   Run it.\n-- @provides [win64] data.bin\n",
    )?;
    index.scan("Effects/gain.jsfx", b"desc: Gain\n// @version 2.0.1\n")?;

    index
        .metadata_mut()
        .push_link(LinkRel::Website, "Home https://example.com")
        .map_err(anyhow::Error::msg)?;
    index.metadata_mut().set_about(Some("Repository notes"));
    Ok(index)
}

#[test]
fn test_missing_document_is_empty() -> Result<()> {
    let dir = TempDir::new()?;
    let index = Index::load(&dir.path().join("index.xml"))?;
    assert_eq!(index.version(), 1);
    assert_eq!(index.package_count(), 0);
    assert!(!index.is_modified());
    Ok(())
}

#[test]
fn test_write_load_write_is_stable() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("out/index.xml");

    let mut index = populated()?;
    index.write(&path)?;
    let first = fs::read_to_string(&path)?;

    let mut reloaded = Index::load(&path)?;
    assert!(!reloaded.is_modified());
    assert_eq!(reloaded.changelog(), "");
    assert_eq!(reloaded.name(), Some("Test Repository"));
    reloaded.write(&path)?;

    assert_eq!(fs::read_to_string(&path)?, first);
    assert!(first.contains("My%20Script.lua"));
    assert!(first.contains(r#"platform="win64" file="data.bin""#));
    assert!(first.contains(r#"<reapack name="gain.jsfx" type="effect">"#));
    Ok(())
}

#[test]
fn test_loaded_document_seeds_conflicts() -> Result<()> {
    let xml = populated()?.to_xml()?;
    let mut index = Index::from_xml(&xml)?;
    index.set_url_template(Some(URL_TEMPLATE))?;
    index.set_files(["Category/other.lua", "Category/data.bin"].map(String::from));

    let result = index.scan(
        "Category/other.lua",
        b"-- @version 1.0\n-- @provides data.bin\n",
    );
    match result {
        Err(IndexError::Conflict(message)) => assert_eq!(
            message,
            "'Category/data.bin' conflicts with 'Category/My Script.lua' on win64"
        ),
        other => panic!("expected a conflict, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_corrupt_documents_are_rejected() {
    assert!(matches!(
        Index::from_xml(r#"<index version="1"><bogus/></index>"#),
        Err(IndexError::CorruptDocument(_))
    ));
    assert!(Index::from_xml(r#"<index version="1"><category></category></index>"#).is_err());
    assert!(Index::from_xml("<index version=\"1\"><category name=\"a\">").is_err());
}

#[test]
fn test_index_metadata_changelog() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("index.xml");

    let mut index = populated()?;
    index.write(&path)?;

    index
        .metadata_mut()
        .push_link(LinkRel::Donation, "https://paypal.me/x")
        .map_err(anyhow::Error::msg)?;
    assert!(index.metadata_mut().remove_link(LinkRel::Website, "Home"));
    assert_eq!(
        index.changelog(),
        "1 removed website link, 1 new donation link"
    );
    index.write(&path)?;

    index.set_name(Some("Renamed"))?;
    index.metadata_mut().set_about(None);
    assert_eq!(index.changelog(), "1 modified metadata");
    Ok(())
}

#[test]
fn test_removing_last_package_notes_empty_index() -> Result<()> {
    let dir = TempDir::new()?;
    let mut index = populated()?;
    index.write(&dir.path().join("index.xml"))?;

    assert!(index.remove("Category/My Script.lua"));
    assert!(index.remove("Effects/gain.jsfx"));
    assert!(!index.remove("Effects/gain.jsfx"));
    assert_eq!(
        index.changelog(),
        "2 removed categories, 2 removed packages, empty index"
    );
    Ok(())
}

#[rstest]
#[case("")]
#[case("ab/cd")]
#[case("a\\b")]
#[case("..")]
#[case(".hidden")]
#[case("trailing.")]
#[case(" leading")]
#[case("trailing ")]
#[case("tab\tname")]
#[case("CLOCK$")]
#[case("lpt1")]
#[case("con.txt")]
fn test_invalid_names(#[case] name: &str) {
    assert!(matches!(validate_name(name), Err(IndexError::InvalidName(_))));

    let mut index = Index::new();
    assert!(index.set_name(Some(name)).is_err());
    assert_eq!(index.name(), None);
}

#[rstest]
#[case("hello world")]
#[case("Repository #1")]
#[case("script.lua")]
#[case("COM10")]
fn test_valid_names(#[case] name: &str) {
    assert!(validate_name(name).is_ok());
}
