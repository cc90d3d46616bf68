//! Reading and writing the index document.

use super::{Category, Index, Link, LinkRel, Metadata, Package, Source, Version};
use crate::error::{IndexError, Result};
use crate::types::{PackageType, Platform, Section};
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::BTreeMap;
use std::str::FromStr;

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

type XmlWriter = Writer<Vec<u8>>;

pub(super) fn write(index: &Index) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let version = index.version.to_string();
    let mut root = BytesStart::new("index");
    root.push_attribute(("version", version.as_str()));
    if let Some(commit) = &index.commit {
        root.push_attribute(("commit", commit.as_str()));
    }
    if let Some(name) = &index.name {
        root.push_attribute(("name", name.as_str()));
    }
    writer.write_event(Event::Start(root))?;

    for category in index.categories.values().filter(|c| !c.is_empty()) {
        let mut element = BytesStart::new("category");
        element.push_attribute(("name", category.name()));
        writer.write_event(Event::Start(element))?;
        for package in category.packages() {
            write_package(&mut writer, package)?;
        }
        writer.write_event(Event::End(BytesEnd::new("category")))?;
    }

    if !index.metadata.is_empty() {
        write_metadata(&mut writer, &index.metadata)?;
    }

    writer.write_event(Event::End(BytesEnd::new("index")))?;

    let mut xml = String::from_utf8(writer.into_inner())
        .map_err(|e| IndexError::CorruptDocument(e.to_string()))?;
    xml.push('\n');
    Ok(xml)
}

fn write_package(writer: &mut XmlWriter, package: &Package) -> Result<()> {
    let mut element = BytesStart::new("reapack");
    element.push_attribute(("name", package.name()));
    if let Some(package_type) = package.package_type() {
        element.push_attribute(("type", package_type.as_str()));
    }
    if let Some(description) = package.description() {
        element.push_attribute(("desc", description));
    }

    if package.metadata().is_empty() && package.versions().is_empty() {
        writer.write_event(Event::Empty(element))?;
        return Ok(());
    }

    writer.write_event(Event::Start(element))?;
    if !package.metadata().is_empty() {
        write_metadata(writer, package.metadata())?;
    }
    for version in package.versions() {
        write_version(writer, version)?;
    }
    writer.write_event(Event::End(BytesEnd::new("reapack")))?;
    Ok(())
}

fn write_version(writer: &mut XmlWriter, version: &Version) -> Result<()> {
    let time = version.time().map(|t| t.format(TIME_FORMAT).to_string());
    let mut element = BytesStart::new("version");
    element.push_attribute(("name", version.name()));
    if let Some(author) = version.author() {
        element.push_attribute(("author", author));
    }
    if let Some(time) = &time {
        element.push_attribute(("time", time.as_str()));
    }

    if version.changelog().is_none() && version.sources().is_empty() {
        writer.write_event(Event::Empty(element))?;
        return Ok(());
    }

    writer.write_event(Event::Start(element))?;
    if let Some(changelog) = version.changelog() {
        write_text(writer, BytesStart::new("changelog"), changelog)?;
    }
    for source in version.sources() {
        write_source(writer, source)?;
    }
    writer.write_event(Event::End(BytesEnd::new("version")))?;
    Ok(())
}

fn write_source(writer: &mut XmlWriter, source: &Source) -> Result<()> {
    let main = source.main_attribute();
    let mut element = BytesStart::new("source");
    if source.platform != Platform::All {
        element.push_attribute(("platform", source.platform.as_str()));
    }
    if let Some(package_type) = source.package_type {
        element.push_attribute(("type", package_type.as_str()));
    }
    if let Some(file) = &source.file {
        element.push_attribute(("file", file.as_str()));
    }
    if let Some(main) = &main {
        element.push_attribute(("main", main.as_str()));
    }
    write_text(writer, element, &source.url)
}

fn write_metadata(writer: &mut XmlWriter, metadata: &Metadata) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("metadata")))?;
    for link in metadata.links() {
        let mut element = BytesStart::new("link");
        element.push_attribute(("rel", link.rel.as_str()));
        if link.name.is_some() {
            element.push_attribute(("href", link.href.as_str()));
        }
        write_text(writer, element, link.label())?;
    }
    if let Some(about) = metadata.about() {
        write_text(writer, BytesStart::new("description"), about)?;
    }
    writer.write_event(Event::End(BytesEnd::new("metadata")))?;
    Ok(())
}

fn write_text(writer: &mut XmlWriter, element: BytesStart<'_>, text: &str) -> Result<()> {
    let end = element.to_end().into_owned();
    writer.write_event(Event::Start(element))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(end))?;
    Ok(())
}

pub(super) fn read(xml: &str) -> Result<Index> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut builder = Builder::default();
    loop {
        match reader.read_event()? {
            Event::Start(element) => builder.open(&element)?,
            Event::Empty(element) => {
                builder.open(&element)?;
                builder.close(element.name().as_ref())?;
            }
            Event::End(element) => builder.close(element.name().as_ref())?,
            Event::Text(text) => builder.text.push_str(&text.unescape()?),
            Event::CData(data) => builder
                .text
                .push_str(&String::from_utf8_lossy(&data.into_inner())),
            Event::Eof => break,
            _ => {}
        }
    }

    builder.finish()
}

fn corrupt(message: impl Into<String>) -> IndexError {
    IndexError::CorruptDocument(message.into())
}

/// Assembles the document tree from reader events.
#[derive(Default)]
struct Builder {
    index: Option<Index>,
    finished: bool,
    category: Option<Category>,
    package: Option<Package>,
    version: Option<Version>,
    source: Option<Source>,
    link: Option<(LinkRel, Option<String>)>,
    in_metadata: bool,
    text: String,
}

impl Builder {
    fn open(&mut self, element: &BytesStart<'_>) -> Result<()> {
        let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
        let mut attrs = attributes(element)?;
        self.text.clear();

        match name.as_str() {
            "index" if self.index.is_none() && !self.finished => {
                let mut index = Index::new();
                if let Some(version) = attrs.remove("version") {
                    index.version = version
                        .parse()
                        .map_err(|_| corrupt(format!("invalid format version '{version}'")))?;
                }
                index.commit = attrs.remove("commit");
                index.name = attrs.remove("name");
                self.index = Some(index);
            }
            "category" if self.index.is_some() && self.category.is_none() && !self.in_metadata => {
                let name = required(&mut attrs, "category", "name")?;
                self.category = Some(Category::new(&name));
            }
            "reapack" if self.category.is_some() && self.package.is_none() => {
                let name = required(&mut attrs, "reapack", "name")?;
                let mut package = Package::new(&name).map_err(|e| corrupt(e.to_string()))?;
                let package_type = attrs
                    .remove("type")
                    .map(|t| parse_enum::<PackageType>("type", &t))
                    .transpose()?;
                package.set_loaded(package_type, attrs.remove("desc"));
                self.package = Some(package);
            }
            "metadata"
                if !self.in_metadata
                    && self.version.is_none()
                    && (self.package.is_some() || (self.index.is_some() && self.category.is_none())) =>
            {
                self.in_metadata = true;
            }
            "link" if self.in_metadata && self.link.is_none() => {
                let rel = required(&mut attrs, "link", "rel")?;
                self.link = Some((parse_enum::<LinkRel>("rel", &rel)?, attrs.remove("href")));
            }
            "description" if self.in_metadata => {}
            "version" if self.package.is_some() && self.version.is_none() && !self.in_metadata => {
                let name = required(&mut attrs, "version", "name")?;
                let time = attrs.remove("time").map(|t| parse_time(&t)).transpose()?;
                let mut version = Version::new(&name);
                version.set_loaded(attrs.remove("author"), time, None);
                self.version = Some(version);
            }
            "changelog" if self.version.is_some() && self.source.is_none() => {}
            "source" if self.version.is_some() && self.source.is_none() => {
                let mut source = Source::new(String::new());
                if let Some(platform) = attrs.remove("platform") {
                    source.platform = parse_enum("platform", &platform)?;
                }
                source.package_type = attrs
                    .remove("type")
                    .map(|t| parse_enum::<PackageType>("type", &t))
                    .transpose()?;
                source.file = attrs.remove("file");
                if let Some(main) = attrs.remove("main") {
                    source.sections = main
                        .split_whitespace()
                        .map(|s| parse_enum::<Section>("main", s))
                        .collect::<Result<_>>()?;
                }
                self.source = Some(source);
            }
            other => return Err(corrupt(format!("unexpected element <{other}>"))),
        }

        if let Some(extra) = attrs.keys().next() {
            return Err(corrupt(format!("unknown attribute '{extra}' on <{name}>")));
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) -> Result<()> {
        let text = std::mem::take(&mut self.text).trim().to_string();

        match name {
            b"source" => {
                let mut source = self.source.take().ok_or_else(|| corrupt("stray </source>"))?;
                source.url = text;
                self.version_mut()?.push_loaded_source(source);
            }
            b"changelog" => {
                let version = self.version_mut()?;
                let (author, time) = (version.author().map(str::to_string), version.time());
                version.set_loaded(author, time, Some(text).filter(|t| !t.is_empty()));
            }
            b"version" => {
                let version = self.version.take().ok_or_else(|| corrupt("stray </version>"))?;
                self.package
                    .as_mut()
                    .ok_or_else(|| corrupt("version outside of a package"))?
                    .push_loaded_version(version);
            }
            b"link" => {
                let (rel, href) = self.link.take().ok_or_else(|| corrupt("stray </link>"))?;
                let link = match href {
                    Some(href) => Link::new(rel, Some(text).filter(|t| !t.is_empty()), href),
                    None => Link::new(rel, None, text),
                };
                self.metadata_mut()?.push_loaded(link);
            }
            b"description" => {
                if !text.is_empty() {
                    self.metadata_mut()?.set_loaded_about(text);
                }
            }
            b"metadata" => self.in_metadata = false,
            b"reapack" => {
                let package = self.package.take().ok_or_else(|| corrupt("stray </reapack>"))?;
                self.category
                    .as_mut()
                    .ok_or_else(|| corrupt("package outside of a category"))?
                    .insert_package(package);
            }
            b"category" => {
                let category = self.category.take().ok_or_else(|| corrupt("stray </category>"))?;
                self.index
                    .as_mut()
                    .ok_or_else(|| corrupt("category outside of the index"))?
                    .categories
                    .insert(category.name().to_string(), category);
            }
            b"index" => self.finished = true,
            _ => {}
        }
        Ok(())
    }

    fn version_mut(&mut self) -> Result<&mut Version> {
        self.version
            .as_mut()
            .ok_or_else(|| corrupt("element outside of a version"))
    }

    fn metadata_mut(&mut self) -> Result<&mut Metadata> {
        match (&mut self.package, &mut self.index) {
            (Some(package), _) => Ok(package.metadata_mut()),
            (None, Some(index)) => Ok(&mut index.metadata),
            (None, None) => Err(corrupt("metadata outside of the index")),
        }
    }

    fn finish(self) -> Result<Index> {
        match self.index {
            Some(index) if self.finished => Ok(index),
            _ => Err(corrupt("missing <index> root element")),
        }
    }
}

fn attributes(element: &BytesStart<'_>) -> Result<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    for attr in element.attributes() {
        let attr = attr.map_err(|e| corrupt(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        map.insert(key, value);
    }
    Ok(map)
}

fn required(attrs: &mut BTreeMap<String, String>, element: &str, name: &str) -> Result<String> {
    attrs
        .remove(name)
        .ok_or_else(|| corrupt(format!("<{element}> is missing its '{name}' attribute")))
}

fn parse_enum<T: FromStr>(attribute: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| corrupt(format!("invalid {attribute} '{value}'")))
}

fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| corrupt(format!("invalid time '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<index version="1" commit="399f5609cff3e6fd92b5542d444fbf86da0443c6" name="Test &amp; Co">
  <category name="Category">
    <reapack name="script.lua" type="script" desc="Hello World">
      <metadata>
        <link rel="website">https://example.com</link>
        <description>About this script</description>
      </metadata>
      <version name="1.0" author="cfillion" time="2016-02-12T01:16:40Z">
        <changelog>Fixed &lt;things&gt;</changelog>
        <source main="main">https://example.com/script.lua</source>
        <source platform="windows" file="../Resources/unicode.dat">https://example.com/Resources/unicode.dat</source>
      </version>
    </reapack>
  </category>
  <metadata>
    <link rel="donation" href="https://paypal.me/x">Donate</link>
  </metadata>
</index>
"#;

    #[test]
    fn test_read_document() {
        let index = read(DOCUMENT).unwrap();
        assert_eq!(index.version, 1);
        assert_eq!(index.name.as_deref(), Some("Test & Co"));

        let package = index.category("Category").unwrap().package("script.lua").unwrap();
        assert_eq!(package.description(), Some("Hello World"));
        assert_eq!(package.metadata().about(), Some("About this script"));

        let version = &package.versions()[0];
        assert_eq!(version.changelog(), Some("Fixed <things>"));
        assert_eq!(version.sources().len(), 2);
        assert_eq!(version.sources()[0].sections, vec![Section::Main]);
        assert_eq!(version.sources()[1].platform, Platform::Windows);

        let link = index.metadata.links().next().unwrap();
        assert_eq!(link.name.as_deref(), Some("Donate"));
        assert_eq!(link.href, "https://paypal.me/x");
    }

    #[test]
    fn test_write_matches_document() {
        let index = read(DOCUMENT).unwrap();
        assert_eq!(write(&index).unwrap(), DOCUMENT);
    }

    #[test]
    fn test_empty_index() {
        let index = Index::new();
        let xml = write(&index).unwrap();
        let reread = read(&xml).unwrap();
        assert_eq!(write(&reread).unwrap(), xml);
    }

    #[test]
    fn test_corrupt_documents() {
        for xml in [
            "",
            "<category name=\"x\"/>",
            "<index version=\"x\"/>",
            "<index><bogus/></index>",
            "<index><category/></index>",
            "<index><category name=\"a\"><reapack name=\"a.lua\" type=\"nope\"/></category></index>",
        ] {
            assert!(read(xml).is_err(), "accepted {xml:?}");
        }
    }
}
