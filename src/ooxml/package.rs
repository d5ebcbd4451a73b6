//! In-memory OPC package.
//!
//! A package is an ordered list of named parts read from (and written back
//! to) a ZIP archive. Parts the crate does not understand are carried
//! through untouched, so a document can be edited and saved without losing
//! headers, images or anything else the archive holds.

use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;
use std::io::{Cursor, Read, Seek, Write};

use quick_xml::Reader;
use quick_xml::events::Event;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::ZipArchive;

use super::constants::{content_type as ct, namespace, part_name, relationship_type};
use crate::common::error::{Error, Result};
use crate::common::xml::{escape_xml, unescape_xml};

#[derive(Debug, Clone)]
struct PackagePart {
    name: String,
    data: Vec<u8>,
}

/// Ordered collection of package parts.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<PackagePart>,
}

impl Package {
    /// Create an empty package.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every part of a ZIP archive held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Read every part of a ZIP archive.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().trim_start_matches('/').to_string();
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            parts.push(PackagePart { name, data });
        }
        tracing::debug!(parts = parts.len(), "read package");
        Ok(Self { parts })
    }

    /// Raw bytes of a part.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        let name = name.trim_start_matches('/');
        self.parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.data.as_slice())
    }

    /// A part decoded as UTF-8, or `None` if it is missing or not UTF-8.
    pub fn part_str(&self, name: &str) -> Option<&str> {
        self.part(name).and_then(|data| std::str::from_utf8(data).ok())
    }

    /// A part decoded as UTF-8, failing with [`Error::ComponentNotFound`].
    pub fn require_part_str(&self, name: &str) -> Result<&str> {
        let data = self
            .part(name)
            .ok_or_else(|| Error::ComponentNotFound(name.to_string()))?;
        let text = std::str::from_utf8(data).map_err(|e| Error::XmlError(e.to_string()))?;
        // Skip a UTF-8 BOM if present
        Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
    }

    /// Whether the package holds a part of this name.
    pub fn contains(&self, name: &str) -> bool {
        self.part(name).is_some()
    }

    /// Part names in archive order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    /// Replace a part's content, appending the part if it is new.
    pub fn set_part(&mut self, name: &str, data: impl Into<Vec<u8>>) {
        let name = name.trim_start_matches('/');
        let data = data.into();
        match self.parts.iter_mut().find(|p| p.name == name) {
            Some(part) => part.data = data,
            None => self.parts.push(PackagePart {
                name: name.to_string(),
                data,
            }),
        }
    }

    /// Name of the main document part.
    ///
    /// Follows the package-level `officeDocument` relationship and falls
    /// back to `default` when the package has no usable relationship.
    pub fn main_part_name(&self, default: &str) -> Result<String> {
        let Some(rels) = self.part_str(part_name::PACKAGE_RELS) else {
            return Ok(default.to_string());
        };
        Ok(parse_relationships(rels)?
            .into_iter()
            .find(|r| r.rel_type == relationship_type::OFFICE_DOCUMENT)
            .map(|r| resolve_target("", &r.target))
            .unwrap_or_else(|| default.to_string()))
    }

    /// Relationships of a part, read from its `_rels/<name>.rels` sibling.
    pub fn part_relationships(&self, name: &str) -> Result<Vec<Relationship>> {
        match self.part_str(&rels_name_for(name)) {
            Some(xml) => parse_relationships(xml),
            None => Ok(Vec::new()),
        }
    }

    /// Write every part, in order, to a deflated ZIP archive.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        for part in &self.parts {
            writer.start_file(part.name.as_str(), options)?;
            writer.write_all(&part.data)?;
        }
        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }
}

/// One entry of a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
}

/// Parse the `Relationship` elements of a `.rels` part.
pub fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(xml);
    let mut rels = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(ref e) | Event::Empty(ref e)
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut rel = Relationship {
                    id: String::new(),
                    rel_type: String::new(),
                    target: String::new(),
                };
                for attr in e.attributes().flatten() {
                    let value = unescape_xml(&String::from_utf8_lossy(&attr.value));
                    match attr.key.local_name().as_ref() {
                        b"Id" => rel.id = value,
                        b"Type" => rel.rel_type = value,
                        b"Target" => rel.target = value,
                        _ => {},
                    }
                }
                rels.push(rel);
            },
            Event::Eof => break,
            _ => {},
        }
    }

    Ok(rels)
}

/// Resolve a relationship target against the directory of its source part.
///
/// Absolute targets are taken from the package root. `..` segments are
/// folded.
pub fn resolve_target(base_dir: &str, target: &str) -> String {
    let joined = if let Some(absolute) = target.strip_prefix('/') {
        absolute.to_string()
    } else if base_dir.is_empty() {
        target.to_string()
    } else {
        format!("{}/{}", base_dir.trim_end_matches('/'), target)
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {},
            ".." => {
                segments.pop();
            },
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Directory part of a part name, without the trailing slash.
pub fn part_dir(name: &str) -> &str {
    name.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Name of the `.rels` part describing `name`.
pub fn rels_name_for(name: &str) -> String {
    match name.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", name),
    }
}

/// Builder for a `.rels` part.
#[derive(Debug, Default)]
pub struct RelationshipsWriter {
    rels: Vec<Relationship>,
}

impl RelationshipsWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a relationship and return its generated `rIdN` id.
    pub fn add(&mut self, rel_type: &str, target: &str) -> String {
        let id = format!("rId{}", self.rels.len() + 1);
        self.rels.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
        });
        id
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.rels.len() * 160);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        let _ = write!(xml, r#"<Relationships xmlns="{}">"#, namespace::OPC_RELATIONSHIPS);
        for rel in &self.rels {
            let _ = write!(
                xml,
                r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
                escape_xml(&rel.id),
                escape_xml(&rel.rel_type),
                escape_xml(&rel.target)
            );
        }
        xml.push_str("</Relationships>");
        xml
    }
}

/// Builder for `[Content_Types].xml`.
///
/// `rels` and `xml` defaults are always present; everything else is an
/// override keyed by part name.
#[derive(Debug)]
pub struct ContentTypes {
    defaults: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
}

impl Default for ContentTypes {
    fn default() -> Self {
        let mut defaults = BTreeMap::new();
        defaults.insert("rels".to_string(), ct::OPC_RELATIONSHIPS.to_string());
        defaults.insert("xml".to_string(), ct::XML.to_string());
        Self {
            defaults,
            overrides: BTreeMap::new(),
        }
    }
}

impl ContentTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the content type of a part.
    pub fn add_override(&mut self, part: &str, content_type: &str) {
        self.overrides.insert(
            format!("/{}", part.trim_start_matches('/')),
            content_type.to_string(),
        );
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(512 + self.overrides.len() * 160);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        let _ = write!(xml, r#"<Types xmlns="{}">"#, namespace::OPC_CONTENT_TYPES);
        for (ext, content_type) in &self.defaults {
            let _ = write!(
                xml,
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape_xml(ext),
                escape_xml(content_type)
            );
        }
        for (part, content_type) in &self.overrides {
            let _ = write!(
                xml,
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_xml(part),
                escape_xml(content_type)
            );
        }
        xml.push_str("</Types>");
        xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_keeps_order_and_content() {
        let mut pkg = Package::new();
        pkg.set_part("[Content_Types].xml", "<Types/>");
        pkg.set_part("/word/document.xml", "<w:document/>");
        pkg.set_part("word/media/image1.png", vec![0x89, b'P', b'N', b'G']);

        let bytes = pkg.to_bytes().unwrap();
        let back = Package::from_bytes(&bytes).unwrap();
        let names: Vec<_> = back.part_names().collect();
        assert_eq!(
            names,
            vec!["[Content_Types].xml", "word/document.xml", "word/media/image1.png"]
        );
        assert_eq!(back.part_str("word/document.xml"), Some("<w:document/>"));
        assert_eq!(back.part("word/media/image1.png").unwrap()[0], 0x89);
    }

    #[test]
    fn test_set_part_replaces_in_place() {
        let mut pkg = Package::new();
        pkg.set_part("a.xml", "1");
        pkg.set_part("b.xml", "2");
        pkg.set_part("a.xml", "3");
        assert_eq!(pkg.part_names().collect::<Vec<_>>(), vec!["a.xml", "b.xml"]);
        assert_eq!(pkg.part_str("a.xml"), Some("3"));
    }

    #[test]
    fn test_missing_part_is_component_not_found() {
        let pkg = Package::new();
        assert!(matches!(
            pkg.require_part_str("word/document.xml"),
            Err(Error::ComponentNotFound(_))
        ));
    }

    #[test]
    fn test_not_a_zip() {
        assert!(matches!(
            Package::from_bytes(b"definitely not a zip archive"),
            Err(Error::ZipError(_))
        ));
    }

    #[test]
    fn test_main_part_from_relationships() {
        let mut rels = RelationshipsWriter::new();
        rels.add(relationship_type::OFFICE_DOCUMENT, "/word/main.xml");
        let mut pkg = Package::new();
        pkg.set_part(part_name::PACKAGE_RELS, rels.to_xml());
        assert_eq!(pkg.main_part_name("word/document.xml").unwrap(), "word/main.xml");

        let empty = Package::new();
        assert_eq!(empty.main_part_name("word/document.xml").unwrap(), "word/document.xml");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("xl", "worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(resolve_target("xl", "/xl/styles.xml"), "xl/styles.xml");
        assert_eq!(resolve_target("xl/worksheets", "../media/a.png"), "xl/media/a.png");
        assert_eq!(part_dir("xl/workbook.xml"), "xl");
        assert_eq!(rels_name_for("xl/workbook.xml"), "xl/_rels/workbook.xml.rels");
    }

    #[test]
    fn test_content_types_xml() {
        let mut ct_xml = ContentTypes::new();
        ct_xml.add_override("word/document.xml", ct::WML_DOCUMENT_MAIN);
        let xml = ct_xml.to_xml();
        assert!(xml.contains(r#"<Default Extension="rels""#));
        assert!(xml.contains(r#"<Override PartName="/word/document.xml""#));
    }
}
