//! Word (.docx) codec.
//!
//! Only the main document part is decoded. The rest of the package, and the
//! markup around the body, is carried in a [`DocxContainer`] and written back
//! unchanged.

pub(crate) mod reader;
pub(crate) mod writer;

use tracing::debug;

use crate::common::{FileFormat, Result};
use crate::document::{Document, DocumentCodec};
use crate::ooxml::constants::{content_type, part_name, relationship_type};
use crate::ooxml::package::{ContentTypes, Package, RelationshipsWriter};

/// Main part used when the package relationships do not name one.
pub const DEFAULT_MAIN_PART: &str = "word/document.xml";

/// The package a document was loaded from.
#[derive(Debug, Clone)]
pub struct DocxContainer {
    pub(crate) package: Package,
    pub(crate) main_part: String,
    /// Main part markup through the body start tag
    pub(crate) prefix: String,
    /// Main part markup from the body end tag on
    pub(crate) suffix: String,
}

impl DocxContainer {
    /// Name of the main document part inside the package.
    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    pub fn package(&self) -> &Package {
        &self.package
    }
}

/// Codec for WordprocessingML packages.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxCodec;

impl DocumentCodec for DocxCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Document> {
        let package = Package::from_bytes(bytes)?;
        let main_part = package.main_part_name(DEFAULT_MAIN_PART)?;
        let decoded = reader::read_document(package.require_part_str(&main_part)?)?;
        debug!(part = %main_part, blocks = decoded.body.len(), "decoded docx body");

        let mut document = Document::from_body(FileFormat::Docx, decoded.body);
        document.container = Some(DocxContainer {
            package,
            main_part,
            prefix: decoded.prefix,
            suffix: decoded.suffix,
        });
        Ok(document)
    }

    fn encode(&self, document: &Document) -> Result<Vec<u8>> {
        match &document.container {
            Some(container) => {
                let mut xml = container.prefix.clone();
                writer::write_blocks(&document.body, &mut xml);
                xml.push_str(&container.suffix);

                let mut package = container.package.clone();
                package.set_part(&container.main_part, xml);
                package.to_bytes()
            },
            None => fresh_package(document).to_bytes(),
        }
    }
}

/// A minimal package for a document that was not loaded from a .docx file.
fn fresh_package(document: &Document) -> Package {
    let mut xml = writer::fresh_prefix();
    writer::write_blocks(&document.body, &mut xml);
    xml.push_str(writer::FRESH_SUFFIX);

    let mut content_types = ContentTypes::new();
    content_types.add_override(DEFAULT_MAIN_PART, content_type::WML_DOCUMENT_MAIN);
    let mut rels = RelationshipsWriter::new();
    rels.add(relationship_type::OFFICE_DOCUMENT, DEFAULT_MAIN_PART);

    let mut package = Package::new();
    package.set_part(part_name::CONTENT_TYPES, content_types.to_xml());
    package.set_part(part_name::PACKAGE_RELS, rels.to_xml());
    package.set_part(DEFAULT_MAIN_PART, xml);
    package
}
