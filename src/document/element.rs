//! Block-level content of a document body or table cell.

use super::{Paragraph, Table};

/// A block in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyElement {
    Paragraph(Paragraph),
    Table(Table),
    /// Block markup carried through unchanged (section properties,
    /// content controls, bookmarks between blocks)
    Raw(String),
}

impl BodyElement {
    #[inline]
    pub fn is_paragraph(&self) -> bool {
        matches!(self, BodyElement::Paragraph(_))
    }

    #[inline]
    pub fn is_table(&self) -> bool {
        matches!(self, BodyElement::Table(_))
    }

    #[inline]
    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            BodyElement::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    #[inline]
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            BodyElement::Table(t) => Some(t),
            _ => None,
        }
    }
}
