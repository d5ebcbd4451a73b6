//! XML text helpers shared by the OOXML codecs.

pub mod escape;
pub(crate) mod span;

pub use escape::{escape_xml, unescape_xml};
pub(crate) use span::{SpanReader, attribute};
