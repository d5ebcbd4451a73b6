//! Error conversion implementations.
//!
//! From impls that lift internal and third-party errors into [`Error`].

use super::types::Error;
use crate::common::binary::BinaryError;
use crate::ole::OleError;

impl From<OleError> for Error {
    fn from(err: OleError) -> Self {
        match err {
            OleError::Io(e) => Error::Io(e),
            OleError::InvalidFormat(s) => Error::InvalidFormat(s),
            OleError::InvalidData(s) => Error::CorruptedFile(s),
            OleError::NotOleFile => Error::NotOfficeFile,
            OleError::CorruptedFile(s) => Error::CorruptedFile(s),
            OleError::StreamNotFound(name) => Error::ComponentNotFound(name),
        }
    }
}

impl From<BinaryError> for Error {
    fn from(err: BinaryError) -> Self {
        Error::CorruptedFile(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlError(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlError(err.to_string())
    }
}

impl From<quick_xml::encoding::EncodingError> for Error {
    fn from(err: quick_xml::encoding::EncodingError) -> Self {
        Error::XmlError(err.to_string())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipError(err.to_string())
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Configuration(err.to_string())
    }
}

impl From<aho_corasick::BuildError> for Error {
    fn from(err: aho_corasick::BuildError) -> Self {
        Error::Configuration(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Error::XmlError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ole_errors_map_to_unified_kinds() {
        assert!(matches!(Error::from(OleError::NotOleFile), Error::NotOfficeFile));
        let err = Error::from(OleError::StreamNotFound("WordDocument".to_string()));
        assert!(matches!(err, Error::ComponentNotFound(ref s) if s == "WordDocument"));
    }

    #[test]
    fn test_regex_error_is_configuration() {
        let err = regex::Regex::new("(").unwrap_err();
        assert!(matches!(Error::from(err), Error::Configuration(_)));
    }
}
