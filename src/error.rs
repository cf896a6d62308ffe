//! Error types for epub-tidy.

use std::io;
use thiserror::Error;

/// Result type alias for epub-tidy operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for epub-tidy.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// ZIP archive parsing or writing error.
    #[error("ZIP archive error: {0}")]
    ZipArchive(String),

    /// XML parsing error in container.xml or the OPF package.
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// Invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Required archive entry or package element is missing.
    #[error("Missing required component: {0}")]
    MissingComponent(String),

    /// Text encoding error.
    #[error("Text encoding error: {0}")]
    Encoding(String),

    /// The cleaner failed unexpectedly on a document.
    #[error("Cleaning failed: {0}")]
    Cleaning(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipArchive(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Error::Encoding(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Error::Encoding(err.to_string())
    }
}
