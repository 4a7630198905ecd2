//! Error types for docalign.

use std::io;
use thiserror::Error;

/// Result type alias for docalign operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while decomposing or aligning a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is neither a PDF nor a word-processor document.
    #[error("Unknown file format: {0}")]
    UnknownFormat(String),

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// The PDF structure is corrupted or malformed.
    #[error("Corrupted PDF structure: {0}")]
    Corrupted(String),

    /// Error decoding or persisting an embedded image.
    #[error("Image extraction error: {0}")]
    ImageExtract(String),

    /// Error rasterising a vector region.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Error reading a word-processor document.
    #[error("DOCX error: {0}")]
    Docx(String),

    /// A text chunk violated its invariants.
    #[error("Invalid text chunk: {0}")]
    InvalidChunk(String),

    /// An image asset violated its invariants.
    #[error("Invalid image asset: {0}")]
    InvalidAsset(String),

    /// The document produced no text at all.
    #[error("Could not extract text from the document")]
    EmptyDocument,

    /// No API credential was configured for the external services.
    #[error("Missing API credential: set {0}")]
    MissingCredential(&'static str),

    /// An external service failed terminally.
    #[error("Service error: {0}")]
    Service(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Docx(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::ImageExtract(err.to_string())
    }
}
