//! Error types for the quotegen-core library.

use thiserror::Error;

/// Main error type for the quotegen library.
#[derive(Error, Debug)]
pub enum QuoteError {
    /// Reference PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Template loading or rendering error.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Signature image could not be decoded or re-encoded.
    #[error("signature image error: {0}")]
    Image(#[from] image::ImageError),

    /// Output archive could not be written.
    #[error("packaging error: {0}")]
    Package(#[from] PackageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to reference PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Errors related to the DOCX template.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// The template is not a readable ZIP container.
    #[error("invalid template archive: {0}")]
    Archive(String),

    /// A required package part is absent.
    #[error("template is missing part {0}")]
    MissingPart(String),

    /// A package part is not well-formed XML.
    #[error("malformed XML in {part}: {reason}")]
    Xml { part: String, reason: String },

    /// Substituted text holds a character XML 1.0 cannot represent.
    #[error("{context} contains U+{code:04X}, which is not allowed in XML")]
    InvalidCharacter { context: String, code: u32 },

    /// The document tree lacks structure the renderer relies on.
    #[error("unexpected template structure: {0}")]
    Structure(String),
}

/// Errors related to writing the output archive.
#[derive(Error, Debug)]
pub enum PackageError {
    /// The ZIP writer rejected an entry or failed to finish.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Writing entry bytes failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the quotegen library.
pub type Result<T> = std::result::Result<T, QuoteError>;
