//! Error types for the kbacheck-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the kbacheck library.
#[derive(Error, Debug)]
pub enum KbaError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// A tire size or code did not have the expected shape.
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// Code glossary persistence error.
    #[error("glossary error: {0}")]
    Glossary(#[from] GlossaryError),

    /// External classifier error.
    #[error("external service error: {0}")]
    External(#[from] ExternalServiceError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
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

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),

    /// The first page carries no KBA/ABE markers.
    #[error("not a KBA/ABE approval document")]
    NotApprovalDocument,
}

/// A value that does not match its expected shape.
///
/// These never abort a document; they end up as warnings on the affected record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Tire size is not in `WWW/AARDD` form.
    #[error("invalid tire size: {0}")]
    TireSize(String),
}

/// Errors reading or writing the persisted code glossary.
#[derive(Error, Debug)]
pub enum GlossaryError {
    /// The store could not be read.
    #[error("failed to read glossary store {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store could not be written.
    #[error("failed to write glossary store {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store content is not a valid glossary document.
    #[error("corrupt glossary data: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// A template document could not be stored or read.
    #[error("template error: {0}")]
    Template(String),
}

/// Errors from the optional AI classifier.
///
/// Always recovered by the caller through the rule-based path.
#[derive(Error, Debug)]
pub enum ExternalServiceError {
    /// The classifier is not enabled in the configuration.
    #[error("classifier disabled")]
    Disabled,

    /// No API key found in the configured environment variable.
    #[error("missing API key (env {0})")]
    MissingApiKey(String),

    /// Transport failure, including timeouts.
    #[error("request failed: {0}")]
    Request(String),

    /// Non-success HTTP status.
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response did not have the expected JSON shape.
    #[error("unexpected response: {0}")]
    Response(String),
}

/// Result type for the kbacheck library.
pub type Result<T> = std::result::Result<T, KbaError>;
