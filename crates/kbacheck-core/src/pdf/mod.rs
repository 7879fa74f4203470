//! PDF processing module.

mod extractor;

pub use extractor::{PdfContent, PdfExtractor, PdfPage};

use tracing::debug;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Phrases identifying a KBA/ABE approval document (lower case).
pub const APPROVAL_MARKERS: [&str; 5] = [
    "kraftfahrt-bundesamt",
    "abe",
    "allgemeine betriebserlaubnis",
    "typgenehmigung",
    "gutachten",
];

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract text from the entire PDF, pages joined with `\n`.
    fn extract_text(&self) -> Result<String>;

    /// Extract text from a specific page (1-indexed).
    fn extract_page_text(&self, page: u32) -> Result<String>;
}

/// Extract the text of a PDF document.
pub fn extract_pdf_text(data: &[u8]) -> Result<String> {
    let mut extractor = PdfExtractor::new();
    extractor.load(data)?;
    extractor.extract_text()
}

/// Check whether the first page looks like an approval document.
///
/// Any extraction failure counts as "no".
pub fn is_approval_document(data: &[u8]) -> bool {
    let mut extractor = PdfExtractor::new();
    let first_page = extractor
        .load(data)
        .and_then(|_| extractor.extract_page_text(1));

    match first_page {
        Ok(text) => has_approval_marker(&text),
        Err(e) => {
            debug!("Validity check failed: {}", e);
            false
        }
    }
}

/// Case-insensitive marker check on already extracted text.
pub fn has_approval_marker(text: &str) -> bool {
    let text = text.to_lowercase();
    APPROVAL_MARKERS.iter().any(|marker| text.contains(marker))
}
