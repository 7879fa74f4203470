//! PDF text extraction using lopdf and pdf-extract.

use lopdf::Document;
use tracing::{debug, trace, warn};

use super::{PdfProcessor, Result};
use crate::error::PdfError;

/// PDF text extractor using lopdf, with pdf-extract as fallback.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

/// Extracted content from a PDF.
#[derive(Debug, Clone)]
pub struct PdfContent {
    /// Full text, pages joined with `\n`.
    pub text: String,
    /// Pages in document order.
    pub pages: Vec<PdfPage>,
}

/// Text of a single PDF page.
#[derive(Debug, Clone)]
pub struct PdfPage {
    /// Page number (1-indexed).
    pub number: u32,
    /// Extracted text from this page.
    pub text: String,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
        }
    }

    /// Extract the text of every page.
    pub fn extract_all(&self) -> Result<PdfContent> {
        let doc = self.document()?;
        let page_count = self.page_count();

        let mut pages: Vec<PdfPage> = (1..=page_count)
            .map(|number| PdfPage {
                number,
                text: lopdf_page_text(doc, number).unwrap_or_default(),
            })
            .collect();

        if pages.iter().all(|p| p.text.trim().is_empty()) {
            debug!("lopdf found no text, trying pdf-extract");
            pages = self
                .fallback_pages()?
                .into_iter()
                .zip(1..)
                .map(|(text, number)| PdfPage { number, text })
                .collect();
        }

        let text = pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        debug!("Extracted {} chars from {} pages", text.len(), pages.len());
        Ok(PdfContent { text, pages })
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("No document loaded".to_string()))
    }

    fn fallback_pages(&self) -> Result<Vec<String>> {
        pdf_extract::extract_text_from_mem_by_pages(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn lopdf_page_text(doc: &Document, page: u32) -> Option<String> {
    match doc.extract_text(&[page]) {
        Ok(text) => Some(text),
        Err(e) => {
            trace!("lopdf could not extract page {}: {}", page, e);
            None
        }
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract needs the decrypted bytes
            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_text(&self) -> Result<String> {
        self.extract_all().map(|content| content.text)
    }

    fn extract_page_text(&self, page: u32) -> Result<String> {
        let doc = self.document()?;
        if page == 0 || page > self.page_count() {
            return Err(PdfError::InvalidPage(page));
        }

        if let Some(text) = lopdf_page_text(doc, page).filter(|t| !t.trim().is_empty()) {
            return Ok(text);
        }

        let mut pages = self.fallback_pages()?;
        let index = (page - 1) as usize;
        if index >= pages.len() {
            warn!("pdf-extract returned {} pages, page {} missing", pages.len(), page);
            return Ok(String::new());
        }
        Ok(pages.swap_remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_extractor_new() {
        let extractor = PdfExtractor::new();
        assert!(extractor.document.is_none());
        assert_eq!(extractor.page_count(), 0);
    }

    #[test]
    fn test_extract_without_document() {
        let extractor = PdfExtractor::new();
        assert!(matches!(extractor.extract_text(), Err(PdfError::Parse(_))));
        assert!(matches!(extractor.extract_page_text(1), Err(PdfError::Parse(_))));
    }
}
