//! PDF processing module.

mod extractor;

pub use extractor::PdfExtractor;

use crate::error::PdfError;
use crate::models::config::TextLayout;
use crate::models::document::{DocumentContent, DocumentPages};

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Positioned text elements of every page, in content-stream order.
    fn extract_pages(&self) -> Result<DocumentPages>;

    /// Positioned text elements of a single page.
    fn extract_page(&self, page: u32) -> Result<DocumentPages>;

    /// Delimited text of the whole document.
    fn extract_text(&self, layout: &TextLayout) -> Result<String> {
        Ok(self.extract_pages()?.render_text(layout))
    }
}

/// Load a PDF and return both views the extractors need.
pub fn load_document(data: &[u8], layout: &TextLayout) -> Result<DocumentContent> {
    let mut extractor = PdfExtractor::new();
    extractor.load(data)?;
    let pages = extractor.extract_pages()?;
    Ok(DocumentContent::from_pages(pages, layout))
}
