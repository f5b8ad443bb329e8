//! Positioned text extraction from PDF content streams using lopdf.

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, trace, warn};

use super::{PdfProcessor, Result};
use crate::error::PdfError;
use crate::models::document::{DocumentPages, PdfDataPage};

/// Average glyph advance as a fraction of the font size.
const GLYPH_WIDTH: f32 = 0.5;

/// 2D affine transform `[a b c d e f]`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f32; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn translation(tx: f32, ty: f32) -> Self {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// `self` applied first, then `other`.
    fn then(&self, other: &Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a * a2 + b * c2,
            a * b2 + b * d2,
            c * a2 + d * c2,
            c * b2 + d * d2,
            e * a2 + f * c2 + e2,
            e * b2 + f * d2 + f2,
        ])
    }

    fn origin(&self) -> (f32, f32) {
        (self.0[4], self.0[5])
    }

    fn vertical_scale(&self) -> f32 {
        (self.0[2] * self.0[2] + self.0[3] * self.0[3]).sqrt()
    }

    fn horizontal_scale(&self) -> f32 {
        (self.0[0] * self.0[0] + self.0[1] * self.0[1]).sqrt()
    }
}

/// Graphics and text state tracked while walking a content stream.
#[derive(Debug, Clone)]
struct TextState {
    ctm: Matrix,
    text_matrix: Matrix,
    line_matrix: Matrix,
    font_size: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            font_size: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn next_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).then(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    /// Emit a text run at the current position and advance past it.
    fn show(&mut self, page: &mut PdfDataPage, text: String) {
        let rendering = self.text_matrix.then(&self.ctm);
        let (x, baseline) = rendering.origin();
        let h = self.font_size * rendering.vertical_scale();
        let advance = text.chars().count() as f32 * self.font_size * GLYPH_WIDTH;
        let w = advance * rendering.horizontal_scale();
        self.text_matrix = Matrix::translation(advance, 0.0).then(&self.text_matrix);

        if text.trim().is_empty() {
            return;
        }
        trace!("Text run {:?} at ({}, {})", text, x, baseline);
        page.push_element(text, x, baseline - h, w, h);
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn numbers<const N: usize>(operands: &[Object]) -> Option<[f32; N]> {
    if operands.len() < N {
        return None;
    }
    let mut values = [0.0; N];
    for (slot, operand) in values.iter_mut().zip(operands) {
        *slot = number(operand)?;
    }
    Some(values)
}

/// Decode a PDF string: UTF-16BE with a byte-order mark, otherwise Latin-1.
fn decode_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}

fn string_operand(operands: &[Object]) -> Option<String> {
    operands.iter().rev().find_map(|operand| match operand {
        Object::String(bytes, _) => Some(decode_string(bytes)),
        _ => None,
    })
}

/// PDF positioned-text extractor using lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self { document: None }
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or(PdfError::Parse("No document loaded".to_string()))
    }

    /// Walk one page's content stream, collecting text runs.
    fn page_elements(&self, doc: &Document, page_number: u32, page_id: ObjectId) -> Result<PdfDataPage> {
        let content_err = |reason: String| PdfError::Content {
            page: page_number,
            reason,
        };
        let bytes = doc
            .get_page_content(page_id)
            .map_err(|e| content_err(e.to_string()))?;
        let content = Content::decode(&bytes).map_err(|e| content_err(e.to_string()))?;

        let mut page = PdfDataPage::new(page_number);
        let mut state = TextState::default();
        let mut saved: Vec<Matrix> = Vec::new();

        for operation in &content.operations {
            let operands = operation.operands.as_slice();
            match operation.operator.as_str() {
                "q" => saved.push(state.ctm),
                "Q" => {
                    if let Some(ctm) = saved.pop() {
                        state.ctm = ctm;
                    }
                }
                "cm" => {
                    if let Some(m) = numbers::<6>(operands) {
                        state.ctm = Matrix(m).then(&state.ctm);
                    }
                }
                "BT" => {
                    state.text_matrix = Matrix::IDENTITY;
                    state.line_matrix = Matrix::IDENTITY;
                }
                "Tf" => {
                    if let Some(size) = operands.get(1).and_then(number) {
                        state.font_size = size;
                    }
                }
                "TL" => {
                    if let Some([leading]) = numbers::<1>(operands) {
                        state.leading = leading;
                    }
                }
                "Td" => {
                    if let Some([tx, ty]) = numbers::<2>(operands) {
                        state.next_line(tx, ty);
                    }
                }
                "TD" => {
                    if let Some([tx, ty]) = numbers::<2>(operands) {
                        state.leading = -ty;
                        state.next_line(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = numbers::<6>(operands) {
                        state.line_matrix = Matrix(m);
                        state.text_matrix = state.line_matrix;
                    }
                }
                "T*" => {
                    let leading = state.leading;
                    state.next_line(0.0, -leading);
                }
                "Tj" => {
                    if let Some(text) = string_operand(operands) {
                        state.show(&mut page, text);
                    }
                }
                "'" | "\"" => {
                    let leading = state.leading;
                    state.next_line(0.0, -leading);
                    if let Some(text) = string_operand(operands) {
                        state.show(&mut page, text);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(parts)) = operands.first() {
                        let text: String = parts
                            .iter()
                            .filter_map(|part| match part {
                                Object::String(bytes, _) => Some(decode_string(bytes)),
                                _ => None,
                            })
                            .collect();
                        state.show(&mut page, text);
                    }
                }
                _ => {}
            }
        }

        debug!("Page {}: {} text elements", page_number, page.elements.len());
        Ok(page)
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
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

    fn extract_pages(&self) -> Result<DocumentPages> {
        let doc = self.document()?;
        let mut pages = DocumentPages::new();
        for (page_number, page_id) in doc.get_pages() {
            match self.page_elements(doc, page_number, page_id) {
                Ok(page) => pages.insert(page),
                Err(e) => {
                    warn!("Skipping page {}: {}", page_number, e);
                    pages.insert(PdfDataPage::new(page_number));
                }
            }
        }
        Ok(pages)
    }

    fn extract_page(&self, page: u32) -> Result<DocumentPages> {
        let doc = self.document()?;
        let page_id = *doc.get_pages().get(&page).ok_or(PdfError::InvalidPage(page))?;
        let mut pages = DocumentPages::new();
        pages.insert(self.page_elements(doc, page, page_id)?);
        Ok(pages)
    }
}
