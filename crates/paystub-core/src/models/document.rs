//! Document content handed to the extractors: delimited text and positioned elements.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::config::TextLayout;

const PAGE_BEGIN: &str = "Beginning of Page";
const PAGE_END: &str = "End of Page";

/// Baselines closer than this are treated as the same line.
const BASELINE_TOLERANCE: f32 = 0.01;

/// A run of text with its position on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedTextElement {
    pub page_number: u32,
    /// 1-based reading order within the page.
    pub item_number: u32,
    pub text: String,
    pub x: f32,
    /// Bottom of the element: baseline minus height.
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl PositionedTextElement {
    pub fn baseline(&self) -> f32 {
        self.y + self.h
    }
}

/// One page's elements keyed by item number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfDataPage {
    pub page_number: u32,
    pub elements: BTreeMap<u32, PositionedTextElement>,
}

impl PdfDataPage {
    pub fn new(page_number: u32) -> Self {
        Self {
            page_number,
            elements: BTreeMap::new(),
        }
    }

    /// Append an element in reading order, assigning the next item number.
    ///
    /// Zero-height runs carry no visible text and are dropped.
    pub fn push_element(&mut self, text: impl Into<String>, x: f32, y: f32, w: f32, h: f32) -> Option<u32> {
        if h == 0.0 {
            return None;
        }
        let item_number = self.elements.len() as u32 + 1;
        self.elements.insert(
            item_number,
            PositionedTextElement {
                page_number: self.page_number,
                item_number,
                text: text.into(),
                x,
                y,
                w,
                h,
            },
        );
        Some(item_number)
    }

    pub fn element(&self, item_number: u32) -> Option<&PositionedTextElement> {
        self.elements.get(&item_number)
    }

    /// Elements in item-number order.
    pub fn elements(&self) -> impl Iterator<Item = &PositionedTextElement> {
        self.elements.values()
    }

    /// Elements grouped into lines by shared baseline.
    pub fn lines(&self) -> Vec<Vec<&PositionedTextElement>> {
        let mut lines: Vec<Vec<&PositionedTextElement>> = Vec::new();
        let mut current_baseline: Option<f32> = None;
        for element in self.elements() {
            let baseline = element.baseline();
            match (current_baseline, lines.last_mut()) {
                (Some(previous), Some(line)) if (previous - baseline).abs() <= BASELINE_TOLERANCE => {
                    line.push(element);
                }
                _ => {
                    lines.push(vec![element]);
                    current_baseline = Some(baseline);
                }
            }
        }
        lines
    }

    /// Render the page as delimited text.
    pub fn render_text(&self, layout: &TextLayout) -> String {
        let mut lines: Vec<String> = Vec::new();
        if layout.page_markers {
            lines.push(PAGE_BEGIN.to_string());
        }
        for line in self.lines() {
            let cells: Vec<&str> = line.iter().map(|e| e.text.as_str()).collect();
            lines.push(cells.join(&layout.column_separator));
        }
        if layout.page_markers {
            lines.push(PAGE_END.to_string());
        }
        lines.join(&layout.line_separator)
    }
}

/// Pages of a document keyed by page number (1-based).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentPages(BTreeMap<u32, PdfDataPage>);

impl DocumentPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self, page_number: u32) -> Option<&PdfDataPage> {
        self.0.get(&page_number)
    }

    /// The page with this number, created empty if missing.
    pub fn page_mut(&mut self, page_number: u32) -> &mut PdfDataPage {
        self.0
            .entry(page_number)
            .or_insert_with(|| PdfDataPage::new(page_number))
    }

    pub fn insert(&mut self, page: PdfDataPage) {
        self.0.insert(page.page_number, page);
    }

    pub fn pages(&self) -> impl Iterator<Item = &PdfDataPage> {
        self.0.values()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn element_count(&self) -> usize {
        self.pages().map(|p| p.elements.len()).sum()
    }

    /// Render every non-empty page, pages separated by a blank line.
    pub fn render_text(&self, layout: &TextLayout) -> String {
        self.pages()
            .filter(|page| !page.elements.is_empty())
            .map(|page| page.render_text(layout))
            .collect::<Vec<_>>()
            .join(&format!("{0}{0}", layout.line_separator))
    }

    /// Parse a serialized page map and re-ingest it: zero-height elements are
    /// dropped and item numbers reassigned in their original order.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        let raw: DocumentPages = serde_json::from_str(payload)?;
        let mut pages = DocumentPages::new();
        for raw_page in raw.pages() {
            let page = pages.page_mut(raw_page.page_number);
            for element in raw_page.elements() {
                page.push_element(element.text.clone(), element.x, element.y, element.w, element.h);
            }
        }
        trace!("Ingested {} elements from page map", pages.element_count());
        Ok(pages)
    }

    /// Lift delimited text into positioned elements: one element per cell,
    /// one baseline per line.
    ///
    /// `End of Page` lines close a page; page-begin markers and blank lines are skipped.
    pub fn from_delimited_text(text: &str, layout: &TextLayout) -> Self {
        const LINE_HEIGHT: f32 = 10.0;
        const CELL_WIDTH: f32 = 100.0;

        let mut pages = DocumentPages::new();
        let mut page_number = 1;
        let mut line_index = 0;
        for line in text.split(layout.line_separator.as_str()) {
            let line = line.trim_end_matches('\r');
            if line == PAGE_END {
                if pages.page(page_number).is_some() {
                    page_number += 1;
                    line_index = 0;
                }
                continue;
            }
            if line.trim().is_empty() || line == PAGE_BEGIN {
                continue;
            }

            let page = pages.page_mut(page_number);
            let y = 1000.0 - (line_index as f32 + 1.0) * LINE_HEIGHT;
            for (column, cell) in line.split(layout.column_separator.as_str()).enumerate() {
                page.push_element(cell, column as f32 * CELL_WIDTH, y, CELL_WIDTH, LINE_HEIGHT);
            }
            line_index += 1;
        }
        trace!("Lifted {} elements from delimited text", pages.element_count());
        pages
    }
}

/// A document as seen by the extractors.
#[derive(Debug, Clone, Default)]
pub struct DocumentContent {
    /// Delimited text stream.
    pub text: String,
    /// Positioned elements; empty when the document arrived as text only.
    pub pages: DocumentPages,
}

impl DocumentContent {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pages: DocumentPages::new(),
        }
    }

    /// Build from positioned elements, rendering the text stream.
    pub fn from_pages(pages: DocumentPages, layout: &TextLayout) -> Self {
        Self {
            text: pages.render_text(layout),
            pages,
        }
    }

    /// Build from delimited text, also lifting it into positioned elements.
    pub fn from_delimited_text(text: impl Into<String>, layout: &TextLayout) -> Self {
        let text = text.into();
        let pages = DocumentPages::from_delimited_text(&text, layout);
        Self { text, pages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_page() -> PdfDataPage {
        let mut page = PdfDataPage::new(1);
        page.push_element("Net Pay", 10.0, 690.0, 40.0, 10.0);
        page.push_element("7,777.77", 200.0, 690.0, 40.0, 10.0);
        page.push_element("", 0.0, 0.0, 0.0, 0.0);
        page.push_element("Check Date", 10.0, 670.0, 40.0, 10.0);
        page
    }

    #[test]
    fn test_push_element_skips_zero_height() {
        let page = sample_page();
        assert_eq!(page.elements.len(), 3);
        assert_eq!(page.element(3).map(|e| e.text.as_str()), Some("Check Date"));
    }

    #[test]
    fn test_render_text_groups_by_baseline() {
        let page = sample_page();
        let layout = TextLayout::default();
        assert_eq!(
            page.render_text(&layout),
            "Beginning of Page\nNet Pay | 7,777.77\nCheck Date\nEnd of Page"
        );

        let bare = TextLayout {
            page_markers: false,
            ..TextLayout::default()
        };
        assert_eq!(page.render_text(&bare), "Net Pay | 7,777.77\nCheck Date");
    }

    #[test]
    fn test_pages_serialize_by_number() {
        let mut pages = DocumentPages::new();
        pages.insert(sample_page());
        let json = serde_json::to_value(&pages).unwrap();
        assert_eq!(json["1"]["elements"]["2"]["text"], "7,777.77");
        assert_eq!(json["1"]["elements"]["2"]["itemNumber"], 2);

        let back: DocumentPages = serde_json::from_value(json).unwrap();
        assert_eq!(back, pages);
    }

    #[test]
    fn test_from_json_drops_zero_height_elements() {
        let payload = r#"{
            "1": {
                "pageNumber": 1,
                "elements": {
                    "1": {"pageNumber": 1, "itemNumber": 1, "text": "Net Pay", "x": 10, "y": 690, "w": 40, "h": 10},
                    "2": {"pageNumber": 1, "itemNumber": 2, "text": "", "x": 0, "y": 0, "w": 0, "h": 0},
                    "3": {"pageNumber": 1, "itemNumber": 3, "text": "7,777.77", "x": 200, "y": 690, "w": 40, "h": 10}
                }
            }
        }"#;
        let pages = DocumentPages::from_json(payload).unwrap();
        let page = pages.page(1).unwrap();
        assert_eq!(page.elements.len(), 2);
        assert_eq!(page.element(2).unwrap().text, "7,777.77");
        assert_eq!(page.element(2).unwrap().item_number, 2);
        assert!(DocumentPages::from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_from_delimited_text() {
        let layout = TextLayout::default();
        let text = "Beginning of Page\nVoucher Number | 7777\n\nNet Pay | 1.00\nEnd of Page\n\nBeginning of Page\nPage Two\nEnd of Page";
        let pages = DocumentPages::from_delimited_text(text, &layout);
        assert_eq!(pages.len(), 2);

        let first = pages.page(1).unwrap();
        let texts: Vec<&str> = first.elements().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["Voucher Number", "7777", "Net Pay", "1.00"]);
        assert_eq!(first.lines().len(), 2);
        assert_eq!(pages.page(2).unwrap().element(1).unwrap().text, "Page Two");

        assert_eq!(pages.render_text(&layout), text.replace("\n\nNet Pay", "\nNet Pay"));
    }
}
