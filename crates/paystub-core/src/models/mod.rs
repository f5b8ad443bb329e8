//! Data models.

pub mod config;
pub mod document;
pub mod paydata;

pub use config::{ExtractionConfig, OutputConfig, PaystubConfig, PositionLayout, TextLayout};
pub use document::{DocumentContent, DocumentPages, PdfDataPage, PositionedTextElement};
pub use paydata::{CheckInfo, Deposits, GrossEarnings, PayData, PeriodTotals, TABLE_HEADERS};
