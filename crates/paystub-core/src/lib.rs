//! Core library for pay stub extraction.
//!
//! This crate provides:
//! - A JSON rule language with `{{name}}` markers and composable pattern nodes
//! - Regex table windowing and field extraction over delimited page text
//! - Position-index lookup over positioned text elements
//! - PDF content-stream text extraction
//! - The pay-data record model

pub mod error;
pub mod extract;
pub mod models;
pub mod pdf;
pub mod rules;

#[cfg(test)]
mod fixtures;

pub use error::{ErrorKind, ExtractionError, PaystubError, PdfError, Result, RuleError};
pub use extract::{create_extractor, PayDataExtractor, PositionIndexExtractor, RegexExtractor, Strategy};
pub use models::config::PaystubConfig;
pub use models::document::{DocumentContent, DocumentPages, PdfDataPage, PositionedTextElement};
pub use models::paydata::PayData;
pub use pdf::{load_document, PdfExtractor, PdfProcessor};
pub use rules::{PatternCompiler, PatternNode, RuleDocument};
