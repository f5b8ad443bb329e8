//! Error types for the paystub-core library.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the paystub library.
#[derive(Error, Debug)]
pub enum PaystubError {
    /// Rule document loading or compilation error.
    #[error("rules error: {0}")]
    Rules(#[from] RuleError),

    /// Pay data extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl PaystubError {
    /// Stable category of this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PaystubError::Rules(e) => e.kind(),
            PaystubError::Extraction(e) => e.kind(),
            PaystubError::Pdf(_) => ErrorKind::Pdf,
            PaystubError::Io(_) => ErrorKind::Io,
            PaystubError::Config(_) => ErrorKind::Config,
        }
    }
}

/// Errors related to loading, resolving and compiling rule documents.
#[derive(Error, Debug)]
pub enum RuleError {
    /// No rule specifier was supplied.
    #[error("no rules provided: pass inline rules or a path to a file containing them")]
    InputMissing,

    /// The rule specifier names a file that could not be read.
    #[error("failed to read rules file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The rule payload is not a well-formed rule document.
    #[error("failed to parse rules: {reason} payload:[{payload}]")]
    Parse { reason: String, payload: String },

    /// A compiled pattern was rejected by the regex engine.
    #[error("invalid pattern for {context}: {reason} pattern:[{pattern}]")]
    InvalidPattern {
        context: String,
        pattern: String,
        reason: String,
    },

    /// A section rule violates its invariants.
    #[error("invalid section rule {section}: {reason}")]
    InvalidSection { section: String, reason: String },
}

impl RuleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuleError::InputMissing => ErrorKind::RuleInputMissing,
            RuleError::Read { .. } => ErrorKind::RuleReadError,
            RuleError::Parse { .. } => ErrorKind::RuleParseError,
            RuleError::InvalidPattern { .. } | RuleError::InvalidSection { .. } => {
                ErrorKind::InvalidRule
            }
        }
    }
}

/// Errors raised while extracting pay data from a document.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// A section's header/next-header window was not found in the document text.
    #[error("unable to find table. tableHeader:[{header}] content:[{content}]")]
    TableNotFound { header: String, content: String },

    /// A required field matched no group and has no default.
    #[error("unable to extract pay data. group:[{group}] regex:[{pattern}] window:[{window}]")]
    FieldNotFound {
        group: String,
        pattern: String,
        window: String,
    },

    /// A positioned element (anchor or offset target) does not exist.
    #[error("unable to find element. {0}")]
    ElementNotFound(ElementLocation),

    /// Unknown extraction strategy selector.
    #[error("unsupported extraction strategy: {0} (expected one of: regex, position-index)")]
    UnsupportedStrategy(String),
}

impl ExtractionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractionError::TableNotFound { .. } => ErrorKind::TableNotFound,
            ExtractionError::FieldNotFound { .. } => ErrorKind::FieldNotFound,
            ExtractionError::ElementNotFound(_) => ErrorKind::ElementNotFound,
            ExtractionError::UnsupportedStrategy(_) => ErrorKind::UnsupportedStrategy,
        }
    }
}

/// Where a positioned-element lookup was aimed when it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementLocation {
    pub page: u32,
    pub text: Option<String>,
    pub item: Option<u32>,
}

impl fmt::Display for ElementLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page:[{}]", self.page)?;
        if let Some(text) = &self.text {
            write!(f, " text:[{}]", text)?;
        }
        if let Some(item) = self.item {
            write!(f, " item:[{}]", item)?;
        }
        Ok(())
    }
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to decode a page content stream.
    #[error("failed to decode content of page {page}: {reason}")]
    Content { page: u32, reason: String },

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Stable failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RuleInputMissing,
    RuleReadError,
    RuleParseError,
    InvalidRule,
    TableNotFound,
    FieldNotFound,
    ElementNotFound,
    UnsupportedStrategy,
    Pdf,
    Io,
    Config,
}

/// Result type for the paystub library.
pub type Result<T> = std::result::Result<T, PaystubError>;
