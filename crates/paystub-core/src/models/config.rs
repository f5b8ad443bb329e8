//! Configuration structures for pay-stub extraction.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::PaystubError;
use crate::extract::Strategy;

/// Main configuration for the paystub pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PaystubConfig {
    /// Extraction strategy and rules.
    pub extraction: ExtractionConfig,

    /// Delimited text layout.
    pub text: TextLayout,

    /// Labels and defaults for the position-index strategy.
    pub position: PositionLayout,

    /// Output settings.
    pub output: OutputConfig,
}

/// Extraction configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Which extractor to build.
    pub strategy: Strategy,

    /// Inline rules or a path to a rules file. Embedded rules when unset.
    pub rules: Option<String>,
}

/// How positioned elements are rendered to delimited text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextLayout {
    /// Joins elements sharing a baseline.
    pub column_separator: String,

    /// Joins lines.
    pub line_separator: String,

    /// Frame each page with `Beginning of Page` / `End of Page` lines.
    pub page_markers: bool,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self {
            column_separator: crate::rules::pattern::DEFAULT_COLUMN_SEPARATOR.to_string(),
            line_separator: "\n".to_string(),
            page_markers: true,
        }
    }
}

/// Element labels searched by the position-index strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionLayout {
    /// Page holding the check data.
    pub page: u32,

    /// Anchor element; labels are only matched after it.
    pub anchor: String,

    pub check_number: String,
    pub check_date: String,
    pub period_start: String,
    pub period_end: String,
    pub salary: String,
    pub net_pay: String,
    pub fed_taxable_income: String,
    pub hours_worked: String,
    pub gross_earnings: String,
    pub regular_rate: String,
    pub taxes: String,
    pub deductions: String,

    /// Sentinel shown instead of deduction rows.
    pub no_deductions: String,

    pub total_deposits: String,

    /// Substituted for amounts in sections skipped by a precondition.
    pub zero_amount: String,
}

impl Default for PositionLayout {
    fn default() -> Self {
        Self {
            page: 1,
            anchor: "Earnings Statement".to_string(),
            check_number: "Voucher Number".to_string(),
            check_date: "Check Date".to_string(),
            period_start: "Period Beginning".to_string(),
            period_end: "Period Ending".to_string(),
            salary: "Salary".to_string(),
            net_pay: "Net Pay".to_string(),
            fed_taxable_income: "Fed Taxable Income".to_string(),
            hours_worked: "Total Hours Worked".to_string(),
            gross_earnings: "Gross Earnings".to_string(),
            regular_rate: "REGULAR".to_string(),
            taxes: "Taxes".to_string(),
            deductions: "Deductions".to_string(),
            no_deductions: "No Deductions".to_string(),
            total_deposits: "Total Direct Deposits".to_string(),
            zero_amount: "0.00".to_string(),
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output file; the extension picks the format.
    pub file: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("output.xls"),
        }
    }
}

impl PaystubConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse configuration JSON. An unknown strategy is reported as such,
    /// not as a malformed document.
    pub fn from_json(payload: &str) -> crate::Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(payload).map_err(|e| PaystubError::Config(e.to_string()))?;
        if let Some(strategy) = value.pointer("/extraction/strategy").and_then(|v| v.as_str()) {
            strategy.parse::<Strategy>()?;
        }
        serde_json::from_value(value).map_err(|e| PaystubError::Config(e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
