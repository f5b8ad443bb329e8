//! Pay-data extraction strategies.

pub mod field;
pub mod position;
pub mod regex_mode;
pub mod window;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

pub use field::{extract_field, FieldMatcher, ValueSource};
pub use position::{ExtractSpec, Locator, PositionIndexExtractor, PositionRule, WhenCondition};
pub use regex_mode::{RegexExtractor, SectionMatcher};
pub use window::{find_table_window, TableWindow, TableWindowPattern};

use crate::error::ExtractionError;
use crate::models::config::PaystubConfig;
use crate::models::document::DocumentContent;
use crate::models::paydata::PayData;
use crate::rules::{PatternCompiler, RuleDocument};

/// Turns one document into one pay-data record.
pub trait PayDataExtractor {
    fn extract(&self, document: &DocumentContent) -> Result<PayData, ExtractionError>;
}

/// Extraction strategy selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Rule-driven regex windows over the delimited text.
    #[default]
    Regex,
    /// Label lookup by item number over positioned elements.
    PositionIndex,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Regex => "regex",
            Strategy::PositionIndex => "position-index",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "regex" => Ok(Strategy::Regex),
            "position-index" | "position_index" | "position" => Ok(Strategy::PositionIndex),
            other => Err(ExtractionError::UnsupportedStrategy(other.to_string())),
        }
    }
}

/// Accepts the same spellings as [`FromStr`].
impl<'de> Deserialize<'de> for Strategy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Build the extractor selected by `config`.
///
/// The regex strategy loads `config.extraction.rules` (a path or inline JSON),
/// falling back to the embedded default rules.
pub fn create_extractor(config: &PaystubConfig) -> crate::Result<Box<dyn PayDataExtractor>> {
    let strategy = config.extraction.strategy;
    info!("Creating {} extractor", strategy);
    match strategy {
        Strategy::Regex => {
            let compiler = PatternCompiler::new(&config.text.column_separator);
            let document = RuleDocument::load_or_default(config.extraction.rules.as_deref())?;
            let extractor = RegexExtractor::from_document(&document, &compiler)?;
            Ok(Box::new(extractor))
        }
        Strategy::PositionIndex => Ok(Box::new(PositionIndexExtractor::new(config.position.clone()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::fixtures;
    use crate::models::config::TextLayout;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("regex".parse::<Strategy>().unwrap(), Strategy::Regex);
        assert_eq!("Position-Index".parse::<Strategy>().unwrap(), Strategy::PositionIndex);
        let err = "ocr".parse::<Strategy>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedStrategy);
    }

    #[test]
    fn test_strategy_deserializes_through_from_str() {
        let strategy: Strategy = serde_json::from_str(r#""position_index""#).unwrap();
        assert_eq!(strategy, Strategy::PositionIndex);
        assert_eq!(serde_json::to_string(&strategy).unwrap(), r#""position-index""#);

        let err = serde_json::from_str::<Strategy>(r#""ocr""#).unwrap_err();
        assert!(err.to_string().contains("unsupported extraction strategy"));
    }

    #[test]
    fn test_strategy_display_round_trips() {
        for strategy in [Strategy::Regex, Strategy::PositionIndex] {
            assert_eq!(strategy.to_string().parse::<Strategy>().unwrap(), strategy);
        }
    }

    #[test]
    fn test_both_strategies_agree_on_fixture() {
        let layout = TextLayout::default();
        let document = DocumentContent::from_delimited_text(fixtures::stub_text(&[]), &layout);

        for strategy in [Strategy::Regex, Strategy::PositionIndex] {
            let mut config = PaystubConfig::default();
            config.extraction.strategy = strategy;
            let extractor = create_extractor(&config).unwrap();
            assert_eq!(extractor.extract(&document).unwrap(), fixtures::expected_pay_data());
        }
    }

    #[test]
    fn test_malformed_inline_rules_are_reported() {
        let mut config = PaystubConfig::default();
        config.extraction.rules = Some("{ not json".to_string());
        let err = create_extractor(&config).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::RuleParseError);
    }
}
