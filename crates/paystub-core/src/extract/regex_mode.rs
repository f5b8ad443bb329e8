//! Regex-window extraction across the five pay-stub sections.

use std::collections::HashMap;

use tracing::{debug, info};

use super::field::FieldMatcher;
use super::window::TableWindowPattern;
use super::PayDataExtractor;
use crate::error::{ExtractionError, RuleError};
use crate::models::document::DocumentContent;
use crate::models::paydata::{CheckInfo, Deposits, GrossEarnings, PayData, PeriodTotals};
use crate::rules::{PatternCompiler, ResolvedRules, RuleDocument, Section};

/// Compiled window and field matchers for one section.
#[derive(Debug, Clone)]
pub struct SectionMatcher {
    pub section: Section,
    pub window: TableWindowPattern,
    pub fields: Vec<FieldMatcher>,
}

impl SectionMatcher {
    /// Locate the window and extract every field, in rule order.
    pub fn extract(&self, content: &str) -> Result<SectionValues, ExtractionError> {
        let window = self.window.find(content)?;
        let mut values = SectionValues::default();
        for field in &self.fields {
            let value = field.extract(&window.text)?;
            values.0.insert(field.name().to_string(), value);
        }
        debug!("Section {} extracted {} fields", self.section, values.0.len());
        Ok(values)
    }
}

/// Field values of one section keyed by output name.
#[derive(Debug, Clone, Default)]
pub struct SectionValues(HashMap<String, String>);

impl SectionValues {
    /// Take a value out, empty when the rules did not define the field.
    fn take(&mut self, name: &str) -> String {
        self.0.remove(name).unwrap_or_default()
    }
}

/// Extracts pay data by matching rule patterns against the delimited text stream.
#[derive(Debug, Clone)]
pub struct RegexExtractor {
    sections: Vec<SectionMatcher>,
}

impl RegexExtractor {
    /// Compile every section of already resolved rules.
    pub fn new(resolved: &ResolvedRules, compiler: &PatternCompiler) -> Result<Self, RuleError> {
        let rules = &resolved.rules;
        let document_start = compiler.compile(&rules.document_start);

        let mut sections = Vec::with_capacity(Section::ALL.len());
        for (section, rule) in rules.sections() {
            let window = TableWindowPattern::new(
                &document_start,
                &compiler.compile(&rule.table_header),
                &compiler.compile(&rule.next_table_header),
            )?;
            let fields = rule
                .find
                .iter()
                .map(|(name, field)| {
                    FieldMatcher::with_context(
                        name,
                        &format!("{}.{}", section, name),
                        field,
                        rule.find_pattern.as_ref(),
                        compiler,
                    )
                })
                .collect::<Result<Vec<_>, _>>()?;
            sections.push(SectionMatcher {
                section,
                window,
                fields,
            });
        }

        info!("Compiled regex extractor with {} sections", sections.len());
        Ok(Self { sections })
    }

    /// Resolve and compile a rule document.
    pub fn from_document(document: &RuleDocument, compiler: &PatternCompiler) -> Result<Self, RuleError> {
        let resolved = document.resolve(compiler)?;
        Self::new(&resolved, compiler)
    }

    /// Compiled sections, in extraction order.
    pub fn sections(&self) -> &[SectionMatcher] {
        &self.sections
    }

    /// Extract a record from delimited text. Any failure aborts the whole document.
    pub fn extract_text(&self, content: &str) -> Result<PayData, ExtractionError> {
        let mut values: HashMap<Section, SectionValues> = HashMap::new();
        for matcher in &self.sections {
            values.insert(matcher.section, matcher.extract(content)?);
        }
        let mut section = |s: Section| values.remove(&s).unwrap_or_default();

        let mut check = section(Section::Check);
        let mut gross = section(Section::GrossEarnings);
        let mut taxes = section(Section::Taxes);
        let mut deductions = section(Section::Deductions);
        let mut deposits = section(Section::Deposits);

        Ok(PayData {
            check: CheckInfo {
                check_number: check.take("checkNumber"),
                check_date: check.take("checkDate"),
                pay_period_start: check.take("payPeriodStart"),
                pay_period_end: check.take("payPeriodEnd"),
                salary: check.take("salary"),
                net_pay: check.take("netPay"),
                fed_tax_income: check.take("fedTaxIncome"),
                hours_worked: check.take("hoursWorked"),
            },
            gross_earnings: GrossEarnings {
                hours: gross.take("hours"),
                period: gross.take("period"),
                ytd: gross.take("ytd"),
                regular_rate: gross.take("regularRate"),
            },
            taxes: PeriodTotals {
                period: taxes.take("period"),
                ytd: taxes.take("ytd"),
            },
            deductions: PeriodTotals {
                period: deductions.take("period"),
                ytd: deductions.take("ytd"),
            },
            deposits: Deposits {
                total: deposits.take("total"),
            },
        })
    }
}

impl PayDataExtractor for RegexExtractor {
    fn extract(&self, document: &DocumentContent) -> Result<PayData, ExtractionError> {
        self.extract_text(&document.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::fixtures;
    use pretty_assertions::assert_eq;

    fn extractor() -> RegexExtractor {
        let compiler = PatternCompiler::default();
        RegexExtractor::from_document(&RuleDocument::embedded().unwrap(), &compiler).unwrap()
    }

    #[test]
    fn test_happy_path() {
        let data = extractor().extract_text(&fixtures::stub_text(&[])).unwrap();
        assert_eq!(data, fixtures::expected_pay_data());
    }

    #[test]
    fn test_taxes_without_current_period_label() {
        let text = fixtures::stub_text(&[(fixtures::Part::Taxes, fixtures::TAXES_NO_CURRENT_PERIOD)]);
        let data = extractor().extract_text(&text).unwrap();
        assert_eq!(data.taxes.period, "0.00");
        assert_eq!(data.taxes.ytd, "77,777.77");
    }

    #[test]
    fn test_no_deductions_sentinel() {
        let text = fixtures::stub_text(&[(fixtures::Part::Deductions, fixtures::DEDUCTIONS_NONE)]);
        let data = extractor().extract_text(&text).unwrap();
        assert_eq!(data.deductions.period, "");
        assert_eq!(data.deductions.ytd, "");
    }

    #[test]
    fn test_no_direct_deposits_sentinel() {
        let text = fixtures::stub_text(&[(fixtures::Part::Deposits, fixtures::DEPOSITS_NONE)]);
        let data = extractor().extract_text(&text).unwrap();
        assert_eq!(data.deposits.total, "");
    }

    #[test]
    fn test_missing_voucher_number() {
        let check = fixtures::CHECK.replace("Voucher Number | 7777\n", "");
        let text = fixtures::stub_text(&[(fixtures::Part::Check, check.as_str())]);
        match extractor().extract_text(&text).unwrap_err() {
            ExtractionError::FieldNotFound { group, .. } => assert_eq!(group, "checkNumber"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_section_aborts_document() {
        let text = fixtures::stub_text(&[(fixtures::Part::Deposits, "")]);
        let err = extractor().extract_text(&text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TableNotFound);
    }

    #[test]
    fn test_missing_banner_fails() {
        let text = fixtures::stub_text(&[(fixtures::Part::Header, "Some other document")]);
        let err = extractor().extract_text(&text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TableNotFound);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let extractor = extractor();
        let text = fixtures::stub_text(&[]);
        let first = serde_json::to_string(&extractor.extract_text(&text).unwrap()).unwrap();
        let second = serde_json::to_string(&extractor.extract_text(&text).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_sections_compile_in_order() {
        let extractor = extractor();
        let order: Vec<Section> = extractor.sections().iter().map(|s| s.section).collect();
        assert_eq!(order, Section::ALL.to_vec());
        assert_eq!(extractor.sections()[0].fields[0].name(), "checkNumber");
    }

    #[test]
    fn test_invalid_field_pattern_fails_at_construction() {
        let mut document = RuleDocument::embedded().unwrap();
        document.rules.taxes.find_pattern = Some("(?<period>".into());
        let err = RegexExtractor::from_document(&document, &PatternCompiler::default()).unwrap_err();
        match err {
            RuleError::InvalidPattern { context, .. } => assert_eq!(context, "taxes.period"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
