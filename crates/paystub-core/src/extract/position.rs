//! Position-index extraction: labels located by text, values read at item offsets.

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::PayDataExtractor;
use crate::error::{ElementLocation, ExtractionError};
use crate::models::config::PositionLayout;
use crate::models::document::{DocumentContent, DocumentPages, PositionedTextElement};
use crate::models::paydata::{CheckInfo, Deposits, GrossEarnings, PayData, PeriodTotals};

/// Which element to start from and under what conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhenCondition {
    /// Exact text of the label element.
    pub text: String,
    pub page_number: u32,
    /// Only elements with a greater item number are considered.
    pub item_number_after: Option<u32>,
    /// When `Some(false)` the rule is skipped.
    pub precondition: Option<bool>,
    /// Sentinel label whose presence turns a missing label into an absent value.
    pub and_not: Option<String>,
}

impl WhenCondition {
    pub fn new(text: impl Into<String>, page_number: u32, item_number_after: Option<u32>) -> Self {
        Self {
            text: text.into(),
            page_number,
            item_number_after,
            precondition: None,
            and_not: None,
        }
    }

    pub fn with_precondition(mut self, passed: bool) -> Self {
        self.precondition = Some(passed);
        self
    }

    pub fn and_not(mut self, sentinel: impl Into<String>) -> Self {
        self.and_not = Some(sentinel.into());
        self
    }
}

/// Where the value sits relative to the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractSpec {
    pub position_offset: u32,
}

/// One position-index field rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionRule {
    pub when: WhenCondition,
    pub extract: ExtractSpec,
}

impl PositionRule {
    pub fn new(when: WhenCondition, position_offset: u32) -> Self {
        Self {
            when,
            extract: ExtractSpec { position_offset },
        }
    }
}

/// Element lookups over a document's pages.
#[derive(Debug, Clone, Copy)]
pub struct Locator<'a> {
    pages: &'a DocumentPages,
}

impl<'a> Locator<'a> {
    pub fn new(pages: &'a DocumentPages) -> Self {
        Self { pages }
    }

    /// First element on `page` whose text equals `text` and whose item number exceeds `after`.
    pub fn find_anchor(
        &self,
        page: u32,
        text: &str,
        after: Option<u32>,
    ) -> Result<Option<&'a PositionedTextElement>, ExtractionError> {
        let data_page = self.pages.page(page).ok_or_else(|| {
            ExtractionError::ElementNotFound(ElementLocation {
                page,
                text: Some(text.to_string()),
                item: None,
            })
        })?;
        Ok(data_page
            .elements()
            .filter(|element| after.is_none_or(|after| element.item_number > after))
            .find(|element| !element.text.is_empty() && element.text == text))
    }

    /// The element `offset` items after `anchor_item` on the same page.
    pub fn read_at_offset(
        &self,
        page: u32,
        anchor_item: u32,
        offset: u32,
    ) -> Result<&'a PositionedTextElement, ExtractionError> {
        let target = anchor_item + offset;
        self.pages
            .page(page)
            .and_then(|p| p.element(target))
            .ok_or(ExtractionError::ElementNotFound(ElementLocation {
                page,
                text: None,
                item: Some(target),
            }))
    }

    /// Evaluate a rule. `Ok(None)` means the field is legitimately absent.
    pub fn evaluate(&self, rule: &PositionRule) -> Result<Option<String>, ExtractionError> {
        let when = &rule.when;
        if when.precondition == Some(false) {
            debug!("Precondition failed for [{}], skipping", when.text);
            return Ok(None);
        }

        let anchor = self.find_anchor(when.page_number, &when.text, when.item_number_after)?;
        let Some(anchor) = anchor else {
            if let Some(sentinel) = &when.and_not {
                if self
                    .find_anchor(when.page_number, sentinel, when.item_number_after)?
                    .is_some()
                {
                    debug!("Sentinel [{}] present instead of [{}]", sentinel, when.text);
                    return Ok(None);
                }
            }
            return Err(ExtractionError::ElementNotFound(ElementLocation {
                page: when.page_number,
                text: Some(when.text.clone()),
                item: when.item_number_after,
            }));
        };

        let target = self.read_at_offset(anchor.page_number, anchor.item_number, rule.extract.position_offset)?;
        if target.text.is_empty() {
            return Err(ExtractionError::ElementNotFound(ElementLocation {
                page: target.page_number,
                text: Some(when.text.clone()),
                item: Some(target.item_number),
            }));
        }
        Ok(Some(target.text.clone()))
    }
}

/// True unless `value` parses to zero once `,` and `$` are removed.
fn is_non_zero(value: &str) -> bool {
    let cleaned: String = value.chars().filter(|c| !matches!(c, ',' | '$')).collect();
    match Decimal::from_str(cleaned.trim()) {
        Ok(amount) => !amount.is_zero(),
        Err(_) => true,
    }
}

/// Extracts pay data from positioned elements using label/offset rules.
#[derive(Debug, Clone, Default)]
pub struct PositionIndexExtractor {
    layout: PositionLayout,
}

impl PositionIndexExtractor {
    pub fn new(layout: PositionLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &PositionLayout {
        &self.layout
    }

    pub fn extract_pages(&self, pages: &DocumentPages) -> Result<PayData, ExtractionError> {
        let layout = &self.layout;
        let locator = Locator::new(pages);
        let page = layout.page;

        let anchor = locator.find_anchor(page, &layout.anchor, None)?.map(|e| e.item_number);
        if anchor.is_none() {
            warn!("Anchor [{}] not found on page {}, searching whole page", layout.anchor, page);
        }

        let read = |label: &str, after: Option<u32>, offset: u32| -> Result<String, ExtractionError> {
            let rule = PositionRule::new(WhenCondition::new(label, page, after), offset);
            Ok(locator.evaluate(&rule)?.unwrap_or_default())
        };

        let check = CheckInfo {
            check_number: read(&layout.check_number, anchor, 1)?,
            check_date: read(&layout.check_date, anchor, 1)?,
            pay_period_start: read(&layout.period_start, anchor, 1)?,
            pay_period_end: read(&layout.period_end, anchor, 1)?,
            salary: read(&layout.salary, anchor, 1)?
                .trim_start_matches('$')
                .to_string(),
            net_pay: read(&layout.net_pay, anchor, 1)?,
            fed_tax_income: read(&layout.fed_taxable_income, anchor, 1)?,
            hours_worked: read(&layout.hours_worked, anchor, 1)?,
        };

        let worked = is_non_zero(&check.hours_worked);
        let paid = is_non_zero(&check.net_pay);
        let zero = || layout.zero_amount.clone();
        debug!("Preconditions: worked={} paid={}", worked, paid);

        let gross_earnings = if worked {
            GrossEarnings {
                hours: read(&layout.gross_earnings, anchor, 1)?,
                period: read(&layout.gross_earnings, anchor, 2)?,
                ytd: read(&layout.gross_earnings, anchor, 3)?,
                regular_rate: read(&layout.regular_rate, anchor, 1)?,
            }
        } else {
            GrossEarnings {
                hours: zero(),
                period: zero(),
                ytd: String::new(),
                regular_rate: zero(),
            }
        };

        let taxes_header = locator
            .find_anchor(page, &layout.taxes, anchor)?
            .map(|e| e.item_number)
            .or(anchor);
        let taxes = if worked {
            PeriodTotals {
                period: read(&layout.taxes, taxes_header, 1)?,
                ytd: read(&layout.taxes, taxes_header, 2)?,
            }
        } else {
            PeriodTotals {
                period: zero(),
                ytd: String::new(),
            }
        };

        let deductions_header = locator
            .find_anchor(page, &layout.deductions, anchor)?
            .map(|e| e.item_number)
            .or(anchor);
        let deduction = |offset: u32| -> Result<Option<String>, ExtractionError> {
            let when = WhenCondition::new(&layout.deductions, page, deductions_header)
                .with_precondition(worked)
                .and_not(&layout.no_deductions);
            locator.evaluate(&PositionRule::new(when, offset))
        };
        let deductions = PeriodTotals {
            period: deduction(1)?.unwrap_or_else(zero),
            ytd: deduction(2)?.unwrap_or_default(),
        };

        let deposits = Deposits {
            total: if paid {
                read(&layout.total_deposits, anchor, 1)?
            } else {
                zero()
            },
        };

        Ok(PayData {
            check,
            gross_earnings,
            taxes,
            deductions,
            deposits,
        })
    }
}

impl PayDataExtractor for PositionIndexExtractor {
    fn extract(&self, document: &DocumentContent) -> Result<PayData, ExtractionError> {
        self.extract_pages(&document.pages)
    }
}
