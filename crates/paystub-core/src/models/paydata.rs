//! The extracted pay-stub record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format used on stubs, e.g. `July 7, 2024`.
pub const CHECK_DATE_FORMAT: &str = "%B %d, %Y";

/// Column headers of the flat table form, in row order.
pub const TABLE_HEADERS: [&str; 17] = [
    "Check Number",
    "Check Date",
    "Pay Period Start",
    "Pay Period End",
    "Salary",
    "Net Pay",
    "Federal Taxable Income",
    "Hours Worked",
    "Gross Earnings Hours",
    "Gross Earnings Period",
    "Gross Earnings YTD",
    "Regular Rate",
    "Taxes Period",
    "Taxes YTD",
    "Deductions Period",
    "Deductions YTD",
    "Total Direct Deposits",
];

/// Structured data from one pay stub.
///
/// Every leaf is the text as printed on the stub. Absent values are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayData {
    pub check: CheckInfo,
    pub gross_earnings: GrossEarnings,
    pub taxes: PeriodTotals,
    pub deductions: PeriodTotals,
    pub deposits: Deposits,
}

/// Check metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInfo {
    pub check_number: String,
    pub check_date: String,
    pub pay_period_start: String,
    pub pay_period_end: String,
    pub salary: String,
    pub net_pay: String,
    pub fed_tax_income: String,
    pub hours_worked: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrossEarnings {
    pub hours: String,
    pub period: String,
    pub ytd: String,
    pub regular_rate: String,
}

/// Current period and year-to-date totals (taxes, deductions).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodTotals {
    pub period: String,
    pub ytd: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deposits {
    pub total: String,
}

impl PayData {
    /// Parsed check date, if it is in the `July 7, 2024` form.
    pub fn check_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.check.check_date.trim(), CHECK_DATE_FORMAT).ok()
    }

    /// Values in [`TABLE_HEADERS`] order.
    pub fn table_row(&self) -> [&str; 17] {
        [
            &self.check.check_number,
            &self.check.check_date,
            &self.check.pay_period_start,
            &self.check.pay_period_end,
            &self.check.salary,
            &self.check.net_pay,
            &self.check.fed_tax_income,
            &self.check.hours_worked,
            &self.gross_earnings.hours,
            &self.gross_earnings.period,
            &self.gross_earnings.ytd,
            &self.gross_earnings.regular_rate,
            &self.taxes.period,
            &self.taxes.ytd,
            &self.deductions.period,
            &self.deductions.ytd,
            &self.deposits.total,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_camel_case() {
        let mut data = PayData::default();
        data.check.check_number = "7777".into();
        data.gross_earnings.regular_rate = "77.7777".into();

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["check"]["checkNumber"], "7777");
        assert_eq!(json["grossEarnings"]["regularRate"], "77.7777");
        assert_eq!(json["deposits"]["total"], "");
    }

    #[test]
    fn test_check_date() {
        let mut data = PayData::default();
        data.check.check_date = "July 7, 2024".into();
        assert_eq!(data.check_date(), NaiveDate::from_ymd_opt(2024, 7, 7));

        data.check.check_date = "soon".into();
        assert_eq!(data.check_date(), None);
    }

    #[test]
    fn test_table_row_matches_headers() {
        let mut data = PayData::default();
        data.check.check_number = "1".into();
        data.deposits.total = "2".into();
        let row = data.table_row();
        assert_eq!(row.len(), TABLE_HEADERS.len());
        assert_eq!(row[0], "1");
        assert_eq!(row[16], "2");
    }
}
