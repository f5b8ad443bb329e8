//! Pay-stub text shared by the extractor tests.

use crate::models::paydata::{CheckInfo, Deposits, GrossEarnings, PayData, PeriodTotals};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
    Header,
    Check,
    Taxes,
    GrossEarnings,
    Deductions,
    Deposits,
    TimeOff,
    Footer,
}

pub const HEADER: &str = "Non Negotiable - This is not a check - Non Negotiable";
pub const FOOTER: &str = "This is the end of the document.";

pub const CHECK: &str = "Earnings Statement
Voucher Number | 7777
Net Pay | 7,777.77
Total Hours Worked | 77.77
Employee ID | 777777 | Fed Taxable Income | 7,777.77 | Check Date | July 7, 7777
Location | Home.ID | Fed Filing Status | S+ $777 | Period Beginning | July 1, 7777
Salary | $7,777.77 | State Filing Status | S-0 | Period Ending | July 14, 7777
";

pub const GROSS_EARNINGS: &str = "Earnings | Rate | Hours | Amount | YTD
ER Cost of | 0.00 | 55.55 | 555.55
ER Cost of | 0.00 | 55.55 | 555.55
ER Cost of | 0.00 | 55.55 | 555.55
GROUP TE | 0.00 | 55.55 | 555.55
Holiday Me | 555.55
REGULAR | 77.7777 | 77.77 | 777.77 | 7,777.77
SICK | 77.7777 | 5.55 | 555.55 | 5,555.55
Gross Earnings | 77.77 | 7,777.77 | 77,777.77
";

pub const TAXES: &str = "Taxes | Amount | YTD
CA | 55.55 | 555.55
CASDI-E | 55.55 | 555.55
FITW | 5,555.55 | 5,555.55
MED | 55.55 | 555.55
SS | 55.55 | 555.55
Taxes | 777.77 | 7,777.77
";

/// Current-period total printed without its `Taxes` label.
pub const TAXES_NO_CURRENT_PERIOD: &str = "Taxes | Amount | YTD
CA | 0.00 | 5,555.55
CASDI-E | 0.00 | 5,555.55
FITW | 0.00 | 5,555.55
MED | 0.00 | 5,555.55
SS | 0.00 | 5,555.55
0.00 | 77,777.77
";

pub const DEDUCTIONS: &str = "Deductions | Amount | YTD
DENTAL INS | 5.55 | 55.55
GROUP TERM LIFE CALCULA | 55.55 | 55.55
MEDICAL INS | 55.55 | 555.55
Vol Employee Life | 55.55 | 55.55
Deductions | 77.77 | 777.77
";

pub const DEDUCTIONS_NONE: &str = "Deductions | Amount | YTD
No Deductions
";

pub const DEPOSITS: &str = "Direct Deposits | Type | Account | Amount
BANK NAME | C | ***7777 | 7,777.77
Total Direct Deposits | 7,777.77
";

pub const DEPOSITS_NONE: &str = "Direct Deposits | Type | Account | Amount
No Direct Deposits
";

pub const TIME_OFF: &str = "Time Off
Available
to Use
Plan Year
Used
";

/// The full stub, with `overrides` replacing individual parts.
pub fn stub_text(overrides: &[(Part, &str)]) -> String {
    let part = |which: Part, default: &'static str| -> String {
        overrides
            .iter()
            .find(|(p, _)| *p == which)
            .map(|(_, text)| text.to_string())
            .unwrap_or_else(|| default.to_string())
    };
    [
        part(Part::Header, HEADER),
        part(Part::Check, CHECK),
        part(Part::Taxes, TAXES),
        part(Part::GrossEarnings, GROSS_EARNINGS),
        part(Part::Deductions, DEDUCTIONS),
        part(Part::Deposits, DEPOSITS),
        part(Part::TimeOff, TIME_OFF),
        part(Part::Footer, FOOTER),
    ]
    .join("\n")
}

/// The record extracted from the unmodified stub.
pub fn expected_pay_data() -> PayData {
    PayData {
        check: CheckInfo {
            check_number: "7777".into(),
            check_date: "July 7, 7777".into(),
            pay_period_start: "July 1, 7777".into(),
            pay_period_end: "July 14, 7777".into(),
            salary: "7,777.77".into(),
            net_pay: "7,777.77".into(),
            fed_tax_income: "7,777.77".into(),
            hours_worked: "77.77".into(),
        },
        gross_earnings: GrossEarnings {
            hours: "77.77".into(),
            period: "7,777.77".into(),
            ytd: "77,777.77".into(),
            regular_rate: "77.7777".into(),
        },
        taxes: PeriodTotals {
            period: "777.77".into(),
            ytd: "7,777.77".into(),
        },
        deductions: PeriodTotals {
            period: "77.77".into(),
            ytd: "777.77".into(),
        },
        deposits: Deposits {
            total: "7,777.77".into(),
        },
    }
}
