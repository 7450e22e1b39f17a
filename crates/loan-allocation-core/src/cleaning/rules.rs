//! Record-level plausibility rules.
//!
//! Each rule inspects one field (or a field against `age`) and returns the
//! sub-reasons it fires for. A record passes a rule when no sub-reason fires.
//! Non-finite values always fail the rule that owns the field.

use serde::{Deserialize, Serialize};

use crate::types::Applicant;

pub const MIN_AGE: i32 = 18;
pub const MAX_AGE: i32 = 100;
/// Ceiling on employment and credit-history length, in years.
pub const MAX_TENURE_YEARS: f64 = 80.0;
pub const MAX_INCOME: f64 = 10_000_000.0;
pub const MAX_REQUESTED_AMOUNT: f64 = 1_000_000.0;
/// Interest rates are stored in percent.
pub const MAX_INTEREST_RATE_PCT: f64 = 100.0;
pub const MAX_LOAN_TO_INCOME: f64 = 5.0;

/// One plausibility rule. Order of [`ValidationRule::ALL`] is the order the
/// cleaning report lists them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationRule {
    Age,
    EmploymentLength,
    CreditHistoryLength,
    Income,
    RequestedAmount,
    InterestRate,
    LoanToIncomeRatio,
}

impl ValidationRule {
    pub const ALL: [ValidationRule; 7] = [
        ValidationRule::Age,
        ValidationRule::EmploymentLength,
        ValidationRule::CreditHistoryLength,
        ValidationRule::Income,
        ValidationRule::RequestedAmount,
        ValidationRule::InterestRate,
        ValidationRule::LoanToIncomeRatio,
    ];

    /// Stable machine name used in reports.
    pub fn name(&self) -> &'static str {
        match self {
            ValidationRule::Age => "age",
            ValidationRule::EmploymentLength => "employment_length",
            ValidationRule::CreditHistoryLength => "credit_history_length",
            ValidationRule::Income => "income",
            ValidationRule::RequestedAmount => "requested_amount",
            ValidationRule::InterestRate => "interest_rate",
            ValidationRule::LoanToIncomeRatio => "loan_to_income_ratio",
        }
    }

    fn subject(&self) -> &'static str {
        match self {
            ValidationRule::Age => "unrealistic ages",
            ValidationRule::EmploymentLength => "employment length issues",
            ValidationRule::CreditHistoryLength => "credit history issues",
            ValidationRule::Income => "income issues",
            ValidationRule::RequestedAmount => "loan amount issues",
            ValidationRule::InterestRate => "interest rate issues",
            ValidationRule::LoanToIncomeRatio => "loan-to-income ratio issues",
        }
    }

    /// Human-readable summary for a removal count.
    pub fn describe_removal(&self, count: usize) -> String {
        format!("Removed {} records with {}", count, self.subject())
    }

    /// Sub-reasons this rule fires for on `a`. Empty means the record passes.
    pub fn violations(&self, a: &Applicant) -> Vec<&'static str> {
        let mut out = Vec::new();
        match self {
            ValidationRule::Age => {
                if a.age < MIN_AGE {
                    out.push("below 18");
                }
                if a.age > MAX_AGE {
                    out.push("above 100");
                }
            }
            ValidationRule::EmploymentLength => {
                tenure_violations(a.employment_length, a.age, &mut out);
            }
            ValidationRule::CreditHistoryLength => {
                tenure_violations(a.credit_history_length, a.age, &mut out);
            }
            ValidationRule::Income => {
                bounded_positive(a.income, MAX_INCOME, "above 10M", &mut out);
            }
            ValidationRule::RequestedAmount => {
                bounded_positive(a.requested_amount, MAX_REQUESTED_AMOUNT, "above 1M", &mut out);
            }
            ValidationRule::InterestRate => {
                bounded_positive(a.interest_rate, MAX_INTEREST_RATE_PCT, "above 100%", &mut out);
            }
            ValidationRule::LoanToIncomeRatio => {
                bounded_positive(a.loan_to_income_ratio, MAX_LOAN_TO_INCOME, "above 500%", &mut out);
            }
        }
        out
    }

    pub fn passes(&self, a: &Applicant) -> bool {
        self.violations(a).is_empty()
    }
}

impl std::fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn tenure_violations(years: f64, age: i32, out: &mut Vec<&'static str>) {
    if !years.is_finite() {
        out.push("not a finite number");
        return;
    }
    if years > f64::from(age) {
        out.push("exceeds age");
    }
    if years > MAX_TENURE_YEARS {
        out.push("exceeds 80 years");
    }
    if years < 0.0 {
        out.push("negative");
    }
}

fn bounded_positive(value: f64, max: f64, above: &'static str, out: &mut Vec<&'static str>) {
    if !value.is_finite() {
        out.push("not a finite number");
        return;
    }
    if value <= 0.0 {
        out.push("zero or negative");
    }
    if value > max {
        out.push(above);
    }
}

/// True when `a` passes every rule.
pub fn is_plausible(a: &Applicant) -> bool {
    ValidationRule::ALL.iter().all(|r| r.passes(a))
}
