use serde::{Deserialize, Serialize};

/// Monetary amounts. Plain `f64`; allocation decisions are binary and every
/// aggregate comparison goes through [`approx_le`].
pub type Money = f64;

/// Rates and probabilities expressed as fractions (0.05 = 5%).
pub type Rate = f64;

/// Durations in years.
pub type Years = f64;

/// Shared tolerance for budget and risk comparisons.
pub const EPSILON: f64 = 1e-9;

/// `a <= b` up to [`EPSILON`], relative to the magnitude of `b`.
pub fn approx_le(a: f64, b: f64) -> bool {
    a <= b + EPSILON * b.abs().max(1.0)
}

/// Loan purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanCategory {
    #[serde(alias = "HOMEIMPROVEMENT")]
    HomeImprovement,
    Venture,
    Education,
    Personal,
    Medical,
    #[serde(alias = "DEBTCONSOLIDATION")]
    DebtConsolidation,
}

impl LoanCategory {
    pub const ALL: [LoanCategory; 6] = [
        LoanCategory::HomeImprovement,
        LoanCategory::Venture,
        LoanCategory::Education,
        LoanCategory::Personal,
        LoanCategory::Medical,
        LoanCategory::DebtConsolidation,
    ];
}

impl std::fmt::Display for LoanCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoanCategory::HomeImprovement => write!(f, "HOME_IMPROVEMENT"),
            LoanCategory::Venture => write!(f, "VENTURE"),
            LoanCategory::Education => write!(f, "EDUCATION"),
            LoanCategory::Personal => write!(f, "PERSONAL"),
            LoanCategory::Medical => write!(f, "MEDICAL"),
            LoanCategory::DebtConsolidation => write!(f, "DEBT_CONSOLIDATION"),
        }
    }
}

/// A single loan application.
///
/// `probability_of_default` and `expected_return_rate` come from an external
/// risk-scoring step; the engine treats them as opaque inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Applicant {
    pub age: i32,
    pub income: Money,
    pub employment_length: Years,
    pub credit_history_length: Years,
    pub requested_amount: Money,
    /// Nominal interest rate in percent (12.5 = 12.5%).
    pub interest_rate: f64,
    pub loan_to_income_ratio: Rate,
    pub loan_category: LoanCategory,
    pub probability_of_default: Rate,
    pub expected_return_rate: Rate,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "ieee754_f64".to_string(),
        },
    }
}
