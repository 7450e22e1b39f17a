//! Seeded synthetic applicant pools.
//!
//! Stands in for the external loading and risk-scoring steps so the pipeline
//! can be exercised end to end. Borrower attributes are drawn from simple
//! parametric distributions; PD is a linear risk score over those attributes
//! plus Gaussian noise, clamped to [0.009, 0.30]; the expected return is the
//! nominal rate plus a per-category premium.
//!
//! Optional corruption injects implausible records and exact duplicates so
//! the cleaning stage has something to remove.

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use statrs::distribution::{LogNormal, Normal};
use tracing::debug;

use crate::error::AllocationError;
use crate::types::{Applicant, LoanCategory};
use crate::AllocationResult;

const PD_FLOOR: f64 = 0.009;
const PD_CEILING: f64 = 0.30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticConfig {
    pub count: usize,
    pub seed: u64,
    /// Probability that a generated record is corrupted into an implausible one.
    #[serde(default)]
    pub implausible_share: f64,
    /// Probability that an exact copy of an earlier record is appended.
    #[serde(default)]
    pub duplicate_share: f64,
    #[serde(default = "default_median_income")]
    pub median_income: f64,
    #[serde(default = "default_median_amount")]
    pub median_amount: f64,
}

fn default_median_income() -> f64 {
    55_000.0
}

fn default_median_amount() -> f64 {
    9_000.0
}

impl SyntheticConfig {
    pub fn new(count: usize, seed: u64) -> Self {
        Self {
            count,
            seed,
            implausible_share: 0.0,
            duplicate_share: 0.0,
            median_income: default_median_income(),
            median_amount: default_median_amount(),
        }
    }
}

/// Return premium over the nominal rate, by purpose.
pub fn category_premium(category: LoanCategory) -> f64 {
    match category {
        LoanCategory::HomeImprovement => 0.02,
        LoanCategory::Venture => 0.03,
        LoanCategory::Education => 0.01,
        LoanCategory::Personal => 0.005,
        LoanCategory::Medical => 0.005,
        LoanCategory::DebtConsolidation => 0.015,
    }
}

/// Linear risk score before noise and clamping.
pub fn risk_score(a: &Applicant) -> f64 {
    let flag = |b: bool| if b { 1.0 } else { 0.0 };
    let base = a.loan_to_income_ratio * 0.35
        + a.interest_rate / 100.0 * 0.25
        + flag(a.age < 25) * 0.12
        + flag(a.age > 65) * 0.08
        + flag(a.employment_length < 1.0) * 0.10
        + flag(a.credit_history_length < 2.0) * 0.08
        + flag(a.income < 30_000.0) * 0.06;
    let adjustment = -0.02
        - flag(a.income > 100_000.0) * 0.015
        - flag(a.employment_length >= 10.0) * 0.01
        - flag(a.credit_history_length >= 10.0) * 0.01
        - flag((30..=50).contains(&a.age)) * 0.005;
    (base + adjustment).max(0.005)
}

/// Generate `config.count` applicants (plus injected duplicates).
///
/// The same config always yields the same pool.
pub fn generate_pool(config: &SyntheticConfig) -> AllocationResult<Vec<Applicant>> {
    validate(config)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let age_dist = Normal::new(38.0, 10.0).map_err(dist_error)?;
    let income_dist = LogNormal::new(config.median_income.ln(), 0.5).map_err(dist_error)?;
    let amount_dist = LogNormal::new(config.median_amount.ln(), 0.6).map_err(dist_error)?;
    let rate_dist = Normal::new(11.0, 3.0).map_err(dist_error)?;
    let noise_dist = Normal::new(0.0, 0.01).map_err(dist_error)?;

    let mut pool: Vec<Applicant> = Vec::with_capacity(config.count);
    let mut corrupted = 0usize;
    let mut duplicated = 0usize;

    for _ in 0..config.count {
        let age = rng.sample(age_dist).round().clamp(20.0, 75.0) as i32;
        let working_years = (age - 18) as f64;
        let income = (rng.sample(income_dist).clamp(8_000.0, 2_000_000.0) / 100.0).round() * 100.0;
        let employment_length = rng.gen_range(0.0..=working_years.min(30.0)).round();
        let credit_history_length = rng.gen_range(0.0..=working_years.min(30.0)).round();
        let requested_amount = (rng.sample(amount_dist).clamp(500.0, 35_000.0) / 25.0).round() * 25.0;
        let interest_rate = (rng.sample(rate_dist).clamp(5.0, 23.0) * 100.0).round() / 100.0;
        let loan_category = LoanCategory::ALL[rng.gen_range(0..LoanCategory::ALL.len())];

        let mut a = Applicant {
            age,
            income,
            employment_length,
            credit_history_length,
            requested_amount,
            interest_rate,
            loan_to_income_ratio: requested_amount / income,
            loan_category,
            probability_of_default: 0.0,
            expected_return_rate: interest_rate / 100.0 + category_premium(loan_category),
        };
        a.probability_of_default = (risk_score(&a) + rng.sample(noise_dist)).clamp(PD_FLOOR, PD_CEILING);

        if rng.gen_bool(config.implausible_share) {
            corrupt(&mut a, &mut rng);
            corrupted += 1;
        }
        pool.push(a);

        if rng.gen_bool(config.duplicate_share) {
            let source = rng.gen_range(0..pool.len());
            pool.push(pool[source].clone());
            duplicated += 1;
        }
    }

    debug!(
        count = pool.len(),
        corrupted,
        duplicated,
        seed = config.seed,
        "synthetic pool generated"
    );
    Ok(pool)
}

/// Break one plausibility rule, chosen at random.
fn corrupt(a: &mut Applicant, rng: &mut StdRng) {
    match rng.gen_range(0..7) {
        0 => a.age = if rng.gen_bool(0.5) { 15 } else { 144 },
        1 => a.employment_length = a.age as f64 + 5.0,
        2 => a.credit_history_length = -1.0,
        3 => a.income = 0.0,
        4 => a.requested_amount = 2_500_000.0,
        5 => a.interest_rate = 150.0,
        _ => a.loan_to_income_ratio = 7.5,
    }
}

fn validate(config: &SyntheticConfig) -> AllocationResult<()> {
    if config.count == 0 {
        return Err(AllocationError::InvalidInput {
            field: "count".into(),
            reason: "Must be positive.".into(),
        });
    }
    for (field, share) in [
        ("implausible_share", config.implausible_share),
        ("duplicate_share", config.duplicate_share),
    ] {
        if !(0.0..=1.0).contains(&share) {
            return Err(AllocationError::InvalidInput {
                field: field.into(),
                reason: "Must be in [0, 1].".into(),
            });
        }
    }
    for (field, median) in [
        ("median_income", config.median_income),
        ("median_amount", config.median_amount),
    ] {
        if !(median.is_finite() && median > 0.0) {
            return Err(AllocationError::InvalidInput {
                field: field.into(),
                reason: "Must be positive.".into(),
            });
        }
    }
    Ok(())
}

fn dist_error(e: impl std::fmt::Display) -> AllocationError {
    AllocationError::InvalidInput {
        field: "distribution".into(),
        reason: format!("Invalid distribution parameters: {e}"),
    }
}
