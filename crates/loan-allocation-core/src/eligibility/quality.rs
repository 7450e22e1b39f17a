//! Composite applicant quality score.
//!
//! score = w_risk * (1 - PD) / risk_scale
//!       + w_income * income / income_scale
//!       + w_employment * employment_length / employment_scale
//!       + w_history * credit_history_length / history_scale
//!
//! Weights must sum to 1. Scales are scenario parameters.

use serde::{Deserialize, Serialize};

use crate::error::AllocationError;
use crate::types::Applicant;
use crate::AllocationResult;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityWeights {
    pub risk: f64,
    pub income: f64,
    pub employment: f64,
    pub history: f64,
    #[serde(default = "one")]
    pub risk_scale: f64,
    pub income_scale: f64,
    pub employment_scale: f64,
    pub history_scale: f64,
}

fn one() -> f64 {
    1.0
}

impl QualityWeights {
    pub fn score(&self, a: &Applicant) -> f64 {
        self.risk * (1.0 - a.probability_of_default) / self.risk_scale
            + self.income * a.income / self.income_scale
            + self.employment * a.employment_length / self.employment_scale
            + self.history * a.credit_history_length / self.history_scale
    }

    /// Top `take` of `candidates` by descending score. Ties keep the order of
    /// `candidates`.
    pub fn rank(&self, pool: &[Applicant], candidates: &[usize], take: usize) -> Vec<usize> {
        let mut scored: Vec<(usize, f64)> = candidates
            .iter()
            .map(|&i| (i, self.score(&pool[i])))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.into_iter().take(take).map(|(i, _)| i).collect()
    }

    pub fn validate(&self, field: &str) -> AllocationResult<()> {
        let weights = [self.risk, self.income, self.employment, self.history];
        if weights.iter().any(|w| *w < 0.0 || !w.is_finite()) {
            return Err(AllocationError::InvalidInput {
                field: field.into(),
                reason: "Weights must be finite and non-negative.".into(),
            });
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(AllocationError::InvalidInput {
                field: field.into(),
                reason: format!("Weights must sum to 1, got {sum}."),
            });
        }
        let scales = [
            self.risk_scale,
            self.income_scale,
            self.employment_scale,
            self.history_scale,
        ];
        if scales.iter().any(|s| *s <= 0.0 || !s.is_finite()) {
            return Err(AllocationError::InvalidInput {
                field: field.into(),
                reason: "Normalization scales must be positive.".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LoanCategory;

    fn weights() -> QualityWeights {
        QualityWeights {
            risk: 0.35,
            income: 0.25,
            employment: 0.20,
            history: 0.20,
            risk_scale: 1.0,
            income_scale: 150_000.0,
            employment_scale: 20.0,
            history_scale: 25.0,
        }
    }

    fn applicant(pd: f64, income: f64) -> Applicant {
        Applicant {
            age: 40,
            income,
            employment_length: 10.0,
            credit_history_length: 12.5,
            requested_amount: 10_000.0,
            interest_rate: 10.0,
            loan_to_income_ratio: 10_000.0 / income,
            loan_category: LoanCategory::Medical,
            probability_of_default: pd,
            expected_return_rate: 0.105,
        }
    }

    #[test]
    fn test_score_components() {
        // 0.35*0.9 + 0.25*0.5 + 0.20*0.5 + 0.20*0.5 = 0.64
        let s = weights().score(&applicant(0.10, 75_000.0));
        assert!((s - 0.64).abs() < 1e-12, "score={s}");
    }

    #[test]
    fn test_rank_is_stable_on_ties() {
        let pool = vec![
            applicant(0.05, 50_000.0),
            applicant(0.02, 50_000.0),
            applicant(0.05, 50_000.0),
            applicant(0.05, 50_000.0),
        ];
        let ranked = weights().rank(&pool, &[0, 1, 2, 3], 3);
        assert_eq!(ranked, vec![1, 0, 2]);
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut w = weights();
        w.history = 0.30;
        assert!(w.validate("quality_weights").is_err());
        assert!(weights().validate("quality_weights").is_ok());
    }

    #[test]
    fn test_zero_scale_rejected() {
        let mut w = weights();
        w.income_scale = 0.0;
        assert!(w.validate("quality_weights").is_err());
    }
}
