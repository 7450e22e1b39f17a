//! Staged eligibility filter.
//!
//! 1. **Baseline** criteria over the full pool
//! 2. **Loosened** criteria, once, when the baseline count is below the floor
//! 3. **Tightened** criteria, once, when the baseline count is above the
//!    tightening threshold
//! 4. **Quality ranking** to `target_count` when the survivors still exceed
//!    the ceiling
//!
//! The filter returns indices into the pool and never touches the records.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::criteria::EligibilityCriteria;
use super::quality::QualityWeights;
use crate::error::AllocationError;
use crate::types::Applicant;
use crate::AllocationResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityConfig {
    pub baseline: EligibilityCriteria,
    /// Wider thresholds used once when the baseline is too restrictive.
    #[serde(default)]
    pub loosened: Option<EligibilityCriteria>,
    /// Floor on the baseline count below which `loosened` applies.
    #[serde(default)]
    pub loosen_below: usize,
    /// Stricter thresholds used once when the baseline admits too many.
    #[serde(default)]
    pub tightened: Option<EligibilityCriteria>,
    #[serde(default)]
    pub tighten_above: Option<usize>,
    /// Count above which survivors are quality-ranked down to `target_count`.
    #[serde(default)]
    pub quality_ceiling: Option<usize>,
    pub target_count: usize,
    pub quality_weights: QualityWeights,
}

impl EligibilityConfig {
    pub fn validate(&self) -> AllocationResult<()> {
        self.baseline.validate("eligibility.baseline")?;
        if let Some(l) = &self.loosened {
            l.validate("eligibility.loosened")?;
        }
        if let Some(t) = &self.tightened {
            t.validate("eligibility.tightened")?;
        }
        self.quality_weights
            .validate("eligibility.quality_weights")?;
        if self.quality_ceiling.is_some() && self.target_count == 0 {
            return Err(AllocationError::InvalidInput {
                field: "eligibility.target_count".into(),
                reason: "Must be positive when a quality ceiling is set.".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityStage {
    Baseline,
    Loosened,
    Tightened,
    QualityRanked,
}

impl std::fmt::Display for EligibilityStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EligibilityStage::Baseline => write!(f, "Baseline"),
            EligibilityStage::Loosened => write!(f, "Loosened"),
            EligibilityStage::Tightened => write!(f, "Tightened"),
            EligibilityStage::QualityRanked => write!(f, "QualityRanked"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCount {
    pub stage: EligibilityStage,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityOutcome {
    /// Indices into the pool. Pool order, except after quality ranking where
    /// they follow descending score.
    pub indices: Vec<usize>,
    /// Stage that produced `indices`.
    pub stage: EligibilityStage,
    /// Every stage applied, with the count it produced.
    pub steps: Vec<StageCount>,
}

impl EligibilityOutcome {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Narrow `pool` to the applicants meeting the configured policy.
///
/// An empty result is returned as-is; the caller decides what it means.
pub fn filter(pool: &[Applicant], config: &EligibilityConfig) -> AllocationResult<EligibilityOutcome> {
    config.validate()?;

    let mut indices = config.baseline.admitted_indices(pool);
    let mut stage = EligibilityStage::Baseline;
    let mut steps = vec![StageCount {
        stage,
        count: indices.len(),
    }];
    debug!(count = indices.len(), "baseline eligibility");

    if indices.len() < config.loosen_below {
        if let Some(loosened) = &config.loosened {
            indices = loosened.admitted_indices(pool);
            stage = EligibilityStage::Loosened;
            steps.push(StageCount {
                stage,
                count: indices.len(),
            });
            info!(count = indices.len(), floor = config.loosen_below, "baseline too narrow; loosened criteria applied");
        }
    } else if let (Some(tightened), Some(threshold)) = (&config.tightened, config.tighten_above) {
        if indices.len() > threshold {
            indices = tightened.admitted_indices(pool);
            stage = EligibilityStage::Tightened;
            steps.push(StageCount {
                stage,
                count: indices.len(),
            });
            info!(count = indices.len(), threshold, "baseline too wide; tightened criteria applied");
        }
    }

    if let Some(ceiling) = config.quality_ceiling {
        if indices.len() > ceiling {
            indices = config
                .quality_weights
                .rank(pool, &indices, config.target_count);
            stage = EligibilityStage::QualityRanked;
            steps.push(StageCount {
                stage,
                count: indices.len(),
            });
            info!(count = indices.len(), ceiling, "eligible pool quality-ranked");
        }
    }

    Ok(EligibilityOutcome {
        indices,
        stage,
        steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LoanCategory;

    fn applicant(pd: f64, income: f64) -> Applicant {
        Applicant {
            age: 35,
            income,
            employment_length: 5.0,
            credit_history_length: 6.0,
            requested_amount: 5_000.0,
            interest_rate: 10.0,
            loan_to_income_ratio: 5_000.0 / income,
            loan_category: LoanCategory::Personal,
            probability_of_default: pd,
            expected_return_rate: 0.105,
        }
    }

    fn criteria(max_pd: f64, min_income: f64) -> EligibilityCriteria {
        EligibilityCriteria {
            max_pd,
            min_income,
            min_employment: 0.0,
            min_history: 0.0,
            max_ratio: 1.0,
            min_age: 18,
            max_age: 100,
        }
    }

    fn config() -> EligibilityConfig {
        EligibilityConfig {
            baseline: criteria(0.05, 30_000.0),
            loosened: Some(criteria(0.20, 20_000.0)),
            loosen_below: 0,
            tightened: None,
            tighten_above: None,
            quality_ceiling: None,
            target_count: 0,
            quality_weights: QualityWeights {
                risk: 0.6,
                income: 0.4,
                employment: 0.0,
                history: 0.0,
                risk_scale: 1.0,
                income_scale: 100_000.0,
                employment_scale: 1.0,
                history_scale: 1.0,
            },
        }
    }

    fn pool() -> Vec<Applicant> {
        vec![
            applicant(0.03, 50_000.0),
            applicant(0.10, 50_000.0),
            applicant(0.04, 25_000.0),
            applicant(0.15, 80_000.0),
            applicant(0.01, 90_000.0),
        ]
    }

    #[test]
    fn test_baseline_only() {
        let out = filter(&pool(), &config()).unwrap();
        assert_eq!(out.stage, EligibilityStage::Baseline);
        assert_eq!(out.indices, vec![0, 4]);
    }

    #[test]
    fn test_loosened_when_below_floor() {
        let mut cfg = config();
        cfg.loosen_below = 3;
        let out = filter(&pool(), &cfg).unwrap();
        assert_eq!(out.stage, EligibilityStage::Loosened);
        assert_eq!(out.indices, vec![0, 1, 2, 3, 4]);
        assert_eq!(out.steps.len(), 2);
    }

    #[test]
    fn test_loosening_is_one_shot() {
        let mut cfg = config();
        cfg.loosen_below = 10;
        cfg.loosened = Some(criteria(0.05, 40_000.0));
        let out = filter(&pool(), &cfg).unwrap();
        // Still below the floor after loosening; no further relaxation.
        assert_eq!(out.stage, EligibilityStage::Loosened);
        assert_eq!(out.indices, vec![0, 4]);
    }

    #[test]
    fn test_tightened_when_above_threshold() {
        let mut cfg = config();
        cfg.baseline = criteria(0.20, 0.0);
        cfg.tightened = Some(criteria(0.05, 0.0));
        cfg.tighten_above = Some(4);
        let out = filter(&pool(), &cfg).unwrap();
        assert_eq!(out.stage, EligibilityStage::Tightened);
        assert_eq!(out.indices, vec![0, 2, 4]);
    }

    #[test]
    fn test_quality_ranking_above_ceiling() {
        let mut cfg = config();
        cfg.baseline = criteria(0.20, 0.0);
        cfg.quality_ceiling = Some(3);
        cfg.target_count = 2;
        let out = filter(&pool(), &cfg).unwrap();
        assert_eq!(out.stage, EligibilityStage::QualityRanked);
        // Scores: 0 -> .782, 1 -> .74, 2 -> .676, 3 -> .83, 4 -> .954
        assert_eq!(out.indices, vec![4, 3]);
    }

    #[test]
    fn test_empty_when_nothing_qualifies() {
        let mut cfg = config();
        cfg.baseline = criteria(0.0, 1_000_000.0);
        cfg.loosened = Some(criteria(0.0, 1_000_000.0));
        cfg.loosen_below = 1;
        let out = filter(&pool(), &cfg).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_empty_pool() {
        let out = filter(&[], &config()).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.stage, EligibilityStage::Baseline);
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let mut cfg = config();
        cfg.quality_weights.income = 0.9;
        assert!(filter(&pool(), &cfg).is_err());
    }
}
