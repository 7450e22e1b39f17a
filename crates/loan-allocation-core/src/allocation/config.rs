//! Scenario configuration.
//!
//! Every policy constant (budgets, caps, targets, thresholds, fallback
//! weights) lives here so the engine itself stays scenario-agnostic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::eligibility::{EligibilityConfig, QualityWeights};
use crate::error::AllocationError;
use crate::types::{LoanCategory, Money, Rate};
use crate::AllocationResult;

// ---------------------------------------------------------------------------
// Sub-configurations
// ---------------------------------------------------------------------------

/// Risk row of the LP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFormulation {
    /// Σ PD·amount·x ≤ risk_cap · budget
    #[default]
    BudgetScaled,
    /// Σ (PD − risk_cap)·amount·x ≤ 0, the exact weighted-average cap.
    ExactAverage,
}

/// Advisory lower and binding upper bound on the number of allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CountBand {
    #[serde(default)]
    pub min: Option<usize>,
    #[serde(default)]
    pub max: Option<usize>,
}

impl CountBand {
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// What to do when the LP cannot be solved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum SolverFailurePolicy {
    /// Descending `return_rate / (amount / 1000)`, budget and average risk
    /// enforced.
    Profitability,
    /// The `slice` lowest-PD candidates, budget enforced.
    LowestRisk { slice: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackConfig {
    pub on_solver_failure: SolverFailurePolicy,
    /// Score used when nothing was allocated.
    pub rescue_weights: QualityWeights,
    pub rescue_slice: usize,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            on_solver_failure: SolverFailurePolicy::Profitability,
            rescue_weights: QualityWeights {
                risk: 0.3,
                income: 0.3,
                employment: 0.2,
                history: 0.2,
                risk_scale: 0.5,
                income_scale: 100_000.0,
                employment_scale: 10.0,
                history_scale: 15.0,
            },
            rescue_slice: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverConfig {
    pub max_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50_000,
        }
    }
}

/// Thresholds of the post-allocation compliance scorecard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceThresholds {
    pub stable_employment_years: f64,
    pub min_stable_employment_share: Rate,
    pub good_history_years: f64,
    pub min_good_history_share: Rate,
    pub min_mean_age: f64,
    pub max_mean_age: f64,
    pub min_mean_income: Money,
    pub max_mean_ratio: Rate,
}

impl Default for ComplianceThresholds {
    fn default() -> Self {
        Self {
            stable_employment_years: 2.0,
            min_stable_employment_share: 0.80,
            good_history_years: 3.0,
            min_good_history_share: 0.80,
            min_mean_age: 25.0,
            max_mean_age: 50.0,
            min_mean_income: 50_000.0,
            max_mean_ratio: 0.20,
        }
    }
}

// ---------------------------------------------------------------------------
// ScenarioConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    pub total_budget: Money,
    /// Share of `total_budget` the scenario may deploy.
    #[serde(default = "default_utilization")]
    pub budget_utilization_fraction: Rate,
    /// Ceiling on the weighted-average PD of the allocated portfolio.
    pub risk_cap: Rate,
    #[serde(default)]
    pub category_targets: BTreeMap<LoanCategory, Rate>,
    #[serde(default = "default_category_tolerance")]
    pub category_tolerance: Rate,
    /// Turn category targets into hard LP rows. Advisory otherwise.
    #[serde(default)]
    pub enforce_category_bands: bool,
    #[serde(default)]
    pub client_count_band: CountBand,
    #[serde(default)]
    pub loss_given_default: Option<Rate>,
    #[serde(default)]
    pub risk_formulation: RiskFormulation,
    pub eligibility: EligibilityConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
    #[serde(default = "default_min_pool_size")]
    pub min_pool_size: usize,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub compliance: ComplianceThresholds,
}

fn default_utilization() -> Rate {
    1.0
}

fn default_category_tolerance() -> Rate {
    0.05
}

fn default_min_pool_size() -> usize {
    50
}

impl ScenarioConfig {
    /// Budget the allocation may actually spend.
    pub fn effective_budget(&self) -> Money {
        self.total_budget * self.budget_utilization_fraction
    }

    /// `[lower, upper]` money band for `category`, when it has a target.
    pub fn category_band(&self, category: LoanCategory) -> Option<(Money, Money)> {
        self.category_targets.get(&category).map(|share| {
            let center = share * self.effective_budget();
            (
                center * (1.0 - self.category_tolerance),
                center * (1.0 + self.category_tolerance),
            )
        })
    }

    pub fn validate(&self) -> AllocationResult<()> {
        if !(self.total_budget.is_finite() && self.total_budget > 0.0) {
            return Err(invalid("total_budget", "Must be positive."));
        }
        if !(self.budget_utilization_fraction > 0.0 && self.budget_utilization_fraction <= 1.0) {
            return Err(invalid("budget_utilization_fraction", "Must be in (0, 1]."));
        }
        if !(0.0..=1.0).contains(&self.risk_cap) {
            return Err(invalid("risk_cap", "Must be in [0, 1]."));
        }
        if !(0.0..1.0).contains(&self.category_tolerance) {
            return Err(invalid("category_tolerance", "Must be in [0, 1)."));
        }
        for (category, share) in &self.category_targets {
            if !(0.0..=1.0).contains(share) {
                return Err(invalid(
                    &format!("category_targets.{category}"),
                    "Target share must be in [0, 1].",
                ));
            }
        }
        if let Some(lgd) = self.loss_given_default {
            if !(0.0..=1.0).contains(&lgd) {
                return Err(invalid("loss_given_default", "Must be in [0, 1]."));
            }
        }
        if let (Some(min), Some(max)) = (self.client_count_band.min, self.client_count_band.max) {
            if min > max {
                return Err(invalid(
                    "client_count_band",
                    &format!("min ({min}) exceeds max ({max})."),
                ));
            }
        }
        if self.solver.max_iterations == 0 {
            return Err(invalid("solver.max_iterations", "Must be positive."));
        }
        if let SolverFailurePolicy::LowestRisk { slice: 0 } = self.fallback.on_solver_failure {
            return Err(invalid("fallback.on_solver_failure.slice", "Must be positive."));
        }
        if self.fallback.rescue_slice == 0 {
            return Err(invalid("fallback.rescue_slice", "Must be positive."));
        }
        self.fallback
            .rescue_weights
            .validate("fallback.rescue_weights")?;
        self.eligibility.validate()?;
        Ok(())
    }

    /// Non-fatal configuration remarks, surfaced as warnings.
    pub fn advisories(&self) -> Vec<String> {
        let mut notes = Vec::new();
        let total: f64 = self.category_targets.values().sum();
        if !self.category_targets.is_empty() && (total - 1.0).abs() > 1e-6 {
            notes.push(format!(
                "Category targets sum to {:.2}% rather than 100%",
                total * 100.0
            ));
        }
        if self.enforce_category_bands && self.category_targets.is_empty() {
            notes.push("Category bands enforced but no targets configured".to_string());
        }
        notes
    }
}

fn invalid(field: &str, reason: &str) -> AllocationError {
    AllocationError::InvalidInput {
        field: field.into(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::fixtures::minimal_config;

    #[test]
    fn test_effective_budget_and_band() {
        let mut cfg = minimal_config();
        cfg.budget_utilization_fraction = 0.8;
        cfg.category_targets.insert(LoanCategory::Medical, 0.25);
        assert!((cfg.effective_budget() - 800.0).abs() < 1e-9);
        let (lo, hi) = cfg.category_band(LoanCategory::Medical).unwrap();
        assert!((lo - 190.0).abs() < 1e-9);
        assert!((hi - 210.0).abs() < 1e-9);
        assert!(cfg.category_band(LoanCategory::Venture).is_none());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut cfg = minimal_config();
        cfg.risk_cap = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = minimal_config();
        cfg.total_budget = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = minimal_config();
        cfg.client_count_band = CountBand {
            min: Some(10),
            max: Some(5),
        };
        assert!(cfg.validate().is_err());

        assert!(minimal_config().validate().is_ok());
    }

    #[test]
    fn test_target_sum_advisory() {
        let mut cfg = minimal_config();
        cfg.category_targets.insert(LoanCategory::Medical, 0.6);
        cfg.category_targets.insert(LoanCategory::Education, 0.45);
        let notes = cfg.advisories();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].contains("105.00%"));
    }

    #[test]
    fn test_optional_fields_default_from_json() {
        let json = serde_json::json!({
            "name": "mini",
            "total_budget": 500.0,
            "risk_cap": 0.1,
            "category_targets": { "MEDICAL": 0.5, "HOMEIMPROVEMENT": 0.5 },
            "eligibility": serde_json::to_value(&minimal_config().eligibility).unwrap(),
        });
        let cfg: ScenarioConfig = serde_json::from_value(json).unwrap();
        assert_eq!(cfg.budget_utilization_fraction, 1.0);
        assert_eq!(cfg.category_tolerance, 0.05);
        assert_eq!(cfg.min_pool_size, 50);
        assert_eq!(cfg.risk_formulation, RiskFormulation::BudgetScaled);
        assert_eq!(
            cfg.category_targets.get(&LoanCategory::HomeImprovement),
            Some(&0.5)
        );
        assert!(cfg.validate().is_ok());
    }
}
