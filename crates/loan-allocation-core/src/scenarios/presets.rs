//! Built-in scenario presets.
//!
//! Two lending policies over the same pipeline:
//! 1. **expansion** -- 85% of the budget, 10% risk cap, strict compliance
//!    thresholds, tightened eligibility when the baseline admits over 10,000
//!    applicants, profitability fallback
//! 2. **asset-protection** -- 70% of the budget, 12% risk cap, at most 5,000
//!    clients, loosened eligibility below 5,000, lowest-risk fallback
//!
//! The constants are policy parameters. Callers wanting different ones should
//! start from a preset and override fields, or load a config file.

use std::collections::BTreeMap;

use crate::allocation::config::{
    ComplianceThresholds, CountBand, FallbackConfig, RiskFormulation, ScenarioConfig, SolverConfig,
    SolverFailurePolicy,
};
use crate::eligibility::{EligibilityConfig, EligibilityCriteria, QualityWeights};
use crate::error::AllocationError;
use crate::types::LoanCategory;
use crate::AllocationResult;

/// Budget shared by both presets.
pub const DEFAULT_TOTAL_BUDGET: f64 = 124_972_520.0;

pub const PRESET_NAMES: [&str; 2] = ["expansion", "asset-protection"];

pub fn expansion() -> ScenarioConfig {
    ScenarioConfig {
        name: "expansion".into(),
        total_budget: DEFAULT_TOTAL_BUDGET,
        budget_utilization_fraction: 0.85,
        risk_cap: 0.10,
        category_targets: BTreeMap::from([
            (LoanCategory::HomeImprovement, 0.30),
            (LoanCategory::Venture, 0.25),
            (LoanCategory::Education, 0.15),
            (LoanCategory::Personal, 0.10),
            (LoanCategory::Medical, 0.10),
            (LoanCategory::DebtConsolidation, 0.10),
        ]),
        category_tolerance: 0.05,
        enforce_category_bands: false,
        client_count_band: CountBand::default(),
        loss_given_default: None,
        risk_formulation: RiskFormulation::BudgetScaled,
        eligibility: EligibilityConfig {
            baseline: EligibilityCriteria {
                max_pd: 0.10,
                min_income: 25_000.0,
                min_employment: 0.5,
                min_history: 1.0,
                max_ratio: 0.35,
                min_age: 20,
                max_age: 70,
            },
            loosened: None,
            loosen_below: 0,
            tightened: Some(EligibilityCriteria {
                max_pd: 0.10,
                min_income: 35_000.0,
                min_employment: 1.0,
                min_history: 2.0,
                max_ratio: 0.30,
                min_age: 22,
                max_age: 65,
            }),
            tighten_above: Some(10_000),
            quality_ceiling: Some(8_500),
            target_count: 8_000,
            quality_weights: QualityWeights {
                risk: 0.35,
                income: 0.25,
                employment: 0.20,
                history: 0.20,
                risk_scale: 1.0,
                income_scale: 150_000.0,
                employment_scale: 20.0,
                history_scale: 25.0,
            },
        },
        fallback: FallbackConfig::default(),
        min_pool_size: 100,
        solver: SolverConfig::default(),
        compliance: ComplianceThresholds::default(),
    }
}

pub fn asset_protection() -> ScenarioConfig {
    ScenarioConfig {
        name: "asset-protection".into(),
        total_budget: DEFAULT_TOTAL_BUDGET,
        budget_utilization_fraction: 0.70,
        risk_cap: 0.12,
        // Sums to 105%; reported as an advisory.
        category_targets: BTreeMap::from([
            (LoanCategory::Education, 0.30),
            (LoanCategory::Medical, 0.30),
            (LoanCategory::Personal, 0.15),
            (LoanCategory::Venture, 0.10),
            (LoanCategory::HomeImprovement, 0.10),
            (LoanCategory::DebtConsolidation, 0.10),
        ]),
        category_tolerance: 0.05,
        enforce_category_bands: false,
        client_count_band: CountBand {
            min: None,
            max: Some(5_000),
        },
        loss_given_default: None,
        risk_formulation: RiskFormulation::BudgetScaled,
        eligibility: EligibilityConfig {
            baseline: EligibilityCriteria {
                max_pd: 0.15,
                min_income: 18_000.0,
                min_employment: 0.1,
                min_history: 0.3,
                max_ratio: 0.40,
                min_age: 19,
                max_age: 72,
            },
            loosened: Some(EligibilityCriteria {
                max_pd: 0.25,
                min_income: 15_000.0,
                min_employment: 0.1,
                min_history: 0.2,
                max_ratio: 0.50,
                min_age: 18,
                max_age: 75,
            }),
            loosen_below: 5_000,
            tightened: None,
            tighten_above: None,
            quality_ceiling: Some(6_000),
            target_count: 4_500,
            quality_weights: QualityWeights {
                risk: 0.40,
                income: 0.25,
                employment: 0.20,
                history: 0.15,
                risk_scale: 1.0,
                income_scale: 100_000.0,
                employment_scale: 15.0,
                history_scale: 20.0,
            },
        },
        fallback: FallbackConfig {
            on_solver_failure: SolverFailurePolicy::LowestRisk { slice: 500 },
            rescue_weights: QualityWeights {
                risk: 0.6,
                income: 0.4,
                employment: 0.0,
                history: 0.0,
                risk_scale: 1.0,
                income_scale: 200_000.0,
                employment_scale: 1.0,
                history_scale: 1.0,
            },
            rescue_slice: 50,
        },
        min_pool_size: 50,
        solver: SolverConfig::default(),
        compliance: ComplianceThresholds {
            stable_employment_years: 3.0,
            min_stable_employment_share: 0.60,
            good_history_years: 4.0,
            min_good_history_share: 0.60,
            min_mean_age: 20.0,
            max_mean_age: 70.0,
            min_mean_income: 18_000.0,
            max_mean_ratio: 0.40,
        },
    }
}

/// Look up a preset by name. Accepts `asset_protection` as well.
pub fn by_name(name: &str) -> AllocationResult<ScenarioConfig> {
    match name.to_ascii_lowercase().replace('_', "-").as_str() {
        "expansion" => Ok(expansion()),
        "asset-protection" => Ok(asset_protection()),
        other => Err(AllocationError::InvalidInput {
            field: "scenario".into(),
            reason: format!(
                "Unknown preset '{other}'. Expected one of: {}.",
                PRESET_NAMES.join(", ")
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(expansion().validate().is_ok());
        assert!(asset_protection().validate().is_ok());
    }

    #[test]
    fn test_effective_budgets() {
        assert!((expansion().effective_budget() - 106_226_642.0).abs() < 1e-3);
        assert!((asset_protection().effective_budget() - 87_480_764.0).abs() < 1e-3);
    }

    #[test]
    fn test_asset_protection_targets_flagged() {
        let notes = asset_protection().advisories();
        assert_eq!(notes.len(), 1);
        assert!(expansion().advisories().is_empty());
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(by_name("expansion").unwrap().name, "expansion");
        assert_eq!(by_name("Asset_Protection").unwrap().name, "asset-protection");
        assert!(by_name("aggressive").is_err());
    }
}
