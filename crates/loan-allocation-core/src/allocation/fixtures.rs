//! Shared builders for the allocation unit tests.

use std::collections::BTreeMap;

use super::config::{
    ComplianceThresholds, CountBand, FallbackConfig, RiskFormulation, ScenarioConfig, SolverConfig,
};
use crate::eligibility::{EligibilityConfig, EligibilityCriteria};
use crate::types::{Applicant, LoanCategory};

pub(crate) fn applicant(amount: f64, pd: f64, return_rate: f64) -> Applicant {
    Applicant {
        age: 40,
        income: 60_000.0,
        employment_length: 8.0,
        credit_history_length: 10.0,
        requested_amount: amount,
        interest_rate: return_rate * 100.0,
        loan_to_income_ratio: amount / 60_000.0,
        loan_category: LoanCategory::Personal,
        probability_of_default: pd,
        expected_return_rate: return_rate,
    }
}

/// Permissive scenario: every plausible record is eligible, no bands.
pub(crate) fn minimal_config() -> ScenarioConfig {
    ScenarioConfig {
        name: "test".into(),
        total_budget: 1_000.0,
        budget_utilization_fraction: 1.0,
        risk_cap: 0.05,
        category_targets: BTreeMap::new(),
        category_tolerance: 0.05,
        enforce_category_bands: false,
        client_count_band: CountBand::default(),
        loss_given_default: None,
        risk_formulation: RiskFormulation::BudgetScaled,
        eligibility: EligibilityConfig {
            baseline: EligibilityCriteria {
                max_pd: 1.0,
                min_income: 0.0,
                min_employment: 0.0,
                min_history: 0.0,
                max_ratio: 5.0,
                min_age: 18,
                max_age: 100,
            },
            loosened: None,
            loosen_below: 0,
            tightened: None,
            tighten_above: None,
            quality_ceiling: None,
            target_count: 0,
            quality_weights: FallbackConfig::default().rescue_weights,
        },
        fallback: FallbackConfig::default(),
        min_pool_size: 1,
        solver: SolverConfig::default(),
        compliance: ComplianceThresholds::default(),
    }
}
