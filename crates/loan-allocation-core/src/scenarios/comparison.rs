use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::allocation::chain::StrategyKind;
use crate::allocation::compliance::ComplianceStatus;
use crate::allocation::{run_allocation, ScenarioConfig};
use crate::error::AllocationError;
use crate::types::*;
use crate::AllocationResult;

/// Headline figures of one scenario run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub strategy: StrategyKind,
    pub selected_count: usize,
    pub allocated_amount: Money,
    pub expected_revenue: Money,
    pub weighted_pd: Rate,
    pub risk_cap: Rate,
    pub budget_utilization: Rate,
    pub compliance_score: f64,
    pub compliance_status: ComplianceStatus,
    /// Revenue difference against the first scenario.
    pub revenue_vs_first: Money,
    pub warnings: usize,
}

/// Side-by-side comparison of several scenarios over the same records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub results: Vec<ScenarioResult>,
    /// Name of the scenario with the highest expected revenue.
    pub highest_revenue: String,
    /// Name of the scenario with the lowest weighted PD among those that
    /// allocated anything.
    pub lowest_risk: Option<String>,
}

/// Run every scenario over `records` and tabulate the outcomes.
///
/// The first scenario is the reference for `revenue_vs_first`. A scenario
/// failing (e.g. insufficient pool) fails the whole comparison.
pub fn compare_scenarios(
    records: &[Applicant],
    scenarios: &[ScenarioConfig],
) -> AllocationResult<ComputationOutput<ScenarioComparison>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if scenarios.is_empty() {
        return Err(AllocationError::InsufficientData(
            "At least one scenario required".into(),
        ));
    }
    for (i, s) in scenarios.iter().enumerate() {
        if scenarios[..i].iter().any(|p| p.name == s.name) {
            return Err(AllocationError::InvalidInput {
                field: "scenarios".into(),
                reason: format!("Duplicate scenario name '{}'", s.name),
            });
        }
    }

    let mut results = Vec::with_capacity(scenarios.len());
    let mut reference_revenue = None;

    for config in scenarios {
        let run = run_allocation(records, config)?;
        let summary = &run.result.summary;
        let reference = *reference_revenue.get_or_insert(summary.expected_revenue);
        for w in &run.warnings {
            warnings.push(format!("{}: {w}", config.name));
        }
        results.push(ScenarioResult {
            name: config.name.clone(),
            strategy: run.result.strategy,
            selected_count: summary.selected_count,
            allocated_amount: summary.allocated_amount,
            expected_revenue: summary.expected_revenue,
            weighted_pd: summary.weighted_pd,
            risk_cap: config.risk_cap,
            budget_utilization: summary.budget_utilization,
            compliance_score: run.result.compliance.score,
            compliance_status: run.result.compliance.status,
            revenue_vs_first: summary.expected_revenue - reference,
            warnings: run.warnings.len(),
        });
    }

    let highest_revenue = results
        .iter()
        .max_by(|a, b| a.expected_revenue.total_cmp(&b.expected_revenue))
        .map(|r| r.name.clone())
        .unwrap_or_default();
    let lowest_risk = results
        .iter()
        .filter(|r| r.selected_count > 0)
        .min_by(|a, b| a.weighted_pd.total_cmp(&b.weighted_pd))
        .map(|r| r.name.clone());

    let output = ScenarioComparison {
        results,
        highest_revenue,
        lowest_risk,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Scenario comparison over a shared applicant pool",
        &serde_json::json!({
            "num_scenarios": scenarios.len(),
            "num_records": records.len(),
            "scenarios": scenarios.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
