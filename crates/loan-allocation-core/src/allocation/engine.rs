//! End-to-end allocation pipeline.
//!
//! records → clean → pool-size check → eligibility → strategy chain →
//! decision records, summary, category breakdown, compliance scorecard.
//!
//! Configuration and per-record score inputs are validated before any stage
//! runs. Everything after that is total except the pool-size check and the
//! final budget audit.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::chain::{AllocationChain, AllocationContext, Deferral, StrategyKind};
use super::compliance::{scorecard, ComplianceScorecard};
use super::config::ScenarioConfig;
use super::exposure::Exposure;
use super::solver::SolverDiagnostics;
use super::summary::{category_breakdown, decisions, summarize, AllocationDecision, CategoryBreakdown, PortfolioSummary};
use super::trimmer::TrimStats;
use crate::cleaning::{clean, CleaningReport};
use crate::eligibility::{filter, EligibilityStage, StageCount};
use crate::error::AllocationError;
use crate::types::{with_metadata, Applicant, ComputationOutput};
use crate::AllocationResult;

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilitySummary {
    pub stage: EligibilityStage,
    pub steps: Vec<StageCount>,
    pub eligible_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationReport {
    pub scenario: String,
    pub strategy: StrategyKind,
    pub summary: PortfolioSummary,
    pub categories: Vec<CategoryBreakdown>,
    pub compliance: ComplianceScorecard,
    pub cleaning: CleaningReport,
    pub eligibility: EligibilitySummary,
    pub solver: Option<SolverDiagnostics>,
    pub trim: Option<TrimStats>,
    pub deferrals: Vec<Deferral>,
    /// One record per cleaned applicant, in cleaned-pool order.
    pub decisions: Vec<AllocationDecision>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the full pipeline over `records` under `config`.
///
/// Fails with `InvalidInput` on a bad configuration or a PD/return outside
/// its range, with `InsufficientPool` when fewer than `min_pool_size` records
/// survive cleaning, and with `InvariantViolation` if a selection ever exceeds
/// the budget.
pub fn run_allocation(
    records: &[Applicant],
    config: &ScenarioConfig,
) -> AllocationResult<ComputationOutput<AllocationReport>> {
    let start = Instant::now();
    config.validate()?;
    validate_scores(records)?;
    let mut warnings = config.advisories();

    info!(scenario = %config.name, records = records.len(), "allocation started");

    let cleaned = clean(records)?;
    let pool = cleaned.records;
    if pool.len() < config.min_pool_size {
        return Err(AllocationError::InsufficientPool {
            available: pool.len(),
            required: config.min_pool_size,
        });
    }

    let eligibility = filter(&pool, &config.eligibility)?;
    match eligibility.stage {
        EligibilityStage::Loosened => warnings.push(format!(
            "Baseline eligibility admitted fewer than {} applicants; loosened criteria applied",
            config.eligibility.loosen_below
        )),
        EligibilityStage::Tightened => warnings.push(
            "Baseline eligibility admitted too many applicants; tightened criteria applied".into(),
        ),
        _ => {}
    }
    if eligibility.is_empty() {
        warnings.push("No applicant meets the eligibility criteria".into());
    }

    let ctx = AllocationContext {
        pool: &pool,
        eligible: &eligibility.indices,
        config,
    };
    let outcome = AllocationChain::standard().run(&ctx);
    let selection = outcome.selection;

    for d in &outcome.deferrals {
        warnings.push(format!("{} deferred: {}", d.strategy, d.reason));
    }
    if selection.strategy != StrategyKind::LinearProgram {
        warnings.push(format!("Selection produced by {}", selection.strategy));
    }
    if let Some(stats) = &selection.trim {
        warnings.push(format!(
            "Rounded allocation trimmed from {} to {} applicants",
            stats.initial_count, stats.final_count
        ));
    }

    let budget = config.effective_budget();
    let exposure = Exposure::of(&pool, &selection.decisions);
    if !exposure.within_budget(budget) {
        return Err(AllocationError::InvariantViolation(format!(
            "allocated {:.2} exceeds budget {:.2}",
            exposure.amount, budget
        )));
    }
    if !exposure.within_risk(config.risk_cap) {
        warn!(weighted_pd = exposure.average_pd(), cap = config.risk_cap, "risk cap exceeded");
        warnings.push(format!(
            "Weighted PD {:.2}% exceeds the {:.2}% cap",
            exposure.average_pd() * 100.0,
            config.risk_cap * 100.0
        ));
    }
    if let Some(min) = config.client_count_band.min {
        if exposure.count < min {
            warnings.push(format!(
                "Selected {} applicants, below the advisory minimum of {}",
                exposure.count, min
            ));
        }
    }

    let summary = summarize(&pool, &selection.decisions, eligibility.indices.len(), config);
    let categories = category_breakdown(&pool, &selection.decisions, config);
    for row in &categories {
        if row.within_band == Some(false) {
            warnings.push(format!(
                "{} allocation {:.0} outside its target band",
                row.category, row.amount
            ));
        }
    }
    let compliance = scorecard(&pool, &selection.decisions, config);

    info!(
        strategy = %selection.strategy,
        selected = summary.selected_count,
        allocated = summary.allocated_amount,
        weighted_pd = summary.weighted_pd,
        "allocation complete"
    );

    let report = AllocationReport {
        scenario: config.name.clone(),
        strategy: selection.strategy,
        summary,
        categories,
        compliance,
        cleaning: cleaned.report,
        eligibility: EligibilitySummary {
            stage: eligibility.stage,
            steps: eligibility.steps,
            eligible_count: eligibility.indices.len(),
        },
        solver: selection.solver,
        trim: selection.trim,
        deferrals: outcome.deferrals,
        decisions: decisions(&pool, &selection.decisions, config.loss_given_default),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Binary loan selection via LP relaxation (bounded primal simplex), rounding, ascending-PD risk trimming and deterministic fallbacks",
        config,
        warnings,
        elapsed,
        report,
    ))
}

/// PD must lie in [0, 1] and the expected return in [-1, 1]. Checked over
/// the raw input, before cleaning.
pub fn validate_scores(records: &[Applicant]) -> AllocationResult<()> {
    for (i, a) in records.iter().enumerate() {
        if !(0.0..=1.0).contains(&a.probability_of_default) {
            return Err(AllocationError::InvalidInput {
                field: format!("records[{i}].probability_of_default"),
                reason: format!("{} is outside [0, 1].", a.probability_of_default),
            });
        }
        if !(-1.0..=1.0).contains(&a.expected_return_rate) {
            return Err(AllocationError::InvalidInput {
                field: format!("records[{i}].expected_return_rate"),
                reason: format!("{} is outside [-1, 1].", a.expected_return_rate),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::fixtures::{applicant, minimal_config};

    #[test]
    fn test_pipeline_envelope() {
        let pool = vec![
            applicant(100.0, 0.01, 0.10),
            applicant(200.0, 0.05, 0.10),
            applicant(300.0, 0.20, 0.12),
        ];
        let mut cfg = minimal_config();
        cfg.total_budget = 300.0;
        let out = run_allocation(&pool, &cfg).unwrap();
        assert_eq!(out.metadata.precision, "ieee754_f64");
        assert_eq!(out.result.strategy, StrategyKind::LinearProgram);
        assert_eq!(out.result.summary.selected_count, 2);
        assert_eq!(out.result.decisions.len(), 3);
        assert!(out.warnings.is_empty(), "{:?}", out.warnings);
    }

    #[test]
    fn test_pd_out_of_range_rejected_before_cleaning() {
        let mut bad = applicant(100.0, 0.01, 0.10);
        bad.probability_of_default = 1.2;
        let err = run_allocation(&[bad], &minimal_config()).unwrap_err();
        assert!(matches!(err, AllocationError::InvalidInput { .. }));
    }

    #[test]
    fn test_nan_return_rejected() {
        let mut bad = applicant(100.0, 0.01, 0.10);
        bad.expected_return_rate = f64::NAN;
        assert!(validate_scores(&[bad]).is_err());
    }

    #[test]
    fn test_pool_below_minimum_is_fatal() {
        let mut cfg = minimal_config();
        cfg.min_pool_size = 5;
        let pool = vec![applicant(100.0, 0.01, 0.10)];
        match run_allocation(&pool, &cfg) {
            Err(AllocationError::InsufficientPool {
                available,
                required,
            }) => {
                assert_eq!(available, 1);
                assert_eq!(required, 5);
            }
            other => panic!("expected InsufficientPool, got {other:?}"),
        }
    }
}
