//! Ordered strategy chain.
//!
//! Each strategy declares which deferral it answers (`None` for the first
//! attempt) and either allocates or defers with a reason. An allocation with
//! no selected record counts as a deferral with [`DeferReason::EmptyResult`].
//!
//! Standard order:
//! 1. LP relaxation + rounding + trimming, over the eligible subset
//! 2. Solver-failure fallback, over the eligible subset
//! 3. Rescue fallback, over the whole cleaned pool

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::config::{ScenarioConfig, SolverFailurePolicy};
use super::fallback::{select_fallback, FallbackReason};
use super::simplex::LpFailure;
use super::solver::{solve, SolverDiagnostics};
use super::trimmer::{needs_trim, trim, TrimStats};
use crate::types::Applicant;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    LinearProgram,
    ProfitabilityFallback,
    LowestRiskFallback,
    RescueFallback,
    /// Every strategy deferred.
    Unallocated,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyKind::LinearProgram => write!(f, "Linear program"),
            StrategyKind::ProfitabilityFallback => write!(f, "Profitability fallback"),
            StrategyKind::LowestRiskFallback => write!(f, "Lowest-risk fallback"),
            StrategyKind::RescueFallback => write!(f, "Rescue fallback"),
            StrategyKind::Unallocated => write!(f, "Unallocated"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum DeferReason {
    /// No eligible candidates to solve over.
    EmptyPool,
    SolverFailure(LpFailure),
    EmptyResult,
}

impl std::fmt::Display for DeferReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeferReason::EmptyPool => write!(f, "no eligible candidates"),
            DeferReason::SolverFailure(e) => write!(f, "solver failed: {e}"),
            DeferReason::EmptyResult => write!(f, "no allocations"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Selection {
    pub strategy: StrategyKind,
    /// Aligned with the cleaned pool.
    pub decisions: Vec<bool>,
    pub solver: Option<SolverDiagnostics>,
    pub trim: Option<TrimStats>,
}

impl Selection {
    fn unallocated(pool_len: usize) -> Self {
        Self {
            strategy: StrategyKind::Unallocated,
            decisions: vec![false; pool_len],
            solver: None,
            trim: None,
        }
    }

    pub fn count(&self) -> usize {
        self.decisions.iter().filter(|d| **d).count()
    }
}

pub enum StrategyOutcome {
    Allocated(Selection),
    Defer(DeferReason),
}

pub struct AllocationContext<'a> {
    pub pool: &'a [Applicant],
    /// Eligible indices into `pool`.
    pub eligible: &'a [usize],
    pub config: &'a ScenarioConfig,
}

pub trait AllocationStrategy {
    fn kind(&self) -> StrategyKind;

    /// Whether this strategy runs given the previous deferral (`None` on the
    /// first attempt).
    fn handles(&self, reason: Option<&DeferReason>) -> bool;

    fn attempt(&self, ctx: &AllocationContext<'_>) -> StrategyOutcome;
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

pub struct LinearProgramStrategy;

impl AllocationStrategy for LinearProgramStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::LinearProgram
    }

    fn handles(&self, reason: Option<&DeferReason>) -> bool {
        reason.is_none()
    }

    fn attempt(&self, ctx: &AllocationContext<'_>) -> StrategyOutcome {
        if ctx.eligible.is_empty() {
            return StrategyOutcome::Defer(DeferReason::EmptyPool);
        }
        let outcome = match solve(ctx.pool, ctx.eligible, ctx.config) {
            Ok(o) => o,
            Err(e) => return StrategyOutcome::Defer(DeferReason::SolverFailure(e)),
        };

        let budget = ctx.config.effective_budget();
        let risk_cap = ctx.config.risk_cap;
        let band = &ctx.config.client_count_band;
        let mut selection = Selection {
            strategy: self.kind(),
            decisions: outcome.decisions,
            solver: Some(outcome.diagnostics),
            trim: None,
        };

        if needs_trim(ctx.pool, &selection.decisions, budget, risk_cap, band) {
            let trimmed = trim(
                ctx.pool,
                &selection.decisions,
                ctx.eligible,
                budget,
                risk_cap,
                band,
            );
            warn!(
                before = trimmed.stats.initial_count,
                after = trimmed.stats.final_count,
                "rounded allocation trimmed"
            );
            selection.decisions = trimmed.decisions;
            selection.trim = Some(trimmed.stats);
        }
        StrategyOutcome::Allocated(selection)
    }
}

pub struct SolverFailureStrategy;

impl AllocationStrategy for SolverFailureStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ProfitabilityFallback
    }

    fn handles(&self, reason: Option<&DeferReason>) -> bool {
        matches!(reason, Some(DeferReason::SolverFailure(_)))
    }

    fn attempt(&self, ctx: &AllocationContext<'_>) -> StrategyOutcome {
        let (_, decisions) = select_fallback(
            ctx.pool,
            ctx.eligible,
            ctx.config.effective_budget(),
            ctx.config.risk_cap,
            FallbackReason::SolverFailure,
            &ctx.config.fallback,
        );
        let strategy = match ctx.config.fallback.on_solver_failure {
            SolverFailurePolicy::Profitability => StrategyKind::ProfitabilityFallback,
            SolverFailurePolicy::LowestRisk { .. } => StrategyKind::LowestRiskFallback,
        };
        StrategyOutcome::Allocated(Selection {
            strategy,
            decisions,
            solver: None,
            trim: None,
        })
    }
}

pub struct RescueStrategy;

impl AllocationStrategy for RescueStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::RescueFallback
    }

    fn handles(&self, reason: Option<&DeferReason>) -> bool {
        matches!(
            reason,
            Some(DeferReason::EmptyPool) | Some(DeferReason::EmptyResult)
        )
    }

    fn attempt(&self, ctx: &AllocationContext<'_>) -> StrategyOutcome {
        let everyone: Vec<usize> = (0..ctx.pool.len()).collect();
        let (_, decisions) = select_fallback(
            ctx.pool,
            &everyone,
            ctx.config.effective_budget(),
            ctx.config.risk_cap,
            FallbackReason::EmptyResult,
            &ctx.config.fallback,
        );
        StrategyOutcome::Allocated(Selection {
            strategy: self.kind(),
            decisions,
            solver: None,
            trim: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deferral {
    pub strategy: StrategyKind,
    pub reason: DeferReason,
}

pub struct ChainOutcome {
    pub selection: Selection,
    /// Deferrals in the order they happened.
    pub deferrals: Vec<Deferral>,
}

pub struct AllocationChain {
    strategies: Vec<Box<dyn AllocationStrategy>>,
}

impl AllocationChain {
    pub fn new(strategies: Vec<Box<dyn AllocationStrategy>>) -> Self {
        Self { strategies }
    }

    /// LP, then solver-failure fallback, then rescue.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(LinearProgramStrategy),
            Box::new(SolverFailureStrategy),
            Box::new(RescueStrategy),
        ])
    }

    pub fn run(&self, ctx: &AllocationContext<'_>) -> ChainOutcome {
        let mut reason: Option<DeferReason> = None;
        let mut deferrals = Vec::new();

        for strategy in &self.strategies {
            if !strategy.handles(reason.as_ref()) {
                continue;
            }
            let deferred = match strategy.attempt(ctx) {
                StrategyOutcome::Allocated(selection) if selection.count() > 0 => {
                    debug!(strategy = %selection.strategy, count = selection.count(), "strategy allocated");
                    return ChainOutcome {
                        selection,
                        deferrals,
                    };
                }
                StrategyOutcome::Allocated(_) => DeferReason::EmptyResult,
                StrategyOutcome::Defer(r) => r,
            };
            warn!(strategy = %strategy.kind(), reason = %deferred, "strategy deferred");
            deferrals.push(Deferral {
                strategy: strategy.kind(),
                reason: deferred.clone(),
            });
            reason = Some(deferred);
        }

        ChainOutcome {
            selection: Selection::unallocated(ctx.pool.len()),
            deferrals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::fixtures::{applicant, minimal_config};

    #[test]
    fn test_lp_allocates_first() {
        let pool = vec![
            applicant(100.0, 0.01, 0.10),
            applicant(200.0, 0.05, 0.10),
            applicant(300.0, 0.20, 0.12),
        ];
        let mut cfg = minimal_config();
        cfg.total_budget = 300.0;
        let ctx = AllocationContext {
            pool: &pool,
            eligible: &[0, 1, 2],
            config: &cfg,
        };
        let out = AllocationChain::standard().run(&ctx);
        assert_eq!(out.selection.strategy, StrategyKind::LinearProgram);
        assert_eq!(out.selection.decisions, vec![true, true, false]);
        assert!(out.deferrals.is_empty());
        assert!(out.selection.trim.is_none());
    }

    #[test]
    fn test_empty_eligible_goes_to_rescue() {
        let pool = vec![applicant(100.0, 0.40, 0.10), applicant(5_000.0, 0.01, 0.10)];
        let mut cfg = minimal_config();
        cfg.total_budget = 1_000.0;
        let ctx = AllocationContext {
            pool: &pool,
            eligible: &[],
            config: &cfg,
        };
        let out = AllocationChain::standard().run(&ctx);
        assert_eq!(out.selection.strategy, StrategyKind::RescueFallback);
        // Risk cap ignored; the second record does not fit the budget.
        assert_eq!(out.selection.decisions, vec![true, false]);
        assert_eq!(out.deferrals.len(), 1);
        assert_eq!(out.deferrals[0].reason, DeferReason::EmptyPool);
    }

    #[test]
    fn test_solver_failure_goes_to_fallback() {
        let pool: Vec<Applicant> = (0..5).map(|_| applicant(100.0, 0.01, 0.10)).collect();
        let mut cfg = minimal_config();
        cfg.solver.max_iterations = 1;
        let ctx = AllocationContext {
            pool: &pool,
            eligible: &[0, 1, 2, 3, 4],
            config: &cfg,
        };
        let out = AllocationChain::standard().run(&ctx);
        assert_eq!(out.selection.strategy, StrategyKind::ProfitabilityFallback);
        assert_eq!(out.selection.count(), 5);
        assert!(matches!(
            out.deferrals[0].reason,
            DeferReason::SolverFailure(LpFailure::IterationLimit(1))
        ));
    }

    #[test]
    fn test_exhausted_chain_is_unallocated() {
        let pool = vec![applicant(5_000.0, 0.01, 0.10)];
        let cfg = minimal_config();
        let ctx = AllocationContext {
            pool: &pool,
            eligible: &[0],
            config: &cfg,
        };
        let out = AllocationChain::standard().run(&ctx);
        assert_eq!(out.selection.strategy, StrategyKind::Unallocated);
        assert_eq!(out.selection.count(), 0);
        let reasons: Vec<&DeferReason> = out.deferrals.iter().map(|d| &d.reason).collect();
        assert_eq!(reasons, vec![&DeferReason::EmptyResult, &DeferReason::EmptyResult]);
    }
}
