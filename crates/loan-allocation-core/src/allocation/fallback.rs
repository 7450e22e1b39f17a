//! Deterministic best-effort selections for degenerate cases.
//!
//! Covers:
//! 1. **Profitability** -- solver failed; descending `return / (amount/1000)`,
//!    budget and weighted-average risk enforced
//! 2. **Lowest risk** -- solver failed; the `slice` lowest-PD candidates,
//!    budget enforced
//! 3. **Rescue** -- nothing allocated; top `slice` by the rescue quality
//!    score, budget enforced, risk cap not considered
//!
//! All three are total: they never fail and may return an empty selection.

use serde::{Deserialize, Serialize};

use super::config::{FallbackConfig, SolverFailurePolicy};
use super::exposure::{sort_by_risk, Exposure};
use crate::eligibility::QualityWeights;
use crate::types::{Applicant, Money, Rate};

/// Why a fallback is being asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    SolverFailure,
    EmptyResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackKind {
    Profitability,
    LowestRisk,
    Rescue,
}

/// Dispatch to the fallback configured for `reason`.
pub fn select_fallback(
    pool: &[Applicant],
    candidates: &[usize],
    budget: Money,
    risk_cap: Rate,
    reason: FallbackReason,
    config: &FallbackConfig,
) -> (FallbackKind, Vec<bool>) {
    match reason {
        FallbackReason::SolverFailure => match config.on_solver_failure {
            SolverFailurePolicy::Profitability => (
                FallbackKind::Profitability,
                by_profitability(pool, candidates, budget, risk_cap),
            ),
            SolverFailurePolicy::LowestRisk { slice } => (
                FallbackKind::LowestRisk,
                by_lowest_risk(pool, candidates, budget, slice),
            ),
        },
        FallbackReason::EmptyResult => (
            FallbackKind::Rescue,
            rescue(
                pool,
                candidates,
                budget,
                &config.rescue_weights,
                config.rescue_slice,
            ),
        ),
    }
}

/// Profitability per thousand lent.
pub fn profitability(a: &Applicant) -> f64 {
    a.expected_return_rate / (a.requested_amount / 1000.0)
}

pub fn by_profitability(
    pool: &[Applicant],
    candidates: &[usize],
    budget: Money,
    risk_cap: Rate,
) -> Vec<bool> {
    let mut order = candidates.to_vec();
    order.sort_by(|&a, &b| {
        profitability(&pool[b])
            .total_cmp(&profitability(&pool[a]))
            .then(a.cmp(&b))
    });
    admit_greedy(pool, &order, budget, Some(risk_cap))
}

pub fn by_lowest_risk(pool: &[Applicant], candidates: &[usize], budget: Money, slice: usize) -> Vec<bool> {
    let mut order = candidates.to_vec();
    sort_by_risk(pool, &mut order);
    order.truncate(slice);
    admit_greedy(pool, &order, budget, None)
}

pub fn rescue(
    pool: &[Applicant],
    candidates: &[usize],
    budget: Money,
    weights: &QualityWeights,
    slice: usize,
) -> Vec<bool> {
    let order = weights.rank(pool, candidates, slice);
    admit_greedy(pool, &order, budget, None)
}

/// Walk `order`, admitting every record that keeps the budget (and the risk
/// cap, when given). Records that do not fit are skipped.
fn admit_greedy(pool: &[Applicant], order: &[usize], budget: Money, risk_cap: Option<Rate>) -> Vec<bool> {
    let mut decisions = vec![false; pool.len()];
    let mut exposure = Exposure::default();
    for &i in order {
        let a = &pool[i];
        if !exposure.fits_budget(a, budget) {
            continue;
        }
        if let Some(cap) = risk_cap {
            if !exposure.fits_risk(a, cap) {
                continue;
            }
        }
        exposure.add(a);
        decisions[i] = true;
    }
    decisions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::fixtures::applicant;

    fn selected(decisions: &[bool]) -> Vec<usize> {
        decisions
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.then_some(i))
            .collect()
    }

    fn pool() -> Vec<Applicant> {
        vec![
            applicant(2_000.0, 0.02, 0.10), // 0.05 per k
            applicant(1_000.0, 0.03, 0.08), // 0.08 per k
            applicant(500.0, 0.30, 0.12),   // 0.24 per k
            applicant(1_000.0, 0.01, 0.06), // 0.06 per k
        ]
    }

    #[test]
    fn test_profitability_order_respects_risk() {
        let out = by_profitability(&pool(), &[0, 1, 2, 3], 3_000.0, 0.05);
        // 2 first alone breaks the cap; then 1, 3 fit; 0 exceeds the budget.
        assert_eq!(selected(&out), vec![1, 3]);
    }

    #[test]
    fn test_lowest_risk_slice() {
        let out = by_lowest_risk(&pool(), &[0, 1, 2, 3], 10_000.0, 2);
        assert_eq!(selected(&out), vec![0, 3]);
    }

    #[test]
    fn test_rescue_ignores_risk_cap() {
        let weights = QualityWeights {
            risk: 0.0,
            income: 0.0,
            employment: 0.5,
            history: 0.5,
            risk_scale: 1.0,
            income_scale: 1.0,
            employment_scale: 10.0,
            history_scale: 10.0,
        };
        let mut p = pool();
        p[2].employment_length = 20.0;
        let out = rescue(&p, &[0, 1, 2, 3], 600.0, &weights, 1);
        assert_eq!(selected(&out), vec![2]);
    }

    #[test]
    fn test_fallbacks_are_deterministic() {
        let p = pool();
        let cfg = FallbackConfig::default();
        for reason in [FallbackReason::SolverFailure, FallbackReason::EmptyResult] {
            let first = select_fallback(&p, &[0, 1, 2, 3], 2_500.0, 0.05, reason, &cfg);
            let second = select_fallback(&p, &[0, 1, 2, 3], 2_500.0, 0.05, reason, &cfg);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_dispatch_follows_policy() {
        let mut cfg = FallbackConfig::default();
        cfg.on_solver_failure = SolverFailurePolicy::LowestRisk { slice: 1 };
        let (kind, out) = select_fallback(
            &pool(),
            &[0, 1, 2, 3],
            10_000.0,
            0.05,
            FallbackReason::SolverFailure,
            &cfg,
        );
        assert_eq!(kind, FallbackKind::LowestRisk);
        assert_eq!(selected(&out), vec![3]);
    }

    #[test]
    fn test_empty_candidates() {
        assert!(selected(&by_profitability(&pool(), &[], 1_000.0, 0.05)).is_empty());
    }
}
