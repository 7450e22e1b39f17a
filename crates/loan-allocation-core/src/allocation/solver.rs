//! LP relaxation solve and rounding to binary decisions.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::ScenarioConfig;
use super::model::formulate;
use super::simplex::{maximize, LpFailure};
use crate::types::Applicant;

/// Values at or above this round to an allocation.
pub const ROUNDING_THRESHOLD: f64 = 0.5;

const INTEGRAL_TOL: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverDiagnostics {
    pub variables: usize,
    pub constraints: usize,
    pub iterations: u32,
    /// Relaxation objective before rounding.
    pub relaxed_objective: f64,
    /// Variables strictly between 0 and 1 in the relaxation.
    pub fractional: usize,
    pub rounded_up: usize,
    pub rounded_down: usize,
}

#[derive(Debug, Clone)]
pub struct SolverOutcome {
    /// Rounded decisions aligned with the pool.
    pub decisions: Vec<bool>,
    pub diagnostics: SolverDiagnostics,
}

/// Solve the relaxation over `candidates` and round to binary decisions.
///
/// Rounding can break the budget or risk row; repairing that is the trimmer's
/// job, not this function's.
pub fn solve(
    pool: &[Applicant],
    candidates: &[usize],
    config: &ScenarioConfig,
) -> Result<SolverOutcome, LpFailure> {
    let lp = formulate(pool, candidates, config);
    let constraints = lp.constraints.len();
    let solution = maximize(&lp, config.solver.max_iterations)?;

    let mut decisions = vec![false; pool.len()];
    let mut fractional = 0;
    let mut rounded_up = 0;
    let mut rounded_down = 0;
    for (&i, &x) in candidates.iter().zip(&solution.x) {
        let take = round(x);
        decisions[i] = take;
        if x > INTEGRAL_TOL && x < 1.0 - INTEGRAL_TOL {
            fractional += 1;
            if take {
                rounded_up += 1;
            } else {
                rounded_down += 1;
            }
        }
    }

    debug!(
        variables = candidates.len(),
        iterations = solution.iterations,
        objective = solution.objective_value,
        fractional,
        "LP relaxation solved"
    );

    Ok(SolverOutcome {
        decisions,
        diagnostics: SolverDiagnostics {
            variables: candidates.len(),
            constraints,
            iterations: solution.iterations,
            relaxed_objective: solution.objective_value,
            fractional,
            rounded_up,
            rounded_down,
        },
    })
}

/// Round a relaxed value to the nearest integer decision.
pub fn round(x: f64) -> bool {
    x >= ROUNDING_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::fixtures::{applicant, minimal_config};

    #[test]
    fn test_round_half_up() {
        assert!(round(0.5));
        assert!(round(0.9999));
        assert!(!round(0.4999));
        assert!(!round(0.0));
    }

    #[test]
    fn test_risk_row_keeps_risky_applicant_out() {
        // Applicant 2 has the best return but would push risk past the cap.
        let pool = vec![
            applicant(100.0, 0.01, 0.10),
            applicant(200.0, 0.05, 0.10),
            applicant(300.0, 0.20, 0.12),
        ];
        let mut cfg = minimal_config();
        cfg.total_budget = 300.0;
        let out = solve(&pool, &[0, 1, 2], &cfg).unwrap();
        assert_eq!(out.decisions, vec![true, true, false]);
        assert!(out.diagnostics.fractional >= 1);
    }

    #[test]
    fn test_decisions_align_with_pool_not_candidates() {
        let pool = vec![
            applicant(100.0, 0.01, 0.10),
            applicant(100.0, 0.01, 0.10),
            applicant(100.0, 0.01, 0.10),
        ];
        let out = solve(&pool, &[2], &minimal_config()).unwrap();
        assert_eq!(out.decisions, vec![false, false, true]);
    }

    #[test]
    fn test_iteration_limit_surfaces_as_failure() {
        let pool: Vec<Applicant> = (0..10).map(|_| applicant(100.0, 0.01, 0.1)).collect();
        let mut cfg = minimal_config();
        cfg.total_budget = 450.0;
        cfg.solver.max_iterations = 1;
        let candidates: Vec<usize> = (0..10).collect();
        assert!(matches!(
            solve(&pool, &candidates, &cfg),
            Err(LpFailure::IterationLimit(1))
        ));
    }

    #[test]
    fn test_unreachable_band_is_infeasible() {
        use crate::types::LoanCategory;
        let pool = vec![applicant(100.0, 0.01, 0.10)];
        let mut cfg = minimal_config();
        cfg.enforce_category_bands = true;
        cfg.category_targets.insert(LoanCategory::Medical, 0.5);
        assert!(matches!(
            solve(&pool, &[0], &cfg),
            Err(LpFailure::Infeasible { .. })
        ));
    }
}
