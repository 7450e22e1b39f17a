//! LP formulation of the allocation problem.
//!
//! One variable per eligible applicant, `0 <= x_i <= 1`:
//!
//! ```text
//! max  Σ amount_i·return_i·x_i  −  Σ PD_i·LGD·amount_i·x_i
//! s.t. Σ amount_i·x_i                     <= budget
//!      Σ PD_i·amount_i·x_i                <= risk_cap·budget     (budget-scaled)
//!   or Σ (PD_i − risk_cap)·amount_i·x_i   <= 0                   (exact average)
//!      p_c(1−ε)·budget <= Σ_{i∈c} amount_i·x_i <= p_c(1+ε)·budget (bands, opt-in)
//! ```

use super::config::{RiskFormulation, ScenarioConfig};
use super::simplex::{Constraint, LinearProgram, Relation};
use crate::types::{Applicant, Money};

/// Objective coefficient of one applicant.
pub fn objective_coefficient(a: &Applicant, loss_given_default: Option<f64>) -> Money {
    let revenue = a.requested_amount * a.expected_return_rate;
    match loss_given_default {
        Some(lgd) => revenue - a.probability_of_default * lgd * a.requested_amount,
        None => revenue,
    }
}

/// Build the relaxation over `candidates` (indices into `pool`). Variable `k`
/// of the program corresponds to `candidates[k]`.
pub fn formulate(pool: &[Applicant], candidates: &[usize], config: &ScenarioConfig) -> LinearProgram {
    let budget = config.effective_budget();
    let members: Vec<&Applicant> = candidates.iter().map(|&i| &pool[i]).collect();

    let objective = members
        .iter()
        .map(|a| objective_coefficient(a, config.loss_given_default))
        .collect();

    let mut constraints = vec![Constraint {
        label: "budget".into(),
        coefficients: members.iter().map(|a| a.requested_amount).collect(),
        relation: Relation::LessEq,
        rhs: budget,
    }];

    constraints.push(match config.risk_formulation {
        RiskFormulation::BudgetScaled => Constraint {
            label: "risk".into(),
            coefficients: members
                .iter()
                .map(|a| a.probability_of_default * a.requested_amount)
                .collect(),
            relation: Relation::LessEq,
            rhs: config.risk_cap * budget,
        },
        RiskFormulation::ExactAverage => Constraint {
            label: "risk".into(),
            coefficients: members
                .iter()
                .map(|a| (a.probability_of_default - config.risk_cap) * a.requested_amount)
                .collect(),
            relation: Relation::LessEq,
            rhs: 0.0,
        },
    });

    if config.enforce_category_bands {
        for &category in config.category_targets.keys() {
            let Some((lower, upper)) = config.category_band(category) else {
                continue;
            };
            let coefficients: Vec<f64> = members
                .iter()
                .map(|a| {
                    if a.loan_category == category {
                        a.requested_amount
                    } else {
                        0.0
                    }
                })
                .collect();
            constraints.push(Constraint {
                label: format!("{category}_max"),
                coefficients: coefficients.clone(),
                relation: Relation::LessEq,
                rhs: upper,
            });
            if lower > 0.0 {
                constraints.push(Constraint {
                    label: format!("{category}_min"),
                    coefficients,
                    relation: Relation::GreaterEq,
                    rhs: lower,
                });
            }
        }
    }

    LinearProgram {
        objective,
        upper_bounds: vec![1.0; members.len()],
        constraints,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::fixtures::{applicant, minimal_config};
    use crate::types::LoanCategory;

    #[test]
    fn test_objective_with_and_without_lgd() {
        let a = applicant(1_000.0, 0.10, 0.12);
        assert!((objective_coefficient(&a, None) - 120.0).abs() < 1e-9);
        // 120 - 0.10 * 0.45 * 1000
        assert!((objective_coefficient(&a, Some(0.45)) - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_budget_scaled_rows() {
        let pool = vec![applicant(100.0, 0.01, 0.1), applicant(200.0, 0.05, 0.1)];
        let mut cfg = minimal_config();
        cfg.total_budget = 250.0;
        let lp = formulate(&pool, &[0, 1], &cfg);
        assert_eq!(lp.constraints.len(), 2);
        assert_eq!(lp.constraints[0].coefficients, vec![100.0, 200.0]);
        assert_eq!(lp.constraints[0].rhs, 250.0);
        assert_eq!(lp.constraints[1].coefficients, vec![1.0, 10.0]);
        assert!((lp.constraints[1].rhs - 12.5).abs() < 1e-12);
        assert_eq!(lp.upper_bounds, vec![1.0, 1.0]);
    }

    #[test]
    fn test_exact_average_row() {
        let pool = vec![applicant(100.0, 0.01, 0.1), applicant(200.0, 0.08, 0.1)];
        let mut cfg = minimal_config();
        cfg.risk_formulation = RiskFormulation::ExactAverage;
        let lp = formulate(&pool, &[0, 1], &cfg);
        let risk = &lp.constraints[1];
        assert!((risk.coefficients[0] + 4.0).abs() < 1e-9);
        assert!((risk.coefficients[1] - 6.0).abs() < 1e-9);
        assert_eq!(risk.rhs, 0.0);
    }

    #[test]
    fn test_bands_only_when_enforced() {
        let mut pool = vec![applicant(100.0, 0.01, 0.1), applicant(200.0, 0.02, 0.1)];
        pool[1].loan_category = LoanCategory::Medical;
        let mut cfg = minimal_config();
        cfg.category_targets.insert(LoanCategory::Medical, 0.5);
        assert_eq!(formulate(&pool, &[0, 1], &cfg).constraints.len(), 2);

        cfg.enforce_category_bands = true;
        let lp = formulate(&pool, &[0, 1], &cfg);
        assert_eq!(lp.constraints.len(), 4);
        assert_eq!(lp.constraints[2].label, "MEDICAL_max");
        assert_eq!(lp.constraints[2].coefficients, vec![0.0, 200.0]);
        assert!((lp.constraints[2].rhs - 525.0).abs() < 1e-9);
        assert_eq!(lp.constraints[3].relation, Relation::GreaterEq);
        assert!((lp.constraints[3].rhs - 475.0).abs() < 1e-9);
    }

    #[test]
    fn test_variables_follow_candidate_order() {
        let pool = vec![
            applicant(100.0, 0.01, 0.1),
            applicant(200.0, 0.02, 0.1),
            applicant(300.0, 0.03, 0.1),
        ];
        let lp = formulate(&pool, &[2, 0], &minimal_config());
        assert_eq!(lp.constraints[0].coefficients, vec![300.0, 100.0]);
    }
}
