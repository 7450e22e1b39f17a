//! Bounded-variable primal simplex.
//!
//! Solves `max c·x` subject to `a_i·x (<= | >=) b_i` and `0 <= x_j <= u_j`.
//! Upper bounds are handled implicitly (nonbasic variables sit at either
//! bound), so box constraints never become tableau rows. Rows with a `>=`
//! relation get an artificial variable and are made feasible in phase 1.
//!
//! Rows are scaled by their largest coefficient before solving. Pricing is
//! Dantzig (largest reduced cost) and switches to Bland's rule after a run of
//! degenerate steps.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const PIVOT_TOL: f64 = 1e-9;
const OPTIMALITY_TOL: f64 = 1e-9;
const FEASIBILITY_TOL: f64 = 1e-7;
const DEGENERATE_STEP: f64 = 1e-12;
const BLAND_AFTER_DEGENERATE: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    LessEq,
    GreaterEq,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraint {
    pub label: String,
    pub coefficients: Vec<f64>,
    pub relation: Relation,
    pub rhs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearProgram {
    /// Objective coefficients (maximized).
    pub objective: Vec<f64>,
    /// Per-variable upper bound; `f64::INFINITY` for none. Lower bounds are 0.
    pub upper_bounds: Vec<f64>,
    pub constraints: Vec<Constraint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LpSolution {
    pub x: Vec<f64>,
    pub objective_value: f64,
    pub iterations: u32,
}

#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum LpFailure {
    #[error("problem is infeasible (residual {residual:.3e})")]
    Infeasible { residual: f64 },
    #[error("objective is unbounded")]
    Unbounded,
    #[error("iteration limit of {0} reached")]
    IterationLimit(u32),
    #[error("numerical failure: {0}")]
    Numerical(String),
}

/// Maximize `lp`, giving up after `max_iterations` simplex steps across both
/// phases.
pub fn maximize(lp: &LinearProgram, max_iterations: u32) -> Result<LpSolution, LpFailure> {
    let n = lp.objective.len();
    check_dimensions(lp, n)?;

    let mut tab = Tableau::build(lp, n);
    let mut iterations = 0u32;

    if tab.artificial_start < tab.cols {
        let phase1: Vec<f64> = (0..tab.cols)
            .map(|j| if j >= tab.artificial_start { -1.0 } else { 0.0 })
            .collect();
        tab.optimize(&phase1, &mut iterations, max_iterations)?;
        let residual: f64 = tab.x[tab.artificial_start..].iter().sum();
        if residual > FEASIBILITY_TOL {
            return Err(LpFailure::Infeasible { residual });
        }
        for j in tab.artificial_start..tab.cols {
            tab.upper[j] = 0.0;
            tab.enterable[j] = false;
        }
    }

    let scale = lp
        .objective
        .iter()
        .fold(0.0_f64, |m, c| m.max(c.abs()))
        .max(f64::MIN_POSITIVE);
    let phase2: Vec<f64> = (0..tab.cols)
        .map(|j| if j < n { lp.objective[j] / scale } else { 0.0 })
        .collect();
    tab.optimize(&phase2, &mut iterations, max_iterations)?;

    let x: Vec<f64> = (0..n)
        .map(|j| tab.x[j].clamp(0.0, lp.upper_bounds[j]))
        .collect();
    if x.iter().any(|v| !v.is_finite()) {
        return Err(LpFailure::Numerical("non-finite primal value".into()));
    }
    let objective_value = x.iter().zip(&lp.objective).map(|(v, c)| v * c).sum();

    Ok(LpSolution {
        x,
        objective_value,
        iterations,
    })
}

fn check_dimensions(lp: &LinearProgram, n: usize) -> Result<(), LpFailure> {
    if lp.upper_bounds.len() != n {
        return Err(LpFailure::Numerical(format!(
            "{} upper bounds for {} variables",
            lp.upper_bounds.len(),
            n
        )));
    }
    if lp.upper_bounds.iter().any(|u| u.is_nan() || *u < 0.0) {
        return Err(LpFailure::Numerical("upper bounds must be non-negative".into()));
    }
    if lp.objective.iter().any(|c| !c.is_finite()) {
        return Err(LpFailure::Numerical("non-finite objective coefficient".into()));
    }
    for c in &lp.constraints {
        if c.coefficients.len() != n {
            return Err(LpFailure::Numerical(format!(
                "constraint '{}' has {} coefficients for {} variables",
                c.label,
                c.coefficients.len(),
                n
            )));
        }
        if !c.rhs.is_finite() || c.coefficients.iter().any(|a| !a.is_finite()) {
            return Err(LpFailure::Numerical(format!(
                "constraint '{}' has a non-finite entry",
                c.label
            )));
        }
    }
    Ok(())
}

struct Tableau {
    /// B^-1 A, one row per constraint.
    rows: Vec<Vec<f64>>,
    basis: Vec<usize>,
    x: Vec<f64>,
    upper: Vec<f64>,
    at_upper: Vec<bool>,
    is_basic: Vec<bool>,
    enterable: Vec<bool>,
    cols: usize,
    artificial_start: usize,
}

impl Tableau {
    /// Columns: structural, one slack/surplus per row, one artificial per
    /// `>=` row (after sign normalization).
    fn build(lp: &LinearProgram, n: usize) -> Self {
        let m = lp.constraints.len();

        let mut scaled: Vec<(Vec<f64>, Relation, f64)> = lp
            .constraints
            .iter()
            .map(|c| {
                let s = c
                    .coefficients
                    .iter()
                    .fold(0.0_f64, |acc, a| acc.max(a.abs()));
                let s = if s > 0.0 { s } else { 1.0 };
                let mut coeffs: Vec<f64> = c.coefficients.iter().map(|a| a / s).collect();
                let mut rhs = c.rhs / s;
                let mut relation = c.relation;
                if rhs < 0.0 {
                    coeffs.iter_mut().for_each(|a| *a = -*a);
                    rhs = -rhs;
                    relation = match relation {
                        Relation::LessEq => Relation::GreaterEq,
                        Relation::GreaterEq => Relation::LessEq,
                    };
                }
                (coeffs, relation, rhs)
            })
            .collect();

        let artificial_count = scaled
            .iter()
            .filter(|(_, r, _)| *r == Relation::GreaterEq)
            .count();
        let artificial_start = n + m;
        let cols = n + m + artificial_count;

        let mut rows = Vec::with_capacity(m);
        let mut basis = Vec::with_capacity(m);
        let mut x = vec![0.0; cols];
        let mut next_artificial = artificial_start;

        for (i, (coeffs, relation, rhs)) in scaled.drain(..).enumerate() {
            let mut row = coeffs;
            row.resize(cols, 0.0);
            match relation {
                Relation::LessEq => {
                    row[n + i] = 1.0;
                    basis.push(n + i);
                    x[n + i] = rhs;
                }
                Relation::GreaterEq => {
                    row[n + i] = -1.0;
                    row[next_artificial] = 1.0;
                    basis.push(next_artificial);
                    x[next_artificial] = rhs;
                    next_artificial += 1;
                }
            }
            rows.push(row);
        }

        let mut upper = vec![f64::INFINITY; cols];
        upper[..n].copy_from_slice(&lp.upper_bounds);
        let mut is_basic = vec![false; cols];
        for &b in &basis {
            is_basic[b] = true;
        }

        Tableau {
            rows,
            basis,
            x,
            upper,
            at_upper: vec![false; cols],
            is_basic,
            enterable: vec![true; cols],
            cols,
            artificial_start,
        }
    }

    fn reduced_costs(&self, cost: &[f64]) -> Vec<f64> {
        let mut d = cost.to_vec();
        for (i, row) in self.rows.iter().enumerate() {
            let cb = cost[self.basis[i]];
            if cb != 0.0 {
                for (dj, a) in d.iter_mut().zip(row) {
                    *dj -= cb * a;
                }
            }
        }
        for &b in &self.basis {
            d[b] = 0.0;
        }
        d
    }

    fn optimize(&mut self, cost: &[f64], iterations: &mut u32, max_iterations: u32) -> Result<(), LpFailure> {
        let mut d = self.reduced_costs(cost);
        let mut degenerate_run = 0u32;

        loop {
            let bland = degenerate_run >= BLAND_AFTER_DEGENERATE;
            let Some(q) = self.choose_entering(&d, bland) else {
                return Ok(());
            };
            if *iterations >= max_iterations {
                return Err(LpFailure::IterationLimit(max_iterations));
            }
            *iterations += 1;

            let dir = if self.at_upper[q] { -1.0 } else { 1.0 };
            let (step, leaving) = self.ratio_test(q, dir, bland);
            if step.is_infinite() {
                return Err(LpFailure::Unbounded);
            }

            for (i, row) in self.rows.iter().enumerate() {
                self.x[self.basis[i]] -= row[q] * dir * step;
            }
            self.x[q] += dir * step;

            match leaving {
                None => {
                    self.at_upper[q] = !self.at_upper[q];
                    self.x[q] = if self.at_upper[q] { self.upper[q] } else { 0.0 };
                }
                Some((r, hits_upper)) => {
                    let out = self.basis[r];
                    self.x[out] = if hits_upper { self.upper[out] } else { 0.0 };
                    self.at_upper[out] = hits_upper;
                    self.is_basic[out] = false;
                    self.is_basic[q] = true;
                    self.at_upper[q] = false;
                    self.basis[r] = q;
                    self.pivot(r, q, &mut d)?;
                }
            }

            if step <= DEGENERATE_STEP {
                degenerate_run += 1;
            } else {
                degenerate_run = 0;
            }
        }
    }

    fn choose_entering(&self, d: &[f64], bland: bool) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for j in 0..self.cols {
            if self.is_basic[j] || !self.enterable[j] || self.upper[j] <= PIVOT_TOL {
                continue;
            }
            let gain = if self.at_upper[j] { -d[j] } else { d[j] };
            if gain <= OPTIMALITY_TOL {
                continue;
            }
            if bland {
                return Some(j);
            }
            if best.map_or(true, |(_, g)| gain > g) {
                best = Some((j, gain));
            }
        }
        best.map(|(j, _)| j)
    }

    /// Largest step for entering `q` moving in `dir`, and the blocking row
    /// (with whether the leaving variable stops at its upper bound). `None`
    /// means the entering variable reaches its own opposite bound first.
    fn ratio_test(&self, q: usize, dir: f64, bland: bool) -> (f64, Option<(usize, bool)>) {
        let mut step = self.upper[q];
        let mut leaving: Option<(usize, bool)> = None;
        for (i, row) in self.rows.iter().enumerate() {
            let alpha = row[q] * dir;
            let b = self.basis[i];
            let (limit, hits_upper) = if alpha > PIVOT_TOL {
                (self.x[b] / alpha, false)
            } else if alpha < -PIVOT_TOL && self.upper[b].is_finite() {
                ((self.upper[b] - self.x[b]) / -alpha, true)
            } else {
                continue;
            };
            let limit = limit.max(0.0);
            let tie = (limit - step).abs() <= DEGENERATE_STEP;
            let better = limit < step - DEGENERATE_STEP
                || (tie
                    && bland
                    && leaving.map_or(false, |(r, _)| b < self.basis[r]));
            if better || (tie && leaving.is_none() && step.is_infinite()) {
                step = limit;
                leaving = Some((i, hits_upper));
            }
        }
        (step, leaving)
    }

    fn pivot(&mut self, r: usize, q: usize, d: &mut [f64]) -> Result<(), LpFailure> {
        let piv = self.rows[r][q];
        if piv.abs() <= PIVOT_TOL || !piv.is_finite() {
            return Err(LpFailure::Numerical(format!("degenerate pivot {piv:e}")));
        }
        let pivot_row: Vec<f64> = self.rows[r].iter().map(|a| a / piv).collect();
        for (i, row) in self.rows.iter_mut().enumerate() {
            if i == r {
                continue;
            }
            let f = row[q];
            if f != 0.0 {
                for (a, p) in row.iter_mut().zip(&pivot_row) {
                    *a -= f * p;
                }
            }
        }
        let dq = d[q];
        if dq != 0.0 {
            for (dj, p) in d.iter_mut().zip(&pivot_row) {
                *dj -= dq * p;
            }
        }
        d[q] = 0.0;
        self.rows[r] = pivot_row;
        Ok(())
    }
}
