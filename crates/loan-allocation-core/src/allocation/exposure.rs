use serde::{Deserialize, Serialize};

use crate::types::{approx_le, Applicant, Money, Rate};

/// Running totals of an allocation: count, amount, and PD-weighted amount.
///
/// Every greedy stage (trimming and the fallbacks) admits through
/// [`Exposure::fits_budget`] / [`Exposure::fits_risk`] so they share the
/// same tolerance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Exposure {
    pub count: usize,
    pub amount: Money,
    pub risk_amount: Money,
}

impl Exposure {
    pub fn of(pool: &[Applicant], decisions: &[bool]) -> Self {
        let mut e = Self::default();
        for (a, _) in pool.iter().zip(decisions).filter(|(_, d)| **d) {
            e.add(a);
        }
        e
    }

    pub fn add(&mut self, a: &Applicant) {
        self.count += 1;
        self.amount += a.requested_amount;
        self.risk_amount += a.probability_of_default * a.requested_amount;
    }

    /// Weighted-average PD; zero for an empty allocation.
    pub fn average_pd(&self) -> Rate {
        if self.amount > 0.0 {
            self.risk_amount / self.amount
        } else {
            0.0
        }
    }

    pub fn fits_budget(&self, a: &Applicant, budget: Money) -> bool {
        approx_le(self.amount + a.requested_amount, budget)
    }

    pub fn fits_risk(&self, a: &Applicant, risk_cap: Rate) -> bool {
        let amount = self.amount + a.requested_amount;
        if amount <= 0.0 {
            return true;
        }
        let risk = self.risk_amount + a.probability_of_default * a.requested_amount;
        approx_le(risk / amount, risk_cap)
    }

    pub fn within_budget(&self, budget: Money) -> bool {
        approx_le(self.amount, budget)
    }

    pub fn within_risk(&self, risk_cap: Rate) -> bool {
        approx_le(self.average_pd(), risk_cap)
    }
}

/// Sort `indices` by ascending PD, ties by index.
pub fn sort_by_risk(pool: &[Applicant], indices: &mut [usize]) {
    indices.sort_by(|&a, &b| {
        pool[a]
            .probability_of_default
            .total_cmp(&pool[b].probability_of_default)
            .then(a.cmp(&b))
    });
}
