use serde::{Deserialize, Serialize};

use crate::error::AllocationError;
use crate::types::{Applicant, Money, Rate, Years};
use crate::AllocationResult;

/// Conjunction of policy thresholds an applicant must meet to be considered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityCriteria {
    /// Ceiling on the individual probability of default.
    pub max_pd: Rate,
    pub min_income: Money,
    pub min_employment: Years,
    pub min_history: Years,
    pub max_ratio: Rate,
    /// Inclusive age range.
    pub min_age: i32,
    pub max_age: i32,
}

impl EligibilityCriteria {
    pub fn admits(&self, a: &Applicant) -> bool {
        a.probability_of_default <= self.max_pd
            && a.income >= self.min_income
            && a.employment_length >= self.min_employment
            && a.credit_history_length >= self.min_history
            && a.loan_to_income_ratio <= self.max_ratio
            && (self.min_age..=self.max_age).contains(&a.age)
    }

    /// Indices of `pool` this criteria set admits, in pool order.
    pub fn admitted_indices(&self, pool: &[Applicant]) -> Vec<usize> {
        pool.iter()
            .enumerate()
            .filter(|(_, a)| self.admits(a))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn validate(&self, field: &str) -> AllocationResult<()> {
        if !(0.0..=1.0).contains(&self.max_pd) {
            return Err(AllocationError::InvalidInput {
                field: format!("{field}.max_pd"),
                reason: "Must be in [0, 1].".into(),
            });
        }
        if self.min_age > self.max_age {
            return Err(AllocationError::InvalidInput {
                field: format!("{field}.min_age"),
                reason: format!(
                    "min_age ({}) exceeds max_age ({}).",
                    self.min_age, self.max_age
                ),
            });
        }
        if self.max_ratio <= 0.0 {
            return Err(AllocationError::InvalidInput {
                field: format!("{field}.max_ratio"),
                reason: "Must be positive.".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LoanCategory;

    fn criteria() -> EligibilityCriteria {
        EligibilityCriteria {
            max_pd: 0.10,
            min_income: 25_000.0,
            min_employment: 0.5,
            min_history: 1.0,
            max_ratio: 0.35,
            min_age: 20,
            max_age: 70,
        }
    }

    fn applicant() -> Applicant {
        Applicant {
            age: 20,
            income: 25_000.0,
            employment_length: 0.5,
            credit_history_length: 1.0,
            requested_amount: 8_750.0,
            interest_rate: 9.0,
            loan_to_income_ratio: 0.35,
            loan_category: LoanCategory::Venture,
            probability_of_default: 0.10,
            expected_return_rate: 0.12,
        }
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        assert!(criteria().admits(&applicant()));
    }

    #[test]
    fn test_each_threshold_rejects() {
        let c = criteria();
        let mut a = applicant();
        a.probability_of_default = 0.1001;
        assert!(!c.admits(&a));
        let mut a = applicant();
        a.income = 24_999.0;
        assert!(!c.admits(&a));
        let mut a = applicant();
        a.employment_length = 0.4;
        assert!(!c.admits(&a));
        let mut a = applicant();
        a.credit_history_length = 0.9;
        assert!(!c.admits(&a));
        let mut a = applicant();
        a.loan_to_income_ratio = 0.36;
        assert!(!c.admits(&a));
        let mut a = applicant();
        a.age = 71;
        assert!(!c.admits(&a));
    }

    #[test]
    fn test_reject_inverted_age_range() {
        let mut c = criteria();
        c.min_age = 80;
        assert!(c.validate("baseline").is_err());
    }
}
