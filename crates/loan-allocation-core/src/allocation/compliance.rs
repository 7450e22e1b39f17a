//! Post-allocation compliance scorecard.
//!
//! Six checks over the selected portfolio:
//! 1. Weighted-average PD within the risk cap
//! 2. Share of borrowers with stable employment
//! 3. Share of borrowers with a long enough credit history
//! 4. Mean age inside the configured range
//! 5. Mean income at or above the floor
//! 6. Mean loan-to-income ratio at or below the ceiling
//!
//! score = passed / total. Conforming at 90% and above, largely conforming at
//! 70% and above, partially conforming otherwise.

use serde::{Deserialize, Serialize};

use super::config::{ComplianceThresholds, ScenarioConfig};
use super::exposure::Exposure;
use crate::types::{approx_le, Applicant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Conforming,
    LargelyConforming,
    PartiallyConforming,
}

impl std::fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComplianceStatus::Conforming => write!(f, "Conforming"),
            ComplianceStatus::LargelyConforming => write!(f, "Largely conforming"),
            ComplianceStatus::PartiallyConforming => write!(f, "Partially conforming"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceCheck {
    pub name: String,
    pub value: f64,
    /// Human-readable requirement, e.g. `">= 80%"`.
    pub requirement: String,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceScorecard {
    pub checks: Vec<ComplianceCheck>,
    pub passed: usize,
    pub total: usize,
    pub score: f64,
    pub status: ComplianceStatus,
}

pub fn scorecard(pool: &[Applicant], selected: &[bool], config: &ScenarioConfig) -> ComplianceScorecard {
    let t: &ComplianceThresholds = &config.compliance;
    let chosen: Vec<&Applicant> = pool
        .iter()
        .zip(selected)
        .filter_map(|(a, d)| d.then_some(a))
        .collect();
    let n = chosen.len() as f64;
    let share = |pred: &dyn Fn(&Applicant) -> bool| {
        if chosen.is_empty() {
            0.0
        } else {
            chosen.iter().filter(|a| pred(a)).count() as f64 / n
        }
    };
    let mean = |f: &dyn Fn(&Applicant) -> f64| {
        if chosen.is_empty() {
            0.0
        } else {
            chosen.iter().map(|a| f(a)).sum::<f64>() / n
        }
    };

    let weighted_pd = Exposure::of(pool, selected).average_pd();
    let stable = share(&|a: &Applicant| a.employment_length >= t.stable_employment_years);
    let history = share(&|a: &Applicant| a.credit_history_length >= t.good_history_years);
    let age = mean(&|a: &Applicant| a.age as f64);
    let income = mean(&|a: &Applicant| a.income);
    let ratio = mean(&|a: &Applicant| a.loan_to_income_ratio);
    let non_empty = !chosen.is_empty();

    let checks = vec![
        ComplianceCheck {
            name: "weighted_pd".into(),
            value: weighted_pd,
            requirement: format!("<= {:.2}%", config.risk_cap * 100.0),
            passed: non_empty && approx_le(weighted_pd, config.risk_cap),
        },
        ComplianceCheck {
            name: "stable_employment_share".into(),
            value: stable,
            requirement: format!(
                ">= {:.0}% with {}+ years",
                t.min_stable_employment_share * 100.0,
                t.stable_employment_years
            ),
            passed: non_empty && stable >= t.min_stable_employment_share,
        },
        ComplianceCheck {
            name: "good_history_share".into(),
            value: history,
            requirement: format!(
                ">= {:.0}% with {}+ years",
                t.min_good_history_share * 100.0,
                t.good_history_years
            ),
            passed: non_empty && history >= t.min_good_history_share,
        },
        ComplianceCheck {
            name: "mean_age".into(),
            value: age,
            requirement: format!("in [{}, {}]", t.min_mean_age, t.max_mean_age),
            passed: non_empty && (t.min_mean_age..=t.max_mean_age).contains(&age),
        },
        ComplianceCheck {
            name: "mean_income".into(),
            value: income,
            requirement: format!(">= {:.0}", t.min_mean_income),
            passed: non_empty && income >= t.min_mean_income,
        },
        ComplianceCheck {
            name: "mean_loan_to_income".into(),
            value: ratio,
            requirement: format!("<= {:.2}", t.max_mean_ratio),
            passed: non_empty && approx_le(ratio, t.max_mean_ratio),
        },
    ];

    let passed = checks.iter().filter(|c| c.passed).count();
    let total = checks.len();
    let score = passed as f64 / total as f64;
    let status = if score >= 0.9 {
        ComplianceStatus::Conforming
    } else if score >= 0.7 {
        ComplianceStatus::LargelyConforming
    } else {
        ComplianceStatus::PartiallyConforming
    };

    ComplianceScorecard {
        checks,
        passed,
        total,
        score,
        status,
    }
}
