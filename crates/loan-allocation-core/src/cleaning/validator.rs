//! Record cleaning and data-quality scanning.
//!
//! Covers:
//! 1. **Plausibility mask** -- AND of every [`ValidationRule`], each rule
//!    counted independently over the full input
//! 2. **Deduplication** -- exact duplicates removed after the mask, first
//!    occurrence kept
//! 3. **Post-condition re-scan** -- any rule still firing on the output is a
//!    defect and is returned as an error
//! 4. **Scan** -- the same counts without removing anything

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::rules::ValidationRule;
use crate::error::AllocationError;
use crate::types::Applicant;
use crate::AllocationResult;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// How many records a single sub-reason flagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonCount {
    pub reason: String,
    pub count: usize,
}

/// One entry of the cleaning report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningAction {
    /// Rule name, or `"duplicates"` for the deduplication pass.
    pub rule: String,
    /// Records flagged by this rule. Rules overlap, so these do not sum to
    /// `removed_count`.
    pub count: usize,
    pub description: String,
    /// Per sub-reason breakdown; empty for deduplication.
    pub reasons: Vec<ReasonCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub original_count: usize,
    pub removed_count: usize,
    pub final_count: usize,
    pub actions: Vec<CleaningAction>,
}

impl CleaningReport {
    /// `(rule_name, count)` pairs in report order.
    pub fn rule_counts(&self) -> Vec<(&str, usize)> {
        self.actions
            .iter()
            .map(|a| (a.rule.as_str(), a.count))
            .collect()
    }

    /// Count attributed to `rule`, or zero when absent.
    pub fn count_for(&self, rule: &str) -> usize {
        self.actions
            .iter()
            .find(|a| a.rule == rule)
            .map(|a| a.count)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningOutput {
    pub records: Vec<Applicant>,
    pub report: CleaningReport,
}

/// Non-destructive data-quality scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityScan {
    pub total_records: usize,
    /// Records failing at least one rule.
    pub implausible_records: usize,
    /// Exact duplicates among the full input.
    pub duplicate_records: usize,
    pub rules: Vec<CleaningAction>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Remove implausible and duplicate records.
///
/// An empty input is not an error; it yields an empty output with an
/// all-zero report.
pub fn clean(records: &[Applicant]) -> AllocationResult<CleaningOutput> {
    let original_count = records.len();
    let (actions, keep) = evaluate_rules(records);

    let plausible: Vec<&Applicant> = records
        .iter()
        .zip(&keep)
        .filter_map(|(a, k)| k.then_some(a))
        .collect();

    let mut seen = HashSet::with_capacity(plausible.len());
    let mut cleaned = Vec::with_capacity(plausible.len());
    let mut duplicates = 0usize;
    for a in plausible {
        if seen.insert(record_key(a)) {
            cleaned.push(a.clone());
        } else {
            duplicates += 1;
        }
    }

    let mut actions = actions;
    actions.push(CleaningAction {
        rule: "duplicates".into(),
        count: duplicates,
        description: format!("Removed {} duplicate records", duplicates),
        reasons: Vec::new(),
    });

    let remaining = verify_clean(&cleaned);
    if !remaining.is_empty() {
        return Err(AllocationError::InvariantViolation(format!(
            "cleaned records still violate: {}",
            remaining.join("; ")
        )));
    }

    let final_count = cleaned.len();
    info!(
        original = original_count,
        removed = original_count - final_count,
        duplicates,
        "record cleaning complete"
    );

    Ok(CleaningOutput {
        records: cleaned,
        report: CleaningReport {
            original_count,
            removed_count: original_count - final_count,
            final_count,
            actions,
        },
    })
}

/// Count violations per rule and per sub-reason without removing anything.
pub fn scan(records: &[Applicant]) -> QualityScan {
    let (rules, keep) = evaluate_rules(records);
    let mut seen = HashSet::with_capacity(records.len());
    let duplicate_records = records
        .iter()
        .filter(|a| !seen.insert(record_key(a)))
        .count();
    QualityScan {
        total_records: records.len(),
        implausible_records: keep.iter().filter(|k| !**k).count(),
        duplicate_records,
        rules,
    }
}

/// Re-check every rule. Returns one message per rule/sub-reason that still
/// fires; empty when the set is clean.
pub fn verify_clean(records: &[Applicant]) -> Vec<String> {
    let mut issues = Vec::new();
    for rule in ValidationRule::ALL {
        let mut reasons: Vec<&'static str> = records
            .iter()
            .flat_map(|a| rule.violations(a))
            .collect();
        reasons.sort_unstable();
        reasons.dedup();
        for r in reasons {
            issues.push(format!("{}: {} still present", rule.name(), r));
        }
    }
    issues
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Evaluate all rules over the full input. Returns one action per rule (in
/// rule order, zero counts included) and the keep-mask.
fn evaluate_rules(records: &[Applicant]) -> (Vec<CleaningAction>, Vec<bool>) {
    let mut keep = vec![true; records.len()];
    let mut actions = Vec::with_capacity(ValidationRule::ALL.len() + 1);

    for rule in ValidationRule::ALL {
        let mut count = 0usize;
        let mut reasons: Vec<ReasonCount> = Vec::new();
        for (i, a) in records.iter().enumerate() {
            let v = rule.violations(a);
            if v.is_empty() {
                continue;
            }
            count += 1;
            keep[i] = false;
            for r in v {
                match reasons.iter_mut().find(|rc| rc.reason == r) {
                    Some(rc) => rc.count += 1,
                    None => reasons.push(ReasonCount {
                        reason: r.to_string(),
                        count: 1,
                    }),
                }
            }
        }
        if count > 0 {
            debug!(rule = rule.name(), count, "plausibility rule fired");
        }
        actions.push(CleaningAction {
            rule: rule.name().to_string(),
            count,
            description: rule.describe_removal(count),
            reasons,
        });
    }
    (actions, keep)
}

/// Bitwise identity over every field. `0.0` and `-0.0` map to the same key.
fn record_key(a: &Applicant) -> [u64; 10] {
    fn bits(x: f64) -> u64 {
        if x == 0.0 {
            0
        } else {
            x.to_bits()
        }
    }
    [
        a.age as i64 as u64,
        bits(a.income),
        bits(a.employment_length),
        bits(a.credit_history_length),
        bits(a.requested_amount),
        bits(a.interest_rate),
        bits(a.loan_to_income_ratio),
        a.loan_category as u64,
        bits(a.probability_of_default),
        bits(a.expected_return_rate),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
