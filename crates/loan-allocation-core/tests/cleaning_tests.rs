use loan_allocation_core::cleaning::{clean, scan, verify_clean, ValidationRule};
use loan_allocation_core::eligibility::{filter, EligibilityStage};
use loan_allocation_core::scenarios::expansion;
use loan_allocation_core::types::{Applicant, LoanCategory};
use pretty_assertions::assert_eq;

fn borrower(age: i32, employment: f64, history: f64) -> Applicant {
    Applicant {
        age,
        income: 48_000.0,
        employment_length: employment,
        credit_history_length: history,
        requested_amount: 9_600.0,
        interest_rate: 11.5,
        loan_to_income_ratio: 0.2,
        loan_category: LoanCategory::Education,
        probability_of_default: 0.04,
        expected_return_rate: 0.125,
    }
}

// ===========================================================================
// RecordValidator
// ===========================================================================

#[test]
fn test_empty_input_cleans_to_empty_report() {
    let out = clean(&[]).unwrap();
    assert!(out.records.is_empty());
    assert_eq!(out.report.original_count, 0);
    assert_eq!(out.report.removed_count, 0);
    assert_eq!(out.report.final_count, 0);

    let eligible = filter(&out.records, &expansion().eligibility).unwrap();
    assert!(eligible.is_empty());
    assert_eq!(eligible.stage, EligibilityStage::Baseline);
}

#[test]
fn test_fifteen_year_old_attributed_to_age() {
    let records = vec![borrower(34, 6.0, 8.0), borrower(15, 0.0, 0.0)];
    let out = clean(&records).unwrap();
    assert_eq!(out.records, vec![borrower(34, 6.0, 8.0)]);
    assert_eq!(out.report.count_for("age"), 1);
    assert_eq!(out.report.removed_count, 1);
}

#[test]
fn test_employment_longer_than_life_removed() {
    // 12 years is under the 80-year ceiling but exceeds the age of 10.
    let child = borrower(10, 12.0, 0.0);
    let out = clean(&[child, borrower(30, 4.0, 5.0)]).unwrap();
    assert_eq!(out.records.len(), 1);
    assert_eq!(out.report.count_for("employment_length"), 1);
    let action = out
        .report
        .actions
        .iter()
        .find(|a| a.rule == "employment_length")
        .unwrap();
    assert_eq!(action.reasons[0].reason, "exceeds age");
}

#[test]
fn test_report_contains_every_rule_then_duplicates() {
    let out = clean(&[borrower(30, 4.0, 5.0)]).unwrap();
    assert_eq!(out.report.actions.len(), ValidationRule::ALL.len() + 1);
    assert_eq!(out.report.actions.last().unwrap().rule, "duplicates");
    assert!(out.report.actions.iter().all(|a| a.count == 0));
}

#[test]
fn test_one_record_may_be_counted_by_several_rules() {
    let mut bad = borrower(30, 4.0, 5.0);
    bad.income = -1.0;
    bad.interest_rate = 0.0;
    let out = clean(&[bad]).unwrap();
    assert_eq!(out.report.removed_count, 1);
    assert_eq!(out.report.count_for("income"), 1);
    assert_eq!(out.report.count_for("interest_rate"), 1);
}

#[test]
fn test_output_satisfies_every_rule_and_is_idempotent() {
    let mut records = Vec::new();
    for age in [12, 18, 25, 40, 99, 100, 101] {
        for employment in [-1.0, 0.0, 5.0, 30.0, 85.0] {
            records.push(borrower(age, employment, 2.0));
        }
    }
    records.push(borrower(40, 5.0, 2.0));
    let first = clean(&records).unwrap();
    assert!(verify_clean(&first.records).is_empty());
    assert_eq!(
        first.report.original_count,
        first.report.removed_count + first.report.final_count
    );

    let second = clean(&first.records).unwrap();
    assert_eq!(second.records, first.records);
    assert_eq!(second.report.removed_count, 0);
}

#[test]
fn test_clean_never_mutates_input() {
    let records = vec![borrower(15, 0.0, 0.0), borrower(30, 4.0, 5.0)];
    let snapshot = records.clone();
    let _ = clean(&records).unwrap();
    assert_eq!(records, snapshot);
}

#[test]
fn test_scan_matches_clean_counts() {
    let mut records = vec![
        borrower(30, 4.0, 5.0),
        borrower(30, 4.0, 5.0),
        borrower(120, 4.0, 5.0),
    ];
    records[2].loan_to_income_ratio = 6.0;
    let s = scan(&records);
    let c = clean(&records).unwrap();
    assert_eq!(s.implausible_records, 1);
    assert_eq!(s.duplicate_records, 1);
    for action in &s.rules {
        assert_eq!(action.count, c.report.count_for(&action.rule));
    }
}
