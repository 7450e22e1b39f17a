//! Decision records, portfolio summary and per-category breakdown.

use serde::{Deserialize, Serialize};

use super::config::ScenarioConfig;
use super::exposure::Exposure;
use crate::types::{approx_le, Applicant, LoanCategory, Money, Rate};

/// Per-applicant output of the engine, one per cleaned record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationDecision {
    /// Position in the cleaned pool.
    pub index: usize,
    pub loan_category: LoanCategory,
    pub requested_amount: Money,
    pub probability_of_default: Rate,
    pub expected_return_rate: Rate,
    pub allocation_decision: bool,
    pub allocated_amount: Money,
    pub expected_revenue: Money,
    /// Present only when a loss-given-default is configured.
    pub expected_loss: Option<Money>,
    pub net_profit: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub pool_size: usize,
    pub eligible_count: usize,
    pub selected_count: usize,
    pub allocated_amount: Money,
    pub expected_revenue: Money,
    pub expected_loss: Option<Money>,
    pub net_profit: Option<Money>,
    pub weighted_pd: Rate,
    pub effective_budget: Money,
    /// allocated / effective budget
    pub budget_utilization: Rate,
    /// allocated / total budget
    pub total_budget_utilization: Rate,
    /// Net profit (or revenue without LGD) over allocated amount.
    pub return_on_allocation: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: LoanCategory,
    pub count: usize,
    pub amount: Money,
    pub revenue: Money,
    pub mean_return: Rate,
    pub mean_pd: Rate,
    /// Share of the allocated amount.
    pub realized_share: Rate,
    pub target_share: Option<Rate>,
    /// Amount inside the configured band, when the category has a target.
    pub within_band: Option<bool>,
}

pub fn decisions(pool: &[Applicant], selected: &[bool], loss_given_default: Option<Rate>) -> Vec<AllocationDecision> {
    pool.iter()
        .zip(selected)
        .enumerate()
        .map(|(index, (a, &take))| {
            let allocated_amount = if take { a.requested_amount } else { 0.0 };
            let expected_revenue = allocated_amount * a.expected_return_rate;
            let expected_loss =
                loss_given_default.map(|lgd| allocated_amount * a.probability_of_default * lgd);
            AllocationDecision {
                index,
                loan_category: a.loan_category,
                requested_amount: a.requested_amount,
                probability_of_default: a.probability_of_default,
                expected_return_rate: a.expected_return_rate,
                allocation_decision: take,
                allocated_amount,
                expected_revenue,
                expected_loss,
                net_profit: expected_loss.map(|loss| expected_revenue - loss),
            }
        })
        .collect()
}

pub fn summarize(
    pool: &[Applicant],
    selected: &[bool],
    eligible_count: usize,
    config: &ScenarioConfig,
) -> PortfolioSummary {
    let exposure = Exposure::of(pool, selected);
    let records = decisions(pool, selected, config.loss_given_default);
    let expected_revenue: Money = records.iter().map(|d| d.expected_revenue).sum();
    let expected_loss = config
        .loss_given_default
        .map(|_| records.iter().filter_map(|d| d.expected_loss).sum::<Money>());
    let net_profit = expected_loss.map(|loss| expected_revenue - loss);
    let effective_budget = config.effective_budget();

    PortfolioSummary {
        pool_size: pool.len(),
        eligible_count,
        selected_count: exposure.count,
        allocated_amount: exposure.amount,
        expected_revenue,
        expected_loss,
        net_profit,
        weighted_pd: exposure.average_pd(),
        effective_budget,
        budget_utilization: exposure.amount / effective_budget,
        total_budget_utilization: exposure.amount / config.total_budget,
        return_on_allocation: if exposure.amount > 0.0 {
            net_profit.unwrap_or(expected_revenue) / exposure.amount
        } else {
            0.0
        },
    }
}

/// One row per category, in [`LoanCategory::ALL`] order. Categories with no
/// allocation and no target are omitted.
pub fn category_breakdown(pool: &[Applicant], selected: &[bool], config: &ScenarioConfig) -> Vec<CategoryBreakdown> {
    let total: Money = pool
        .iter()
        .zip(selected)
        .filter(|(_, d)| **d)
        .map(|(a, _)| a.requested_amount)
        .sum();

    LoanCategory::ALL
        .iter()
        .filter_map(|&category| {
            let members: Vec<&Applicant> = pool
                .iter()
                .zip(selected)
                .filter(|(a, d)| **d && a.loan_category == category)
                .map(|(a, _)| a)
                .collect();
            let target_share = config.category_targets.get(&category).copied();
            if members.is_empty() && target_share.is_none() {
                return None;
            }
            let count = members.len();
            let amount: Money = members.iter().map(|a| a.requested_amount).sum();
            let revenue: Money = members
                .iter()
                .map(|a| a.requested_amount * a.expected_return_rate)
                .sum();
            let mean = |f: fn(&Applicant) -> f64| {
                if count == 0 {
                    0.0
                } else {
                    members.iter().map(|a| f(a)).sum::<f64>() / count as f64
                }
            };
            let within_band = config
                .category_band(category)
                .map(|(lo, hi)| approx_le(lo, amount) && approx_le(amount, hi));

            Some(CategoryBreakdown {
                category,
                count,
                amount,
                revenue,
                mean_return: mean(|a| a.expected_return_rate),
                mean_pd: mean(|a| a.probability_of_default),
                realized_share: if total > 0.0 { amount / total } else { 0.0 },
                target_share,
                within_band,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::fixtures::{applicant, minimal_config};

    fn pool() -> Vec<Applicant> {
        let mut p = vec![
            applicant(400.0, 0.02, 0.10),
            applicant(100.0, 0.10, 0.20),
            applicant(500.0, 0.04, 0.08),
        ];
        p[2].loan_category = LoanCategory::Medical;
        p
    }

    #[test]
    fn test_decision_records_without_lgd() {
        let d = decisions(&pool(), &[true, false, true], None);
        assert_eq!(d.len(), 3);
        assert_eq!(d[0].allocated_amount, 400.0);
        assert!((d[0].expected_revenue - 40.0).abs() < 1e-9);
        assert_eq!(d[1].allocated_amount, 0.0);
        assert_eq!(d[1].expected_revenue, 0.0);
        assert!(d[0].expected_loss.is_none());
        assert!(d.iter().all(|r| r.allocated_amount >= 0.0 && r.expected_revenue >= 0.0));
    }

    #[test]
    fn test_decision_records_with_lgd() {
        let d = decisions(&pool(), &[true, false, false], Some(0.5));
        // 400 * 0.02 * 0.5 = 4
        assert!((d[0].expected_loss.unwrap() - 4.0).abs() < 1e-9);
        assert!((d[0].net_profit.unwrap() - 36.0).abs() < 1e-9);
        assert_eq!(d[1].expected_loss, Some(0.0));
    }

    #[test]
    fn test_summary_totals() {
        let cfg = minimal_config();
        let s = summarize(&pool(), &[true, false, true], 3, &cfg);
        assert_eq!(s.selected_count, 2);
        assert!((s.allocated_amount - 900.0).abs() < 1e-9);
        assert!((s.expected_revenue - 80.0).abs() < 1e-9);
        // (8 + 20) / 900
        assert!((s.weighted_pd - 28.0 / 900.0).abs() < 1e-12);
        assert!((s.budget_utilization - 0.9).abs() < 1e-12);
        assert!((s.return_on_allocation - 80.0 / 900.0).abs() < 1e-12);
    }

    #[test]
    fn test_category_rows_and_band() {
        let mut cfg = minimal_config();
        cfg.category_targets.insert(LoanCategory::Medical, 0.5);
        cfg.category_targets.insert(LoanCategory::Venture, 0.1);
        let rows = category_breakdown(&pool(), &[true, false, true], &cfg);
        let cats: Vec<LoanCategory> = rows.iter().map(|r| r.category).collect();
        assert_eq!(
            cats,
            vec![LoanCategory::Venture, LoanCategory::Personal, LoanCategory::Medical]
        );
        let medical = &rows[2];
        assert_eq!(medical.count, 1);
        assert!((medical.realized_share - 500.0 / 900.0).abs() < 1e-12);
        assert_eq!(medical.within_band, Some(true));
        let venture = &rows[0];
        assert_eq!(venture.count, 0);
        assert_eq!(venture.within_band, Some(false));
        assert_eq!(rows[1].within_band, None);
    }
}
