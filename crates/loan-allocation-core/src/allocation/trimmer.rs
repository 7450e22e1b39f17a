//! Risk trimming of a rounded allocation.
//!
//! Re-admits allocations in ascending PD order (ties by index) while the
//! cumulative amount stays within budget, the running weighted-average PD
//! stays within the cap, and the count stays below the band maximum. When the
//! band minimum cannot be met from the allocated subset, unallocated
//! candidates are streamed in after it, again in ascending PD order.
//!
//! The minimum is advisory. Budget and risk cap are binding.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::config::CountBand;
use super::exposure::{sort_by_risk, Exposure};
use crate::types::{Applicant, Money, Rate};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimStats {
    /// Allocated before trimming.
    pub initial_count: usize,
    /// Allocated after trimming.
    pub final_count: usize,
    /// Previously allocated records that were dropped.
    pub dropped: usize,
    /// Previously unallocated records that were added to approach the minimum.
    pub added: usize,
    pub rejected_budget: usize,
    pub rejected_risk: usize,
    /// The scan ended before the stream was exhausted.
    pub stopped_early: bool,
}

#[derive(Debug, Clone)]
pub struct TrimOutcome {
    pub decisions: Vec<bool>,
    pub stats: TrimStats,
}

/// Whether `decisions` breaks the budget, the risk cap, or the count band.
pub fn needs_trim(
    pool: &[Applicant],
    decisions: &[bool],
    budget: Money,
    risk_cap: Rate,
    band: &CountBand,
) -> bool {
    let e = Exposure::of(pool, decisions);
    !e.within_budget(budget)
        || !e.within_risk(risk_cap)
        || band.max.is_some_and(|m| e.count > m)
        || band.min.is_some_and(|m| e.count < m)
}

/// Greedy ascending-PD repair. `candidates` is the universe the "add"
/// direction may draw from; it is only consulted when `band.min` is set.
pub fn trim(
    pool: &[Applicant],
    decisions: &[bool],
    candidates: &[usize],
    budget: Money,
    risk_cap: Rate,
    band: &CountBand,
) -> TrimOutcome {
    let mut allocated: Vec<usize> = decisions
        .iter()
        .enumerate()
        .filter_map(|(i, d)| d.then_some(i))
        .collect();
    sort_by_risk(pool, &mut allocated);

    let mut reserve: Vec<usize> = match band.min {
        Some(_) => candidates
            .iter()
            .copied()
            .filter(|&i| !decisions[i])
            .collect(),
        None => Vec::new(),
    };
    sort_by_risk(pool, &mut reserve);

    let stream = allocated
        .iter()
        .map(|&i| (i, false))
        .chain(reserve.iter().map(|&i| (i, true)));

    let mut out = vec![false; pool.len()];
    let mut exposure = Exposure::default();
    let mut stats = TrimStats {
        initial_count: allocated.len(),
        ..TrimStats::default()
    };

    for (i, from_reserve) in stream {
        if band.max.is_some_and(|m| exposure.count >= m) {
            stats.stopped_early = true;
            break;
        }
        let min_met = band.min.is_some_and(|m| exposure.count >= m);
        if from_reserve && min_met {
            break;
        }

        let a = &pool[i];
        if !exposure.fits_budget(a, budget) {
            stats.rejected_budget += 1;
            continue;
        }
        if !exposure.fits_risk(a, risk_cap) {
            stats.rejected_risk += 1;
            if min_met {
                stats.stopped_early = true;
                break;
            }
            continue;
        }

        exposure.add(a);
        out[i] = true;
        if from_reserve {
            stats.added += 1;
        }
    }

    stats.final_count = exposure.count;
    stats.dropped = stats.initial_count - (stats.final_count - stats.added);

    if let Some(min) = band.min {
        if stats.final_count < min {
            warn!(
                admitted = stats.final_count,
                min, "minimum count not reachable within budget and risk cap"
            );
        }
    }

    TrimOutcome {
        decisions: out,
        stats,
    }
}
