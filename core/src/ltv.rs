//! LTV calculator — per-period LTV and its running sum per cohort.
//!
//! The running sum is a partitioned prefix sum: sort by
//! (cohort month, offset), scan forward once, reset the total whenever
//! the cohort month changes. Offsets with no revenue simply have no point,
//! so gaps contribute nothing and need no zero-filling.

use crate::{
    aggregate::{AcquisitionCount, CohortRevenuePoint},
    cac::divide,
    types::{Metric, Money, Offset, YearMonth},
};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LtvPoint {
    pub cohort_month:  YearMonth,
    pub offset:        Offset,
    pub revenue:       Money,
    pub new_customers: u64,
    pub ltv:           Metric,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CumulativeLtvPoint {
    pub cohort_month:   YearMonth,
    pub offset:         Offset,
    pub cumulative_ltv: Metric,
}

/// Inner join of revenue points with acquisition counts.
pub fn compute_ltv(
    revenue: &[CohortRevenuePoint],
    acquisitions: &[AcquisitionCount],
) -> Vec<LtvPoint> {
    let counts: HashMap<YearMonth, u64> = acquisitions
        .iter()
        .map(|a| (a.cohort_month, a.new_customers))
        .collect();

    revenue
        .iter()
        .filter_map(|p| {
            let Some(&new_customers) = counts.get(&p.cohort_month) else {
                log::warn!("revenue at {} offset {} has no acquisition count", p.cohort_month, p.offset);
                return None;
            };
            Some(LtvPoint {
                cohort_month: p.cohort_month,
                offset:       p.offset,
                revenue:      p.revenue,
                new_customers,
                ltv:          divide(p.revenue, new_customers),
            })
        })
        .collect()
}

/// Running LTV per cohort over ascending offset.
/// Once a cohort's total is undefined it stays undefined.
pub fn cumulative_ltv(points: &[LtvPoint]) -> Vec<CumulativeLtvPoint> {
    let mut ordered: Vec<&LtvPoint> = points.iter().collect();
    ordered.sort_by_key(|p| (p.cohort_month, p.offset));

    let mut out = Vec::with_capacity(ordered.len());
    let mut current: Option<YearMonth> = None;
    let mut running: Metric = Some(0.0);

    for p in ordered {
        if current != Some(p.cohort_month) {
            current = Some(p.cohort_month);
            running = Some(0.0);
        }
        running = running.zip(p.ltv).map(|(total, ltv)| total + ltv);
        out.push(CumulativeLtvPoint {
            cohort_month:   p.cohort_month,
            offset:         p.offset,
            cumulative_ltv: running,
        });
    }
    out
}
