//! Aggregator — revenue matrix and acquisition counts.

use crate::{
    cohort::CustomerCohort,
    enrich::EnrichedOrder,
    types::{Money, Offset, YearMonth},
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CohortRevenuePoint {
    pub cohort_month: YearMonth,
    pub offset:       Offset,
    pub revenue:      Money,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AcquisitionCount {
    pub cohort_month:  YearMonth,
    pub new_customers: u64,
}

/// Sum revenue by (cohort month, offset), sorted by both ascending.
pub fn aggregate_revenue(enriched: &[EnrichedOrder]) -> Vec<CohortRevenuePoint> {
    let mut totals: BTreeMap<(YearMonth, Offset), Money> = BTreeMap::new();
    for e in enriched {
        *totals.entry((e.cohort_month, e.offset)).or_insert(0.0) += e.order.revenue;
    }

    totals
        .into_iter()
        .map(|((cohort_month, offset), revenue)| CohortRevenuePoint {
            cohort_month,
            offset,
            revenue,
        })
        .collect()
}

/// Distinct customers per cohort month, sorted ascending.
pub fn count_acquisitions(cohorts: &[CustomerCohort]) -> Vec<AcquisitionCount> {
    let mut customers: BTreeMap<YearMonth, BTreeSet<&str>> = BTreeMap::new();
    for c in cohorts {
        customers
            .entry(c.cohort_month)
            .or_default()
            .insert(c.customer_id.as_str());
    }

    customers
        .into_iter()
        .map(|(cohort_month, ids)| AcquisitionCount {
            cohort_month,
            new_customers: ids.len() as u64,
        })
        .collect()
}
