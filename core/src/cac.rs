//! CAC calculator — spend per cohort month over new customers.

use crate::{
    aggregate::AcquisitionCount,
    normalizer::SpendRecord,
    types::{Metric, Money, YearMonth},
};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CacRecord {
    pub cohort_month:  YearMonth,
    pub spend_total:   Money,
    pub new_customers: u64,
    /// `None` when the cohort has no new customers.
    pub cac: Metric,
}

/// Total spend per month across all channels.
pub fn spend_by_month(spend: &[SpendRecord]) -> BTreeMap<YearMonth, Money> {
    let mut totals = BTreeMap::new();
    for record in spend {
        *totals.entry(record.month).or_insert(0.0) += record.spend;
    }
    totals
}

/// Left join of acquisition counts against monthly spend.
/// A cohort month with no spend rows gets `spend_total = 0.0`, never dropped.
pub fn compute_cac(acquisitions: &[AcquisitionCount], spend: &[SpendRecord]) -> Vec<CacRecord> {
    let by_month = spend_by_month(spend);

    for month in by_month.keys() {
        if !acquisitions.iter().any(|a| a.cohort_month == *month) {
            log::debug!("spend month {month} has no acquired customers; not attributed");
        }
    }

    acquisitions
        .iter()
        .map(|a| {
            let spend_total = by_month.get(&a.cohort_month).copied().unwrap_or(0.0);
            CacRecord {
                cohort_month:  a.cohort_month,
                spend_total,
                new_customers: a.new_customers,
                cac:           divide(spend_total, a.new_customers),
            }
        })
        .collect()
}

/// `None` for a zero denominator.
pub(crate) fn divide(numerator: f64, customers: u64) -> Metric {
    (customers > 0).then(|| numerator / customers as f64)
}
