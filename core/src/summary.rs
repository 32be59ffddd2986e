//! Summary builder — latest cumulative LTV against CAC per cohort.

use crate::{
    aggregate::AcquisitionCount,
    cac::CacRecord,
    ltv::CumulativeLtvPoint,
    types::{Metric, Money, YearMonth},
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SummaryRow {
    pub cohort_month:  YearMonth,
    pub new_customers: u64,
    pub spend_total:   Money,
    /// Cumulative LTV at the cohort's highest observed offset.
    /// `None` when the cohort has no revenue points at all.
    #[serde(rename = "LTV_latest")]
    pub ltv_latest: Metric,
    #[serde(rename = "CAC")]
    pub cac:        Metric,
    #[serde(rename = "LTV_to_CAC")]
    pub ltv_to_cac: Metric,
}

/// One row per cohort in `acquisitions`, ascending, whether or not it
/// has revenue or spend.
pub fn build_summary(
    acquisitions: &[AcquisitionCount],
    cac: &[CacRecord],
    cumulative: &[CumulativeLtvPoint],
) -> Vec<SummaryRow> {
    let mut latest: BTreeMap<YearMonth, &CumulativeLtvPoint> = BTreeMap::new();
    for point in cumulative {
        latest
            .entry(point.cohort_month)
            .and_modify(|best| {
                if point.offset > best.offset {
                    *best = point;
                }
            })
            .or_insert(point);
    }
    let cac_by_month: HashMap<YearMonth, &CacRecord> =
        cac.iter().map(|c| (c.cohort_month, c)).collect();

    let mut rows: Vec<SummaryRow> = acquisitions
        .iter()
        .map(|a| {
            let ltv_latest = latest.get(&a.cohort_month).and_then(|p| p.cumulative_ltv);
            let cac_record = cac_by_month.get(&a.cohort_month);
            let cac = cac_record.and_then(|c| c.cac);
            SummaryRow {
                cohort_month:  a.cohort_month,
                new_customers: a.new_customers,
                spend_total:   cac_record.map(|c| c.spend_total).unwrap_or(0.0),
                ltv_latest,
                cac,
                ltv_to_cac: ratio(ltv_latest, cac),
            }
        })
        .collect();
    rows.sort_by_key(|r| r.cohort_month);
    rows
}

/// Undefined when either side is undefined or CAC is exactly zero.
pub fn ratio(ltv: Metric, cac: Metric) -> Metric {
    match (ltv, cac) {
        (Some(l), Some(c)) if c != 0.0 => Some(l / c),
        _ => None,
    }
}
