//! Output tables handed to exporters and the data mart.

use crate::{
    aggregate::{AcquisitionCount, CohortRevenuePoint},
    cac::CacRecord,
    cohort::CustomerCohort,
    enrich::EnrichedOrder,
    ltv::{CumulativeLtvPoint, LtvPoint},
    normalizer::{Order, SpendRecord},
    summary::SummaryRow,
    types::{Metric, Offset, YearMonth},
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Cohort × offset matrix of cumulative LTV.
///
/// Columns are every offset observed anywhere in the data. A cell with no
/// revenue point carries the cohort's running value forward; a cell before
/// the cohort's first point is 0. A cohort with no points has all cells
/// undefined.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LtvCumulativeTable {
    pub offsets: Vec<Offset>,
    pub rows:    Vec<LtvCumulativeRow>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LtvCumulativeRow {
    pub cohort_month: YearMonth,
    pub cells:        Vec<Metric>,
}

impl LtvCumulativeTable {
    pub fn build(acquisitions: &[AcquisitionCount], cumulative: &[CumulativeLtvPoint]) -> Self {
        let offsets: Vec<Offset> = cumulative
            .iter()
            .map(|p| p.offset)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut by_cohort: BTreeMap<YearMonth, BTreeMap<Offset, Metric>> = BTreeMap::new();
        for p in cumulative {
            by_cohort
                .entry(p.cohort_month)
                .or_default()
                .insert(p.offset, p.cumulative_ltv);
        }

        let months: BTreeSet<YearMonth> = acquisitions
            .iter()
            .map(|a| a.cohort_month)
            .chain(by_cohort.keys().copied())
            .collect();

        let rows = months
            .into_iter()
            .map(|cohort_month| {
                let cells = match by_cohort.get(&cohort_month) {
                    None => vec![None; offsets.len()],
                    Some(points) => {
                        let mut carried: Metric = Some(0.0);
                        offsets
                            .iter()
                            .map(|offset| {
                                if let Some(value) = points.get(offset) {
                                    carried = *value;
                                }
                                carried
                            })
                            .collect()
                    }
                };
                LtvCumulativeRow { cohort_month, cells }
            })
            .collect();

        Self { offsets, rows }
    }

    pub fn cell(&self, cohort_month: YearMonth, offset: Offset) -> Option<Metric> {
        let col = self.offsets.iter().position(|o| *o == offset)?;
        let row = self.rows.iter().find(|r| r.cohort_month == cohort_month)?;
        row.cells.get(col).copied()
    }
}

/// Everything one engine run produced. Every table is immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct CohortReport {
    #[serde(skip)]
    pub orders: Vec<Order>,
    #[serde(skip)]
    pub spend: Vec<SpendRecord>,
    #[serde(skip)]
    pub enriched: Vec<EnrichedOrder>,
    pub cohorts:        Vec<CustomerCohort>,
    pub revenue:        Vec<CohortRevenuePoint>,
    pub acquisitions:   Vec<AcquisitionCount>,
    pub cac:            Vec<CacRecord>,
    pub ltv:            Vec<LtvPoint>,
    pub cumulative:     Vec<CumulativeLtvPoint>,
    pub ltv_cumulative: LtvCumulativeTable,
    pub summary:        Vec<SummaryRow>,
}

impl CohortReport {
    pub fn summary_for(&self, cohort_month: YearMonth) -> Option<&SummaryRow> {
        self.summary.iter().find(|r| r.cohort_month == cohort_month)
    }

    pub fn cac_for(&self, cohort_month: YearMonth) -> Option<&CacRecord> {
        self.cac.iter().find(|r| r.cohort_month == cohort_month)
    }

    pub fn cumulative_for(&self, cohort_month: YearMonth) -> Vec<&CumulativeLtvPoint> {
        self.cumulative
            .iter()
            .filter(|p| p.cohort_month == cohort_month)
            .collect()
    }
}
