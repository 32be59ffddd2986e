//! The cohort engine — runs the full pipeline over one input snapshot.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Normalize orders and spend
//!   2. Assign cohorts
//!   3. Enrich orders
//!   4. Aggregate revenue and acquisitions
//!   5. CAC
//!   6. Per-period and cumulative LTV
//!   7. Summary
//!
//! RULES:
//!   - Each stage is a pure function of earlier stages' tables.
//!   - No stage mutates a table it did not build.
//!   - There is no incremental path: every run recomputes everything.

use crate::{
    aggregate::{aggregate_revenue, count_acquisitions},
    cac::compute_cac,
    cohort::assign_cohorts,
    config::ReportConfig,
    enrich::enrich_orders,
    error::CohortResult,
    ltv::{compute_ltv, cumulative_ltv},
    normalizer::{normalize_orders, normalize_spend, Order, RawOrderRow, RawSpendRow, SpendRecord},
    report::{CohortReport, LtvCumulativeTable},
    summary::build_summary,
};

pub struct CohortEngine {
    config: ReportConfig,
}

impl CohortEngine {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Full run from raw rows. Any malformed row aborts before a report exists.
    pub fn run(&self, raw_orders: &[RawOrderRow], raw_spend: &[RawSpendRow]) -> CohortResult<CohortReport> {
        let orders = normalize_orders(raw_orders)?;
        let spend = normalize_spend(raw_spend)?;
        self.run_facts(orders, spend)
    }

    /// Stages 2–7 over already-normalized facts.
    pub fn run_facts(&self, orders: Vec<Order>, spend: Vec<SpendRecord>) -> CohortResult<CohortReport> {
        let cohorts = assign_cohorts(&orders);
        let enriched = enrich_orders(&orders, &cohorts)?;

        let revenue = aggregate_revenue(&enriched);
        let acquisitions = count_acquisitions(&cohorts);
        log::debug!(
            "aggregated {} revenue points across {} cohorts",
            revenue.len(),
            acquisitions.len()
        );

        let cac = compute_cac(&acquisitions, &spend);
        let ltv = compute_ltv(&revenue, &acquisitions);
        let cumulative = cumulative_ltv(&ltv);
        let summary = build_summary(&acquisitions, &cac, &cumulative);
        let ltv_cumulative = LtvCumulativeTable::build(&acquisitions, &cumulative);

        self.log_summary(&summary);

        Ok(CohortReport {
            orders,
            spend,
            enriched,
            cohorts,
            revenue,
            acquisitions,
            cac,
            ltv,
            cumulative,
            ltv_cumulative,
            summary,
        })
    }

    fn log_summary(&self, summary: &[crate::summary::SummaryRow]) {
        let threshold = self.config.ltv_cac_warning_threshold;
        for row in summary {
            match row.ltv_to_cac {
                Some(r) if r < threshold => log::warn!(
                    "cohort {}: LTV:CAC {:.2} below {:.2}",
                    row.cohort_month,
                    r,
                    threshold
                ),
                Some(_) => {}
                None => log::info!("cohort {}: LTV:CAC undefined", row.cohort_month),
            }
        }
        let customers: u64 = summary.iter().map(|r| r.new_customers).sum();
        log::info!("{} cohorts, {} customers", summary.len(), customers);
    }
}

impl Default for CohortEngine {
    fn default() -> Self {
        Self::new(ReportConfig::default())
    }
}
