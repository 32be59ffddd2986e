//! Invariants checked across many seeded sample datasets.

use cohort_core::{
    engine::CohortEngine,
    report::CohortReport,
    sample::{SampleConfig, SampleData},
};
use std::collections::HashMap;

const SEEDS: [u64; 6] = [1, 7, 42, 1234, 0xDEAD_BEEF, 0xCAFE_F00D];

fn run(seed: u64) -> CohortReport {
    let sample = SampleData::generate(&SampleConfig {
        seed,
        customers: 150,
        months: 9,
        ..SampleConfig::default()
    });
    CohortEngine::default()
        .run(&sample.orders, &sample.spend)
        .expect("sample data is well-formed")
}

#[test]
fn every_order_is_on_or_after_its_cohort() {
    for seed in SEEDS {
        let report = run(seed);
        for e in &report.enriched {
            assert!(
                e.cohort_month <= e.order.order_month,
                "seed {seed}: order {} precedes its cohort",
                e.order.order_id
            );
        }
    }
}

#[test]
fn latest_cumulative_equals_total_revenue_per_customer() {
    for seed in SEEDS {
        let report = run(seed);

        let mut revenue: HashMap<String, f64> = HashMap::new();
        for e in &report.enriched {
            *revenue.entry(e.cohort_month.to_string()).or_default() += e.order.revenue;
        }

        for row in &report.summary {
            let total = revenue[&row.cohort_month.to_string()];
            let expected = total / row.new_customers as f64;
            let latest = row.ltv_latest.expect("every cohort has revenue points");
            assert!(
                (latest - expected).abs() < 1e-6,
                "seed {seed} cohort {}: latest {latest} != {expected}",
                row.cohort_month
            );
        }
    }
}

#[test]
fn cumulative_ltv_is_non_decreasing() {
    for seed in SEEDS {
        let report = run(seed);
        for row in &report.ltv_cumulative.rows {
            let cells: Vec<f64> = row.cells.iter().map(|c| c.unwrap()).collect();
            for pair in cells.windows(2) {
                assert!(
                    pair[1] >= pair[0],
                    "seed {seed} cohort {}: {:?} decreases",
                    row.cohort_month,
                    cells
                );
            }
        }
    }
}

#[test]
fn cac_defined_iff_cohort_has_customers() {
    for seed in SEEDS {
        let report = run(seed);
        assert_eq!(report.cac.len(), report.acquisitions.len());
        for c in &report.cac {
            assert_eq!(c.cac.is_some(), c.new_customers > 0);
        }
    }
}

#[test]
fn every_customer_counted_exactly_once() {
    for seed in SEEDS {
        let report = run(seed);
        let counted: u64 = report.acquisitions.iter().map(|a| a.new_customers).sum();
        assert_eq!(counted as usize, report.cohorts.len());
        assert!(report.acquisitions.iter().all(|a| a.new_customers > 0));
    }
}
