//! Worked cohort scenarios, end to end from raw rows.

use cohort_core::{
    engine::CohortEngine,
    normalizer::{RawOrderRow, RawSpendRow},
    types::YearMonth,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn order(id: &str, date: &str, customer: &str, revenue: &str) -> RawOrderRow {
    RawOrderRow {
        line:        0,
        order_id:    Some(id.into()),
        order_date:  Some(date.into()),
        customer_id: Some(customer.into()),
        channel:     Some("paid_search".into()),
        revenue:     Some(revenue.into()),
    }
}

fn spend(month: &str, channel: &str, amount: &str) -> RawSpendRow {
    RawSpendRow {
        line:    0,
        month:   Some(month.into()),
        channel: Some(channel.into()),
        spend:   Some(amount.into()),
    }
}

fn ym(s: &str) -> YearMonth {
    s.parse().unwrap()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// A single-customer cohort: CAC is the month's spend, LTV(0) is the order.
#[test]
fn single_customer_cohort() {
    let orders = vec![order("1", "2023-01-15", "C1", "100.0")];
    let spend = vec![spend("2023-01", "paid_search", "50")];

    let report = CohortEngine::default().run(&orders, &spend).unwrap();

    let cac = report.cac_for(ym("2023-01")).unwrap();
    assert_eq!(cac.new_customers, 1);
    assert_eq!(cac.spend_total, 50.0);
    assert_eq!(cac.cac, Some(50.0));

    assert_eq!(report.ltv.len(), 1);
    assert_eq!(report.ltv[0].offset, 0);
    assert_eq!(report.ltv[0].ltv, Some(100.0));
    assert_eq!(report.cumulative[0].cumulative_ltv, Some(100.0));

    let row = report.summary_for(ym("2023-01")).unwrap();
    assert_eq!(row.ltv_latest, Some(100.0));
    assert_eq!(row.ltv_to_cac, Some(2.0));
}

/// Missing spend for a cohort month is zero spend, not a dropped cohort.
#[test]
fn missing_spend_month_gives_zero_cac() {
    let orders = vec![
        order("1", "2023-01-03", "C1", "10"),
        order("2", "2023-02-04", "C2", "20"),
        order("3", "2023-02-09", "C3", "30"),
    ];
    let spend = vec![spend("2023-01", "paid_search", "40")];

    let report = CohortEngine::default().run(&orders, &spend).unwrap();

    let feb = report.cac_for(ym("2023-02")).expect("cohort must not be dropped");
    assert_eq!(feb.new_customers, 2);
    assert_eq!(feb.spend_total, 0.0);
    assert_eq!(feb.cac, Some(0.0));

    let row = report.summary_for(ym("2023-02")).unwrap();
    assert_eq!(row.cac, Some(0.0));
    assert_eq!(row.ltv_to_cac, None, "zero CAC leaves the ratio undefined");
    assert_eq!(row.ltv_latest, Some(25.0));
}

/// Gaps between offsets add nothing to the running sum.
#[test]
fn offset_gap_does_not_affect_cumulative() {
    let orders = vec![
        order("1", "2023-01-10", "C1", "60"),
        order("2", "2023-03-22", "C1", "40"),
    ];

    let report = CohortEngine::default().run(&orders, &[]).unwrap();

    let points = report.cumulative_for(ym("2023-01"));
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].offset, 0);
    assert_eq!(points[1].offset, 2);
    assert_eq!(points[1].cumulative_ltv, Some(100.0));

    // The pivot carries the offset-0 value through the empty column.
    let table = &report.ltv_cumulative;
    assert_eq!(table.offsets, vec![0, 2]);
    assert_eq!(table.cell(ym("2023-01"), 2), Some(Some(100.0)));
}

/// Ten customers, revenue 100 at offset 0 and 50 at offset 1.
#[test]
fn ten_customer_cohort_accumulates() {
    let mut orders: Vec<RawOrderRow> = (1..=10)
        .map(|i| order(&i.to_string(), "2023-01-05", &format!("C{i}"), "10"))
        .collect();
    orders.push(order("11", "2023-02-05", "C1", "50"));

    let report = CohortEngine::default().run(&orders, &[]).unwrap();

    let points = report.cumulative_for(ym("2023-01"));
    assert_eq!(points[0].cumulative_ltv, Some(10.0));
    assert_eq!(points[1].cumulative_ltv, Some(15.0));
}

/// Spend rows for the same month are summed across channels.
#[test]
fn spend_is_summed_across_channels() {
    let orders = vec![
        order("1", "2023-04-01", "C1", "10"),
        order("2", "2023-04-02", "C2", "10"),
    ];
    let spend = vec![
        spend("2023-04", "paid_search", "30"),
        spend("2023-04", "paid_social", "50"),
        spend("2023-05", "paid_social", "999"),
    ];

    let report = CohortEngine::default().run(&orders, &spend).unwrap();

    assert_eq!(report.cac.len(), 1, "spend months without cohorts add no rows");
    let apr = report.cac_for(ym("2023-04")).unwrap();
    assert_eq!(apr.spend_total, 80.0);
    assert!(approx(apr.cac.unwrap(), 40.0));
}

/// Orders later in the cohort's first month stay at offset 0, and a
/// year boundary counts calendar months, not days.
#[test]
fn offsets_count_calendar_months() {
    let orders = vec![
        order("1", "2022-12-31", "C1", "5"),
        order("2", "2022-12-01", "C2", "5"),
        order("3", "2023-01-01", "C1", "7"),
    ];

    let report = CohortEngine::default().run(&orders, &[]).unwrap();

    let offsets: Vec<(String, u32)> = report
        .enriched
        .iter()
        .map(|e| (e.order.order_id.clone(), e.offset))
        .collect();
    assert_eq!(
        offsets,
        vec![("1".into(), 0), ("2".into(), 0), ("3".into(), 1)]
    );
}

/// Summary rows come out in cohort order regardless of input order.
#[test]
fn summary_sorted_by_cohort_month() {
    let orders = vec![
        order("1", "2023-06-01", "C1", "5"),
        order("2", "2023-02-01", "C2", "5"),
        order("3", "2023-04-01", "C3", "5"),
    ];

    let report = CohortEngine::default().run(&orders, &[]).unwrap();

    let months: Vec<String> = report
        .summary
        .iter()
        .map(|r| r.cohort_month.to_string())
        .collect();
    assert_eq!(months, vec!["2023-02", "2023-04", "2023-06"]);
}

/// No orders means an empty but valid report.
#[test]
fn empty_input_gives_empty_report() {
    let report = CohortEngine::default()
        .run(&[], &[spend("2023-01", "x", "10")])
        .unwrap();
    assert!(report.summary.is_empty());
    assert!(report.ltv_cumulative.rows.is_empty());
    assert!(report.ltv_cumulative.offsets.is_empty());
}
