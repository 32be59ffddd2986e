//! Output table rendering tests.

use cohort_core::{
    config::ReportConfig,
    engine::CohortEngine,
    export::{export_report, write_ltv_cumulative_csv, write_summary_csv, ReportTables},
    normalizer::{RawOrderRow, RawSpendRow},
    report::CohortReport,
};

fn order(id: &str, date: &str, customer: &str, revenue: &str) -> RawOrderRow {
    RawOrderRow {
        line:        0,
        order_id:    Some(id.into()),
        order_date:  Some(date.into()),
        customer_id: Some(customer.into()),
        channel:     Some("organic".into()),
        revenue:     Some(revenue.into()),
    }
}

fn report() -> CohortReport {
    let orders = vec![
        order("1", "2023-01-02", "C1", "30"),
        order("2", "2023-01-20", "C2", "10"),
        order("3", "2023-03-05", "C1", "10"),
        order("4", "2023-02-14", "C3", "9"),
    ];
    let spend = vec![RawSpendRow {
        line:    0,
        month:   Some("2023-01".into()),
        channel: None,
        spend:   Some("30".into()),
    }];
    CohortEngine::default().run(&orders, &spend).unwrap()
}

#[test]
fn ltv_cumulative_csv_carries_values_forward() {
    let mut out = Vec::new();
    write_ltv_cumulative_csv(&report().ltv_cumulative, None, &mut out).unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "cohort_month,0,2\n\
         2023-01,20,25\n\
         2023-02,9,9\n"
    );
}

#[test]
fn summary_csv_leaves_undefined_cells_empty() {
    let mut out = Vec::new();
    write_summary_csv(&report().summary, Some(2), &mut out).unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "cohort_month,new_customers,spend_total,LTV_latest,CAC,LTV_to_CAC\n\
         2023-01,2,30.00,25.00,15.00,1.67\n\
         2023-02,1,0.00,9.00,0.00,\n"
    );
}

#[test]
fn json_tables_use_null_for_undefined() {
    let json = ReportTables::from_report(&report(), Some(3)).to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let summary = value["Summary"].as_array().unwrap();
    assert_eq!(summary[0]["cohort_month"], "2023-01");
    assert_eq!(summary[0]["LTV_latest"], 25.0);
    assert_eq!(summary[0]["CAC"], 15.0);
    assert_eq!(summary[0]["LTV_to_CAC"], 1.667);
    assert!(summary[1]["LTV_to_CAC"].is_null());
    assert!(summary[0].get("ltv_to_cac").is_none(), "keys match the CSV header");
    assert_eq!(value["LTV_cumulative"]["offsets"], serde_json::json!([0, 2]));
}

/// A tie at the rounding digit must come out the same in CSV and JSON.
#[test]
fn csv_and_json_round_ties_alike() {
    let orders = vec![order("1", "2023-01-01", "C1", "0.125")];
    let report = CohortEngine::default().run(&orders, &[]).unwrap();

    let mut out = Vec::new();
    write_summary_csv(&report.summary, Some(2), &mut out).unwrap();
    let csv = String::from_utf8(out).unwrap();
    let csv_ltv = csv.lines().nth(1).unwrap().split(',').nth(3).unwrap().to_string();

    let json = ReportTables::from_report(&report, Some(2)).to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let json_ltv = value["Summary"][0]["LTV_latest"].as_f64().unwrap();

    assert_eq!(csv_ltv, "0.12");
    assert_eq!(json_ltv, 0.12);
    assert_eq!(format!("{json_ltv:.2}"), csv_ltv);

    let cumulative = value["LTV_cumulative"]["rows"][0]["cells"][0].as_f64().unwrap();
    assert_eq!(cumulative, json_ltv);
}

#[test]
fn export_report_writes_enabled_files() {
    let dir = std::env::temp_dir().join(format!("cohort-export-{}", std::process::id()));
    let config = ReportConfig {
        write_json: false,
        ..ReportConfig::default_test()
    };

    let written = export_report(&report(), &dir, &config).unwrap();

    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["LTV_cumulative.csv", "Summary.csv"]);
    assert!(std::fs::read_to_string(&written[1])
        .unwrap()
        .starts_with("cohort_month,new_customers"));

    std::fs::remove_dir_all(&dir).ok();
}

/// The runner exports with the config the engine was built from.
#[test]
fn export_follows_engine_config() {
    let dir = std::env::temp_dir().join(format!("cohort-engine-cfg-{}", std::process::id()));
    let engine = CohortEngine::new(ReportConfig {
        decimal_places: Some(1),
        ..ReportConfig::default_test()
    });
    let orders = vec![order("1", "2023-01-01", "C1", "12.34")];
    let report = engine.run(&orders, &[]).unwrap();

    let written = export_report(&report, &dir, engine.config()).unwrap();

    let summary = std::fs::read_to_string(&written[1]).unwrap();
    assert_eq!(summary.lines().nth(1), Some("2023-01,1,0.0,12.3,0.0,"));
    assert_eq!(engine.config().decimal_places, Some(1));

    std::fs::remove_dir_all(&dir).ok();
}
