//! cohort-runner: builds cohort LTV / CAC tables from order and spend CSVs.
//!
//! Usage:
//!   cohort-runner --orders data/orders_sample.csv --spend data/marketing_spend.csv --out reports
//!   cohort-runner --config report.json --db mart.db
//!   cohort-runner --generate-sample data --seed 7 --customers 500 --months 18

use anyhow::{Context, Result};
use cohort_core::{
    config::ReportConfig,
    engine::CohortEngine,
    export::{export_report, format_metric, format_number},
    report::CohortReport,
    sample::{SampleConfig, SampleData},
    source::{read_orders_file, read_spend_file},
    store::MartStore,
};
use std::env;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if let Some(dir) = arg_value(&args, "--generate-sample") {
        return generate_sample(&args, dir);
    }

    let config = build_config(&args)?;

    println!("Cohort LTV / CAC — cohort-runner");
    println!("  orders:    {}", config.orders_path);
    println!("  spend:     {}", config.spend_path);
    println!("  out:       {}", config.out_dir);
    println!("  db:        {}", config.db_path.as_deref().unwrap_or("(none)"));
    println!();

    let raw_orders = read_orders_file(&config.orders_path)?;
    let raw_spend = read_spend_file(&config.spend_path)?;

    let engine = CohortEngine::new(config);
    let report = engine.run(&raw_orders, &raw_spend)?;
    let config = engine.config();

    let written = export_report(&report, &config.out_dir, config)?;

    if let Some(db) = &config.db_path {
        let store = MartStore::open(db)?;
        store.migrate()?;
        let run_id = format!("run-{}", uuid::Uuid::new_v4());
        store.insert_run(
            &run_id,
            env!("CARGO_PKG_VERSION"),
            &config.orders_path,
            &config.spend_path,
        )?;
        store.write_report(&run_id, &report)?;
        println!("  mart run:  {run_id}");
    }

    print_summary(&report, config.decimal_places);

    let paths: Vec<String> = written.iter().map(|p| p.display().to_string()).collect();
    println!();
    println!("[OK] Wrote: {}", paths.join(", "));
    Ok(())
}

/// Config file first (if any), then CLI flags on top.
fn build_config(args: &[String]) -> Result<ReportConfig> {
    let mut config = match arg_value(args, "--config") {
        Some(path) => ReportConfig::load(path)?,
        None => ReportConfig::default(),
    };

    if let Some(v) = arg_value(args, "--orders") {
        config.orders_path = v.to_string();
    }
    if let Some(v) = arg_value(args, "--spend") {
        config.spend_path = v.to_string();
    }
    if let Some(v) = arg_value(args, "--out") {
        config.out_dir = v.to_string();
    }
    if let Some(v) = arg_value(args, "--db") {
        config.db_path = Some(v.to_string());
    }
    if let Some(v) = arg_value(args, "--decimals") {
        let places = v
            .parse()
            .with_context(|| format!("--decimals expects a number, got '{v}'"))?;
        config.decimal_places = Some(places);
    }
    if args.iter().any(|a| a == "--no-json") {
        config.write_json = false;
    }

    config.validate()?;
    Ok(config)
}

fn generate_sample(args: &[String], dir: &str) -> Result<()> {
    let defaults = SampleConfig::default();
    let config = SampleConfig {
        seed:      parse_arg(args, "--seed", defaults.seed),
        customers: parse_arg(args, "--customers", defaults.customers),
        months:    parse_arg(args, "--months", defaults.months),
        ..defaults
    };
    let sample = SampleData::generate(&config);

    let dir = Path::new(dir);
    fs::create_dir_all(dir)?;
    let orders_path = dir.join("orders_sample.csv");
    let spend_path = dir.join("marketing_spend.csv");

    let mut w = BufWriter::new(File::create(&orders_path)?);
    sample.write_orders_csv(&mut w)?;
    w.flush()?;

    let mut w = BufWriter::new(File::create(&spend_path)?);
    sample.write_spend_csv(&mut w)?;
    w.flush()?;

    log::info!(
        "sample seed={} customers={} months={}: {} orders, {} spend rows",
        config.seed,
        config.customers,
        config.months,
        sample.orders.len(),
        sample.spend.len()
    );
    println!(
        "[OK] Wrote: {} and {}",
        orders_path.display(),
        spend_path.display()
    );
    Ok(())
}

fn print_summary(report: &CohortReport, decimals: Option<usize>) {
    let places = decimals.or(Some(2));
    println!("=== COHORT SUMMARY ===");
    if report.summary.is_empty() {
        println!("  (No cohorts — orders file has no rows)");
        return;
    }
    println!(
        "  {:<8} | {:>6} | {:>10} | {:>10} | {:>10} | {:>8}",
        "cohort", "new", "spend", "LTV", "CAC", "LTV:CAC"
    );
    for row in &report.summary {
        println!(
            "  {:<8} | {:>6} | {:>10} | {:>10} | {:>10} | {:>8}",
            row.cohort_month.to_string(),
            row.new_customers,
            format_number(row.spend_total, places),
            dash_if_empty(format_metric(row.ltv_latest, places)),
            dash_if_empty(format_metric(row.cac, places)),
            dash_if_empty(format_metric(row.ltv_to_cac, places)),
        );
    }
}

fn dash_if_empty(s: String) -> String {
    if s.is_empty() { "-".into() } else { s }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
