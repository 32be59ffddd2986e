//! Table export — CSV and JSON renditions of the two output tables.
//!
//! Undefined metrics are written as empty CSV cells and JSON `null`.
//! Output depends only on the report and the config, so identical
//! inputs always produce byte-identical files.

use crate::{
    config::ReportConfig,
    error::CohortResult,
    report::{CohortReport, LtvCumulativeRow, LtvCumulativeTable},
    summary::SummaryRow,
    types::Metric,
};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const LTV_CUMULATIVE_FILE: &str = "LTV_cumulative.csv";
pub const SUMMARY_FILE: &str = "Summary.csv";
pub const REPORT_JSON_FILE: &str = "report.json";

pub fn format_number(value: f64, decimals: Option<usize>) -> String {
    match decimals {
        Some(places) => format!("{value:.places$}"),
        None => value.to_string(),
    }
}

pub fn format_metric(value: Metric, decimals: Option<usize>) -> String {
    value.map(|v| format_number(v, decimals)).unwrap_or_default()
}

pub fn write_ltv_cumulative_csv<W: Write>(
    table: &LtvCumulativeTable,
    decimals: Option<usize>,
    writer: &mut W,
) -> io::Result<()> {
    let mut header = vec!["cohort_month".to_string()];
    header.extend(table.offsets.iter().map(|o| o.to_string()));
    writeln!(writer, "{}", header.join(","))?;

    for row in &table.rows {
        let mut cells = vec![row.cohort_month.to_string()];
        cells.extend(row.cells.iter().map(|c| format_metric(*c, decimals)));
        writeln!(writer, "{}", cells.join(","))?;
    }
    Ok(())
}

pub fn write_summary_csv<W: Write>(
    summary: &[SummaryRow],
    decimals: Option<usize>,
    writer: &mut W,
) -> io::Result<()> {
    writeln!(writer, "cohort_month,new_customers,spend_total,LTV_latest,CAC,LTV_to_CAC")?;
    for row in summary {
        writeln!(
            writer,
            "{},{},{},{},{},{}",
            row.cohort_month,
            row.new_customers,
            format_number(row.spend_total, decimals),
            format_metric(row.ltv_latest, decimals),
            format_metric(row.cac, decimals),
            format_metric(row.ltv_to_cac, decimals),
        )?;
    }
    Ok(())
}

/// The JSON hand-off to rendering tools.
#[derive(Debug, Clone, Serialize)]
pub struct ReportTables {
    #[serde(rename = "LTV_cumulative")]
    pub ltv_cumulative: LtvCumulativeTable,
    #[serde(rename = "Summary")]
    pub summary: Vec<SummaryRow>,
}

impl ReportTables {
    pub fn from_report(report: &CohortReport, decimals: Option<usize>) -> Self {
        let round = |m: Metric| m.map(|v| round_to(v, decimals));
        Self {
            ltv_cumulative: LtvCumulativeTable {
                offsets: report.ltv_cumulative.offsets.clone(),
                rows: report
                    .ltv_cumulative
                    .rows
                    .iter()
                    .map(|r| LtvCumulativeRow {
                        cohort_month: r.cohort_month,
                        cells:        r.cells.iter().map(|c| round(*c)).collect(),
                    })
                    .collect(),
            },
            summary: report
                .summary
                .iter()
                .map(|r| SummaryRow {
                    spend_total: round_to(r.spend_total, decimals),
                    ltv_latest:  round(r.ltv_latest),
                    cac:         round(r.cac),
                    ltv_to_cac:  round(r.ltv_to_cac),
                    ..r.clone()
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> CohortResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Rounds through the CSV formatter so both renditions agree digit for digit.
fn round_to(value: f64, decimals: Option<usize>) -> f64 {
    match decimals {
        Some(_) => format_number(value, decimals).parse().unwrap_or(value),
        None => value,
    }
}

/// Write every enabled output into `out_dir`. Returns the paths written.
pub fn export_report(
    report: &CohortReport,
    out_dir: impl AsRef<Path>,
    config: &ReportConfig,
) -> CohortResult<Vec<PathBuf>> {
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir)?;
    let decimals = config.decimal_places;
    let mut written = Vec::new();

    let ltv_path = out_dir.join(LTV_CUMULATIVE_FILE);
    let mut buf = Vec::new();
    write_ltv_cumulative_csv(&report.ltv_cumulative, decimals, &mut buf)?;
    fs::write(&ltv_path, buf)?;
    written.push(ltv_path);

    let summary_path = out_dir.join(SUMMARY_FILE);
    let mut buf = Vec::new();
    write_summary_csv(&report.summary, decimals, &mut buf)?;
    fs::write(&summary_path, buf)?;
    written.push(summary_path);

    if config.write_json {
        let json_path = out_dir.join(REPORT_JSON_FILE);
        let json = ReportTables::from_report(report, decimals).to_json()?;
        fs::write(&json_path, json)?;
        written.push(json_path);
    }

    for path in &written {
        log::debug!("wrote {}", path.display());
    }
    Ok(written)
}
