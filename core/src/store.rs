//! SQLite data mart.
//!
//! RULE: Only store.rs talks to the database.
//! The engine never reads from the mart; it is an output boundary only.

use crate::{
    error::CohortResult,
    ltv::CumulativeLtvPoint,
    report::CohortReport,
    summary::SummaryRow,
    types::{Offset, YearMonth},
};
use rusqlite::{
    params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
    Connection,
};
use std::collections::HashMap;

/// Tables that can be counted through `MartStore::row_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MartTable {
    FactOrders,
    FactSpend,
    FirstOrders,
    Fct,
    CohortRevenue,
    AcquisitionCounts,
    Cac,
    LtvCumulative,
    Summary,
}

impl MartTable {
    fn name(&self) -> &'static str {
        match self {
            Self::FactOrders        => "fact_orders",
            Self::FactSpend         => "fact_spend",
            Self::FirstOrders       => "first_orders",
            Self::Fct               => "fct",
            Self::CohortRevenue     => "cohort_revenue",
            Self::AcquisitionCounts => "acquisition_counts",
            Self::Cac               => "cac",
            Self::LtvCumulative     => "ltv_cumulative",
            Self::Summary           => "summary",
        }
    }
}

impl ToSql for YearMonth {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for YearMonth {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

pub struct MartStore {
    conn: Connection,
}

impl MartStore {
    /// Open (or create) the mart at `path`.
    pub fn open(path: &str) -> CohortResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> CohortResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> CohortResult<()> {
        self.conn
            .execute_batch(include_str!("../migrations/001_mart.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(
        &self,
        run_id: &str,
        version: &str,
        orders_src: &str,
        spend_src: &str,
    ) -> CohortResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, version, orders_src, spend_src) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, version, orders_src, spend_src],
        )?;
        Ok(())
    }

    // ── Report ─────────────────────────────────────────────────

    /// Persist every table of a report in one transaction.
    pub fn write_report(&self, run_id: &str, report: &CohortReport) -> CohortResult<()> {
        let tx = self.conn.unchecked_transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO fact_orders
                    (run_id, order_id, order_date, order_month, customer_id, channel, revenue)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for o in &report.orders {
                stmt.execute(params![
                    run_id,
                    o.order_id,
                    o.order_date.to_string(),
                    o.order_month,
                    o.customer_id,
                    o.channel,
                    o.revenue,
                ])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO fact_spend (run_id, seq, month, channel, spend)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (seq, s) in report.spend.iter().enumerate() {
                stmt.execute(params![run_id, seq as i64, s.month, s.channel, s.spend])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO first_orders
                    (run_id, customer_id, first_order_date, cohort_month, acquisition_channel)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for c in &report.cohorts {
                stmt.execute(params![
                    run_id,
                    c.customer_id,
                    c.first_order_date.to_string(),
                    c.cohort_month,
                    c.acquisition_channel,
                ])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO fct
                    (run_id, order_id, customer_id, cohort_month, acquisition_channel,
                     months_since_cohort, revenue)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for e in &report.enriched {
                stmt.execute(params![
                    run_id,
                    e.order.order_id,
                    e.order.customer_id,
                    e.cohort_month,
                    e.acquisition_channel,
                    e.offset,
                    e.order.revenue,
                ])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO cohort_revenue (run_id, cohort_month, months_since_cohort, revenue)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for p in &report.revenue {
                stmt.execute(params![run_id, p.cohort_month, p.offset, p.revenue])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO acquisition_counts (run_id, cohort_month, new_customers)
                 VALUES (?1, ?2, ?3)",
            )?;
            for a in &report.acquisitions {
                stmt.execute(params![run_id, a.cohort_month, a.new_customers as i64])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO cac (run_id, cohort_month, spend_total, new_customers, cac)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for c in &report.cac {
                stmt.execute(params![
                    run_id,
                    c.cohort_month,
                    c.spend_total,
                    c.new_customers as i64,
                    c.cac,
                ])?;
            }

            let per_period: HashMap<(YearMonth, Offset), Option<f64>> = report
                .ltv
                .iter()
                .map(|p| ((p.cohort_month, p.offset), p.ltv))
                .collect();
            let mut stmt = tx.prepare(
                "INSERT INTO ltv_cumulative
                    (run_id, cohort_month, months_since_cohort, ltv, cumulative_ltv)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for p in &report.cumulative {
                let ltv = per_period.get(&(p.cohort_month, p.offset)).copied().flatten();
                stmt.execute(params![run_id, p.cohort_month, p.offset, ltv, p.cumulative_ltv])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO summary
                    (run_id, cohort_month, new_customers, spend_total, ltv_latest, cac, ltv_to_cac)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for r in &report.summary {
                stmt.execute(params![
                    run_id,
                    r.cohort_month,
                    r.new_customers as i64,
                    r.spend_total,
                    r.ltv_latest,
                    r.cac,
                    r.ltv_to_cac,
                ])?;
            }

            tx.execute(
                "UPDATE run SET order_count = ?1, spend_count = ?2 WHERE run_id = ?3",
                params![report.orders.len() as i64, report.spend.len() as i64, run_id],
            )?;
        }

        tx.commit()?;
        log::debug!("mart: wrote run {run_id}");
        Ok(())
    }

    // ── Read-back ──────────────────────────────────────────────

    pub fn row_count(&self, run_id: &str, table: MartTable) -> CohortResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE run_id = ?1", table.name());
        let count = self.conn.query_row(&sql, params![run_id], |row| row.get(0))?;
        Ok(count)
    }

    pub fn summary_rows(&self, run_id: &str) -> CohortResult<Vec<SummaryRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT cohort_month, new_customers, spend_total, ltv_latest, cac, ltv_to_cac
             FROM summary WHERE run_id = ?1
             ORDER BY cohort_month ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok(SummaryRow {
                    cohort_month:  row.get(0)?,
                    new_customers: row.get::<_, i64>(1)? as u64,
                    spend_total:   row.get(2)?,
                    ltv_latest:    row.get(3)?,
                    cac:           row.get(4)?,
                    ltv_to_cac:    row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn cumulative_points(&self, run_id: &str) -> CohortResult<Vec<CumulativeLtvPoint>> {
        let mut stmt = self.conn.prepare(
            "SELECT cohort_month, months_since_cohort, cumulative_ltv
             FROM ltv_cumulative WHERE run_id = ?1
             ORDER BY cohort_month ASC, months_since_cohort ASC",
        )?;
        let points = stmt
            .query_map(params![run_id], |row| {
                Ok(CumulativeLtvPoint {
                    cohort_month:   row.get(0)?,
                    offset:         row.get(1)?,
                    cumulative_ltv: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(points)
    }

    /// Acquisition channel per customer, as recorded for a run.
    pub fn acquisition_channels(&self, run_id: &str) -> CohortResult<Vec<(String, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT customer_id, acquisition_channel FROM first_orders
             WHERE run_id = ?1 ORDER BY customer_id ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
