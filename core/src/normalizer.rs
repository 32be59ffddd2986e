//! Fact normalizer — raw rows in, typed facts out.
//!
//! RULE: This is the only stage that can reject input data.
//! Everything downstream assumes facts are well-formed.

use crate::{
    error::{CohortError, CohortResult, RecordSource},
    types::{CustomerId, Money, OrderId, YearMonth},
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::HashMap;

/// An order row as read from the source, before validation.
/// `line` is the 1-based line number in the source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawOrderRow {
    pub line:        usize,
    pub order_id:    Option<String>,
    pub order_date:  Option<String>,
    pub customer_id: Option<String>,
    pub channel:     Option<String>,
    pub revenue:     Option<String>,
}

/// A spend row as read from the source, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSpendRow {
    pub line:    usize,
    pub month:   Option<String>,
    pub channel: Option<String>,
    pub spend:   Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Order {
    pub order_id:    OrderId,
    pub order_date:  NaiveDate,
    pub order_month: YearMonth,
    pub customer_id: CustomerId,
    pub channel:     String,
    pub revenue:     Money,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SpendRecord {
    pub month: YearMonth,
    /// Informational only; spend is never attributed by channel.
    pub channel: Option<String>,
    pub spend:   Money,
}

pub fn normalize_orders(rows: &[RawOrderRow]) -> CohortResult<Vec<Order>> {
    let mut seen: HashMap<OrderId, usize> = HashMap::with_capacity(rows.len());
    let mut orders = Vec::with_capacity(rows.len());

    for row in rows {
        let order = normalize_order(row)?;
        if let Some(first_line) = seen.get(order.order_id.as_str()) {
            return Err(CohortError::malformed(
                RecordSource::Orders,
                row.line,
                format!(
                    "duplicate order_id '{}' (first seen at line {first_line})",
                    order.order_id
                ),
            ));
        }
        seen.insert(order.order_id.clone(), row.line);
        orders.push(order);
    }

    log::debug!("normalized {} orders", orders.len());
    Ok(orders)
}

pub fn normalize_spend(rows: &[RawSpendRow]) -> CohortResult<Vec<SpendRecord>> {
    let records = rows
        .iter()
        .map(normalize_spend_row)
        .collect::<CohortResult<Vec<_>>>()?;
    log::debug!("normalized {} spend records", records.len());
    Ok(records)
}

fn normalize_order(row: &RawOrderRow) -> CohortResult<Order> {
    let src = RecordSource::Orders;
    let order_id = required(src, row.line, "order_id", &row.order_id)?;
    let date_text = required(src, row.line, "order_date", &row.order_date)?;
    let customer_id = required(src, row.line, "customer_id", &row.customer_id)?;
    let channel = required(src, row.line, "channel", &row.channel)?;
    let revenue_text = required(src, row.line, "revenue", &row.revenue)?;

    let order_date = parse_order_date(date_text).ok_or_else(|| {
        CohortError::malformed(src, row.line, format!("order_date '{date_text}' is not a valid date"))
    })?;
    let revenue = parse_amount(src, row.line, "revenue", revenue_text)?;

    Ok(Order {
        order_id:    order_id.to_string(),
        order_date,
        order_month: YearMonth::of(order_date),
        customer_id: customer_id.to_string(),
        channel:     channel.to_string(),
        revenue,
    })
}

fn normalize_spend_row(row: &RawSpendRow) -> CohortResult<SpendRecord> {
    let src = RecordSource::Spend;
    let month_text = required(src, row.line, "month", &row.month)?;
    let spend_text = required(src, row.line, "spend", &row.spend)?;

    let month: YearMonth = month_text
        .parse()
        .map_err(|e: String| CohortError::malformed(src, row.line, e))?;
    let spend = parse_amount(src, row.line, "spend", spend_text)?;

    Ok(SpendRecord {
        month,
        channel: row
            .channel
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string),
        spend,
    })
}

fn required<'a>(
    src: RecordSource,
    line: usize,
    field: &str,
    value: &'a Option<String>,
) -> CohortResult<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CohortError::malformed(src, line, format!("missing required field '{field}'")))
}

/// Accepts a bare date or a timestamp; the time part is dropped.
fn parse_order_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn parse_amount(src: RecordSource, line: usize, field: &str, text: &str) -> CohortResult<Money> {
    let value: f64 = text.parse().map_err(|_| {
        CohortError::malformed(src, line, format!("{field} '{text}' is not a number"))
    })?;
    if !value.is_finite() {
        return Err(CohortError::malformed(
            src,
            line,
            format!("{field} '{text}' is not a finite number"),
        ));
    }
    if value < 0.0 {
        return Err(CohortError::malformed(
            src,
            line,
            format!("{field} {value} is negative"),
        ));
    }
    // Normalise -0.0 so exported tables never show a signed zero.
    Ok(if value == 0.0 { 0.0 } else { value })
}
