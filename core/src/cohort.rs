//! Cohort assigner — one acquisition cohort per customer.
//!
//! A customer's cohort month is the calendar month of their earliest
//! order. When several orders share that earliest date, the acquisition
//! channel comes from the one with the lowest order id (see
//! `types::cmp_order_ids`). The tie-break carries no business meaning;
//! it only has to be stable across runs.

use crate::{
    normalizer::Order,
    types::{cmp_order_ids, CustomerId, YearMonth},
};
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CustomerCohort {
    pub customer_id:         CustomerId,
    pub first_order_date:    NaiveDate,
    pub cohort_month:        YearMonth,
    pub acquisition_channel: String,
}

/// Assign every customer appearing in `orders` to exactly one cohort.
/// Output is sorted by customer id.
pub fn assign_cohorts(orders: &[Order]) -> Vec<CustomerCohort> {
    let mut first: BTreeMap<&str, &Order> = BTreeMap::new();

    for order in orders {
        first
            .entry(order.customer_id.as_str())
            .and_modify(|current| {
                if precedes(order, *current) {
                    *current = order;
                }
            })
            .or_insert(order);
    }

    let cohorts: Vec<CustomerCohort> = first
        .into_values()
        .map(|o| CustomerCohort {
            customer_id:         o.customer_id.clone(),
            first_order_date:    o.order_date,
            cohort_month:        o.order_month,
            acquisition_channel: o.channel.clone(),
        })
        .collect();

    log::debug!("assigned {} customers to cohorts", cohorts.len());
    cohorts
}

/// Earlier date wins; on the same date, the lower order id wins.
fn precedes(candidate: &Order, current: &Order) -> bool {
    match candidate.order_date.cmp(&current.order_date) {
        Ordering::Less    => true,
        Ordering::Greater => false,
        Ordering::Equal   => cmp_order_ids(&candidate.order_id, &current.order_id) == Ordering::Less,
    }
}
