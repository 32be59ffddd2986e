//! Fact enricher — attaches cohort month and lifecycle offset to each order.

use crate::{
    cohort::CustomerCohort,
    error::{CohortError, CohortResult},
    normalizer::Order,
    types::{Offset, YearMonth},
};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnrichedOrder {
    #[serde(flatten)]
    pub order: Order,
    pub cohort_month:        YearMonth,
    pub acquisition_channel: String,
    /// Whole calendar months between cohort month and order month.
    pub offset: Offset,
}

/// Join every order against its customer's cohort. Output keeps input order.
///
/// Both failure modes signal a defect upstream, not bad input:
/// `OrphanOrder` when a customer has no cohort, `NegativeOffset` when an
/// order lands before its own cohort month.
pub fn enrich_orders(
    orders: &[Order],
    cohorts: &[CustomerCohort],
) -> CohortResult<Vec<EnrichedOrder>> {
    let by_customer: HashMap<&str, &CustomerCohort> = cohorts
        .iter()
        .map(|c| (c.customer_id.as_str(), c))
        .collect();

    let enriched = orders
        .iter()
        .map(|order| {
            let cohort = by_customer
                .get(order.customer_id.as_str())
                .ok_or_else(|| CohortError::OrphanOrder {
                    order_id:    order.order_id.clone(),
                    customer_id: order.customer_id.clone(),
                })?;

            let months = order.order_month.months_since(cohort.cohort_month);
            let offset = Offset::try_from(months).map_err(|_| CohortError::NegativeOffset {
                order_id:    order.order_id.clone(),
                customer_id: order.customer_id.clone(),
                offset:      months,
            })?;

            Ok(EnrichedOrder {
                order:               order.clone(),
                cohort_month:        cohort.cohort_month,
                acquisition_channel: cohort.acquisition_channel.clone(),
                offset,
            })
        })
        .collect::<CohortResult<Vec<_>>>()?;

    log::debug!("enriched {} orders", enriched.len());
    Ok(enriched)
}
