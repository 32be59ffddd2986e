//! Deterministic sample datasets.
//!
//! RULE: Nothing here may call a platform RNG.
//! All randomness flows through a SampleRng seeded from the caller's
//! seed, so the same seed always yields the same rows.
//!
//! Rows are emitted as raw strings so a sample exercises the whole
//! pipeline, normalizer included.

use crate::{
    normalizer::{RawOrderRow, RawSpendRow},
    types::{Money, YearMonth},
};
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;
use std::io::{self, Write};

pub const CHANNELS: [&str; 4] = ["paid_search", "paid_social", "organic", "referral"];

/// A deterministic RNG stream for one sample.
pub struct SampleRng {
    inner: Pcg64Mcg,
}

impl SampleRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15),
        }
    }

    /// Uniform draw in [0.0, 1.0), used for spend jitter.
    pub fn unit(&mut self) -> f64 {
        (self.inner.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Index into a list of `len` choices (cohort month, channel, day).
    pub fn pick(&mut self, len: usize) -> usize {
        (self.inner.next_u64() % len.max(1) as u64) as usize
    }

    /// Whether the customer comes back for another order.
    pub fn repeats(&mut self, probability: f64) -> bool {
        self.unit() < probability
    }

    /// Heavy-tailed basket value, never below `floor`, rounded to cents.
    pub fn order_value(&mut self, floor: Money, tail: f64) -> Money {
        let u = self.unit().max(1e-10);
        (floor * u.powf(-1.0 / tail) * 100.0).round() / 100.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleConfig {
    pub seed:      u64,
    pub customers: usize,
    pub months:    u32,
    pub start:     YearMonth,
    /// Chance of another repeat order after each order.
    pub repeat_probability: f64,
    pub monthly_spend_per_channel: f64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            seed:      42,
            customers: 200,
            months:    12,
            start:     YearMonth { year: 2023, month: 1 },
            repeat_probability: 0.55,
            monthly_spend_per_channel: 1_500.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SampleData {
    pub orders: Vec<RawOrderRow>,
    pub spend:  Vec<RawSpendRow>,
}

impl SampleData {
    pub fn generate(config: &SampleConfig) -> Self {
        let mut rng = SampleRng::new(config.seed);
        let months = config.months.max(1);
        let mut orders = Vec::new();
        let mut order_seq = 1u64;

        for customer in 1..=config.customers {
            let customer_id = format!("C{customer:05}");
            let cohort = add_months(config.start, rng.pick(months as usize) as u32);
            let channel = CHANNELS[rng.pick(CHANNELS.len())];

            let mut month = cohort;
            loop {
                let day = 1 + rng.pick(28) as u32;
                let revenue = rng.order_value(20.0, 2.2);
                orders.push(RawOrderRow {
                    line:        orders.len() + 2,
                    order_id:    Some(order_seq.to_string()),
                    order_date:  Some(format!("{month}-{day:02}")),
                    customer_id: Some(customer_id.clone()),
                    channel:     Some(channel.to_string()),
                    revenue:     Some(format!("{revenue:.2}")),
                });
                order_seq += 1;

                if !rng.repeats(config.repeat_probability) {
                    break;
                }
                month = add_months(month, rng.pick(3) as u32);
                if month.months_since(config.start) >= months as i64 {
                    break;
                }
            }
        }

        let mut spend = Vec::new();
        for m in 0..months {
            let month = add_months(config.start, m);
            for channel in CHANNELS {
                if channel == "organic" {
                    continue;
                }
                let jitter = 0.75 + rng.unit() * 0.5;
                let amount = (config.monthly_spend_per_channel * jitter * 100.0).round() / 100.0;
                spend.push(RawSpendRow {
                    line:    spend.len() + 2,
                    month:   Some(month.to_string()),
                    channel: Some(channel.to_string()),
                    spend:   Some(format!("{amount:.2}")),
                });
            }
        }

        Self { orders, spend }
    }

    pub fn write_orders_csv<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "order_id,order_date,customer_id,channel,revenue")?;
        for o in &self.orders {
            writeln!(
                writer,
                "{},{},{},{},{}",
                o.order_id.as_deref().unwrap_or_default(),
                o.order_date.as_deref().unwrap_or_default(),
                o.customer_id.as_deref().unwrap_or_default(),
                o.channel.as_deref().unwrap_or_default(),
                o.revenue.as_deref().unwrap_or_default(),
            )?;
        }
        Ok(())
    }

    pub fn write_spend_csv<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "month,channel,spend")?;
        for s in &self.spend {
            writeln!(
                writer,
                "{},{},{}",
                s.month.as_deref().unwrap_or_default(),
                s.channel.as_deref().unwrap_or_default(),
                s.spend.as_deref().unwrap_or_default(),
            )?;
        }
        Ok(())
    }
}

fn add_months(ym: YearMonth, n: u32) -> YearMonth {
    let ordinal = ym.ordinal() + n as i64;
    YearMonth {
        year:  ordinal.div_euclid(12) as i32,
        month: ordinal.rem_euclid(12) as u32 + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_months_wraps_years() {
        let nov = YearMonth { year: 2022, month: 11 };
        assert_eq!(add_months(nov, 3), YearMonth { year: 2023, month: 2 });
        assert_eq!(add_months(nov, 0), nov);
    }

    #[test]
    fn order_values_respect_the_floor() {
        let mut rng = SampleRng::new(7);
        for _ in 0..500 {
            let v = rng.order_value(20.0, 2.2);
            assert!(v >= 20.0, "value {v} below floor");
            assert_eq!(v, (v * 100.0).round() / 100.0);
        }
        assert_eq!(rng.pick(0), 0);
    }

    #[test]
    fn same_seed_same_sample() {
        let config = SampleConfig { customers: 25, ..SampleConfig::default() };
        let a = SampleData::generate(&config);
        let b = SampleData::generate(&config);
        assert_eq!(a.orders, b.orders);
        assert_eq!(a.spend, b.spend);
    }
}
