//! Cohort unit economics: cumulative LTV, CAC and LTV:CAC per
//! acquisition cohort, computed from order and marketing spend facts.

pub mod aggregate;
pub mod cac;
pub mod cohort;
pub mod config;
pub mod engine;
pub mod enrich;
pub mod error;
pub mod export;
pub mod ltv;
pub mod normalizer;
pub mod report;
pub mod sample;
pub mod source;
pub mod store;
pub mod summary;
pub mod types;
