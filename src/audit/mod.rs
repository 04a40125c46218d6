//! Metrics engine and dashboard refresh loop.

pub mod accumulator;
pub mod kpi;
pub mod refresh;
pub mod types;
