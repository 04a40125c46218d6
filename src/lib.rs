//! Live energy and carbon audit for a single electrical load.

#[cfg(feature = "api")]
pub mod api;
/// Metrics engine, running totals, and the dashboard refresh loop.
pub mod audit;
pub mod cli;
pub mod config;
pub mod error;
pub mod estimator;
pub mod io;
pub mod logging;
pub mod simulator;
pub mod store;
#[cfg(feature = "tui")]
pub mod tui;
