//! File outputs: derived-row CSV and the text report.

pub mod export;
pub mod report;
