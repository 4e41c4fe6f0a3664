//! D402: orders vs. sales/returns reconciliation.
//!
//! Pipeline: raw rows -> [`normalizer`] -> [`range_filter`] -> {[`reconciliation`],
//! [`weekday_trend`], [`kpi_summary`]}, wired together by [`service::compute_kpis`].

pub mod error;
pub mod indicators;
pub mod kpi_summary;
pub mod metrics;
pub mod normalizer;
pub mod range_filter;
pub mod reconciliation;
pub mod records;
pub mod schema;
pub mod service;
pub mod weekday_trend;

pub use error::AnalysisError;
