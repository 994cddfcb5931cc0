//! sbsrep-core — shared library for the sbsrep error-job reporter.
//!
//! Provides:
//! - `model` — parsed SBS API response types and run-scoped aggregates
//! - `client` — synchronous HTTP client for the SBS system service
//! - `analysis` — queue aggregation, process analysis, detail-fetch orchestration
//! - `report` — plain-text report rendering (no I/O)
//! - `fmt` — shared numeric formatting helpers
//! - `store` — optional PostgreSQL persistence for run results

pub mod analysis;
pub mod client;
pub mod fmt;
pub mod model;
pub mod report;
pub mod store;
