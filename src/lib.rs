//! Data layer behind the island energy, water and CO2 dashboards: loading
//! csv exports, cleaning, year filtering, monthly aggregation, summary
//! metrics and renewable scenarios, plus csv and png output.

pub mod aggregate;
pub mod cache;
pub mod clean;
pub mod convert;
pub mod error;
pub mod filter;
pub mod graph;
pub mod load;
pub mod metrics;
pub mod record;
pub mod scenario;
