pub mod calendar;
pub mod config;
pub mod engine;
pub mod error;
pub mod executive_metrics;
pub mod friction_detector;
pub mod funnel_aggregator;
pub mod loader;
pub mod metric;
pub mod model;
pub mod raw;
pub mod retention_engine;
pub mod revenue_reconciliation;
pub mod snapshot_profile;
pub mod store;
pub mod types;

pub use config::AnalyticsConfig;
pub use engine::AnalyticsEngine;
pub use error::{AnalyticsError, AnalyticsResult};
pub use raw::{RawTable, TableSet};
