//! Statistics and metrics

pub mod metrics;

pub(crate) use metrics::UpstreamCounters;
pub use metrics::{HubStats, UpstreamStats};
