//! Search analytics
//!
//! Every search emits one [`SearchEvent`]. Recording is fire-and-forget: sink
//! failures are logged at debug level and never reach the caller of `search`.

use serde::Serialize;
use tracing::{debug, info};

use super::filter::FilterSpec;

/// One completed search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchEvent {
    pub query: String,
    pub filters: FilterSpec,
    pub fuzzy: bool,
    pub result_count: usize,
    pub cache_hit: bool,
}

/// Destination for search events
pub trait AnalyticsSink: Send + Sync {
    fn record(&self, event: &SearchEvent) -> anyhow::Result<()>;
}

/// Default sink: a structured log line on the `promptshelf::analytics` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAnalytics;

impl AnalyticsSink for TracingAnalytics {
    fn record(&self, event: &SearchEvent) -> anyhow::Result<()> {
        let filters = serde_json::to_string(&event.filters)?;
        info!(
            target: "promptshelf::analytics",
            query = %event.query,
            filters = %filters,
            fuzzy = event.fuzzy,
            result_count = event.result_count,
            cache_hit = event.cache_hit,
            "search"
        );
        Ok(())
    }
}

/// Sink that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAnalytics;

impl AnalyticsSink for NoopAnalytics {
    fn record(&self, _event: &SearchEvent) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Record `event`, swallowing any failure
pub(crate) fn emit(sink: &dyn AnalyticsSink, event: &SearchEvent) {
    if let Err(e) = sink.record(event) {
        debug!("Analytics sink failed: {}", e);
    }
}
