//! Observability metrics: query latency and mutation volume.

use std::collections::VecDeque;
use std::time::Duration;

/// Number of most recent query latencies kept for averages and percentiles.
pub const LATENCY_WINDOW: usize = 1024;

/// Collects runtime metrics across every collection of a registry.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    query_latencies_us: VecDeque<f64>,
    total_queries: u64,
    records_added: u64,
    records_upserted: u64,
    records_deleted: u64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a query with its duration. Only the last `LATENCY_WINDOW`
    /// durations are kept.
    pub fn record_query(&mut self, duration: Duration) {
        self.total_queries += 1;
        if self.query_latencies_us.len() == LATENCY_WINDOW {
            self.query_latencies_us.pop_front();
        }
        self.query_latencies_us.push_back(duration.as_micros() as f64);
    }

    pub fn record_add(&mut self, records: usize) {
        self.records_added += records as u64;
    }

    pub fn record_upsert(&mut self, records: usize) {
        self.records_upserted += records as u64;
    }

    pub fn record_delete(&mut self, records: usize) {
        self.records_deleted += records as u64;
    }

    pub fn total_queries(&self) -> u64 {
        self.total_queries
    }

    pub fn records_added(&self) -> u64 {
        self.records_added
    }

    pub fn records_upserted(&self) -> u64 {
        self.records_upserted
    }

    pub fn records_deleted(&self) -> u64 {
        self.records_deleted
    }

    /// Number of latency samples currently held.
    pub fn latency_samples(&self) -> usize {
        self.query_latencies_us.len()
    }

    /// Average query latency in microseconds over the window.
    pub fn avg_query_latency_us(&self) -> f64 {
        if self.query_latencies_us.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.query_latencies_us.iter().sum();
        sum / self.query_latencies_us.len() as f64
    }

    /// Get a percentile of query latency over the window (e.g., 50.0, 95.0, 99.0).
    pub fn percentile_query_latency_us(&self, percentile: f64) -> f64 {
        if self.query_latencies_us.is_empty() {
            return 0.0;
        }

        let mut sorted: Vec<f64> = self.query_latencies_us.iter().copied().collect();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let index = ((percentile / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        sorted[index.min(sorted.len() - 1)]
    }
}
