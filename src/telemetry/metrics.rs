//! Prometheus metrics

use metrics::{counter, gauge};

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Trade ticks ingested into the quote cache
    TicksIngested,
    /// Snapshot records persisted
    SnapshotsWritten,
    /// Snapshots skipped (no price, or bucket already covered)
    SnapshotsSkipped,
    /// Per-instrument snapshot failures that were contained
    SnapshotErrors,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Quote keys currently held in the cache
    TrackedQuotes,
    /// Active subscription count
    ActiveSubscriptions,
}

/// Increment a counter by one
pub fn increment_counter(metric: CounterMetric) {
    let name = match metric {
        CounterMetric::TicksIngested => "quotecast_ticks_ingested_total",
        CounterMetric::SnapshotsWritten => "quotecast_snapshots_written_total",
        CounterMetric::SnapshotsSkipped => "quotecast_snapshots_skipped_total",
        CounterMetric::SnapshotErrors => "quotecast_snapshot_errors_total",
    };
    counter!(name).increment(1);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let name = match metric {
        GaugeMetric::TrackedQuotes => "quotecast_tracked_quotes",
        GaugeMetric::ActiveSubscriptions => "quotecast_active_subscriptions",
    };
    gauge!(name).set(value);
}
