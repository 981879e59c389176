//! Snapshot scheduler implementation

use super::bucket;
use crate::quote::{Currency, QuoteCache, QuoteError, QuoteKey};
use crate::store::{PricePoint, PriceStore};
use crate::telemetry::{increment_counter, CounterMetric};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default snapshot cadence
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3600);

/// Outcome counts for one snapshot pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassSummary {
    /// Snapshots persisted this pass
    pub written: usize,
    /// Instruments skipped (no live price, or bucket already snapshotted)
    pub skipped: usize,
    /// Instruments whose processing failed and was contained
    pub failed: usize,
}

struct SchedulerInner {
    interval: Duration,
    cancel: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

/// Recurring, wall-clock-aligned snapshot job
///
/// `start` waits out the delay to the next bucket boundary, runs one pass,
/// then runs one pass per interval. `start` and `stop` are serialized by an
/// internal mutex so the cancellation token and task handle never get out
/// of step.
pub struct SnapshotScheduler {
    cache: Arc<QuoteCache>,
    store: Arc<dyn PriceStore>,
    default_currency: Currency,
    inner: Mutex<SchedulerInner>,
}

impl SnapshotScheduler {
    /// Create a stopped scheduler with the default 1-hour interval
    pub fn new(
        cache: Arc<QuoteCache>,
        store: Arc<dyn PriceStore>,
        default_currency: Currency,
    ) -> Self {
        Self {
            cache,
            store,
            default_currency,
            inner: Mutex::new(SchedulerInner {
                interval: DEFAULT_INTERVAL,
                cancel: None,
                task: None,
            }),
        }
    }

    /// Start the recurring snapshot job
    ///
    /// No-op when already running with the same effective interval. A
    /// non-positive interval is ignored with a warning and the last-known-good
    /// interval is kept. Any prior run is halted before the new one starts.
    pub async fn start(&self, interval: Option<Duration>) {
        let mut inner = self.inner.lock().await;

        let effective = match interval {
            Some(d) if d > Duration::ZERO => d,
            Some(d) => {
                tracing::warn!(
                    requested = ?d,
                    keeping = ?inner.interval,
                    "ignoring non-positive snapshot interval"
                );
                inner.interval
            }
            None => inner.interval,
        };

        if inner.cancel.is_some() && effective == inner.interval {
            tracing::debug!(interval = ?effective, "snapshot scheduler already running");
            return;
        }

        Self::halt(&mut inner);
        inner.interval = effective;

        let cancel = CancellationToken::new();
        inner.cancel = Some(cancel.clone());

        let cache = self.cache.clone();
        let store = self.store.clone();
        let currency = self.default_currency;
        inner.task = Some(tokio::spawn(async move {
            Self::run_loop(cache, store, currency, effective, cancel).await;
        }));

        tracing::info!(interval = ?effective, "snapshot scheduler started");
    }

    /// Stop the scheduler
    ///
    /// Cancels a pending boundary wait and prevents further timer fires; an
    /// in-flight pass runs to completion. Idempotent, and safe to call
    /// before any `start`.
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        if Self::halt(&mut inner) {
            tracing::info!("snapshot scheduler stopped");
        }
    }

    /// Whether the recurring job is currently armed
    pub async fn is_running(&self) -> bool {
        self.inner.lock().await.cancel.is_some()
    }

    /// Currently configured interval
    pub async fn interval(&self) -> Duration {
        self.inner.lock().await.interval
    }

    /// Run one snapshot pass immediately, outside the recurring cadence
    pub async fn run_pass_now(&self) -> anyhow::Result<PassSummary> {
        let interval = self.interval().await;
        Self::run_pass(
            &self.cache,
            self.store.as_ref(),
            self.default_currency,
            interval,
        )
        .await
    }

    /// Stop without awaiting the state lock; used from `Drop`
    fn stop_sync(&self) {
        if let Ok(mut inner) = self.inner.try_lock() {
            Self::halt(&mut inner);
        }
    }

    fn halt(inner: &mut SchedulerInner) -> bool {
        let was_running = inner.cancel.is_some();
        if let Some(cancel) = inner.cancel.take() {
            cancel.cancel();
        }
        // Detach rather than join: an in-flight pass may finish on its own
        inner.task.take();
        was_running
    }

    async fn run_loop(
        cache: Arc<QuoteCache>,
        store: Arc<dyn PriceStore>,
        default_currency: Currency,
        interval: Duration,
        cancel: CancellationToken,
    ) {
        let delay = bucket::delay_until_boundary(Utc::now(), interval);
        tracing::info!(?delay, "waiting for next snapshot bucket boundary");

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("initial snapshot wait cancelled");
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }

        Self::execute_pass(&cache, store.as_ref(), default_currency, interval).await;

        let mut ticker =
            tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("snapshot scheduler cancelled");
                    return;
                }
                _ = ticker.tick() => {
                    Self::execute_pass(&cache, store.as_ref(), default_currency, interval).await;
                }
            }
        }
    }

    /// Run one pass and log its outcome. A pass that cannot even enumerate
    /// instruments is logged and dropped; the scheduler stays running and
    /// tries again next tick.
    async fn execute_pass(
        cache: &QuoteCache,
        store: &dyn PriceStore,
        default_currency: Currency,
        interval: Duration,
    ) {
        match Self::run_pass(cache, store, default_currency, interval).await {
            Ok(summary) => {
                tracing::info!(
                    written = summary.written,
                    skipped = summary.skipped,
                    failed = summary.failed,
                    "snapshot pass complete"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "snapshot pass aborted");
            }
        }
    }

    /// One snapshot pass over the tracked instrument set
    ///
    /// Uses active subscriptions when there are any, otherwise every known
    /// instrument paired with the default currency. The bucket is computed
    /// from wall-clock time at execution, so a delayed pass still snapshots
    /// into the bucket for "now". Per-instrument failures are contained;
    /// only a failure listing the fallback instrument set aborts the pass.
    async fn run_pass(
        cache: &QuoteCache,
        store: &dyn PriceStore,
        default_currency: Currency,
        interval: Duration,
    ) -> anyhow::Result<PassSummary> {
        let subscriptions = cache.subscriptions().await;
        let keys: Vec<QuoteKey> = if subscriptions.is_empty() {
            store
                .get_all_stocks()
                .await?
                .into_iter()
                .map(|s| QuoteKey::new(s.instrument_id, default_currency))
                .collect()
        } else {
            subscriptions
        };

        let now = Utc::now();
        let bucket_start = bucket::floor(now, interval);
        let bucket_end = bucket_start + chrono::Duration::from_std(interval)?;

        let mut summary = PassSummary::default();
        for key in keys {
            match Self::snapshot_one(cache, store, key, bucket_start, bucket_end).await {
                Ok(true) => {
                    summary.written += 1;
                    increment_counter(CounterMetric::SnapshotsWritten);
                }
                Ok(false) => {
                    summary.skipped += 1;
                    increment_counter(CounterMetric::SnapshotsSkipped);
                }
                Err(e) => {
                    summary.failed += 1;
                    increment_counter(CounterMetric::SnapshotErrors);
                    tracing::warn!(%key, error = %e, "snapshot failed, continuing with remaining instruments");
                }
            }
        }
        Ok(summary)
    }

    /// Snapshot one instrument: returns Ok(true) when a record was written,
    /// Ok(false) when skipped (no price, or bucket already covered)
    async fn snapshot_one(
        cache: &QuoteCache,
        store: &dyn PriceStore,
        key: QuoteKey,
        bucket_start: DateTime<Utc>,
        bucket_end: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let price = match cache.last_price(key.instrument_id, key.currency).await {
            Ok(price) => price,
            Err(QuoteError::NoQuote(_)) => {
                tracing::debug!(%key, "no live price, skipping snapshot");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        let existing = store
            .stock_prices_in_range(key.instrument_id, key.currency, bucket_start, bucket_end)
            .await?;
        if !existing.is_empty() {
            tracing::debug!(%key, %bucket_start, "bucket already snapshotted, skipping");
            return Ok(false);
        }

        // Best-effort duplicate avoidance: not atomic against a concurrent
        // external writer between the check and this write
        store
            .create_stock_price(PricePoint {
                instrument_id: key.instrument_id,
                currency: key.currency,
                price,
                timestamp: bucket_start,
            })
            .await?;

        tracing::info!(%key, %price, %bucket_start, "snapshot persisted");
        Ok(true)
    }
}

impl Drop for SnapshotScheduler {
    /// Teardown is equivalent to `stop`: cancel the pending wait so the
    /// background task does not outlive the scheduler
    fn drop(&mut self) {
        self.stop_sync();
    }
}
