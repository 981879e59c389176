//! Synthetic random-walk ticker
//!
//! Perturbs cached prices on a fixed cadence so the engine can be
//! demonstrated and tested without a live trade feed. Each (instrument,
//! currency) key gets its own cancellable task; synthetic ticks go through
//! the same `on_tick` path as real ones, so whichever update arrives last
//! wins.

use super::cache::QuoteCache;
use super::types::{Currency, QuoteKey, Tick};
use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Starting price for keys that have never been ticked
const DEMO_BASE_PRICE: Decimal = dec!(100);

/// Default cadence between synthetic ticks
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(2);

/// Per-key synthetic price generator
pub struct DemoTicker {
    cache: Arc<QuoteCache>,
    interval: Duration,
    running: Mutex<HashMap<QuoteKey, CancellationToken>>,
}

impl DemoTicker {
    /// Create a ticker with the default cadence
    pub fn new(cache: Arc<QuoteCache>) -> Self {
        Self::with_interval(cache, DEFAULT_TICK_INTERVAL)
    }

    /// Create a ticker with a custom cadence
    pub fn with_interval(cache: Arc<QuoteCache>, interval: Duration) -> Self {
        Self {
            cache,
            interval,
            running: Mutex::new(HashMap::new()),
        }
    }

    /// Next synthetic price: a uniform random walk of up to +/-1%,
    /// clamped positive
    fn next_price(current: Decimal) -> Decimal {
        let mut rng = rand::rng();
        let change: f64 = rng.random_range(-0.01..0.01);
        let factor = Decimal::from_f64_retain(1.0 + change).unwrap_or(Decimal::ONE);
        (current * factor).round_dp(4).max(dec!(0.01))
    }

    /// Start ticking one key. No-op if it is already ticking.
    pub async fn start(&self, instrument_id: u32, currency: Currency) {
        let key = QuoteKey::new(instrument_id, currency);
        let mut running = self.running.lock().await;
        if running.contains_key(&key) {
            return;
        }

        let cancel = CancellationToken::new();
        running.insert(key, cancel.clone());
        drop(running);

        tracing::info!(%key, interval = ?self.interval, "starting demo ticker");
        let cache = self.cache.clone();
        let interval = self.interval;
        tokio::spawn(async move {
            Self::run_ticker(cache, key, interval, cancel).await;
        });
    }

    /// Stop ticking one key. No-op if it is not ticking.
    pub async fn stop(&self, instrument_id: u32, currency: Currency) {
        let key = QuoteKey::new(instrument_id, currency);
        let mut running = self.running.lock().await;
        if let Some(cancel) = running.remove(&key) {
            tracing::info!(%key, "stopping demo ticker");
            cancel.cancel();
        }
    }

    /// Stop every running ticker
    pub async fn stop_all(&self) {
        let mut running = self.running.lock().await;
        for (key, cancel) in running.drain() {
            tracing::debug!(%key, "stopping demo ticker");
            cancel.cancel();
        }
    }

    /// Keys currently being ticked
    pub async fn active(&self) -> Vec<QuoteKey> {
        self.running.lock().await.keys().copied().collect()
    }

    async fn run_ticker(
        cache: Arc<QuoteCache>,
        key: QuoteKey,
        interval: Duration,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first interval tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(%key, "demo ticker cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    let current = cache
                        .quote(key.instrument_id, key.currency)
                        .await
                        .map(|q| q.price)
                        .unwrap_or(DEMO_BASE_PRICE);

                    cache
                        .on_tick(Tick {
                            instrument_id: key.instrument_id,
                            currency: key.currency,
                            price: Self::next_price(current),
                            executed_at: Utc::now(),
                        })
                        .await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn demo_cache() -> Arc<QuoteCache> {
        Arc::new(QuoteCache::new(Arc::new(MemoryStore::new())))
    }

    #[test]
    fn test_next_price_stays_positive() {
        let mut price = dec!(0.02);
        for _ in 0..100 {
            price = DemoTicker::next_price(price);
            assert!(price > Decimal::ZERO);
        }
    }

    #[test]
    fn test_next_price_bounded_walk() {
        let price = DemoTicker::next_price(dec!(100));
        assert!(price >= dec!(99));
        assert!(price <= dec!(101));
    }

    #[tokio::test]
    async fn test_ticker_populates_cache() {
        let cache = demo_cache();
        let ticker = DemoTicker::with_interval(cache.clone(), Duration::from_millis(10));

        ticker.start(1, Currency::Usd).await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        ticker.stop(1, Currency::Usd).await;

        let price = cache.last_price(1, Currency::Usd).await.unwrap();
        assert!(price > Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_stop_halts_ticking() {
        let cache = demo_cache();
        let ticker = DemoTicker::with_interval(cache.clone(), Duration::from_millis(10));

        ticker.start(1, Currency::Usd).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        ticker.stop(1, Currency::Usd).await;
        assert!(ticker.active().await.is_empty());

        // Give the cancelled task time to observe cancellation
        tokio::time::sleep(Duration::from_millis(30)).await;
        let frozen = cache.quote(1, Currency::Usd).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let after = cache.quote(1, Currency::Usd).await.unwrap();
        assert_eq!(frozen.updated_at, after.updated_at);
    }

    #[tokio::test]
    async fn test_start_twice_is_noop() {
        let cache = demo_cache();
        let ticker = DemoTicker::with_interval(cache, Duration::from_millis(10));
        ticker.start(1, Currency::Usd).await;
        ticker.start(1, Currency::Usd).await;
        assert_eq!(ticker.active().await.len(), 1);
        ticker.stop_all().await;
    }

    #[tokio::test]
    async fn test_tickers_are_independently_stoppable() {
        let cache = demo_cache();
        let ticker = DemoTicker::with_interval(cache, Duration::from_millis(10));
        ticker.start(1, Currency::Usd).await;
        ticker.start(2, Currency::Usd).await;

        ticker.stop(1, Currency::Usd).await;
        let active = ticker.active().await;
        assert_eq!(active, vec![QuoteKey::new(2, Currency::Usd)]);
        ticker.stop_all().await;
    }
}
