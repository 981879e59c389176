//! Live quote cache implementation

use super::types::{Currency, LiveQuote, QuoteKey, Tick};
use crate::store::{PriceStore, Stock, StoreError};
use crate::telemetry::{increment_counter, set_gauge, CounterMetric, GaugeMetric};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};

/// Broadcast channel capacity for quote update notifications. Slow
/// receivers lag and observe only the most recent updates.
const UPDATE_CHANNEL_CAPACITY: usize = 256;

/// Default bound on the number of tracked (instrument, currency) keys
pub const DEFAULT_MAX_TRACKED: usize = 10_000;

/// Quote cache errors
#[derive(Debug, Error)]
pub enum QuoteError {
    /// No live price is cached for this key
    #[error("no live quote for {0}")]
    NoQuote(QuoteKey),
    /// The persistence collaborator failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// In-memory cache of the current best-known price per (instrument, currency)
///
/// The quote map is the only state mutated from multiple call paths (tick
/// ingestion, demo ticker, history rebuild); a single global `RwLock`
/// linearizes those writes. Ordering policy for ticks to the same key:
/// last write by arrival order wins, regardless of the embedded trade
/// timestamp.
pub struct QuoteCache {
    store: Arc<dyn PriceStore>,
    quotes: RwLock<HashMap<QuoteKey, LiveQuote>>,
    subscriptions: RwLock<HashSet<QuoteKey>>,
    updates: broadcast::Sender<LiveQuote>,
    max_tracked: usize,
}

impl QuoteCache {
    /// Create a new cache with the default tracked-key bound
    pub fn new(store: Arc<dyn PriceStore>) -> Self {
        Self::with_max_tracked(store, DEFAULT_MAX_TRACKED)
    }

    /// Create a new cache bounded to at most `max_tracked` quote keys
    pub fn with_max_tracked(store: Arc<dyn PriceStore>, max_tracked: usize) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            store,
            quotes: RwLock::new(HashMap::new()),
            subscriptions: RwLock::new(HashSet::new()),
            updates,
            max_tracked,
        }
    }

    /// Subscribe to quote update notifications
    ///
    /// At-least-once per cached update overall, but a lagged receiver may
    /// miss intermediate updates to a key; consumers must not assume one
    /// notification per tick.
    pub fn updates(&self) -> broadcast::Receiver<LiveQuote> {
        self.updates.subscribe()
    }

    /// Mark an (instrument, currency) pair as actively tracked. Idempotent.
    pub async fn subscribe(&self, instrument_id: u32, currency: Currency) {
        let mut subs = self.subscriptions.write().await;
        if subs.insert(QuoteKey::new(instrument_id, currency)) {
            tracing::debug!(instrument_id, %currency, "subscribed");
            set_gauge(GaugeMetric::ActiveSubscriptions, subs.len() as f64);
        }
    }

    /// Remove an (instrument, currency) pair from the tracked set. Idempotent.
    pub async fn unsubscribe(&self, instrument_id: u32, currency: Currency) {
        let mut subs = self.subscriptions.write().await;
        if subs.remove(&QuoteKey::new(instrument_id, currency)) {
            tracing::debug!(instrument_id, %currency, "unsubscribed");
            set_gauge(GaugeMetric::ActiveSubscriptions, subs.len() as f64);
        }
    }

    /// Subscribe every known instrument in the given currency
    pub async fn subscribe_all(&self, currency: Currency) -> Result<(), StoreError> {
        let stocks = self.store.get_all_stocks().await?;
        let mut subs = self.subscriptions.write().await;
        for stock in &stocks {
            subs.insert(QuoteKey::new(stock.instrument_id, currency));
        }
        set_gauge(GaugeMetric::ActiveSubscriptions, subs.len() as f64);
        tracing::info!(count = stocks.len(), %currency, "subscribed all instruments");
        Ok(())
    }

    /// Unsubscribe every known instrument in the given currency
    pub async fn unsubscribe_all(&self, currency: Currency) -> Result<(), StoreError> {
        let stocks = self.store.get_all_stocks().await?;
        let mut subs = self.subscriptions.write().await;
        for stock in &stocks {
            subs.remove(&QuoteKey::new(stock.instrument_id, currency));
        }
        set_gauge(GaugeMetric::ActiveSubscriptions, subs.len() as f64);
        Ok(())
    }

    /// Snapshot of the active subscription set
    pub async fn subscriptions(&self) -> Vec<QuoteKey> {
        self.subscriptions.read().await.iter().copied().collect()
    }

    /// Ingest one trade tick, updating or creating the LiveQuote for its key
    /// and emitting a change notification
    ///
    /// Fire-and-forget: invalid ticks (price <= 0) and ticks that would grow
    /// the cache past its bound are logged and dropped. Safe to call from
    /// concurrent producers; writes to one key are linearized by the cache
    /// lock, so the last tick to acquire the lock wins.
    pub async fn on_tick(&self, tick: Tick) {
        if tick.price <= Decimal::ZERO {
            tracing::warn!(key = %tick.key(), price = %tick.price, "dropping non-positive tick");
            return;
        }

        let key = tick.key();
        let updated = {
            let mut quotes = self.quotes.write().await;
            if !quotes.contains_key(&key) && quotes.len() >= self.max_tracked {
                tracing::warn!(%key, max = self.max_tracked, "quote cache full, dropping tick");
                return;
            }
            let quote = quotes
                .entry(key)
                .and_modify(|q| q.apply(&tick))
                .or_insert_with(|| LiveQuote::from_tick(&tick));
            let updated = quote.clone();
            set_gauge(GaugeMetric::TrackedQuotes, quotes.len() as f64);
            updated
        };

        increment_counter(CounterMetric::TicksIngested);
        // No receivers is fine; notifications are best-effort fan-out
        let _ = self.updates.send(updated);
    }

    /// Rebuild the LiveQuote for one key by replaying persisted history in
    /// timestamp order, overwriting any in-memory entry
    ///
    /// Cold-start recovery path. Empty history removes the entry so stale
    /// quotes are not served. Operator-driven, so it is exempt from the
    /// tracked-key bound.
    pub async fn build_from_history(
        &self,
        instrument_id: u32,
        currency: Currency,
    ) -> Result<(), QuoteError> {
        let key = QuoteKey::new(instrument_id, currency);
        let mut history = self
            .store
            .stock_prices_in_range(instrument_id, currency, DateTime::UNIX_EPOCH, Utc::now())
            .await?;
        history.sort_by_key(|p| p.timestamp);

        let mut rebuilt: Option<LiveQuote> = None;
        for point in &history {
            let tick = Tick {
                instrument_id,
                currency,
                price: point.price,
                executed_at: point.timestamp,
            };
            match rebuilt.as_mut() {
                Some(quote) => quote.apply(&tick),
                None => rebuilt = Some(LiveQuote::from_tick(&tick)),
            }
        }

        let mut quotes = self.quotes.write().await;
        match rebuilt {
            Some(quote) => {
                tracing::info!(%key, price = %quote.price, points = history.len(), "rebuilt quote from history");
                quotes.insert(key, quote);
            }
            None => {
                tracing::info!(%key, "no history found, clearing cached quote");
                quotes.remove(&key);
            }
        }
        set_gauge(GaugeMetric::TrackedQuotes, quotes.len() as f64);
        Ok(())
    }

    /// Last cached price for one key
    ///
    /// A missing entry and a non-positive cached price both report
    /// [`QuoteError::NoQuote`]; zero is never returned as a valid price.
    pub async fn last_price(
        &self,
        instrument_id: u32,
        currency: Currency,
    ) -> Result<Decimal, QuoteError> {
        let key = QuoteKey::new(instrument_id, currency);
        let quotes = self.quotes.read().await;
        match quotes.get(&key) {
            Some(quote) if quote.price > Decimal::ZERO => Ok(quote.price),
            _ => Err(QuoteError::NoQuote(key)),
        }
    }

    /// Full cached quote for one key, if present
    pub async fn quote(&self, instrument_id: u32, currency: Currency) -> Option<LiveQuote> {
        let quotes = self.quotes.read().await;
        quotes.get(&QuoteKey::new(instrument_id, currency)).cloned()
    }

    /// Number of tracked quote keys
    pub async fn tracked_count(&self) -> usize {
        self.quotes.read().await.len()
    }

    /// Read-through lookup of one instrument's metadata. Not cached here;
    /// this cache holds live prices, not static metadata.
    pub async fn get_stock(&self, instrument_id: u32) -> Result<Stock, StoreError> {
        self.store.get_stock(instrument_id).await
    }

    /// Read-through listing of every known instrument
    pub async fn get_all_stocks(&self) -> Result<Vec<Stock>, StoreError> {
        self.store.get_all_stocks().await
    }
}
