//! In-memory price store
//!
//! Reference implementation of [`PriceStore`] backed by plain maps. Used by
//! the demo `run` command and by tests; a durable engine replaces it in a
//! real deployment.

use super::{PricePoint, PriceStore, Stock, StoreError};
use crate::quote::Currency;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory implementation of the persistence boundary
#[derive(Default)]
pub struct MemoryStore {
    stocks: RwLock<HashMap<u32, Stock>>,
    prices: RwLock<Vec<PricePoint>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with instrument metadata
    pub fn with_stocks(stocks: Vec<Stock>) -> Self {
        let map = stocks.into_iter().map(|s| (s.instrument_id, s)).collect();
        Self {
            stocks: RwLock::new(map),
            prices: RwLock::new(Vec::new()),
        }
    }

    /// Total number of persisted price points
    pub async fn price_count(&self) -> usize {
        self.prices.read().await.len()
    }
}

#[async_trait]
impl PriceStore for MemoryStore {
    async fn stock_prices_in_range(
        &self,
        instrument_id: u32,
        currency: Currency,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, StoreError> {
        let prices = self.prices.read().await;
        Ok(prices
            .iter()
            .filter(|p| {
                p.instrument_id == instrument_id
                    && p.currency == currency
                    && p.timestamp >= start
                    && p.timestamp < end
            })
            .cloned()
            .collect())
    }

    async fn create_stock_price(&self, point: PricePoint) -> Result<(), StoreError> {
        let mut prices = self.prices.write().await;
        prices.push(point);
        Ok(())
    }

    async fn get_all_stocks(&self) -> Result<Vec<Stock>, StoreError> {
        let stocks = self.stocks.read().await;
        let mut all: Vec<Stock> = stocks.values().cloned().collect();
        all.sort_by_key(|s| s.instrument_id);
        Ok(all)
    }

    async fn get_stock(&self, instrument_id: u32) -> Result<Stock, StoreError> {
        let stocks = self.stocks.read().await;
        stocks
            .get(&instrument_id)
            .cloned()
            .ok_or(StoreError::StockNotFound(instrument_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn stock(id: u32, symbol: &str) -> Stock {
        Stock {
            instrument_id: id,
            symbol: symbol.to_string(),
            name: format!("{symbol} Inc."),
            currency: Currency::Usd,
        }
    }

    #[tokio::test]
    async fn test_get_stock_not_found() {
        let store = MemoryStore::new();
        let err = store.get_stock(42).await.unwrap_err();
        assert!(matches!(err, StoreError::StockNotFound(42)));
    }

    #[tokio::test]
    async fn test_get_all_stocks_sorted() {
        let store = MemoryStore::with_stocks(vec![stock(3, "C"), stock(1, "A"), stock(2, "B")]);
        let all = store.get_all_stocks().await.unwrap();
        let ids: Vec<u32> = all.iter().map(|s| s.instrument_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_range_query_is_half_open() {
        let store = MemoryStore::new();
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 14, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 15, 0, 0).unwrap();

        for ts in [start, end] {
            store
                .create_stock_price(PricePoint {
                    instrument_id: 1,
                    currency: Currency::Usd,
                    price: dec!(100),
                    timestamp: ts,
                })
                .await
                .unwrap();
        }

        let in_range = store
            .stock_prices_in_range(1, Currency::Usd, start, end)
            .await
            .unwrap();
        // The record at `end` falls into the next bucket
        assert_eq!(in_range.len(), 1);
        assert_eq!(in_range[0].timestamp, start);
    }

    #[tokio::test]
    async fn test_range_query_filters_currency() {
        let store = MemoryStore::new();
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 14, 0, 0).unwrap();
        store
            .create_stock_price(PricePoint {
                instrument_id: 1,
                currency: Currency::Eur,
                price: dec!(90),
                timestamp: ts,
            })
            .await
            .unwrap();

        let usd = store
            .stock_prices_in_range(1, Currency::Usd, ts, ts + chrono::Duration::hours(1))
            .await
            .unwrap();
        assert!(usd.is_empty());
    }
}
