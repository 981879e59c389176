//! Persistence collaborator boundary
//!
//! The durable storage engine (stocks, prices, transactions) lives outside
//! this crate. This module defines the trait it is consumed through, the
//! record types that cross the boundary, and an in-memory implementation
//! used by the demo binary and tests.

mod memory;

pub use memory::MemoryStore;

use crate::quote::Currency;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Instrument metadata as held by the persistence engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stock {
    /// Unique instrument identifier
    pub instrument_id: u32,
    /// Ticker symbol (e.g., "ACME")
    pub symbol: String,
    /// Company name
    pub name: String,
    /// Listing currency
    pub currency: Currency,
}

/// A persisted price snapshot, tagged with its bucket start time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    /// Instrument identifier
    pub instrument_id: u32,
    /// Quote currency
    pub currency: Currency,
    /// Snapshot price
    pub price: Decimal,
    /// Start of the time bucket this snapshot belongs to
    pub timestamp: DateTime<Utc>,
}

/// Persistence errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Requested instrument does not exist
    #[error("stock {0} not found")]
    StockNotFound(u32),
    /// Transient storage failure
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Trait for persistence engine implementations
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Get persisted snapshots for one (instrument, currency) within
    /// the half-open range `[start, end)`
    async fn stock_prices_in_range(
        &self,
        instrument_id: u32,
        currency: Currency,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, StoreError>;

    /// Persist one price snapshot
    async fn create_stock_price(&self, point: PricePoint) -> Result<(), StoreError>;

    /// List every known instrument
    async fn get_all_stocks(&self) -> Result<Vec<Stock>, StoreError>;

    /// Get one instrument's metadata
    async fn get_stock(&self, instrument_id: u32) -> Result<Stock, StoreError>;
}
