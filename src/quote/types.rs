//! Quote and tick types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fractional half-spread applied to the last price for the synthetic
/// bid/ask display fields
const DISPLAY_SPREAD: Decimal = dec!(0.001);

/// Quote currency
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, PartialOrd, Ord,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Jpy,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
        };
        f.write_str(code)
    }
}

/// Composite cache key: one instrument quoted in one currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteKey {
    /// Instrument identifier
    pub instrument_id: u32,
    /// Quote currency
    pub currency: Currency,
}

impl QuoteKey {
    /// Create a new quote key
    pub fn new(instrument_id: u32, currency: Currency) -> Self {
        Self {
            instrument_id,
            currency,
        }
    }
}

impl fmt::Display for QuoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.instrument_id, self.currency)
    }
}

/// A single executed trade event from the upstream execution component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tick {
    /// Instrument identifier
    pub instrument_id: u32,
    /// Quote currency
    pub currency: Currency,
    /// Traded price
    pub price: Decimal,
    /// Trade timestamp
    pub executed_at: DateTime<Utc>,
}

impl Tick {
    /// Cache key for this tick
    pub fn key(&self) -> QuoteKey {
        QuoteKey::new(self.instrument_id, self.currency)
    }
}

/// Current in-memory market state for one (instrument, currency) pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveQuote {
    /// Instrument identifier
    pub instrument_id: u32,
    /// Quote currency
    pub currency: Currency,
    /// Last traded price
    pub price: Decimal,
    /// Synthetic display bid (price minus the display spread)
    pub bid: Decimal,
    /// Synthetic display ask (price plus the display spread)
    pub ask: Decimal,
    /// Timestamp of the trade that produced this quote
    pub updated_at: DateTime<Utc>,
}

impl LiveQuote {
    /// Build a fresh quote from a tick
    pub fn from_tick(tick: &Tick) -> Self {
        let mut quote = Self {
            instrument_id: tick.instrument_id,
            currency: tick.currency,
            price: Decimal::ZERO,
            bid: Decimal::ZERO,
            ask: Decimal::ZERO,
            updated_at: tick.executed_at,
        };
        quote.apply(tick);
        quote
    }

    /// Apply a tick to an existing quote, replacing price and timestamp
    /// and re-deriving the display spread
    pub fn apply(&mut self, tick: &Tick) {
        self.price = tick.price;
        self.bid = (tick.price * (Decimal::ONE - DISPLAY_SPREAD)).round_dp(4);
        self.ask = (tick.price * (Decimal::ONE + DISPLAY_SPREAD)).round_dp(4);
        self.updated_at = tick.executed_at;
    }

    /// Cache key for this quote
    pub fn key(&self) -> QuoteKey {
        QuoteKey::new(self.instrument_id, self.currency)
    }
}
