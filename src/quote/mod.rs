//! Live quote cache and feed
//!
//! Holds the current best-known price per (instrument, currency), updated
//! from the incoming tick stream, with a broadcast notification channel for
//! consumers and a synthetic random-walk ticker for demo mode.

mod cache;
mod ticker;
mod types;

pub use cache::{QuoteCache, QuoteError};
pub use ticker::DemoTicker;
pub use types::{Currency, LiveQuote, QuoteKey, Tick};
