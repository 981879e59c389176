//! quotecast: Real-time market-data engine for a simulated exchange
//!
//! This library provides the core components for:
//! - Live quote cache keyed by (instrument, currency)
//! - Trade-tick ingestion with change notifications
//! - Synthetic random-walk ticker for demo mode
//! - Wall-clock-aligned snapshot scheduling
//! - Persistence collaborator boundary (`PriceStore`)
//! - Observability stack (tracing + Prometheus metrics)

pub mod cli;
pub mod config;
pub mod quote;
pub mod snapshot;
pub mod store;
pub mod telemetry;
