//! Run command implementation
//!
//! Wires the full engine together against the in-memory store: demo tickers
//! feed the quote cache, the snapshot scheduler persists bucket-aligned
//! snapshots, and quote updates are logged as they arrive.

use crate::config::Config;
use crate::quote::{DemoTicker, QuoteCache};
use crate::snapshot::SnapshotScheduler;
use crate::store::{MemoryStore, Stock};
use clap::Args;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Run for a fixed number of seconds instead of waiting for Ctrl-C
    #[arg(long)]
    pub duration_secs: Option<u64>,
}

/// Instruments seeded into the demo store
fn demo_stocks() -> Vec<Stock> {
    let currency = Default::default();
    [(1, "ACME", "Acme Corp."), (2, "GLBX", "Globex Ltd."), (3, "INIT", "Initech Inc.")]
        .into_iter()
        .map(|(instrument_id, symbol, name)| Stock {
            instrument_id,
            symbol: symbol.to_string(),
            name: name.to_string(),
            currency,
        })
        .collect()
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::with_stocks(demo_stocks()));
        let cache = Arc::new(QuoteCache::with_max_tracked(
            store.clone(),
            config.quotes.max_tracked,
        ));

        let currency = config.quotes.default_currency;
        cache.subscribe_all(currency).await?;

        let ticker = DemoTicker::with_interval(cache.clone(), config.quotes.demo_tick_interval());
        for key in cache.subscriptions().await {
            ticker.start(key.instrument_id, key.currency).await;
        }

        let scheduler = SnapshotScheduler::new(cache.clone(), store.clone(), currency);
        scheduler.start(Some(config.snapshot.interval())).await;

        let mut updates = cache.updates();
        let printer = tokio::spawn(async move {
            loop {
                match updates.recv().await {
                    Ok(quote) => {
                        tracing::info!(
                            key = %quote.key(),
                            price = %quote.price,
                            bid = %quote.bid,
                            ask = %quote.ask,
                            "quote updated"
                        );
                    }
                    Err(RecvError::Lagged(missed)) => {
                        tracing::debug!(missed, "quote update stream lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        match self.duration_secs {
            Some(secs) => {
                tokio::time::sleep(std::time::Duration::from_secs(secs)).await;
            }
            None => {
                tokio::signal::ctrl_c().await?;
            }
        }

        tracing::info!(
            snapshots = store.price_count().await,
            "shutting down demo engine"
        );
        scheduler.stop().await;
        ticker.stop_all().await;
        printer.abort();
        Ok(())
    }
}
