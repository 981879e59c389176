//! Wall-clock-aligned snapshot scheduling
//!
//! Periodically persists one price snapshot per tracked (instrument,
//! currency) into fixed, epoch-aligned time buckets, so snapshots are
//! comparable across instruments and across process restarts.

pub mod bucket;
mod scheduler;

pub use scheduler::{PassSummary, SnapshotScheduler, DEFAULT_INTERVAL};
