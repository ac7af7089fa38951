//! Per-order price history: a time-bounded rolling sequence of samples.
//!
//! Each order keeps its samples in insertion order. The sequence is
//! bounded by the configured time window only; every append compacts the
//! existing samples in place, dropping those older than the cutoff.

use rustc_hash::FxHashMap;

use crate::types::{OrderId, Price, Timestamp};

/// One canonical price observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PriceSample {
    pub price: Price,
    pub timestamp: Timestamp,
}

/// Store of per-order price histories.
#[derive(Clone, Debug, Default)]
pub struct PriceHistoryStore {
    histories: FxHashMap<OrderId, Vec<PriceSample>>,
}

impl PriceHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset an order's history to exactly one sample.
    ///
    /// Used by `configure`, which is a full replacement rather than an
    /// incremental change.
    pub fn seed(&mut self, order_id: OrderId, sample: PriceSample) {
        let history = self.histories.entry(order_id).or_default();
        history.clear();
        history.push(sample);
    }

    /// Prune samples older than `now - window_secs`, then append.
    pub fn append(
        &mut self,
        order_id: OrderId,
        sample: PriceSample,
        window_secs: u64,
        now: Timestamp,
    ) {
        let cutoff = now.saturating_sub(window_secs);
        let history = self.histories.entry(order_id).or_default();
        history.retain(|s| s.timestamp >= cutoff);
        history.push(sample);
    }

    /// The live (already-pruned) sequence for an order.
    pub fn samples(&self, order_id: OrderId) -> &[PriceSample] {
        self.histories
            .get(&order_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Drop an order's history entirely.
    pub fn remove(&mut self, order_id: OrderId) {
        self.histories.remove(&order_id);
    }

    /// Replace an order's history wholesale. Used to roll back an append
    /// when a later validation step in the same operation fails.
    pub(crate) fn restore(&mut self, order_id: OrderId, samples: Vec<PriceSample>) {
        self.histories.insert(order_id, samples);
    }
}
