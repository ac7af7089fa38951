//! Observability events recorded by the engine.
//!
//! Events are an audit trail of engine *outputs*, captured behind the
//! `event-log` feature (on by default). Unlike a replay log they cannot
//! reconstruct state on their own, because engine inputs include
//! external oracle reads; they exist so an order coordinator, keeper, or
//! monitoring layer can observe exactly what the engine decided and why.

use crate::order::OrderType;
use crate::types::{AccountId, Bps, FeedId, OrderId, Price, Timestamp};

/// One recorded engine decision.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EngineEvent {
    /// An order was configured (or wholesale re-configured).
    ConfigUpdated {
        order_id: OrderId,
        feed: FeedId,
        initial_stop_price: Price,
        trailing_distance_bps: Bps,
        order_type: OrderType,
        twap_window_secs: u64,
        max_deviation_bps: Bps,
    },
    /// A successful update recomputed the stop price.
    StopPriceUpdated {
        order_id: OrderId,
        old_stop_price: Price,
        new_stop_price: Price,
        current_price: Price,
        twap: Price,
        caller: AccountId,
    },
    /// A settlement plan was produced for a triggered order.
    Triggered {
        order_id: OrderId,
        counterparty: AccountId,
        settle_amount: u128,
        stop_price: Price,
        twap: Price,
    },
    /// A validated price sample entered the order's history.
    HistorySampleAppended {
        order_id: OrderId,
        price: Price,
        timestamp: Timestamp,
    },
}

impl EngineEvent {
    /// The order this event concerns.
    pub fn order_id(&self) -> OrderId {
        match self {
            EngineEvent::ConfigUpdated { order_id, .. }
            | EngineEvent::StopPriceUpdated { order_id, .. }
            | EngineEvent::Triggered { order_id, .. }
            | EngineEvent::HistorySampleAppended { order_id, .. } => *order_id,
        }
    }
}
