//! # trailstop
//!
//! A deterministic trailing-stop order engine with oracle validation and
//! manipulation-resistant TWAP pricing.
//!
//! ## Features
//!
//! - **Trailing stops**: SELL stops trail below a rising market, BUY
//!   stops trail above a falling one; each update recomputes the stop
//!   from the latest validated price
//! - **Oracle validation**: staleness heartbeats, positivity, and
//!   decimal rescaling before a price touches any order
//! - **Robust TWAP**: median-anchored outlier filtering over a rolling
//!   per-order price history, with a volatility-adaptive window
//! - **Decimal-safe settlement**: transfer amounts computed in canonical
//!   18-decimal fixed point with full-precision multiply-then-divide
//! - **Deterministic**: the engine owns no clock and reads no
//!   environment; identical inputs always produce identical outputs
//!
//! ## Quick Start
//!
//! ```
//! use trailstop::{
//!     AccountId, FeedId, GlobalConfig, OrderId, OrderParams, OrderType, Price,
//!     TableFeed, TrailingStopEngine,
//! };
//!
//! let operator = AccountId(10);
//! let keeper = AccountId(30);
//! let global = GlobalConfig::new(operator);
//!
//! let mut feed = TableFeed::new();
//! feed.set(FeedId(1), 2000_0000_0000, 8, 1_000); // $2000 at 8 decimals
//!
//! let mut engine = TrailingStopEngine::new();
//! let params = OrderParams {
//!     feed: FeedId(1),
//!     initial_stop_price: Price::from_units(1960),
//!     trailing_distance_bps: 200,
//!     order_type: OrderType::Sell,
//!     update_frequency_secs: 60,
//!     max_slippage_bps: 100,
//!     max_deviation_bps: 500,
//!     twap_window_secs: 600,
//!     maker_decimals: 18,
//!     taker_decimals: 6,
//!     maker: AccountId(20),
//!     keeper,
//! };
//! engine.configure(OrderId(1), params, &feed, &global, 1_000).unwrap();
//!
//! // Market rises to $2100; the keeper trails the stop up behind it.
//! feed.set(FeedId(1), 2100_0000_0000, 8, 1_061);
//! let update = engine.update(OrderId(1), keeper, &feed, &global, 1_061).unwrap();
//! assert_eq!(update.new_stop_price, Price::from_units(2058)); // 2100 - 2%
//!
//! // $2100 is comfortably above the stop: not triggered.
//! let view = engine.is_triggered(OrderId(1), &feed, &global, 1_061).unwrap();
//! assert!(!view.triggered);
//! ```
//!
//! ## Price Representation
//!
//! Prices are [`u128`] in 18-decimal fixed point, whatever the native
//! precision of the feed or the settled assets:
//!
//! ```
//! use trailstop::Price;
//!
//! let price = Price::from_units(2000);
//! assert_eq!(price.0, 2000 * Price::SCALE);
//! assert_eq!(format!("{}", Price(1_500_000_000_000_000_000)), "1.5");
//! ```
//!
//! ## Operations
//!
//! | Operation | Caller | Effect |
//! |-----------|--------|--------|
//! | `configure` | coordinator | validate params, seed history, set initial stop |
//! | `update` | keeper / operator | rate-limited stop recalculation from a validated price |
//! | `is_triggered` | anyone | read-only trigger check against the stop |
//! | `prepare_settlement` | coordinator | trigger + slippage checks, oracle-priced amounts |
//! | `remove` | maker / operator | drop the order and its history |
//!
//! Every operation takes the price source, global configuration, and
//! `now` explicitly, so the same engine drives production keepers,
//! simulators, and backtests.
//!
//! ## Event Log
//!
//! With the `event-log` feature (enabled by default) the engine records
//! an audit trail of its decisions:
//!
//! ```
//! # use trailstop::{
//! #     AccountId, FeedId, GlobalConfig, OrderId, OrderParams, OrderType, Price,
//! #     TableFeed, TrailingStopEngine,
//! # };
//! # let global = GlobalConfig::new(AccountId(10));
//! # let mut feed = TableFeed::new();
//! # feed.set(FeedId(1), 2000_0000_0000, 8, 1_000);
//! # let mut engine = TrailingStopEngine::new();
//! # let params = OrderParams {
//! #     feed: FeedId(1),
//! #     initial_stop_price: Price::from_units(1960),
//! #     trailing_distance_bps: 200,
//! #     order_type: OrderType::Sell,
//! #     update_frequency_secs: 60,
//! #     max_slippage_bps: 100,
//! #     max_deviation_bps: 500,
//! #     twap_window_secs: 600,
//! #     maker_decimals: 18,
//! #     taker_decimals: 6,
//! #     maker: AccountId(20),
//! #     keeper: AccountId(30),
//! # };
//! # engine.configure(OrderId(1), params, &feed, &global, 1_000).unwrap();
//! assert_eq!(engine.events().len(), 1); // ConfigUpdated
//! assert_eq!(engine.events()[0].order_id(), OrderId(1));
//! ```
//!
//! The `persistence` feature adds JSON Lines archival of the trail.

mod config;
mod convert;
mod engine;
mod error;
#[cfg(feature = "event-log")]
mod events;
mod history;
mod oracle;
mod order;
#[cfg(feature = "persistence")]
pub mod persistence;
mod twap;
mod types;

// Re-export public API
pub use config::{GlobalConfig, DEFAULT_HEARTBEAT_SECS};
pub use convert::{
    compute_making_amount, compute_taking_amount, convert_from_18, mul_div, normalize_price,
    normalize_to_18, slippage_bps,
};
pub use engine::TrailingStopEngine;
pub use error::{ConfigError, EngineError};
#[cfg(feature = "event-log")]
pub use events::EngineEvent;
pub use history::PriceSample;
pub use oracle::{PriceFeed, RawObservation, TableFeed};
pub use order::{
    OrderParams, OrderState, OrderType, SettlementPlan, TriggerView, UpdateResult,
    MAX_ASSET_DECIMALS, MAX_DEVIATION_BPS, MAX_SLIPPAGE_BPS, TRAILING_DISTANCE_BPS_RANGE,
    TWAP_WINDOW_SECS_RANGE,
};
pub use twap::TwapMetrics;
pub use types::{AccountId, Bps, FeedId, OrderId, Price, Timestamp, BPS_DENOM};
