//! Order configuration: type, parameters, stored state, result structs.

use std::fmt;

use crate::convert;
use crate::error::{ConfigError, EngineError};
use crate::types::{AccountId, Bps, FeedId, Price, Timestamp, BPS_DENOM};

/// Bounds on [`OrderParams::trailing_distance_bps`].
pub const TRAILING_DISTANCE_BPS_RANGE: (Bps, Bps) = (50, 2000);
/// Upper bound on [`OrderParams::max_slippage_bps`].
pub const MAX_SLIPPAGE_BPS: Bps = 5000;
/// Upper bound on [`OrderParams::max_deviation_bps`].
pub const MAX_DEVIATION_BPS: Bps = 1000;
/// Bounds on [`OrderParams::twap_window_secs`].
pub const TWAP_WINDOW_SECS_RANGE: (u64, u64) = (300, 3600);
/// Maximum native decimal precision for either asset.
pub const MAX_ASSET_DECIMALS: u8 = 18;

/// Direction of the protected order.
///
/// A SELL order protects a long position: its stop rests *below* the
/// market and triggers when the price falls to it. A BUY order is the
/// mirror image. Both formulas consume the type through a single branch
/// point ([`apply_trail`](OrderType::apply_trail) /
/// [`is_triggered`](OrderType::is_triggered)) rather than duplicating
/// sell/buy arithmetic at every call site.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OrderType {
    Sell,
    Buy,
}

impl OrderType {
    /// Move `price` by `trail` in the stop direction.
    ///
    /// Sell stops sit below the market (`price - trail`), buy stops above
    /// (`price + trail`). Both branches are range-checked: a trail larger
    /// than the price itself fails the Sell branch with
    /// [`EngineError::Overflow`].
    pub fn apply_trail(self, price: Price, trail: u128) -> Result<Price, EngineError> {
        match self {
            OrderType::Sell => price
                .0
                .checked_sub(trail)
                .map(Price)
                .ok_or(EngineError::Overflow),
            OrderType::Buy => price
                .0
                .checked_add(trail)
                .map(Price)
                .ok_or(EngineError::Overflow),
        }
    }

    /// Trigger predicate: SELL triggers at or below the stop, BUY at or
    /// above.
    #[inline]
    pub fn is_triggered(self, price: Price, stop: Price) -> bool {
        match self {
            OrderType::Sell => price <= stop,
            OrderType::Buy => price >= stop,
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Sell => write!(f, "SELL"),
            OrderType::Buy => write!(f, "BUY"),
        }
    }
}

/// Caller-supplied configuration for one trailing-stop order.
///
/// Supplied wholesale at `configure` time; there are no partial field
/// updates. Re-configuring an order id replaces the previous
/// configuration entirely.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderParams {
    /// Price feed the order tracks.
    pub feed: FeedId,
    /// Stop price the order starts at, canonical 18-decimal.
    pub initial_stop_price: Price,
    /// Gap kept between market and stop, in basis points. [50, 2000].
    pub trailing_distance_bps: Bps,
    /// SELL or BUY.
    pub order_type: OrderType,
    /// Minimum seconds between successful updates. Must be positive.
    pub update_frequency_secs: u64,
    /// Maximum settlement slippage, in basis points. [0, 5000].
    pub max_slippage_bps: Bps,
    /// Maximum allowed |price - TWAP| deviation, in basis points.
    /// [0, 1000]. Zero demands exact equality.
    pub max_deviation_bps: Bps,
    /// Base rolling window for TWAP, in seconds. [300, 3600].
    pub twap_window_secs: u64,
    /// Native decimal count of the maker asset. At most 18.
    pub maker_decimals: u8,
    /// Native decimal count of the taker asset. At most 18.
    pub taker_decimals: u8,
    /// Order owner; may remove the order.
    pub maker: AccountId,
    /// Periodic caller allowed to invoke updates.
    pub keeper: AccountId,
}

impl OrderParams {
    /// Check every bound, rejecting on the first violation.
    ///
    /// The feed handle itself is validated against the price source by
    /// the engine at configure time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_stop_price == Price::ZERO {
            return Err(ConfigError::ZeroInitialStopPrice);
        }
        let (lo, hi) = TRAILING_DISTANCE_BPS_RANGE;
        if self.trailing_distance_bps < lo || self.trailing_distance_bps > hi {
            return Err(ConfigError::TrailingDistanceOutOfRange);
        }
        if self.update_frequency_secs == 0 {
            return Err(ConfigError::ZeroUpdateFrequency);
        }
        if self.max_slippage_bps > MAX_SLIPPAGE_BPS {
            return Err(ConfigError::SlippageOutOfRange);
        }
        if self.max_deviation_bps > MAX_DEVIATION_BPS {
            return Err(ConfigError::DeviationOutOfRange);
        }
        let (wlo, whi) = TWAP_WINDOW_SECS_RANGE;
        if self.twap_window_secs < wlo || self.twap_window_secs > whi {
            return Err(ConfigError::WindowOutOfRange);
        }
        if self.maker_decimals > MAX_ASSET_DECIMALS || self.taker_decimals > MAX_ASSET_DECIMALS {
            return Err(ConfigError::DecimalsTooLarge);
        }
        Ok(())
    }

    /// Trailing amount for a given market price: `price × bps / 10000`,
    /// integer-truncated. Fails with [`EngineError::Overflow`] when the
    /// intermediate product cannot be reduced into range.
    pub fn trail_amount(&self, price: Price) -> Result<u128, EngineError> {
        convert::mul_div(price.0, self.trailing_distance_bps as u128, BPS_DENOM)
    }
}

/// Stored per-order state: the validated parameters plus the live stop
/// price and timestamps.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderState {
    pub params: OrderParams,
    /// Stop price as of the last successful update. Overwritten
    /// unconditionally every tick; see [`crate::TrailingStopEngine::update`].
    pub current_stop_price: Price,
    pub configured_at: Timestamp,
    pub last_update_at: Timestamp,
}

impl OrderState {
    pub(crate) fn new(params: OrderParams, now: Timestamp) -> Self {
        let current_stop_price = params.initial_stop_price;
        Self {
            params,
            current_stop_price,
            configured_at: now,
            last_update_at: now,
        }
    }
}

/// Outcome of a successful `update`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UpdateResult {
    pub old_stop_price: Price,
    pub new_stop_price: Price,
    /// Validated oracle price used for the recalculation.
    pub price: Price,
    /// TWAP the price was checked against.
    pub twap: Price,
}

/// Snapshot returned by `is_triggered`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TriggerView {
    pub triggered: bool,
    pub current_price: Price,
    pub twap: Price,
    pub stop_price: Price,
}

/// Transfer amounts for a validated settlement, computed from the oracle
/// price rather than from the caller-proposed amounts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SettlementPlan {
    /// Maker-asset amount to transfer, in maker-native decimals.
    pub making_amount: u128,
    /// Taker-asset amount to transfer, in taker-native decimals.
    pub taking_amount: u128,
    /// Oracle price the plan was computed at.
    pub price: Price,
    pub twap: Price,
    /// Realized slippage of the proposed fill against `price`.
    pub slippage_bps: u64,
}
