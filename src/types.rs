//! Core types: Price, Timestamp, OrderId, FeedId, AccountId

use std::fmt;

/// Basis points (1/100 of a percent). 10_000 bps = 100%.
pub type Bps = u32;

/// Basis-point denominator.
pub const BPS_DENOM: u128 = 10_000;

/// Canonical price in 18-decimal fixed point.
///
/// `Price::from_units(2000)` represents a price of 2000.0 (e.g. $2000).
/// All internal math is done on this representation so feeds with any
/// native decimal count compare and combine exactly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Price(pub u128);

impl Price {
    /// Scale factor of the canonical representation: 10^18.
    pub const SCALE: u128 = 1_000_000_000_000_000_000;

    pub const ZERO: Price = Price(0);

    /// Build a price from whole units (e.g. dollars).
    pub const fn from_units(units: u64) -> Price {
        Price(units as u128 * Self::SCALE)
    }

    /// Absolute difference between two prices.
    pub fn abs_diff(self, other: Price) -> u128 {
        self.0.abs_diff(other.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units = self.0 / Price::SCALE;
        let frac = self.0 % Price::SCALE;
        if frac == 0 {
            write!(f, "{units}")
        } else {
            // Trim trailing zeros from the fractional part
            let mut frac_str = format!("{frac:018}");
            while frac_str.ends_with('0') {
                frac_str.pop();
            }
            write!(f, "{units}.{frac_str}")
        }
    }
}

/// Timestamp in seconds (Unix epoch or simulation time).
///
/// The engine owns no clock; callers supply `now` explicitly so that
/// identical inputs always produce identical outputs.
pub type Timestamp = u64;

/// Unique order identifier, assigned by the external order coordinator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "O{}", self.0)
    }
}

/// Handle identifying a price feed in the oracle source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeedId(pub u32);

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}", self.0)
    }
}

/// Identity of a caller (maker, keeper, operator).
///
/// Authorization semantics (signatures, key custody) are an external
/// concern; the engine only compares identities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A{}", self.0)
    }
}
