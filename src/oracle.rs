//! Price oracle adapter: raw feed readings validated and rescaled to the
//! canonical 18-decimal representation.
//!
//! The engine consumes prices through the [`PriceFeed`] trait so it can
//! sit behind any oracle network, a simulator, or a backtester. Fetches
//! are single-attempt: a failed read aborts the calling operation and is
//! surfaced to the caller, who may retry on a later tick.

use rustc_hash::FxHashMap;

use crate::config::GlobalConfig;
use crate::error::EngineError;
use crate::types::{FeedId, Price, Timestamp};

/// A raw reading as the external feed reports it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawObservation {
    /// Price in the feed's native fixed-point representation. Signed
    /// because some feed networks report signed answers; non-positive
    /// values are rejected.
    pub price: i128,
    /// Native decimal count of `price`.
    pub decimals: u8,
    /// When the feed last updated this reading.
    pub updated_at: Timestamp,
}

/// Source of raw price readings.
///
/// `None` from either method means the handle is unknown to this source.
pub trait PriceFeed {
    /// Latest reading for a feed handle.
    fn latest_price(&self, feed: FeedId) -> Option<RawObservation>;

    /// Native decimal count for a feed handle.
    fn decimals(&self, feed: FeedId) -> Option<u8>;
}

/// Fetch, validate, and rescale one price reading.
///
/// Fails with [`EngineError::InvalidOraclePrice`] for unknown feeds or
/// non-positive prices, and [`EngineError::StaleOracle`] when the reading
/// is older than the feed's heartbeat.
pub fn fetch<F: PriceFeed + ?Sized>(
    source: &F,
    feed: FeedId,
    global: &GlobalConfig,
    now: Timestamp,
) -> Result<Price, EngineError> {
    let obs = source
        .latest_price(feed)
        .ok_or(EngineError::InvalidOraclePrice)?;

    if obs.price <= 0 {
        return Err(EngineError::InvalidOraclePrice);
    }

    let heartbeat_secs = global.heartbeat_secs(feed);
    let age_secs = now.saturating_sub(obs.updated_at);
    if age_secs > heartbeat_secs {
        return Err(EngineError::StaleOracle {
            age_secs,
            heartbeat_secs,
        });
    }

    rescale(obs.price as u128, obs.decimals)
}

/// Rescale a positive native-decimal price to 18 decimals.
fn rescale(price: u128, decimals: u8) -> Result<Price, EngineError> {
    if decimals == 18 {
        return Ok(Price(price));
    }
    if decimals < 18 {
        let factor = 10u128.pow((18 - decimals) as u32);
        price
            .checked_mul(factor)
            .map(Price)
            .ok_or(EngineError::Overflow)
    } else {
        let factor = 10u128.pow((decimals - 18) as u32);
        let scaled = price / factor;
        // A positive reading so small it truncates to zero is no price
        // at all; zero would later trip divide-by-zero guards as the
        // misleading `Overflow`.
        if scaled == 0 {
            return Err(EngineError::InvalidOraclePrice);
        }
        Ok(Price(scaled))
    }
}

/// In-memory price feed for tests, simulators, and backtesting.
///
/// Set per-feed readings and advance them as simulated time moves.
///
/// ```
/// use trailstop::{FeedId, TableFeed, PriceFeed};
///
/// let mut feed = TableFeed::new();
/// feed.set(FeedId(1), 2000_0000_0000, 8, 1_000); // $2000 at 8 decimals
/// assert_eq!(feed.decimals(FeedId(1)), Some(8));
/// ```
#[derive(Clone, Debug, Default)]
pub struct TableFeed {
    readings: FxHashMap<FeedId, RawObservation>,
}

impl TableFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace a reading for a feed handle.
    pub fn set(&mut self, feed: FeedId, price: i128, decimals: u8, updated_at: Timestamp) {
        self.readings.insert(
            feed,
            RawObservation {
                price,
                decimals,
                updated_at,
            },
        );
    }

    /// Drop a feed handle, simulating an unavailable oracle.
    pub fn clear(&mut self, feed: FeedId) {
        self.readings.remove(&feed);
    }
}

impl PriceFeed for TableFeed {
    fn latest_price(&self, feed: FeedId) -> Option<RawObservation> {
        self.readings.get(&feed).copied()
    }

    fn decimals(&self, feed: FeedId) -> Option<u8> {
        self.readings.get(&feed).map(|obs| obs.decimals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccountId;

    const FEED: FeedId = FeedId(1);

    fn global() -> GlobalConfig {
        GlobalConfig::new(AccountId(1))
    }

    #[test]
    fn fetch_rescales_low_decimals() {
        let mut feed = TableFeed::new();
        // $2000 at 8 decimals
        feed.set(FEED, 2000_0000_0000, 8, 1_000);
        let price = fetch(&feed, FEED, &global(), 1_000).unwrap();
        assert_eq!(price, Price::from_units(2000));
    }

    #[test]
    fn fetch_rescales_high_decimals() {
        let mut feed = TableFeed::new();
        // 2000 * 10^20 at 20 decimals -> integer-divided down
        feed.set(FEED, 2000 * 10i128.pow(20), 20, 1_000);
        let price = fetch(&feed, FEED, &global(), 1_000).unwrap();
        assert_eq!(price, Price::from_units(2000));
    }

    #[test]
    fn fetch_identity_at_18() {
        let mut feed = TableFeed::new();
        feed.set(FEED, (7 * Price::SCALE) as i128, 18, 1_000);
        let price = fetch(&feed, FEED, &global(), 1_000).unwrap();
        assert_eq!(price, Price::from_units(7));
    }

    #[test]
    fn unknown_feed_is_invalid() {
        let feed = TableFeed::new();
        assert_eq!(
            fetch(&feed, FEED, &global(), 1_000),
            Err(EngineError::InvalidOraclePrice)
        );
    }

    #[test]
    fn non_positive_price_rejected() {
        let mut feed = TableFeed::new();
        feed.set(FEED, 0, 8, 1_000);
        assert_eq!(
            fetch(&feed, FEED, &global(), 1_000),
            Err(EngineError::InvalidOraclePrice)
        );

        feed.set(FEED, -5, 8, 1_000);
        assert_eq!(
            fetch(&feed, FEED, &global(), 1_000),
            Err(EngineError::InvalidOraclePrice)
        );
    }

    #[test]
    fn stale_reading_rejected() {
        let mut feed = TableFeed::new();
        feed.set(FEED, 2000_0000_0000, 8, 1_000);

        let now = 1_000 + crate::config::DEFAULT_HEARTBEAT_SECS + 1;
        assert_eq!(
            fetch(&feed, FEED, &global(), now),
            Err(EngineError::StaleOracle {
                age_secs: crate::config::DEFAULT_HEARTBEAT_SECS + 1,
                heartbeat_secs: crate::config::DEFAULT_HEARTBEAT_SECS,
            })
        );

        // Exactly at the heartbeat boundary is still fresh
        let now = 1_000 + crate::config::DEFAULT_HEARTBEAT_SECS;
        assert!(fetch(&feed, FEED, &global(), now).is_ok());
    }

    #[test]
    fn per_feed_heartbeat_respected() {
        let operator = AccountId(1);
        let mut global = GlobalConfig::new(operator);
        global.set_heartbeat(operator, FEED, 60).unwrap();

        let mut feed = TableFeed::new();
        feed.set(FEED, 2000_0000_0000, 8, 1_000);

        assert!(fetch(&feed, FEED, &global, 1_060).is_ok());
        assert!(matches!(
            fetch(&feed, FEED, &global, 1_061),
            Err(EngineError::StaleOracle { .. })
        ));
    }

    #[test]
    fn vanishing_price_rejected() {
        // 1 at 20 decimals integer-divides to zero canonical units
        let mut feed = TableFeed::new();
        feed.set(FEED, 1, 20, 1_000);
        assert_eq!(
            fetch(&feed, FEED, &global(), 1_000),
            Err(EngineError::InvalidOraclePrice)
        );
    }

    #[test]
    fn rescale_overflow_detected() {
        let mut feed = TableFeed::new();
        // A 0-decimal price large enough that *10^18 overflows u128
        feed.set(FEED, i128::MAX, 0, 1_000);
        assert_eq!(
            fetch(&feed, FEED, &global(), 1_000),
            Err(EngineError::Overflow)
        );
    }

    #[test]
    fn future_timestamp_is_not_stale() {
        // A reading "from the future" (clock skew) has zero age
        let mut feed = TableFeed::new();
        feed.set(FEED, 2000_0000_0000, 8, 2_000);
        assert!(fetch(&feed, FEED, &global(), 1_000).is_ok());
    }
}
