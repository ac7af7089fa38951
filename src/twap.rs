//! Robust time-weighted average price over a rolling sample window.
//!
//! Two computation paths, chosen by the recency of the newest sample:
//!
//! - **Robust** (newest sample within [`FRESHNESS_SECS`]): outliers more
//!   than [`OUTLIER_FILTER_BPS`] from the window median are discarded,
//!   the median is recomputed over the survivors, and the result is the
//!   midpoint of that median and a weighted average of the original
//!   in-window samples (excluding those more than [`WEIGHT_FILTER_BPS`]
//!   from the recomputed median).
//! - **Plain** (no recent sample): the weighted average alone, with no
//!   reference-price filtering.
//!
//! Both paths weight sample `s` by `(now - s.timestamp) + 1`. Note that
//! this weight grows with sample *age*; it is reproduced here exactly as
//! the settlement layer expects it, see the flagged test below.
//!
//! All arithmetic is checked u128; overflow surfaces as
//! [`EngineError::Overflow`].

use crate::convert::mul_div;
use crate::error::EngineError;
use crate::history::PriceSample;
use crate::order::TWAP_WINDOW_SECS_RANGE;
use crate::types::{Price, Timestamp, BPS_DENOM};

/// Maximum age of the newest sample for the robust path.
pub const FRESHNESS_SECS: u64 = 120;
/// Deviation from the window median beyond which a sample is dropped
/// from the median computation.
pub const OUTLIER_FILTER_BPS: u128 = 1500;
/// Deviation from the filtered median beyond which a sample is excluded
/// from the weighted average.
pub const WEIGHT_FILTER_BPS: u128 = 2000;

/// Seconds between opportunistic metrics refreshes.
pub const METRICS_INTERVAL_SECS: u64 = 300;
/// Alternatively refresh every this many appended samples.
pub const METRICS_SAMPLE_STRIDE: u32 = 10;
/// Minimum history length for a metrics refresh.
pub const MIN_METRICS_SAMPLES: usize = 3;
/// Volatility above which the adaptive window doubles.
pub const VOLATILITY_DOUBLE_BPS: u64 = 500;
/// Volatility above which the adaptive window widens by half.
pub const VOLATILITY_WIDEN_BPS: u64 = 200;

/// Compute the TWAP of `history` over the trailing `window_secs`.
///
/// Errors with [`EngineError::InvalidPriceHistory`] only when the
/// history is empty; the engine falls back to a direct oracle fetch
/// before reporting that to callers.
pub fn compute(
    history: &[PriceSample],
    window_secs: u64,
    now: Timestamp,
) -> Result<Price, EngineError> {
    let newest = match history.iter().max_by_key(|s| s.timestamp) {
        Some(s) => *s,
        None => return Err(EngineError::InvalidPriceHistory),
    };
    if history.len() == 1 {
        return Ok(history[0].price);
    }

    let cutoff = now.saturating_sub(window_secs);
    let in_window: Vec<PriceSample> = history
        .iter()
        .copied()
        .filter(|s| s.timestamp >= cutoff)
        .collect();
    if in_window.is_empty() {
        return Ok(newest.price);
    }

    if now.saturating_sub(newest.timestamp) <= FRESHNESS_SECS {
        robust_twap(&in_window, newest.price, now)
    } else {
        match weighted_average(&in_window, None, now)? {
            Some(avg) => Ok(avg),
            None => Ok(newest.price),
        }
    }
}

/// Robust path: outlier-filtered median blended with the weighted
/// average. Falls back to `newest_price` when filtering empties the set.
fn robust_twap(
    in_window: &[PriceSample],
    newest_price: Price,
    now: Timestamp,
) -> Result<Price, EngineError> {
    let raw_median = median(in_window.iter().map(|s| s.price))?;

    let filtered: Vec<Price> = in_window
        .iter()
        .map(|s| s.price)
        .filter(|p| deviation_bps(*p, raw_median).is_ok_and(|d| d <= OUTLIER_FILTER_BPS))
        .collect();
    let median_price = match median(filtered.iter().copied()) {
        Ok(m) => m,
        Err(_) => return Ok(newest_price),
    };

    // The weighted average runs over the ORIGINAL in-window samples,
    // excluded only by deviation from the recomputed median.
    let weighted = weighted_average(in_window, Some(median_price), now)?;
    let Some(weighted) = weighted else {
        return Ok(newest_price);
    };

    let sum = median_price
        .0
        .checked_add(weighted.0)
        .ok_or(EngineError::Overflow)?;
    Ok(Price(sum / 2))
}

/// Weighted average with weight `(now - timestamp) + 1`.
///
/// With `reference` set, samples deviating more than
/// [`WEIGHT_FILTER_BPS`] from it are excluded. Returns `None` when no
/// sample qualifies.
fn weighted_average(
    samples: &[PriceSample],
    reference: Option<Price>,
    now: Timestamp,
) -> Result<Option<Price>, EngineError> {
    let mut weighted_sum: u128 = 0;
    let mut weight_sum: u128 = 0;

    for sample in samples {
        if let Some(reference) = reference {
            let dev = deviation_bps(sample.price, reference)?;
            if dev > WEIGHT_FILTER_BPS {
                continue;
            }
        }
        let weight = now.saturating_sub(sample.timestamp) as u128 + 1;
        let term = sample
            .price
            .0
            .checked_mul(weight)
            .ok_or(EngineError::Overflow)?;
        weighted_sum = weighted_sum.checked_add(term).ok_or(EngineError::Overflow)?;
        weight_sum = weight_sum.checked_add(weight).ok_or(EngineError::Overflow)?;
    }

    if weight_sum == 0 {
        return Ok(None);
    }
    Ok(Some(Price(weighted_sum / weight_sum)))
}

/// Median price: middle element (odd count) or the mean of the two
/// middle elements (even count). Errors on an empty iterator.
fn median(prices: impl Iterator<Item = Price>) -> Result<Price, EngineError> {
    let mut sorted: Vec<u128> = prices.map(|p| p.0).collect();
    if sorted.is_empty() {
        return Err(EngineError::InvalidPriceHistory);
    }
    sorted.sort_unstable();

    let n = sorted.len();
    let mid = n / 2;
    if n % 2 == 1 {
        Ok(Price(sorted[mid]))
    } else {
        let sum = sorted[mid - 1]
            .checked_add(sorted[mid])
            .ok_or(EngineError::Overflow)?;
        Ok(Price(sum / 2))
    }
}

/// Absolute deviation of `price` from `reference`, in basis points.
pub(crate) fn deviation_bps(price: Price, reference: Price) -> Result<u128, EngineError> {
    mul_div(price.abs_diff(reference), BPS_DENOM, reference.0)
}

/// Volatility and adaptive-window metrics, refreshed opportunistically.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TwapMetrics {
    /// Mean absolute deviation of history from the current price, bps.
    pub volatility_bps: u64,
    /// Max minus min price across the history.
    pub price_range: u128,
    /// Window the engine actually computes TWAP over. Widens with
    /// volatility, clamped to [300, 3600] seconds.
    pub adaptive_window_secs: u64,
    /// When the metrics were last recomputed.
    pub updated_at: Timestamp,
    samples_seen: u32,
}

impl TwapMetrics {
    pub fn new(base_window_secs: u64, now: Timestamp) -> Self {
        Self {
            volatility_bps: 0,
            price_range: 0,
            adaptive_window_secs: base_window_secs,
            updated_at: now,
            samples_seen: 0,
        }
    }

    /// Record one appended sample and refresh the metrics when due:
    /// at most every [`METRICS_INTERVAL_SECS`] or every
    /// [`METRICS_SAMPLE_STRIDE`]-th sample, and only with at least
    /// [`MIN_METRICS_SAMPLES`] samples of history.
    pub fn record_sample(
        &mut self,
        history: &[PriceSample],
        current_price: Price,
        base_window_secs: u64,
        now: Timestamp,
    ) {
        self.samples_seen = self.samples_seen.wrapping_add(1);

        let due = now.saturating_sub(self.updated_at) >= METRICS_INTERVAL_SECS
            || self.samples_seen % METRICS_SAMPLE_STRIDE == 0;
        if !due || history.len() < MIN_METRICS_SAMPLES {
            return;
        }

        let mut deviation_sum: u128 = 0;
        let mut min = u128::MAX;
        let mut max = 0u128;
        for sample in history {
            // Saturate rather than fail: metrics are advisory
            deviation_sum = deviation_sum.saturating_add(
                deviation_bps(sample.price, current_price).unwrap_or(u128::MAX),
            );
            min = min.min(sample.price.0);
            max = max.max(sample.price.0);
        }
        let volatility = deviation_sum / history.len() as u128;
        self.volatility_bps = u64::try_from(volatility).unwrap_or(u64::MAX);
        self.price_range = max - min;

        let widened = if self.volatility_bps > VOLATILITY_DOUBLE_BPS {
            base_window_secs * 2
        } else if self.volatility_bps > VOLATILITY_WIDEN_BPS {
            base_window_secs * 3 / 2
        } else {
            base_window_secs
        };
        let (lo, hi) = TWAP_WINDOW_SECS_RANGE;
        self.adaptive_window_secs = widened.clamp(lo, hi);
        self.updated_at = now;
    }
}
