//! Error taxonomy for engine operations.
//!
//! All errors are synchronous and scoped to a single operation on a
//! single order. Nothing is retried inside the engine: a failed `update`
//! leaves the stop price unchanged until the next successful tick, and a
//! failed settlement leaves the order re-triggerable.

use crate::types::Bps;

/// Errors returned by [`TrailingStopEngine`](crate::TrailingStopEngine)
/// operations and the oracle/conversion helpers they call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    ConfigurationInvalid(#[from] ConfigError),

    #[error("order is not configured")]
    NotConfigured,

    #[error("update rate limit: {remaining_secs}s until next allowed update")]
    RateLimited { remaining_secs: u64 },

    #[error("oracle reading is stale: age {age_secs}s exceeds heartbeat {heartbeat_secs}s")]
    StaleOracle { age_secs: u64, heartbeat_secs: u64 },

    #[error("oracle returned a non-positive or unavailable price")]
    InvalidOraclePrice,

    #[error("price deviates {deviation_bps} bps from TWAP, max allowed {max_bps} bps")]
    PriceDeviationTooHigh { deviation_bps: u64, max_bps: Bps },

    #[error("price history is empty and no direct price is available")]
    InvalidPriceHistory,

    #[error("stop price has not been reached")]
    NotTriggered,

    #[error("slippage {slippage_bps} bps exceeds max {max_bps} bps")]
    SlippageExceeded { slippage_bps: u64, max_bps: Bps },

    #[error("arithmetic overflow in fixed-point conversion")]
    Overflow,

    #[error("caller is not authorized for this operation")]
    Unauthorized,
}

/// First-violation configuration errors, checked in field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("oracle feed handle is unknown to the price source")]
    UnknownFeed,

    #[error("initial stop price must be positive")]
    ZeroInitialStopPrice,

    #[error("trailing distance must be within [50, 2000] bps")]
    TrailingDistanceOutOfRange,

    #[error("update frequency must be positive")]
    ZeroUpdateFrequency,

    #[error("max slippage must be within [0, 5000] bps")]
    SlippageOutOfRange,

    #[error("max price deviation must be within [0, 1000] bps")]
    DeviationOutOfRange,

    #[error("TWAP window must be within [300, 3600] seconds")]
    WindowOutOfRange,

    #[error("asset decimals must be at most 18")]
    DecimalsTooLarge,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            format!("{}", EngineError::NotConfigured),
            "order is not configured"
        );
        assert_eq!(
            format!(
                "{}",
                EngineError::SlippageExceeded {
                    slippage_bps: 101,
                    max_bps: 100
                }
            ),
            "slippage 101 bps exceeds max 100 bps"
        );
    }

    #[test]
    fn config_error_converts() {
        let err: EngineError = ConfigError::WindowOutOfRange.into();
        assert!(matches!(
            err,
            EngineError::ConfigurationInvalid(ConfigError::WindowOutOfRange)
        ));
        assert!(format!("{err}").contains("[300, 3600]"));
    }

    #[test]
    fn is_error() {
        let err: Box<dyn std::error::Error> = Box::new(EngineError::Overflow);
        assert!(err.to_string().contains("overflow"));
    }
}
