//! TrailingStopEngine: per-order lifecycle and stop-price recalculation.
//!
//! This is the main entry point for the external order coordinator. It
//! owns per-order configuration, price history, and TWAP metrics, and
//! implements the state machine
//! `Unconfigured -> Configured -> (update)* -> Triggerable -> Removed`.
//!
//! The engine is a pure, synchronous computation: every operation takes
//! the price source, the injected [`GlobalConfig`], and `now`
//! explicitly, runs to completion against a single order, and either
//! succeeds or fails without leaving partial state behind. There is no
//! internal retry; a failed oracle read aborts the operation and the
//! caller tries again on a later tick.
//!
//! Settlement re-entrancy is a caller concern: the coordinator must not
//! invoke [`prepare_settlement`](TrailingStopEngine::prepare_settlement)
//! for an order while a previously returned plan for that same order is
//! still being executed (a per-order in-progress flag on the caller side
//! suffices). Different orders are fully independent.

use rustc_hash::FxHashMap;

use crate::config::GlobalConfig;
use crate::convert;
use crate::error::{ConfigError, EngineError};
#[cfg(feature = "event-log")]
use crate::events::EngineEvent;
use crate::history::{PriceHistoryStore, PriceSample};
use crate::oracle::{self, PriceFeed};
use crate::order::{OrderParams, OrderState, SettlementPlan, TriggerView, UpdateResult};
use crate::twap::{self, TwapMetrics};
use crate::types::{AccountId, OrderId, Price, Timestamp};

/// The trailing-stop pricing engine.
#[derive(Clone, Debug, Default)]
pub struct TrailingStopEngine {
    /// Per-order configuration and live stop price.
    orders: FxHashMap<OrderId, OrderState>,
    /// Per-order rolling price history.
    history: PriceHistoryStore,
    /// Per-order volatility/adaptive-window metrics.
    metrics: FxHashMap<OrderId, TwapMetrics>,
    /// Observability log (only with the "event-log" feature).
    #[cfg(feature = "event-log")]
    events: Vec<EngineEvent>,
}

impl TrailingStopEngine {
    /// Create an engine with no configured orders.
    pub fn new() -> Self {
        Self::default()
    }

    // === Lifecycle ===

    /// Configure (or wholesale re-configure) a trailing-stop order.
    ///
    /// Validates every bound, rejecting on the first violation; verifies
    /// the feed handle against the price source; fetches the current
    /// price and seeds the order's history with it. The stored state
    /// starts with `current_stop_price = initial_stop_price` and both
    /// timestamps at `now`. Re-configuring an existing order id replaces
    /// everything — configuration is not additive.
    ///
    /// Returns the seeded price.
    pub fn configure<F: PriceFeed + ?Sized>(
        &mut self,
        order_id: OrderId,
        params: OrderParams,
        source: &F,
        global: &GlobalConfig,
        now: Timestamp,
    ) -> Result<Price, EngineError> {
        if source.decimals(params.feed).is_none() {
            return Err(ConfigError::UnknownFeed.into());
        }
        params.validate()?;

        let price = oracle::fetch(source, params.feed, global, now)?;
        self.history.seed(
            order_id,
            PriceSample {
                price,
                timestamp: now,
            },
        );
        self.metrics
            .insert(order_id, TwapMetrics::new(params.twap_window_secs, now));

        #[cfg(feature = "event-log")]
        self.events.push(EngineEvent::ConfigUpdated {
            order_id,
            feed: params.feed,
            initial_stop_price: params.initial_stop_price,
            trailing_distance_bps: params.trailing_distance_bps,
            order_type: params.order_type,
            twap_window_secs: params.twap_window_secs,
            max_deviation_bps: params.max_deviation_bps,
        });

        self.orders.insert(order_id, OrderState::new(params, now));
        Ok(price)
    }

    /// Recalculate the stop price from a fresh validated oracle reading.
    ///
    /// The caller must be the order's keeper or the global operator.
    /// Enforces the per-order rate limit, appends the reading to the
    /// history, checks the reading against the TWAP, then overwrites
    /// `current_stop_price` with `price -/+ price × trailing_bps / 10⁴`.
    ///
    /// The overwrite is unconditional: if the market reversed since the
    /// previous tick the stop can move unfavorably. A monotonic ratchet
    /// (keep the better of old and new) is deliberately NOT applied here;
    /// callers wanting ratchet semantics must layer it on top.
    ///
    /// On any failure the appended sample is rolled back, so a failed
    /// update leaves no observable state change.
    pub fn update<F: PriceFeed + ?Sized>(
        &mut self,
        order_id: OrderId,
        caller: AccountId,
        source: &F,
        global: &GlobalConfig,
        now: Timestamp,
    ) -> Result<UpdateResult, EngineError> {
        let state = self.orders.get(&order_id).ok_or(EngineError::NotConfigured)?;
        let params = state.params.clone();
        let old_stop_price = state.current_stop_price;
        let last_update_at = state.last_update_at;

        if caller != params.keeper && caller != global.operator() {
            return Err(EngineError::Unauthorized);
        }

        let next_allowed = last_update_at.saturating_add(params.update_frequency_secs);
        if now < next_allowed {
            return Err(EngineError::RateLimited {
                remaining_secs: next_allowed - now,
            });
        }

        let price = oracle::fetch(source, params.feed, global, now)?;

        // Append first (the TWAP must see the new sample), but keep a
        // backup: a deviation failure must not leave the sample behind.
        let backup = self.history.samples(order_id).to_vec();
        self.history.append(
            order_id,
            PriceSample {
                price,
                timestamp: now,
            },
            params.twap_window_secs,
            now,
        );

        let window_secs = self
            .metrics
            .get(&order_id)
            .map(|m| m.adaptive_window_secs)
            .unwrap_or(params.twap_window_secs);

        let checked = (|| {
            let twap = twap::compute(self.history.samples(order_id), window_secs, now)?;
            check_deviation(price, twap, params.max_deviation_bps)?;
            let trail = params.trail_amount(price)?;
            let new_stop_price = params.order_type.apply_trail(price, trail)?;
            Ok::<_, EngineError>((twap, new_stop_price))
        })();
        let (twap, new_stop_price) = match checked {
            Ok(ok) => ok,
            Err(err) => {
                self.history.restore(order_id, backup);
                return Err(err);
            }
        };

        if let Some(metrics) = self.metrics.get_mut(&order_id) {
            metrics.record_sample(
                self.history.samples(order_id),
                price,
                params.twap_window_secs,
                now,
            );
        }

        let state = self
            .orders
            .get_mut(&order_id)
            .expect("invariant: order checked above");
        state.current_stop_price = new_stop_price;
        state.last_update_at = now;

        #[cfg(feature = "event-log")]
        {
            self.events.push(EngineEvent::HistorySampleAppended {
                order_id,
                price,
                timestamp: now,
            });
            self.events.push(EngineEvent::StopPriceUpdated {
                order_id,
                old_stop_price,
                new_stop_price,
                current_price: price,
                twap,
                caller,
            });
        }

        Ok(UpdateResult {
            old_stop_price,
            new_stop_price,
            price,
            twap,
        })
    }

    /// Whether the order's stop has been reached, with the prices that
    /// answer was derived from.
    ///
    /// Returns an error (rather than `triggered = false`) when the
    /// oracle is unavailable or stale, so callers can distinguish "not
    /// triggered" from "could not tell".
    pub fn is_triggered<F: PriceFeed + ?Sized>(
        &self,
        order_id: OrderId,
        source: &F,
        global: &GlobalConfig,
        now: Timestamp,
    ) -> Result<TriggerView, EngineError> {
        let state = self.orders.get(&order_id).ok_or(EngineError::NotConfigured)?;
        let current_price = oracle::fetch(source, state.params.feed, global, now)?;
        let twap = self.twap_or_spot(order_id, &state.params, current_price, now)?;

        Ok(TriggerView {
            triggered: state
                .params
                .order_type
                .is_triggered(current_price, state.current_stop_price),
            current_price,
            twap,
            stop_price: state.current_stop_price,
        })
    }

    /// Validate a proposed fill and produce the transfer amounts.
    ///
    /// Re-fetches the price, re-checks the TWAP deviation, and requires
    /// the trigger to hold. The implied price of the proposed
    /// `making/taking` amounts is compared against the oracle price and
    /// rejected beyond `max_slippage_bps`. The returned plan's making
    /// amount is recomputed from the oracle price; the caller-supplied
    /// taking amount is treated as the fill size only.
    ///
    /// A failed attempt changes nothing; the order stays configured and
    /// re-triggerable.
    pub fn prepare_settlement<F: PriceFeed + ?Sized>(
        &mut self,
        order_id: OrderId,
        counterparty: AccountId,
        making_amount: u128,
        taking_amount: u128,
        source: &F,
        global: &GlobalConfig,
        now: Timestamp,
    ) -> Result<SettlementPlan, EngineError> {
        let state = self.orders.get(&order_id).ok_or(EngineError::NotConfigured)?;
        let params = state.params.clone();
        let stop_price = state.current_stop_price;

        let price = oracle::fetch(source, params.feed, global, now)?;
        let twap = self.twap_or_spot(order_id, &params, price, now)?;
        check_deviation(price, twap, params.max_deviation_bps)?;

        if !params.order_type.is_triggered(price, stop_price) {
            return Err(EngineError::NotTriggered);
        }

        let expected_price = convert::normalize_price(
            taking_amount,
            making_amount,
            params.taker_decimals,
            params.maker_decimals,
        )?;
        let slippage_bps = convert::slippage_bps(expected_price, price)?;
        if slippage_bps > params.max_slippage_bps as u64 {
            return Err(EngineError::SlippageExceeded {
                slippage_bps,
                max_bps: params.max_slippage_bps,
            });
        }

        let planned_making = convert::compute_making_amount(
            taking_amount,
            price,
            params.maker_decimals,
            params.taker_decimals,
        )?;

        #[cfg(feature = "event-log")]
        self.events.push(EngineEvent::Triggered {
            order_id,
            counterparty,
            settle_amount: planned_making,
            stop_price,
            twap,
        });
        #[cfg(not(feature = "event-log"))]
        let _ = counterparty;

        Ok(SettlementPlan {
            making_amount: planned_making,
            taking_amount,
            price,
            twap,
            slippage_bps,
        })
    }

    /// Remove an order, clearing its configuration, history, and
    /// metrics. Only the order's maker or the operator may remove.
    pub fn remove(
        &mut self,
        order_id: OrderId,
        caller: AccountId,
        global: &GlobalConfig,
    ) -> Result<(), EngineError> {
        let state = self.orders.get(&order_id).ok_or(EngineError::NotConfigured)?;
        if caller != state.params.maker && caller != global.operator() {
            return Err(EngineError::Unauthorized);
        }
        self.orders.remove(&order_id);
        self.history.remove(order_id);
        self.metrics.remove(&order_id);
        Ok(())
    }

    // === Read accessors ===

    /// Stored state for an order, if configured.
    pub fn order(&self, order_id: OrderId) -> Option<&OrderState> {
        self.orders.get(&order_id)
    }

    /// Live (pruned) price history for an order.
    pub fn history(&self, order_id: OrderId) -> &[PriceSample] {
        self.history.samples(order_id)
    }

    /// TWAP metrics for an order, if configured.
    pub fn metrics(&self, order_id: OrderId) -> Option<&TwapMetrics> {
        self.metrics.get(&order_id)
    }

    /// Number of configured orders.
    pub fn configured_count(&self) -> usize {
        self.orders.len()
    }

    /// TWAP over the order's history, falling back to the already
    /// fetched spot price when the history is empty.
    fn twap_or_spot(
        &self,
        order_id: OrderId,
        params: &OrderParams,
        spot: Price,
        now: Timestamp,
    ) -> Result<Price, EngineError> {
        let window_secs = self
            .metrics
            .get(&order_id)
            .map(|m| m.adaptive_window_secs)
            .unwrap_or(params.twap_window_secs);
        match twap::compute(self.history.samples(order_id), window_secs, now) {
            Err(EngineError::InvalidPriceHistory) => Ok(spot),
            other => other,
        }
    }
}

#[cfg(feature = "event-log")]
impl TrailingStopEngine {
    /// All recorded observability events, oldest first.
    pub fn events(&self) -> &[EngineEvent] {
        &self.events
    }

    /// Clear the event log (e.g. after persisting it).
    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

/// `|price - twap| / twap` must stay within `max_bps`; a zero tolerance
/// demands exact equality.
fn check_deviation(price: Price, twap: Price, max_bps: u32) -> Result<(), EngineError> {
    if max_bps == 0 {
        if price != twap {
            let deviation_bps =
                u64::try_from(twap::deviation_bps(price, twap)?).unwrap_or(u64::MAX);
            return Err(EngineError::PriceDeviationTooHigh {
                deviation_bps,
                max_bps,
            });
        }
        return Ok(());
    }
    let deviation = twap::deviation_bps(price, twap)?;
    if deviation > max_bps as u128 {
        return Err(EngineError::PriceDeviationTooHigh {
            deviation_bps: u64::try_from(deviation).unwrap_or(u64::MAX),
            max_bps,
        });
    }
    Ok(())
}
