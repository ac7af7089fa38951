//! Fixed-point amount conversion between native asset decimals and the
//! canonical 18-decimal price space.
//!
//! Every multiply-then-divide goes through [`mul_div`], which reduces
//! the operands by their GCDs against the denominator before
//! multiplying. The product is therefore computed at full precision —
//! nothing is truncated before the final division — and a genuine
//! overflow of the reduced product surfaces as [`EngineError::Overflow`]
//! instead of silently wrapping.

use crate::error::EngineError;
use crate::types::{Price, BPS_DENOM};

/// Scale an amount from `decimals` native precision up or down to 18
/// decimals. The up-scaling branch is overflow-checked.
pub fn normalize_to_18(amount: u128, decimals: u8) -> Result<u128, EngineError> {
    if decimals == 18 {
        return Ok(amount);
    }
    if decimals < 18 {
        let factor = 10u128.pow((18 - decimals) as u32);
        amount.checked_mul(factor).ok_or(EngineError::Overflow)
    } else {
        let factor = 10u128.pow((decimals - 18) as u32);
        Ok(amount / factor)
    }
}

/// Inverse of [`normalize_to_18`]: scale an 18-decimal amount to
/// `decimals` native precision. The up-scaling branch (decimals > 18)
/// is overflow-checked.
pub fn convert_from_18(amount18: u128, decimals: u8) -> Result<u128, EngineError> {
    if decimals == 18 {
        return Ok(amount18);
    }
    if decimals < 18 {
        let factor = 10u128.pow((18 - decimals) as u32);
        Ok(amount18 / factor)
    } else {
        let factor = 10u128.pow((decimals - 18) as u32);
        amount18.checked_mul(factor).ok_or(EngineError::Overflow)
    }
}

/// Maker-asset amount bought by `taking_amount` at `price`:
/// `convert_from_18(normalize(taking) × 1e18 / price, maker_decimals)`.
pub fn compute_making_amount(
    taking_amount: u128,
    price: Price,
    maker_decimals: u8,
    taker_decimals: u8,
) -> Result<u128, EngineError> {
    let taking18 = normalize_to_18(taking_amount, taker_decimals)?;
    let making18 = mul_div(taking18, Price::SCALE, price.0)?;
    convert_from_18(making18, maker_decimals)
}

/// Taker-asset amount owed for `making_amount` at `price`:
/// `convert_from_18(normalize(making) × price / 1e18, taker_decimals)`.
pub fn compute_taking_amount(
    making_amount: u128,
    price: Price,
    maker_decimals: u8,
    taker_decimals: u8,
) -> Result<u128, EngineError> {
    let making18 = normalize_to_18(making_amount, maker_decimals)?;
    let taking18 = mul_div(making18, price.0, Price::SCALE)?;
    convert_from_18(taking18, taker_decimals)
}

/// Implied 18-decimal price of a proposed fill: taker amount per unit of
/// maker amount, both normalized first.
pub fn normalize_price(
    taking_amount: u128,
    making_amount: u128,
    taker_decimals: u8,
    maker_decimals: u8,
) -> Result<Price, EngineError> {
    let taking18 = normalize_to_18(taking_amount, taker_decimals)?;
    let making18 = normalize_to_18(making_amount, maker_decimals)?;
    Ok(Price(mul_div(taking18, Price::SCALE, making18)?))
}

/// Relative difference of `actual` from `expected`, in basis points.
pub fn slippage_bps(expected: Price, actual: Price) -> Result<u64, EngineError> {
    let bps = mul_div(expected.abs_diff(actual), BPS_DENOM, expected.0)?;
    u64::try_from(bps).map_err(|_| EngineError::Overflow)
}

/// `a × b / den` with the product carried at full precision.
///
/// Reduces `a` and `b` against `den` by their GCDs first, so the only
/// failure mode is a quotient that genuinely exceeds u128 (or a zero
/// denominator, which callers rule out for validated prices).
pub fn mul_div(a: u128, b: u128, den: u128) -> Result<u128, EngineError> {
    if den == 0 {
        return Err(EngineError::Overflow);
    }
    let g1 = gcd(a, den);
    let a = a / g1;
    let den = den / g1;
    let g2 = gcd(b, den);
    let b = b / g2;
    let den = den / g2;
    let product = a.checked_mul(b).ok_or(EngineError::Overflow)?;
    Ok(product / den)
}

/// Binary GCD.
fn gcd(mut a: u128, mut b: u128) -> u128 {
    if a == 0 {
        return b.max(1);
    }
    if b == 0 {
        return a;
    }
    let az = a.trailing_zeros();
    let bz = b.trailing_zeros();
    let shift = az.min(bz);
    a >>= az;
    b >>= bz;
    loop {
        if a > b {
            std::mem::swap(&mut a, &mut b);
        }
        b -= a;
        if b == 0 {
            break;
        }
        b >>= b.trailing_zeros();
    }
    a << shift
}
