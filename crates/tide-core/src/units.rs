//! Conversion between human decimal quantities and ledger integer units.
//!
//! All conversions toward the ledger floor, never round: an input amount
//! may only shrink, so a user is never charged more than they entered.
//! Every human-entered number must pass through here before it reaches a
//! transaction script.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::{CoreError, Result};

/// Largest decimal count accepted by the converters (10^18 fits in u64).
pub const MAX_DECIMALS: u8 = 18;

fn pow10(decimals: u8) -> Option<Decimal> {
    if decimals > MAX_DECIMALS {
        return None;
    }
    Some(Decimal::from(10u64.pow(u32::from(decimals))))
}

fn floor_scaled(value: Decimal, decimals: u8) -> Option<u64> {
    let scaled = value.checked_mul(pow10(decimals)?)?;
    scaled.floor().to_u64()
}

/// `floor(amount * 10^decimals)`.
///
/// # Errors
/// `InvalidAmount` for negative amounts, `Overflow` when the result does
/// not fit in a u64 or `decimals` exceeds [`MAX_DECIMALS`].
pub fn to_base_units(amount: Decimal, decimals: u8) -> Result<u64> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(CoreError::InvalidAmount(amount.to_string()));
    }
    floor_scaled(amount, decimals).ok_or_else(|| CoreError::Overflow {
        value: amount.to_string(),
        decimals,
    })
}

/// `floor(price * 10^tick_decimals)`, using the quote asset's tick convention.
///
/// # Errors
/// `InvalidPrice` for negative prices, `Overflow` as for [`to_base_units`].
pub fn to_ticks(price: Decimal, tick_decimals: u8) -> Result<u64> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(CoreError::InvalidPrice(price.to_string()));
    }
    floor_scaled(price, tick_decimals).ok_or_else(|| CoreError::Overflow {
        value: price.to_string(),
        decimals: tick_decimals,
    })
}

/// Inverse of [`to_base_units`]. Display and estimation only: never feed the
/// result into another on-chain amount without converting it again.
///
/// # Errors
/// `Overflow` if `decimals` exceeds [`MAX_DECIMALS`].
pub fn from_base_units(units: u64, decimals: u8) -> Result<Decimal> {
    if decimals > MAX_DECIMALS {
        return Err(CoreError::Overflow {
            value: units.to_string(),
            decimals,
        });
    }
    Ok(Decimal::from_i128_with_scale(i128::from(units), u32::from(decimals)).normalize())
}

/// Round `value` down to a multiple of `step`. A zero step is a no-op.
#[inline]
pub fn floor_to_multiple(value: u64, step: u64) -> u64 {
    if step == 0 {
        return value;
    }
    value - value % step
}
