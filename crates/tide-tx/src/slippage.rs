//! Output estimation and slippage-protected minimum output.
//!
//! All arithmetic here is on ledger base units. The estimate is floored, and
//! the minimum is `floor(estimate * (10000 - bps) / 10000)`.

use crate::error::{TxError, TxResult};
use rust_decimal::Decimal;
use tide_core::{from_base_units, to_base_units, Asset};

/// Basis-point denominator.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// `floor(estimated * (1 - slippage_bps / 10000))`.
///
/// # Errors
/// `InvalidInput` if `slippage_bps` exceeds 10000.
pub fn min_output(estimated: u64, slippage_bps: u16) -> TxResult<u64> {
    let bps = u64::from(slippage_bps);
    if bps > BPS_DENOMINATOR {
        return Err(TxError::InvalidInput(format!(
            "slippage {slippage_bps} bps exceeds 100%"
        )));
    }
    let kept = u128::from(estimated) * u128::from(BPS_DENOMINATOR - bps) / u128::from(BPS_DENOMINATOR);
    // kept <= estimated, so it fits in u64.
    Ok(kept as u64)
}

/// Estimated output in base units of `output` for `input_units` of `input`
/// at `price` (quote per base).
pub fn estimate_output(
    input_units: u64,
    input: &Asset,
    output: &Asset,
    price: Decimal,
    is_base_to_quote: bool,
) -> TxResult<u64> {
    if price <= Decimal::ZERO {
        return Err(TxError::InvalidInput(format!("non-positive price {price}")));
    }
    let human_in = from_base_units(input_units, input.decimals)?;
    let human_out = if is_base_to_quote {
        human_in.checked_mul(price)
    } else {
        human_in.checked_div(price)
    }
    .ok_or_else(|| TxError::InvalidInput(format!("output estimate overflow at price {price}")))?;
    Ok(to_base_units(human_out, output.decimals)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tide_core::TypeTag;

    fn sui() -> Asset {
        Asset::new("SUI", TypeTag::new("0x2::sui::SUI"), 9)
    }

    fn usdc() -> Asset {
        Asset::new("USDC", TypeTag::new("0xdba3::usdc::USDC"), 6)
    }

    #[test]
    fn test_min_output_fifty_bps() {
        assert_eq!(min_output(100, 50).unwrap(), 99);
        assert_eq!(min_output(100_000_000, 50).unwrap(), 99_500_000);
    }

    #[test]
    fn test_min_output_bounds() {
        assert_eq!(min_output(12_345, 0).unwrap(), 12_345);
        assert_eq!(min_output(12_345, 10_000).unwrap(), 0);
        assert!(min_output(1, 10_001).is_err());
        let large = min_output(u64::MAX, 1).unwrap();
        assert!(large < u64::MAX && large > u64::MAX / 10_000 * 9_998);
    }

    #[test]
    fn test_estimate_base_to_quote() {
        // 2 SUI at 3.5 USDC = 7 USDC
        let out = estimate_output(2_000_000_000, &sui(), &usdc(), dec!(3.5), true).unwrap();
        assert_eq!(out, 7_000_000);
    }

    #[test]
    fn test_estimate_quote_to_base_floors() {
        // 10 USDC at 3 USDC/SUI = 3.333333333.. SUI
        let out = estimate_output(10_000_000, &usdc(), &sui(), dec!(3), false).unwrap();
        assert_eq!(out, 3_333_333_333);
    }

    #[test]
    fn test_estimate_rejects_zero_price() {
        assert!(estimate_output(1, &sui(), &usdc(), Decimal::ZERO, true).is_err());
    }
}
