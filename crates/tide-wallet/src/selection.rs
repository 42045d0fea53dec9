//! Coin selection.
//!
//! Turns a set of coin records into a plan that yields one coin of an exact
//! amount inside a transaction script. The plan is pure data; the
//! transaction builder materializes it into split/merge commands.

use crate::coin::Holdings;
use crate::error::{WalletError, WalletResult};
use serde::Serialize;
use tide_core::ObjectRef;
use tracing::{debug, warn};

/// How an exact-amount input is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "plan", rename_all = "snake_case")]
pub enum BuildPlan {
    /// One record covers the amount: split it, the remainder stays with the owner.
    SplitSingle { source: ObjectRef, amount: u64 },
    /// No single record covers the amount: merge `sources` into `primary`,
    /// then split.
    MergeThenSplit {
        primary: ObjectRef,
        sources: Vec<ObjectRef>,
        amount: u64,
    },
    /// Split from the native gas coin.
    SplitFromGas { amount: u64 },
    /// Zero-value coin, only for fees in test mode.
    ZeroPlaceholder,
}

impl BuildPlan {
    /// Amount the plan yields.
    pub fn amount(&self) -> u64 {
        match self {
            Self::SplitSingle { amount, .. }
            | Self::MergeThenSplit { amount, .. }
            | Self::SplitFromGas { amount } => *amount,
            Self::ZeroPlaceholder => 0,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::ZeroPlaceholder)
    }
}

/// Plan an exact `required` input from `holdings`.
///
/// 1. no records: `InsufficientBalance`
/// 2. a record covers the amount: split the largest such record
/// 3. only the sum covers it: merge everything into the largest, then split
/// 4. otherwise `InsufficientBalance`
pub fn select_exact_input(holdings: &Holdings, required: u64) -> WalletResult<BuildPlan> {
    if required == 0 {
        return Err(WalletError::InvalidAmount(
            "required input must be positive".to_string(),
        ));
    }
    let insufficient = || WalletError::InsufficientBalance {
        coin_type: holdings.coin_type().to_string(),
        required,
        available: holdings.aggregate(),
    };

    let largest = holdings.largest().ok_or_else(insufficient)?;
    if largest.balance >= required {
        debug!(coin = %largest.id(), balance = largest.balance, required, "Splitting single coin");
        return Ok(BuildPlan::SplitSingle {
            source: largest.object.clone(),
            amount: required,
        });
    }

    if holdings.aggregate() < u128::from(required) {
        return Err(insufficient());
    }

    let primary = largest.object.clone();
    let sources: Vec<ObjectRef> = holdings
        .records()
        .iter()
        .filter(|r| r.id() != primary.object_id)
        .map(|r| r.object.clone())
        .collect();
    debug!(
        primary = %primary.object_id,
        merged = sources.len(),
        required,
        "Merging coins before split"
    );
    Ok(BuildPlan::MergeThenSplit {
        primary,
        sources,
        amount: required,
    })
}

/// Plan an exact input of the native gas asset.
///
/// The gas coin is the source; `gas_reserve` base units are never spent.
pub fn select_native_input(
    holdings: &Holdings,
    required: u64,
    gas_reserve: u64,
) -> WalletResult<BuildPlan> {
    if required == 0 {
        return Err(WalletError::InvalidAmount(
            "required input must be positive".to_string(),
        ));
    }
    let spendable = holdings.aggregate().saturating_sub(u128::from(gas_reserve));
    if spendable < u128::from(required) {
        return Err(WalletError::InsufficientBalance {
            coin_type: holdings.coin_type().to_string(),
            required,
            available: spendable,
        });
    }
    Ok(BuildPlan::SplitFromGas { amount: required })
}

/// Plan the protocol fee input.
///
/// Same algorithm as [`select_exact_input`]. When the fee token is short,
/// `allow_zero_fee` substitutes a zero-value placeholder instead of failing.
pub fn select_fee_input(
    holdings: &Holdings,
    required: u64,
    allow_zero_fee: bool,
) -> WalletResult<BuildPlan> {
    if required == 0 {
        return Ok(BuildPlan::ZeroPlaceholder);
    }
    match select_exact_input(holdings, required) {
        Ok(plan) => Ok(plan),
        Err(WalletError::InsufficientBalance { available, .. }) if allow_zero_fee => {
            warn!(
                coin_type = %holdings.coin_type(),
                required,
                available,
                "Fee token short, using zero placeholder"
            );
            Ok(BuildPlan::ZeroPlaceholder)
        }
        Err(WalletError::InsufficientBalance {
            coin_type,
            required,
            available,
        }) => Err(WalletError::InsufficientFeeToken {
            coin_type,
            required,
            available,
        }),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coin::test_fixtures::*;
    use tide_core::{ErrorKind, ObjectId, TypeTag};

    #[test]
    fn test_empty_records_fail() {
        let h = Holdings::empty(usdc_type());
        let err = select_exact_input(&h, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
    }

    #[test]
    fn test_single_record_split() {
        let h = holdings(&[10, 80, 30], &usdc_type());
        let plan = select_exact_input(&h, 50).unwrap();
        match plan {
            BuildPlan::SplitSingle { source, amount } => {
                assert_eq!(source.object_id, ObjectId::from_low_byte(2));
                assert_eq!(amount, 50);
            }
            other => panic!("unexpected plan {other:?}"),
        }
    }

    #[test]
    fn test_merge_then_split() {
        // 30 + 40 covers 50; 20 stays as change.
        let h = holdings(&[30, 40], &usdc_type());
        let plan = select_exact_input(&h, 50).unwrap();
        match &plan {
            BuildPlan::MergeThenSplit {
                primary,
                sources,
                amount,
            } => {
                assert_eq!(primary.object_id, ObjectId::from_low_byte(2));
                assert_eq!(sources.len(), 1);
                assert_eq!(sources[0].object_id, ObjectId::from_low_byte(1));
                assert_eq!(*amount, 50);
            }
            other => panic!("unexpected plan {other:?}"),
        }
        assert_eq!(h.aggregate() - u128::from(plan.amount()), 20);
    }

    #[test]
    fn test_sum_insufficient() {
        let h = holdings(&[30, 40], &usdc_type());
        match select_exact_input(&h, 71).unwrap_err() {
            WalletError::InsufficientBalance {
                required,
                available,
                ..
            } => {
                assert_eq!(required, 71);
                assert_eq!(available, 70);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_exact_match_on_single_record() {
        let h = holdings(&[50], &usdc_type());
        assert!(matches!(
            select_exact_input(&h, 50).unwrap(),
            BuildPlan::SplitSingle { amount: 50, .. }
        ));
    }

    #[test]
    fn test_native_holds_back_gas_reserve() {
        let sui = TypeTag::new("0x2::sui::SUI");
        let h = holdings(&[1_000_000_000], &sui);
        assert!(matches!(
            select_native_input(&h, 900_000_000, 100_000_000).unwrap(),
            BuildPlan::SplitFromGas {
                amount: 900_000_000
            }
        ));
        let err = select_native_input(&h, 900_000_001, 100_000_000).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
    }

    #[test]
    fn test_fee_insufficient_strict() {
        let h = holdings(&[5], &deep_type());
        let err = select_fee_input(&h, 10, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFeeToken);
    }

    #[test]
    fn test_fee_insufficient_relaxed() {
        let h = Holdings::empty(deep_type());
        assert_eq!(
            select_fee_input(&h, 10, true).unwrap(),
            BuildPlan::ZeroPlaceholder
        );
    }

    #[test]
    fn test_fee_sufficient_uses_same_algorithm() {
        let h = holdings(&[6, 6], &deep_type());
        assert!(matches!(
            select_fee_input(&h, 10, false).unwrap(),
            BuildPlan::MergeThenSplit { amount: 10, .. }
        ));
    }

    #[test]
    fn test_zero_required_rejected() {
        let h = holdings(&[6], &deep_type());
        assert_eq!(
            select_exact_input(&h, 0).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
    }
}
