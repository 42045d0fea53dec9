//! Assets, pools and pair keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::ids::{ObjectId, SharedObjectRef, TypeTag};
use crate::units::MAX_DECIMALS;

/// Fixed-point scaling the venue applies to prices (10^9).
pub const FLOAT_SCALING_DECIMALS: u8 = 9;

/// A tradable asset. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    /// Display symbol, upper-case (e.g. "SUI").
    pub symbol: String,
    /// Ledger type of the coin.
    pub type_tag: TypeTag,
    /// Decimal places of one whole unit.
    pub decimals: u8,
}

impl Asset {
    pub fn new(symbol: impl Into<String>, type_tag: TypeTag, decimals: u8) -> Self {
        Self {
            symbol: symbol.into().to_ascii_uppercase(),
            type_tag,
            decimals,
        }
    }

    pub fn is_native_gas(&self) -> bool {
        self.type_tag.is_native_gas()
    }
}

/// Key for a base/quote pair: `BASE_QUOTE`, upper-case.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PairKey {
    base: String,
    quote: String,
}

impl PairKey {
    pub fn new(base: &str, quote: &str) -> Self {
        Self {
            base: base.to_ascii_uppercase(),
            quote: quote.to_ascii_uppercase(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// Same pair, opposite orientation.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            base: self.quote.clone(),
            quote: self.base.clone(),
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.base, self.quote)
    }
}

impl FromStr for PairKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(['_', '/']) {
            Some((base, quote)) if !base.is_empty() && !quote.is_empty() => {
                Ok(Self::new(base, quote))
            }
            _ => Err(CoreError::InvalidPairKey(s.to_string())),
        }
    }
}

impl TryFrom<String> for PairKey {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<PairKey> for String {
    fn from(key: PairKey) -> Self {
        key.to_string()
    }
}

/// A CLOB pool on the venue. Immutable per session.
///
/// `tick_size`, `lot_size` and `min_size` are in venue units: ticks of the
/// encoded price and base-asset base units respectively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub object: SharedObjectRef,
    pub base: Asset,
    pub quote: Asset,
    pub tick_size: u64,
    pub lot_size: u64,
    pub min_size: u64,
    /// Package that owns the pool module.
    pub package: ObjectId,
}

impl Pool {
    pub fn id(&self) -> ObjectId {
        self.object.object_id
    }

    pub fn pair_key(&self) -> PairKey {
        PairKey::new(&self.base.symbol, &self.quote.symbol)
    }

    /// Decimal places of the venue price encoding for this pool:
    /// `FLOAT_SCALING + quote.decimals - base.decimals`.
    ///
    /// # Errors
    /// `InvalidPrice` if the encoding would need a negative or oversized scale.
    pub fn price_tick_decimals(&self) -> Result<u8> {
        let decimals = i16::from(FLOAT_SCALING_DECIMALS) + i16::from(self.quote.decimals)
            - i16::from(self.base.decimals);
        if !(0..=i16::from(MAX_DECIMALS)).contains(&decimals) {
            return Err(CoreError::InvalidPrice(format!(
                "unsupported price scale {decimals} for {}",
                self.pair_key()
            )));
        }
        Ok(decimals as u8)
    }

    /// Type arguments for pool calls: `[base, quote]`.
    pub fn type_args(&self) -> Vec<TypeTag> {
        vec![self.base.type_tag.clone(), self.quote.type_tag.clone()]
    }
}
