//! Coin records and per-asset holdings.

use serde::{Deserialize, Serialize};
use tide_core::{ObjectId, ObjectRef, TypeTag};

/// One discrete spendable coin object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinRecord {
    pub object: ObjectRef,
    pub balance: u64,
    pub coin_type: TypeTag,
}

impl CoinRecord {
    pub fn id(&self) -> ObjectId {
        self.object.object_id
    }
}

/// A user's coins of one asset type.
///
/// The aggregate balance is always computed from the records, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holdings {
    coin_type: TypeTag,
    records: Vec<CoinRecord>,
}

impl Holdings {
    /// Records of a different coin type are dropped.
    pub fn new(coin_type: TypeTag, records: Vec<CoinRecord>) -> Self {
        let canonical = coin_type.canonical();
        let records = records
            .into_iter()
            .filter(|r| r.coin_type.canonical() == canonical)
            .collect();
        Self { coin_type, records }
    }

    pub fn empty(coin_type: TypeTag) -> Self {
        Self {
            coin_type,
            records: Vec::new(),
        }
    }

    pub fn coin_type(&self) -> &TypeTag {
        &self.coin_type
    }

    pub fn records(&self) -> &[CoinRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Sum of all record balances.
    pub fn aggregate(&self) -> u128 {
        self.records.iter().map(|r| u128::from(r.balance)).sum()
    }

    /// Record with the largest balance. Ties go to the lowest object id.
    pub fn largest(&self) -> Option<&CoinRecord> {
        self.records
            .iter()
            .max_by(|a, b| a.balance.cmp(&b.balance).then(b.id().cmp(&a.id())))
    }

    /// Drop consumed records.
    pub fn consume(&mut self, ids: &[ObjectId]) {
        self.records.retain(|r| !ids.contains(&r.id()));
    }
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use super::*;

    pub fn deep_type() -> TypeTag {
        TypeTag::new("0xdeeb::deep::DEEP")
    }

    pub fn usdc_type() -> TypeTag {
        TypeTag::new("0xdba3::usdc::USDC")
    }

    pub fn coin(n: u8, balance: u64, coin_type: &TypeTag) -> CoinRecord {
        CoinRecord {
            object: ObjectRef::new(ObjectId::from_low_byte(n), 7, format!("digest{n}")),
            balance,
            coin_type: coin_type.clone(),
        }
    }

    pub fn holdings(balances: &[u64], coin_type: &TypeTag) -> Holdings {
        let records = balances
            .iter()
            .enumerate()
            .map(|(i, b)| coin(i as u8 + 1, *b, coin_type))
            .collect();
        Holdings::new(coin_type.clone(), records)
    }
}

#[cfg(test)]
mod tests {
    use super::test_fixtures::*;
    use super::*;

    #[test]
    fn test_aggregate_follows_consumption() {
        let mut h = holdings(&[30, 40, 5], &usdc_type());
        assert_eq!(h.aggregate(), 75);
        let first = h.records()[0].id();
        h.consume(&[first]);
        assert_eq!(h.aggregate(), 45);
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn test_foreign_records_filtered() {
        let records = vec![coin(1, 10, &usdc_type()), coin(2, 99, &deep_type())];
        let h = Holdings::new(usdc_type(), records);
        assert_eq!(h.len(), 1);
        assert_eq!(h.aggregate(), 10);
    }

    #[test]
    fn test_largest_tie_breaks_on_id() {
        let h = holdings(&[40, 40, 10], &usdc_type());
        assert_eq!(h.largest().unwrap().id(), ObjectId::from_low_byte(1));
    }

    #[test]
    fn test_empty_holdings_keep_coin_type() {
        let h = Holdings::empty(deep_type());
        assert!(h.is_empty());
        assert_eq!(h.aggregate(), 0);
        assert!(h.largest().is_none());
        assert_eq!(h.coin_type(), &deep_type());
    }

    #[test]
    fn test_aggregate_does_not_overflow() {
        let h = holdings(&[u64::MAX, u64::MAX], &usdc_type());
        assert_eq!(h.aggregate(), u128::from(u64::MAX) * 2);
    }
}
