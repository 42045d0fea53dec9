//! Client order id generation.
//!
//! The venue requires client order ids that are unique per
//! (balance manager, pool). Ids combine wall-clock milliseconds shifted left
//! with a random low-bit salt, and are forced strictly increasing per key.

use dashmap::DashMap;
use tide_core::{Clock, ObjectId};
use uuid::Uuid;

/// Low bits reserved for the salt.
pub const SALT_BITS: u32 = 20;

const SALT_MASK: u64 = (1 << SALT_BITS) - 1;

/// Per-(balance manager, pool) monotonic client order ids.
///
/// # Guarantees
/// - Never returns a value <= the previous value for the same key
/// - Tracks wall-clock time when possible
pub struct ClientOrderIdGenerator<C: Clock> {
    last: DashMap<(ObjectId, ObjectId), u64>,
    clock: C,
}

impl<C: Clock> ClientOrderIdGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self {
            last: DashMap::new(),
            clock,
        }
    }

    fn candidate(&self) -> u64 {
        let salt = (Uuid::new_v4().as_u128() as u64) & SALT_MASK;
        self.clock.now_ms().saturating_mul(1 << SALT_BITS) | salt
    }

    /// Next id for `balance_manager` on `pool`:
    /// `max(last + 1, (now_ms << SALT_BITS) | salt)`.
    pub fn next(&self, balance_manager: ObjectId, pool: ObjectId) -> u64 {
        let candidate = self.candidate();
        let mut entry = self.last.entry((balance_manager, pool)).or_insert(0);
        let next = entry.saturating_add(1).max(candidate);
        *entry = next;
        next
    }

    /// Last id issued for the key, if any.
    pub fn last(&self, balance_manager: ObjectId, pool: ObjectId) -> Option<u64> {
        self.last.get(&(balance_manager, pool)).map(|v| *v)
    }
}
