use std::sync::atomic::{AtomicU64, Ordering};

use super::cache::{KeyType, Record, SetStatus, ValueType};
use super::error::Result;
use super::shard::Shard;

/// Sharded byte-budgeted LRU cache.
///
/// Keys are routed to one of `num_shards` independent shards, each with an
/// even split of the total byte budget and its own lock. Eviction is
/// least-recently-used per shard, not engine-wide; the trade is lower lock
/// contention for an approximate global LRU.
pub struct LruCache {
    shards: Vec<Shard>,
    num_shards: u32,
    cas_counter: AtomicU64,
}

impl LruCache {
    /// `capacity_bytes` is the total budget; every shard gets
    /// `capacity_bytes / num_shards` of it.
    pub fn new(capacity_bytes: u64, num_shards: u32) -> LruCache {
        assert!(num_shards > 0, "cache needs at least one shard");
        let per_shard = capacity_bytes / num_shards as u64;
        let shards = (0..num_shards).map(|_| Shard::new(per_shard)).collect();
        LruCache {
            shards,
            num_shards,
            cas_counter: AtomicU64::new(0),
        }
    }

    /// Inserts or updates the entry for `key` with a freshly issued cas
    /// token, evicting as needed.
    pub fn add(&self, key: KeyType, value: ValueType, flags: u32) -> SetStatus {
        let cas = self.next_cas_token();
        self.shard_for(&key).add(key, value, flags, cas);
        SetStatus { cas }
    }

    /// Returns the record stored for `key`, refreshing its recency.
    pub fn get(&self, key: &[u8]) -> Result<Record> {
        self.shard_for(key).get(key)
    }

    /// Removes the entry for `key`.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.shard_for(key).delete(key)
    }

    /// Stores `value` only if the entry still carries `expected_cas`.
    /// The compare and the store happen under the shard lock; fails with
    /// `NotFound` when the key is absent and `KeyExists` on a stale token.
    pub fn compare_and_swap(
        &self,
        key: KeyType,
        value: ValueType,
        flags: u32,
        expected_cas: u64,
    ) -> Result<SetStatus> {
        let cas = self.next_cas_token();
        self.shard_for(&key)
            .compare_and_swap(key, value, flags, expected_cas, cas)?;
        Ok(SetStatus { cas })
    }

    pub fn num_shards(&self) -> u32 {
        self.num_shards
    }

    pub fn shards(&self) -> &[Shard] {
        &self.shards
    }

    fn shard_for(&self, key: &[u8]) -> &Shard {
        &self.shards[(fnv1a_32(key) % self.num_shards) as usize]
    }

    fn next_cas_token(&self) -> u64 {
        self.cas_counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// FNV-1a 32-bit hash over the key bytes. Stable and cheap; only shard
/// routing depends on it.
fn fnv1a_32(key: &[u8]) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;
    key.iter()
        .fold(OFFSET_BASIS, |hash, byte| (hash ^ *byte as u32).wrapping_mul(PRIME))
}
