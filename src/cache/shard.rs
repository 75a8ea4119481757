use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::warn;

use super::cache::{KeyType, Record, ValueType};
use super::error::{CacheError, Result};
use super::recency::RecencyList;

/// One entry as owned by a shard. The key is duplicated from the table so
/// an eviction starting from the recency list can find its table slot.
struct Entry {
    key: KeyType,
    record: Record,
}

impl Entry {
    /// Accounted size: key plus value bytes. Flags and cas overhead are
    /// intentionally ignored, capacity is approximate.
    fn size(&self) -> u64 {
        (self.key.len() + self.record.value.len()) as u64
    }
}

struct ShardInner {
    table: HashMap<KeyType, usize>,
    recency: RecencyList<Entry>,
    size: u64,
}

/// One cache partition: a hash table and a recency sequence over the same
/// entries, plus byte accounting, protected by a single lock.
pub struct Shard {
    capacity: u64,
    inner: Mutex<ShardInner>,
}

impl Shard {
    pub fn new(capacity: u64) -> Shard {
        Shard {
            capacity,
            inner: Mutex::new(ShardInner {
                table: HashMap::new(),
                recency: RecencyList::new(),
                size: 0,
            }),
        }
    }

    /// Inserts or updates the entry for `key`, then evicts from the back
    /// until the shard is within its byte budget again.
    pub fn add(&self, key: KeyType, value: ValueType, flags: u32, cas: u64) {
        let mut inner = self.inner.lock();
        inner.store(key, value, flags, cas);
        inner.check_capacity(self.capacity);
    }

    /// Returns a copy of the record for `key` and refreshes its recency.
    pub fn get(&self, key: &[u8]) -> Result<Record> {
        let mut inner = self.inner.lock();
        let idx = *inner.table.get(key).ok_or(CacheError::NotFound)?;
        inner.recency.move_to_front(idx);
        Ok(inner.recency.get(idx).record.clone())
    }

    /// Removes the entry for `key`.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock();
        let idx = inner.table.remove(key).ok_or(CacheError::NotFound)?;
        let entry = inner.recency.remove(idx);
        inner.size -= entry.size();
        Ok(())
    }

    /// Compare-and-swap in a single critical section: the stored token is
    /// compared and the new record stored without releasing the lock, so no
    /// other writer can slip in between.
    pub fn compare_and_swap(
        &self,
        key: KeyType,
        value: ValueType,
        flags: u32,
        expected_cas: u64,
        cas: u64,
    ) -> Result<()> {
        let mut inner = self.inner.lock();
        let idx = *inner.table.get(&key[..]).ok_or(CacheError::NotFound)?;
        if inner.recency.get(idx).record.cas != expected_cas {
            return Err(CacheError::KeyExists);
        }
        inner.store(key, value, flags, cas);
        inner.check_capacity(self.capacity);
        Ok(())
    }

    pub fn capacity_bytes(&self) -> u64 {
        self.capacity
    }

    pub fn size_bytes(&self) -> u64 {
        self.inner.lock().size
    }

    pub fn len(&self) -> usize {
        self.inner.lock().table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys ordered most to least recently used.
    #[cfg(test)]
    pub(crate) fn keys_by_recency(&self) -> Vec<KeyType> {
        let inner = self.inner.lock();
        inner.recency.iter().map(|e| e.key.clone()).collect()
    }

    /// Asserts the shard invariants: size accounting, capacity bound and
    /// the table/recency bijection.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let inner = self.inner.lock();
        let accounted: u64 = inner.recency.iter().map(Entry::size).sum();
        assert_eq!(inner.size, accounted, "size_bytes out of sync");
        assert!(inner.size <= self.capacity, "shard over capacity");
        assert_eq!(inner.table.len(), inner.recency.len(), "table/recency drift");
        for entry in inner.recency.iter() {
            let idx = inner.table.get(&entry.key[..]);
            assert!(idx.is_some(), "recency entry missing from table");
            assert_eq!(
                inner.recency.get(*idx.unwrap()).key,
                entry.key,
                "table points at wrong slot"
            );
        }
    }
}

impl ShardInner {
    fn store(&mut self, key: KeyType, value: ValueType, flags: u32, cas: u64) {
        if let Some(&idx) = self.table.get(&key[..]) {
            let entry = self.recency.get_mut(idx);
            let old_size = entry.size();
            entry.record = Record::new(value, flags, cas);
            let new_size = entry.size();
            self.size -= old_size;
            self.size += new_size;
            self.recency.move_to_front(idx);
        } else {
            let entry = Entry {
                key: key.clone(),
                record: Record::new(value, flags, cas),
            };
            self.size += entry.size();
            let idx = self.recency.push_front(entry);
            self.table.insert(key, idx);
        }
    }

    /// Evicts least recently used entries while over budget. An entry
    /// larger than the whole budget evicts itself right after insertion,
    /// which leaves the shard empty but consistent.
    fn check_capacity(&mut self, capacity: u64) {
        while self.size > capacity {
            let idx = match self.recency.back() {
                Some(idx) => idx,
                None => {
                    warn!("want to evict but the recency list is empty");
                    break;
                }
            };
            let entry = self.recency.remove(idx);
            self.table.remove(&entry.key[..]);
            self.size -= entry.size();
        }
    }
}
