use std::borrow::Borrow;
use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use crate::chained_map::InvalidCapacity;

/// Number of buckets allocated by [`ConcurrentChainedMap::new`]
const DEFAULT_CAPACITY: usize = 11;

/// A key-value pair stored in a chain
#[derive(Debug)]
struct Entry<K, V> {
    /// The key stored in the entry
    key: K,
    /// The value associated with the key
    value: V,
}

/// A thread-safe separate-chaining hash map using per-bucket locking.
///
/// Each bucket carries its own mutex, so operations on different chains
/// proceed in parallel. The bucket array itself sits behind a `RwLock`:
/// ordinary operations take the read lock plus exactly one bucket mutex,
/// while capacity changes (rehash, clear) take the write lock, which excludes
/// every other operation. No code path ever holds two bucket mutexes at
/// once, so there is no lock ordering to get wrong.
///
/// Unlike lock-free designs, chaining never fails an insert: every operation
/// runs to completion, and counts are exact under any interleaving.
#[derive(Debug)]
pub struct ConcurrentChainedMap<K, V> {
    /// The bucket array; per-bucket mutexes serialize chain access, the
    /// outer lock serializes capacity changes against everything else
    buckets: RwLock<Vec<Mutex<Vec<Entry<K, V>>>>>,
    /// Current number of entries across all chains
    size: AtomicUsize,
    /// Load factor percentage above which insertion rehashes into a larger
    /// bucket array; 0 disables growth (the default)
    load_factor_threshold: AtomicUsize,
}

impl<K, V> ConcurrentChainedMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a map with the default capacity of 11 buckets
    #[must_use]
    pub fn new() -> Self {
        Self::with_buckets(DEFAULT_CAPACITY)
    }

    /// Creates a map with the specified number of buckets.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCapacity`] if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Result<Self, InvalidCapacity> {
        if capacity == 0 {
            return Err(InvalidCapacity);
        }
        Ok(Self::with_buckets(capacity))
    }

    /// Allocates the bucket array; `capacity` has already been validated
    fn with_buckets(capacity: usize) -> Self {
        let mut buckets = Vec::with_capacity(capacity);
        buckets.resize_with(capacity, || Mutex::new(Vec::new()));

        Self {
            buckets: RwLock::new(buckets),
            size: AtomicUsize::new(0),
            load_factor_threshold: AtomicUsize::new(0),
        }
    }

    /// Computes the hash for a key
    fn hash_key<Q: ?Sized + Hash>(key: &Q) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    /// Maps a hash to a bucket index in `[0, capacity)`
    #[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]
    fn slot_for(hash: u64, capacity: usize) -> usize {
        // capacity is at least 1 by construction, so the remainder is defined
        (hash % capacity as u64) as usize
    }

    /// Inserts a key-value pair into the map.
    ///
    /// Returns the previous value if the key was already present; the entry
    /// keeps its position in its chain.
    ///
    /// # Panics
    ///
    /// Panics if a lock was poisoned by a panicking thread.
    #[allow(clippy::expect_used)]
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        if self.should_grow() {
            self.grow();
        }

        let guard = self.buckets.read().expect("bucket array lock poisoned");
        let index = Self::slot_for(Self::hash_key(&key), guard.len());
        let Some(bucket) = guard.get(index) else { return None };
        let mut chain = bucket.lock().expect("bucket lock poisoned");

        if let Some(entry) = chain.iter_mut().find(|entry| entry.key == key) {
            return Some(mem::replace(&mut entry.value, value));
        }

        chain.push(Entry { key, value });
        self.size.fetch_add(1, Ordering::SeqCst);
        None
    }

    /// Retrieves a clone of the value for a given key.
    ///
    /// # Panics
    ///
    /// Panics if a lock was poisoned by a panicking thread.
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let guard = self.buckets.read().expect("bucket array lock poisoned");
        let index = Self::slot_for(Self::hash_key(key), guard.len());
        let chain = guard.get(index)?.lock().expect("bucket lock poisoned");
        chain.iter().find(|entry| entry.key.borrow() == key).map(|entry| entry.value.clone())
    }

    /// Returns true if the map contains an entry for the given key
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Returns true if any entry holds a value equal to `value`.
    ///
    /// Scans every chain in bucket order, locking one bucket at a time, so
    /// the answer reflects no single instant when mutations run concurrently.
    ///
    /// # Panics
    ///
    /// Panics if a lock was poisoned by a panicking thread.
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        let guard = self.buckets.read().expect("bucket array lock poisoned");
        for bucket in guard.iter() {
            let chain = bucket.lock().expect("bucket lock poisoned");
            if chain.iter().any(|entry| entry.value == *value) {
                return true;
            }
        }
        false
    }

    /// Removes the entry for a key, returning its value. The remaining
    /// entries in the chain keep their relative order.
    ///
    /// # Panics
    ///
    /// Panics if a lock was poisoned by a panicking thread.
    #[allow(clippy::expect_used)]
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let guard = self.buckets.read().expect("bucket array lock poisoned");
        let index = Self::slot_for(Self::hash_key(key), guard.len());
        let mut chain = guard.get(index)?.lock().expect("bucket lock poisoned");
        let position = chain.iter().position(|entry| entry.key.borrow() == key)?;
        let entry = chain.remove(position);
        self.size.fetch_sub(1, Ordering::SeqCst);
        Some(entry.value)
    }

    /// Returns the number of entries in the map
    #[must_use]
    pub fn len(&self) -> usize {
        self.size.load(Ordering::Acquire)
    }

    /// Returns true if the map contains no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of buckets in the map.
    ///
    /// # Panics
    ///
    /// Panics if the bucket array lock was poisoned by a panicking thread.
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buckets.read().expect("bucket array lock poisoned").len()
    }

    /// Returns the current load factor of the map.
    ///
    /// # Panics
    ///
    /// Panics if the bucket array lock was poisoned by a panicking thread.
    #[allow(clippy::arithmetic_side_effects, clippy::cast_precision_loss)]
    #[must_use]
    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / self.capacity() as f64
    }

    /// Enables rehash-on-growth at `threshold` percent load, clamped to
    /// 1-95. Growth is off by default; the capacity then stays fixed for the
    /// lifetime of the map.
    pub fn set_load_factor_threshold(&self, threshold: usize) {
        self.load_factor_threshold.store(threshold.clamp(1, 95), Ordering::Relaxed);
    }

    /// Removes every entry; the bucket array keeps its capacity.
    ///
    /// Takes the write lock, so the clear is atomic with respect to every
    /// other operation.
    ///
    /// # Panics
    ///
    /// Panics if a lock was poisoned by a panicking thread.
    #[allow(clippy::expect_used)]
    pub fn clear(&self) {
        let mut guard = self.buckets.write().expect("bucket array lock poisoned");
        for bucket in guard.iter_mut() {
            bucket.get_mut().expect("bucket lock poisoned").clear();
        }
        self.size.store(0, Ordering::SeqCst);
    }

    /// Builds an owned snapshot of the key-value pairs, locking one bucket
    /// at a time in bucket order.
    ///
    /// The result is independent of the map; concurrent mutation of buckets
    /// not yet visited can be reflected, but entries already copied are not.
    ///
    /// # Panics
    ///
    /// Panics if a lock was poisoned by a panicking thread.
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn snapshot(&self) -> Vec<(K, V)> {
        let guard = self.buckets.read().expect("bucket array lock poisoned");
        let mut pairs = Vec::with_capacity(self.len());
        for bucket in guard.iter() {
            let chain = bucket.lock().expect("bucket lock poisoned");
            for entry in chain.iter() {
                pairs.push((entry.key.clone(), entry.value.clone()));
            }
        }
        pairs
    }

    /// Builds an owned snapshot of the keys currently in the map
    #[must_use]
    pub fn key_set(&self) -> HashSet<K> {
        self.snapshot().into_iter().map(|(key, _)| key).collect()
    }

    /// Builds an owned snapshot of the values, duplicates preserved
    #[must_use]
    pub fn values(&self) -> Vec<V> {
        self.snapshot().into_iter().map(|(_, value)| value).collect()
    }

    /// Builds an owned snapshot of the key-value pairs as a set
    #[must_use]
    pub fn entry_set(&self) -> HashSet<(K, V)>
    where
        V: Eq + Hash,
    {
        self.snapshot().into_iter().collect()
    }

    /// Returns true if an insertion should trigger a rehash
    #[allow(clippy::expect_used)]
    fn should_grow(&self) -> bool {
        let threshold = self.load_factor_threshold.load(Ordering::Relaxed);
        if threshold == 0 {
            return false;
        }
        let capacity = self.buckets.read().expect("bucket array lock poisoned").len();
        self.len().saturating_mul(100) >= threshold.saturating_mul(capacity)
    }

    /// Redistributes every entry into a bucket array of roughly twice the
    /// capacity, swapping the array under the write lock
    #[allow(clippy::expect_used)]
    fn grow(&self) {
        // If the write lock is contended, another thread is already resizing
        let Ok(mut guard) = self.buckets.try_write() else { return };

        let capacity = guard.len();
        let threshold = self.load_factor_threshold.load(Ordering::Relaxed);
        // Re-check under the lock; a concurrent grow may have beaten us here
        if threshold == 0 || self.len().saturating_mul(100) < threshold.saturating_mul(capacity) {
            return;
        }

        let new_capacity = capacity.saturating_mul(2).saturating_add(1);
        let mut new_buckets: Vec<Mutex<Vec<Entry<K, V>>>> = Vec::with_capacity(new_capacity);
        new_buckets.resize_with(new_capacity, || Mutex::new(Vec::new()));

        for bucket in guard.iter_mut() {
            let chain = bucket.get_mut().expect("bucket lock poisoned");
            for entry in chain.drain(..) {
                let index = Self::slot_for(Self::hash_key(&entry.key), new_capacity);
                if let Some(slot) = new_buckets.get_mut(index) {
                    slot.get_mut().expect("fresh bucket lock poisoned").push(entry);
                }
            }
        }

        *guard = new_buckets;
    }
}

impl<K, V> Default for ConcurrentChainedMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_insert_and_get() {
        let map = ConcurrentChainedMap::new();
        assert_eq!(map.insert("key1".to_string(), 1), None);
        assert_eq!(map.insert("key2".to_string(), 2), None);
        assert_eq!(map.insert("key3".to_string(), 3), None);

        assert_eq!(map.get("key1"), Some(1));
        assert_eq!(map.get("key2"), Some(2));
        assert_eq!(map.get("key3"), Some(3));
        assert_eq!(map.get("key4"), None);
    }

    #[test]
    fn test_update() {
        let map = ConcurrentChainedMap::new();
        assert_eq!(map.insert("key1".to_string(), 1), None);
        assert_eq!(map.insert("key1".to_string(), 10), Some(1));
        assert_eq!(map.get("key1"), Some(10));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_remove() {
        let map = ConcurrentChainedMap::new();
        map.insert("key1".to_string(), 1);
        map.insert("key2".to_string(), 2);

        assert_eq!(map.remove("key1"), Some(1));
        assert_eq!(map.get("key1"), None);
        assert_eq!(map.get("key2"), Some(2));
        assert_eq!(map.remove("key1"), None);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(ConcurrentChainedMap::<String, i32>::with_capacity(0).is_err());
    }

    #[test]
    fn test_clear_and_views() {
        let map = ConcurrentChainedMap::with_capacity(3).unwrap();
        for i in 0..10 {
            map.insert(i, i * 2);
        }

        let entries = map.entry_set();
        assert_eq!(entries.len(), 10);
        assert!(entries.contains(&(4, 8)));

        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.capacity(), 3);
        assert!(map.key_set().is_empty());
        // The snapshot taken before the clear is unaffected
        assert_eq!(entries.len(), 10);
    }

    #[test]
    fn test_concurrent_inserts_are_exact() {
        let map = Arc::new(ConcurrentChainedMap::with_capacity(13).unwrap());
        let mut handles = vec![];

        // 8 threads, each inserting 100 distinct keys
        for t in 0..8 {
            let map_clone = Arc::clone(&map);
            handles.push(thread::spawn(move || {
                for i in 0..100 {
                    map_clone.insert(format!("key-{t}-{i}"), t * 100 + i);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        // Chaining never drops an insert, so the count is exact
        assert_eq!(map.len(), 800);
        for t in 0..8 {
            for i in 0..100 {
                assert_eq!(map.get(&format!("key-{t}-{i}")), Some(t * 100 + i));
            }
        }
    }

    #[test]
    fn test_concurrent_reads_writes_and_removes() {
        let map = Arc::new(ConcurrentChainedMap::with_capacity(31).unwrap());

        for i in 0..100 {
            map.insert(format!("key-{i}"), i);
        }

        let mut writer_handles = vec![];
        for t in 0..4 {
            let map_clone = Arc::clone(&map);
            writer_handles.push(thread::spawn(move || {
                for i in 0..50 {
                    map_clone.insert(format!("key-writer-{t}-{i}"), t * 100 + i);
                }
            }));
        }

        let mut reader_handles = vec![];
        for _ in 0..4 {
            let map_clone = Arc::clone(&map);
            reader_handles.push(thread::spawn(move || {
                let mut read_count = 0;
                for i in 0..100 {
                    if map_clone.get(&format!("key-{i}")).is_some() {
                        read_count += 1;
                    }
                }
                read_count
            }));
        }

        let mut remover_handles = vec![];
        for t in 0..2 {
            let map_clone = Arc::clone(&map);
            remover_handles.push(thread::spawn(move || {
                let mut remove_count = 0;
                for i in (t * 50)..((t + 1) * 50) {
                    if map_clone.remove(&format!("key-{i}")).is_some() {
                        remove_count += 1;
                    }
                }
                remove_count
            }));
        }

        for handle in writer_handles {
            handle.join().unwrap();
        }
        let reads: Vec<usize> = reader_handles.into_iter().map(|h| h.join().unwrap()).collect();
        let removed: usize = remover_handles.into_iter().map(|h| h.join().unwrap()).sum();

        // Removers target disjoint preloaded keys, each exactly once
        assert_eq!(removed, 100);
        // Each reader ran against a map that started with all 100 keys
        for reads in reads {
            assert!(reads <= 100);
        }

        // 100 preloaded + 200 written - 100 removed, exactly
        assert_eq!(map.len(), 200);
    }

    #[test]
    fn test_concurrent_growth_preserves_entries() {
        let map = Arc::new(ConcurrentChainedMap::with_capacity(3).unwrap());
        map.set_load_factor_threshold(75);

        let mut handles = vec![];
        for t in 0..4 {
            let map_clone = Arc::clone(&map);
            handles.push(thread::spawn(move || {
                for i in 0..200 {
                    map_clone.insert(t * 1000 + i, i);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(map.len(), 800);
        assert!(map.capacity() > 3);
        for t in 0..4 {
            for i in 0..200 {
                assert_eq!(map.get(&(t * 1000 + i)), Some(i));
            }
        }
    }
}
