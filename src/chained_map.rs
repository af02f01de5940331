use std::{
    borrow::Borrow,
    collections::{HashMap, HashSet, hash_map::DefaultHasher},
    error::Error,
    fmt,
    hash::{BuildHasher, Hash, Hasher},
    mem,
};

/// Number of buckets allocated by [`ChainedHashMap::new`]; prime to reduce
/// clustering under poorly distributed hash functions.
const DEFAULT_CAPACITY: usize = 11;

/// A key-value pair stored in a chain
#[derive(Debug, Clone)]
struct Entry<K, V> {
    /// The key in the key-value pair
    key: K,
    /// The value associated with the key
    value: V,
}

/// Error returned when a table is constructed with zero buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidCapacity;

impl fmt::Display for InvalidCapacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("table capacity must be at least 1")
    }
}

impl Error for InvalidCapacity {}

/// A hash map using separate chaining for collision resolution.
///
/// The table is a fixed-length array of buckets, each bucket an
/// insertion-ordered chain of entries. Every operation funnels through a
/// single index function, `hash(key) mod capacity`, so two tables with
/// different capacities distribute the same keys differently while exposing
/// identical contents.
///
/// The bucket array is allocated once at construction and never grows on its
/// own. Growth is opt-in: see [`set_load_factor_threshold`].
///
/// Keys must not be mutated through shared state after insertion; an entry is
/// located by re-hashing its key, so a key whose hash changes becomes
/// unreachable.
///
/// Note: this implementation is not thread-safe. For concurrent access, use
/// `ConcurrentChainedMap`.
///
/// [`set_load_factor_threshold`]: ChainedHashMap::set_load_factor_threshold
#[derive(Debug, Clone)]
pub struct ChainedHashMap<K, V> {
    /// The buckets, each an insertion-ordered chain of entries
    buckets: Vec<Vec<Entry<K, V>>>,
    /// Current number of entries across all chains
    size: usize,
    /// Load factor percentage (1-95) above which the table rehashes into a
    /// larger bucket array; `None` keeps the capacity fixed
    load_factor_threshold: Option<usize>,
}

impl<K, V> ChainedHashMap<K, V> {
    /// Creates a table with the default capacity of 11 buckets
    #[must_use]
    pub fn new() -> Self {
        Self::with_buckets(DEFAULT_CAPACITY)
    }

    /// Creates a table with the specified number of buckets.
    ///
    /// A prime capacity gives the best spread when key hashes are poorly
    /// distributed.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCapacity`] if `capacity` is zero; the index function
    /// needs at least one bucket to map into.
    pub fn with_capacity(capacity: usize) -> Result<Self, InvalidCapacity> {
        if capacity == 0 {
            return Err(InvalidCapacity);
        }
        Ok(Self::with_buckets(capacity))
    }

    /// Allocates the bucket array; `capacity` has already been validated
    fn with_buckets(capacity: usize) -> Self {
        let mut buckets = Vec::with_capacity(capacity);
        buckets.resize_with(capacity, Vec::new);
        Self { buckets, size: 0, load_factor_threshold: None }
    }

    /// Returns the number of entries in the table
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns true if the table contains no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the number of buckets in the table
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the current load factor of the table
    #[must_use]
    #[allow(clippy::arithmetic_side_effects, clippy::cast_precision_loss)]
    pub fn load_factor(&self) -> f64 {
        self.size as f64 / self.buckets.len() as f64
    }

    /// Returns the length of every chain, in bucket order
    #[must_use]
    pub fn chain_lengths(&self) -> Vec<usize> {
        self.buckets.iter().map(Vec::len).collect()
    }

    /// Enables rehash-on-growth: once the load factor reaches `threshold`
    /// percent, the next insertion redistributes all entries into a bucket
    /// array of roughly twice the capacity. Clamped to 1-95. Growth is off by
    /// default, preserving a fixed capacity for the lifetime of the table.
    pub fn set_load_factor_threshold(&mut self, threshold: usize) {
        self.load_factor_threshold = Some(threshold.clamp(1, 95));
    }

    /// Removes every entry; the bucket array keeps its capacity
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.size = 0;
    }

    /// Returns an iterator over the key-value pairs, in bucket order and then
    /// insertion order within each bucket
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter { buckets: self.buckets.iter(), chain: [].iter() }
    }
}

impl<K, V> ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    /// Computes the hash for a key
    fn hash_key<Q: ?Sized + Hash>(key: &Q) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    /// Maps a hash to a bucket index in `[0, capacity)`.
    ///
    /// The hash is unsigned, so the remainder is already non-negative.
    #[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]
    fn slot_for(hash: u64, capacity: usize) -> usize {
        // capacity is at least 1 by construction, so the remainder is defined
        (hash % capacity as u64) as usize
    }

    /// Gets the bucket index for a key under the current capacity
    fn bucket_index<Q: ?Sized + Hash>(&self, key: &Q) -> usize {
        Self::slot_for(Self::hash_key(key), self.buckets.len())
    }

    /// Inserts a key-value pair into the table.
    ///
    /// If the key is already present, its value is replaced in place (the
    /// entry keeps its position in the chain) and the previous value is
    /// returned. Otherwise the entry is appended to its chain and `None` is
    /// returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if self.should_grow() {
            self.rehash(self.buckets.len().saturating_mul(2).saturating_add(1));
        }

        let index = self.bucket_index(&key);
        let Some(bucket) = self.buckets.get_mut(index) else { return None };

        if let Some(entry) = bucket.iter_mut().find(|entry| entry.key == key) {
            return Some(mem::replace(&mut entry.value, value));
        }

        bucket.push(Entry { key, value });
        self.size = self.size.saturating_add(1);
        None
    }

    /// Retrieves a reference to the value for a given key
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.bucket_index(key);
        self.buckets
            .get(index)?
            .iter()
            .find(|entry| entry.key.borrow() == key)
            .map(|entry| &entry.value)
    }

    /// Retrieves a mutable reference to the value for a given key
    #[must_use]
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.bucket_index(key);
        self.buckets
            .get_mut(index)?
            .iter_mut()
            .find(|entry| entry.key.borrow() == key)
            .map(|entry| &mut entry.value)
    }

    /// Returns true if the table contains an entry for the given key
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
    /// Scans every chain in bucket order; comparison uses the value type's
    /// `PartialEq`, the same relation used everywhere a value is compared.
    #[must_use]
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.iter().any(|(_, candidate)| candidate == value)
    }

    /// Removes the entry for a key, returning its value.
    ///
    /// The entry is detached from its chain; the remaining entries keep their
    /// relative order.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.bucket_index(key);
        let bucket = self.buckets.get_mut(index)?;
        let position = bucket.iter().position(|entry| entry.key.borrow() == key)?;
        let entry = bucket.remove(position);
        self.size = self.size.saturating_sub(1);
        Some(entry.value)
    }

    /// Builds an owned snapshot of the keys currently in the table.
    ///
    /// The set is independent of the table: later insertions and removals do
    /// not affect it, and it cannot be used to mutate the table.
    #[must_use]
    pub fn key_set(&self) -> HashSet<K>
    where
        K: Clone,
    {
        self.iter().map(|(key, _)| key.clone()).collect()
    }

    /// Builds an owned snapshot of the values, one per entry with duplicates
    /// preserved, in bucket order
    #[must_use]
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.iter().map(|(_, value)| value.clone()).collect()
    }

    /// Builds an owned snapshot of the key-value pairs currently in the table
    #[must_use]
    pub fn entry_set(&self) -> HashSet<(K, V)>
    where
        K: Clone,
        V: Clone + Eq + Hash,
    {
        self.iter().map(|(key, value)| (key.clone(), value.clone())).collect()
    }

    /// Returns true if an insertion should trigger a rehash
    fn should_grow(&self) -> bool {
        self.load_factor_threshold.is_some_and(|threshold| {
            self.size.saturating_mul(100) >= threshold.saturating_mul(self.buckets.len())
        })
    }

    /// Redistributes every entry into a fresh bucket array of `new_capacity`
    /// slots, recomputing each key's index under the new capacity
    fn rehash(&mut self, new_capacity: usize) {
        let new_capacity = new_capacity.max(1);
        let mut new_buckets: Vec<Vec<Entry<K, V>>> = Vec::with_capacity(new_capacity);
        new_buckets.resize_with(new_capacity, Vec::new);

        for bucket in &mut self.buckets {
            for entry in bucket.drain(..) {
                let index = Self::slot_for(Self::hash_key(&entry.key), new_capacity);
                if let Some(chain) = new_buckets.get_mut(index) {
                    chain.push(entry);
                }
            }
        }

        self.buckets = new_buckets;
    }
}

impl<K, V> Default for ChainedHashMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Extend<(K, V)> for ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    /// Applies `insert` for every pair in source order; on a key collision
    /// the later pair wins
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<'a, K, V> IntoIterator for &'a ChainedHashMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Two tables are equal when they hold the same key-value pairs, regardless
/// of capacity or insertion order
impl<K, V> PartialEq for ChainedHashMap<K, V>
where
    K: Eq + Hash,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.iter().all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K, V> Eq for ChainedHashMap<K, V>
where
    K: Eq + Hash,
    V: Eq,
{
}

/// A table compares equal to a standard `HashMap` holding the same pairs
impl<K, V, S> PartialEq<HashMap<K, V, S>> for ChainedHashMap<K, V>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &HashMap<K, V, S>) -> bool {
        self.size == other.len() && self.iter().all(|(key, value)| other.get(key) == Some(value))
    }
}

/// Concatenates the `key=value` form of every entry, in bucket order and then
/// insertion order within each bucket, with no separators
impl<K, V> fmt::Display for ChainedHashMap<K, V>
where
    K: fmt::Display,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self {
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

/// Iterator over the key-value pairs of the table
#[derive(Debug, Clone)]
pub struct Iter<'a, K, V> {
    /// Buckets not yet visited
    buckets: std::slice::Iter<'a, Vec<Entry<K, V>>>,
    /// Entries remaining in the chain currently being walked
    chain: std::slice::Iter<'a, Entry<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.chain.next() {
                return Some((&entry.key, &entry.value));
            }
            self.chain = self.buckets.next()?.iter();
        }
    }
}
