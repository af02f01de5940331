//! Utility functions and traits for the chained map implementations

use crate::ChainedHashMap;
use std::hash::Hash;

/// Extension trait providing chain-shape diagnostics for a chained table
pub trait ChainMetrics {
    /// Returns the length of the longest chain in the table
    fn longest_chain(&self) -> usize;

    /// Returns the mean chain length over all buckets
    fn average_chain_length(&self) -> f64;

    /// Returns the number of empty buckets
    fn empty_buckets(&self) -> usize;
}

impl<K, V> ChainMetrics for ChainedHashMap<K, V> {
    fn longest_chain(&self) -> usize {
        self.chain_lengths().into_iter().max().unwrap_or(0)
    }

    #[allow(clippy::cast_precision_loss)]
    fn average_chain_length(&self) -> f64 {
        let lengths = self.chain_lengths();
        if lengths.is_empty() {
            return 0.0;
        }
        let total: usize = lengths.iter().sum();
        total as f64 / lengths.len() as f64
    }

    fn empty_buckets(&self) -> usize {
        self.chain_lengths().into_iter().filter(|&length| length == 0).count()
    }
}

/// Creates a `ChainedHashMap` with the default capacity from an iterator of
/// key-value pairs
#[allow(dead_code)]
pub fn from_iter<K, V, I>(iter: I) -> ChainedHashMap<K, V>
where
    K: Eq + Hash,
    I: IntoIterator<Item = (K, V)>,
{
    let mut map = ChainedHashMap::new();
    map.extend(iter);
    map
}
