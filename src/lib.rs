//! # Chained Hash Map
//!
//! A Rust implementation of a hash table using separate chaining.
//!
//! This crate provides two hash map implementations:
//!
//! - `ChainedHashMap`: a single-threaded table with a fixed bucket array
//!   (default 11 buckets, prime) and optional load-factor-driven growth
//! - `ConcurrentChainedMap`: a thread-safe variant using one lock per bucket
//!
//! Every operation funnels through a single index function,
//! `hash(key) mod capacity`; colliding keys share a bucket and are kept in
//! insertion order, so lookups degrade linearly with chain length rather
//! than failing. The bucket array never grows unless a load factor threshold
//! is explicitly set, which makes the table's memory footprint and iteration
//! order fully predictable.
//!
//! ## Basic Usage
//!
//! ```rust
//! use chainmap::ChainedHashMap;
//!
//! // Create a new table with the default 11 buckets
//! let mut map = ChainedHashMap::new();
//!
//! // Insert values
//! map.insert("apple".to_string(), 1);
//! map.insert("banana".to_string(), 2);
//!
//! // Retrieve values
//! assert_eq!(map.get("apple"), Some(&1));
//!
//! // Updating returns the previous value
//! assert_eq!(map.insert("apple".to_string(), 10), Some(1));
//! assert_eq!(map.get("apple"), Some(&10));
//!
//! // Remove values
//! assert_eq!(map.remove("apple"), Some(10));
//! assert_eq!(map.get("apple"), None);
//! ```
//!
//! ## Snapshot Views
//!
//! The view operations return owned collections fixed at call time, never
//! live references into the table:
//!
//! ```rust
//! use chainmap::ChainedHashMap;
//!
//! let mut map = ChainedHashMap::new();
//! map.insert("a", 1);
//! map.insert("b", 2);
//!
//! let keys = map.key_set();
//! map.insert("c", 3);
//!
//! // The snapshot is unaffected by the later insertion
//! assert_eq!(keys.len(), 2);
//! assert_eq!(map.len(), 3);
//! ```
//!
//! ## Concurrent Usage
//!
//! ```rust
//! use chainmap::ConcurrentChainedMap;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let map = Arc::new(ConcurrentChainedMap::new());
//!
//! let map1 = Arc::clone(&map);
//! let map2 = Arc::clone(&map);
//!
//! let t1 = thread::spawn(move || {
//!     for i in 0..100 {
//!         map1.insert(format!("key-{}", i), i);
//!     }
//! });
//!
//! let t2 = thread::spawn(move || {
//!     for i in 100..200 {
//!         map2.insert(format!("key-{}", i), i);
//!     }
//! });
//!
//! t1.join().unwrap();
//! t2.join().unwrap();
//!
//! // Per-bucket locking never drops an operation, so the count is exact
//! assert_eq!(map.len(), 200);
//! ```

/// Module implementing the single-threaded separate-chaining hash map
mod chained_map;
/// Module implementing a thread-safe chained map with per-bucket locking
mod concurrent_chained_map;
/// Utility functions and traits for the chained maps
mod utils;

pub use chained_map::{ChainedHashMap, InvalidCapacity, Iter};
pub use concurrent_chained_map::ConcurrentChainedMap;
pub use utils::ChainMetrics;
