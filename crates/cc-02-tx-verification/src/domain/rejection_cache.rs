//! # Rejected-Semantics Cache
//!
//! Remembers transaction ids that failed a context-free check, so a blob
//! relayed again by other peers is turned away before any curve arithmetic.
//!
//! ## Algorithm: Two-Generation Rotation
//!
//! Ids go into `current`. When `current` reaches capacity it becomes
//! `previous` and the old `previous` is discarded. A lookup checks both, so
//! an id survives at least one full generation and is forgotten after two
//! rotations. Memory stays bounded by twice the capacity.

use std::collections::HashSet;

use shared_types::Hash;

/// Default entries per generation.
pub const DEFAULT_CAPACITY: usize = 100_000;

#[derive(Debug)]
pub struct RejectionCache {
    current: HashSet<Hash>,
    previous: HashSet<Hash>,
    capacity: usize,
}

impl RejectionCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create with `capacity` entries per generation (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            current: HashSet::with_capacity(capacity.min(DEFAULT_CAPACITY) / 2),
            previous: HashSet::new(),
            capacity,
        }
    }

    /// Whether `tx_hash` was rejected within the last two generations.
    pub fn contains(&self, tx_hash: &Hash) -> bool {
        self.current.contains(tx_hash) || self.previous.contains(tx_hash)
    }

    /// Record a rejection, rotating first when the current generation is full.
    pub fn insert(&mut self, tx_hash: Hash) {
        if self.current.contains(&tx_hash) {
            return;
        }
        if self.current.len() >= self.capacity {
            self.rotate();
        }
        self.current.insert(tx_hash);
    }

    /// Start a new generation.
    pub fn rotate(&mut self) {
        let fresh = HashSet::with_capacity(self.current.len());
        self.previous = std::mem::replace(&mut self.current, fresh);
    }

    /// Total entries across both generations.
    pub fn len(&self) -> usize {
        self.current.len() + self.previous.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty() && self.previous.is_empty()
    }

    pub fn clear(&mut self) {
        self.current.clear();
        self.previous.clear();
    }

    pub fn stats(&self) -> RejectionCacheStats {
        RejectionCacheStats {
            current_entries: self.current.len(),
            previous_entries: self.previous.len(),
            capacity: self.capacity,
        }
    }
}

impl Default for RejectionCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics for monitoring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectionCacheStats {
    pub current_entries: usize,
    pub previous_entries: usize,
    pub capacity: usize,
}
