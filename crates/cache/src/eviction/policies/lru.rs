//! LRU (Least Recently Used) eviction policy implementation

use crate::eviction::traits::EvictionPolicy;
use dashmap::DashMap;
use kiln_core::Identity;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

/// Evicts the least recently used entries once the tracked size exceeds a budget
pub struct LruPolicy {
    /// Access order tracking, least recent at the front
    access_order: Mutex<VecDeque<Identity>>,
    sizes: DashMap<Identity, u64>,
    total_size: AtomicU64,
    max_bytes: u64,
}

impl LruPolicy {
    pub fn new(max_bytes: u64) -> Self {
        Self {
            access_order: Mutex::new(VecDeque::new()),
            sizes: DashMap::new(),
            total_size: AtomicU64::new(0),
            max_bytes,
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    fn touch(&self, key: &Identity) {
        let mut order = self.access_order.lock();
        order.retain(|k| k != key);
        order.push_back(*key);
    }
}

impl EvictionPolicy for LruPolicy {
    fn on_access(&self, key: &Identity, size: u64) {
        if !self.sizes.contains_key(key) {
            // Entries written by an earlier build are first seen on access
            self.on_insert(key, size);
            return;
        }
        self.touch(key);
    }

    fn on_insert(&self, key: &Identity, size: u64) {
        if let Some(previous) = self.sizes.insert(*key, size) {
            self.total_size.fetch_sub(previous, Ordering::AcqRel);
        }
        self.total_size.fetch_add(size, Ordering::AcqRel);
        self.touch(key);
    }

    fn on_remove(&self, key: &Identity) {
        if let Some((_, size)) = self.sizes.remove(key) {
            self.total_size.fetch_sub(size, Ordering::AcqRel);
        }
        self.access_order.lock().retain(|k| k != key);
    }

    fn next_eviction(&self) -> Option<Identity> {
        if self.tracked_bytes() <= self.max_bytes {
            return None;
        }

        self.access_order.lock().front().copied()
    }

    fn clear(&self) {
        self.sizes.clear();
        self.total_size.store(0, Ordering::Release);
        self.access_order.lock().clear();
    }

    fn tracked_bytes(&self) -> u64 {
        self.total_size.load(Ordering::Acquire)
    }
}
