//! Per-identity memoization locks
//!
//! Concurrent invocations for the same identity are serialized: the first to
//! take the slot runs the work, the others wait on the slot. A waiter reuses
//! the leader's result only when it is the same unit of work and the result
//! was produced after the waiter arrived; any other waiter runs its own work
//! once the slot is free. Slots are dropped from the table as soon as nothing
//! references them, so a failed attempt never blocks later retries and the
//! table does not grow with the number of identities ever seen.

use crate::result::ExecutionResult;
use dashmap::DashMap;
use kiln_core::Identity;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

struct Memo {
    /// Value of `Slot::completed` once this result was stored
    epoch: u64,
    result: ExecutionResult,
}

#[derive(Default)]
struct Slot {
    completed: AtomicU64,
    results: Mutex<HashMap<String, Memo>>,
}

#[derive(Default)]
pub struct MemoTable {
    slots: DashMap<Identity, Arc<Slot>>,
}

impl MemoTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` for `owner` unless an invocation of the same owner and
    /// identity finished while this one was waiting, in which case that
    /// result is returned.
    pub fn run_exclusive<F>(&self, identity: &Identity, owner: &str, work: F) -> ExecutionResult
    where
        F: FnOnce() -> ExecutionResult,
    {
        // The shard lock is released before waiting on the slot
        let (slot, arrived) = {
            let entry = self.slots.entry(*identity).or_default();
            let arrived = entry.completed.load(Ordering::Acquire);
            (Arc::clone(&entry), arrived)
        };

        let result = {
            let mut results = slot.results.lock();
            let observed = results
                .get(owner)
                .filter(|memo| memo.epoch > arrived)
                .map(|memo| memo.result.clone());
            match observed {
                Some(result) => {
                    tracing::debug!(identity = %identity.short(), "Observed concurrent result");
                    result
                }
                None => {
                    let result = work();
                    let epoch = slot.completed.fetch_add(1, Ordering::AcqRel) + 1;
                    results.insert(
                        owner.to_string(),
                        Memo {
                            epoch,
                            result: result.clone(),
                        },
                    );
                    result
                }
            }
        };

        // Whoever releases the slot last sees the table as its only holder
        let released = Arc::downgrade(&slot);
        drop(slot);
        self.slots.remove_if(identity, |_, candidate| {
            std::ptr::eq(Arc::as_ptr(candidate), released.as_ptr())
                && Arc::strong_count(candidate) == 1
        });

        result
    }

    /// Number of identities currently being executed or awaited
    pub fn in_flight(&self) -> usize {
        self.slots.len()
    }
}
