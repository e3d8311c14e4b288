use super::traits::EvictionPolicy;
use crate::errors::Result;
use crate::store::CacheStore;

/// What a retention pass removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub evicted: usize,
    pub remaining_bytes: u64,
}

/// Remove entries until the policy stops nominating victims.
///
/// Meant to run between builds, outside any engine invocation.
pub fn sweep(store: &CacheStore, policy: &dyn EvictionPolicy) -> Result<SweepReport> {
    let mut report = SweepReport::default();

    while let Some(victim) = policy.next_eviction() {
        let removed = store.remove(&victim)?;
        policy.on_remove(&victim);
        if removed {
            report.evicted += 1;
            tracing::debug!(identity = %victim.short(), "Evicted cache entry");
        }
    }

    report.remaining_bytes = policy.tracked_bytes();
    Ok(report)
}
