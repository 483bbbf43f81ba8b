/*!
 * Lock-Free Scheduler Statistics
 * Uses atomic counters so stats can be read without disabling interrupts
 */

use super::types::{SchedulerKind, SchedulerStats};
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic scheduler statistics for lock-free updates
///
/// # Performance
/// - Cache-line aligned to prevent false sharing
/// - All operations use relaxed ordering for maximum performance
/// - Read-only snapshot requires no synchronization
#[repr(C, align(64))]
pub struct AtomicSchedulerStats {
    kind: SchedulerKind,
    queues_created: AtomicU64,
    waits: AtomicU64,
    acquisitions: AtomicU64,
    selections: AtomicU64,
    empty_selections: AtomicU64,
    lottery_draws: AtomicU64,
    cancellations: AtomicU64,
    priority_changes: AtomicU64,
    donation_passes: AtomicU64,
    nodes_visited: AtomicU64,
    cycles_detected: AtomicU64,
}

macro_rules! counter {
    ($($name:ident => $field:ident),* $(,)?) => {
        $(
            #[inline(always)]
            pub fn $name(&self) {
                self.$field.fetch_add(1, Ordering::Relaxed);
            }
        )*
    };
}

impl AtomicSchedulerStats {
    /// Create new atomic stats
    #[inline]
    pub fn new(kind: SchedulerKind) -> Self {
        Self {
            kind,
            queues_created: AtomicU64::new(0),
            waits: AtomicU64::new(0),
            acquisitions: AtomicU64::new(0),
            selections: AtomicU64::new(0),
            empty_selections: AtomicU64::new(0),
            lottery_draws: AtomicU64::new(0),
            cancellations: AtomicU64::new(0),
            priority_changes: AtomicU64::new(0),
            donation_passes: AtomicU64::new(0),
            nodes_visited: AtomicU64::new(0),
            cycles_detected: AtomicU64::new(0),
        }
    }

    counter! {
        inc_queues_created => queues_created,
        inc_waits => waits,
        inc_acquisitions => acquisitions,
        inc_selections => selections,
        inc_empty_selections => empty_selections,
        inc_lottery_draws => lottery_draws,
        inc_cancellations => cancellations,
        inc_priority_changes => priority_changes,
        inc_donation_passes => donation_passes,
        inc_nodes_visited => nodes_visited,
        inc_cycles_detected => cycles_detected,
    }

    /// Get snapshot of current stats
    ///
    /// # Note
    /// Counter values may not be perfectly consistent with each other due to concurrent updates,
    /// but each individual value is accurate. This is acceptable for monitoring.
    #[inline]
    pub fn snapshot(&self) -> SchedulerStats {
        SchedulerStats {
            kind: self.kind,
            queues_created: self.queues_created.load(Ordering::Relaxed),
            waits: self.waits.load(Ordering::Relaxed),
            acquisitions: self.acquisitions.load(Ordering::Relaxed),
            selections: self.selections.load(Ordering::Relaxed),
            empty_selections: self.empty_selections.load(Ordering::Relaxed),
            lottery_draws: self.lottery_draws.load(Ordering::Relaxed),
            cancellations: self.cancellations.load(Ordering::Relaxed),
            priority_changes: self.priority_changes.load(Ordering::Relaxed),
            donation_passes: self.donation_passes.load(Ordering::Relaxed),
            nodes_visited: self.nodes_visited.load(Ordering::Relaxed),
            cycles_detected: self.cycles_detected.load(Ordering::Relaxed),
        }
    }
}
