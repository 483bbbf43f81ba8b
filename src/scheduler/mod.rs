/*!
 * Donation Scheduler
 * Admission control for contended resources with priority donation
 *
 * A [`Scheduler`] owns the thread side-table and the resource queues.
 * Callers disable interrupts to get an [`InterruptGuard`], and perform
 * queue operations through it:
 *
 * ```rust
 * use donation_sched::{QueueFactory, Scheduler, SchedulerConfig, ThreadId};
 *
 * let scheduler = Scheduler::new(SchedulerConfig::priority());
 * let lock = scheduler.new_queue(true);
 * let (holder, waiter) = (ThreadId::new(1), ThreadId::new(2));
 *
 * let guard = scheduler.disable_interrupts();
 * guard.acquire(lock, holder).unwrap();
 * guard.set_priority(waiter, 6).unwrap();
 * guard.wait_for_access(lock, waiter).unwrap();
 * assert_eq!(guard.get_effective_priority(holder), 6);
 * assert_eq!(guard.next_thread(lock).unwrap(), Some(waiter));
 * ```
 */

mod atomic_stats;
mod donation;
mod interrupt;
mod policy;
mod queue;
mod state;
mod thread_state;
pub mod traits;
pub mod types;

pub use atomic_stats::AtomicSchedulerStats;
pub use interrupt::InterruptGuard;
pub use policy::SelectionPolicy;
pub use traits::{PriorityControl, QueueFactory, SchedulerApi};
pub use types::{
    apply_priority_op, PriorityOp, QueueSnapshot, SchedulerConfig, SchedulerKind, SchedulerStats,
    ThreadSnapshot,
};

use crate::core::errors::SchedulerResult;
use crate::core::limits::PriorityBounds;
use crate::core::types::{EffectivePriority, Priority, QueueId, ThreadId};
use parking_lot::ReentrantMutex;
use state::SchedulerState;
use std::cell::RefCell;
use std::sync::Arc;
use tracing::info;

/// Scheduler facade
///
/// Cheap to clone; clones share the same state.
pub struct Scheduler {
    state: Arc<ReentrantMutex<RefCell<SchedulerState>>>,

    // Statistics - lock-free atomics, readable while interrupts are disabled elsewhere
    stats: Arc<AtomicSchedulerStats>,

    config: SchedulerConfig,
}

impl Scheduler {
    /// Create new scheduler with configuration
    pub fn new(config: SchedulerConfig) -> Self {
        info!(
            kind = config.kind.as_str(),
            seeded = config.seed.is_some(),
            "Scheduler initialized"
        );

        let stats = Arc::new(AtomicSchedulerStats::new(config.kind));
        let state = SchedulerState::new(config, Arc::clone(&stats));

        Self {
            state: Arc::new(ReentrantMutex::new(RefCell::new(state))),
            stats,
            config,
        }
    }

    /// Strict priority scheduler with default configuration
    pub fn priority() -> Self {
        Self::new(SchedulerConfig::priority())
    }

    /// Lottery scheduler with default configuration
    pub fn lottery() -> Self {
        Self::new(SchedulerConfig::lottery())
    }

    /// Make scheduling atomic until the returned guard is dropped
    ///
    /// Re-entrant on the same OS thread; other OS threads block here.
    pub fn disable_interrupts(&self) -> InterruptGuard<'_> {
        InterruptGuard::new(self.state.lock())
    }

    /// Run `f` with interrupts disabled, restoring afterwards
    pub fn with_interrupts_disabled<R>(&self, f: impl FnOnce(&InterruptGuard<'_>) -> R) -> R {
        let guard = self.disable_interrupts();
        f(&guard)
    }

    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    pub fn bounds(&self) -> PriorityBounds {
        self.config.kind.bounds()
    }

    /// Get scheduler statistics (lock-free snapshot)
    pub fn stats(&self) -> SchedulerStats {
        self.stats.snapshot()
    }
}

impl QueueFactory for Scheduler {
    fn new_queue(&self, transfer_priority: bool) -> QueueId {
        self.disable_interrupts().new_queue(transfer_priority)
    }

    fn new_queue_with_policy(&self, transfer_priority: bool, policy: SelectionPolicy) -> QueueId {
        self.disable_interrupts()
            .new_queue_with_policy(transfer_priority, policy)
    }
}

impl PriorityControl for Scheduler {
    fn get_priority(&self, thread: ThreadId) -> Priority {
        self.disable_interrupts().get_priority(thread)
    }

    fn get_effective_priority(&self, thread: ThreadId) -> EffectivePriority {
        self.disable_interrupts().get_effective_priority(thread)
    }

    fn set_priority(&self, thread: ThreadId, priority: Priority) -> SchedulerResult<()> {
        self.disable_interrupts().set_priority(thread, priority)
    }

    fn increase_priority(&self, thread: ThreadId) -> bool {
        self.disable_interrupts().increase_priority(thread)
    }

    fn decrease_priority(&self, thread: ThreadId) -> bool {
        self.disable_interrupts().decrease_priority(thread)
    }
}

impl Clone for Scheduler {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            stats: Arc::clone(&self.stats),
            config: self.config,
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}
