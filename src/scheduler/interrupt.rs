/*!
 * Interrupt Guard
 * Scoped disable/restore of scheduling, the atomicity every operation needs
 *
 * Holding an [`InterruptGuard`] plays the role of running with interrupts
 * disabled: no other OS thread can touch the scheduler until the outermost
 * guard is dropped. Disabling nests on the same OS thread, the way saved
 * interrupt status does.
 */

use super::policy::SelectionPolicy;
use super::state::SchedulerState;
use super::types::{QueueSnapshot, ThreadSnapshot};
use crate::core::errors::SchedulerResult;
use crate::core::types::{EffectivePriority, Priority, QueueId, ThreadId};
use parking_lot::ReentrantMutexGuard;
use std::cell::RefCell;

/// RAII guard: scheduling is atomic while it lives, restored on drop
///
/// Every queue and thread operation is a method here, so none of them can
/// run without the guarantee. Not `Send`: it must be restored on the OS
/// thread that disabled.
#[must_use = "scheduling is restored as soon as the guard is dropped"]
pub struct InterruptGuard<'a> {
    state: ReentrantMutexGuard<'a, RefCell<SchedulerState>>,
}

impl<'a> InterruptGuard<'a> {
    pub(super) fn new(state: ReentrantMutexGuard<'a, RefCell<SchedulerState>>) -> Self {
        Self { state }
    }

    // The borrow lasts for one operation only, so nested guards on the same
    // OS thread never overlap a mutable borrow.
    #[inline]
    fn with<R>(&self, f: impl FnOnce(&mut SchedulerState) -> R) -> R {
        f(&mut self.state.borrow_mut())
    }

    pub fn new_queue(&self, transfer_priority: bool) -> QueueId {
        self.with(|s| s.new_queue(transfer_priority))
    }

    pub fn new_queue_with_policy(
        &self,
        transfer_priority: bool,
        policy: SelectionPolicy,
    ) -> QueueId {
        self.with(|s| s.new_queue_with_policy(transfer_priority, policy))
    }

    /// Register `thread` as blocked on `queue` and donate to its owner
    pub fn wait_for_access(&self, queue: QueueId, thread: ThreadId) -> SchedulerResult<()> {
        self.with(|s| s.wait_for_access(queue, thread))
    }

    /// Assign ownership of `queue` to `thread` directly
    pub fn acquire(&self, queue: QueueId, thread: ThreadId) -> SchedulerResult<()> {
        self.with(|s| s.acquire(queue, thread))
    }

    /// Select and install the next owner of `queue`
    pub fn next_thread(&self, queue: QueueId) -> SchedulerResult<Option<ThreadId>> {
        self.with(|s| s.next_thread(queue))
    }

    pub fn peek(&self, queue: QueueId) -> SchedulerResult<Option<ThreadId>> {
        self.with(|s| s.peek(queue))
    }

    pub fn cancel_wait(&self, queue: QueueId, thread: ThreadId) -> SchedulerResult<bool> {
        self.with(|s| s.cancel_wait(queue, thread))
    }

    pub fn retire_thread(&self, thread: ThreadId) -> bool {
        self.with(|s| s.retire_thread(thread))
    }

    pub fn get_priority(&self, thread: ThreadId) -> Priority {
        self.with(|s| s.get_priority(thread))
    }

    pub fn get_effective_priority(&self, thread: ThreadId) -> EffectivePriority {
        self.with(|s| s.get_effective_priority(thread))
    }

    pub fn set_priority(&self, thread: ThreadId, priority: Priority) -> SchedulerResult<()> {
        self.with(|s| s.set_priority(thread, priority))
    }

    pub fn increase_priority(&self, thread: ThreadId) -> bool {
        self.with(|s| s.increase_priority(thread))
    }

    pub fn decrease_priority(&self, thread: ThreadId) -> bool {
        self.with(|s| s.decrease_priority(thread))
    }

    pub fn owner(&self, queue: QueueId) -> SchedulerResult<Option<ThreadId>> {
        self.with(|s| s.owner(queue))
    }

    pub fn waiters(&self, queue: QueueId) -> SchedulerResult<Vec<ThreadId>> {
        self.with(|s| s.waiters(queue))
    }

    pub fn policy(&self, queue: QueueId) -> SchedulerResult<SelectionPolicy> {
        self.with(|s| s.policy(queue))
    }

    pub fn transfers_priority(&self, queue: QueueId) -> SchedulerResult<bool> {
        self.with(|s| s.transfers_priority(queue))
    }

    pub fn thread_count(&self) -> usize {
        self.with(|s| s.thread_count())
    }

    pub fn queue_count(&self) -> usize {
        self.with(|s| s.queue_count())
    }

    pub fn thread_snapshot(&self, thread: ThreadId) -> Option<ThreadSnapshot> {
        self.with(|s| s.thread_snapshot(thread))
    }

    pub fn thread_snapshots(&self) -> Vec<ThreadSnapshot> {
        self.with(|s| s.thread_snapshots())
    }

    pub fn queue_snapshot(&self, queue: QueueId) -> SchedulerResult<QueueSnapshot> {
        self.with(|s| s.queue_snapshot(queue))
    }

    pub fn check_invariants(&self) -> SchedulerResult<()> {
        self.with(|s| s.check_invariants())
    }
}
