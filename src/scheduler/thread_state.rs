/*!
 * Thread Scheduling State
 * Per-thread priority, donation result, ownership and wait membership
 */

use super::state::SchedulerState;
use super::types::{apply_priority_op, PriorityOp};
use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::types::{EffectivePriority, Priority, QueueId, ThreadId};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Scheduling attributes of one thread
#[derive(Debug, Clone)]
pub(crate) struct ThreadState {
    pub(super) priority: Priority,
    /// Never below `priority`; maintained by the donation engine
    pub(super) effective: EffectivePriority,
    /// Tie-break seniority inside `waiting_on`
    pub(super) wait_time: u64,
    pub(super) owned: BTreeSet<QueueId>,
    pub(super) waiting_on: Option<QueueId>,
}

impl ThreadState {
    pub(super) fn new(priority: Priority) -> Self {
        Self {
            priority,
            effective: EffectivePriority::from(priority),
            wait_time: 0,
            owned: BTreeSet::new(),
            waiting_on: None,
        }
    }
}

impl SchedulerState {
    pub fn get_priority(&mut self, thread: ThreadId) -> Priority {
        self.thread_mut(thread).priority
    }

    /// Effective priority, including everything donated to `thread`
    ///
    /// Donations are pushed eagerly on every graph change, so the stored
    /// value is always current.
    pub fn get_effective_priority(&mut self, thread: ThreadId) -> EffectivePriority {
        self.thread_mut(thread).effective
    }

    /// Set the base priority of `thread` and propagate the change
    ///
    /// Out-of-bounds values are rejected without touching the graph.
    pub fn set_priority(&mut self, thread: ThreadId, priority: Priority) -> SchedulerResult<()> {
        let bounds = self.bounds;
        let current = self
            .threads
            .get(&thread)
            .map_or(bounds.default, |state| state.priority);
        let Some(next) = apply_priority_op(current, PriorityOp::Set(priority), bounds) else {
            return Err(SchedulerError::InvalidPriority {
                priority,
                min: bounds.minimum,
                max: bounds.maximum,
            });
        };

        let state = self.thread_mut(thread);
        if state.priority == next {
            return Ok(());
        }
        let previous = std::mem::replace(&mut state.priority, next);

        self.stats.inc_priority_changes();
        debug!(%thread, previous, priority = next, "base priority changed");
        self.propagate_from(thread);
        Ok(())
    }

    /// Raise base priority by one; `false` at the configured maximum
    pub fn increase_priority(&mut self, thread: ThreadId) -> bool {
        self.adjust_priority(thread, PriorityOp::Boost)
    }

    /// Lower base priority by one; `false` at the configured minimum
    pub fn decrease_priority(&mut self, thread: ThreadId) -> bool {
        self.adjust_priority(thread, PriorityOp::Lower)
    }

    fn adjust_priority(&mut self, thread: ThreadId, op: PriorityOp) -> bool {
        let current = self.get_priority(thread);
        match apply_priority_op(current, op, self.bounds) {
            Some(next) => self.set_priority(thread, next).is_ok(),
            None => false,
        }
    }

    /// Block `thread` on `queue`
    ///
    /// A thread waits on at most one queue: an earlier wait is abandoned
    /// first. Waiting on a queue the thread owns gives that ownership up.
    pub fn wait_for_access(&mut self, queue: QueueId, thread: ThreadId) -> SchedulerResult<()> {
        self.queue(queue)?;
        self.stats.inc_waits();

        if let Some(previous) = self.thread_mut(thread).waiting_on {
            if previous != queue {
                warn!(%thread, from = %previous, to = %queue, "thread moved between wait queues");
            }
            self.detach_waiter(previous, thread);
            self.refresh_owner(previous);
        }

        if self.queue(queue)?.owner == Some(thread) {
            warn!(%thread, %queue, "owner waiting on its own queue, releasing ownership");
            self.queue_mut(queue)?.owner = None;
            self.thread_mut(thread).owned.remove(&queue);
            self.propagate_from(thread);
        }

        let entry = self
            .queues
            .get_mut(queue.index())
            .ok_or(SchedulerError::QueueNotFound(queue.as_u32()))?;
        for member in &entry.members {
            if let Some(waiter) = self.threads.get_mut(member) {
                waiter.wait_time += 1;
            }
        }
        entry.members.push(thread);

        let state = self.thread_mut(thread);
        state.wait_time = 0;
        state.waiting_on = Some(queue);

        debug!(%thread, %queue, "waiting for access");
        self.refresh_owner(queue);
        Ok(())
    }

    /// Make `thread` the owner of `queue`
    ///
    /// Any previous owner loses the queue and the donations that came
    /// with it.
    pub fn acquire(&mut self, queue: QueueId, thread: ThreadId) -> SchedulerResult<()> {
        self.queue(queue)?;
        self.stats.inc_acquisitions();

        let state = self.thread_mut(thread);
        if state.waiting_on == Some(queue) {
            state.waiting_on = None;
        }

        let entry = self.queue_mut(queue)?;
        entry.members.retain(|member| *member != thread);
        let previous = entry.owner.replace(thread);

        if let Some(previous) = previous.filter(|p| *p != thread) {
            if let Some(state) = self.threads.get_mut(&previous) {
                state.owned.remove(&queue);
            }
            debug!(%queue, from = %previous, to = %thread, "ownership transferred");
            self.propagate_from(previous);
        } else {
            debug!(%queue, %thread, "acquired");
        }

        self.thread_mut(thread).owned.insert(queue);
        self.propagate_from(thread);
        Ok(())
    }

    /// Drop all scheduling state of a finished thread
    ///
    /// Cancels its wait and leaves every queue it owned without an owner.
    /// Returns `false` for a thread the scheduler never saw.
    pub fn retire_thread(&mut self, thread: ThreadId) -> bool {
        let Some(state) = self.threads.get(&thread) else {
            return false;
        };
        let waiting_on = state.waiting_on;

        if let Some(queue) = waiting_on {
            self.detach_waiter(queue, thread);
            self.refresh_owner(queue);
        }

        if let Some(state) = self.threads.remove(&thread) {
            for queue in state.owned {
                if let Some(entry) = self.queues.get_mut(queue.index()) {
                    entry.owner = None;
                }
            }
        }

        debug!(%thread, "thread retired");
        true
    }

    /// Remove `thread` from the waiters of `queue` and clear its wait
    ///
    /// Leaves donation untouched; the caller refreshes the owner.
    pub(super) fn detach_waiter(&mut self, queue: QueueId, thread: ThreadId) {
        if let Some(entry) = self.queues.get_mut(queue.index()) {
            entry.members.retain(|member| *member != thread);
        }
        if let Some(state) = self.threads.get_mut(&thread) {
            if state.waiting_on == Some(queue) {
                state.waiting_on = None;
            }
        }
    }
}
