/*!
 * Resource Queues
 * Waiters guarding one resource, its owner, and selection of the next owner
 */

use super::policy::SelectionPolicy;
use super::state::SchedulerState;
use crate::core::errors::SchedulerResult;
use crate::core::types::{QueueId, ThreadId};
use tracing::{debug, instrument};

/// One contended resource
#[derive(Debug, Clone)]
pub(crate) struct ResourceQueue {
    pub(super) policy: SelectionPolicy,
    /// Fixed at creation; `false` for queues like join that must not donate
    pub(super) transfer_priority: bool,
    /// Insertion order, which is also the stable lottery walk order
    pub(super) members: Vec<ThreadId>,
    pub(super) owner: Option<ThreadId>,
}

impl ResourceQueue {
    fn new(policy: SelectionPolicy, transfer_priority: bool) -> Self {
        Self {
            policy,
            transfer_priority,
            members: Vec::new(),
            owner: None,
        }
    }
}

impl SchedulerState {
    /// Create a queue using this scheduler's default policy
    pub fn new_queue(&mut self, transfer_priority: bool) -> QueueId {
        let policy = self.kind.default_policy();
        self.new_queue_with_policy(transfer_priority, policy)
    }

    pub fn new_queue_with_policy(
        &mut self,
        transfer_priority: bool,
        policy: SelectionPolicy,
    ) -> QueueId {
        let id = QueueId::from_index(self.queues.len());
        self.queues.push(ResourceQueue::new(policy, transfer_priority));
        self.stats.inc_queues_created();
        debug!(queue = %id, policy = policy.as_str(), transfer_priority, "queue created");
        id
    }

    /// Hand `queue` to the waiter its policy picks
    ///
    /// With no waiters the resource becomes free: the owner is cleared and
    /// `None` is returned.
    #[instrument(level = "debug", skip_all, fields(queue = %queue))]
    pub fn next_thread(&mut self, queue: QueueId) -> SchedulerResult<Option<ThreadId>> {
        match self.select(queue)? {
            Some(winner) => {
                self.stats.inc_selections();
                self.acquire(queue, winner)?;
                Ok(Some(winner))
            }
            None => {
                self.stats.inc_empty_selections();
                let entry = self.queue_mut(queue)?;
                let released = if entry.members.is_empty() {
                    entry.owner.take()
                } else {
                    None
                };
                if let Some(previous) = released {
                    if let Some(state) = self.threads.get_mut(&previous) {
                        state.owned.remove(&queue);
                    }
                    debug!(%queue, %previous, "released with no waiters");
                    self.propagate_from(previous);
                }
                Ok(None)
            }
        }
    }

    /// What `next_thread` would return, without mutating anything
    pub fn peek(&self, queue: QueueId) -> SchedulerResult<Option<ThreadId>> {
        let entry = self.queue(queue)?;
        let candidates = self.candidates(entry);
        // Drawing from a clone leaves the real generator where next_thread will find it
        let mut rng = self.rng.clone();
        Ok(entry.policy.select(candidates, &mut rng))
    }

    fn select(&mut self, queue: QueueId) -> SchedulerResult<Option<ThreadId>> {
        let entry = self.queue(queue)?;
        let policy = entry.policy;
        let candidates = self.candidates(entry);
        if policy == SelectionPolicy::Lottery && !candidates.is_empty() {
            self.stats.inc_lottery_draws();
        }
        Ok(policy.select(candidates, &mut self.rng))
    }

    /// Stop `thread` waiting on `queue` before it is selected
    ///
    /// Returns `false` when it was not waiting there.
    pub fn cancel_wait(&mut self, queue: QueueId, thread: ThreadId) -> SchedulerResult<bool> {
        self.queue(queue)?;
        let waiting = self
            .threads
            .get(&thread)
            .is_some_and(|state| state.waiting_on == Some(queue));
        if !waiting {
            return Ok(false);
        }

        self.detach_waiter(queue, thread);
        self.stats.inc_cancellations();
        debug!(%queue, %thread, "wait cancelled");
        self.refresh_owner(queue);
        Ok(true)
    }

    pub fn owner(&self, queue: QueueId) -> SchedulerResult<Option<ThreadId>> {
        Ok(self.queue(queue)?.owner)
    }

    /// Waiters in the order the queue's policy considers them
    pub fn waiters(&self, queue: QueueId) -> SchedulerResult<Vec<ThreadId>> {
        let entry = self.queue(queue)?;
        let mut candidates = self.candidates(entry);
        entry.policy.order(&mut candidates);
        Ok(candidates.into_iter().map(|c| c.thread).collect())
    }

    pub fn policy(&self, queue: QueueId) -> SchedulerResult<SelectionPolicy> {
        Ok(self.queue(queue)?.policy)
    }

    pub fn transfers_priority(&self, queue: QueueId) -> SchedulerResult<bool> {
        Ok(self.queue(queue)?.transfer_priority)
    }
}
