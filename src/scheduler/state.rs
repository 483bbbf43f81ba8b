/*!
 * Scheduler State
 * Side-table of thread states and arena of resource queues
 */

use super::atomic_stats::AtomicSchedulerStats;
use super::policy::Candidate;
use super::queue::ResourceQueue;
use super::thread_state::ThreadState;
use super::types::{QueueSnapshot, SchedulerConfig, SchedulerKind, ThreadSnapshot};
use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::limits::PriorityBounds;
use crate::core::types::{QueueId, ThreadId};
use ahash::AHashMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

/// Everything the scheduler mutates
///
/// Only reachable through an [`InterruptGuard`](super::InterruptGuard), so
/// every mutation runs with scheduling atomicity in force.
pub struct SchedulerState {
    pub(super) kind: SchedulerKind,
    pub(super) bounds: PriorityBounds,
    pub(super) threads: AHashMap<ThreadId, ThreadState>,
    pub(super) queues: Vec<ResourceQueue>,
    pub(super) rng: StdRng,
    pub(super) stats: Arc<AtomicSchedulerStats>,
}

impl SchedulerState {
    pub(super) fn new(config: SchedulerConfig, stats: Arc<AtomicSchedulerStats>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            kind: config.kind,
            bounds: config.kind.bounds(),
            threads: AHashMap::new(),
            queues: Vec::new(),
            rng,
            stats,
        }
    }

    /// Thread state, created with the default priority on first use
    pub(super) fn thread_mut(&mut self, thread: ThreadId) -> &mut ThreadState {
        let default = self.bounds.default;
        self.threads
            .entry(thread)
            .or_insert_with(|| ThreadState::new(default))
    }

    pub(super) fn queue(&self, queue: QueueId) -> SchedulerResult<&ResourceQueue> {
        self.queues
            .get(queue.index())
            .ok_or(SchedulerError::QueueNotFound(queue.as_u32()))
    }

    pub(super) fn queue_mut(&mut self, queue: QueueId) -> SchedulerResult<&mut ResourceQueue> {
        self.queues
            .get_mut(queue.index())
            .ok_or(SchedulerError::QueueNotFound(queue.as_u32()))
    }

    /// Waiters of `queue` as the selection policy sees them, in insertion order
    pub(super) fn candidates(&self, queue: &ResourceQueue) -> Vec<Candidate> {
        queue
            .members
            .iter()
            .filter_map(|member| {
                self.threads.get(member).map(|state| Candidate {
                    thread: *member,
                    effective: state.effective,
                    wait_time: state.wait_time,
                })
            })
            .collect()
    }

    pub fn kind(&self) -> SchedulerKind {
        self.kind
    }

    pub fn bounds(&self) -> PriorityBounds {
        self.bounds
    }

    /// Number of threads with scheduling state
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    pub fn queue_count(&self) -> usize {
        self.queues.len()
    }

    pub fn thread_snapshot(&self, thread: ThreadId) -> Option<ThreadSnapshot> {
        self.threads.get(&thread).map(|state| ThreadSnapshot {
            thread,
            priority: state.priority,
            effective_priority: state.effective,
            wait_time: state.wait_time,
            waiting_on: state.waiting_on,
            owned: state.owned.iter().copied().collect(),
        })
    }

    pub fn queue_snapshot(&self, queue: QueueId) -> SchedulerResult<QueueSnapshot> {
        let entry = self.queue(queue)?;
        Ok(QueueSnapshot {
            queue,
            policy: entry.policy,
            transfer_priority: entry.transfer_priority,
            owner: entry.owner,
            members: entry.members.clone(),
        })
    }

    /// Snapshots of every known thread, ordered by id
    pub fn thread_snapshots(&self) -> Vec<ThreadSnapshot> {
        let mut ids: Vec<ThreadId> = self.threads.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter()
            .filter_map(|id| self.thread_snapshot(id))
            .collect()
    }

    /// Verify the ownership graph invariants
    ///
    /// Reports the first violation found. Effective priorities are only
    /// checked against base priority here: a donation cycle may leave them
    /// stale but bounded.
    pub fn check_invariants(&self) -> SchedulerResult<()> {
        let violation = |msg: String| Err(SchedulerError::InvariantViolation(msg));

        for (index, queue) in self.queues.iter().enumerate() {
            let id = QueueId::from_index(index);

            if let Some(owner) = queue.owner {
                if queue.members.contains(&owner) {
                    return violation(format!("{} owner {} is also waiting", id, owner));
                }
                match self.threads.get(&owner) {
                    Some(state) if state.owned.contains(&id) => {}
                    _ => return violation(format!("{} owner {} does not list it", id, owner)),
                }
            }

            for (position, member) in queue.members.iter().enumerate() {
                if queue.members[..position].contains(member) {
                    return violation(format!("{} lists {} twice", id, member));
                }
                match self.threads.get(member) {
                    Some(state) if state.waiting_on == Some(id) => {}
                    _ => {
                        return violation(format!("{} member {} is not waiting on it", id, member))
                    }
                }
            }
        }

        for (thread, state) in &self.threads {
            if !self.bounds.contains(state.priority) {
                return violation(format!(
                    "{} priority {} outside bounds",
                    thread, state.priority
                ));
            }
            if state.effective < u64::from(state.priority) {
                return violation(format!(
                    "{} effective {} below base {}",
                    thread, state.effective, state.priority
                ));
            }
            if let Some(waiting_on) = state.waiting_on {
                if state.owned.contains(&waiting_on) {
                    return violation(format!("{} owns and waits on {}", thread, waiting_on));
                }
                match self.queues.get(waiting_on.index()) {
                    Some(queue) if queue.members.contains(thread) => {}
                    _ => {
                        return violation(format!(
                            "{} waits on {} without membership",
                            thread, waiting_on
                        ))
                    }
                }
            }
            for owned in &state.owned {
                match self.queues.get(owned.index()) {
                    Some(queue) if queue.owner == Some(*thread) => {}
                    _ => return violation(format!("{} claims {} it does not own", thread, owned)),
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(kind: SchedulerKind) -> SchedulerState {
        let config = SchedulerConfig {
            kind,
            seed: Some(5),
        };
        SchedulerState::new(config, Arc::new(AtomicSchedulerStats::new(kind)))
    }

    #[test]
    fn test_threads_created_lazily_with_default() {
        let mut s = state(SchedulerKind::Priority);
        assert_eq!(s.thread_count(), 0);
        assert_eq!(s.thread_mut(ThreadId::new(1)).priority, 1);
        assert_eq!(s.thread_count(), 1);
        assert!(s.thread_snapshot(ThreadId::new(2)).is_none());
    }

    #[test]
    fn test_unknown_queue_rejected() {
        let s = state(SchedulerKind::Lottery);
        assert_eq!(
            s.queue_snapshot(QueueId::from_index(3)),
            Err(SchedulerError::QueueNotFound(3))
        );
    }

    #[test]
    fn test_invariants_detect_torn_membership() {
        let mut s = state(SchedulerKind::Priority);
        let queue = s.new_queue(true);
        s.thread_mut(ThreadId::new(1));
        s.queues[queue.index()].members.push(ThreadId::new(1));
        assert!(matches!(
            s.check_invariants(),
            Err(SchedulerError::InvariantViolation(_))
        ));
    }
}
