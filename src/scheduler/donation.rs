/*!
 * Donation Engine
 * Recomputes effective priorities and pushes changes up the ownership graph
 *
 * A waiting thread donates to the owner of the queue it waits on, provided
 * that queue transfers priority. Since a thread waits on at most one queue,
 * every thread has at most one donation target and a propagation pass is a
 * walk along a single chain. Ownership and waiting can close that chain
 * into a cycle, so each pass carries a visited set and recomputes a thread
 * at most once.
 */

use super::state::SchedulerState;
use crate::core::types::{EffectivePriority, QueueId, ThreadId};
use ahash::AHashSet;
use tracing::{debug, instrument, trace};

impl SchedulerState {
    /// Effective priority of `thread` from its base and its owned queues
    ///
    /// Strict queues contribute the maximum waiter priority, lottery queues
    /// add every waiter's tickets. A thread owning both kinds takes the
    /// larger of the two results.
    pub(super) fn compute_effective(&self, thread: ThreadId) -> Option<EffectivePriority> {
        let state = self.threads.get(&thread)?;
        let base = EffectivePriority::from(state.priority);
        let mut peak = base;
        let mut summed = base;

        for queue in state.owned.iter().filter_map(|id| self.queues.get(id.index())) {
            if !queue.transfer_priority {
                continue;
            }
            for member in &queue.members {
                let donated = self.threads.get(member).map_or(0, |m| m.effective);
                if queue.policy.donates_by_sum() {
                    summed = summed.saturating_add(donated);
                } else {
                    peak = peak.max(donated);
                }
            }
        }

        Some(peak.max(summed))
    }

    /// Thread that receives `thread`'s donation, if any
    fn donation_target(&self, thread: ThreadId) -> Option<ThreadId> {
        let waiting_on = self.threads.get(&thread)?.waiting_on?;
        let queue = self.queues.get(waiting_on.index())?;
        if queue.transfer_priority {
            queue.owner
        } else {
            None
        }
    }

    /// Recompute `start` and every thread its change reaches
    ///
    /// Stops as soon as a recomputed value is unchanged, when the chain
    /// ends, or when it returns to a thread already visited in this pass.
    /// Visits per pass never exceed the number of threads.
    #[instrument(level = "trace", skip_all, fields(start = %start))]
    pub(super) fn propagate_from(&mut self, start: ThreadId) {
        self.stats.inc_donation_passes();

        let mut visited = AHashSet::new();
        let mut cursor = Some(start);

        while let Some(thread) = cursor.take() {
            if !visited.insert(thread) {
                self.stats.inc_cycles_detected();
                debug!(%start, %thread, "donation cycle, propagation stopped");
                break;
            }
            self.stats.inc_nodes_visited();

            let Some(fresh) = self.compute_effective(thread) else {
                break;
            };
            let Some(state) = self.threads.get_mut(&thread) else {
                break;
            };
            if state.effective == fresh {
                break;
            }

            trace!(%thread, from = state.effective, to = fresh, "effective priority");
            state.effective = fresh;
            cursor = self.donation_target(thread);
        }
    }

    /// Recompute the owner of `queue` after its waiters changed
    pub(super) fn refresh_owner(&mut self, queue: QueueId) {
        let owner = self
            .queues
            .get(queue.index())
            .filter(|entry| entry.transfer_priority)
            .and_then(|entry| entry.owner);
        if let Some(owner) = owner {
            self.propagate_from(owner);
        }
    }
}
