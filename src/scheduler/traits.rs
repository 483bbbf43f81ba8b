/*!
 * Scheduler Traits
 * Interface the lock, condition-variable and join layers program against
 */

use super::policy::SelectionPolicy;
use crate::core::errors::SchedulerResult;
use crate::core::types::{EffectivePriority, Priority, QueueId, ThreadId};

/// Queue creation for synchronization primitives
pub trait QueueFactory: Send + Sync {
    /// Create a queue with the scheduler's default policy
    fn new_queue(&self, transfer_priority: bool) -> QueueId;

    /// Create a queue with an explicit, immutable policy
    fn new_queue_with_policy(&self, transfer_priority: bool, policy: SelectionPolicy) -> QueueId;
}

/// Priority management operations
///
/// Each call disables and restores scheduling on its own.
pub trait PriorityControl: Send + Sync {
    fn get_priority(&self, thread: ThreadId) -> Priority;

    fn get_effective_priority(&self, thread: ThreadId) -> EffectivePriority;

    fn set_priority(&self, thread: ThreadId, priority: Priority) -> SchedulerResult<()>;

    /// Raise by one; `false` at the configured maximum
    fn increase_priority(&self, thread: ThreadId) -> bool;

    /// Lower by one; `false` at the configured minimum
    fn decrease_priority(&self, thread: ThreadId) -> bool;
}

/// Combined scheduler interface
pub trait SchedulerApi: QueueFactory + PriorityControl + Send + Sync {}

// Blanket implementation for any type that implements all component traits
impl<T> SchedulerApi for T where T: QueueFactory + PriorityControl + Send + Sync {}
