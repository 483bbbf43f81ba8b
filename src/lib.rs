/*!
 * Donation Scheduler Library
 * Priority and lottery admission control with priority donation
 */

pub mod core;
pub mod monitoring;
pub mod scheduler;

// Re-exports
pub use crate::core::{
    EffectivePriority, Priority, PriorityBounds, QueueId, SchedulerError, SchedulerResult,
    ThreadId,
};
pub use monitoring::init_tracing;
pub use scheduler::{
    InterruptGuard, PriorityControl, PriorityOp, QueueFactory, QueueSnapshot, Scheduler,
    SchedulerApi, SchedulerConfig, SchedulerKind, SchedulerStats, SelectionPolicy,
    ThreadSnapshot,
};
