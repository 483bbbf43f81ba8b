/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scheduler-related errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SchedulerError {
    #[error("Priority {priority} out of range [{min}, {max}]")]
    #[diagnostic(
        code(scheduler::invalid_priority),
        help("Bounds are fixed per scheduler kind. Use increase/decrease to move within them.")
    )]
    InvalidPriority { priority: u32, min: u32, max: u32 },

    #[error("Queue {0} not found in scheduler")]
    #[diagnostic(
        code(scheduler::queue_not_found),
        help("Queue handles are only valid on the scheduler that created them.")
    )]
    QueueNotFound(u32),

    #[error("Invalid scheduler kind: {0}")]
    #[diagnostic(
        code(scheduler::invalid_kind),
        help("Use 'priority' or 'lottery'.")
    )]
    InvalidKind(String),

    #[error("Scheduler invariant violated: {0}")]
    #[diagnostic(
        code(scheduler::invariant_violation),
        help("The ownership graph is inconsistent. Please report this issue.")
    )]
    InvariantViolation(String),
}

/// Result type for scheduler operations
pub type SchedulerResult<T> = std::result::Result<T, SchedulerError>;
