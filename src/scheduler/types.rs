/*!
 * Scheduler Types
 * Configuration, priority operations and serializable views
 */

use super::policy::SelectionPolicy;
use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::limits::PriorityBounds;
use crate::core::types::{EffectivePriority, Priority, QueueId, ThreadId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Which family of queue discipline a scheduler runs
///
/// Fixes the priority bounds and the policy handed to queues created
/// through `new_queue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerKind {
    /// Highest effective priority first, FIFO among equals
    Priority,
    /// Weighted random draw over tickets
    Lottery,
}

impl SchedulerKind {
    /// Parse from string representation
    pub fn from_str(s: &str) -> SchedulerResult<Self> {
        match s.to_lowercase().as_str() {
            "priority" | "prio" | "strict" => Ok(Self::Priority),
            "lottery" | "ticket" | "tickets" => Ok(Self::Lottery),
            _ => Err(SchedulerError::InvalidKind(format!(
                "'{}'. Valid: priority, lottery",
                s
            ))),
        }
    }

    /// Convert to string representation
    #[inline(always)]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Priority => "priority",
            Self::Lottery => "lottery",
        }
    }

    #[inline]
    pub const fn bounds(&self) -> PriorityBounds {
        match self {
            Self::Priority => PriorityBounds::STRICT,
            Self::Lottery => PriorityBounds::LOTTERY,
        }
    }

    #[inline]
    pub const fn default_policy(&self) -> SelectionPolicy {
        match self {
            Self::Priority => SelectionPolicy::Strict,
            Self::Lottery => SelectionPolicy::Lottery,
        }
    }
}

impl Serialize for SchedulerKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SchedulerKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Scheduler configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub kind: SchedulerKind,
    /// Seed for lottery draws; `None` seeds from OS entropy
    pub seed: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::priority()
    }
}

impl SchedulerConfig {
    /// Strict priority scheduling with donation by max
    pub const fn priority() -> Self {
        Self {
            kind: SchedulerKind::Priority,
            seed: None,
        }
    }

    /// Lottery scheduling with donation by ticket sum
    pub const fn lottery() -> Self {
        Self {
            kind: SchedulerKind::Lottery,
            seed: None,
        }
    }

    /// Fix the lottery seed so draws are reproducible
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Priority adjustment operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityOp {
    /// Increase priority by one
    Boost,
    /// Decrease priority by one
    Lower,
    /// Set to specific value
    Set(Priority),
}

/// Apply priority operation
///
/// Returns `None` when the result would leave `bounds`.
pub fn apply_priority_op(
    current: Priority,
    op: PriorityOp,
    bounds: PriorityBounds,
) -> Option<Priority> {
    let next = match op {
        PriorityOp::Boost => current.checked_add(1)?,
        PriorityOp::Lower => current.checked_sub(1)?,
        PriorityOp::Set(value) => value,
    };
    bounds.contains(next).then_some(next)
}

/// Point-in-time view of one thread's scheduling state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSnapshot {
    pub thread: ThreadId,
    pub priority: Priority,
    pub effective_priority: EffectivePriority,
    pub wait_time: u64,
    pub waiting_on: Option<QueueId>,
    pub owned: Vec<QueueId>,
}

/// Point-in-time view of one resource queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub queue: QueueId,
    pub policy: SelectionPolicy,
    pub transfer_priority: bool,
    pub owner: Option<ThreadId>,
    /// Waiters in insertion order
    pub members: Vec<ThreadId>,
}

/// Scheduler statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub kind: SchedulerKind,
    pub queues_created: u64,
    pub waits: u64,
    pub acquisitions: u64,
    pub selections: u64,
    pub empty_selections: u64,
    pub lottery_draws: u64,
    pub cancellations: u64,
    pub priority_changes: u64,
    pub donation_passes: u64,
    pub nodes_visited: u64,
    pub cycles_detected: u64,
}
