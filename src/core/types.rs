/*!
 * Core Types
 * Identifiers and priority aliases shared across the scheduler
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Base priority (strict mode) or base ticket count (lottery mode)
pub type Priority = u32;

/// Effective priority or accumulated ticket total
///
/// Wider than [`Priority`] so that lottery donation sums cannot overflow
/// at realistic thread counts.
pub type EffectivePriority = u64;

/// Opaque identity of a cooperative thread
///
/// Issued by the thread layer and stable for the thread's lifetime. The
/// scheduler only uses it as a side-table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(u64);

impl ThreadId {
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline(always)]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ThreadId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "thread#{}", self.0)
    }
}

/// Handle of a resource queue
///
/// Arena index into the scheduler's queue table. Only `new_queue` hands
/// these out; an id from a different scheduler is rejected on use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueId(u32);

impl QueueId {
    #[inline]
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "queue#{}", self.0)
    }
}
