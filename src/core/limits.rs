/*!
 * Scheduler Limits and Constants
 *
 * Priority and ticket bounds for each scheduler kind. These are fixed at
 * compile time and are not runtime-tunable.
 */

use super::types::Priority;

// =============================================================================
// STRICT PRIORITY
// =============================================================================

/// Lowest strict priority a thread can hold
pub const PRIORITY_MINIMUM: Priority = 0;

/// Priority assigned to a thread on first use
pub const PRIORITY_DEFAULT: Priority = 1;

/// Highest strict priority a thread can hold
pub const PRIORITY_MAXIMUM: Priority = 7;

// =============================================================================
// LOTTERY TICKETS
// =============================================================================

/// Every lottery participant holds at least one ticket
pub const TICKETS_MINIMUM: Priority = 1;

/// Tickets assigned to a thread on first use
pub const TICKETS_DEFAULT: Priority = 1;

/// Largest base ticket count (signed 32-bit max, so sums fit easily in u64)
pub const TICKETS_MAXIMUM: Priority = i32::MAX as Priority;

/// Inclusive bounds for base priorities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityBounds {
    pub minimum: Priority,
    pub default: Priority,
    pub maximum: Priority,
}

impl PriorityBounds {
    pub const STRICT: Self = Self {
        minimum: PRIORITY_MINIMUM,
        default: PRIORITY_DEFAULT,
        maximum: PRIORITY_MAXIMUM,
    };

    pub const LOTTERY: Self = Self {
        minimum: TICKETS_MINIMUM,
        default: TICKETS_DEFAULT,
        maximum: TICKETS_MAXIMUM,
    };

    #[inline(always)]
    pub const fn contains(&self, priority: Priority) -> bool {
        priority >= self.minimum && priority <= self.maximum
    }
}
