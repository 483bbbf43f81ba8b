/*!
 * Selection Policies
 * Strict priority and weighted lottery selection over queue waiters
 */

use crate::core::types::{EffectivePriority, ThreadId};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Queue discipline, fixed when the queue is created
///
/// The policy also decides how waiters donate to the owner: strict queues
/// donate their maximum, lottery queues donate the sum of their tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Highest effective priority wins, longest wait breaks ties
    Strict,
    /// Win probability proportional to effective tickets
    Lottery,
}

/// One waiter as seen by a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Candidate {
    pub thread: ThreadId,
    pub effective: EffectivePriority,
    pub wait_time: u64,
}

impl Candidate {
    #[inline(always)]
    fn rank(&self) -> (EffectivePriority, u64) {
        (self.effective, self.wait_time)
    }

    /// Lottery weight; a waiter always holds at least one ticket
    #[inline(always)]
    fn tickets(&self) -> u64 {
        self.effective.max(1)
    }
}

impl SelectionPolicy {
    #[inline(always)]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Lottery => "lottery",
        }
    }

    /// Whether waiters' donations are summed (lottery) or maxed (strict)
    #[inline(always)]
    pub const fn donates_by_sum(&self) -> bool {
        matches!(self, Self::Lottery)
    }

    /// Pick the next waiter without touching any queue state
    ///
    /// Lottery draws consume randomness from `rng`; strict selection never
    /// does.
    pub(crate) fn select<I, R>(&self, candidates: I, rng: &mut R) -> Option<ThreadId>
    where
        I: IntoIterator<Item = Candidate>,
        I::IntoIter: Clone,
        R: Rng,
    {
        match self {
            Self::Strict => select_strict(candidates),
            Self::Lottery => select_lottery(candidates, rng),
        }
    }

    /// Order waiters the way this policy considers them
    ///
    /// Strict: pick order. Lottery: the stable walk order, unchanged.
    pub(crate) fn order(&self, candidates: &mut [Candidate]) {
        if let Self::Strict = self {
            // Stable sort keeps insertion order among exact rank ties
            candidates.sort_by(|a, b| b.rank().cmp(&a.rank()));
        }
    }
}

/// Maximum of `(effective, wait_time)`; the first such waiter on exact ties
fn select_strict<I>(candidates: I) -> Option<ThreadId>
where
    I: IntoIterator<Item = Candidate>,
{
    let mut best: Option<Candidate> = None;
    for candidate in candidates {
        match best {
            Some(current) if candidate.rank() <= current.rank() => {}
            _ => best = Some(candidate),
        }
    }
    best.map(|c| c.thread)
}

/// Running-sum walk over a single draw in `[0, total)`
///
/// Every waiter holds at least one ticket, so a non-empty queue always has
/// a winner. Never materializes per-ticket state, so billions of tickets
/// cost the same as one.
fn select_lottery<I, R>(candidates: I, rng: &mut R) -> Option<ThreadId>
where
    I: IntoIterator<Item = Candidate>,
    I::IntoIter: Clone,
    R: Rng,
{
    let candidates = candidates.into_iter();
    let total = candidates
        .clone()
        .fold(0u64, |acc, c| acc.saturating_add(c.tickets()));
    if total == 0 {
        return None;
    }

    let draw = rng.gen_range(0..total);
    let mut cumulative = 0u64;
    for candidate in candidates {
        cumulative = cumulative.saturating_add(candidate.tickets());
        if cumulative > draw {
            return Some(candidate.thread);
        }
    }
    None
}
