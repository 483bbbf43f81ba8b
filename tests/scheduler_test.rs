/*!
 * Scheduler Tests
 * Donation, selection and ownership transfer across both scheduler kinds
 */

use donation_sched::{
    PriorityControl, QueueFactory, Scheduler, SchedulerConfig, SchedulerError, SelectionPolicy,
    ThreadId,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::thread;

fn t(id: u64) -> ThreadId {
    ThreadId::new(id)
}

#[test]
fn test_effective_never_below_base() {
    let scheduler = Scheduler::priority();
    let q = scheduler.new_queue(true);

    let guard = scheduler.disable_interrupts();
    guard.acquire(q, t(1)).unwrap();
    for (id, priority) in [(2, 0), (3, 6), (4, 2)] {
        guard.set_priority(t(id), priority).unwrap();
        guard.wait_for_access(q, t(id)).unwrap();
    }
    guard.set_priority(t(1), 7).unwrap();
    guard.set_priority(t(3), 0).unwrap();

    for snapshot in guard.thread_snapshots() {
        assert!(snapshot.effective_priority >= u64::from(snapshot.priority));
    }
    guard.check_invariants().unwrap();
}

#[test]
fn test_strict_donation_on_wait() {
    let scheduler = Scheduler::priority();
    let q = scheduler.new_queue(true);
    let (a, b) = (t(1), t(2));

    let guard = scheduler.disable_interrupts();
    guard.set_priority(a, 1).unwrap();
    guard.set_priority(b, 5).unwrap();
    guard.acquire(q, a).unwrap();
    guard.wait_for_access(q, b).unwrap();

    assert_eq!(guard.get_effective_priority(a), 5);
    assert_eq!(guard.get_priority(a), 1);
}

#[test]
fn test_lottery_donation_sums_tickets() {
    let scheduler = Scheduler::new(SchedulerConfig::lottery().with_seed(17));
    let q = scheduler.new_queue(true);
    let (a, b, c) = (t(1), t(2), t(3));

    let guard = scheduler.disable_interrupts();
    guard.set_priority(b, 3).unwrap();
    guard.set_priority(c, 4).unwrap();
    guard.acquire(q, a).unwrap();
    guard.wait_for_access(q, b).unwrap();
    guard.wait_for_access(q, c).unwrap();

    assert_eq!(guard.get_effective_priority(a), 8);
}

#[test]
fn test_no_donation_when_transfer_disabled() {
    for config in [SchedulerConfig::priority(), SchedulerConfig::lottery()] {
        let scheduler = Scheduler::new(config);
        let q = scheduler.new_queue(false);
        let (a, b) = (t(1), t(2));

        let guard = scheduler.disable_interrupts();
        guard.set_priority(b, 5).unwrap();
        guard.acquire(q, a).unwrap();
        guard.wait_for_access(q, b).unwrap();

        assert_eq!(guard.get_effective_priority(a), 1);
        assert!(!guard.transfers_priority(q).unwrap());
    }
}

#[test]
fn test_ownership_transfer_revokes_donation() {
    let scheduler = Scheduler::priority();
    let q = scheduler.new_queue(true);
    let (a, b) = (t(1), t(2));

    let guard = scheduler.disable_interrupts();
    guard.set_priority(b, 6).unwrap();
    guard.acquire(q, a).unwrap();
    guard.wait_for_access(q, b).unwrap();
    assert_eq!(guard.get_effective_priority(a), 6);

    assert_eq!(guard.next_thread(q).unwrap(), Some(b));
    assert_eq!(guard.get_effective_priority(a), 1);
    assert_eq!(guard.owner(q).unwrap(), Some(b));
}

#[test]
fn test_direct_acquire_revokes_donation() {
    let scheduler = Scheduler::lottery();
    let q = scheduler.new_queue(true);
    let (a, b, c) = (t(1), t(2), t(3));

    let guard = scheduler.disable_interrupts();
    guard.set_priority(b, 9).unwrap();
    guard.acquire(q, a).unwrap();
    guard.wait_for_access(q, b).unwrap();
    assert_eq!(guard.get_effective_priority(a), 10);

    guard.acquire(q, c).unwrap();
    assert_eq!(guard.get_effective_priority(a), 1);
    assert_eq!(guard.get_effective_priority(c), 10);
    guard.check_invariants().unwrap();
}

#[test]
fn test_strict_fifo_among_equals() {
    let scheduler = Scheduler::priority();
    let q = scheduler.new_queue(true);
    let (x, y, z) = (t(10), t(11), t(12));

    let guard = scheduler.disable_interrupts();
    guard.acquire(q, t(1)).unwrap();
    for thread in [x, y, z] {
        guard.wait_for_access(q, thread).unwrap();
    }

    assert_eq!(guard.next_thread(q).unwrap(), Some(x));
    assert_eq!(guard.next_thread(q).unwrap(), Some(y));
    assert_eq!(guard.next_thread(q).unwrap(), Some(z));
    assert_eq!(guard.next_thread(q).unwrap(), None);
}

#[test]
fn test_strict_fifo_survives_late_arrivals() {
    let scheduler = Scheduler::priority();
    let q = scheduler.new_queue(false);

    let guard = scheduler.disable_interrupts();
    guard.wait_for_access(q, t(1)).unwrap();
    guard.wait_for_access(q, t(2)).unwrap();
    assert_eq!(guard.next_thread(q).unwrap(), Some(t(1)));
    guard.wait_for_access(q, t(3)).unwrap();
    guard.wait_for_access(q, t(4)).unwrap();

    assert_eq!(guard.waiters(q).unwrap(), vec![t(2), t(3), t(4)]);
}

#[test]
fn test_lottery_proportional_selection() {
    let scheduler = Scheduler::new(SchedulerConfig::lottery().with_seed(0xC0FFEE));
    let q = scheduler.new_queue(false);
    let (low, high) = (t(1), t(2));
    let draws = 20_000;
    let mut high_wins = 0;

    let guard = scheduler.disable_interrupts();
    guard.set_priority(low, 1).unwrap();
    guard.set_priority(high, 3).unwrap();

    for _ in 0..draws {
        guard.wait_for_access(q, low).unwrap();
        guard.wait_for_access(q, high).unwrap();
        if guard.next_thread(q).unwrap() == Some(high) {
            high_wins += 1;
        }
        // Both leave the queue before the next round
        guard.cancel_wait(q, low).unwrap();
        guard.cancel_wait(q, high).unwrap();
    }

    let share = high_wins as f64 / draws as f64;
    assert!((0.70..=0.80).contains(&share), "high share {}", share);
    assert_eq!(scheduler.stats().lottery_draws, draws as u64);
}

#[test]
fn test_cycle_terminates() {
    for config in [SchedulerConfig::priority(), SchedulerConfig::lottery()] {
        let scheduler = Scheduler::new(config);
        let (q1, q2) = (scheduler.new_queue(true), scheduler.new_queue(true));
        let (a, b) = (t(1), t(2));

        let guard = scheduler.disable_interrupts();
        guard.acquire(q1, a).unwrap();
        guard.acquire(q2, b).unwrap();
        guard.wait_for_access(q2, a).unwrap();
        guard.wait_for_access(q1, b).unwrap();

        let before = scheduler.stats();
        guard.set_priority(a, 5).unwrap();
        guard.acquire(q1, b).unwrap();
        let after = scheduler.stats();

        let passes = after.donation_passes - before.donation_passes;
        let visits = after.nodes_visited - before.nodes_visited;
        assert!(passes > 0);
        assert!(visits <= passes * guard.thread_count() as u64);
        guard.check_invariants().unwrap();
    }
}

#[test]
fn test_scenario_donation_then_handoff() {
    let scheduler = Scheduler::priority();
    let q = scheduler.new_queue(true);
    let (t1, t2, t3) = (t(1), t(2), t(3));

    let guard = scheduler.disable_interrupts();
    guard.set_priority(t1, 1).unwrap();
    guard.set_priority(t2, 3).unwrap();
    guard.set_priority(t3, 5).unwrap();
    guard.acquire(q, t1).unwrap();
    guard.wait_for_access(q, t2).unwrap();
    guard.wait_for_access(q, t3).unwrap();

    assert_eq!(guard.get_effective_priority(t1), 5);
    assert_eq!(guard.peek(q).unwrap(), Some(t3));

    assert_eq!(guard.next_thread(q).unwrap(), Some(t3));
    assert_eq!(guard.get_effective_priority(t1), 1);
    // t2 still waits on q, now owned by t3
    assert_eq!(guard.get_effective_priority(t3), 5);
    assert_eq!(guard.owner(q).unwrap(), Some(t3));
}

#[test]
fn test_original_self_test_topology() {
    let scheduler = Scheduler::priority();
    let (q1, q2, q3) = (
        scheduler.new_queue(true),
        scheduler.new_queue(true),
        scheduler.new_queue(true),
    );
    let (t1, t2, t4) = (t(1), t(2), t(4));

    let guard = scheduler.disable_interrupts();
    guard.acquire(q3, t1).unwrap();
    guard.acquire(q1, t1).unwrap();
    guard.wait_for_access(q1, t2).unwrap();
    guard.acquire(q2, t4).unwrap();
    guard.wait_for_access(q2, t1).unwrap();

    assert_eq!(guard.get_effective_priority(t1), 1);
    assert_eq!(guard.get_effective_priority(t4), 1);

    guard.set_priority(t2, 4).unwrap();
    assert_eq!(guard.get_effective_priority(t2), 4);
    assert_eq!(guard.get_effective_priority(t1), 4);
    assert_eq!(guard.get_effective_priority(t4), 4);

    guard.set_priority(t2, 2).unwrap();
    assert_eq!(guard.get_effective_priority(t4), 2);
}

#[test]
fn test_cancel_wait_updates_transitive_owner() {
    let scheduler = Scheduler::priority();
    let (inner, outer) = (scheduler.new_queue(true), scheduler.new_queue(true));

    let guard = scheduler.disable_interrupts();
    guard.acquire(outer, t(1)).unwrap();
    guard.acquire(inner, t(2)).unwrap();
    guard.wait_for_access(outer, t(2)).unwrap();
    guard.set_priority(t(3), 7).unwrap();
    guard.wait_for_access(inner, t(3)).unwrap();
    assert_eq!(guard.get_effective_priority(t(1)), 7);

    assert!(guard.cancel_wait(inner, t(3)).unwrap());
    assert_eq!(guard.get_effective_priority(t(2)), 1);
    assert_eq!(guard.get_effective_priority(t(1)), 1);
    assert_eq!(scheduler.stats().cancellations, 1);
}

#[test]
fn test_mixed_policy_queues() {
    let scheduler = Scheduler::priority();
    let lottery = scheduler.new_queue_with_policy(true, SelectionPolicy::Lottery);
    let strict = scheduler.new_queue(true);

    let guard = scheduler.disable_interrupts();
    assert_eq!(guard.policy(lottery).unwrap(), SelectionPolicy::Lottery);
    assert_eq!(guard.policy(strict).unwrap(), SelectionPolicy::Strict);

    guard.acquire(lottery, t(1)).unwrap();
    guard.set_priority(t(2), 3).unwrap();
    guard.set_priority(t(3), 2).unwrap();
    guard.wait_for_access(lottery, t(2)).unwrap();
    guard.wait_for_access(lottery, t(3)).unwrap();
    assert_eq!(guard.get_effective_priority(t(1)), 6);
}

#[test]
fn test_facade_priority_bounds() {
    let scheduler = Scheduler::priority();
    let thread = t(1);

    assert_eq!(
        scheduler.set_priority(thread, 8),
        Err(SchedulerError::InvalidPriority {
            priority: 8,
            min: 0,
            max: 7
        })
    );
    assert_eq!(scheduler.get_priority(thread), 1);

    let mut raised = 0;
    while scheduler.increase_priority(thread) {
        raised += 1;
    }
    assert_eq!(raised, 6);
    assert_eq!(scheduler.get_priority(thread), 7);

    scheduler.set_priority(thread, 0).unwrap();
    assert!(!scheduler.decrease_priority(thread));

    let lottery = Scheduler::lottery();
    assert!(lottery.set_priority(thread, 0).is_err());
    assert!(!lottery.decrease_priority(thread));
    assert!(lottery.set_priority(thread, 1_000_000_000).is_ok());
}

#[test]
fn test_large_ticket_sums_do_not_overflow() {
    let scheduler = Scheduler::new(SchedulerConfig::lottery().with_seed(5));
    let q = scheduler.new_queue(true);
    let max = scheduler.bounds().maximum;

    let guard = scheduler.disable_interrupts();
    guard.acquire(q, t(0)).unwrap();
    for id in 1..=8 {
        guard.set_priority(t(id), max).unwrap();
        guard.wait_for_access(q, t(id)).unwrap();
    }

    assert_eq!(guard.get_effective_priority(t(0)), 1 + 8 * u64::from(max));
    assert!(guard.next_thread(q).unwrap().is_some());
}

#[test]
fn test_retired_thread_frees_its_queues() {
    let scheduler = Scheduler::priority();
    let q = scheduler.new_queue(true);

    let guard = scheduler.disable_interrupts();
    guard.acquire(q, t(1)).unwrap();
    guard.wait_for_access(q, t(2)).unwrap();
    assert!(guard.retire_thread(t(1)));

    assert_eq!(guard.owner(q).unwrap(), None);
    assert!(guard.thread_snapshot(t(1)).is_none());
    assert_eq!(guard.next_thread(q).unwrap(), Some(t(2)));
    guard.check_invariants().unwrap();
}

#[test]
fn test_concurrent_lock_handoff() {
    let scheduler = Arc::new(Scheduler::priority());
    let lock = scheduler.new_queue(true);
    scheduler.disable_interrupts().acquire(lock, t(0)).unwrap();

    let handles: Vec<_> = (1..=6)
        .map(|id| {
            let scheduler = Arc::clone(&scheduler);
            thread::spawn(move || {
                scheduler.with_interrupts_disabled(|guard| {
                    guard.set_priority(t(id), id as u32).unwrap();
                    guard.wait_for_access(lock, t(id)).unwrap();
                    guard.check_invariants().unwrap();
                });
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let guard = scheduler.disable_interrupts();
    assert_eq!(guard.get_effective_priority(t(0)), 6);

    let mut granted = Vec::new();
    while let Some(next) = guard.next_thread(lock).unwrap() {
        granted.push(next.as_u64());
    }
    assert_eq!(granted, vec![6, 5, 4, 3, 2, 1]);
    assert_eq!(guard.owner(lock).unwrap(), None);
}

#[test]
fn test_raising_waiter_priority_reorders_queue() {
    let scheduler = Scheduler::priority();
    let q = scheduler.new_queue(true);

    let guard = scheduler.disable_interrupts();
    guard.acquire(q, t(0)).unwrap();
    for id in 1..=3 {
        guard.wait_for_access(q, t(id)).unwrap();
    }
    assert_eq!(guard.peek(q).unwrap(), Some(t(1)));

    guard.set_priority(t(3), 6).unwrap();
    assert_eq!(guard.waiters(q).unwrap(), vec![t(3), t(1), t(2)]);
    assert_eq!(guard.peek(q).unwrap(), Some(t(3)));
    assert_eq!(guard.get_effective_priority(t(0)), 6);

    assert_eq!(guard.next_thread(q).unwrap(), Some(t(3)));
    assert_eq!(guard.next_thread(q).unwrap(), Some(t(1)));
    assert_eq!(guard.next_thread(q).unwrap(), Some(t(2)));
    guard.check_invariants().unwrap();
}

#[test]
fn test_lowering_waiter_priority_reorders_queue() {
    let scheduler = Scheduler::priority();
    let q = scheduler.new_queue(true);

    let guard = scheduler.disable_interrupts();
    guard.acquire(q, t(0)).unwrap();
    guard.set_priority(t(1), 5).unwrap();
    guard.set_priority(t(2), 4).unwrap();
    guard.set_priority(t(3), 4).unwrap();
    for id in 1..=3 {
        guard.wait_for_access(q, t(id)).unwrap();
    }
    assert_eq!(guard.peek(q).unwrap(), Some(t(1)));
    assert_eq!(guard.get_effective_priority(t(0)), 5);

    assert!(guard.decrease_priority(t(1)));
    guard.set_priority(t(1), 2).unwrap();
    assert_eq!(guard.waiters(q).unwrap(), vec![t(2), t(3), t(1)]);
    assert_eq!(guard.get_effective_priority(t(0)), 4);

    assert_eq!(guard.next_thread(q).unwrap(), Some(t(2)));
    assert_eq!(guard.next_thread(q).unwrap(), Some(t(3)));
    assert_eq!(guard.next_thread(q).unwrap(), Some(t(1)));
    assert_eq!(guard.next_thread(q).unwrap(), None);
}
