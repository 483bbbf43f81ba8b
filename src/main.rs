/*!
 * Donation Scheduler - Demo Entry Point
 *
 * Replays the classic donation self-test against a scheduler built from
 * the environment:
 * - SCHED_MODE: priority | lottery (default: priority)
 * - SCHED_SEED: lottery seed (default: OS entropy)
 */

use donation_sched::{
    init_tracing, InterruptGuard, PriorityControl, QueueFactory, Scheduler, SchedulerConfig,
    SchedulerError, SchedulerKind, ThreadId,
};
use miette::{IntoDiagnostic, Result};
use tracing::info;

fn config_from_env() -> Result<SchedulerConfig> {
    let kind = match std::env::var("SCHED_MODE") {
        Ok(mode) => SchedulerKind::from_str(&mode)?,
        Err(_) => SchedulerKind::Priority,
    };

    let seed = match std::env::var("SCHED_SEED") {
        Ok(raw) => Some(raw.parse::<u64>().into_diagnostic()?),
        Err(_) => None,
    };

    Ok(SchedulerConfig { kind, seed })
}

fn report(guard: &InterruptGuard<'_>, threads: &[(&str, ThreadId)]) {
    for (name, thread) in threads {
        info!(
            thread = name,
            priority = guard.get_priority(*thread),
            effective = guard.get_effective_priority(*thread),
            "effective priority"
        );
    }
}

fn main() -> Result<()> {
    // Initialize structured tracing
    init_tracing();

    let config = config_from_env()?;
    info!(kind = config.kind.as_str(), "Donation scheduler demo starting...");

    let scheduler = Scheduler::new(config);
    let first = scheduler.new_queue(true);
    let second = scheduler.new_queue(true);
    let third = scheduler.new_queue(true);

    let t1 = ThreadId::new(1);
    let t2 = ThreadId::new(2);
    let t4 = ThreadId::new(4);
    let named = [("t1", t1), ("t2", t2), ("t4", t4)];

    {
        let guard = scheduler.disable_interrupts();

        guard.acquire(third, t1)?;
        guard.acquire(first, t1)?;
        guard.wait_for_access(first, t2)?;
        guard.acquire(second, t4)?;
        guard.wait_for_access(second, t1)?;
        report(&guard, &named);

        guard.set_priority(t2, 4)?;
        info!("After raising t2 to 4:");
        report(&guard, &named);

        guard.check_invariants()?;
    }

    // Increases stop at the configured bound
    let raised = (0..8).take_while(|_| scheduler.increase_priority(t2)).count();
    info!(
        raised,
        priority = scheduler.get_priority(t2),
        effective_t4 = scheduler.get_effective_priority(t4),
        "t2 raised"
    );

    {
        let guard = scheduler.disable_interrupts();
        while let Some(next) = guard.next_thread(first)? {
            info!(queue = %first, thread = %next, "granted");
        }
        while let Some(next) = guard.next_thread(second)? {
            info!(queue = %second, thread = %next, "granted");
        }
        report(&guard, &named);

        for snapshot in guard.thread_snapshots() {
            let json = serde_json::to_string(&snapshot).into_diagnostic()?;
            info!(state = %json, "thread");
        }

        if guard.owner(third)? != Some(t1) {
            return Err(SchedulerError::InvariantViolation(format!("{} lost {}", t1, third)).into());
        }
    }

    let stats = serde_json::to_string_pretty(&scheduler.stats()).into_diagnostic()?;
    info!("Scheduler stats:\n{}", stats);

    Ok(())
}
