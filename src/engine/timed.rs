//! Timed Override Controller
//!
//! Applies an operator value to a variable, optionally for a bounded time.
//! A timed override captures the value it replaced and schedules a revert
//! task on the variable's lane. Any later request on the same lane (another
//! set of either kind, or a sweep) cancels that revert: the captured value is
//! only restored if nothing else touched the variable's schedule first.
//!
//! Waiting for the deadline happens on the revert task's own thread. The
//! caller gets control back immediately.

use super::Shared;
use super::store::ChangeOrigin;
use super::tasks::{Scheduled, TaskKind, Waiter, cancellation, duration_from_secs};
use crate::error::Result;
use crate::types::Value;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Apply `value` to `name`, permanently or for `hold_secs` seconds.
///
/// Nothing is modified when validation fails.
pub(crate) fn apply(
    shared: &Arc<Shared>,
    name: &str,
    value: Value,
    hold_secs: Option<f64>,
) -> Result<()> {
    shared.store.domain(name)?.check(name, &value)?;
    let hold = hold_secs
        .map(|secs| duration_from_secs("duration", secs))
        .transpose()?;

    let mut lane = shared.board.lock(name)?;
    let previous = shared.store.get(name)?;

    let Some(hold) = hold else {
        if let Some(task) = lane.take() {
            shared.board.retire(task);
        }
        shared.store.write(name, value.clone(), ChangeOrigin::Operator)?;
        info!("{} set to {} (permanent)", name, value);
        return Ok(());
    };

    // Spawn before mutating anything so a failed spawn leaves no trace.
    let id = shared.board.next_id();
    let (canceller, waiter) = cancellation();
    let handle = {
        let shared = Arc::clone(shared);
        let name = name.to_string();
        let restore = previous.clone();
        thread::Builder::new()
            .name(format!("revert-{}", name))
            .spawn(move || run_revert(&shared, &name, id, restore, hold, waiter))?
    };

    if let Some(task) = lane.take() {
        shared.board.retire(task);
    }
    shared.store.write(name, value.clone(), ChangeOrigin::Operator)?;
    lane.install(Scheduled {
        id,
        kind: TaskKind::Revert {
            restore: previous.clone(),
            deadline: Instant::now() + hold,
        },
        canceller,
        handle: Some(handle),
    });

    info!(
        "{} set to {} for {:?}, reverting to {}",
        name, value, hold, previous
    );
    Ok(())
}

fn run_revert(
    shared: &Shared,
    name: &str,
    id: u64,
    restore: Value,
    hold: Duration,
    waiter: Waiter,
) {
    if !waiter.sleep(hold) {
        debug!("Revert #{} on {} superseded", id, name);
        return;
    }

    // Re-check under the lane lock: a request that raced the deadline wins.
    let Ok(mut lane) = shared.board.peek(name) else {
        return;
    };
    if waiter.is_cancelled() || !lane.is_current(id) {
        debug!("Revert #{} on {} superseded at deadline", id, name);
        return;
    }

    shared
        .store
        .write(name, restore.clone(), ChangeOrigin::Revert)
        .expect("INTERNAL ERROR: captured value left its domain - this is a bug");
    lane.release(id);
    info!("{} reverted to {}", name, restore);
}
