//! Sweep Driver
//!
//! Walks a continuous variable through a materialized sequence on a
//! background thread: write a value, wait `delay`, repeat. The sweep owns
//! the variable's lane while it runs, so starting it cancels a pending
//! revert or an older sweep, and any later request on the lane cancels it.
//! A cancelled sweep leaves the last value it wrote in place.

use super::Shared;
use super::store::ChangeOrigin;
use super::tasks::{Scheduled, TaskKind, Waiter, cancellation, duration_from_secs};
use crate::error::{Result, SimError};
use crate::types::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Start sweeping `name` through `values`, pausing `delay_secs` after each.
///
/// # Errors
///
/// - `UnknownVariable` for unregistered names
/// - `Domain` if `name` is not continuous, or a value falls outside its bounds
/// - `InvalidDuration` for a negative or non-finite delay
pub(crate) fn start(
    shared: &Arc<Shared>,
    name: &str,
    values: Vec<f64>,
    delay_secs: f64,
) -> Result<()> {
    let domain = shared.store.domain(name)?;
    if !domain.is_continuous() {
        return Err(SimError::domain(format!(
            "'{}' is not a continuous variable ({})",
            name, domain
        )));
    }
    let delay = duration_from_secs("delay", delay_secs)?;
    // Validate every step up front; a step failing later would be a bug.
    for v in &values {
        domain.check(name, &Value::Float(*v))?;
    }

    let mut lane = shared.board.lock(name)?;

    let id = shared.board.next_id();
    let total = values.len();
    let done = Arc::new(AtomicUsize::new(0));
    let (canceller, waiter) = cancellation();
    let handle = {
        let shared = Arc::clone(shared);
        let name = name.to_string();
        let done = Arc::clone(&done);
        thread::Builder::new()
            .name(format!("sweep-{}", name))
            .spawn(move || run_sweep(&shared, &name, id, values, delay, waiter, &done))?
    };

    if let Some(task) = lane.take() {
        shared.board.retire(task);
    }
    lane.install(Scheduled {
        id,
        kind: TaskKind::Sweep { total, done },
        canceller,
        handle: Some(handle),
    });

    info!(
        "Sweep #{} started on {}: {} value(s), {:?} between steps",
        id, name, total, delay
    );
    Ok(())
}

/// Stop the sweep on `name`, if any. A pending revert is left alone.
///
/// Returns true if a sweep was running.
pub(crate) fn cancel(shared: &Shared, name: &str) -> Result<bool> {
    let mut lane = shared.board.lock(name)?;
    let is_sweep = matches!(
        lane.current().map(|task| &task.kind),
        Some(TaskKind::Sweep { .. })
    );
    if !is_sweep {
        debug!("No sweep to cancel on {}", name);
        return Ok(false);
    }

    if let Some(task) = lane.take() {
        info!("Sweep #{} on {} cancelled", task.id, name);
        shared.board.retire(task);
    }
    Ok(true)
}

fn run_sweep(
    shared: &Shared,
    name: &str,
    id: u64,
    values: Vec<f64>,
    delay: Duration,
    waiter: Waiter,
    done: &AtomicUsize,
) {
    for (i, value) in values.into_iter().enumerate() {
        {
            let Ok(lane) = shared.board.peek(name) else {
                return;
            };
            if waiter.is_cancelled() || !lane.is_current(id) {
                return;
            }
            shared
                .store
                .write(name, Value::Float(value), ChangeOrigin::Sweep)
                .expect("INTERNAL ERROR: validated sweep step rejected - this is a bug");
            done.store(i + 1, Ordering::SeqCst);
        }
        debug!("Sweep #{} on {}: step {} = {}", id, name, i + 1, value);

        if !waiter.sleep(delay) {
            return;
        }
    }

    if let Ok(mut lane) = shared.board.peek(name) {
        if !waiter.is_cancelled() && lane.is_current(id) {
            lane.release(id);
            info!("Sweep #{} on {} complete", id, name);
        }
    }
}
