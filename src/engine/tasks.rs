//! Per-variable task lanes
//!
//! Every variable owns one lane. A lane holds at most one scheduled task: a
//! pending revert or a running sweep. Scheduling on a lane cancels whatever
//! the lane held before (cancel-and-replace), so the newest request always
//! decides what happens next.
//!
//! # Locking
//!
//! The lane mutex is the serialization point for one variable. Requests take
//! it to swap tasks; a task thread takes it before each write and re-checks
//! its cancellation flag under it. A task that has been cancelled therefore
//! never writes again once the cancelling call returns. Lanes of different
//! variables are independent mutexes and never wait on each other.

use crate::error::{Result, SimError, poisoned};
use crate::types::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::debug;

/// Convert operator seconds into a `Duration`.
///
/// # Errors
///
/// `InvalidDuration` for negative, NaN, infinite or overflowing values.
pub fn duration_from_secs(what: &str, secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(SimError::invalid_duration(format!(
            "{} must be a non-negative number of seconds, got {}",
            what, secs
        )));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| SimError::invalid_duration(format!("{} of {}s: {}", what, secs, e)))
}

/// What a lane is currently running
#[derive(Debug, Clone)]
pub(crate) enum TaskKind {
    Revert { restore: Value, deadline: Instant },
    Sweep { total: usize, done: Arc<AtomicUsize> },
}

/// Board-side half of a cancellation pair
#[derive(Debug)]
pub(crate) struct Canceller {
    flag: Arc<AtomicBool>,
    wake: Sender<()>,
}

impl Canceller {
    fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
        let _ = self.wake.send(());
    }
}

/// Task-side half of a cancellation pair
#[derive(Debug)]
pub(crate) struct Waiter {
    flag: Arc<AtomicBool>,
    wake: Receiver<()>,
}

impl Waiter {
    /// Sleep for `period` unless cancelled first. Returns true if the task
    /// should keep going.
    pub(crate) fn sleep(&self, period: Duration) -> bool {
        match self.wake.recv_timeout(period) {
            Err(RecvTimeoutError::Timeout) => !self.is_cancelled(),
            // Woken explicitly, or the canceller was dropped with its task
            Ok(()) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

pub(crate) fn cancellation() -> (Canceller, Waiter) {
    let flag = Arc::new(AtomicBool::new(false));
    let (wake, rx) = mpsc::channel();
    (
        Canceller {
            flag: flag.clone(),
            wake,
        },
        Waiter { flag, wake: rx },
    )
}

/// A task installed on a lane
#[derive(Debug)]
pub(crate) struct Scheduled {
    pub(crate) id: u64,
    pub(crate) kind: TaskKind,
    pub(crate) canceller: Canceller,
    pub(crate) handle: Option<JoinHandle<()>>,
}

/// One variable's scheduling slot
#[derive(Debug, Default)]
pub(crate) struct Lane {
    current: Option<Scheduled>,
}

impl Lane {
    pub(crate) fn current(&self) -> Option<&Scheduled> {
        self.current.as_ref()
    }

    /// True if task `id` is still the one installed here
    pub(crate) fn is_current(&self, id: u64) -> bool {
        self.current.as_ref().is_some_and(|task| task.id == id)
    }

    pub(crate) fn install(&mut self, task: Scheduled) -> Option<Scheduled> {
        self.current.replace(task)
    }

    pub(crate) fn take(&mut self) -> Option<Scheduled> {
        self.current.take()
    }

    /// Clear the lane if task `id` still owns it (a finished task releasing itself)
    pub(crate) fn release(&mut self, id: u64) {
        if self.is_current(id) {
            self.current = None;
        }
    }
}

/// All lanes, plus the bookkeeping needed to join tasks at shutdown
#[derive(Debug)]
pub(crate) struct TaskBoard {
    lanes: HashMap<String, Mutex<Lane>>,
    next_id: AtomicU64,
    /// Handles of superseded tasks, joined at shutdown
    retired: Mutex<Vec<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl TaskBoard {
    pub(crate) fn new<'a>(names: impl IntoIterator<Item = &'a String>) -> Self {
        Self {
            lanes: names
                .into_iter()
                .map(|name| (name.clone(), Mutex::new(Lane::default())))
                .collect(),
            next_id: AtomicU64::new(1),
            retired: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub(crate) fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Lock the lane of `name`.
    ///
    /// Fails with `State` once the board is closed, so no task can be
    /// installed after shutdown has drained the lanes.
    pub(crate) fn lock(&self, name: &str) -> Result<MutexGuard<'_, Lane>> {
        let lane = self
            .lanes
            .get(name)
            .ok_or_else(|| SimError::unknown_variable(name))?
            .lock()
            .map_err(poisoned)?;
        if self.is_closed() {
            return Err(SimError::state("engine is shut down"));
        }
        Ok(lane)
    }

    /// Lock a lane for inspection only; works after shutdown
    pub(crate) fn peek(&self, name: &str) -> Result<MutexGuard<'_, Lane>> {
        self.lanes
            .get(name)
            .ok_or_else(|| SimError::unknown_variable(name))?
            .lock()
            .map_err(poisoned)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Cancel a task that was removed from its lane and keep its handle
    /// for shutdown. Must be called with the task's lane still locked.
    pub(crate) fn retire(&self, mut task: Scheduled) {
        task.canceller.cancel();
        debug!("Cancelled task #{}", task.id);
        if let Some(handle) = task.handle.take() {
            if let Ok(mut retired) = self.retired.lock() {
                retired.retain(|h| !h.is_finished());
                retired.push(handle);
            }
        }
    }

    /// Close the board, cancel every task and return all handles to join.
    /// Idempotent: later calls return an empty list.
    pub(crate) fn close(&self) -> Vec<JoinHandle<()>> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Vec::new();
        }

        let mut handles = Vec::new();
        for (name, lane) in &self.lanes {
            let Ok(mut lane) = lane.lock() else {
                continue;
            };
            if let Some(mut task) = lane.take() {
                debug!("Cancelling task #{} on {} for shutdown", task.id, name);
                task.canceller.cancel();
                handles.extend(task.handle.take());
            }
        }
        if let Ok(mut retired) = self.retired.lock() {
            handles.append(&mut retired);
        }
        handles
    }

    #[cfg(test)]
    pub(crate) fn retired_count(&self) -> usize {
        self.retired.lock().map(|r| r.len()).unwrap_or(0)
    }
}
