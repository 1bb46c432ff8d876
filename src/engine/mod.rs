//! Variable Simulation Engine
//!
//! The engine owns the variable store and one task lane per variable. It is
//! the only API the control surface and the data-point server talk to:
//!
//! - `list_variables` / `get_value` read the store without waiting on tasks
//! - `set_value` applies a permanent or timed override (`timed`)
//! - `start_sweep` / `start_sequence` / `cancel_sweep` drive sweeps (`sweep`)
//! - `shutdown` cancels every pending revert and sweep and joins their threads
//!
//! # Concurrency
//!
//! Each pending revert and each running sweep is its own thread parked on a
//! cancellable wait. Requests on a variable cancel-and-replace that
//! variable's task under its lane lock; requests on different variables
//! never touch the same lock. Callers are never blocked by a task's wait.

pub mod sequence;
pub mod store;
mod sweep;
mod tasks;
mod timed;

pub use sequence::{MAX_SEQUENCE_LEN, SweepOrder, generate, sequence_len};
pub use store::{ChangeOrigin, ValueChange, VariableStore};
pub use tasks::duration_from_secs;

use crate::config::SimConfig;
use crate::error::Result;
use crate::types::{Domain, Value};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};
use tasks::{TaskBoard, TaskKind};
use tracing::{info, warn};

/// State shared between the engine handle and its task threads
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) store: VariableStore,
    pub(crate) board: TaskBoard,
}

/// What the scheduler is doing with a variable right now
#[derive(Debug, Clone, PartialEq)]
pub enum Activity {
    Idle,
    /// A timed override will restore `restore` in `remaining`
    RevertPending { restore: Value, remaining: Duration },
    /// A sweep has written `step` of `total` values
    Sweeping { step: usize, total: usize },
}

impl std::fmt::Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::RevertPending { restore, remaining } => write!(
                f,
                "reverts to {} in {:.1}s",
                restore,
                remaining.as_secs_f64()
            ),
            Self::Sweeping { step, total } => write!(f, "sweeping {}/{}", step, total),
        }
    }
}

/// Snapshot of one variable for listing
#[derive(Debug, Clone, PartialEq)]
pub struct VariableInfo {
    pub name: String,
    pub domain: Domain,
    pub value: Value,
    pub activity: Activity,
}

/// Handle to the simulation engine.
///
/// Dropping the engine shuts it down.
#[derive(Debug)]
pub struct Engine {
    shared: Arc<Shared>,
}

impl Engine {
    /// Build an engine for every variable in `config`.
    pub fn new(config: &SimConfig) -> Result<Self> {
        let store = VariableStore::new(&config.variables)?;
        let board = TaskBoard::new(store.names());
        info!("Engine started for {}", config.endpoint);
        Ok(Self {
            shared: Arc::new(Shared { store, board }),
        })
    }

    /// Read-only access to the store
    pub fn store(&self) -> &VariableStore {
        &self.shared.store
    }

    /// Every variable with its domain, live value and activity, in
    /// registration order
    pub fn list_variables(&self) -> Result<Vec<VariableInfo>> {
        self.shared
            .store
            .names()
            .iter()
            .map(|name| {
                Ok(VariableInfo {
                    name: name.clone(),
                    domain: self.shared.store.domain(name)?.clone(),
                    value: self.shared.store.get(name)?,
                    activity: self.activity(name)?,
                })
            })
            .collect()
    }

    /// Current value of `name`
    pub fn get_value(&self, name: &str) -> Result<Value> {
        self.shared.store.get(name)
    }

    /// Domain of `name`
    pub fn domain(&self, name: &str) -> Result<&Domain> {
        self.shared.store.domain(name)
    }

    /// Set `name` to `value`. With `duration_secs`, the previous value is
    /// restored once that many seconds pass, unless another request on
    /// `name` comes first.
    ///
    /// # Errors
    ///
    /// `UnknownVariable`, `Domain`, `InvalidDuration`, or `State` after shutdown.
    pub fn set_value(&self, name: &str, value: Value, duration_secs: Option<f64>) -> Result<()> {
        timed::apply(&self.shared, name, value, duration_secs)
    }

    /// Sweep `name` over `[start, stop)` by `step`, waiting `delay_secs`
    /// after each value.
    ///
    /// # Errors
    ///
    /// `UnknownVariable`, `Domain`, `InvalidRange`, `InvalidDuration`, or
    /// `State` after shutdown.
    pub fn start_sweep(
        &self,
        name: &str,
        start: f64,
        stop: f64,
        step: f64,
        order: SweepOrder,
        delay_secs: f64,
    ) -> Result<usize> {
        // Cheap checks first so a bad request never pays for generation.
        self.shared.store.domain(name)?;
        duration_from_secs("delay", delay_secs)?;
        let values = generate(start, stop, step, order)?;
        let len = values.len();
        self.start_sequence(name, values, delay_secs)?;
        Ok(len)
    }

    /// Sweep `name` over an explicit sequence
    pub fn start_sequence(&self, name: &str, values: Vec<f64>, delay_secs: f64) -> Result<()> {
        sweep::start(&self.shared, name, values, delay_secs)
    }

    /// Stop the sweep on `name`. Returns true if one was running.
    pub fn cancel_sweep(&self, name: &str) -> Result<bool> {
        sweep::cancel(&self.shared, name)
    }

    /// What is scheduled on `name`
    pub fn activity(&self, name: &str) -> Result<Activity> {
        let lane = self.shared.board.peek(name)?;
        Ok(match lane.current().map(|task| &task.kind) {
            None => Activity::Idle,
            Some(TaskKind::Revert { restore, deadline }) => Activity::RevertPending {
                restore: restore.clone(),
                remaining: deadline.saturating_duration_since(Instant::now()),
            },
            Some(TaskKind::Sweep { total, done }) => Activity::Sweeping {
                step: done.load(Ordering::SeqCst),
                total: *total,
            },
        })
    }

    /// Receive every value change from now on
    pub fn subscribe(&self) -> Result<Receiver<ValueChange>> {
        self.shared.store.subscribe()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.board.is_closed()
    }

    /// Cancel every pending revert and sweep, join their threads and close
    /// subscriptions. Values stay as they are. Idempotent.
    pub fn shutdown(&self) {
        if self.shared.board.is_closed() {
            return;
        }
        let handles = self.shared.board.close();

        let count = handles.len();
        for handle in handles {
            if handle.join().is_err() {
                warn!("A scheduled task panicked before shutdown");
            }
        }
        self.shared.store.close_subscriptions();
        info!("Engine shut down, {} task thread(s) joined", count);
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;

    fn engine() -> Engine {
        Engine::new(&SimConfig::default()).unwrap()
    }

    #[test]
    fn test_list_variables_reports_initial_state() {
        let engine = engine();
        let vars = engine.list_variables().unwrap();
        assert_eq!(vars.len(), 8);
        assert_eq!(vars[3].name, "spindle");
        assert_eq!(vars[3].value, Value::from("OFF"));
        assert!(vars.iter().all(|v| v.activity == Activity::Idle));
    }

    #[test]
    fn test_permanent_set() {
        let engine = engine();
        engine.set_value("c1", Value::Float(3.0), None).unwrap();
        assert_eq!(engine.get_value("c1").unwrap(), Value::Float(3.0));
        assert_eq!(engine.activity("c1").unwrap(), Activity::Idle);
    }

    #[test]
    fn test_timed_set_reports_pending_revert() {
        let engine = engine();
        engine
            .set_value("spindle", Value::from("ACTIVE"), Some(30.0))
            .unwrap();
        match engine.activity("spindle").unwrap() {
            Activity::RevertPending { restore, remaining } => {
                assert_eq!(restore, Value::from("OFF"));
                assert!(remaining > Duration::from_secs(25));
            }
            other => panic!("Expected pending revert, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_requests_leave_state_untouched() {
        let engine = engine();
        assert!(matches!(
            engine.set_value("spindle", Value::from("SPINNING"), None),
            Err(SimError::Domain(_))
        ));
        assert!(matches!(
            engine.set_value("spindle", Value::from("IDLE"), Some(-1.0)),
            Err(SimError::InvalidDuration(_))
        ));
        assert!(matches!(
            engine.start_sweep("c1", 0.0, 1.0, 0.0, SweepOrder::Ascending, 0.1),
            Err(SimError::InvalidRange(_))
        ));
        assert!(matches!(
            engine.start_sweep("spindle", 0.0, 1.0, 0.5, SweepOrder::Ascending, 0.1),
            Err(SimError::Domain(_))
        ));
        assert!(matches!(
            engine.cancel_sweep("nope"),
            Err(SimError::UnknownVariable(_))
        ));

        assert_eq!(engine.get_value("spindle").unwrap(), Value::from("OFF"));
        assert_eq!(engine.activity("spindle").unwrap(), Activity::Idle);
        assert_eq!(engine.activity("c1").unwrap(), Activity::Idle);
    }

    #[test]
    fn test_sweep_reports_progress_and_can_be_cancelled() {
        let engine = engine();
        let len = engine
            .start_sweep("c2", 0.0, 10.0, 1.0, SweepOrder::Ascending, 30.0)
            .unwrap();
        assert_eq!(len, 10);

        // First step is written before the first wait
        let start = Instant::now();
        while engine.get_value("c2").unwrap() != Value::Float(0.0)
            || engine.activity("c2").unwrap() != (Activity::Sweeping { step: 1, total: 10 })
        {
            assert!(start.elapsed() < Duration::from_secs(5));
            std::thread::sleep(Duration::from_millis(5));
        }

        assert!(engine.cancel_sweep("c2").unwrap());
        assert!(!engine.cancel_sweep("c2").unwrap());
        assert_eq!(engine.activity("c2").unwrap(), Activity::Idle);
    }

    #[test]
    fn test_shutdown_rejects_new_work_and_keeps_values() {
        let engine = engine();
        engine
            .set_value("execution", Value::from("ACTIVE"), Some(60.0))
            .unwrap();
        engine.shutdown();

        assert!(engine.is_shut_down());
        assert_eq!(engine.get_value("execution").unwrap(), Value::from("ACTIVE"));
        assert!(matches!(
            engine.set_value("c1", Value::Float(1.0), None),
            Err(SimError::State(_))
        ));
        assert_eq!(engine.activity("execution").unwrap(), Activity::Idle);
        engine.shutdown();
    }

    #[test]
    fn test_activity_display() {
        assert_eq!(Activity::Idle.to_string(), "idle");
        assert_eq!(
            Activity::Sweeping { step: 2, total: 5 }.to_string(),
            "sweeping 2/5"
        );
        assert_eq!(
            Activity::RevertPending {
                restore: Value::from("OFF"),
                remaining: Duration::from_millis(1500)
            }
            .to_string(),
            "reverts to OFF in 1.5s"
        );
    }
}
