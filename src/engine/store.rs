//! Variable Store
//!
//! Name → current value + domain. Every variable is registered once when the
//! store is built and lives until the store is dropped. Each value sits behind
//! its own lock, so reads and writes on different variables never contend.
//!
//! Writers are validated against the domain before the value is touched; a
//! rejected write leaves the store unmodified. Every accepted write is
//! broadcast to subscribers in write order per variable.

use crate::config::VariableSpec;
use crate::error::{Result, SimError, poisoned};
use crate::types::{Domain, Value};
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Instant;
use tracing::{debug, info};

/// Who caused a value change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeOrigin {
    /// Explicit `set` from the control surface
    Operator,
    /// Automatic restore after a timed override expired
    Revert,
    /// A step of a running sweep
    Sweep,
}

impl std::fmt::Display for ChangeOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Operator => write!(f, "operator"),
            Self::Revert => write!(f, "revert"),
            Self::Sweep => write!(f, "sweep"),
        }
    }
}

/// Notification emitted for every accepted write
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChange {
    pub name: String,
    pub value: Value,
    pub origin: ChangeOrigin,
    pub at: Instant,
}

#[derive(Debug)]
struct Slot {
    domain: Domain,
    value: RwLock<Value>,
}

/// Process-wide registry of simulated variables
#[derive(Debug)]
pub struct VariableStore {
    /// Registration order, used for listing
    order: Vec<String>,
    slots: HashMap<String, Slot>,
    subscribers: Mutex<Vec<Sender<ValueChange>>>,
}

impl VariableStore {
    /// Build the store from catalogue entries, registering each variable once.
    ///
    /// # Errors
    ///
    /// - `Config` if a name is empty or registered twice
    /// - `Domain` if an initial value is outside its variable's domain
    pub fn new(specs: &[VariableSpec]) -> Result<Self> {
        let mut order = Vec::with_capacity(specs.len());
        let mut slots = HashMap::with_capacity(specs.len());

        for spec in specs {
            if spec.name.trim().is_empty() {
                return Err(SimError::config("variable names cannot be empty"));
            }
            if slots.contains_key(&spec.name) {
                return Err(SimError::config(format!(
                    "variable '{}' is registered twice",
                    spec.name
                )));
            }
            spec.domain.check(&spec.name, &spec.initial)?;

            debug!(
                "Registered variable {} = {} ({})",
                spec.name, spec.initial, spec.domain
            );
            order.push(spec.name.clone());
            slots.insert(
                spec.name.clone(),
                Slot {
                    domain: spec.domain.clone(),
                    value: RwLock::new(spec.initial.clone()),
                },
            );
        }

        info!("Variable store ready with {} variable(s)", order.len());
        Ok(Self {
            order,
            slots,
            subscribers: Mutex::new(Vec::new()),
        })
    }

    fn slot(&self, name: &str) -> Result<&Slot> {
        self.slots
            .get(name)
            .ok_or_else(|| SimError::unknown_variable(name))
    }

    /// Variable names in registration order
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Domain of a registered variable
    pub fn domain(&self, name: &str) -> Result<&Domain> {
        self.slot(name).map(|slot| &slot.domain)
    }

    /// Current value of a registered variable.
    ///
    /// Only fails for unknown names. A poisoned lock still holds a whole
    /// value (writes are single assignments), so it is read through.
    pub fn get(&self, name: &str) -> Result<Value> {
        let slot = self.slot(name)?;
        let value = slot.value.read().unwrap_or_else(PoisonError::into_inner);
        Ok(value.clone())
    }

    /// Operator write: validate and replace the current value
    pub fn set(&self, name: &str, value: Value) -> Result<()> {
        self.write(name, value, ChangeOrigin::Operator)
    }

    /// Validate and replace the current value, tagging the change with `origin`
    pub fn write(&self, name: &str, value: Value, origin: ChangeOrigin) -> Result<()> {
        let slot = self.slot(name)?;
        slot.domain.check(name, &value)?;

        let mut current = slot.value.write().unwrap_or_else(PoisonError::into_inner);
        *current = value.clone();
        debug!("{} = {} ({})", name, value, origin);

        // Broadcast while still holding the value lock so subscribers see
        // writes to one variable in the order they happened.
        self.notify(ValueChange {
            name: name.to_string(),
            value,
            origin,
            at: Instant::now(),
        });
        Ok(())
    }

    /// Subscribe to every accepted write from now on
    pub fn subscribe(&self) -> Result<Receiver<ValueChange>> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.lock().map_err(poisoned)?.push(tx);
        Ok(rx)
    }

    /// Drop all subscriber channels; receivers observe disconnection
    pub fn close_subscriptions(&self) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            let count = subscribers.len();
            subscribers.clear();
            debug!("Closed {} subscription(s)", count);
        }
    }

    fn notify(&self, change: ValueChange) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.retain(|tx| tx.send(change.clone()).is_ok());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;

    fn store() -> VariableStore {
        VariableStore::new(&SimConfig::default().variables).unwrap()
    }

    #[test]
    fn test_registration_order_is_preserved() {
        let store = store();
        assert_eq!(
            store.names(),
            &["c1", "c2", "c3", "spindle", "execution", "s3", "MachineState", "Recipe"]
        );
        assert_eq!(store.len(), 8);
    }

    #[test]
    fn test_get_unknown_variable() {
        let err = store().get("c9").unwrap_err();
        assert!(matches!(err, SimError::UnknownVariable(name) if name == "c9"));
    }

    #[test]
    fn test_set_is_immediately_visible() {
        let store = store();
        store.set("c1", Value::Float(4.5)).unwrap();
        assert_eq!(store.get("c1").unwrap(), Value::Float(4.5));

        store.set("spindle", Value::from("ACTIVE")).unwrap();
        assert_eq!(store.get("spindle").unwrap(), Value::from("ACTIVE"));
    }

    #[test]
    fn test_rejected_set_leaves_value_unchanged() {
        let store = store();
        let err = store.set("spindle", Value::from("SPINNING")).unwrap_err();
        assert!(matches!(err, SimError::Domain(_)));
        assert_eq!(store.get("spindle").unwrap(), Value::from("OFF"));

        assert!(store.set("c1", Value::Bool(true)).is_err());
        assert_eq!(store.get("c1").unwrap(), Value::Float(0.0));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut specs = SimConfig::default().variables;
        specs.push(specs[0].clone());
        assert!(matches!(VariableStore::new(&specs), Err(SimError::Config(_))));
    }

    #[test]
    fn test_subscribers_receive_changes_in_order() {
        let store = store();
        let rx = store.subscribe().unwrap();

        store.set("c2", Value::Float(1.0)).unwrap();
        store
            .write("c2", Value::Float(2.0), ChangeOrigin::Sweep)
            .unwrap();
        let _ = store.set("c2", Value::from("bad"));

        let changes: Vec<ValueChange> = rx.try_iter().collect();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].value, Value::Float(1.0));
        assert_eq!(changes[0].origin, ChangeOrigin::Operator);
        assert_eq!(changes[1].value, Value::Float(2.0));
        assert_eq!(changes[1].origin, ChangeOrigin::Sweep);
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let store = store();
        let rx = store.subscribe().unwrap();
        drop(rx);
        store.set("c1", Value::Float(1.0)).unwrap();
        assert!(store.subscribers.lock().unwrap().is_empty());
    }

    #[test]
    fn test_close_subscriptions_disconnects_receivers() {
        let store = store();
        let rx = store.subscribe().unwrap();
        store.close_subscriptions();
        assert!(rx.recv().is_err());
    }
}
