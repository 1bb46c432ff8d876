//! Data-point server seam
//!
//! The protocol server that exposes variables to SCADA clients lives outside
//! this crate. `PointServer` is the contract the simulator needs from it:
//! register each variable once at startup, start serving, publish changes,
//! stop. `bridge` wires an engine to a server and forwards the store's change
//! feed on a publisher thread.
//!
//! `TracingPointServer` is the in-process stand-in: it records registrations
//! and logs publications, which is enough to run the simulator and to test
//! the wiring without a protocol stack.

use crate::engine::{Engine, ValueChange};
use crate::error::{Result, SimError};
use crate::types::{Value, ValueKind};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// What the simulator requires from a data-point server
pub trait PointServer: Send {
    /// Register a variable with its initial value and scalar type
    fn register(&mut self, name: &str, initial: &Value, kind: ValueKind) -> Result<()>;

    /// Begin serving registered variables
    fn start(&mut self) -> Result<()>;

    /// Make a value change visible to clients
    fn publish(&mut self, change: &ValueChange);

    /// Stop serving
    fn stop(&mut self);
}

/// A registered data point as seen by `TracingPointServer`
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub name: String,
    pub kind: ValueKind,
    pub value: Value,
}

/// In-process server that logs instead of speaking a wire protocol
#[derive(Debug, Default)]
pub struct TracingPointServer {
    endpoint: String,
    points: Vec<Registration>,
    published: usize,
    running: bool,
}

impl TracingPointServer {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn points(&self) -> &[Registration] {
        &self.points
    }

    /// Number of changes published so far
    pub fn published(&self) -> usize {
        self.published
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl PointServer for TracingPointServer {
    fn register(&mut self, name: &str, initial: &Value, kind: ValueKind) -> Result<()> {
        if self.running {
            return Err(SimError::state(format!(
                "cannot register '{}' after the server started",
                name
            )));
        }
        if self.points.iter().any(|p| p.name == name) {
            return Err(SimError::config(format!("'{}' is already registered", name)));
        }
        debug!("Point registered: {} = {} ({})", name, initial, kind);
        self.points.push(Registration {
            name: name.to_string(),
            kind,
            value: initial.clone(),
        });
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        self.running = true;
        info!(
            "Serving {} point(s) at {}",
            self.points.len(),
            self.endpoint
        );
        Ok(())
    }

    fn publish(&mut self, change: &ValueChange) {
        match self.points.iter_mut().find(|p| p.name == change.name) {
            Some(point) => {
                point.value = change.value.clone();
                self.published += 1;
                debug!("Published {} = {} ({})", change.name, change.value, change.origin);
            }
            None => warn!("Change for unregistered point {}", change.name),
        }
    }

    fn stop(&mut self) {
        if self.running {
            self.running = false;
            info!("Server at {} stopped", self.endpoint);
        }
    }
}

/// Running publisher thread plus the server it feeds
pub struct PublisherHandle<S: PointServer> {
    server: Arc<Mutex<S>>,
    thread: Option<JoinHandle<()>>,
}

impl<S: PointServer> PublisherHandle<S> {
    /// Shared access to the server, e.g. to inspect published state
    pub fn server(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.server)
    }

    /// Wait for the change feed to end (engine shutdown) and stop the server
    pub fn stop(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Publisher thread panicked");
            }
        }
        if let Ok(mut server) = self.server.lock() {
            server.stop();
        }
    }
}

/// Register every engine variable with `server`, start it, and forward
/// value changes until the engine shuts down.
pub fn bridge<S: PointServer + 'static>(engine: &Engine, mut server: S) -> Result<PublisherHandle<S>> {
    for info in engine.list_variables()? {
        server.register(&info.name, &info.value, info.domain.kind())?;
    }
    server.start()?;

    let feed = engine.subscribe()?;
    let server = Arc::new(Mutex::new(server));
    let thread = {
        let server = Arc::clone(&server);
        thread::Builder::new()
            .name("publisher".to_string())
            .spawn(move || {
                for change in feed {
                    match server.lock() {
                        Ok(mut server) => server.publish(&change),
                        Err(_) => break,
                    }
                }
                debug!("Change feed closed, publisher exiting");
            })?
    };

    Ok(PublisherHandle {
        server,
        thread: Some(thread),
    })
}
