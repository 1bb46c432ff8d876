//! CNC Simulator Library
//!
//! A simulated CNC machine whose variables can be overridden for a while,
//! swept through numeric ranges, and watched by a data-point server.

pub mod app;
pub mod cli;
pub mod components;
pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod server;
pub mod theme;
pub mod types;
pub mod ui;

// Re-export main types for convenience
pub use config::{SimConfig, VariableSpec};
pub use control::{Command, CommandError, ControlSurface, Reply};
pub use engine::{Activity, ChangeOrigin, Engine, SweepOrder, ValueChange, VariableInfo};
pub use error::{Result, SimError};
pub use server::{PointServer, TracingPointServer, bridge};
pub use types::{Domain, ExecutionState, Recipe, SpindleStatus, Value, ValueKind};
