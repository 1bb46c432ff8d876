//! Simulator configuration: the variable catalogue and server endpoint.
//!
//! The catalogue is saved and loaded as JSON. `SimConfig::default()` is the
//! stock CNC machine: three continuous channels, spindle status, execution
//! state, two boolean flags and the loaded recipe.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::types::{Domain, ExecutionState, Recipe, SpindleStatus, Value};

/// Default endpoint advertised to the data-point server
pub const DEFAULT_ENDPOINT: &str = "opc.tcp://localhost:4840/freeopcua/server/";

/// Default namespace URI the variables are registered under
pub const DEFAULT_NAMESPACE: &str = "http://examples.freeopcua.github.io";

/// One simulated variable as declared in the catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    pub name: String,
    pub initial: Value,
    pub domain: Domain,
}

impl VariableSpec {
    pub fn new(name: impl Into<String>, initial: impl Into<Value>, domain: Domain) -> Self {
        Self {
            name: name.into(),
            initial: initial.into(),
            domain,
        }
    }
}

/// Simulator configuration that can be saved/loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub endpoint: String,
    pub namespace: String,
    pub variables: Vec<VariableSpec>,
}

impl SimConfig {
    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            anyhow::bail!("Endpoint must be specified");
        }
        if self.variables.is_empty() {
            anyhow::bail!("At least one variable must be declared");
        }

        let mut seen = HashSet::new();
        for spec in &self.variables {
            let name = spec.name.trim();
            if name.is_empty() {
                anyhow::bail!("Variable names cannot be empty");
            }
            if name != spec.name || name.contains(char::is_whitespace) {
                anyhow::bail!("Variable name '{}' cannot contain whitespace", spec.name);
            }
            if !seen.insert(name) {
                anyhow::bail!("Variable '{}' is declared more than once", name);
            }

            match &spec.domain {
                Domain::Continuous {
                    min: Some(lo),
                    max: Some(hi),
                } if lo > hi => {
                    anyhow::bail!("Variable '{}' has min {} above max {}", name, lo, hi);
                }
                Domain::Enumerated { values } => {
                    if values.is_empty() {
                        anyhow::bail!("Variable '{}' has an empty set of allowed values", name);
                    }
                    for (i, v) in values.iter().enumerate() {
                        if values[..i].contains(v) {
                            anyhow::bail!("Variable '{}' lists '{}' twice", name, v);
                        }
                        if v.kind() != values[0].kind() {
                            anyhow::bail!("Variable '{}' mixes value types", name);
                        }
                        // Values are typed as single words on the command line
                        if let Value::Text(text) = v {
                            if text.is_empty() || text.contains(char::is_whitespace) {
                                anyhow::bail!(
                                    "Variable '{}' value '{}' must be a single word",
                                    name,
                                    text
                                );
                            }
                        }
                    }
                }
                _ => {}
            }

            spec.domain
                .check(name, &spec.initial)
                .with_context(|| format!("Invalid initial value for '{}'", name))?;
        }

        Ok(())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            variables: vec![
                VariableSpec::new("c1", 0.0, Domain::continuous()),
                VariableSpec::new("c2", 0.0, Domain::continuous()),
                VariableSpec::new("c3", 0.0, Domain::continuous()),
                VariableSpec::new(
                    "spindle",
                    SpindleStatus::Off,
                    Domain::of::<SpindleStatus>(),
                ),
                VariableSpec::new(
                    "execution",
                    ExecutionState::Stopped,
                    Domain::of::<ExecutionState>(),
                ),
                VariableSpec::new("s3", false, Domain::boolean()),
                VariableSpec::new("MachineState", false, Domain::boolean()),
                VariableSpec::new("Recipe", Recipe::Gear, Domain::of::<Recipe>()),
            ],
        }
    }
}
