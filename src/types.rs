//! Type-safe value model for simulated variables
//!
//! A variable's value is a plain scalar (`Value`) and its legal values are
//! described by a `Domain`. The machine vocabulary of the simulated CNC
//! (spindle status, execution state, recipes) is expressed as strum enums so
//! the default catalogue is checked at compile time rather than typed out.

use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// A live variable value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Value {
    /// The scalar type of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Float(_) => ValueKind::Float,
            Self::Bool(_) => ValueKind::Bool,
            Self::Text(_) => ValueKind::Text,
        }
    }

    /// The float payload, if any
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Scalar type handed to the data-point server when a variable is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum ValueKind {
    Float,
    Bool,
    Text,
}

/// The set of values a variable may legally hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Domain {
    /// Any finite float, optionally clamped by inclusive bounds
    Continuous {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// An ordered set of allowed values
    Enumerated { values: Vec<Value> },
}

impl Domain {
    /// Unbounded continuous domain
    pub const fn continuous() -> Self {
        Self::Continuous {
            min: None,
            max: None,
        }
    }

    /// Continuous domain with inclusive bounds
    pub const fn bounded(min: f64, max: f64) -> Self {
        Self::Continuous {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Enumerated domain built from any values
    pub fn enumerated<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Self::Enumerated {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Boolean domain `{true, false}`
    pub fn boolean() -> Self {
        Self::enumerated([true, false])
    }

    /// Enumerated domain containing every variant of a strum enum
    pub fn of<E: IntoEnumIterator + fmt::Display>() -> Self {
        Self::enumerated(E::iter().map(|e| e.to_string()))
    }

    pub fn is_continuous(&self) -> bool {
        matches!(self, Self::Continuous { .. })
    }

    /// Scalar type of the values this domain admits
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Continuous { .. } => ValueKind::Float,
            Self::Enumerated { values } => values
                .first()
                .map(Value::kind)
                .unwrap_or(ValueKind::Text),
        }
    }

    /// Allowed values of an enumerated domain (empty for continuous)
    pub fn allowed(&self) -> &[Value] {
        match self {
            Self::Continuous { .. } => &[],
            Self::Enumerated { values } => values,
        }
    }

    /// Returns true if `value` may be held by a variable of this domain
    pub fn admits(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Continuous { min, max }, Value::Float(v)) => {
                v.is_finite()
                    && min.is_none_or(|lo| *v >= lo)
                    && max.is_none_or(|hi| *v <= hi)
            }
            (Self::Continuous { .. }, _) => false,
            (Self::Enumerated { values }, v) => values.contains(v),
        }
    }

    /// Validate `value` for variable `name`, describing the violation on failure
    pub fn check(&self, name: &str, value: &Value) -> Result<()> {
        if self.admits(value) {
            return Ok(());
        }
        Err(match self {
            Self::Continuous { .. } if value.kind() != ValueKind::Float => SimError::domain(
                format!("'{}' expects a number, got {} '{}'", name, value.kind(), value),
            ),
            Self::Continuous { .. } => SimError::domain(format!(
                "{} is outside the range of '{}' ({})",
                value, name, self
            )),
            Self::Enumerated { .. } => SimError::domain(format!(
                "'{}' is not allowed for '{}' (expected one of {})",
                value, name, self
            )),
        })
    }

    /// Parse operator text into a value of this domain.
    ///
    /// Enumerated members match exactly first, then case-insensitively, so
    /// `true`, `True` and `TRUE` all select the boolean member.
    pub fn parse_value(&self, text: &str) -> Result<Value> {
        let text = text.trim();
        match self {
            Self::Continuous { .. } => text
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| SimError::domain(format!("'{}' is not a number", text))),
            Self::Enumerated { values } => values
                .iter()
                .find(|v| v.to_string() == text)
                .or_else(|| {
                    values
                        .iter()
                        .find(|v| v.to_string().eq_ignore_ascii_case(text))
                })
                .cloned()
                .ok_or_else(|| {
                    SimError::domain(format!("'{}' is not one of {}", text, self))
                }),
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continuous {
                min: None,
                max: None,
            } => write!(f, "continuous"),
            Self::Continuous { min, max } => {
                let lo = min.map_or("-inf".to_string(), |v| v.to_string());
                let hi = max.map_or("+inf".to_string(), |v| v.to_string());
                write!(f, "continuous [{}, {}]", lo, hi)
            }
            Self::Enumerated { values } => {
                let names: Vec<String> = values.iter().map(Value::to_string).collect();
                write!(f, "{{{}}}", names.join(", "))
            }
        }
    }
}

/// Spindle control status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "UPPERCASE")]
pub enum SpindleStatus {
    Active,
    Idle,
    #[default]
    Off,
    Fault,
}

/// CNC machine execution state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ExecutionState {
    Ready,
    #[default]
    Stopped,
    Active,
    Interrupted,
}

/// Product recipe loaded on the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
pub enum Recipe {
    #[default]
    Gear,
    Shaft,
    Bolt,
}

impl From<SpindleStatus> for Value {
    fn from(value: SpindleStatus) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<ExecutionState> for Value {
    fn from(value: ExecutionState) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Recipe> for Value {
    fn from(value: Recipe) -> Self {
        Self::Text(value.to_string())
    }
}
