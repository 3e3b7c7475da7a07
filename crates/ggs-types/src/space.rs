//! Parameter values, domain definitions and the search space.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::ops::Index;

use crate::errors::{SearchResult, SpaceError};
use crate::validation_error;

/// A concrete candidate value for a parameter.
///
/// Serialized untagged. Build `Json` values through `From<serde_json::Value>`,
/// which maps strings and numbers onto `Text`, `Int` and `Float`, so a value
/// reads back as the same variant it was written from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Int(i64),
    Float(f64),
    Text(String),
    /// Booleans, null, arrays and objects.
    Json(serde_json::Value),
}

impl ParameterValue {
    /// Numeric view of the value. Integers are widened; JSON numbers are
    /// read through.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Json(v) => v.as_f64(),
            Self::Text(_) => None,
        }
    }

    /// Integer view of the value. Floats only convert when they carry no
    /// fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            Self::Float(_) => None,
            Self::Json(v) => v.as_i64(),
            Self::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            Self::Json(v) => v.as_str(),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
            Self::Json(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for ParameterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ParameterValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for ParameterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ParameterValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<serde_json::Value> for ParameterValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::String(s) => Self::Text(s),
            serde_json::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Self::Int(i),
                (None, Some(f)) => Self::Float(f),
                (None, None) => Self::Json(serde_json::Value::Number(n)),
            },
            other => Self::Json(other),
        }
    }
}

/// One concrete assignment of values to every parameter, keyed by name.
///
/// This is what the objective receives and what a search reports as its
/// best parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(BTreeMap<String, ParameterValue>);

impl ParameterSet {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParameterValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Looks up a numeric parameter, failing with a validation error if it
    /// is missing or not numeric.
    pub fn f64(&self, name: &str) -> SearchResult<f64> {
        self.get(name)
            .and_then(ParameterValue::as_f64)
            .ok_or_else(|| validation_error!("parameter '{}' is missing or not numeric", name))
    }

    pub fn i64(&self, name: &str) -> SearchResult<i64> {
        self.get(name)
            .and_then(ParameterValue::as_i64)
            .ok_or_else(|| validation_error!("parameter '{}' is missing or not an integer", name))
    }

    pub fn str(&self, name: &str) -> SearchResult<&str> {
        self.get(name)
            .and_then(ParameterValue::as_str)
            .ok_or_else(|| validation_error!("parameter '{}' is missing or not a string", name))
    }
}

impl Index<&str> for ParameterSet {
    type Output = ParameterValue;

    fn index(&self, name: &str) -> &ParameterValue {
        &self.0[name]
    }
}

impl FromIterator<(String, ParameterValue)> for ParameterSet {
    fn from_iter<T: IntoIterator<Item = (String, ParameterValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("}")
    }
}

/// A single parameter dimension in the search space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDef {
    /// Human-readable parameter name (e.g. "learning_rate").
    pub name: String,
    /// How the candidate list is produced.
    pub kind: ParameterKind,
}

/// Describes how a parameter's ordered candidate list is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterKind {
    /// Explicit ordered candidates.
    Values { values: Vec<ParameterValue> },
    /// Integers `low, low + step, ...` up to and including `high`.
    IntRange { low: i64, high: i64, step: i64 },
    /// `steps` evenly spaced floats from `low` to `high` inclusive.
    FloatSteps { low: f64, high: f64, steps: usize },
    /// `steps` floats evenly spaced in log-space from `low` to `high`.
    LogSteps { low: f64, high: f64, steps: usize },
    /// Categorical choices.
    Choice { values: Vec<serde_json::Value> },
}

impl ParameterDef {
    /// Materializes the ordered candidate list for this parameter.
    pub fn domain(&self) -> Result<Vec<ParameterValue>, SpaceError> {
        let name = || self.name.clone();
        let values = match &self.kind {
            ParameterKind::Values { values } => values.clone(),
            ParameterKind::IntRange { low, high, step } => {
                if *step <= 0 {
                    return Err(SpaceError::InvalidStep {
                        name: name(),
                        step: *step,
                    });
                }
                if low > high {
                    return Err(SpaceError::InvalidIntBounds {
                        name: name(),
                        low: *low,
                        high: *high,
                    });
                }
                let mut values = Vec::new();
                let mut current = *low;
                while current <= *high {
                    values.push(ParameterValue::Int(current));
                    current = match current.checked_add(*step) {
                        Some(next) => next,
                        None => break,
                    };
                }
                values
            }
            ParameterKind::FloatSteps { low, high, steps } => {
                check_float_bounds(&self.name, *low, *high, *steps)?;
                linspace(*low, *high, *steps)
                    .into_iter()
                    .map(ParameterValue::Float)
                    .collect()
            }
            ParameterKind::LogSteps { low, high, steps } => {
                check_float_bounds(&self.name, *low, *high, *steps)?;
                if *low <= 0.0 {
                    return Err(SpaceError::NonPositiveLogBound {
                        name: name(),
                        low: *low,
                    });
                }
                linspace(low.ln(), high.ln(), *steps)
                    .into_iter()
                    .map(|v| ParameterValue::Float(v.exp()))
                    .collect()
            }
            ParameterKind::Choice { values } => {
                values.iter().cloned().map(ParameterValue::from).collect()
            }
        };

        if values.is_empty() {
            return Err(SpaceError::EmptyDomain { name: name() });
        }
        Ok(values)
    }
}

fn check_float_bounds(name: &str, low: f64, high: f64, steps: usize) -> Result<(), SpaceError> {
    if steps == 0 {
        return Err(SpaceError::ZeroSteps {
            name: name.to_string(),
        });
    }
    if low.is_nan() || high.is_nan() || low > high {
        return Err(SpaceError::InvalidBounds {
            name: name.to_string(),
            low,
            high,
        });
    }
    Ok(())
}

fn linspace(low: f64, high: f64, steps: usize) -> Vec<f64> {
    if steps == 1 {
        return vec![low];
    }
    (0..steps)
        .map(|i| {
            let t = i as f64 / (steps - 1) as f64;
            low + t * (high - low)
        })
        .collect()
}

/// The full search space: an ordered list of parameter definitions.
///
/// Parameter order fixes the dimension order of grid coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    pub parameters: Vec<ParameterDef>,
}

impl SearchSpace {
    pub fn new() -> Self {
        Self {
            parameters: Vec::new(),
        }
    }

    fn push(mut self, name: impl Into<String>, kind: ParameterKind) -> Self {
        self.parameters.push(ParameterDef {
            name: name.into(),
            kind,
        });
        self
    }

    pub fn add_values<V>(
        self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self
    where
        V: Into<ParameterValue>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.push(name, ParameterKind::Values { values })
    }

    pub fn add_int(self, name: impl Into<String>, low: i64, high: i64) -> Self {
        self.add_int_step(name, low, high, 1)
    }

    pub fn add_int_step(self, name: impl Into<String>, low: i64, high: i64, step: i64) -> Self {
        self.push(name, ParameterKind::IntRange { low, high, step })
    }

    pub fn add_float_steps(
        self,
        name: impl Into<String>,
        low: f64,
        high: f64,
        steps: usize,
    ) -> Self {
        self.push(name, ParameterKind::FloatSteps { low, high, steps })
    }

    pub fn add_log_steps(
        self,
        name: impl Into<String>,
        low: f64,
        high: f64,
        steps: usize,
    ) -> Self {
        self.push(name, ParameterKind::LogSteps { low, high, steps })
    }

    pub fn add_choice(self, name: impl Into<String>, values: Vec<serde_json::Value>) -> Self {
        self.push(name, ParameterKind::Choice { values })
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.name.as_str())
    }

    /// Validates the space and materializes every domain in parameter order.
    pub fn domains(&self) -> Result<Vec<Vec<ParameterValue>>, SpaceError> {
        if self.parameters.is_empty() {
            return Err(SpaceError::Empty);
        }

        let mut seen = HashSet::new();
        let mut domains = Vec::with_capacity(self.parameters.len());
        for param in &self.parameters {
            if !seen.insert(param.name.as_str()) {
                return Err(SpaceError::DuplicateParameter {
                    name: param.name.clone(),
                });
            }
            domains.push(param.domain()?);
        }
        Ok(domains)
    }

    /// Number of candidates per parameter, in parameter order.
    pub fn dimensions(&self) -> Result<Vec<usize>, SpaceError> {
        Ok(self.domains()?.iter().map(Vec::len).collect())
    }

    /// Total number of grid points.
    pub fn grid_size(&self) -> Result<usize, SpaceError> {
        self.dimensions()?
            .into_iter()
            .try_fold(1usize, |total, dim| total.checked_mul(dim))
            .ok_or(SpaceError::GridOverflow)
    }
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self::new()
    }
}
