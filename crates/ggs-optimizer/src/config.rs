//! Search configuration.

use ggs_types::{config_error, SearchError, SearchResult, SearchSpace};
use serde::{Deserialize, Serialize};

/// Whether we are maximizing or minimizing the objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObjectiveDirection {
    Maximize,
    #[default]
    Minimize,
}

impl ObjectiveDirection {
    /// Maps a raw objective value onto the scale the search minimizes.
    pub fn rank(self, value: f64) -> f64 {
        match self {
            Self::Minimize => value,
            Self::Maximize => -value,
        }
    }
}

/// Top-level configuration for a search run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum chain of single-axis unit moves explored per round.
    pub step_radius: usize,

    /// Direction of optimization.
    pub direction: ObjectiveDirection,

    /// Initial grid coordinate. `None` starts at the first candidate of
    /// every parameter.
    pub start: Option<Vec<usize>>,

    /// Upper bound on expansion rounds. `None` runs until convergence.
    pub max_rounds: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            step_radius: 1,
            direction: ObjectiveDirection::Minimize,
            start: None,
            max_rounds: None,
        }
    }
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step_radius(mut self, step_radius: usize) -> Self {
        self.step_radius = step_radius;
        self
    }

    pub fn with_direction(mut self, direction: ObjectiveDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_start(mut self, start: Vec<usize>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = Some(max_rounds);
        self
    }

    /// Loads a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> SearchResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Checks the configuration against the space it will search.
    pub fn validate(&self, space: &SearchSpace) -> SearchResult<()> {
        let dimensions = space.dimensions()?;
        let names: Vec<&str> = space.names().collect();
        self.validate_dimensions(&names, &dimensions)
    }

    /// Checks the configuration against domain sizes that are already
    /// materialized. `names` and `dimensions` are in parameter order.
    pub fn validate_dimensions(&self, names: &[&str], dimensions: &[usize]) -> SearchResult<()> {
        if self.step_radius == 0 {
            return Err(SearchError::InvalidStepRadius(self.step_radius));
        }
        if self.max_rounds == Some(0) {
            return Err(config_error!("max_rounds must be at least 1"));
        }

        if let Some(start) = &self.start {
            if start.len() != dimensions.len() {
                return Err(SearchError::StartDimensionMismatch {
                    expected: dimensions.len(),
                    got: start.len(),
                });
            }
            for ((&index, &size), name) in start.iter().zip(dimensions).zip(names) {
                if index >= size {
                    return Err(SearchError::StartOutOfRange {
                        parameter: name.to_string(),
                        index,
                        size,
                    });
                }
            }
        }
        Ok(())
    }
}
