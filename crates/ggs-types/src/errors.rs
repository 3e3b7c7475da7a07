use std::error::Error as StdError;

use thiserror::Error;

/// Main error type for a greedy grid search run
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid numeric result: objective returned {value} at {parameters}")]
    InvalidResult { parameters: String, value: f64 },

    #[error("Search space error: {0}")]
    Space(#[from] SpaceError),

    #[error("Invalid step radius: {0} (must be at least 1)")]
    InvalidStepRadius(usize),

    #[error("Invalid start point: expected {expected} indices, got {got}")]
    StartDimensionMismatch { expected: usize, got: usize },

    #[error("Invalid start point: index {index} out of range for '{parameter}' (size {size})")]
    StartOutOfRange {
        parameter: String,
        index: usize,
        size: usize,
    },

    #[error("Objective failed")]
    Objective(#[source] Box<dyn StdError + Send + Sync>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Errors raised while defining or materializing a parameter space
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpaceError {
    #[error("Search space has no parameters")]
    Empty,

    #[error("Parameter '{name}' has an empty domain")]
    EmptyDomain { name: String },

    #[error("Parameter '{name}' is defined more than once")]
    DuplicateParameter { name: String },

    #[error("Parameter '{name}': low ({low}) is greater than high ({high})")]
    InvalidBounds { name: String, low: f64, high: f64 },

    #[error("Parameter '{name}': low ({low}) is greater than high ({high})")]
    InvalidIntBounds { name: String, low: i64, high: i64 },

    #[error("Parameter '{name}': log-spaced bounds must be positive, got low {low}")]
    NonPositiveLogBound { name: String, low: f64 },

    #[error("Parameter '{name}': step must be positive, got {step}")]
    InvalidStep { name: String, step: i64 },

    #[error("Parameter '{name}': step count must be at least 1")]
    ZeroSteps { name: String },

    #[error("Grid size overflows usize")]
    GridOverflow,
}

/// Result type alias for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Macro for creating validation errors
#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::SearchError::Validation(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::SearchError::Config(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = SearchError::InvalidResult {
            parameters: "a=1, b=2".to_string(),
            value: f64::NAN,
        };

        assert!(error.to_string().contains("Invalid numeric result"));
        assert!(error.to_string().contains("a=1, b=2"));
        assert!(error.to_string().contains("NaN"));
    }

    #[test]
    fn test_error_conversion() {
        let space_error = SpaceError::EmptyDomain {
            name: "lr".to_string(),
        };
        let search_error: SearchError = space_error.into();

        match search_error {
            SearchError::Space(SpaceError::EmptyDomain { name }) => assert_eq!(name, "lr"),
            _ => panic!("Expected Space error"),
        }
    }

    #[test]
    fn test_objective_error_keeps_source() {
        let inner = std::io::Error::new(std::io::ErrorKind::Other, "backend unavailable");
        let error = SearchError::Objective(Box::new(inner));

        let source = error.source().expect("objective error should carry a source");
        assert_eq!(source.to_string(), "backend unavailable");
    }

    #[test]
    fn test_macros() {
        let validation_err = validation_error!("Invalid value: {}", 42);
        assert!(matches!(
            validation_err,
            SearchError::Validation(ref m) if m == "Invalid value: 42"
        ));

        let config_err = config_error!("Missing required field: {}", "step_radius");
        assert!(config_err.to_string().contains("step_radius"));
    }
}
