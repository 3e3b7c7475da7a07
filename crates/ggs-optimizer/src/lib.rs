//! # ggs-optimizer
//!
//! Greedy coordinate-descent grid search over discrete parameter spaces.
//!
//! Each parameter is restricted to a finite ordered list of candidates. The
//! search starts at the first candidate of every parameter, evaluates all
//! points within a configurable chain of unit moves, re-anchors at the best
//! point seen so far and stops once a round brings no improvement. Results
//! are memoized so the objective runs at most once per grid point.

mod cache;
mod config;
mod search;

pub use cache::{Evaluation, EvaluationCache, GridPoint};
pub use config::{ObjectiveDirection, SearchConfig};
pub use ggs_types::{ParameterSet, ParameterValue, SearchError, SearchResult, SearchSpace};
pub use search::{
    search, try_search, GreedyGridSearch, RoundSummary, RunInfo, SearchOutcome, Termination,
};
