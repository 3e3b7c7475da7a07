//! Greedy coordinate-descent grid search.
//!
//! Starting from one grid point, each round evaluates every point reachable
//! by a chain of up to `step_radius` single-axis unit moves, then re-anchors
//! at the best point found so far. The search stops when a round leaves the
//! anchor unchanged. Every grid point is evaluated at most once.

use chrono::{DateTime, Utc};
use ggs_types::{
    validation_error, ParameterSet, ParameterValue, SearchError, SearchResult, SearchSpace,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::error::Error as StdError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::{EvaluationCache, GridPoint};
use crate::config::{ObjectiveDirection, SearchConfig};

type BoxError = Box<dyn StdError + Send + Sync>;

/// Why a search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// A round found nothing better than its anchor.
    Converged,
    /// `max_rounds` expansion rounds ran without converging.
    RoundLimit,
}

/// Summary of one expansion round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    /// 1-based round number.
    pub round: usize,
    /// The point the round expanded around.
    pub anchor: GridPoint,
    /// Best point in the cache after the round.
    pub best_point: GridPoint,
    #[serde(with = "ggs_types::non_finite")]
    pub best_value: f64,
    /// Cache size after the round.
    pub evaluations: usize,
}

/// Identity and timing of a single search invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunInfo {
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Result of a completed search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Best objective value discovered.
    #[serde(with = "ggs_types::non_finite")]
    pub best_value: f64,
    /// Concrete values (not indices) achieving `best_value`.
    pub best_parameters: ParameterSet,
    pub best_point: GridPoint,
    /// Every point evaluated, in evaluation order.
    pub evaluations: EvaluationCache,
    pub rounds: usize,
    pub history: Vec<RoundSummary>,
    pub termination: Termination,
    pub run: RunInfo,
}

impl SearchOutcome {
    pub fn evaluation_count(&self) -> usize {
        self.evaluations.len()
    }

    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }

    pub fn to_json(&self) -> SearchResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Splits the outcome into `(best_value, best_parameters, evaluations)`.
    pub fn into_parts(self) -> (f64, ParameterSet, EvaluationCache) {
        (self.best_value, self.best_parameters, self.evaluations)
    }
}

/// Greedy grid search over a fixed space with a fixed configuration.
#[derive(Debug, Clone)]
pub struct GreedyGridSearch {
    space: SearchSpace,
    config: SearchConfig,
}

impl GreedyGridSearch {
    pub fn new(space: SearchSpace, config: SearchConfig) -> Self {
        Self { space, config }
    }

    pub fn space(&self) -> &SearchSpace {
        &self.space
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Runs the search with an infallible objective.
    ///
    /// Fails with [`SearchError::InvalidResult`] as soon as the objective
    /// returns NaN.
    pub fn run<F>(&self, mut objective: F) -> SearchResult<SearchOutcome>
    where
        F: FnMut(&ParameterSet) -> f64,
    {
        self.try_run(|params| Ok::<_, Infallible>(objective(params)))
    }

    /// Runs the search with a fallible objective. The first objective error
    /// aborts the search and is returned as [`SearchError::Objective`].
    pub fn try_run<F, E>(&self, objective: F) -> SearchResult<SearchOutcome>
    where
        F: FnMut(&ParameterSet) -> Result<f64, E>,
        E: Into<BoxError>,
    {
        execute(&self.space, &self.config, objective)
    }
}

/// Minimizes `objective` over `space`, exploring chains of up to
/// `step_radius` unit moves per round.
pub fn search<F>(
    space: &SearchSpace,
    step_radius: usize,
    mut objective: F,
) -> SearchResult<SearchOutcome>
where
    F: FnMut(&ParameterSet) -> f64,
{
    try_search(space, step_radius, |params| Ok::<_, Infallible>(objective(params)))
}

/// Like [`search`], for objectives that can fail.
pub fn try_search<F, E>(
    space: &SearchSpace,
    step_radius: usize,
    objective: F,
) -> SearchResult<SearchOutcome>
where
    F: FnMut(&ParameterSet) -> Result<f64, E>,
    E: Into<BoxError>,
{
    let config = SearchConfig::new().with_step_radius(step_radius);
    execute(space, &config, objective)
}

fn execute<F, E>(
    space: &SearchSpace,
    config: &SearchConfig,
    mut objective: F,
) -> SearchResult<SearchOutcome>
where
    F: FnMut(&ParameterSet) -> Result<f64, E>,
    E: Into<BoxError>,
{
    let domains = space.domains()?;
    let names: Vec<&str> = space.names().collect();
    let dimensions: Vec<usize> = domains.iter().map(Vec::len).collect();
    config.validate_dimensions(&names, &dimensions)?;
    let started_at = Utc::now();

    let mut objective = |params: &ParameterSet| -> Result<f64, BoxError> {
        objective(params).map_err(Into::into)
    };
    let mut state = SearchState {
        names,
        domains: &domains,
        cache: EvaluationCache::new(),
        objective: &mut objective,
    };

    let mut current = match &config.start {
        Some(start) => GridPoint::from(start.clone()),
        None => GridPoint::origin(domains.len()),
    };
    info!(
        "Starting greedy grid search over {} parameters (step radius {})",
        domains.len(),
        config.step_radius
    );
    state.evaluate(&current)?;

    let mut history: Vec<RoundSummary> = Vec::new();
    let termination = loop {
        if config.max_rounds.is_some_and(|max| history.len() >= max) {
            warn!("Round limit of {} reached before convergence", history.len());
            break Termination::RoundLimit;
        }

        state.expand(&current, config.step_radius)?;

        let best = state
            .best(config.direction)
            .ok_or_else(|| validation_error!("no evaluations recorded"))?;
        let summary = RoundSummary {
            round: history.len() + 1,
            anchor: current.clone(),
            best_point: best.0.clone(),
            best_value: best.1,
            evaluations: state.cache.len(),
        };
        debug!(
            "Round {}: best value {} at {} after {} evaluations",
            summary.round, summary.best_value, summary.best_point, summary.evaluations
        );

        let converged = summary.best_point == current;
        current = summary.best_point.clone();
        history.push(summary);
        if converged {
            break Termination::Converged;
        }
    };

    let best = state
        .cache
        .get(&current)
        .ok_or_else(|| validation_error!("best point {} missing from cache", current))?;
    let best_value = best.value;
    let best_parameters = best.parameters.clone();
    info!("Optimal objective value = {}", best_value);
    info!("Optimal parameters = {}", best_parameters);

    Ok(SearchOutcome {
        best_value,
        best_parameters,
        best_point: current,
        evaluations: state.cache,
        rounds: history.len(),
        history,
        termination,
        run: RunInfo {
            id: Uuid::new_v4(),
            started_at,
            finished_at: Utc::now(),
        },
    })
}

/// Mutable state owned by one search invocation.
struct SearchState<'a> {
    names: Vec<&'a str>,
    domains: &'a [Vec<ParameterValue>],
    cache: EvaluationCache,
    objective: &'a mut dyn FnMut(&ParameterSet) -> Result<f64, BoxError>,
}

impl SearchState<'_> {
    fn resolve(&self, point: &GridPoint) -> ParameterSet {
        self.names
            .iter()
            .zip(self.domains)
            .zip(point.indices())
            .map(|((name, domain), &index)| (name.to_string(), domain[index].clone()))
            .collect()
    }

    /// Evaluates `point` unless it is already cached.
    fn evaluate(&mut self, point: &GridPoint) -> SearchResult<()> {
        if self.cache.contains(point) {
            debug!("Cache hit at {}", point);
            return Ok(());
        }

        let parameters = self.resolve(point);
        info!("Evaluating objective at {}", parameters);
        let value = (self.objective)(&parameters).map_err(SearchError::Objective)?;
        if value.is_nan() {
            return Err(SearchError::InvalidResult {
                parameters: parameters.to_string(),
                value,
            });
        }
        info!("Objective value = {}", value);

        self.cache.insert(point.clone(), parameters, value);
        Ok(())
    }

    /// Evaluates every point within `depth` chained unit moves of `anchor`.
    /// Per axis the upward move and its sub-chain come before the downward
    /// move, which fixes evaluation order and therefore tie-breaking.
    fn expand(&mut self, anchor: &GridPoint, depth: usize) -> SearchResult<()> {
        for axis in 0..anchor.len() {
            let size = self.domains[axis].len();
            let neighbors = [anchor.increment(axis, size), anchor.decrement(axis)];
            for neighbor in neighbors.into_iter().flatten() {
                self.evaluate(&neighbor)?;
                if depth > 1 {
                    self.expand(&neighbor, depth - 1)?;
                }
            }
        }
        Ok(())
    }

    fn best(&self, direction: ObjectiveDirection) -> Option<(&GridPoint, f64)> {
        self.cache
            .best_by(|v| direction.rank(v))
            .map(|e| (&e.point, e.value))
    }
}
