//! Grid coordinates and the write-once evaluation cache.

use ggs_types::{validation_error, ParameterSet, SearchError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A point in the discrete grid: one index per parameter, in parameter
/// order. Component `i` indexes into the `i`-th parameter's domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GridPoint(Vec<usize>);

impl GridPoint {
    /// The first candidate of every parameter.
    pub fn origin(dimensions: usize) -> Self {
        Self(vec![0; dimensions])
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Neighbor one step up along `axis`, or `None` at the upper bound
    /// `size - 1`.
    pub fn increment(&self, axis: usize, size: usize) -> Option<Self> {
        let index = *self.0.get(axis)?;
        if index + 1 >= size {
            return None;
        }
        let mut next = self.0.clone();
        next[axis] = index + 1;
        Some(Self(next))
    }

    /// Neighbor one step down along `axis`, or `None` at index 0.
    pub fn decrement(&self, axis: usize) -> Option<Self> {
        let index = *self.0.get(axis)?;
        let lower = index.checked_sub(1)?;
        let mut next = self.0.clone();
        next[axis] = lower;
        Some(Self(next))
    }
}

impl From<Vec<usize>> for GridPoint {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// One evaluated grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// 0-based position in evaluation order.
    pub trial_number: usize,
    pub point: GridPoint,
    pub parameters: ParameterSet,
    /// Raw objective value as returned by the objective.
    #[serde(with = "ggs_types::non_finite")]
    pub value: f64,
}

/// Insertion-ordered map from grid point to objective value.
///
/// Entries are never overwritten. Iteration order is evaluation order,
/// which also decides ties in [`EvaluationCache::best`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Evaluation>", into = "Vec<Evaluation>")]
pub struct EvaluationCache {
    entries: Vec<Evaluation>,
    index: HashMap<GridPoint, usize>,
}

impl EvaluationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, point: &GridPoint) -> bool {
        self.index.contains_key(point)
    }

    pub fn get(&self, point: &GridPoint) -> Option<&Evaluation> {
        self.index.get(point).map(|&i| &self.entries[i])
    }

    pub fn value(&self, point: &GridPoint) -> Option<f64> {
        self.get(point).map(|e| e.value)
    }

    /// Records a new evaluation. Returns `false` and leaves the cache
    /// untouched if `point` is already present.
    pub fn insert(&mut self, point: GridPoint, parameters: ParameterSet, value: f64) -> bool {
        if self.index.contains_key(&point) {
            return false;
        }
        let trial_number = self.entries.len();
        self.index.insert(point.clone(), trial_number);
        self.entries.push(Evaluation {
            trial_number,
            point,
            parameters,
            value,
        });
        true
    }

    /// Evaluations in the order they were made.
    pub fn iter(&self) -> impl Iterator<Item = &Evaluation> {
        self.entries.iter()
    }

    /// The entry whose ranked value is smallest. The first entry wins ties.
    pub fn best_by(&self, rank: impl Fn(f64) -> f64) -> Option<&Evaluation> {
        let mut best: Option<(&Evaluation, f64)> = None;
        for entry in &self.entries {
            let score = rank(entry.value);
            match best {
                Some((_, best_score)) if score >= best_score => {}
                _ => best = Some((entry, score)),
            }
        }
        best.map(|(entry, _)| entry)
    }

    /// The entry with the smallest raw value. The first entry wins ties.
    pub fn best(&self) -> Option<&Evaluation> {
        self.best_by(|v| v)
    }
}

/// Rebuilds a cache from its serialized entries. Rejects repeated points and
/// trial numbers that do not match the entry order.
impl TryFrom<Vec<Evaluation>> for EvaluationCache {
    type Error = SearchError;

    fn try_from(evaluations: Vec<Evaluation>) -> Result<Self, Self::Error> {
        let mut cache = Self::new();
        for evaluation in evaluations {
            if evaluation.trial_number != cache.len() {
                return Err(validation_error!(
                    "trial number {} at position {} of the evaluation list",
                    evaluation.trial_number,
                    cache.len()
                ));
            }
            let point = evaluation.point.clone();
            if !cache.insert(evaluation.point, evaluation.parameters, evaluation.value) {
                return Err(validation_error!("grid point {} evaluated more than once", point));
            }
        }
        Ok(cache)
    }
}

impl From<EvaluationCache> for Vec<Evaluation> {
    fn from(cache: EvaluationCache) -> Self {
        cache.entries
    }
}

impl<'a> IntoIterator for &'a EvaluationCache {
    type Item = &'a Evaluation;
    type IntoIter = std::slice::Iter<'a, Evaluation>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(indices: &[usize]) -> GridPoint {
        GridPoint::from(indices.to_vec())
    }

    #[test]
    fn neighbors_respect_bounds() {
        let p = point(&[0, 2]);
        assert_eq!(p.increment(0, 3), Some(point(&[1, 2])));
        assert_eq!(p.decrement(0), None);
        assert_eq!(p.increment(1, 3), None);
        assert_eq!(p.decrement(1), Some(point(&[0, 1])));
        // Original point is untouched.
        assert_eq!(p, point(&[0, 2]));
    }

    #[test]
    fn single_value_axis_has_no_neighbors() {
        let p = GridPoint::origin(1);
        assert_eq!(p.increment(0, 1), None);
        assert_eq!(p.decrement(0), None);
    }

    #[test]
    fn insert_is_write_once() {
        let mut cache = EvaluationCache::new();
        assert!(cache.insert(point(&[0]), ParameterSet::new(), 3.0));
        assert!(!cache.insert(point(&[0]), ParameterSet::new(), -1.0));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.value(&point(&[0])), Some(3.0));
    }

    #[test]
    fn trial_numbers_follow_insertion_order() {
        let mut cache = EvaluationCache::new();
        cache.insert(point(&[2]), ParameterSet::new(), 1.0);
        cache.insert(point(&[0]), ParameterSet::new(), 2.0);
        cache.insert(point(&[1]), ParameterSet::new(), 3.0);
        let order: Vec<_> = cache.iter().map(|e| (e.trial_number, e.point.clone())).collect();
        assert_eq!(
            order,
            vec![(0, point(&[2])), (1, point(&[0])), (2, point(&[1]))]
        );
    }

    #[test]
    fn best_prefers_first_minimum() {
        let mut cache = EvaluationCache::new();
        cache.insert(point(&[0]), ParameterSet::new(), 5.0);
        cache.insert(point(&[1]), ParameterSet::new(), 1.0);
        cache.insert(point(&[2]), ParameterSet::new(), 1.0);
        assert_eq!(cache.best().unwrap().point, point(&[1]));
    }

    #[test]
    fn best_skips_infinity_when_finite_exists() {
        let mut cache = EvaluationCache::new();
        cache.insert(point(&[0]), ParameterSet::new(), f64::INFINITY);
        cache.insert(point(&[1]), ParameterSet::new(), 1e300);
        assert_eq!(cache.best().unwrap().point, point(&[1]));

        let mut all_inf = EvaluationCache::new();
        all_inf.insert(point(&[0]), ParameterSet::new(), f64::INFINITY);
        all_inf.insert(point(&[1]), ParameterSet::new(), f64::INFINITY);
        assert_eq!(all_inf.best().unwrap().point, point(&[0]));
    }

    #[test]
    fn best_by_supports_maximization() {
        let mut cache = EvaluationCache::new();
        cache.insert(point(&[0]), ParameterSet::new(), 1.0);
        cache.insert(point(&[1]), ParameterSet::new(), 4.0);
        assert_eq!(cache.best_by(|v| -v).unwrap().value, 4.0);
    }

    #[test]
    fn serializes_as_ordered_list_and_rebuilds_index() {
        let mut cache = EvaluationCache::new();
        cache.insert(point(&[1, 0]), ParameterSet::new(), 0.5);
        cache.insert(point(&[0, 0]), ParameterSet::new(), 0.25);

        let json = serde_json::to_value(&cache).unwrap();
        assert_eq!(json[0]["point"], serde_json::json!([1, 0]));
        assert_eq!(json[1]["trial_number"], serde_json::json!(1));

        let back: EvaluationCache = serde_json::from_value(json).unwrap();
        assert_eq!(back, cache);
        assert!(back.contains(&point(&[0, 0])));
    }

    #[test]
    fn infinite_values_survive_serialization() {
        let mut cache = EvaluationCache::new();
        cache.insert(point(&[0]), ParameterSet::new(), f64::INFINITY);
        cache.insert(point(&[1]), ParameterSet::new(), 2.0);

        let json = serde_json::to_value(&cache).unwrap();
        assert_eq!(json[0]["value"], serde_json::json!("inf"));

        let back: EvaluationCache = serde_json::from_value(json).unwrap();
        assert_eq!(back.value(&point(&[0])), Some(f64::INFINITY));
        assert_eq!(back, cache);
    }

    #[test]
    fn deserializing_rejects_repeated_points() {
        let json = serde_json::json!([
            {"trial_number": 0, "point": [1], "parameters": {}, "value": 1.0},
            {"trial_number": 1, "point": [1], "parameters": {}, "value": 0.5},
        ]);
        let err = serde_json::from_value::<EvaluationCache>(json).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn deserializing_rejects_out_of_order_trial_numbers() {
        let json = serde_json::json!([
            {"trial_number": 0, "point": [0], "parameters": {}, "value": 1.0},
            {"trial_number": 5, "point": [1], "parameters": {}, "value": 0.5},
        ]);
        let err = serde_json::from_value::<EvaluationCache>(json).unwrap_err();
        assert!(err.to_string().contains("trial number 5"));
    }
}
