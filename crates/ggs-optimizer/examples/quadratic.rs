//! Tunes a toy regularized model with greedy grid search.
//!
//! Run with `RUST_LOG=debug` to see every evaluation and round summary.

use ggs_optimizer::{GreedyGridSearch, ParameterSet, SearchConfig, SearchResult, SearchSpace};
use tracing_subscriber::EnvFilter;

fn validation_loss(params: &ParameterSet) -> SearchResult<f64> {
    let lr = params.f64("learning_rate")?;
    let depth = params.f64("depth")?;
    let penalty = match params.str("penalty")? {
        "l1" => 0.05,
        "l2" => 0.0,
        _ => 0.2,
    };

    if depth > 8.0 && lr > 0.05 {
        // Diverges.
        return Ok(f64::INFINITY);
    }
    Ok((lr.log10() + 2.0).powi(2) + 0.1 * (depth - 5.0).powi(2) + penalty)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let space = SearchSpace::new()
        .add_log_steps("learning_rate", 1e-4, 1e-1, 7)
        .add_int("depth", 2, 10)
        .add_values("penalty", ["none", "l1", "l2"]);
    let config = SearchConfig::new().with_step_radius(2);

    let outcome = GreedyGridSearch::new(space, config).try_run(validation_loss)?;

    println!("best loss:       {}", outcome.best_value);
    println!("best parameters: {}", outcome.best_parameters);
    println!(
        "evaluations:     {} over {} rounds",
        outcome.evaluation_count(),
        outcome.rounds
    );
    Ok(())
}
