//! Multi-run aggregation: N independent runs of one scenario, one statistic.
//!
//! Runs share nothing but the scenario and the generator. Each gets its own
//! journal and artifact directory from the [`BatchOutput`], its own child
//! cancellation token, and its own task. Results are joined in run order.

use std::sync::Arc;

use augury_env::{AuguryContext, Generator};
use futures::future::join_all;
use tracing::{error, info};

use crate::artifacts::{persist_json, BatchOutput};
use crate::error::{AggregateError, RunError};
use crate::model::{AggregateResult, Scenario, SimulationResult};
use crate::oracle::Oracle;
use crate::runner::SimulationRunner;

/// Runs a scenario N times concurrently and folds the verdicts.
pub struct MultiRunAggregator<Ctx, G> {
    oracle: Oracle<Ctx, G>,
    output: Arc<dyn BatchOutput>,
}

impl<Ctx, G> MultiRunAggregator<Ctx, G>
where
    Ctx: AuguryContext,
    G: Generator,
{
    pub fn new(oracle: Oracle<Ctx, G>, output: Arc<dyn BatchOutput>) -> Self {
        Self { oracle, output }
    }

    /// Runs `runs` simulations of `scenario`.
    ///
    /// All runs must succeed for an aggregate to be produced. When one
    /// fails, the lowest-numbered genuine failure is reported together
    /// with whichever runs did complete.
    pub async fn run(
        &self,
        scenario: &Scenario,
        runs: usize,
    ) -> Result<AggregateResult, AggregateError> {
        if runs == 0 {
            return Err(AggregateError::NoRuns);
        }

        let batch_sink = self.output.batch_artifacts();
        persist_json(&*batch_sink, "scenario.json", scenario);

        // Prepare every run's output before anything starts
        let mut sinks = Vec::with_capacity(runs);
        for run in 1..=runs {
            let run_sinks = self
                .output
                .run_sinks(run)
                .map_err(|source| AggregateError::Setup { run, source })?;
            sinks.push(run_sinks);
        }

        let batch_token = self.oracle.cancel_token().child_token();
        let cancel_siblings = self.oracle.config().cancel_siblings_on_failure;

        let handles: Vec<_> = sinks
            .into_iter()
            .enumerate()
            .map(|(i, run_sinks)| {
                let run = i + 1;
                let oracle = self.oracle.with_cancel(batch_token.child_token());
                let batch_token = batch_token.clone();
                let scenario = scenario.clone();
                tokio::spawn(async move {
                    info!("Starting simulation {}/{}", run, runs);
                    let runner = SimulationRunner::new(oracle, run_sinks);
                    let result = runner.run(&scenario).await;
                    match &result {
                        Ok(_) => info!("Completed simulation {}/{}", run, runs),
                        Err(e) if e.is_cancelled() => {
                            info!("Simulation {}/{} cancelled", run, runs)
                        }
                        Err(e) => {
                            error!("Simulation {}/{} failed: {}", run, runs, e);
                            if cancel_siblings {
                                batch_token.cancel();
                            }
                        }
                    }
                    result
                })
            })
            .collect();

        let joined = join_all(handles).await;

        let mut completed: Vec<(usize, SimulationResult)> = Vec::with_capacity(runs);
        let mut failures: Vec<(usize, RunError)> = Vec::new();
        for (i, outcome) in joined.into_iter().enumerate() {
            let run = i + 1;
            match outcome {
                Ok(Ok(result)) => completed.push((run, result)),
                Ok(Err(e)) => failures.push((run, e)),
                Err(join_err) => {
                    batch_token.cancel();
                    return Err(AggregateError::Join {
                        run,
                        reason: join_err.to_string(),
                    });
                }
            }
        }

        let genuine = failures.iter().position(|(_, e)| !e.is_cancelled());
        if !failures.is_empty() {
            let (run, source) = failures.swap_remove(genuine.unwrap_or(0));
            return Err(AggregateError::Run {
                run,
                source,
                completed,
            });
        }

        let results = completed.into_iter().map(|(_, r)| r).collect();
        let aggregate = AggregateResult::from_results(scenario, results);
        persist_json(&*batch_sink, "aggregate_results.json", &aggregate);
        info!(
            total = aggregate.total,
            yes = aggregate.yes_count,
            "aggregation complete: {:.1}% yes",
            aggregate.yes_percentage
        );
        Ok(aggregate)
    }
}
