//! Batch mode - N runs of one scenario under a timestamped directory.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use augury_core::{
    AggregateResult, BatchDirectory, MultiRunAggregator, Oracle, Scenario, SimulationResult,
};
use augury_env::{AuguryContext, Generator};
use chrono::{DateTime, Local};

use crate::error::SimError;

/// `multi_sim_<YYYYmmdd_HHMMSS>`
pub fn batch_dir_name(now: &DateTime<Local>) -> String {
    format!("multi_sim_{}", now.format("%Y%m%d_%H%M%S"))
}

/// Creates the batch directory under `parent`.
pub fn prepare_batch(parent: &Path, now: &DateTime<Local>) -> Result<BatchDirectory, SimError> {
    BatchDirectory::create(parent.join(batch_dir_name(now)))
        .map_err(SimError::io("failed to create base directory"))
}

/// A finished batch and where it was written.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub aggregate: AggregateResult,
    pub dir: PathBuf,
}

/// Runs `runs` simulations of `scenario` into `batch`.
pub async fn run_batch<Ctx, G>(
    oracle: Oracle<Ctx, G>,
    batch: BatchDirectory,
    scenario: &Scenario,
    runs: usize,
) -> Result<BatchOutcome, SimError>
where
    Ctx: AuguryContext,
    G: Generator,
{
    let dir = batch.root().to_path_buf();
    let aggregator = MultiRunAggregator::new(oracle, Arc::new(batch));
    let aggregate = aggregator.run(scenario, runs).await?;
    Ok(BatchOutcome { aggregate, dir })
}

/// Header printed before the runs start.
pub fn render_banner(scenario: &Scenario, runs: usize, dir: &Path) -> String {
    format!(
        "\n=== Running {} Simulations in Parallel ===\nScenario: {}\nTurns: {}\nQuestion: {}\nSaving to: {}",
        runs,
        scenario.scenario,
        scenario.turns,
        scenario.question,
        dir.display()
    )
}

/// Aggregate block followed by one preview per run.
pub fn render_summary(outcome: &BatchOutcome, preview_chars: usize) -> String {
    let agg = &outcome.aggregate;
    let mut out = String::new();
    let _ = writeln!(out, "\n\n=== AGGREGATE RESULTS ===");
    let _ = writeln!(out, "Question: {}", agg.question);
    let _ = writeln!(out, "Total simulations: {}", agg.total);
    let _ = writeln!(out, "Yes count: {}", agg.yes_count);
    let _ = writeln!(out, "No count: {}", agg.no_count);
    let _ = writeln!(out, "Yes percentage: {:.1}%", agg.yes_percentage);
    let _ = writeln!(out, "\nResults saved to: {}", outcome.dir.display());

    let _ = writeln!(out, "\n=== INDIVIDUAL SIMULATION SUMMARIES ===");
    for summary in agg.summaries(preview_chars) {
        let _ = writeln!(out, "\n{}", summary);
    }
    out
}

/// Previews of the runs that finished before a batch failed.
pub fn render_partial(completed: &[(usize, SimulationResult)], preview_chars: usize) -> String {
    let mut out = format!("\n=== {} COMPLETED SIMULATIONS BEFORE FAILURE ===\n", completed.len());
    for (run, result) in completed {
        let verdict = if result.yes_no { "Yes" } else { "No" };
        let _ = writeln!(
            out,
            "\nSimulation {}: {} - {}",
            run,
            verdict,
            augury_core::model::preview(&result.answer, preview_chars)
        );
    }
    out
}
