//! Simulation runner - one complete run from situation to verdict.
//!
//! generate actors → initial world → `turns` × [`run_turn`] → answer.
//! Each step writes a transcript section to the run's journal and persists
//! its artifact; persistence failures never fail the run.

use augury_env::{AuguryContext, Generator};
use tracing::{debug, info};

use crate::artifacts::{persist_json, RunSinks};
use crate::error::RunError;
use crate::journal::pretty;
use crate::model::{ActorSet, Scenario, SimulationResult, TurnRecord, WorldState};
use crate::oracle::Oracle;
use crate::scheduler::{run_turn, TurnOutcome};

/// Drives one run against its own journal and artifact sink.
///
/// The step methods are public so an interactive driver can interleave
/// its own pauses between them.
pub struct SimulationRunner<Ctx, G> {
    oracle: Oracle<Ctx, G>,
    sinks: RunSinks,
}

impl<Ctx, G> SimulationRunner<Ctx, G>
where
    Ctx: AuguryContext,
    G: Generator,
{
    /// Creates a runner.
    pub fn new(oracle: Oracle<Ctx, G>, sinks: RunSinks) -> Self {
        Self { oracle, sinks }
    }

    pub fn oracle(&self) -> &Oracle<Ctx, G> {
        &self.oracle
    }

    fn section(&self, title: &str) {
        self.sinks.log.record(&format!("\n=== {} ===", title));
    }

    /// Step 1: the actors of the situation.
    pub async fn generate_actors(&self, situation: &str) -> Result<ActorSet, RunError> {
        self.section("Generating Actors");
        let actors = self
            .oracle
            .generate_actors(situation)
            .await
            .map_err(RunError::Actors)?;

        self.sinks.log.record(&format!("Generated Actors:\n{}", pretty(&actors)));
        persist_json(&*self.sinks.artifacts, "actors.json", &actors);
        Ok(actors)
    }

    /// Step 2: the world before the first turn.
    pub async fn initial_world(
        &self,
        situation: &str,
        actors: &ActorSet,
    ) -> Result<WorldState, RunError> {
        self.section("Initial World State");
        let world = self
            .oracle
            .summarize_world(situation, actors)
            .await
            .map_err(RunError::InitialWorld)?;

        self.sinks.log.record(&pretty(&world));
        Ok(world)
    }

    /// Step 3, once per turn (`turn` is 1-based).
    pub async fn play_turn(
        &self,
        turn: usize,
        world: &WorldState,
        actors: &ActorSet,
    ) -> Result<TurnOutcome, RunError> {
        self.section(&format!("Simulation Turn {}", turn));
        let outcome = run_turn(&self.oracle, world, actors, &*self.sinks.log)
            .await
            .map_err(|source| RunError::Turn { turn, source })?;

        self.sinks
            .log
            .record(&format!("\nUpdated World State:\n{}", pretty(&outcome.world)));

        let dir = format!("turn_{}", turn);
        persist_json(&*self.sinks.artifacts, format!("{}/actions.json", dir), &outcome.actions);
        persist_json(&*self.sinks.artifacts, format!("{}/world_state.json", dir), &outcome.world);
        debug!(turn, actions = outcome.actions.len(), "turn complete");
        Ok(outcome)
    }

    /// Step 4: the verdict over the final world and every turn's actions.
    pub async fn conclude(
        &self,
        question: &str,
        world: &WorldState,
        history: &[TurnRecord],
    ) -> Result<SimulationResult, RunError> {
        self.section("Final Summarization");
        let verdict = self
            .oracle
            .answer(question, world, history)
            .await
            .map_err(RunError::Answer)?;

        let result = SimulationResult {
            question: question.to_string(),
            yes_no: verdict.yes_no,
            answer: verdict.answer,
        };
        self.sinks.log.record(&format!("Question: {}", result.question));
        self.sinks.log.record(&format!("Answer: {}", result.answer));
        self.sinks.log.record(&format!("Yes/No: {}", result.yes_no));
        persist_json(&*self.sinks.artifacts, "result.json", &result);
        Ok(result)
    }

    /// Runs every step in order. The first failure ends the run.
    pub async fn run(&self, scenario: &Scenario) -> Result<SimulationResult, RunError> {
        info!(turns = scenario.turns, "starting simulation");

        let actors = self.generate_actors(&scenario.scenario).await?;
        let mut world = self.initial_world(&scenario.scenario, &actors).await?;
        let mut history = Vec::with_capacity(scenario.turns);

        for turn in 1..=scenario.turns {
            let outcome = self.play_turn(turn, &world, &actors).await?;
            history.push(TurnRecord {
                turn,
                actions: outcome.actions,
            });
            world = outcome.world;
        }

        let result = self.conclude(&scenario.question, &world, &history).await?;
        info!(yes_no = result.yes_no, "simulation finished");
        Ok(result)
    }
}
