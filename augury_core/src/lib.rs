//! augury Core - turn-based multi-actor scenario simulation
//!
//! A situation is turned into a set of actors and a world state. The world
//! then advances in synchronous turns: every actor observes the same frozen
//! state and acts concurrently, and the actions are folded into the next
//! state. After the last turn a yes/no question is answered. Running the
//! same scenario many times yields a probability estimate.
//!
//! Every judgment (who the actors are, what they see, what they do, what
//! happens next) is a structured request to a [`augury_env::Generator`].
//! This crate owns the orchestration around those requests:
//! 1. **Retry**: bounded exponential backoff on a pluggable clock
//! 2. **Turn barrier**: concurrent fan-out, index-ordered fan-in, then fold
//! 3. **Aggregation**: isolated concurrent runs joined into one statistic

pub mod aggregate;
pub mod artifacts;
pub mod config;
pub mod error;
pub mod journal;
pub mod model;
pub mod oracle;
mod prompts;
pub mod retry;
pub mod runner;
pub mod scheduler;
pub mod schema;

// Re-export key types for convenience
pub use aggregate::MultiRunAggregator;
pub use artifacts::{
    persist_json, ArtifactSink, BatchDirectory, BatchOutput, DirectorySink, DiscardBatch,
    NullSink, RunSinks,
};
pub use config::{EngineConfig, DEFAULT_MODEL};
pub use error::{ActorStepError, AggregateError, CallError, RunError, TurnError};
pub use journal::{ConsoleLog, FileLog, MemoryLog, NullLog, RunLog};
pub use model::{
    Actor, ActorAction, ActorSet, ActorView, AggregateResult, RunSummary, Scenario,
    SimulationResult, TurnRecord, Verdict, WorldState,
};
pub use oracle::Oracle;
pub use retry::{retry_with_backoff, RetryError, RetryPolicy};
pub use runner::SimulationRunner;
pub use scheduler::{run_turn, TurnOutcome};
pub use schema::Structured;
