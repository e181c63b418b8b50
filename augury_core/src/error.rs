//! Error types for the augury engine.
//!
//! One enum per layer; each wraps the layer below with its own context
//! (which call, which actor, which turn, which run).

use augury_env::EnvError;
use thiserror::Error;

use crate::model::SimulationResult;
use crate::retry::RetryError;

/// Failure of a single generator-backed operation.
#[derive(Debug, Error)]
pub enum CallError {
    /// Local data could not be serialized into the prompt.
    #[error("failed to marshal {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The response did not parse into the requested type.
    #[error("failed to parse {schema} response: {source}")]
    Decode {
        schema: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The generator kept failing, or the call was cancelled before it was issued.
    #[error(transparent)]
    Generation(#[from] RetryError<EnvError>),
}

impl CallError {
    /// True when the call never completed because a sibling failed first.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Generation(e) if e.is_cancelled())
    }
}

/// Failure of one actor's observe-and-act step.
#[derive(Debug, Error)]
pub enum ActorStepError {
    #[error("failed to filter world state for {actor}: {source}")]
    Observe {
        index: usize,
        actor: String,
        #[source]
        source: CallError,
    },

    #[error("failed to get action for {actor}: {source}")]
    Decide {
        index: usize,
        actor: String,
        #[source]
        source: CallError,
    },
}

impl ActorStepError {
    /// Position of the failing actor in the actor set.
    pub fn index(&self) -> usize {
        match self {
            Self::Observe { index, .. } | Self::Decide { index, .. } => *index,
        }
    }

    pub fn actor(&self) -> &str {
        match self {
            Self::Observe { actor, .. } | Self::Decide { actor, .. } => actor,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Observe { source, .. } | Self::Decide { source, .. } => source.is_cancelled(),
        }
    }
}

/// Failure of one turn. The caller's world state is left untouched.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Actor(#[from] ActorStepError),

    #[error("failed to update world state: {0}")]
    Update(#[source] CallError),
}

/// Failure of one run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to get actors: {0}")]
    Actors(#[source] CallError),

    #[error("failed to adjust actors: {0}")]
    AdjustActors(#[source] CallError),

    #[error("failed to summarize world state: {0}")]
    InitialWorld(#[source] CallError),

    #[error("failed to run simulation turn {turn}: {source}")]
    Turn {
        turn: usize,
        #[source]
        source: TurnError,
    },

    #[error("failed to answer summarization question: {0}")]
    Answer(#[source] CallError),
}

impl RunError {
    /// True when the run stopped only because a sibling run failed first.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Actors(e) | Self::AdjustActors(e) | Self::InitialWorld(e) | Self::Answer(e) => {
                e.is_cancelled()
            }
            Self::Turn { source, .. } => match source {
                TurnError::Actor(e) => e.is_cancelled(),
                TurnError::Update(e) => e.is_cancelled(),
            },
        }
    }
}

/// Failure of an aggregation batch.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("no simulations requested")]
    NoRuns,

    /// The lowest-numbered genuinely failed run. `completed` keeps the runs
    /// that did finish, indexed from 1, so callers can still report them.
    #[error("simulation {run} failed: {source}")]
    Run {
        run: usize,
        #[source]
        source: RunError,
        completed: Vec<(usize, SimulationResult)>,
    },

    #[error("failed to prepare output for simulation {run}: {source}")]
    Setup {
        run: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("simulation task {run} aborted: {reason}")]
    Join { run: usize, reason: String },
}
