//! augury Simulation Harness
//!
//! Everything around the engine: where situations come from, which
//! generator answers, and how a human or a batch drives the runs.
//!
//! # Deterministic testing
//!
//! [`SimContext`] replaces wall-clock sleeps with a virtual clock and
//! [`ScriptedGenerator`] replaces the model endpoint with canned answers,
//! injected failures and a seeded completion-order shuffle. Together they
//! let the whole engine run in tests without network or real delays.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         augury CLI                           │
//! │   default run │ --interactive session │ --num-simulations N  │
//! │        │               │                       │             │
//! │  ┌─────▼───────────────▼───────────────────────▼──────────┐  │
//! │  │ augury_core: SimulationRunner / MultiRunAggregator     │  │
//! │  └─────┬──────────────────────────────────────────────────┘  │
//! │        │ Generator                         AuguryContext     │
//! │  ┌─────▼──────────────┐  or  ┌──────────────┐  ┌───────────┐ │
//! │  │ OpenAiGenerator    │      │ Scripted...  │  │ SimContext│ │
//! │  └────────────────────┘      └──────────────┘  └───────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod context;
mod scripted;
pub mod batch;
pub mod console;
pub mod error;
pub mod interactive;
pub mod openai;
pub mod report;
pub mod scenarios;

pub use context::SimContext;
pub use scripted::{actor_in_prompt, ScriptedGenerator};
pub use error::SimError;
pub use interactive::InteractiveSession;
pub use openai::{OpenAiConfig, OpenAiGenerator};
pub use scenarios::{ScenarioDraft, ScenarioSource};
