//! Oracle - every world-model judgment as one structured generator request.
//!
//! The engine has no local algorithm for what an actor can see, what it
//! does, or how the world moves on. Each of those is a request/response
//! shaping function here: serialize the inputs, build the prompt, ask the
//! generator through the retry executor, parse the typed answer.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Oracle                            │
//! │  generate_actors · adjust_actors · summarize_world       │
//! │  observe · decide · fold · answer                        │
//! │        │                                                 │
//! │  ┌─────▼──────────────────────────────┐                  │
//! │  │ retry_with_backoff (ctx.sleep)     │◄── cancel token  │
//! │  └─────┬──────────────────────────────┘                  │
//! │        │                                                 │
//! │  ┌─────▼─────┐                                           │
//! │  │ Generator │  prompt + strict schema -> JSON text      │
//! │  └───────────┘                                           │
//! └──────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use augury_env::{AuguryContext, GenerationRequest, Generator};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::CallError;
use crate::model::{Actor, ActorAction, ActorSet, ActorView, TurnRecord, Verdict, WorldState};
use crate::prompts;
use crate::retry::retry_with_backoff;
use crate::schema::Structured;

/// Generator-backed implementation of the world-model operations.
///
/// Generic over the context and generator so the same code runs against
/// a real endpoint or a scripted one. Cloning is cheap (shared `Arc`s).
pub struct Oracle<Ctx, G> {
    context: Arc<Ctx>,
    generator: Arc<G>,
    config: Arc<EngineConfig>,
    cancel: CancellationToken,
}

impl<Ctx, G> Clone for Oracle<Ctx, G> {
    fn clone(&self) -> Self {
        Self {
            context: Arc::clone(&self.context),
            generator: Arc::clone(&self.generator),
            config: Arc::clone(&self.config),
            cancel: self.cancel.clone(),
        }
    }
}

fn encode<T: Serialize + ?Sized>(what: &'static str, value: &T) -> Result<String, CallError> {
    serde_json::to_string(value).map_err(|source| CallError::Encode { what, source })
}

impl<Ctx, G> Oracle<Ctx, G>
where
    Ctx: AuguryContext,
    G: Generator,
{
    /// Creates an oracle with its own root cancellation token.
    pub fn new(context: Arc<Ctx>, generator: Arc<G>, config: EngineConfig) -> Self {
        Self {
            context,
            generator,
            config: Arc::new(config),
            cancel: CancellationToken::new(),
        }
    }

    /// Returns a copy whose calls observe `cancel` instead.
    pub fn with_cancel(&self, cancel: CancellationToken) -> Self {
        Self {
            cancel,
            ..self.clone()
        }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// One structured request, retried per the configured policy.
    async fn ask<T: Structured>(&self, prompt: String) -> Result<T, CallError> {
        let request = GenerationRequest::new(&self.config.model, prompt, T::response_schema());
        debug!(
            schema = T::NAME,
            model = %self.config.model,
            prompt_chars = request.prompt_len(),
            "issuing structured request"
        );

        let generator = &*self.generator;
        let req = &request;
        let text = retry_with_backoff(&*self.context, &self.config.retry, &self.cancel, move || {
            generator.generate(req)
        })
        .await?;

        debug!(schema = T::NAME, response_chars = text.len(), "structured request succeeded");
        serde_json::from_str(&text).map_err(|source| {
            debug!(schema = T::NAME, response = %text, "response did not parse");
            CallError::Decode {
                schema: T::NAME,
                source,
            }
        })
    }

    /// Lists the actors relevant to a free-text situation.
    pub async fn generate_actors(&self, situation: &str) -> Result<ActorSet, CallError> {
        let actors: ActorSet = self.ask(prompts::actors(situation)).await?;
        debug!(count = actors.len(), "actors generated");
        Ok(actors)
    }

    /// Revises actors in light of new external information.
    pub async fn adjust_actors(
        &self,
        actors: &ActorSet,
        external_info: &str,
    ) -> Result<ActorSet, CallError> {
        let actors_json = encode("actors", actors)?;
        let adjusted: ActorSet = self
            .ask(prompts::adjust_actors(&actors_json, external_info))
            .await?;
        debug!(before = actors.len(), after = adjusted.len(), "actors adjusted");
        Ok(adjusted)
    }

    /// Builds the initial world state from the situation and its actors.
    pub async fn summarize_world(
        &self,
        situation: &str,
        actors: &ActorSet,
    ) -> Result<WorldState, CallError> {
        let actors_json = encode("actors", actors)?;
        self.ask(prompts::initial_world(situation, &actors_json)).await
    }

    /// What `actor` can perceive of `world`.
    pub async fn observe(&self, world: &WorldState, actor: &Actor) -> Result<ActorView, CallError> {
        let world_json = encode("world state", world)?;
        let actor_json = encode("actor", actor)?;
        let view: ActorView = self.ask(prompts::observe(&world_json, &actor_json)).await?;
        debug!(actor = %actor.name, visible = view.visible_events.len(), "world state filtered");
        Ok(view)
    }

    /// The action `actor` takes given its view.
    ///
    /// The returned action always carries the caller's actor name; a
    /// diverging model-echoed name is logged and replaced.
    pub async fn decide(&self, actor: &Actor, view: &ActorView) -> Result<ActorAction, CallError> {
        let actor_json = encode("actor", actor)?;
        let view_json = encode("actor view", view)?;
        let mut action: ActorAction = self.ask(prompts::decide(&actor_json, &view_json)).await?;

        if action.actor_name != actor.name {
            warn!(
                actor = %actor.name,
                echoed = %action.actor_name,
                "generator echoed a different actor name, keeping the caller's"
            );
            action.actor_name = actor.name.clone();
        }
        debug!(actor = %actor.name, "action determined");
        Ok(action)
    }

    /// Folds one turn's actions into a successor world state.
    pub async fn fold(
        &self,
        world: &WorldState,
        actions: &[ActorAction],
    ) -> Result<WorldState, CallError> {
        if actions.is_empty() && self.config.skip_empty_fold {
            debug!("no actions this turn, world state carried over");
            return Ok(world.clone());
        }

        let world_json = encode("world state", world)?;
        let actions_json = encode("actions", actions)?;
        let next: WorldState = self.ask(prompts::fold(&world_json, &actions_json)).await?;
        debug!(actions = actions.len(), events = next.events.len(), "world state updated");
        Ok(next)
    }

    /// Answers the closing question over the final state and full history.
    pub async fn answer(
        &self,
        question: &str,
        world: &WorldState,
        history: &[TurnRecord],
    ) -> Result<Verdict, CallError> {
        let world_json = encode("world state", world)?;
        let turns: Vec<&[ActorAction]> = history.iter().map(|t| t.actions.as_slice()).collect();
        let history_json = encode("all actions", &turns)?;
        let verdict: Verdict = self
            .ask(prompts::answer(question, &world_json, &history_json))
            .await?;
        debug!(yes_no = verdict.yes_no, "question answered");
        Ok(verdict)
    }
}
