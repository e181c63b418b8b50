//! Turn scheduler - one synchronous step of the simulation.
//!
//! Every actor observes the same frozen world and decides concurrently.
//! Nothing is folded until all of them have finished (the barrier), and the
//! actions handed to the fold are ordered by actor index, never by which
//! call returned first.
//!
//! ```text
//!           world(t)
//!      ┌───────┼───────┐
//!   observe observe observe      (concurrent, one chain per actor)
//!      │       │       │
//!   decide  decide  decide
//!      └───────┼───────┘
//!           barrier
//!              │
//!     fold(world(t), actions[0..n])
//!              │
//!          world(t+1)
//! ```

use augury_env::{AuguryContext, Generator};
use futures::future::join_all;
use tracing::{debug, warn};

use crate::error::{ActorStepError, TurnError};
use crate::journal::RunLog;
use crate::model::{Actor, ActorAction, ActorSet, WorldState};
use crate::oracle::Oracle;

/// Actions of a completed turn and the world they produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// One action per actor, in actor order
    pub actions: Vec<ActorAction>,
    pub world: WorldState,
}

async fn actor_step<Ctx, G>(
    oracle: &Oracle<Ctx, G>,
    world: &WorldState,
    index: usize,
    actor: &Actor,
) -> Result<ActorAction, ActorStepError>
where
    Ctx: AuguryContext,
    G: Generator,
{
    let view = oracle
        .observe(world, actor)
        .await
        .map_err(|source| ActorStepError::Observe {
            index,
            actor: actor.name.clone(),
            source,
        })?;

    oracle
        .decide(actor, &view)
        .await
        .map_err(|source| ActorStepError::Decide {
            index,
            actor: actor.name.clone(),
            source,
        })
}

/// Picks the error a failed turn reports.
///
/// Errors arrive in actor order. The first one that is not a cancellation
/// knock-on wins; if all of them are cancellations (the whole run was
/// cancelled from above) the lowest index wins.
///
/// With `cancel_siblings_on_failure` off every actor runs to its own end, so
/// the lowest genuinely failing index is always the one reported. With it on,
/// a lower-index actor still waiting on a call when a higher index fails is
/// cancelled and counts as a knock-on, so the higher index is reported.
fn reported_failure(failures: Vec<ActorStepError>) -> Option<ActorStepError> {
    let genuine = failures.iter().position(|e| !e.is_cancelled());
    let mut failures = failures;
    match genuine {
        Some(pos) => Some(failures.swap_remove(pos)),
        None if failures.is_empty() => None,
        None => Some(failures.swap_remove(0)),
    }
}

/// Runs one turn over `actors` and folds the actions into a new world.
///
/// `world` is only read; on failure the caller still holds the pre-turn
/// state. Each action is written to `log` once the barrier is passed.
pub async fn run_turn<Ctx, G>(
    oracle: &Oracle<Ctx, G>,
    world: &WorldState,
    actors: &ActorSet,
    log: &dyn RunLog,
) -> Result<TurnOutcome, TurnError>
where
    Ctx: AuguryContext,
    G: Generator,
{
    let turn_token = oracle.cancel_token().child_token();
    let scoped = oracle.with_cancel(turn_token.clone());
    let cancel_siblings = oracle.config().cancel_siblings_on_failure;

    debug!(actors = actors.len(), "fanning out actor steps");

    let steps = actors.actors.iter().enumerate().map(|(index, actor)| {
        let scoped = &scoped;
        let turn_token = &turn_token;
        async move {
            let result = actor_step(scoped, world, index, actor).await;
            if let Err(e) = &result {
                if !e.is_cancelled() {
                    warn!(actor = %actor.name, index, error = %e, "actor step failed");
                    if cancel_siblings {
                        turn_token.cancel();
                    }
                }
            }
            result
        }
    });

    // join_all keeps input order, so results[i] belongs to actors[i]
    let results = join_all(steps).await;

    let mut actions = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(action) => actions.push(action),
            Err(e) => failures.push(e),
        }
    }
    if let Some(err) = reported_failure(failures) {
        return Err(TurnError::Actor(err));
    }

    for action in &actions {
        log.record(&format!("\n{} takes action: {}", action.actor_name, action.action));
        log.record(&format!("Reasoning: {}", action.reasoning));
    }

    let world = scoped
        .fold(world, &actions)
        .await
        .map_err(TurnError::Update)?;

    Ok(TurnOutcome { actions, world })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::error::CallError;
    use crate::journal::MemoryLog;
    use crate::retry::{RetryError, RetryPolicy};
    use async_trait::async_trait;
    use augury_env::{EnvError, GenerationRequest, TokioContext};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Answers by schema name; fails any request whose prompt mentions `fail_on`.
    struct StubGenerator {
        fail_on: Option<String>,
        requests: Mutex<Vec<String>>,
        folds: AtomicUsize,
    }

    impl StubGenerator {
        fn new(fail_on: Option<&str>) -> Self {
            Self {
                fail_on: fail_on.map(str::to_string),
                requests: Mutex::new(Vec::new()),
                folds: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Generator for StubGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, EnvError> {
            self.requests.lock().unwrap().push(request.schema_name().to_string());
            if let Some(needle) = &self.fail_on {
                if request.prompt.contains(needle.as_str()) {
                    return Err(EnvError::injected(format!("refusing {}", needle)));
                }
            }
            let body = match request.schema_name() {
                "ActorView" => r#"{"visible_events":["e"],"interpretation":"i"}"#.to_string(),
                "ActorAction" => {
                    // Echo the actor's name back from the prompt
                    let name = if request.prompt.contains("\"name\":\"B\"") { "B" } else { "A" };
                    format!(r#"{{"actor_name":"{}","action":"act {}","reasoning":"r"}}"#, name, name)
                }
                "WorldState" => {
                    self.folds.fetch_add(1, Ordering::SeqCst);
                    r#"{"events":["after"],"description":"next"}"#.to_string()
                }
                other => return Err(EnvError::Config(format!("unexpected schema {}", other))),
            };
            Ok(body)
        }
    }

    fn oracle(generator: Arc<StubGenerator>) -> Oracle<TokioContext, StubGenerator> {
        let config = EngineConfig::default()
            .with_retry(RetryPolicy::new(1, Duration::from_millis(1)));
        Oracle::new(TokioContext::shared(), generator, config)
    }

    fn actors() -> ActorSet {
        ActorSet::new(
            vec![Actor::new("A", "ga", "pa"), Actor::new("B", "gb", "pb")],
            "",
        )
    }

    #[tokio::test]
    async fn test_turn_orders_actions_by_actor() {
        let generator = Arc::new(StubGenerator::new(None));
        let log = MemoryLog::new();
        let outcome = run_turn(&oracle(generator.clone()), &WorldState::default(), &actors(), &log)
            .await
            .unwrap();

        let names: Vec<_> = outcome.actions.iter().map(|a| a.actor_name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(outcome.world.description, "next");
        assert_eq!(generator.folds.load(Ordering::SeqCst), 1);
        assert!(log.contains("A takes action: act A"));
        assert!(log.contains("Reasoning: r"));
    }

    #[tokio::test]
    async fn test_failed_actor_skips_fold() {
        let generator = Arc::new(StubGenerator::new(Some("\"name\":\"B\"")));
        let world = WorldState::default();
        let err = run_turn(&oracle(generator.clone()), &world, &actors(), &MemoryLog::new())
            .await
            .unwrap_err();

        match err {
            TurnError::Actor(step) => {
                assert_eq!(step.index(), 1);
                assert_eq!(step.actor(), "B");
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(generator.folds.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_actor_set_still_folds() {
        let generator = Arc::new(StubGenerator::new(None));
        let outcome = run_turn(
            &oracle(generator.clone()),
            &WorldState::default(),
            &ActorSet::default(),
            &MemoryLog::new(),
        )
        .await
        .unwrap();

        assert!(outcome.actions.is_empty());
        assert_eq!(generator.folds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_actor_set_carries_world_when_skipping() {
        let generator = Arc::new(StubGenerator::new(None));
        let config = EngineConfig::default()
            .with_retry(RetryPolicy::new(1, Duration::from_millis(1)))
            .with_skip_empty_fold(true);
        let oracle = Oracle::new(TokioContext::shared(), generator.clone(), config);
        let before = WorldState {
            events: vec!["x".to_string()],
            description: "d".to_string(),
        };

        let outcome = run_turn(&oracle, &before, &ActorSet::default(), &MemoryLog::new())
            .await
            .unwrap();

        assert!(outcome.actions.is_empty());
        assert_eq!(outcome.world, before);
        assert_eq!(generator.folds.load(Ordering::SeqCst), 0);
        assert!(generator.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fold_failure_is_update_error() {
        let generator = Arc::new(StubGenerator::new(Some("Actions taken this turn")));
        let err = run_turn(&oracle(generator), &WorldState::default(), &actors(), &MemoryLog::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TurnError::Update(_)));
    }

    #[test]
    fn test_reported_failure_prefers_genuine_errors() {
        let cancelled = |index| ActorStepError::Observe {
            index,
            actor: format!("actor {}", index),
            source: CallError::Generation(RetryError::Cancelled { attempts: 0, last: None }),
        };
        let genuine = |index| ActorStepError::Decide {
            index,
            actor: format!("actor {}", index),
            source: CallError::Generation(RetryError::Exhausted {
                attempts: 1,
                last: EnvError::injected("boom"),
                history: vec![],
            }),
        };

        let picked = reported_failure(vec![cancelled(0), genuine(2), genuine(3)]).unwrap();
        assert_eq!(picked.index(), 2);

        let picked = reported_failure(vec![cancelled(1), cancelled(4)]).unwrap();
        assert_eq!(picked.index(), 1);

        assert!(reported_failure(vec![]).is_none());
    }
}
