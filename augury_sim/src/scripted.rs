//! Scripted generator with fault injection.
//!
//! Stands in for a real model endpoint: responses are looked up by schema
//! name, failures are injected by rule, and an optional seeded shuffle
//! makes concurrent calls complete in a scrambled but reproducible order.

use async_trait::async_trait;
use augury_core::Actor;
use augury_env::{EnvError, GenerationRequest, Generator};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

type Responder = Arc<dyn Fn(&GenerationRequest) -> Result<String, EnvError> + Send + Sync>;

/// Most yields a shuffled call takes before answering.
const MAX_SHUFFLE_YIELDS: u32 = 8;

#[derive(Debug, Clone)]
struct FailureRule {
    schema: String,
    /// Only requests whose prompt contains this text
    needle: Option<String>,
    /// `None` fails forever
    remaining: Option<u32>,
    message: String,
}

impl FailureRule {
    fn matches(&self, request: &GenerationRequest) -> bool {
        self.remaining != Some(0)
            && self.schema == request.schema_name()
            && self
                .needle
                .as_deref()
                .map_or(true, |n| request.prompt.contains(n))
    }
}

/// Generator answering from a script.
pub struct ScriptedGenerator {
    responders: Mutex<HashMap<String, Responder>>,
    failures: Mutex<Vec<FailureRule>>,
    calls: Mutex<Vec<GenerationRequest>>,
    shuffle: Option<Mutex<ChaCha8Rng>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Extracts the actor from an observe or decide prompt.
///
/// Both prompts carry the actor as compact JSON on the line after `Actor:`.
pub fn actor_in_prompt(prompt: &str) -> Option<Actor> {
    let start = prompt.find("Actor:\n")? + "Actor:\n".len();
    let line = prompt[start..].lines().next()?;
    serde_json::from_str(line).ok()
}

impl ScriptedGenerator {
    /// Creates a generator with no responses configured.
    pub fn new() -> Self {
        Self {
            responders: Mutex::new(HashMap::new()),
            failures: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            shuffle: None,
        }
    }

    /// A complete script: the given actors, a fixed world, one action per
    /// actor naming the actor, and a fixed verdict.
    pub fn canned(actor_names: &[&str], verdict: bool) -> Self {
        let actors: Vec<_> = actor_names
            .iter()
            .map(|name| {
                json!({
                    "name": name,
                    "goals": format!("{} goals", name),
                    "powers": format!("{} powers", name),
                })
            })
            .collect();

        Self::new()
            .respond("Actors", json!({ "actors": actors, "observations": "canned observations" }))
            .respond(
                "WorldState",
                json!({ "events": ["canned event"], "description": "canned world" }),
            )
            .respond(
                "ActorView",
                json!({ "visible_events": ["canned event"], "interpretation": "canned view" }),
            )
            .respond_with("ActorAction", |request| {
                let actor = actor_in_prompt(&request.prompt)
                    .ok_or_else(|| EnvError::Config("no actor in decide prompt".to_string()))?;
                Ok(json!({
                    "actor_name": actor.name,
                    "action": format!("{} acts", actor.name),
                    "reasoning": "canned reasoning",
                })
                .to_string())
            })
            .with_verdicts(vec![verdict])
    }

    /// Answers every `schema` request with `value`.
    pub fn respond(self, schema: &str, value: serde_json::Value) -> Self {
        let body = value.to_string();
        self.respond_with(schema, move |_| Ok(body.clone()))
    }

    /// Answers every `schema` request by calling `f`.
    pub fn respond_with<F>(self, schema: &str, f: F) -> Self
    where
        F: Fn(&GenerationRequest) -> Result<String, EnvError> + Send + Sync + 'static,
    {
        lock(&self.responders).insert(schema.to_string(), Arc::new(f));
        self
    }

    /// Cycles through `verdicts` for successive closing questions.
    pub fn with_verdicts(self, verdicts: Vec<bool>) -> Self {
        let next = AtomicUsize::new(0);
        self.respond_with("SummarizationAnswer", move |_| {
            if verdicts.is_empty() {
                return Err(EnvError::Config("no verdicts scripted".to_string()));
            }
            let i = next.fetch_add(1, Ordering::SeqCst) % verdicts.len();
            let yes_no = verdicts[i];
            Ok(json!({
                "answer": format!("canned answer {}", i + 1),
                "yes_no": yes_no,
            })
            .to_string())
        })
    }

    /// Fails the next `times` matching requests, then answers normally.
    pub fn fail_times(self, schema: &str, prompt_contains: Option<&str>, times: u32) -> Self {
        self.push_failure(schema, prompt_contains, Some(times))
    }

    /// Fails every matching request.
    pub fn fail_always(self, schema: &str, prompt_contains: Option<&str>) -> Self {
        self.push_failure(schema, prompt_contains, None)
    }

    fn push_failure(self, schema: &str, needle: Option<&str>, remaining: Option<u32>) -> Self {
        lock(&self.failures).push(FailureRule {
            schema: schema.to_string(),
            needle: needle.map(str::to_string),
            remaining,
            message: format!("scripted {} failure", schema),
        });
        self
    }

    /// Delays each answer by a seeded random number of scheduler yields.
    pub fn with_shuffle(mut self, seed: u64) -> Self {
        self.shuffle = Some(Mutex::new(ChaCha8Rng::seed_from_u64(seed)));
        self
    }

    /// Every request received, in arrival order.
    pub fn calls(&self) -> Vec<GenerationRequest> {
        lock(&self.calls).clone()
    }

    /// Number of requests received for `schema`.
    pub fn call_count(&self, schema: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|r| r.schema_name() == schema)
            .count()
    }

    fn injected_failure(&self, request: &GenerationRequest) -> Option<EnvError> {
        let mut failures = lock(&self.failures);
        let rule = failures.iter_mut().find(|r| r.matches(request))?;
        if let Some(remaining) = rule.remaining.as_mut() {
            *remaining -= 1;
        }
        Some(EnvError::injected(rule.message.clone()))
    }
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, EnvError> {
        lock(&self.calls).push(request.clone());

        let yields = match &self.shuffle {
            Some(rng) => lock(rng).gen_range(0..=MAX_SHUFFLE_YIELDS),
            None => 0,
        };
        for _ in 0..yields {
            tokio::task::yield_now().await;
        }

        if let Some(err) = self.injected_failure(request) {
            return Err(err);
        }

        let responder = lock(&self.responders).get(request.schema_name()).cloned();
        match responder {
            Some(respond) => respond(request),
            None => Err(EnvError::Config(format!(
                "no scripted response for schema {}",
                request.schema_name()
            ))),
        }
    }
}
