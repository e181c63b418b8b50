//! Interactive session - a single run with human checkpoints.
//!
//! ```text
//! session_<id>/
//! ├── actors/actor_<i>_<Name>.json   (editable before the run continues)
//! ├── turn_<k>/action_<i>_<Name>.json
//! ├── turn_<k>/world_state.json
//! └── final_result.json
//! ```
//!
//! Directory creation and the actor checkpoint are required; every other
//! file is written best-effort. A failure halts the session and leaves the
//! checkpoints already written in place.

use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use augury_core::{
    persist_json, Actor, ActorSet, DirectorySink, NullSink, Oracle, RunError, RunLog, RunSinks,
    Scenario, SimulationResult, SimulationRunner, TurnRecord,
};
use augury_env::{AuguryContext, Generator};
use tracing::{debug, info};

use crate::console::Console;
use crate::error::SimError;

/// Replaces characters that do not belong in a file name.
fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_whitespace() || c == '/' || c == '\\' { '_' } else { c })
        .collect()
}

/// `actor_<i>_<Name>.json`, 1-based.
pub fn actor_file_name(index: usize, name: &str) -> String {
    format!("actor_{}_{}.json", index + 1, file_safe(name))
}

fn numeric_prefix(file_name: &str) -> Option<usize> {
    file_name
        .strip_prefix("actor_")?
        .split('_')
        .next()?
        .parse()
        .ok()
}

/// Writes one file per actor into `dir`, replacing earlier actor files.
pub fn write_actor_files(dir: &Path, actors: &ActorSet) -> Result<(), SimError> {
    fs::create_dir_all(dir).map_err(SimError::io("failed to create actors directory"))?;

    for entry in fs::read_dir(dir).map_err(SimError::io("failed to read actors directory"))? {
        let path = entry.map_err(SimError::io("failed to read actors directory"))?.path();
        if path.extension().map_or(false, |e| e == "json") {
            fs::remove_file(&path).map_err(SimError::io("failed to remove stale actor file"))?;
        }
    }

    for (i, actor) in actors.actors.iter().enumerate() {
        let path = dir.join(actor_file_name(i, &actor.name));
        let json = serde_json::to_vec_pretty(actor).map_err(|source| SimError::ActorFile {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(SimError::io("failed to write actor file"))?;
    }
    Ok(())
}

/// Reads every `*.json` actor file in `dir`, ordered by numeric prefix.
///
/// Files without a prefix come last, by name.
pub fn load_actor_files(dir: &Path) -> Result<Vec<Actor>, SimError> {
    let mut files: Vec<(Option<usize>, String, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir).map_err(SimError::io("failed to read actors directory"))? {
        let entry = entry.map_err(SimError::io("failed to read actors directory"))?;
        let path = entry.path();
        if !path.is_file() || path.extension().map_or(true, |e| e != "json") {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        files.push((numeric_prefix(&name), name, path));
    }
    files.sort_by(|a, b| {
        (a.0.is_none(), a.0, &a.1).cmp(&(b.0.is_none(), b.0, &b.1))
    });

    files
        .into_iter()
        .map(|(_, _, path)| {
            let bytes = fs::read(&path).map_err(SimError::io("failed to read actor file"))?;
            serde_json::from_slice(&bytes).map_err(|source| SimError::ActorFile { path, source })
        })
        .collect()
}

/// A single run paused at each checkpoint.
pub struct InteractiveSession<Ctx, G, R, W> {
    runner: SimulationRunner<Ctx, G>,
    console: Console<R, W>,
    dir: PathBuf,
}

impl<Ctx, G, R, W> InteractiveSession<Ctx, G, R, W>
where
    Ctx: AuguryContext,
    G: Generator,
    R: BufRead,
    W: Write,
{
    /// Creates `session_<session_id>` under `parent`.
    pub fn create(
        oracle: Oracle<Ctx, G>,
        log: Arc<dyn RunLog>,
        console: Console<R, W>,
        parent: &Path,
        session_id: u32,
    ) -> Result<Self, SimError> {
        let dir = parent.join(format!("session_{}", session_id));
        fs::create_dir_all(&dir).map_err(SimError::io("failed to create session directory"))?;
        info!(dir = %dir.display(), "session directory created");

        // The session persists its own layout; the runner only writes the transcript.
        let runner = SimulationRunner::new(oracle, RunSinks::new(log, Arc::new(NullSink)));
        Ok(Self { runner, console, dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn say(&mut self, text: &str) -> Result<(), SimError> {
        self.console.say(text).map_err(SimError::io("failed to write to console"))
    }

    fn pause(&mut self, text: &str) -> Result<(), SimError> {
        self.console.pause(text).map_err(SimError::io("failed to read from console"))
    }

    /// Runs the scenario, stopping at every checkpoint.
    pub async fn run(&mut self, scenario: &Scenario) -> Result<SimulationResult, SimError> {
        self.say(&format!("\nSession directory: {}", self.dir.display()))?;

        let mut actors = self.runner.generate_actors(&scenario.scenario).await?;
        let actors_dir = self.dir.join("actors");
        write_actor_files(&actors_dir, &actors)?;

        self.say(&format!("\nActors saved to {}", actors_dir.display()))?;
        self.pause("You can now edit the actor files. Press Enter when ready to continue...")?;
        actors.actors = load_actor_files(&actors_dir)?;
        self.say(&format!("\nReloaded {} actors", actors.len()))?;

        let info = self
            .console
            .ask("Enter new information to adjust the actors (leave empty to skip): ")
            .map_err(SimError::io("failed to read from console"))?;
        if !info.is_empty() {
            actors = self
                .runner
                .oracle()
                .adjust_actors(&actors, &info)
                .await
                .map_err(RunError::AdjustActors)?;
            write_actor_files(&actors_dir, &actors)?;
            self.say(&format!("Adjusted to {} actors", actors.len()))?;
        }

        let mut world = self.runner.initial_world(&scenario.scenario, &actors).await?;
        let mut history = Vec::with_capacity(scenario.turns);

        for turn in 1..=scenario.turns {
            let turn_dir = self.dir.join(format!("turn_{}", turn));
            fs::create_dir_all(&turn_dir).map_err(SimError::io("failed to create turn directory"))?;

            let outcome = self.runner.play_turn(turn, &world, &actors).await?;

            let sink = DirectorySink::new(&turn_dir);
            for (i, action) in outcome.actions.iter().enumerate() {
                let file = format!("action_{}_{}.json", i + 1, file_safe(&action.actor_name));
                persist_json(&sink, file, action);
            }
            persist_json(&sink, "world_state.json", &outcome.world);
            debug!(turn, dir = %turn_dir.display(), "turn checkpoint written");

            history.push(TurnRecord {
                turn,
                actions: outcome.actions,
            });
            world = outcome.world;

            self.say(&format!("\nTurn {} data saved to {}", turn, turn_dir.display()))?;
            self.pause("Press Enter to continue to next turn...")?;
        }

        let result = self.runner.conclude(&scenario.question, &world, &history).await?;
        let result_file = self.dir.join("final_result.json");
        persist_json(&DirectorySink::new(&self.dir), "final_result.json", &result);

        self.say(&format!("\nQuestion: {}", result.question))?;
        self.say(&format!("Yes/No: {}", result.yes_no))?;
        self.say(&format!("Answer: {}", result.answer))?;
        self.say(&format!("\nFinal result saved to {}", result_file.display()))?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_file_name() {
        assert_eq!(actor_file_name(0, "Bank of Japan"), "actor_1_Bank_of_Japan.json");
        assert_eq!(actor_file_name(9, "US/Treasury"), "actor_10_US_Treasury.json");
    }

    #[test]
    fn test_reload_orders_by_numeric_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let actors = ActorSet::new(
            (0..11).map(|i| Actor::new(format!("Actor {}", i), "g", "p")).collect(),
            "",
        );
        write_actor_files(dir.path(), &actors).unwrap();

        // Lexical order would put actor_10 and actor_11 before actor_2
        let loaded = load_actor_files(dir.path()).unwrap();
        let names: Vec<_> = loaded.iter().map(|a| a.name.clone()).collect();
        let expected: Vec<_> = (0..11).map(|i| format!("Actor {}", i)).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_rewrite_replaces_stale_files() {
        let dir = tempfile::tempdir().unwrap();
        let three = ActorSet::new(
            vec![Actor::new("A", "", ""), Actor::new("B", "", ""), Actor::new("C", "", "")],
            "",
        );
        write_actor_files(dir.path(), &three).unwrap();
        write_actor_files(dir.path(), &ActorSet::new(vec![Actor::new("Z", "", "")], "")).unwrap();

        let loaded = load_actor_files(dir.path()).unwrap();
        assert_eq!(loaded, vec![Actor::new("Z", "", "")]);
    }

    #[test]
    fn test_broken_actor_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("actor_1_A.json"), b"{ not json").unwrap();
        let err = load_actor_files(dir.path()).unwrap_err();
        assert!(matches!(err, SimError::ActorFile { .. }));
    }
}
