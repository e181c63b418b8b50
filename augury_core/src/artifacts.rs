//! Artifact sinks: best-effort persistence of intermediate run state.
//!
//! Layout of a run directory:
//!
//! ```text
//! actors.json
//! turn_1/actions.json
//! turn_1/world_state.json
//! ...
//! result.json
//! simulation.log        (batch runs only)
//! ```
//!
//! A batch directory holds `scenario.json`, `simulation_<n>/` per run, and
//! `aggregate_results.json`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::journal::{FileLog, NullLog, RunLog};

/// Destination for run artifacts, addressed by relative path.
pub trait ArtifactSink: Send + Sync {
    fn write(&self, relative: &Path, contents: &[u8]) -> io::Result<()>;
}

/// Serializes `value` as pretty JSON and writes it; failures are logged, never returned.
pub fn persist_json<T: Serialize + ?Sized>(
    sink: &dyn ArtifactSink,
    relative: impl AsRef<Path>,
    value: &T,
) {
    let relative = relative.as_ref();
    let result = serde_json::to_vec_pretty(value)
        .map_err(io::Error::from)
        .and_then(|bytes| sink.write(relative, &bytes));

    match result {
        Ok(()) => debug!(path = %relative.display(), "artifact written"),
        Err(e) => warn!(path = %relative.display(), error = %e, "failed to persist artifact"),
    }
}

/// Writes under a root directory, creating parents as needed.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactSink for DirectorySink {
    fn write(&self, relative: &Path, contents: &[u8]) -> io::Result<()> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)
    }
}

/// Drops every artifact.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ArtifactSink for NullSink {
    fn write(&self, _relative: &Path, _contents: &[u8]) -> io::Result<()> {
        Ok(())
    }
}

/// The transcript and artifact destinations of one run.
#[derive(Clone)]
pub struct RunSinks {
    pub log: Arc<dyn RunLog>,
    pub artifacts: Arc<dyn ArtifactSink>,
}

impl RunSinks {
    pub fn new(log: Arc<dyn RunLog>, artifacts: Arc<dyn ArtifactSink>) -> Self {
        Self { log, artifacts }
    }

    /// Nothing recorded, nothing persisted.
    pub fn discard() -> Self {
        Self::new(Arc::new(NullLog), Arc::new(NullSink))
    }
}

/// Per-batch output layout: one shared sink plus isolated sinks per run.
pub trait BatchOutput: Send + Sync {
    /// Sink for batch-level artifacts (scenario, aggregate).
    fn batch_artifacts(&self) -> Arc<dyn ArtifactSink>;

    /// Fresh, isolated sinks for run `run` (1-based).
    fn run_sinks(&self, run: usize) -> io::Result<RunSinks>;
}

/// `simulation_<n>/` directories with their own `simulation.log`.
#[derive(Debug, Clone)]
pub struct BatchDirectory {
    root: PathBuf,
}

impl BatchDirectory {
    /// Creates the batch root directory.
    pub fn create(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn run_dir(&self, run: usize) -> PathBuf {
        self.root.join(format!("simulation_{}", run))
    }
}

impl BatchOutput for BatchDirectory {
    fn batch_artifacts(&self) -> Arc<dyn ArtifactSink> {
        Arc::new(DirectorySink::new(self.root.clone()))
    }

    fn run_sinks(&self, run: usize) -> io::Result<RunSinks> {
        let dir = self.run_dir(run);
        fs::create_dir_all(&dir)?;
        let log = FileLog::create(dir.join("simulation.log"))?;
        Ok(RunSinks::new(Arc::new(log), Arc::new(DirectorySink::new(dir))))
    }
}

/// Batch layout that keeps nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardBatch;

impl BatchOutput for DiscardBatch {
    fn batch_artifacts(&self) -> Arc<dyn ArtifactSink> {
        Arc::new(NullSink)
    }

    fn run_sinks(&self, _run: usize) -> io::Result<RunSinks> {
        Ok(RunSinks::discard())
    }
}
