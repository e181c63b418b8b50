//! Run journals: where the human-readable transcript of a run goes.
//!
//! A journal has exactly one capability, recording a line. Runs receive
//! one explicitly, so concurrent runs in a batch each write to their own
//! file while a single interactive run writes to the console.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use serde::Serialize;
use tracing::warn;

/// Sink for transcript lines.
pub trait RunLog: Send + Sync {
    fn record(&self, line: &str);
}

/// Writes to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleLog;

impl RunLog for ConsoleLog {
    fn record(&self, line: &str) {
        println!("{}", line);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLog;

impl RunLog for NullLog {
    fn record(&self, _line: &str) {}
}

/// Appends to a file, flushing after every line.
pub struct FileLog {
    writer: Mutex<BufWriter<File>>,
}

impl FileLog {
    /// Creates (truncates) the file at `path`.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl RunLog for FileLog {
    fn record(&self, line: &str) {
        let mut writer = match self.writer.lock() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            warn!(error = %e, "failed to write transcript line");
        }
    }
}

/// Keeps lines in memory (tests and previews).
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<String>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }
}

impl RunLog for MemoryLog {
    fn record(&self, line: &str) {
        match self.lines.lock() {
            Ok(mut lines) => lines.push(line.to_string()),
            Err(poisoned) => poisoned.into_inner().push(line.to_string()),
        }
    }
}

/// Pretty JSON for transcripts; never fails.
pub fn pretty<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unprintable: {}>", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WorldState;

    #[test]
    fn test_memory_log_records_in_order() {
        let log = MemoryLog::new();
        log.record("first");
        log.record("second");
        assert_eq!(log.lines(), vec!["first", "second"]);
        assert!(log.contains("sec"));
    }

    #[test]
    fn test_file_log_flushes_each_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("simulation.log");
        let log = FileLog::create(&path).unwrap();

        log.record("=== Generating Actors ===");
        log.record("done");

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "=== Generating Actors ===\ndone\n");
    }

    #[test]
    fn test_pretty_world_state() {
        let world = WorldState {
            events: vec!["e1".to_string()],
            description: "d".to_string(),
        };
        let text = pretty(&world);
        assert!(text.contains("\n  \"events\""));
    }
}
