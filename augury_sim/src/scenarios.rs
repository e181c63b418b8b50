//! Scenario sources and the built-in preset.

use augury_core::Scenario;

/// Built-in situation used when nothing else is given.
pub const DEFAULT_SITUATION: &str = "The Bank of Japan is considering what to do about rates. \
I am curious about how to balance the central bank of Japan changing rates with the needs of \
the Japanese people, the PM, but also possible external pressure to not unwind the Japanese \
carry trade.";

/// Closing question of the built-in preset.
pub const DEFAULT_QUESTION: &str =
    "Did the Bank of Japan raise rates, potentially unwinding the Japanese carry trade?";

/// Turns of the built-in preset.
pub const DEFAULT_TURNS: usize = 2;

/// Where the situation text comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioSource {
    /// The built-in preset
    Preset,

    /// `--scenario` text, or typed at the prompt
    Text,

    /// The signals report's own narrative
    Report,

    /// Severity-filtered digest of the signals report
    Digest,
}

impl ScenarioSource {
    /// Returns all sources.
    pub fn all() -> Vec<ScenarioSource> {
        vec![
            ScenarioSource::Preset,
            ScenarioSource::Text,
            ScenarioSource::Report,
            ScenarioSource::Digest,
        ]
    }

    /// Returns the source name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioSource::Preset => "preset",
            ScenarioSource::Text => "text",
            ScenarioSource::Report => "report",
            ScenarioSource::Digest => "digest",
        }
    }

    /// True when the situation has to be fetched from the report feed.
    pub fn needs_report(&self) -> bool {
        matches!(self, ScenarioSource::Report | ScenarioSource::Digest)
    }
}

impl std::str::FromStr for ScenarioSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "preset" | "default" | "boj" => Ok(ScenarioSource::Preset),
            "text" | "manual" => Ok(ScenarioSource::Text),
            "report" | "narrative" => Ok(ScenarioSource::Report),
            "digest" | "signals" => Ok(ScenarioSource::Digest),
            _ => {
                let known: Vec<&str> = ScenarioSource::all().iter().map(|src| src.name()).collect();
                Err(format!(
                    "Unknown scenario source: {} (expected one of: {})",
                    s,
                    known.join(", ")
                ))
            }
        }
    }
}

impl std::fmt::Display for ScenarioSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A scenario whose parts may still be missing.
///
/// Missing parts are filled from the console before a run starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioDraft {
    pub situation: Option<String>,
    pub question: Option<String>,
    pub turns: Option<usize>,
}

impl ScenarioDraft {
    /// Draft pre-filled with the preset.
    pub fn preset() -> Self {
        Self {
            situation: Some(DEFAULT_SITUATION.to_string()),
            question: Some(DEFAULT_QUESTION.to_string()),
            turns: Some(DEFAULT_TURNS),
        }
    }

    /// Overrides the fields that are `Some` in `other`.
    pub fn merge(self, other: ScenarioDraft) -> Self {
        Self {
            situation: other.situation.or(self.situation),
            question: other.question.or(self.question),
            turns: other.turns.or(self.turns),
        }
    }

    /// Returns the scenario if nothing is missing.
    pub fn complete(&self) -> Option<Scenario> {
        Some(Scenario::new(
            self.situation.clone()?,
            self.question.clone()?,
            self.turns?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_is_complete() {
        let scenario = ScenarioDraft::preset().complete().unwrap();
        assert_eq!(scenario.turns, 2);
        assert!(scenario.scenario.starts_with("The Bank of Japan"));
        assert!(scenario.question.ends_with("carry trade?"));
    }

    #[test]
    fn test_source_from_str() {
        for source in ScenarioSource::all() {
            assert_eq!(source.name().parse::<ScenarioSource>().unwrap(), source);
        }
        assert_eq!("DIGEST".parse::<ScenarioSource>().unwrap(), ScenarioSource::Digest);
        let err = "weather".parse::<ScenarioSource>().unwrap_err();
        assert!(err.contains("preset, text, report, digest"));
        assert!(ScenarioSource::Report.needs_report());
        assert!(!ScenarioSource::Text.needs_report());
    }

    #[test]
    fn test_draft_merge_and_complete() {
        let draft = ScenarioDraft::preset().merge(ScenarioDraft {
            turns: Some(5),
            ..ScenarioDraft::default()
        });
        let scenario = draft.complete().unwrap();
        assert_eq!(scenario.turns, 5);
        assert_eq!(scenario.question, DEFAULT_QUESTION);

        assert!(ScenarioDraft::default().complete().is_none());
    }
}
