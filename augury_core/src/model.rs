//! World model: the entities a run creates, passes around, and reports.
//!
//! Everything here is plain data. The only judgment calls (what an actor can
//! see, what it does, how the world moves on) are delegated to the generator
//! by [`crate::oracle::Oracle`]; this module just holds the results.

use serde::{Deserialize, Serialize};

/// A named party with goals and powers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub goals: String,
    /// Formal and informal powers, free text
    pub powers: String,
}

impl Actor {
    pub fn new(name: impl Into<String>, goals: impl Into<String>, powers: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            goals: goals.into(),
            powers: powers.into(),
        }
    }
}

/// Ordered actors of a run.
///
/// The order is the index contract of the turn scheduler: the i-th action of
/// every turn belongs to the i-th actor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActorSet {
    pub actors: Vec<Actor>,
    pub observations: String,
}

impl ActorSet {
    pub fn new(actors: Vec<Actor>, observations: impl Into<String>) -> Self {
        Self {
            actors,
            observations: observations.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.actors.iter().map(|a| a.name.as_str()).collect()
    }
}

/// Shared ground truth at one point in simulated time.
///
/// Replaced wholesale after every turn, never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorldState {
    pub events: Vec<String>,
    pub description: String,
}

/// What one actor perceives of a [`WorldState`] during one turn.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActorView {
    pub visible_events: Vec<String>,
    pub interpretation: String,
}

/// One actor's move in one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorAction {
    pub actor_name: String,
    pub action: String,
    pub reasoning: String,
}

/// Actions of one completed turn, in actor order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// 1-based turn number
    pub turn: usize,
    pub actions: Vec<ActorAction>,
}

/// The generator's answer to the closing question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub answer: String,
    pub yes_no: bool,
}

/// Terminal artifact of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub question: String,
    pub yes_no: bool,
    pub answer: String,
}

/// Inputs shared by every run of a session or batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Free-text situation description
    pub scenario: String,
    /// Closing yes/no question
    pub question: String,
    /// Number of turns to simulate
    pub turns: usize,
}

impl Scenario {
    pub fn new(scenario: impl Into<String>, question: impl Into<String>, turns: usize) -> Self {
        Self {
            scenario: scenario.into(),
            question: question.into(),
            turns,
        }
    }
}

/// Statistical summary of an aggregation batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub question: String,
    pub total: usize,
    pub yes_count: usize,
    pub no_count: usize,
    pub yes_percentage: f64,
    pub scenario: String,
    pub turns: usize,
    /// Per-run results in run order
    pub individual_results: Vec<SimulationResult>,
}

impl AggregateResult {
    /// Folds run results into counts and a percentage.
    ///
    /// `no_count` is derived from `total`, so `yes_count + no_count == total`
    /// holds by construction. An empty result list yields 0%.
    pub fn from_results(scenario: &Scenario, results: Vec<SimulationResult>) -> Self {
        let total = results.len();
        let yes_count = results.iter().filter(|r| r.yes_no).count();
        let yes_percentage = if total == 0 {
            0.0
        } else {
            100.0 * yes_count as f64 / total as f64
        };

        Self {
            question: scenario.question.clone(),
            total,
            yes_count,
            no_count: total - yes_count,
            yes_percentage,
            scenario: scenario.scenario.clone(),
            turns: scenario.turns,
            individual_results: results,
        }
    }

    /// One-line previews of each run, answers cut to `max_chars`.
    pub fn summaries(&self, max_chars: usize) -> Vec<RunSummary> {
        self.individual_results
            .iter()
            .enumerate()
            .map(|(i, r)| RunSummary {
                run: i + 1,
                yes_no: r.yes_no,
                preview: preview(&r.answer, max_chars),
            })
            .collect()
    }
}

/// Console-sized view of one run's outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// 1-based run number
    pub run: usize,
    pub yes_no: bool,
    pub preview: String,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verdict = if self.yes_no { "Yes" } else { "No" };
        write!(f, "Simulation {}: {} - {}", self.run, verdict, self.preview)
    }
}

/// Cuts `text` to at most `max_chars` characters, marking the cut with `...`.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(yes_no: bool, answer: &str) -> SimulationResult {
        SimulationResult {
            question: "q".to_string(),
            yes_no,
            answer: answer.to_string(),
        }
    }

    #[test]
    fn test_aggregate_two_of_three() {
        let scenario = Scenario::new("s", "q", 2);
        let agg = AggregateResult::from_results(
            &scenario,
            vec![result(true, "a"), result(false, "b"), result(true, "c")],
        );

        assert_eq!(agg.total, 3);
        assert_eq!(agg.yes_count, 2);
        assert_eq!(agg.no_count, 1);
        assert_eq!(agg.yes_percentage, 100.0 * 2.0 / 3.0);
        assert!((agg.yes_percentage - 66.666).abs() < 0.001);
    }

    #[test]
    fn test_aggregate_empty() {
        let agg = AggregateResult::from_results(&Scenario::new("s", "q", 1), vec![]);
        assert_eq!(agg.total, 0);
        assert_eq!(agg.yes_percentage, 0.0);
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("short", 200), "short");
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("ééééé", 2), "éé...");
        assert_eq!(preview("abc", 3), "abc");
    }

    #[test]
    fn test_summaries_are_numbered_from_one() {
        let long = "x".repeat(250);
        let agg = AggregateResult::from_results(
            &Scenario::new("s", "q", 1),
            vec![result(false, "no way"), result(true, &long)],
        );
        let summaries = agg.summaries(200);

        assert_eq!(summaries[0].to_string(), "Simulation 1: No - no way");
        assert_eq!(summaries[1].run, 2);
        assert_eq!(summaries[1].preview.len(), 203);
        // Persisted text stays whole
        assert_eq!(agg.individual_results[1].answer.len(), 250);
    }

    #[test]
    fn test_actor_set_serializes_lowercase_keys() {
        let set = ActorSet::new(vec![Actor::new("A", "g", "p")], "notes");
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["actors"][0]["name"], "A");
        assert_eq!(json["observations"], "notes");
        assert_eq!(set.names(), vec!["A"]);
    }
}
