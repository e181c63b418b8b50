//! Response schemas for every typed answer the engine asks for.
//!
//! Strict structured output requires every property to be listed in
//! `required` and `additionalProperties` to be `false`, so the schemas are
//! written out by hand next to the types they describe.

use augury_env::ResponseSchema;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::model::{Actor, ActorAction, ActorSet, ActorView, Verdict, WorldState};

/// A type the generator can be asked to produce.
pub trait Structured: DeserializeOwned {
    /// Schema name sent to the backend.
    const NAME: &'static str;

    /// JSON Schema of the type.
    fn json_schema() -> Value;

    fn response_schema() -> ResponseSchema {
        ResponseSchema::strict(Self::NAME, Self::json_schema())
    }
}

fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn string_list() -> Value {
    json!({ "type": "array", "items": { "type": "string" } })
}

impl Actor {
    fn json_schema() -> Value {
        object(
            json!({
                "name": { "type": "string" },
                "goals": { "type": "string" },
                "powers": { "type": "string" },
            }),
            &["name", "goals", "powers"],
        )
    }
}

impl Structured for ActorSet {
    const NAME: &'static str = "Actors";

    fn json_schema() -> Value {
        object(
            json!({
                "actors": { "type": "array", "items": Actor::json_schema() },
                "observations": { "type": "string" },
            }),
            &["actors", "observations"],
        )
    }
}

impl Structured for WorldState {
    const NAME: &'static str = "WorldState";

    fn json_schema() -> Value {
        object(
            json!({
                "events": string_list(),
                "description": { "type": "string" },
            }),
            &["events", "description"],
        )
    }
}

impl Structured for ActorView {
    const NAME: &'static str = "ActorView";

    fn json_schema() -> Value {
        object(
            json!({
                "visible_events": string_list(),
                "interpretation": { "type": "string" },
            }),
            &["visible_events", "interpretation"],
        )
    }
}

impl Structured for ActorAction {
    const NAME: &'static str = "ActorAction";

    fn json_schema() -> Value {
        object(
            json!({
                "actor_name": { "type": "string" },
                "action": { "type": "string" },
                "reasoning": { "type": "string" },
            }),
            &["actor_name", "action", "reasoning"],
        )
    }
}

impl Structured for Verdict {
    const NAME: &'static str = "SummarizationAnswer";

    fn json_schema() -> Value {
        object(
            json!({
                "answer": { "type": "string" },
                "yes_no": { "type": "boolean" },
            }),
            &["answer", "yes_no"],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    /// Every schema property must exist on the serialized type and be required.
    fn assert_schema_matches<T: Structured + Serialize>(sample: &T) {
        let schema = T::json_schema();
        let value = serde_json::to_value(sample).unwrap();
        let props = schema["properties"].as_object().unwrap();
        let fields = value.as_object().unwrap();

        assert_eq!(props.len(), fields.len(), "{}", T::NAME);
        for key in fields.keys() {
            assert!(props.contains_key(key), "{} missing {}", T::NAME, key);
        }
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), props.len());
        assert_eq!(schema["additionalProperties"], false);
        assert!(T::response_schema().strict);
    }

    #[test]
    fn test_schemas_cover_fields() {
        assert_schema_matches(&ActorSet::new(vec![Actor::new("a", "b", "c")], ""));
        assert_schema_matches(&WorldState::default());
        assert_schema_matches(&ActorView::default());
        assert_schema_matches(&ActorAction {
            actor_name: String::new(),
            action: String::new(),
            reasoning: String::new(),
        });
        assert_schema_matches(&Verdict {
            answer: String::new(),
            yes_no: false,
        });
    }

    #[test]
    fn test_nested_actor_schema_is_strict() {
        let schema = ActorSet::json_schema();
        let item = &schema["properties"]["actors"]["items"];
        assert_eq!(item["additionalProperties"], false);
        assert_eq!(item["required"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_schema_names() {
        assert_eq!(ActorSet::response_schema().name, "Actors");
        assert_eq!(Verdict::NAME, "SummarizationAnswer");
    }
}
