//! Common types for the augury environment abstraction.

use serde::{Deserialize, Serialize};

/// Named JSON schema constraining a generator response.
///
/// With `strict` set, the backend guarantees the returned text parses
/// against `schema` or the call fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSchema {
    /// Schema name, e.g. `"WorldState"`
    pub name: String,

    /// JSON Schema document
    pub schema: serde_json::Value,

    /// Whether the backend must enforce the schema
    pub strict: bool,
}

impl ResponseSchema {
    /// Creates a strict schema.
    pub fn strict(name: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            schema,
            strict: true,
        }
    }
}

/// One structured generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model identifier, threaded from the engine configuration
    pub model: String,

    /// The single user prompt
    pub prompt: String,

    /// Expected response shape
    pub schema: ResponseSchema,
}

impl GenerationRequest {
    /// Creates a new request.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, schema: ResponseSchema) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            schema,
        }
    }

    /// Returns the schema name (used for logging and scripted dispatch).
    pub fn schema_name(&self) -> &str {
        &self.schema.name
    }

    /// Returns the prompt size in characters.
    pub fn prompt_len(&self) -> usize {
        self.prompt.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strict_schema() {
        let schema = ResponseSchema::strict("WorldState", json!({"type": "object"}));
        assert!(schema.strict);
        assert_eq!(schema.name, "WorldState");
    }

    #[test]
    fn test_request_accessors() {
        let request = GenerationRequest::new(
            "gpt-5.2",
            "héllo",
            ResponseSchema::strict("ActorView", json!({})),
        );
        assert_eq!(request.schema_name(), "ActorView");
        assert_eq!(request.prompt_len(), 5);
    }
}
