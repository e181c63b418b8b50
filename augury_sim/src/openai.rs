//! OpenAI-compatible chat completions backend.
//!
//! Sends the prompt as a single user message and asks for a strict
//! `json_schema` response format, so the returned content always parses
//! against the requested schema or the call fails.

use std::time::Duration;

use async_trait::async_trait;
use augury_env::{EnvError, GenerationRequest, Generator};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Endpoint and credentials.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Reads `OPENAI_API_KEY` and `OPENAI_BASE_URL` from the environment.
    pub fn from_env(timeout: Duration) -> Result<Self, EnvError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| EnvError::Config("OPENAI_API_KEY not set".to_string()))?;
        let base_url = std::env::var("OPENAI_BASE_URL")
            .ok()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            api_key,
            base_url,
            timeout,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    response_format: ResponseFormat<'a>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    schema: &'a serde_json::Value,
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

/// Generator backed by an OpenAI-compatible HTTP endpoint.
pub struct OpenAiGenerator {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiGenerator {
    pub fn new(config: OpenAiConfig) -> Result<Self, EnvError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EnvError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }
}

fn build_request(request: &GenerationRequest) -> ChatRequest<'_> {
    ChatRequest {
        model: &request.model,
        messages: vec![Message {
            role: "user",
            content: &request.prompt,
        }],
        response_format: ResponseFormat {
            kind: "json_schema",
            json_schema: JsonSchemaFormat {
                name: &request.schema.name,
                schema: &request.schema.schema,
                strict: request.schema.strict,
            },
        },
    }
}

fn extract_content(response: ChatResponse) -> Result<String, EnvError> {
    let message = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| EnvError::EmptyResponse("no choices returned".to_string()))?;

    if let Some(refusal) = message.refusal {
        return Err(EnvError::EmptyResponse(format!("model refused: {}", refusal)));
    }
    match message.content {
        Some(content) if !content.trim().is_empty() => Ok(content),
        _ => Err(EnvError::EmptyResponse("choice had no content".to_string())),
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, EnvError> {
        debug!(schema = request.schema_name(), model = %request.model, "POST chat completion");

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&build_request(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EnvError::Timeout(self.config.timeout.as_millis() as u64)
                } else {
                    EnvError::transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnvError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| EnvError::transport(format!("failed to read completion: {}", e)))?;
        extract_content(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use augury_env::ResponseSchema;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let request = GenerationRequest::new(
            "gpt-5.2",
            "hello",
            ResponseSchema::strict("WorldState", json!({"type": "object"})),
        );
        let body = serde_json::to_value(build_request(&request)).unwrap();

        assert_eq!(body["model"], "gpt-5.2");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hello");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "WorldState");
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);
    }

    #[test]
    fn test_extract_content() {
        let ok: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"content": "{\"a\":1}"}}]
        }))
        .unwrap();
        assert_eq!(extract_content(ok).unwrap(), "{\"a\":1}");

        let empty: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(extract_content(empty), Err(EnvError::EmptyResponse(_))));

        let refused: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"content": null, "refusal": "no"}}]
        }))
        .unwrap();
        assert!(extract_content(refused).unwrap_err().to_string().contains("refused"));
    }

    #[test]
    fn test_completions_url_trims_slash() {
        let config = OpenAiConfig {
            api_key: "k".to_string(),
            base_url: "http://localhost:8080/v1/".to_string(),
            timeout: Duration::from_secs(1),
        };
        assert_eq!(config.completions_url(), "http://localhost:8080/v1/chat/completions");
    }
}
