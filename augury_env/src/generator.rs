//! Structured generation abstraction.

use async_trait::async_trait;
use crate::error::EnvError;
use crate::types::GenerationRequest;

/// The external structured-completion service.
///
/// Given a prompt and a response schema, returns text that parses as JSON
/// matching the schema, or fails. The engine treats every failure as
/// transient and retries it.
///
/// # Implementations
///
/// - **Production**: `OpenAiGenerator` - chat completions over HTTP
/// - **Simulation**: `ScriptedGenerator` - canned answers with fault injection
///
/// # Request Flow
///
/// ```text
/// Engine                     Generator                    Model
///   |                           |                           |
///   |-- generate(request) ----->|                           |
///   |                           |-- prompt + json_schema -->|
///   |                           |<-- JSON text -------------|
///   |<-- Ok(json) --------------|                           |
/// ```
#[async_trait]
pub trait Generator: Send + Sync + 'static {
    /// Issues one structured request.
    ///
    /// # Returns
    /// * `Ok(text)` - JSON text shaped by `request.schema`
    /// * `Err(EnvError)` - any failure; the caller decides whether to retry
    ///
    /// # Note
    /// Implementations must not retry internally. Retrying is the engine's job.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, EnvError>;
}
