//! Engine configuration.
//!
//! One value, created at startup and threaded explicitly into every
//! generator call site. Nothing in the engine reads globals.

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gpt-5.2";

/// Configuration shared by the oracle, scheduler, runner and aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Model identifier sent with every request (default: `gpt-5.2`)
    pub model: String,

    /// Retry policy wrapped around every generator call
    pub retry: RetryPolicy,

    /// Stop issuing sibling calls once one actor or run has failed (default: true)
    pub cancel_siblings_on_failure: bool,

    /// Treat a fold over zero actions as the identity instead of asking the
    /// generator (default: false, the request is always issued)
    pub skip_empty_fold: bool,

    /// Answer preview length for console summaries (default: 200)
    pub preview_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            retry: RetryPolicy::default(),
            cancel_siblings_on_failure: true,
            skip_empty_fold: false,
            preview_chars: 200,
        }
    }
}

impl EngineConfig {
    /// Sets the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Shorthand for a retry policy with a different base delay.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.retry.base_delay = base_delay;
        self
    }

    pub fn with_cancel_siblings(mut self, enabled: bool) -> Self {
        self.cancel_siblings_on_failure = enabled;
        self
    }

    pub fn with_skip_empty_fold(mut self, enabled: bool) -> Self {
        self.skip_empty_fold = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.model, "gpt-5.2");
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay, Duration::from_secs(1));
        assert!(config.cancel_siblings_on_failure);
        assert!(!config.skip_empty_fold);
        assert_eq!(config.preview_chars, 200);
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::default()
            .with_model("gpt-5-mini")
            .with_base_delay(Duration::from_millis(10))
            .with_cancel_siblings(false);
        assert_eq!(config.model, "gpt-5-mini");
        assert_eq!(config.retry.base_delay, Duration::from_millis(10));
        assert_eq!(config.retry.max_attempts, 5);
        assert!(!config.cancel_siblings_on_failure);
    }
}
