//! Core environment context trait for augury runs.

use async_trait::async_trait;
use std::time::{Duration, SystemTime};

/// The central interface for time.
///
/// This trait abstracts the clock so that the retry executor and the
/// run harness behave the same in production (tokio) and in deterministic
/// simulation (virtual clock).
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time`
/// - **Simulation**: `SimContext` (in `augury_sim`) - virtual clock
///
/// # Determinism
///
/// Backoff delays are the only timed waits in the engine. Routing them
/// through `sleep` lets tests assert the exact delay schedule without
/// waiting on the wall clock.
#[async_trait]
pub trait AuguryContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// In simulation, this is the virtual clock time.
    fn now(&self) -> Duration;

    /// Returns the wall-clock time, used to name output directories.
    fn system_time(&self) -> SystemTime;

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances the virtual clock
    async fn sleep(&self, duration: Duration);
}
