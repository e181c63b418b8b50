//! augury Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" seam that lets the augury engine run
//! against real services (tokio + an HTTP model endpoint) or inside a
//! deterministic harness (virtual clock + scripted generator).
//!
//! # Core Concept
//!
//! The engine never touches the outside world directly. Everything that can
//! block or fail for reasons outside the engine goes through a trait:
//! - Time (`now()`, `system_time()`, `sleep()`) via [`AuguryContext`]
//! - Structured generation (`generate()`) via [`Generator`]
//!
//! # Example
//!
//! ```ignore
//! use augury_env::{AuguryContext, Generator, GenerationRequest};
//!
//! async fn ask<Ctx: AuguryContext, G: Generator>(ctx: &Ctx, generator: &G, request: &GenerationRequest) {
//!     loop {
//!         match generator.generate(request).await {
//!             Ok(json) => break handle(json),
//!             Err(_) => ctx.sleep(Duration::from_secs(1)).await,
//!         }
//!     }
//! }
//! ```

mod context;
mod generator;
mod types;
mod error;
mod tokio_impl;

pub use context::AuguryContext;
pub use generator::Generator;
pub use types::{GenerationRequest, ResponseSchema};
pub use error::EnvError;
pub use tokio_impl::TokioContext;
