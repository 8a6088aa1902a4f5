//! Completion provider layer for issuebot.
//!
//! This crate is the boundary between issuebot and whatever text-completion
//! capability backs it.  Consumers depend on the [`CompletionProvider`]
//! trait; [`CompletionClient`] is the shipped implementation, speaking the
//! OpenAI-compatible `/completions` wire format used by Ollama, vLLM, and
//! llama.cpp.
//!
//! ## Modules
//!
//! - [`provider`] -- The `CompletionProvider` seam trait.
//! - [`client`] -- HTTP client for OpenAI-compatible endpoints.
//! - [`types`] -- Sampling options and wire types.
//! - [`error`] -- Provider error types.

pub mod client;
pub mod error;
pub mod provider;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use client::{CompletionClient, CompletionClientConfig};
pub use error::{LlmError, Result};
pub use provider::CompletionProvider;
pub use types::SamplingOptions;
