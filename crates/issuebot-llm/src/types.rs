//! Core types for completion provider interaction.
//!
//! These types model the data flowing between issuebot and text-completion
//! endpoints.  They are provider-agnostic at this layer; the [`crate::client`]
//! module translates them into the OpenAI-compatible wire format.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sampling options
// ---------------------------------------------------------------------------

/// Sampling configuration for a single completion call.
///
/// Two presets cover both call sites in issuebot: [`SamplingOptions::greedy`]
/// for classification (always pick the highest-probability continuation) and
/// [`SamplingOptions::sampled`] for generation, where lexical variety is
/// desirable.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingOptions {
    /// When true, sampling is disabled and the endpoint is asked for the
    /// highest-probability continuation.  `temperature`, `top_k`, and `top_p`
    /// are ignored.
    pub deterministic: bool,

    /// Maximum number of tokens the endpoint may generate.
    pub max_tokens: u32,

    /// Sampling temperature (only meaningful when `deterministic` is false).
    pub temperature: Option<f32>,

    /// Top-k truncation (only meaningful when `deterministic` is false).
    pub top_k: Option<u32>,

    /// Nucleus (top-p) truncation (only meaningful when `deterministic` is
    /// false).
    pub top_p: Option<f32>,
}

impl SamplingOptions {
    /// Deterministic decoding with a bounded output length.
    pub fn greedy(max_tokens: u32) -> Self {
        Self {
            deterministic: true,
            max_tokens,
            temperature: None,
            top_k: None,
            top_p: None,
        }
    }

    /// Stochastic decoding with explicit temperature and truncation bounds.
    pub fn sampled(max_tokens: u32, temperature: f32, top_k: u32, top_p: f32) -> Self {
        Self {
            deterministic: false,
            max_tokens,
            temperature: Some(temperature),
            top_k: Some(top_k),
            top_p: Some(top_p),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types (OpenAI-compatible `/completions`)
// ---------------------------------------------------------------------------

/// Request body for the text completion endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    /// The model identifier (e.g. `"phi3:mini"`).
    pub model: String,

    /// The full prompt, including any few-shot examples.
    pub prompt: String,

    /// Maximum tokens to generate.
    pub max_tokens: u32,

    /// Sampling temperature.  `0.0` requests greedy decoding.
    pub temperature: f32,

    /// Top-k truncation.  Not part of the strict OpenAI schema but honored by
    /// Ollama, vLLM, and llama.cpp endpoints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    /// Nucleus truncation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

/// A single completion choice returned by the endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionChoice {
    /// The generated continuation text.
    pub text: String,

    /// Why generation stopped (`"stop"`, `"length"`, ...).
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Response body from the text completion endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    /// Generated choices.  issuebot only ever requests one.
    pub choices: Vec<CompletionChoice>,

    /// Token accounting, when the endpoint reports it.
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// Token usage information returned by the endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Usage {
    /// Number of tokens in the prompt.
    #[serde(default)]
    pub prompt_tokens: u32,
    /// Number of tokens generated.
    #[serde(default)]
    pub completion_tokens: u32,
}
