//! HTTP client for OpenAI-compatible text completion endpoints.
//!
//! Targets the `/completions` route exposed by Ollama, vLLM, llama.cpp, and
//! hosted OpenAI-compatible services.  issuebot sends plain few-shot prompts
//! and reads back a single continuation -- no chat framing, no streaming.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::debug;
use url::Url;

use crate::error::{LlmError, Result};
use crate::provider::CompletionProvider;
use crate::types::{CompletionRequest, CompletionResponse, SamplingOptions};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default request deadline in seconds.
///
/// Both issuebot call sites cap output at a couple dozen tokens, so a minute
/// is generous even for a cold local model.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Temperature sent when the caller requests deterministic decoding.
const GREEDY_TEMPERATURE: f32 = 0.0;

// ---------------------------------------------------------------------------
// Client configuration
// ---------------------------------------------------------------------------

/// Configuration for connecting to a single completion endpoint.
#[derive(Debug, Clone)]
pub struct CompletionClientConfig {
    /// Base URL of the OpenAI-compatible API (e.g. `http://localhost:11434/v1`).
    pub base_url: String,
    /// API key for authentication.  Empty for unauthenticated local endpoints.
    pub api_key: String,
    /// Model identifier to request.
    pub model: String,
    /// Per-request deadline in seconds.
    pub request_timeout_secs: u64,
}

impl CompletionClientConfig {
    /// Create a configuration for an OpenAI-compatible endpoint with no
    /// authentication (the common local-model case).
    pub fn openai_compatible(model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: String::new(),
            model: model.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    /// Attach an API key for hosted endpoints.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// A completion client that speaks the OpenAI `/completions` wire format.
///
/// The client is cheap to clone and safe to share; each call is an
/// independent request/response round trip bounded by the configured
/// deadline.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    config: CompletionClientConfig,
    completions_url: Url,
    http: reqwest::Client,
}

impl CompletionClient {
    /// Create a new client with the given configuration.
    ///
    /// Fails if the base URL does not parse or the HTTP client cannot be
    /// constructed.
    pub fn new(config: CompletionClientConfig) -> Result<Self> {
        if config.model.is_empty() {
            return Err(LlmError::ConfigError {
                reason: "model identifier is empty".into(),
            });
        }

        let base = Url::parse(&config.base_url).map_err(|e| LlmError::ConfigError {
            reason: format!("invalid base url `{}`: {e}", config.base_url),
        })?;

        let completions_url = join_route(&base, "completions")?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if !config.api_key.is_empty() {
            let value = HeaderValue::from_str(&format!("Bearer {}", config.api_key)).map_err(
                |_| LlmError::ConfigError {
                    reason: "api key contains non-header characters".into(),
                },
            )?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| LlmError::RequestFailed {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            config,
            completions_url,
            http,
        })
    }

    /// The configured model identifier.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Build the wire request for a prompt under the given sampling options.
    ///
    /// Deterministic mode pins temperature to zero and omits the truncation
    /// knobs so the endpoint always picks the highest-probability
    /// continuation.
    fn build_request(&self, prompt: &str, options: &SamplingOptions) -> CompletionRequest {
        if options.deterministic {
            CompletionRequest {
                model: self.config.model.clone(),
                prompt: prompt.to_string(),
                max_tokens: options.max_tokens,
                temperature: GREEDY_TEMPERATURE,
                top_k: None,
                top_p: None,
            }
        } else {
            CompletionRequest {
                model: self.config.model.clone(),
                prompt: prompt.to_string(),
                max_tokens: options.max_tokens,
                temperature: options.temperature.unwrap_or(GREEDY_TEMPERATURE),
                top_k: options.top_k,
                top_p: options.top_p,
            }
        }
    }
}

#[async_trait]
impl CompletionProvider for CompletionClient {
    async fn complete(&self, prompt: &str, options: &SamplingOptions) -> Result<String> {
        let body = self.build_request(prompt, options);

        let response = self
            .http
            .post(self.completions_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        seconds: self.config.request_timeout_secs,
                    }
                } else {
                    LlmError::RequestFailed {
                        reason: format!("completion endpoint unreachable: {e}"),
                    }
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::RequestFailed {
                reason: format!("failed to read response body: {e}"),
            })?;

        if !status.is_success() {
            return Err(LlmError::RequestFailed {
                reason: format!("endpoint returned {status}: {text}"),
            });
        }

        let parsed: CompletionResponse =
            serde_json::from_str(&text).map_err(|e| LlmError::ParseFailed {
                reason: format!("invalid JSON response: {e}"),
            })?;

        if let Some(usage) = &parsed.usage {
            debug!(
                model = %self.config.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "completion finished"
            );
        }

        extract_completion_text(parsed)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Join a route onto a base URL, preserving any path prefix (`/v1`).
fn join_route(base: &Url, route: &str) -> Result<Url> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| LlmError::ConfigError {
                reason: format!("base url `{base}` cannot carry a path"),
            })?;
        segments.pop_if_empty().push(route);
    }
    Ok(url)
}

/// Pull the first choice's text out of a parsed response.
fn extract_completion_text(response: CompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.text)
        .ok_or(LlmError::EmptyCompletion)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> CompletionClient {
        CompletionClient::new(CompletionClientConfig::openai_compatible(
            "phi3:mini",
            "http://localhost:11434/v1",
        ))
        .unwrap()
    }

    #[test]
    fn completions_route_preserves_path_prefix() {
        let client = test_client();
        assert_eq!(
            client.completions_url.as_str(),
            "http://localhost:11434/v1/completions"
        );
    }

    #[test]
    fn completions_route_without_prefix() {
        let client = CompletionClient::new(CompletionClientConfig::openai_compatible(
            "phi3:mini",
            "http://localhost:8000",
        ))
        .unwrap();
        assert_eq!(
            client.completions_url.as_str(),
            "http://localhost:8000/completions"
        );
    }

    #[test]
    fn invalid_base_url_rejected() {
        let result = CompletionClient::new(CompletionClientConfig::openai_compatible(
            "phi3:mini",
            "not a url",
        ));
        assert!(matches!(result, Err(LlmError::ConfigError { .. })));
    }

    #[test]
    fn empty_model_rejected() {
        let result = CompletionClient::new(CompletionClientConfig::openai_compatible(
            "",
            "http://localhost:11434/v1",
        ));
        assert!(matches!(result, Err(LlmError::ConfigError { .. })));
    }

    #[test]
    fn greedy_request_pins_temperature() {
        let client = test_client();
        let body = client.build_request("Intent:", &SamplingOptions::greedy(24));
        assert_eq!(body.temperature, 0.0);
        assert!(body.top_k.is_none());
        assert!(body.top_p.is_none());
        assert_eq!(body.max_tokens, 24);
    }

    #[test]
    fn sampled_request_carries_truncation_knobs() {
        let client = test_client();
        let body = client.build_request("Issue Title:", &SamplingOptions::sampled(24, 0.7, 50, 0.9));
        assert_eq!(body.temperature, 0.7);
        assert_eq!(body.top_k, Some(50));
        assert_eq!(body.top_p, Some(0.9));
    }

    #[test]
    fn sampled_request_serializes_top_k() {
        let client = test_client();
        let body = client.build_request("x", &SamplingOptions::sampled(8, 0.5, 40, 0.95));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["top_k"], 40);
        assert_eq!(json["top_p"], 0.95);
    }

    #[test]
    fn extract_text_takes_first_choice() {
        let response: CompletionResponse = serde_json::from_str(
            r#"{"choices": [{"text": " Intent: Get Issue"}, {"text": "other"}]}"#,
        )
        .unwrap();
        assert_eq!(
            extract_completion_text(response).unwrap(),
            " Intent: Get Issue"
        );
    }

    #[test]
    fn extract_text_fails_on_no_choices() {
        let response: CompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            extract_completion_text(response),
            Err(LlmError::EmptyCompletion)
        ));
    }
}
