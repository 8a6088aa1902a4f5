//! Configuration loading.
//!
//! Settings come from an optional `issuebot.toml` file, with environment
//! variables applied on top.  Every field has a working local default, so a
//! bare `issuebot chat` against a local model and tool server needs no
//! configuration at all.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::helpers::env_non_empty;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Completion endpoint settings.
    pub llm: LlmSettings,
    /// Tool service and routing settings.
    pub tracker: TrackerSettings,
}

/// Completion endpoint settings (`[llm]` section).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// API key; empty for unauthenticated local endpoints.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Per-request deadline in seconds.
    pub request_timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".into(),
            api_key: String::new(),
            model: "phi3:mini".into(),
            request_timeout_secs: 60,
        }
    }
}

/// Tool service settings (`[tracker]` section).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    /// Streamable-HTTP tool endpoint URL.
    pub mcp_url: String,
    /// Project key for drafted issues.
    pub project_key: String,
    /// Issue type for drafted issues.
    pub issue_type: String,
    /// Deadline for a single remote tool call in seconds.
    pub call_timeout_secs: u64,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            mcp_url: "http://localhost:9000/mcp".into(),
            project_key: "AIDEVOPS".into(),
            issue_type: "Task".into(),
            call_timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load configuration from a TOML file (when present) and apply
    /// environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("failed to parse config file {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `ISSUEBOT_*` environment variables over the file values.
    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_non_empty("ISSUEBOT_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Some(v) = env_non_empty("ISSUEBOT_LLM_API_KEY") {
            self.llm.api_key = v;
        }
        if let Some(v) = env_non_empty("ISSUEBOT_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = env_non_empty("ISSUEBOT_MCP_URL") {
            self.tracker.mcp_url = v;
        }
        if let Some(v) = env_non_empty("ISSUEBOT_PROJECT_KEY") {
            self.tracker.project_key = v;
        }
        if let Some(v) = env_non_empty("ISSUEBOT_ISSUE_TYPE") {
            self.tracker.issue_type = v;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
