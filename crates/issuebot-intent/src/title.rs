//! Title generation -- rephrases a request into a concise issue summary.
//!
//! Unlike classification, generation runs with mild sampling: titles benefit
//! from lexical variety, and there is no structured answer to get wrong.
//! The worst case is a low-quality or empty title, which is surfaced as-is.

use std::sync::Arc;

use tracing::warn;

use issuebot_llm::{CompletionProvider, SamplingOptions};

// ---------------------------------------------------------------------------
// Generation prompt
// ---------------------------------------------------------------------------

/// Output-length cap for the title completion.
const TITLE_MAX_TOKENS: u32 = 20;

/// Sampling temperature for title generation.
const TITLE_TEMPERATURE: f32 = 0.7;

/// Top-k truncation for title generation.
const TITLE_TOP_K: u32 = 50;

/// Nucleus truncation for title generation.
const TITLE_TOP_P: f32 = 0.9;

const TITLE_PROMPT_PREFIX: &str = "\
Convert the following user request into a concise and professional Jira issue title.
Keep it under 12 words.

Example 1:
User: Create an issue for Grafana log monitoring
Issue Title: Grafana log monitoring issue

Example 2:
User: File a task for fixing the broken login form on mobile
Issue Title: Fix broken login form on mobile

Example 3:
User: Add a bug ticket to resolve API timeout when fetching user data
Issue Title: Resolve API timeout fetching user data

Example 4:
User: Open a task in DEVOPS to upgrade dependencies
Issue Title: Upgrade dependencies in DEVOPS

Example 5:
User: Create a Jira issue to improve dashboard responsiveness
Issue Title: Improve dashboard responsiveness

";

/// Build the live generation prompt for a request.
fn title_prompt(text: &str) -> String {
    format!("{TITLE_PROMPT_PREFIX}User: {text}\nIssue Title:")
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Generates short issue titles from free-form requests.
pub struct TitleGenerator {
    provider: Arc<dyn CompletionProvider>,
}

impl TitleGenerator {
    /// Create a generator backed by the given completion provider.
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Generate a title for a request.
    ///
    /// Never fails: a provider fault yields an empty string, which callers
    /// send as-is -- there is no server-side title validation.
    pub async fn generate(&self, text: &str) -> String {
        let prompt = title_prompt(text);
        let options = SamplingOptions::sampled(
            TITLE_MAX_TOKENS,
            TITLE_TEMPERATURE,
            TITLE_TOP_K,
            TITLE_TOP_P,
        );

        match self.provider.complete(&prompt, &options).await {
            Ok(output) => extract_title(&output),
            Err(e) => {
                warn!(error = %e, "title generation failed, returning empty summary");
                String::new()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Normalize raw completion output into a single title line.
///
/// Keeps only the text after the last case-insensitive `issue title:` marker
/// (models sometimes echo the few-shot format), takes the first line, and
/// uppercases the first character.
pub fn extract_title(output: &str) -> String {
    let lower = output.to_ascii_lowercase();
    let rest = match lower.rfind("issue title:") {
        Some(pos) => &output[pos + "issue title:".len()..],
        None => output,
    };

    let first_line = rest.trim().lines().next().unwrap_or("").trim();
    capitalize_first(first_line)
}

/// Uppercase the first character of a string, leaving the rest untouched.
fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use issuebot_llm::LlmError;

    struct ScriptedProvider(Option<String>);

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(
            &self,
            _prompt: &str,
            _options: &SamplingOptions,
        ) -> issuebot_llm::Result<String> {
            match &self.0 {
                Some(output) => Ok(output.clone()),
                None => Err(LlmError::RequestFailed {
                    reason: "scripted failure".into(),
                }),
            }
        }
    }

    #[test]
    fn prompt_demands_short_titles() {
        assert!(TITLE_PROMPT_PREFIX.contains("under 12 words"));
        assert!(title_prompt("fix the thing").ends_with("Issue Title:"));
    }

    #[test]
    fn extract_takes_first_line() {
        let title = extract_title(" fix broken login form\nUser: something else");
        assert_eq!(title, "Fix broken login form");
    }

    #[test]
    fn extract_strips_last_marker() {
        let output = "Issue Title: first try\nIssue Title: grafana log monitoring issue";
        assert_eq!(extract_title(output), "Grafana log monitoring issue");
    }

    #[test]
    fn extract_marker_is_case_insensitive() {
        assert_eq!(
            extract_title("ISSUE TITLE: resolve api timeout"),
            "Resolve api timeout"
        );
    }

    #[test]
    fn extract_capitalizes_first_character() {
        assert_eq!(extract_title("upgrade dependencies"), "Upgrade dependencies");
    }

    #[test]
    fn extract_empty_output_yields_empty_title() {
        assert_eq!(extract_title(""), "");
        assert_eq!(extract_title("   \n  "), "");
    }

    #[tokio::test]
    async fn generate_is_stable_under_a_deterministic_provider() {
        let generator = TitleGenerator::new(Arc::new(ScriptedProvider(Some(
            " fix broken login form on mobile".into(),
        ))));

        let first = generator.generate("fix the broken login form").await;
        let second = generator.generate("fix the broken login form").await;

        assert_eq!(first, second);
        assert_eq!(first, "Fix broken login form on mobile");
        assert!(!first.is_empty());
        assert!(first.split_whitespace().count() <= 12);
    }

    #[tokio::test]
    async fn generate_swallows_provider_failure() {
        let generator = TitleGenerator::new(Arc::new(ScriptedProvider(None)));
        assert_eq!(generator.generate("fix the login form").await, "");
    }
}
