//! Intent classification -- decides which tracker operation the user wants.
//!
//! The classifier uses a two-tier approach:
//!
//! 1. **Model tier**: A fixed few-shot prompt is completed deterministically
//!    and the answer is read off the last `Intent:` line of the output.
//! 2. **Keyword tier**: Falls back to substring matching on the raw request
//!    when the model output yields nothing usable.
//!
//! Small instruction-following models are unreliable at strict output
//! formatting, so the failure mode is bounded to [`Intent::Unknown`] rather
//! than a wrong structured call.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use issuebot_llm::{CompletionProvider, SamplingOptions};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The classified category of a user request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// The user wants a new tracker issue created.
    CreateIssue,
    /// The user wants an existing issue looked up.
    GetIssue,
    /// Neither tier could resolve the request.
    Unknown,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreateIssue => write!(f, "create issue"),
            Self::GetIssue => write!(f, "get issue"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// The tier that produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifySource {
    /// Resolved from the model's completion output.
    Model,
    /// Resolved by keyword fallback on the raw request.
    Keyword,
    /// Neither tier resolved; the intent is [`Intent::Unknown`].
    Unresolved,
}

/// A classification plus the diagnostic trace behind it.
///
/// The trace fields exist for observability only; control flow depends
/// solely on `intent`.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationResult {
    /// The resolved intent.
    pub intent: Intent,
    /// Raw model output, when the completion call succeeded.
    pub raw_output: Option<String>,
    /// The `Intent:` line the model tier matched, if any.
    pub matched_line: Option<String>,
    /// Which tier produced the result.
    pub source: ClassifySource,
}

/// Outcome of a single resolution tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The tier produced a definite intent.
    Resolved(Intent),
    /// The tier yielded nothing usable; try the next one.
    Unresolved,
}

// ---------------------------------------------------------------------------
// Classification prompt
// ---------------------------------------------------------------------------

/// Output-length cap for the classification completion.
const CLASSIFY_MAX_TOKENS: u32 = 20;

const CLASSIFY_PROMPT_PREFIX: &str = "\
You are a Jira assistant. Classify the user's intent.
Return exactly one of: Create Issue, Get Issue, or unknown.

Example 1:
User: Create a bug for the login crash
Intent: Create Issue

Example 2:
User: Open a ticket to add monitoring to the server
Intent: Create Issue

Example 3:
User: File a task for setting up Grafana dashboards
Intent: Create Issue

Example 4:
User: Get all issues related to Grafana
Intent: Get Issue

Example 5:
User: Fetch status of DEVOPS-102
Intent: Get Issue

Example 6:
User: Check the ticket for broken signup
Intent: Get Issue

";

/// Keywords that resolve to [`Intent::GetIssue`] in the fallback tier.
const GET_KEYWORDS: &[&str] = &["get", "fetch", "check", "view", "see", "show"];

/// Keywords that resolve to [`Intent::CreateIssue`] in the fallback tier.
const CREATE_KEYWORDS: &[&str] = &["create", "file", "open", "add", "submit"];

/// Build the live classification prompt for a request.
fn classification_prompt(text: &str) -> String {
    format!("{CLASSIFY_PROMPT_PREFIX}User: {text}\nIntent:")
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// The intent classifier.
///
/// Holds a reference to an injected completion provider; one deterministic
/// completion call is made per classification, with no retries.
pub struct IntentClassifier {
    provider: Arc<dyn CompletionProvider>,
}

impl IntentClassifier {
    /// Create a classifier backed by the given completion provider.
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Classify a request into one of the closed set of intents.
    ///
    /// Never fails: provider faults and unparseable output both degrade to
    /// the keyword tier, and an unresolvable request yields
    /// [`Intent::Unknown`].
    pub async fn classify(&self, text: &str) -> Intent {
        self.classify_detailed(text).await.intent
    }

    /// Classify a request, retaining the diagnostic trace.
    pub async fn classify_detailed(&self, text: &str) -> ClassificationResult {
        let prompt = classification_prompt(text);

        let raw_output = match self
            .provider
            .complete(&prompt, &SamplingOptions::greedy(CLASSIFY_MAX_TOKENS))
            .await
        {
            Ok(output) => Some(output),
            Err(e) => {
                warn!(error = %e, "classification completion failed, using keyword fallback");
                None
            }
        };

        // Tier 1: read the answer off the model output.  The scan runs over
        // the prompt and continuation joined, so the trailing `Intent:` the
        // prompt ends with forms one line with the model's answer.
        let mut matched_line = None;
        if let Some(output) = &raw_output {
            let decoded = format!("{prompt}{output}");
            let (resolution, line) = resolve_model_output(&decoded);
            matched_line = line;
            if let Resolution::Resolved(intent) = resolution {
                debug!(%intent, "intent resolved from model output");
                return ClassificationResult {
                    intent,
                    raw_output,
                    matched_line,
                    source: ClassifySource::Model,
                };
            }
        }

        // Tier 2: keyword fallback on the raw request.
        match resolve_keywords(text) {
            Resolution::Resolved(intent) => {
                debug!(%intent, "intent resolved by keyword fallback");
                ClassificationResult {
                    intent,
                    raw_output,
                    matched_line,
                    source: ClassifySource::Keyword,
                }
            }
            Resolution::Unresolved => ClassificationResult {
                intent: Intent::Unknown,
                raw_output,
                matched_line,
                source: ClassifySource::Unresolved,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution tiers
// ---------------------------------------------------------------------------

/// Resolve an intent from raw model output.
///
/// Scans the output from the end backward for the first line carrying an
/// `intent:` marker.  Few-shot prompts echo the markers of the embedded
/// examples, and only the trailing one reflects the answer to the live
/// query.  Returns the matched line alongside the resolution for
/// diagnostics.
pub fn resolve_model_output(output: &str) -> (Resolution, Option<String>) {
    for line in output.lines().rev() {
        let Some(label) = label_after_marker(line) else {
            continue;
        };

        let label = label.to_lowercase();
        let resolution = if label.contains("create") {
            Resolution::Resolved(Intent::CreateIssue)
        } else if label.contains("get") {
            Resolution::Resolved(Intent::GetIssue)
        } else {
            Resolution::Unresolved
        };
        return (resolution, Some(line.to_string()));
    }

    (Resolution::Unresolved, None)
}

/// Resolve an intent by keyword membership on the raw request text.
pub fn resolve_keywords(text: &str) -> Resolution {
    let lower = text.to_lowercase();

    if GET_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Resolution::Resolved(Intent::GetIssue)
    } else if CREATE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Resolution::Resolved(Intent::CreateIssue)
    } else {
        Resolution::Unresolved
    }
}

/// Return the text after a case-insensitive `intent:` marker on a line.
fn label_after_marker(line: &str) -> Option<&str> {
    let pos = line.to_ascii_lowercase().find("intent:")?;
    Some(line[pos + "intent:".len()..].trim())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
