//! Action routing -- resolves a classified intent into one remote tool call.
//!
//! The router is the containment boundary for faults: every path terminates
//! in an [`ActionResult`], and nothing above it ever observes a raw error
//! from the tool session or the title generator.  Each turn makes at most
//! one remote tool invocation, inside a session that is opened and torn down
//! around the call.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use issuebot_intent::{Intent, TitleGenerator, extract_issue_key};

use crate::error::{AdapterError, Result};
use crate::traits::ToolEndpoint;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default deadline for a single remote tool call in seconds.
const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;

/// Default project key for drafted issues.
const DEFAULT_PROJECT_KEY: &str = "AIDEVOPS";

/// Default issue type for drafted issues.
const DEFAULT_ISSUE_TYPE: &str = "Task";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The terminal outcome of routing one turn.
#[derive(Debug, Clone)]
pub enum ActionResult {
    /// The remote call completed; carries its JSON payload.
    Success(Value),
    /// The turn failed; carries a human-readable message.
    Error(String),
}

impl ActionResult {
    /// Whether this result is a success.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// The payload sent to `jira_create_issue`.
#[derive(Debug, Clone, Serialize)]
pub struct IssueDraft {
    /// Project the issue is filed under.
    pub project_key: String,
    /// Issue type (e.g. `Task`).
    pub issue_type: String,
    /// Generated one-line summary.
    pub summary: String,
    /// The verbatim user request.
    pub description: String,
}

/// Router configuration.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Project key for drafted issues.
    pub project_key: String,
    /// Issue type for drafted issues.
    pub issue_type: String,
    /// Deadline for a single remote tool call in seconds.
    pub call_timeout_secs: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            project_key: DEFAULT_PROJECT_KEY.to_string(),
            issue_type: DEFAULT_ISSUE_TYPE.to_string(),
            call_timeout_secs: DEFAULT_CALL_TIMEOUT_SECS,
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Resolves intents to remote tool invocations.
pub struct ActionRouter {
    endpoint: Arc<dyn ToolEndpoint>,
    titles: TitleGenerator,
    config: RouterConfig,
}

impl ActionRouter {
    /// Create a router over the given tool endpoint.
    pub fn new(endpoint: Arc<dyn ToolEndpoint>, titles: TitleGenerator, config: RouterConfig) -> Self {
        Self {
            endpoint,
            titles,
            config,
        }
    }

    /// Route one turn.
    ///
    /// Never returns a raw error: every fault is converted into
    /// [`ActionResult::Error`] with a readable message.
    pub async fn route(&self, intent: Intent, text: &str) -> ActionResult {
        match intent {
            Intent::CreateIssue => self.create_issue(text).await,
            Intent::GetIssue => self.get_issue(text).await,
            Intent::Unknown => {
                ActionResult::Error(format!("intent '{intent}' not recognized"))
            }
        }
    }

    /// Draft and file a new issue.
    async fn create_issue(&self, text: &str) -> ActionResult {
        let summary = self.titles.generate(text).await;
        info!(summary = %summary, "drafting new issue");

        let draft = IssueDraft {
            project_key: self.config.project_key.clone(),
            issue_type: self.config.issue_type.clone(),
            summary,
            description: text.to_string(),
        };

        let args = match serde_json::to_value(&draft) {
            Ok(args) => args,
            Err(e) => return ActionResult::Error(format!("failed to encode issue draft: {e}")),
        };

        self.dispatch("jira_create_issue", args).await
    }

    /// Look up an existing issue by the key embedded in the request.
    async fn get_issue(&self, text: &str) -> ActionResult {
        let Some(key) = extract_issue_key(text) else {
            return ActionResult::Error("no valid issue key found in your message".into());
        };

        info!(key = %key, "fetching issue");
        self.dispatch("jira_get_issue", json!({ "issue_key": key.to_string() }))
            .await
    }

    /// Make the single remote call for this turn, containing all faults.
    async fn dispatch(&self, tool: &str, args: Value) -> ActionResult {
        match self.call_remote(tool, args).await {
            Ok(payload) => ActionResult::Success(payload),
            Err(e) => {
                warn!(tool = tool, error = %e, "remote tool call failed");
                ActionResult::Error(e.to_string())
            }
        }
    }

    /// Open a session, invoke the tool under the configured deadline, and
    /// tear the session down regardless of outcome.
    async fn call_remote(&self, tool: &str, args: Value) -> Result<Value> {
        let deadline = Duration::from_secs(self.config.call_timeout_secs);
        let mut session = self.endpoint.open().await?;

        let outcome = match tokio::time::timeout(deadline, session.call_tool(tool, args)).await {
            Ok(result) => result,
            Err(_) => Err(AdapterError::Timeout {
                seconds: self.config.call_timeout_secs,
                reason: format!("tool call `{tool}` exceeded deadline"),
            }),
        };

        // Teardown faults are logged but never override the call outcome.
        if let Err(e) = session.close().await {
            warn!(error = %e, "session teardown failed");
        }

        outcome
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use issuebot_llm::{CompletionProvider, SamplingOptions};

    use crate::traits::{RemoteTool, ToolSession};

    // -- Fakes ---------------------------------------------------------------

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
                None => Err(issuebot_llm::LlmError::RequestFailed {
                    reason: "scripted failure".into(),
                }),
            }
        }
    }

    #[derive(Clone, Copy)]
    enum CallBehavior {
        Succeed,
        Fail,
        Hang,
        SucceedButFailClose,
    }

    #[derive(Default)]
    struct CallLog {
        calls: Mutex<Vec<(String, Value)>>,
        opens: AtomicUsize,
        closes: AtomicUsize,
    }

    struct FakeEndpoint {
        log: Arc<CallLog>,
        behavior: CallBehavior,
    }

    struct FakeSession {
        log: Arc<CallLog>,
        behavior: CallBehavior,
    }

    #[async_trait]
    impl ToolEndpoint for FakeEndpoint {
        async fn open(&self) -> Result<Box<dyn ToolSession>> {
            self.log.opens.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeSession {
                log: self.log.clone(),
                behavior: self.behavior,
            }))
        }
    }

    #[async_trait]
    impl ToolSession for FakeSession {
        async fn list_tools(&mut self) -> Result<Vec<RemoteTool>> {
            Ok(Vec::new())
        }

        async fn call_tool(&mut self, name: &str, args: Value) -> Result<Value> {
            self.log
                .calls
                .lock()
                .unwrap()
                .push((name.to_string(), args));
            match self.behavior {
                CallBehavior::Succeed | CallBehavior::SucceedButFailClose => {
                    Ok(json!({ "ok": true }))
                }
                CallBehavior::Fail => Err(AdapterError::Rpc {
                    code: -32000,
                    message: "backend unavailable".into(),
                }),
                CallBehavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(json!({ "ok": true }))
                }
            }
        }

        async fn close(&mut self) -> Result<()> {
            self.log.closes.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                CallBehavior::SucceedButFailClose => Err(AdapterError::RequestFailed {
                    reason: "connection already gone".into(),
                }),
                _ => Ok(()),
            }
        }
    }

    fn router(behavior: CallBehavior, title_output: Option<&str>) -> (ActionRouter, Arc<CallLog>) {
        let log = Arc::new(CallLog::default());
        let endpoint = Arc::new(FakeEndpoint {
            log: log.clone(),
            behavior,
        });
        let titles = TitleGenerator::new(Arc::new(ScriptedProvider(
            title_output.map(String::from),
        )));
        let router = ActionRouter::new(endpoint, titles, RouterConfig::default());
        (router, log)
    }

    // -- Tests ---------------------------------------------------------------

    #[tokio::test]
    async fn get_issue_extracts_key_and_calls_once() {
        let (router, log) = router(CallBehavior::Succeed, None);
        let result = router.route(Intent::GetIssue, "check DEVOPS-102 status").await;

        assert!(result.is_success());
        let calls = log.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "jira_get_issue");
        assert_eq!(calls[0].1, json!({ "issue_key": "DEVOPS-102" }));
    }

    #[tokio::test]
    async fn get_issue_without_key_makes_no_remote_call() {
        let (router, log) = router(CallBehavior::Succeed, None);
        let result = router.route(Intent::GetIssue, "check the login issue").await;

        let ActionResult::Error(message) = result else {
            panic!("expected an error result");
        };
        assert!(message.contains("no valid issue key"));
        assert_eq!(log.calls.lock().unwrap().len(), 0);
        assert_eq!(log.opens.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_intent_makes_no_remote_call() {
        let (router, log) = router(CallBehavior::Succeed, None);
        let result = router.route(Intent::Unknown, "hello there").await;

        let ActionResult::Error(message) = result else {
            panic!("expected an error result");
        };
        assert!(message.contains("not recognized"));
        assert_eq!(log.opens.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn create_issue_sends_draft_with_verbatim_description() {
        let (router, log) = router(
            CallBehavior::Succeed,
            Some(" fix broken login form on mobile"),
        );
        let text = "fix the broken login form";
        let result = router.route(Intent::CreateIssue, text).await;

        assert!(result.is_success());
        let calls = log.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "jira_create_issue");
        assert_eq!(calls[0].1["project_key"], "AIDEVOPS");
        assert_eq!(calls[0].1["issue_type"], "Task");
        assert_eq!(calls[0].1["description"], text);
        let summary = calls[0].1["summary"].as_str().unwrap();
        assert!(!summary.is_empty());
    }

    #[tokio::test]
    async fn remote_fault_becomes_error_after_one_attempt() {
        let (router, log) = router(CallBehavior::Fail, None);
        let result = router.route(Intent::GetIssue, "show OPS-7").await;

        let ActionResult::Error(message) = result else {
            panic!("expected an error result");
        };
        assert!(message.contains("backend unavailable"));
        assert_eq!(log.calls.lock().unwrap().len(), 1);
        // The session is still torn down on failure.
        assert_eq!(log.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn call_deadline_is_enforced() {
        let log = Arc::new(CallLog::default());
        let endpoint = Arc::new(FakeEndpoint {
            log: log.clone(),
            behavior: CallBehavior::Hang,
        });
        let titles = TitleGenerator::new(Arc::new(ScriptedProvider(None)));
        let config = RouterConfig {
            call_timeout_secs: 1,
            ..RouterConfig::default()
        };
        let router = ActionRouter::new(endpoint, titles, config);

        let result = router.route(Intent::GetIssue, "show OPS-7").await;

        let ActionResult::Error(message) = result else {
            panic!("expected an error result");
        };
        assert!(message.contains("timeout"));
        assert_eq!(log.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn teardown_fault_does_not_override_success() {
        let (router, log) = router(CallBehavior::SucceedButFailClose, None);
        let result = router.route(Intent::GetIssue, "show OPS-7").await;

        assert!(result.is_success());
        assert_eq!(log.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn config_defaults() {
        let config = RouterConfig::default();
        assert_eq!(config.project_key, "AIDEVOPS");
        assert_eq!(config.issue_type, "Task");
        assert_eq!(config.call_timeout_secs, 30);
    }
}
