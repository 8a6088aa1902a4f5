//! Subcommands: interactive chat, one-shot requests, and status.
//!
//! Each user turn runs the same pipeline: classify the request, route the
//! intent, render the result.  The chat loop keeps an in-memory turn log for
//! the `history` builtin; nothing is persisted across runs.

use std::io::{self, BufRead, Write as _};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tracing::info;

use issuebot_adapters::{
    ActionResult, ActionRouter, HttpToolEndpoint, RouterConfig, ToolEndpoint,
};
use issuebot_intent::{Intent, IntentClassifier, TitleGenerator};
use issuebot_llm::{CompletionClient, CompletionClientConfig};

use crate::config::AppConfig;

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// The assembled per-process pipeline: one classifier, one router, sharing a
/// single completion provider instance.
struct Assistant {
    classifier: IntentClassifier,
    router: ActionRouter,
}

/// Build the pipeline from configuration.
fn build_assistant(config: &AppConfig) -> Result<Assistant> {
    let mut llm_config =
        CompletionClientConfig::openai_compatible(&config.llm.model, &config.llm.base_url);
    llm_config.request_timeout_secs = config.llm.request_timeout_secs;
    if !config.llm.api_key.is_empty() {
        llm_config = llm_config.with_api_key(&config.llm.api_key);
    }

    let provider = Arc::new(
        CompletionClient::new(llm_config).context("failed to create completion client")?,
    );
    info!(model = %config.llm.model, base_url = %config.llm.base_url, "completion client ready");

    let endpoint = Arc::new(
        HttpToolEndpoint::new(&config.tracker.mcp_url).context("invalid tool endpoint url")?,
    );
    info!(url = %config.tracker.mcp_url, "tool endpoint configured");

    let router = ActionRouter::new(
        endpoint,
        TitleGenerator::new(provider.clone()),
        RouterConfig {
            project_key: config.tracker.project_key.clone(),
            issue_type: config.tracker.issue_type.clone(),
            call_timeout_secs: config.tracker.call_timeout_secs,
        },
    );

    Ok(Assistant {
        classifier: IntentClassifier::new(provider),
        router,
    })
}

/// Run one turn through the pipeline.
async fn run_turn(assistant: &Assistant, text: &str) -> (Intent, ActionResult) {
    let intent = assistant.classifier.classify(text).await;
    info!(%intent, "request classified");
    let result = assistant.router.route(intent, text).await;
    (intent, result)
}

/// Render an action result for the terminal.
fn render_result(result: &ActionResult) -> String {
    match result {
        ActionResult::Success(payload) => {
            serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string())
        }
        ActionResult::Error(message) => format!("Error: {message}"),
    }
}

// ---------------------------------------------------------------------------
// Subcommand: chat
// ---------------------------------------------------------------------------

/// One completed turn, kept for the `history` builtin.
struct Turn {
    at: DateTime<Local>,
    request: String,
    intent: Intent,
    outcome: String,
}

/// Run the interactive chat loop.
pub async fn cmd_chat(config: AppConfig) -> Result<()> {
    let assistant = build_assistant(&config)?;

    println!("Welcome to the issuebot assistant!");
    println!("Example: create a task to fix the login bug");
    println!("Type 'history' to review this session, 'exit' to quit.");

    let stdin = io::stdin();
    let mut turns: Vec<Turn> = Vec::new();

    loop {
        print!("\nYour request: ");
        io::stdout().flush().ok();

        let Some(line) = stdin.lock().lines().next() else {
            break;
        };
        let line = line.context("failed to read from stdin")?;
        let text = line.trim();

        match text {
            "" => continue,
            "exit" | "quit" => break,
            "history" => {
                print_history(&turns);
                continue;
            }
            _ => {}
        }

        let (intent, result) = run_turn(&assistant, text).await;
        println!("{}", render_result(&result));

        let outcome = match &result {
            ActionResult::Success(_) => "ok".to_string(),
            ActionResult::Error(message) => format!("error: {message}"),
        };
        turns.push(Turn {
            at: Local::now(),
            request: text.to_string(),
            intent,
            outcome,
        });
    }

    println!("Goodbye.");
    Ok(())
}

/// Print the session turn log.
fn print_history(turns: &[Turn]) {
    if turns.is_empty() {
        println!("No turns yet.");
        return;
    }
    for turn in turns {
        println!(
            "[{}] ({}) {} -> {}",
            turn.at.format("%H:%M:%S"),
            turn.intent,
            turn.request,
            turn.outcome
        );
    }
}

// ---------------------------------------------------------------------------
// Subcommand: ask
// ---------------------------------------------------------------------------

/// Classify and dispatch a single request, then exit.
///
/// Exits with status 1 when the turn ends in an error result.
pub async fn cmd_ask(config: AppConfig, request: String) -> Result<()> {
    let request = request.trim().to_string();
    if request.is_empty() {
        println!("Error: empty request");
        std::process::exit(1);
    }

    let assistant = build_assistant(&config)?;
    let (intent, result) = run_turn(&assistant, &request).await;

    println!("Intent: {intent}");
    println!("{}", render_result(&result));

    if !result.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand: status
// ---------------------------------------------------------------------------

/// Connect to the tool service and list what it exposes.
pub async fn cmd_status(config: AppConfig) -> Result<()> {
    let endpoint =
        HttpToolEndpoint::new(&config.tracker.mcp_url).context("invalid tool endpoint url")?;

    let mut session = match endpoint.open().await {
        Ok(session) => session,
        Err(e) => {
            println!("Error: cannot reach {}: {e}", config.tracker.mcp_url);
            std::process::exit(1);
        }
    };

    match session.list_tools().await {
        Ok(tools) if tools.is_empty() => println!("The service exposes no tools."),
        Ok(tools) => {
            println!("Tools exposed by {}:", config.tracker.mcp_url);
            for tool in tools {
                if tool.description.is_empty() {
                    println!("  - {}", tool.name);
                } else {
                    println!("  - {}: {}", tool.name, tool.description);
                }
            }
        }
        Err(e) => {
            println!("Error: tool listing failed: {e}");
            std::process::exit(1);
        }
    }

    if let Err(e) = session.close().await {
        info!(error = %e, "session teardown failed");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn render_success_pretty_prints_json() {
        let rendered = render_result(&ActionResult::Success(json!({ "key": "DEVOPS-1" })));
        assert!(rendered.contains("\"key\": \"DEVOPS-1\""));
    }

    #[test]
    fn render_error_is_prefixed() {
        let rendered = render_result(&ActionResult::Error("boom".into()));
        assert_eq!(rendered, "Error: boom");
    }

    #[test]
    fn assistant_builds_from_default_config() {
        assert!(build_assistant(&AppConfig::default()).is_ok());
    }
}
