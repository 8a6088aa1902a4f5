//! Streamable-HTTP tool session client.
//!
//! Speaks JSON-RPC 2.0 over a single HTTP endpoint, following the MCP
//! streamable-HTTP transport: every request is a POST, the server assigns a
//! session id via the `Mcp-Session-Id` header during `initialize`, responses
//! arrive either as plain JSON or as a `text/event-stream` body carrying
//! `data:` frames, and teardown is an HTTP DELETE.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::Url;

use crate::error::{AdapterError, Result};
use crate::traits::{RemoteTool, ToolEndpoint, ToolSession};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Protocol revision sent during `initialize`.
const PROTOCOL_VERSION: &str = "2025-03-26";

/// Default per-request deadline in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Session id header name.
const SESSION_ID_HEADER: &str = "Mcp-Session-Id";

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// A streamable-HTTP tool endpoint (e.g. `http://localhost:9000/mcp`).
///
/// Opening the endpoint performs the `initialize` handshake and the
/// `notifications/initialized` follow-up, yielding a session ready for tool
/// calls.
pub struct HttpToolEndpoint {
    url: Url,
    http: reqwest::Client,
    request_timeout_secs: u64,
}

impl HttpToolEndpoint {
    /// Create an endpoint with the default per-request deadline.
    pub fn new(url: &str) -> Result<Self> {
        Self::with_timeout(url, DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    /// Create an endpoint with an explicit per-request deadline.
    pub fn with_timeout(url: &str, request_timeout_secs: u64) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| AdapterError::ConfigError {
            reason: format!("invalid tool endpoint url `{url}`: {e}"),
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(request_timeout_secs))
            .build()
            .map_err(|e| AdapterError::RequestFailed {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            url,
            http,
            request_timeout_secs,
        })
    }
}

#[async_trait]
impl ToolEndpoint for HttpToolEndpoint {
    async fn open(&self) -> Result<Box<dyn ToolSession>> {
        let mut session = HttpToolSession {
            url: self.url.clone(),
            http: self.http.clone(),
            request_timeout_secs: self.request_timeout_secs,
            session_id: None,
            next_id: 1,
        };
        session.initialize().await?;
        Ok(Box::new(session))
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A live streamable-HTTP session.
pub struct HttpToolSession {
    url: Url,
    http: reqwest::Client,
    request_timeout_secs: u64,
    /// Server-assigned session id, captured from the `initialize` response.
    session_id: Option<String>,
    /// Next JSON-RPC request id.
    next_id: u64,
}

impl HttpToolSession {
    /// Perform the `initialize` handshake.
    async fn initialize(&mut self) -> Result<()> {
        let result = self
            .request(
                "initialize",
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": "issuebot",
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                }),
            )
            .await?;

        let server = result
            .pointer("/serverInfo/name")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        debug!(server = server, "tool session initialized");

        // The server contract requires this notification before tool calls.
        self.notify("notifications/initialized").await
    }

    /// Send a JSON-RPC request and return its `result`.
    async fn request(&mut self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;

        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let mut req = self
            .http
            .post(self.url.clone())
            .header(ACCEPT, "application/json, text/event-stream")
            .json(&body);
        if let Some(sid) = &self.session_id {
            req = req.header(SESSION_ID_HEADER, sid);
        }

        let response = req
            .send()
            .await
            .map_err(|e| map_transport_error(method, self.request_timeout_secs, e))?;

        if let Some(sid) = response
            .headers()
            .get(SESSION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            self.session_id = Some(sid.to_string());
        }

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let text = response
            .text()
            .await
            .map_err(|e| AdapterError::RequestFailed {
                reason: format!("failed to read response body: {e}"),
            })?;

        if !status.is_success() {
            return Err(AdapterError::RequestFailed {
                reason: format!("`{method}` returned {status}: {text}"),
            });
        }

        let payload = parse_rpc_payload(content_type.as_deref(), &text)?;

        if let Some(err) = payload.get("error") {
            return Err(AdapterError::Rpc {
                code: err.get("code").and_then(Value::as_i64).unwrap_or(0),
                message: err
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown remote error")
                    .to_string(),
            });
        }

        payload
            .get("result")
            .cloned()
            .ok_or_else(|| AdapterError::InvalidResponse {
                reason: format!("`{method}` response carried no result"),
            })
    }

    /// Send a JSON-RPC notification (no id, no response body expected).
    async fn notify(&self, method: &str) -> Result<()> {
        let body = json!({ "jsonrpc": "2.0", "method": method });

        let mut req = self
            .http
            .post(self.url.clone())
            .header(ACCEPT, "application/json, text/event-stream")
            .json(&body);
        if let Some(sid) = &self.session_id {
            req = req.header(SESSION_ID_HEADER, sid);
        }

        let response = req
            .send()
            .await
            .map_err(|e| map_transport_error(method, self.request_timeout_secs, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::RequestFailed {
                reason: format!("`{method}` returned {status}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ToolSession for HttpToolSession {
    async fn list_tools(&mut self) -> Result<Vec<RemoteTool>> {
        let result = self.request("tools/list", json!({})).await?;
        let tools = result.get("tools").cloned().unwrap_or_else(|| json!([]));
        serde_json::from_value(tools).map_err(Into::into)
    }

    async fn call_tool(&mut self, name: &str, args: Value) -> Result<Value> {
        let result = self
            .request("tools/call", json!({ "name": name, "arguments": args }))
            .await?;

        // Tool-level failures come back as a successful RPC with isError set.
        if result
            .get("isError")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            return Err(AdapterError::ToolCallFailed {
                tool_name: name.to_string(),
                reason: render_tool_content(&result),
            });
        }

        Ok(result)
    }

    async fn close(&mut self) -> Result<()> {
        let Some(sid) = self.session_id.take() else {
            return Ok(());
        };

        let response = self
            .http
            .delete(self.url.clone())
            .header(SESSION_ID_HEADER, &sid)
            .send()
            .await
            .map_err(|e| map_transport_error("close", self.request_timeout_secs, e))?;

        // Servers that do not track sessions answer 404/405 here; the session
        // is gone either way.
        debug!(status = %response.status(), "tool session closed");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a reqwest failure to a typed adapter error.
fn map_transport_error(method: &str, timeout_secs: u64, err: reqwest::Error) -> AdapterError {
    if err.is_timeout() {
        AdapterError::Timeout {
            seconds: timeout_secs,
            reason: format!("`{method}` request timed out: {err}"),
        }
    } else {
        AdapterError::RequestFailed {
            reason: format!("`{method}` request failed: {err}"),
        }
    }
}

/// Extract the JSON-RPC message from a response body.
///
/// Streamable-HTTP servers answer either with a plain JSON body or with an
/// event stream whose `data:` frames each carry one JSON-RPC message; the
/// response to the request is the last frame holding a `result` or `error`.
fn parse_rpc_payload(content_type: Option<&str>, body: &str) -> Result<Value> {
    let is_event_stream = content_type.is_some_and(|ct| ct.contains("text/event-stream"));

    if !is_event_stream {
        return serde_json::from_str(body).map_err(|e| AdapterError::InvalidResponse {
            reason: format!("invalid JSON body: {e}"),
        });
    }

    let mut response = None;
    let mut data = String::new();
    for line in body.lines().chain(std::iter::once("")) {
        if let Some(rest) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(rest.trim_start());
        } else if line.is_empty() && !data.is_empty() {
            match serde_json::from_str::<Value>(&data) {
                Ok(message)
                    if message.get("result").is_some() || message.get("error").is_some() =>
                {
                    response = Some(message);
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "skipping unparseable event-stream frame"),
            }
            data.clear();
        }
    }

    response.ok_or_else(|| AdapterError::InvalidResponse {
        reason: "event stream carried no response message".into(),
    })
}

/// Flatten a tool result's content blocks into a readable failure reason.
fn render_tool_content(result: &Value) -> String {
    let Some(blocks) = result.get("content").and_then(Value::as_array) else {
        return "tool reported an error with no content".into();
    };

    let texts: Vec<&str> = blocks
        .iter()
        .filter_map(|b| b.get("text").and_then(Value::as_str))
        .collect();

    if texts.is_empty() {
        "tool reported an error with no content".into()
    } else {
        texts.join("\n")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_json_body_parses() {
        let payload = parse_rpc_payload(
            Some("application/json"),
            r#"{"jsonrpc":"2.0","id":1,"result":{"ok":true}}"#,
        )
        .unwrap();
        assert_eq!(payload["result"]["ok"], true);
    }

    #[test]
    fn event_stream_takes_last_response_frame() {
        let body = "event: message\ndata: {\"jsonrpc\":\"2.0\",\"method\":\"notifications/progress\"}\n\n\
                    event: message\ndata: {\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{\"ok\":true}}\n\n";
        let payload = parse_rpc_payload(Some("text/event-stream"), body).unwrap();
        assert_eq!(payload["result"]["ok"], true);
    }

    #[test]
    fn event_stream_joins_multiline_data_frames() {
        let body = "data: {\"jsonrpc\":\"2.0\",\"id\":1,\ndata: \"result\":{\"ok\":true}}\n\n";
        let payload = parse_rpc_payload(Some("text/event-stream"), body).unwrap();
        assert_eq!(payload["result"]["ok"], true);
    }

    #[test]
    fn event_stream_without_response_is_an_error() {
        let body = "data: {\"jsonrpc\":\"2.0\",\"method\":\"notifications/progress\"}\n\n";
        let result = parse_rpc_payload(Some("text/event-stream"), body);
        assert!(matches!(result, Err(AdapterError::InvalidResponse { .. })));
    }

    #[test]
    fn invalid_json_body_is_an_error() {
        let result = parse_rpc_payload(Some("application/json"), "not json");
        assert!(matches!(result, Err(AdapterError::InvalidResponse { .. })));
    }

    #[test]
    fn invalid_endpoint_url_rejected() {
        assert!(matches!(
            HttpToolEndpoint::new("not a url"),
            Err(AdapterError::ConfigError { .. })
        ));
    }

    #[test]
    fn tool_content_rendering() {
        let result = json!({
            "isError": true,
            "content": [
                {"type": "text", "text": "first line"},
                {"type": "text", "text": "second line"},
            ],
        });
        assert_eq!(render_tool_content(&result), "first line\nsecond line");

        let empty = json!({ "isError": true });
        assert_eq!(
            render_tool_content(&empty),
            "tool reported an error with no content"
        );
    }
}
