//! Remote tool session traits and supporting types.
//!
//! The action router depends only on these seams, never on a concrete
//! transport.  A [`ToolEndpoint`] opens short-lived [`ToolSession`]s; each
//! session is a request/response channel exposing named, argument-taking
//! remote operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// A named operation exposed by the remote tool service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteTool {
    /// Machine-readable tool name (e.g. `jira_create_issue`).
    pub name: String,
    /// Human-readable description of what the tool does.
    #[serde(default)]
    pub description: String,
}

/// A live session with the remote tool service.
///
/// Sessions are opened per invocation and torn down with [`close`] regardless
/// of outcome -- there is no persistent connection pooling at this layer.
///
/// [`close`]: ToolSession::close
#[async_trait]
pub trait ToolSession: Send {
    /// List the operations the service exposes.
    async fn list_tools(&mut self) -> Result<Vec<RemoteTool>>;

    /// Invoke a named tool with a JSON argument map.
    async fn call_tool(&mut self, name: &str, args: Value) -> Result<Value>;

    /// Tear the session down.
    async fn close(&mut self) -> Result<()>;
}

/// Something that can open tool sessions.
#[async_trait]
pub trait ToolEndpoint: Send + Sync {
    /// Open and initialize a fresh session.
    async fn open(&self) -> Result<Box<dyn ToolSession>>;
}
