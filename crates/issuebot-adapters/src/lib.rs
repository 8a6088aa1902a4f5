//! Remote tool dispatch for issuebot.
//!
//! This crate owns the outbound side of a turn: the [`ToolSession`] seam to
//! the issue-tracker tool service, a streamable-HTTP implementation of it,
//! and the [`ActionRouter`] that resolves a classified intent into exactly
//! zero or one remote tool invocation.
//!
//! ## Modules
//!
//! - [`traits`] -- `ToolEndpoint` / `ToolSession` seam traits.
//! - [`session`] -- Streamable-HTTP JSON-RPC session client.
//! - [`router`] -- Intent-to-action routing with contained failures.
//! - [`error`] -- Adapter error types.

pub mod error;
pub mod router;
pub mod session;
pub mod traits;

pub use error::{AdapterError, Result};
pub use router::{ActionResult, ActionRouter, IssueDraft, RouterConfig};
pub use session::HttpToolEndpoint;
pub use traits::{RemoteTool, ToolEndpoint, ToolSession};
