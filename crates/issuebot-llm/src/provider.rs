//! The completion provider seam.
//!
//! The classifier and title generator depend only on this trait, never on a
//! concrete endpoint client.  A provider instance is created once at process
//! start and handed to each consumer by reference -- there is no ambient
//! global model state.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::SamplingOptions;

/// An opaque text-completion capability: prompt in, continuation out.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate a continuation of `prompt` under the given sampling
    /// configuration.
    ///
    /// Returns the raw decoded text.  Callers are responsible for extracting
    /// whatever structure they prompted for.
    async fn complete(&self, prompt: &str, options: &SamplingOptions) -> Result<String>;
}
