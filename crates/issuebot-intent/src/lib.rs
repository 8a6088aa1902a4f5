//! Natural-language understanding for issuebot.
//!
//! This crate turns free-form request text into the structured inputs the
//! action router needs:
//!
//! - **Intent classification**: Two-tier resolution (deterministic few-shot
//!   completion + keyword fallback) via [`classifier::IntentClassifier`].
//! - **Title generation**: Sampled few-shot rephrasing into a concise issue
//!   summary via [`title::TitleGenerator`].
//! - **Key extraction**: Pure regex parsing of `PROJECT-NUMBER` issue keys
//!   via [`key::extract_issue_key`].

pub mod classifier;
pub mod key;
pub mod title;

pub use classifier::{
    ClassificationResult, ClassifySource, Intent, IntentClassifier, Resolution,
};
pub use key::{IssueKey, extract_issue_key};
pub use title::TitleGenerator;
