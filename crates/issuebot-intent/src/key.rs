//! Issue key extraction.
//!
//! An issue key is the canonical `PROJECT-NUMBER` identifier of a tracked
//! issue (e.g. `DEVOPS-102`).  Extraction is a pure parsing function with no
//! control-flow side effects: either the text contains a well-formed key or
//! it does not.

use std::sync::LazyLock;

use regex::Regex;

/// Matches a project prefix (one uppercase letter followed by at least one
/// more uppercase letter or digit), a hyphen, and the issue number, on word
/// boundaries.  Lowercase or single-letter prefixes do not match.
static ISSUE_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z][A-Z0-9]+)-([0-9]+)\b").expect("issue key pattern compiles")
});

/// A structured issue key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueKey {
    /// The uppercase project prefix (e.g. `DEVOPS`).
    pub project: String,
    /// The issue number.
    pub number: u64,
}

impl std::fmt::Display for IssueKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.project, self.number)
    }
}

/// Extract the first issue key from free-form text.
///
/// Returns `None` when no substring matches the exact key shape -- there are
/// no partial keys.
pub fn extract_issue_key(text: &str) -> Option<IssueKey> {
    let caps = ISSUE_KEY_RE.captures(text)?;
    let number = caps[2].parse().ok()?;
    Some(IssueKey {
        project: caps[1].to_string(),
        number,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_key_from_surrounding_text() {
        let key = extract_issue_key("check DEVOPS-102 status").unwrap();
        assert_eq!(key.project, "DEVOPS");
        assert_eq!(key.number, 102);
        assert_eq!(key.to_string(), "DEVOPS-102");
    }

    #[test]
    fn first_match_wins() {
        let key = extract_issue_key("compare OPS-1 with OPS-2").unwrap();
        assert_eq!(key.to_string(), "OPS-1");
    }

    #[test]
    fn digits_allowed_in_prefix_after_first_letter() {
        let key = extract_issue_key("see B2B-77 for context").unwrap();
        assert_eq!(key.project, "B2B");
        assert_eq!(key.number, 77);
    }

    #[test]
    fn lowercase_prefix_rejected() {
        assert!(extract_issue_key("check devops-102 status").is_none());
    }

    #[test]
    fn single_letter_prefix_rejected() {
        assert!(extract_issue_key("look at A-1").is_none());
    }

    #[test]
    fn missing_number_rejected() {
        assert!(extract_issue_key("the DEVOPS- board").is_none());
    }

    #[test]
    fn plain_text_yields_none() {
        assert!(extract_issue_key("check the login issue").is_none());
    }
}
