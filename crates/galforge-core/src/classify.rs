//! Backend error classification.
//!
//! Backends report failure as a message string. The only distinction the
//! executor draws is whether the message looks like a content-moderation
//! refusal, decided by case-insensitive keyword search. The heuristic is
//! isolated here so a backend with structured error codes can replace it.

use serde::{Deserialize, Serialize};

/// Keywords that mark a backend error as a moderation refusal.
pub const DEFAULT_MODERATION_KEYWORDS: &[&str] = &[
    "data_inspection_failed",
    "inappropriate content",
    "content_filter",
    "safety_filter",
    "moderation",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// The backend refused the content. Retried after a backoff, then
    /// degraded to the agent's fallback.
    ContentFilter,
    /// Anything else. Retried, then raised.
    Transport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorClassifier {
    /// Stored lowercased.
    keywords: Vec<String>,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_MODERATION_KEYWORDS.iter().copied())
    }
}

impl ErrorClassifier {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn with_keyword(mut self, keyword: impl AsRef<str>) -> Self {
        let keyword = keyword.as_ref().trim().to_lowercase();
        if !keyword.is_empty() && !self.keywords.contains(&keyword) {
            self.keywords.push(keyword);
        }
        self
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn classify(&self, message: &str) -> ErrorClass {
        let lowered = message.to_lowercase();
        if self.keywords.iter().any(|k| lowered.contains(k.as_str())) {
            ErrorClass::ContentFilter
        } else {
            ErrorClass::Transport
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_keywords_match_case_insensitively() {
        let classifier = ErrorClassifier::default();
        assert_eq!(
            classifier.classify("Error code: 400 - {'code': 'data_inspection_failed'}"),
            ErrorClass::ContentFilter
        );
        assert_eq!(
            classifier.classify("Request blocked: CONTENT_FILTER triggered"),
            ErrorClass::ContentFilter
        );
        assert_eq!(
            classifier.classify("Output contains Inappropriate Content"),
            ErrorClass::ContentFilter
        );
    }

    #[test]
    fn test_other_errors_are_transport() {
        let classifier = ErrorClassifier::default();
        assert_eq!(classifier.classify("connection reset by peer"), ErrorClass::Transport);
        assert_eq!(classifier.classify("HTTP 503 Service Unavailable"), ErrorClass::Transport);
    }

    #[test]
    fn test_custom_keyword_extends_the_list() {
        let classifier = ErrorClassifier::default().with_keyword("  Policy_Violation ");
        assert_eq!(
            classifier.classify("policy_violation: refused"),
            ErrorClass::ContentFilter
        );
        assert_eq!(classifier.keywords().len(), DEFAULT_MODERATION_KEYWORDS.len() + 1);
    }

    #[test]
    fn test_empty_list_classifies_everything_as_transport() {
        let classifier = ErrorClassifier::new(Vec::<String>::new());
        assert_eq!(classifier.classify("moderation"), ErrorClass::Transport);
    }
}
