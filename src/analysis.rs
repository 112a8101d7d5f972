//! Text analysis for calla.
//!
//! The indexing core never interprets raw text itself; it hands every
//! string to an [`Analyzer`] and works with the normalized tokens that
//! come back. The analysis pipeline follows a simple flow:
//!
//! ```text
//! Text → Analyzer → Normalized Tokens
//! ```
//!
//! # Examples
//!
//! ```
//! use calla::analysis::{Analyzer, StandardAnalyzer};
//!
//! let analyzer = StandardAnalyzer::new();
//! let tokens = analyzer.analyze("Hello World!", None, None);
//! assert_eq!(tokens, vec!["hello", "world"]);
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Language hint forwarded to analyzers.
///
/// The core passes this through untouched; language-aware analyzers may
/// use it to pick stemmers or stopword lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    English,
    French,
    German,
    Italian,
    Spanish,
}

/// Trait for text analyzers.
///
/// Implementations must be pure: the same input always yields the same
/// token stream, and empty input yields an empty stream.
pub trait Analyzer {
    /// Split `text` into zero or more normalized tokens.
    ///
    /// `language` and `property` are hints; analyzers that ignore them
    /// must still accept them.
    fn analyze(
        &self,
        text: &str,
        language: Option<Language>,
        property: Option<&str>,
    ) -> Vec<String>;
}

/// Default analyzer: lowercases and splits on non-alphanumeric runs.
///
/// `"Hello World!"` becomes `["hello", "world"]`. Unicode letters and
/// digits are kept, everything else separates tokens.
#[derive(Debug, Clone)]
pub struct StandardAnalyzer {
    separator: Regex,
}

impl StandardAnalyzer {
    /// Create a new standard analyzer.
    pub fn new() -> Self {
        Self {
            separator: Regex::new(r"[^\p{L}\p{N}]+").unwrap(),
        }
    }
}

impl Default for StandardAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for StandardAnalyzer {
    fn analyze(
        &self,
        text: &str,
        _language: Option<Language>,
        _property: Option<&str>,
    ) -> Vec<String> {
        self.separator
            .split(&text.to_lowercase())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_string())
            .collect()
    }
}

/// Analyzer that emits the whole input as a single lowercase token.
///
/// Useful for identifier-like properties where splitting would be wrong.
#[derive(Debug, Clone, Default)]
pub struct KeywordAnalyzer;

impl KeywordAnalyzer {
    /// Create a new keyword analyzer.
    pub fn new() -> Self {
        Self
    }
}

impl Analyzer for KeywordAnalyzer {
    fn analyze(
        &self,
        text: &str,
        _language: Option<Language>,
        _property: Option<&str>,
    ) -> Vec<String> {
        if text.is_empty() {
            Vec::new()
        } else {
            vec![text.to_lowercase()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_analyzer_basic() {
        let analyzer = StandardAnalyzer::new();
        assert_eq!(
            analyzer.analyze("Hello World!", None, None),
            vec!["hello", "world"]
        );
    }

    #[test]
    fn test_standard_analyzer_punctuation_and_digits() {
        let analyzer = StandardAnalyzer::new();
        assert_eq!(
            analyzer.analyze("rust-lang 2021 edition?", None, None),
            vec!["rust", "lang", "2021", "edition"]
        );
    }

    #[test]
    fn test_standard_analyzer_empty_input() {
        let analyzer = StandardAnalyzer::new();
        assert!(analyzer.analyze("", None, None).is_empty());
        assert!(analyzer.analyze("   ", None, None).is_empty());
    }

    #[test]
    fn test_keyword_analyzer() {
        let analyzer = KeywordAnalyzer::new();
        assert_eq!(
            analyzer.analyze("Hello World", None, None),
            vec!["hello world"]
        );
        assert!(analyzer.analyze("", None, None).is_empty());
    }
}
