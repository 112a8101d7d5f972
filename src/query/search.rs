//! Tokenized multi-property text search.
//!
//! The planner fans the query tokens out over the selected radix
//! sub-indexes, merges the matched words per property and accumulates
//! scores into a single result map. Results come back in the order ids
//! first scored; ranking them is the caller's concern, never ours.

use ahash::AHashMap;

use crate::analysis::{Analyzer, Language};
use crate::data::InternalId;
use crate::error::{CallaError, Result};
use crate::index::directory::IndexDirectory;
use crate::index::radix::ScoreAccumulator;

/// Parameters of one text search.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    /// The raw query string; tokenized by the analyzer.
    pub term: String,
    /// Properties to search. Every one must resolve to a text index.
    pub properties: Vec<String>,
    /// Exact terminal matching only.
    pub exact: bool,
    /// Maximum edit distance for approximate matching. Zero means exact.
    pub tolerance: u32,
    /// Per-property score multiplier; absent properties default to 1.
    pub boost: AHashMap<String, f32>,
}

impl SearchParams {
    pub fn builder() -> SearchParamsBuilder {
        SearchParamsBuilder::default()
    }
}

/// Fluent builder for [`SearchParams`].
#[derive(Debug, Default)]
pub struct SearchParamsBuilder {
    params: SearchParams,
}

impl SearchParamsBuilder {
    pub fn term(mut self, term: impl Into<String>) -> Self {
        self.params.term = term.into();
        self
    }

    pub fn properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params.properties = properties.into_iter().map(Into::into).collect();
        self
    }

    pub fn exact(mut self, exact: bool) -> Self {
        self.params.exact = exact;
        self
    }

    pub fn tolerance(mut self, tolerance: u32) -> Self {
        self.params.tolerance = tolerance;
        self
    }

    pub fn boost(mut self, property: impl Into<String>, boost: f32) -> Self {
        self.params.boost.insert(property.into(), boost);
        self
    }

    pub fn build(self) -> SearchParams {
        self.params
    }
}

impl IndexDirectory {
    /// Search the selected text properties for `params.term`.
    ///
    /// Returns `(internal_id, score)` pairs in the order ids first
    /// contributed a score. An empty term that tokenizes to nothing
    /// matches every document of every selected property.
    pub fn search(
        &self,
        params: &SearchParams,
        analyzer: &dyn Analyzer,
        language: Option<Language>,
    ) -> Result<Vec<(InternalId, f32)>> {
        let mut tokens = analyzer.analyze(&params.term, language, None);
        if tokens.is_empty() && params.term.is_empty() {
            tokens.push(String::new());
        }

        let mut results = ScoreAccumulator::new();
        for property in &params.properties {
            let radix = self
                .tree(property)
                .and_then(|tree| tree.as_radix())
                .ok_or_else(|| CallaError::wrong_search_property_type(property))?;

            let boost = params.boost.get(property).copied().unwrap_or(1.0);
            if boost <= 0.0 {
                return Err(CallaError::invalid_boost_value(property));
            }

            // Tokens act as an OR at the word level: a word found by a
            // later token overwrites the entry of an earlier one.
            let mut found_words: Vec<(String, Vec<InternalId>)> = Vec::new();
            for token in &tokens {
                for (word, ids) in radix.find(token, params.exact, params.tolerance) {
                    match found_words.iter().position(|(w, _)| *w == word) {
                        Some(slot) => found_words[slot].1 = ids,
                        None => found_words.push((word, ids)),
                    }
                }
            }

            radix.calculate_score(&found_words, boost, self.docs_count(), &mut results);
        }

        Ok(results.into_results())
    }
}
