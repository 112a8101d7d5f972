//! Query planning over the index directory.
//!
//! - [`search`]: tokenized multi-property text search with scoring
//! - [`filter`]: typed where-clause evaluation and intersection

pub mod filter;
pub mod search;
