//! # Calla
//!
//! A schema-driven, in-memory full-text and structured search index for Rust.
//!
//! ## Features
//!
//! - Pure Rust implementation
//! - Declarative schema mapping property paths to typed search structures
//! - Tokenized text search with typo tolerance and per-property boosting
//! - Typed filters: range, equality, set membership, boolean, geo radius
//!   and polygon
//! - Dense vector storage with cached magnitudes for similarity ranking
//! - Format-preserving save/load of the whole directory
//!
//! ## Example
//!
//! ```
//! use calla::{
//!     DataValue, IndexDirectory, InsertOptions, InternalIdStore, Schema, SearchParams,
//!     SearchableType, StandardAnalyzer,
//! };
//!
//! let schema = Schema::builder()
//!     .field("title", SearchableType::String)
//!     .build();
//! let mut dir = IndexDirectory::create(&schema).unwrap();
//! let mut ids = InternalIdStore::new();
//! let analyzer = StandardAnalyzer::new();
//!
//! let doc = "doc-1".into();
//! let internal = ids.intern(doc);
//! dir.insert(
//!     "title",
//!     &"doc-1".into(),
//!     internal,
//!     &DataValue::from("hello world"),
//!     None,
//!     &analyzer,
//!     1,
//!     &InsertOptions::default(),
//! )
//! .unwrap();
//!
//! let params = SearchParams::builder()
//!     .term("hello")
//!     .properties(["title"])
//!     .build();
//! let hits = dir.search(&params, &analyzer, None).unwrap();
//! assert_eq!(hits[0].0, internal);
//! ```

pub mod analysis;
pub mod data;
mod error;
pub mod geo;
pub mod index;
pub mod query;
pub mod schema;
pub mod store;

// Re-exports for the public API
pub use analysis::{Analyzer, KeywordAnalyzer, Language, StandardAnalyzer};
pub use data::{DataValue, DocumentId, GeoPoint, InternalId};
pub use error::{CallaError, Result};
pub use index::directory::{IndexDirectory, InsertOptions, SavedIndex, SavedTree, Tree};
pub use index::flat::{EnumArrayPredicate, EnumPredicate, ScalarKey};
pub use index::vector::{StoredVector, VectorSlot};
pub use query::filter::{
    GeoPredicate, NumberPredicate, PolygonPredicate, Predicate, RadiusPredicate, WhereClause,
};
pub use query::search::{SearchParams, SearchParamsBuilder};
pub use schema::{Schema, SchemaBuilder, SearchableType};
pub use store::InternalIdStore;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
