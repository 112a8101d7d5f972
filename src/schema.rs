//! Schema for the index directory.
//!
//! A schema declares which property paths are searchable and what kind
//! of search structure each one gets. Nested objects contribute their
//! leaf properties with `.`-joined path prefixes:
//!
//! ```
//! use calla::schema::{Schema, SearchableType};
//!
//! let schema = Schema::builder()
//!     .field("title", SearchableType::String)
//!     .object(
//!         "meta",
//!         Schema::builder()
//!             .field("rating", SearchableType::Number)
//!             .build(),
//!     )
//!     .build();
//!
//! let paths: Vec<_> = schema.walk().map(|(p, _)| p).collect();
//! assert_eq!(paths, vec!["title", "meta.rating"]);
//! ```

use serde::{Deserialize, Serialize};

/// The closed set of searchable property types.
///
/// Array variants change ingestion (one posting per element) and, for
/// enums, which filter operators apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchableType {
    /// Tokenized full-text property.
    String,
    /// Array of full-text values.
    StringArray,
    /// Numeric property supporting range queries.
    Number,
    /// Array of numeric values.
    NumberArray,
    /// Boolean property.
    Boolean,
    /// Array of boolean values.
    BooleanArray,
    /// Exact-match scalar property.
    Enum,
    /// Array of exact-match values.
    EnumArray,
    /// 2-D geographic point.
    GeoPoint,
    /// Dense vector of the given size (for downstream similarity).
    Vector(usize),
}

impl SearchableType {
    /// True for the array-valued variants.
    pub fn is_array(&self) -> bool {
        matches!(
            self,
            SearchableType::StringArray
                | SearchableType::NumberArray
                | SearchableType::BooleanArray
                | SearchableType::EnumArray
        )
    }

    /// Human-readable name, used in error messages.
    pub fn type_name(&self) -> String {
        match self {
            SearchableType::String => "string".to_string(),
            SearchableType::StringArray => "string[]".to_string(),
            SearchableType::Number => "number".to_string(),
            SearchableType::NumberArray => "number[]".to_string(),
            SearchableType::Boolean => "boolean".to_string(),
            SearchableType::BooleanArray => "boolean[]".to_string(),
            SearchableType::Enum => "enum".to_string(),
            SearchableType::EnumArray => "enum[]".to_string(),
            SearchableType::GeoPoint => "geopoint".to_string(),
            SearchableType::Vector(n) => format!("vector[{}]", n),
        }
    }
}

/// One entry in a schema: a typed leaf or a nested object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaEntry {
    /// A searchable leaf property.
    Leaf(SearchableType),
    /// A nested object contributing prefixed paths.
    Object(Schema),
}

/// Declarative mapping from property names to search structures.
///
/// Declaration order is preserved: the index walks entries depth-first
/// in the order they were added, which fixes the order of
/// `searchable_properties` for the directory's lifetime.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    entries: Vec<(String, SchemaEntry)>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Iterate all leaf properties as `(dotted_path, type)` pairs,
    /// depth-first in declaration order.
    pub fn walk(&self) -> impl Iterator<Item = (String, SearchableType)> + '_ {
        let mut out = Vec::new();
        self.collect_paths("", &mut out);
        out.into_iter()
    }

    fn collect_paths(&self, prefix: &str, out: &mut Vec<(String, SearchableType)>) {
        for (name, entry) in &self.entries {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", prefix, name)
            };
            match entry {
                SchemaEntry::Leaf(t) => out.push((path, *t)),
                SchemaEntry::Object(nested) => nested.collect_paths(&path, out),
            }
        }
    }

    /// Number of direct entries (not recursive).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the schema has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fluent builder for [`Schema`].
#[derive(Default)]
pub struct SchemaBuilder {
    entries: Vec<(String, SchemaEntry)>,
}

impl SchemaBuilder {
    /// Add a typed leaf property.
    pub fn field(mut self, name: impl Into<String>, searchable: SearchableType) -> Self {
        self.entries
            .push((name.into(), SchemaEntry::Leaf(searchable)));
        self
    }

    /// Add a nested object whose leaves get `.`-prefixed paths.
    pub fn object(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.entries.push((name.into(), SchemaEntry::Object(schema)));
        self
    }

    pub fn build(self) -> Schema {
        Schema {
            entries: self.entries,
        }
    }
}
