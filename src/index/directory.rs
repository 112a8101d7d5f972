//! Schema-driven construction, dispatch and serialization of sub-indexes.
//!
//! The directory owns exactly one search structure per schema path: a
//! [`Tree`] variant for searchable properties, a [`VectorSlot`] for
//! vector properties. Inserts and removals dispatch on the variant tag,
//! which is fixed at construction and never changes afterwards.

use serde::{Deserialize, Serialize};

use crate::analysis::{Analyzer, Language};
use crate::data::{DataValue, DocumentId, InternalId};
use crate::error::{CallaError, Result};
use crate::index::avl::{AVLIndex, DEFAULT_REBALANCE_THRESHOLD};
use crate::index::bkd::BKDIndex;
use crate::index::boolean::BoolIndex;
use crate::index::flat::{FlatIndex, SavedFlat};
use crate::index::radix::{RadixIndex, SavedRadix};
use crate::index::vector::{SavedVectors, VectorSlot};
use crate::schema::{Schema, SearchableType};

/// Options accepted by [`IndexDirectory::insert`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertOptions {
    /// AVL height-skew tolerance; higher values trade query sharpness
    /// for insert throughput.
    pub avl_rebalance_threshold: u32,
}

impl Default for InsertOptions {
    fn default() -> Self {
        Self {
            avl_rebalance_threshold: DEFAULT_REBALANCE_THRESHOLD,
        }
    }
}

/// One sub-index, tagged for runtime dispatch.
///
/// The tag and the `is_array` flag of every variant are immutable after
/// construction.
#[derive(Debug, Clone)]
pub enum Tree {
    Radix(RadixIndex),
    Avl(AVLIndex),
    Flat(FlatIndex),
    Bkd(BKDIndex),
    Bool(BoolIndex),
}

impl Tree {
    /// Stable tag of the variant.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Tree::Radix(_) => "radix",
            Tree::Avl(_) => "avl",
            Tree::Flat(_) => "flat",
            Tree::Bkd(_) => "bkd",
            Tree::Bool(_) => "bool",
        }
    }

    pub fn is_array(&self) -> bool {
        match self {
            Tree::Radix(t) => t.is_array(),
            Tree::Avl(t) => t.is_array(),
            Tree::Flat(t) => t.is_array(),
            Tree::Bkd(t) => t.is_array(),
            Tree::Bool(t) => t.is_array(),
        }
    }

    /// The radix index inside, if this is a text tree.
    pub fn as_radix(&self) -> Option<&RadixIndex> {
        match self {
            Tree::Radix(t) => Some(t),
            _ => None,
        }
    }
}

/// Owns one sub-index or vector slot per searchable property path.
#[derive(Debug, Clone, Default)]
pub struct IndexDirectory {
    indexes: Vec<(String, Tree)>,
    vector_indexes: Vec<(String, VectorSlot)>,
    searchable_properties: Vec<String>,
    searchable_properties_with_types: Vec<(String, SearchableType)>,
    docs_count: usize,
}

impl IndexDirectory {
    /// Walk the schema depth-first and allocate one sub-index per leaf.
    pub fn create(schema: &Schema) -> Result<Self> {
        let mut dir = Self::default();
        for (path, searchable) in schema.walk() {
            match searchable {
                SearchableType::String | SearchableType::StringArray => {
                    dir.indexes
                        .push((path.clone(), Tree::Radix(RadixIndex::new(searchable.is_array()))));
                }
                SearchableType::Number | SearchableType::NumberArray => {
                    dir.indexes
                        .push((path.clone(), Tree::Avl(AVLIndex::new(searchable.is_array()))));
                }
                SearchableType::Boolean | SearchableType::BooleanArray => {
                    dir.indexes
                        .push((path.clone(), Tree::Bool(BoolIndex::new(searchable.is_array()))));
                }
                SearchableType::Enum | SearchableType::EnumArray => {
                    dir.indexes
                        .push((path.clone(), Tree::Flat(FlatIndex::new(searchable.is_array()))));
                }
                SearchableType::GeoPoint => {
                    dir.indexes.push((path.clone(), Tree::Bkd(BKDIndex::new(false))));
                }
                SearchableType::Vector(size) => {
                    if size == 0 {
                        return Err(CallaError::invalid_schema_type(
                            path,
                            searchable.type_name(),
                        ));
                    }
                    dir.vector_indexes.push((path.clone(), VectorSlot::new(size)));
                }
            }
            dir.searchable_properties.push(path.clone());
            dir.searchable_properties_with_types.push((path, searchable));
        }
        Ok(dir)
    }

    /// All indexed paths, in schema-walk order.
    pub fn searchable_properties(&self) -> &[String] {
        &self.searchable_properties
    }

    /// All indexed paths with their declared types.
    pub fn searchable_properties_with_types(&self) -> &[(String, SearchableType)] {
        &self.searchable_properties_with_types
    }

    /// Declared type of `property`, if indexed.
    pub fn property_type(&self, property: &str) -> Option<SearchableType> {
        self.searchable_properties_with_types
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, t)| *t)
    }

    /// The sub-index owning `property`.
    pub fn tree(&self, property: &str) -> Option<&Tree> {
        self.indexes
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, t)| t)
    }

    fn tree_mut(&mut self, property: &str) -> Option<&mut Tree> {
        self.indexes
            .iter_mut()
            .find(|(p, _)| p == property)
            .map(|(_, t)| t)
    }

    /// The vector slot owning `property`.
    pub fn vector_slot(&self, property: &str) -> Option<&VectorSlot> {
        self.vector_indexes
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, s)| s)
    }

    fn vector_slot_mut(&mut self, property: &str) -> Option<&mut VectorSlot> {
        self.vector_indexes
            .iter_mut()
            .find(|(p, _)| p == property)
            .map(|(_, s)| s)
    }

    /// Total live documents, as last reported by the host engine.
    pub fn docs_count(&self) -> usize {
        self.docs_count
    }

    /// Index `value` for one property of one document.
    ///
    /// Dispatches on the owning sub-index; array values contribute one
    /// posting per element. `docs_count` is the engine's current total
    /// and feeds text scoring.
    #[allow(clippy::too_many_arguments)]
    pub fn insert(
        &mut self,
        property: &str,
        document_id: &DocumentId,
        internal_id: InternalId,
        value: &DataValue,
        language: Option<Language>,
        analyzer: &dyn Analyzer,
        docs_count: usize,
        options: &InsertOptions,
    ) -> Result<()> {
        self.docs_count = docs_count;

        if self.vector_slot(property).is_some() {
            let Some(data) = value.as_vector() else {
                return Err(CallaError::invalid_schema_type(property, value.kind()));
            };
            return self
                .vector_slot_mut(property)
                .unwrap()
                .insert(property, document_id.clone(), data);
        }

        let threshold = options.avl_rebalance_threshold;
        let Some(tree) = self.tree_mut(property) else {
            return Err(CallaError::invalid_schema_type(property, value.kind()));
        };

        match (tree, value) {
            (Tree::Radix(radix), DataValue::Text(text)) => {
                radix.insert(text, internal_id, analyzer, language, property);
            }
            (Tree::Radix(radix), DataValue::TextList(texts)) => {
                for text in texts {
                    radix.insert(text, internal_id, analyzer, language, property);
                }
            }
            (Tree::Avl(avl), DataValue::Number(key)) => {
                avl.insert(*key, internal_id, threshold);
            }
            (Tree::Avl(avl), DataValue::NumberList(keys)) => {
                for key in keys {
                    avl.insert(*key, internal_id, threshold);
                }
            }
            (Tree::Flat(flat), DataValue::Enum(key)) => {
                flat.insert(key.as_str().into(), internal_id);
            }
            (Tree::Flat(flat), DataValue::EnumList(keys)) => {
                for key in keys {
                    flat.insert(key.as_str().into(), internal_id);
                }
            }
            (Tree::Bkd(bkd), DataValue::Geo(point)) => {
                bkd.insert(*point, internal_id);
            }
            (Tree::Bool(bools), DataValue::Bool(v)) => {
                bools.insert(internal_id, *v);
            }
            (Tree::Bool(bools), DataValue::BoolList(vs)) => {
                for v in vs {
                    bools.insert(internal_id, *v);
                }
            }
            _ => {
                return Err(CallaError::invalid_schema_type(property, value.kind()));
            }
        }
        Ok(())
    }

    /// Remove the postings `value` produced for one document.
    ///
    /// Visits the same elements insert visited. Returns `false` only
    /// when a geopoint removal left a tombstone behind and a later
    /// rebuild is advisable; that is advisory, not a failure.
    pub fn remove(
        &mut self,
        property: &str,
        document_id: &DocumentId,
        internal_id: InternalId,
        value: &DataValue,
        language: Option<Language>,
        analyzer: &dyn Analyzer,
    ) -> Result<bool> {
        if self.vector_slot(property).is_some() {
            self.vector_slot_mut(property).unwrap().remove(document_id);
            return Ok(true);
        }

        let Some(tree) = self.tree_mut(property) else {
            return Err(CallaError::invalid_schema_type(property, value.kind()));
        };

        match (tree, value) {
            (Tree::Radix(radix), DataValue::Text(text)) => {
                for token in analyzer.analyze(text, language, Some(property)) {
                    radix.remove_word(&token, internal_id);
                }
            }
            (Tree::Radix(radix), DataValue::TextList(texts)) => {
                for text in texts {
                    for token in analyzer.analyze(text, language, Some(property)) {
                        radix.remove_word(&token, internal_id);
                    }
                }
            }
            (Tree::Avl(avl), DataValue::Number(key)) => {
                avl.remove_document(internal_id, *key);
            }
            (Tree::Avl(avl), DataValue::NumberList(keys)) => {
                for key in keys {
                    avl.remove_document(internal_id, *key);
                }
            }
            (Tree::Flat(flat), DataValue::Enum(key)) => {
                flat.remove_document(internal_id, &key.as_str().into());
            }
            (Tree::Flat(flat), DataValue::EnumList(keys)) => {
                for key in keys {
                    flat.remove_document(internal_id, &key.as_str().into());
                }
            }
            (Tree::Bkd(bkd), DataValue::Geo(point)) => {
                return Ok(bkd.remove_document(internal_id, *point));
            }
            (Tree::Bool(bools), DataValue::Bool(v)) => {
                bools.remove_document(internal_id, *v);
            }
            (Tree::Bool(bools), DataValue::BoolList(vs)) => {
                for v in vs {
                    bools.remove_document(internal_id, *v);
                }
            }
            _ => {
                return Err(CallaError::invalid_schema_type(property, value.kind()));
            }
        }
        Ok(true)
    }

    /// Serialize the directory into its persisted layout.
    ///
    /// Radix and flat sub-indexes emit compacted forms; AVL, BKD and
    /// bool trees are emitted as-is; vectors become plain arrays.
    pub fn save(&self) -> SavedIndex {
        SavedIndex {
            indexes: self
                .indexes
                .iter()
                .map(|(path, tree)| {
                    let saved = match tree {
                        Tree::Radix(t) => SavedTree::Radix(t.to_saved()),
                        Tree::Avl(t) => SavedTree::Avl(t.clone()),
                        Tree::Flat(t) => SavedTree::Flat(t.to_saved()),
                        Tree::Bkd(t) => SavedTree::Bkd(t.clone()),
                        Tree::Bool(t) => SavedTree::Bool(t.clone()),
                    };
                    (path.clone(), saved)
                })
                .collect(),
            vector_indexes: self
                .vector_indexes
                .iter()
                .map(|(path, slot)| (path.clone(), slot.to_saved()))
                .collect(),
            searchable_properties: self.searchable_properties.clone(),
            searchable_properties_with_types: self.searchable_properties_with_types.clone(),
            docs_count: self.docs_count,
        }
    }

    /// Reconstruct a directory from a prior [`IndexDirectory::save`].
    pub fn load(saved: &SavedIndex) -> Self {
        Self {
            indexes: saved
                .indexes
                .iter()
                .map(|(path, tree)| {
                    let live = match tree {
                        SavedTree::Radix(t) => Tree::Radix(RadixIndex::from_saved(t)),
                        SavedTree::Avl(t) => Tree::Avl(t.clone()),
                        SavedTree::Flat(t) => Tree::Flat(FlatIndex::from_saved(t)),
                        SavedTree::Bkd(t) => Tree::Bkd(t.clone()),
                        SavedTree::Bool(t) => Tree::Bool(t.clone()),
                    };
                    (path.clone(), live)
                })
                .collect(),
            vector_indexes: saved
                .vector_indexes
                .iter()
                .map(|(path, v)| (path.clone(), VectorSlot::from_saved(v)))
                .collect(),
            searchable_properties: saved.searchable_properties.clone(),
            searchable_properties_with_types: saved.searchable_properties_with_types.clone(),
            docs_count: saved.docs_count,
        }
    }
}

/// Serializable snapshot of one sub-index.
///
/// The variant tag leads the serialized record so a loader can dispatch
/// without consulting the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "tree", rename_all = "snake_case")]
pub enum SavedTree {
    Radix(SavedRadix),
    Avl(AVLIndex),
    Flat(SavedFlat),
    Bkd(BKDIndex),
    Bool(BoolIndex),
}

/// The persisted layout produced by [`IndexDirectory::save`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedIndex {
    pub indexes: Vec<(String, SavedTree)>,
    pub vector_indexes: Vec<(String, SavedVectors)>,
    pub searchable_properties: Vec<String>,
    pub searchable_properties_with_types: Vec<(String, SearchableType)>,
    pub docs_count: usize,
}
