//! Flat inverted index for enum and boolean scalar membership.
//!
//! A direct mapping from scalar key to posting set. The `is_array` flag
//! decides which filter operators apply: scalar properties answer
//! `eq`/`in`/`nin`, array properties answer `containsAll`.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::data::InternalId;

/// Scalar key of a flat index entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarKey {
    Text(String),
    Bool(bool),
}

impl From<&str> for ScalarKey {
    fn from(v: &str) -> Self {
        ScalarKey::Text(v.to_string())
    }
}

impl From<String> for ScalarKey {
    fn from(v: String) -> Self {
        ScalarKey::Text(v)
    }
}

impl From<bool> for ScalarKey {
    fn from(v: bool) -> Self {
        ScalarKey::Bool(v)
    }
}

/// Filter operators over scalar enum properties. Exactly one operator
/// per predicate, enforced by the type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnumPredicate {
    /// Documents whose value equals the key.
    Eq(ScalarKey),
    /// Documents whose value is any of the keys.
    In(Vec<ScalarKey>),
    /// Documents whose value is none of the keys.
    Nin(Vec<ScalarKey>),
}

/// Filter operators over array-valued enum properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnumArrayPredicate {
    /// Documents whose array contains every one of the keys.
    ContainsAll(Vec<ScalarKey>),
}

/// Key to posting-set mapping for exact-match scalar properties.
#[derive(Debug, Clone, Default)]
pub struct FlatIndex {
    map: AHashMap<ScalarKey, Vec<InternalId>>,
    is_array: bool,
}

impl FlatIndex {
    pub fn new(is_array: bool) -> Self {
        Self {
            map: AHashMap::new(),
            is_array,
        }
    }

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    /// Add `id` to the posting set of `key`. Re-inserting the same
    /// `(key, id)` pair is a no-op.
    pub fn insert(&mut self, key: ScalarKey, id: InternalId) {
        let postings = self.map.entry(key).or_default();
        if !postings.contains(&id) {
            postings.push(id);
        }
    }

    /// Remove `id` from the posting set of `key`; empty sets are dropped.
    pub fn remove_document(&mut self, id: InternalId, key: &ScalarKey) {
        let emptied = match self.map.get_mut(key) {
            Some(postings) => {
                postings.retain(|&p| p != id);
                postings.is_empty()
            }
            None => false,
        };
        if emptied {
            self.map.remove(key);
        }
    }

    /// Evaluate a scalar filter operator.
    pub fn filter(&self, predicate: &EnumPredicate) -> Vec<InternalId> {
        match predicate {
            EnumPredicate::Eq(key) => self.map.get(key).cloned().unwrap_or_default(),
            EnumPredicate::In(keys) => {
                let mut out = Vec::new();
                for key in keys {
                    if let Some(postings) = self.map.get(key) {
                        out.extend_from_slice(postings);
                    }
                }
                out
            }
            EnumPredicate::Nin(keys) => {
                let excluded: AHashSet<&ScalarKey> = keys.iter().collect();
                let mut out = Vec::new();
                for (key, postings) in &self.map {
                    if !excluded.contains(key) {
                        out.extend_from_slice(postings);
                    }
                }
                // Map iteration order is arbitrary; sort for a stable result.
                out.sort_unstable();
                out
            }
        }
    }

    /// Evaluate an array filter operator: ids present under every key.
    pub fn filter_arr(&self, predicate: &EnumArrayPredicate) -> Vec<InternalId> {
        match predicate {
            EnumArrayPredicate::ContainsAll(keys) => {
                let Some((first, rest)) = keys.split_first() else {
                    // An empty key list constrains nothing.
                    return Vec::new();
                };
                let Some(base) = self.map.get(first) else {
                    return Vec::new();
                };
                let mut out = base.clone();
                for key in rest {
                    let Some(postings) = self.map.get(key) else {
                        return Vec::new();
                    };
                    let members: AHashSet<InternalId> = postings.iter().copied().collect();
                    out.retain(|id| members.contains(id));
                    if out.is_empty() {
                        return Vec::new();
                    }
                }
                out
            }
        }
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the index holds no keys.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Compact into an interned-key table for serialization.
    pub fn to_saved(&self) -> SavedFlat {
        let mut entries: Vec<(&ScalarKey, &Vec<InternalId>)> = self.map.iter().collect();
        entries.sort_by(|a, b| format!("{:?}", a.0).cmp(&format!("{:?}", b.0)));
        SavedFlat {
            is_array: self.is_array,
            keys: entries.iter().map(|(k, _)| (*k).clone()).collect(),
            postings: entries.iter().map(|(_, p)| (*p).clone()).collect(),
        }
    }

    /// Rebuild from an interned-key table.
    pub fn from_saved(saved: &SavedFlat) -> Self {
        let map = saved
            .keys
            .iter()
            .cloned()
            .zip(saved.postings.iter().cloned())
            .collect();
        Self {
            map,
            is_array: saved.is_array,
        }
    }
}

/// Interned-key form emitted by [`FlatIndex::to_saved`]: `keys[i]` owns
/// `postings[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedFlat {
    pub is_array: bool,
    pub keys: Vec<ScalarKey>,
    pub postings: Vec<Vec<InternalId>>,
}
