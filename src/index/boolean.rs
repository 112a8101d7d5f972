//! Two-bucket posting index for boolean properties.

use serde::{Deserialize, Serialize};

use crate::data::InternalId;

/// Posting sets keyed by `true` and `false`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoolIndex {
    true_ids: Vec<InternalId>,
    false_ids: Vec<InternalId>,
    is_array: bool,
}

impl BoolIndex {
    pub fn new(is_array: bool) -> Self {
        Self {
            true_ids: Vec::new(),
            false_ids: Vec::new(),
            is_array,
        }
    }

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    /// Add `id` to the bucket for `value`. Re-inserting is a no-op.
    pub fn insert(&mut self, id: InternalId, value: bool) {
        let bucket = if value {
            &mut self.true_ids
        } else {
            &mut self.false_ids
        };
        if !bucket.contains(&id) {
            bucket.push(id);
        }
    }

    /// The posting set for `value`, in insertion order.
    pub fn where_value(&self, value: bool) -> &[InternalId] {
        if value {
            &self.true_ids
        } else {
            &self.false_ids
        }
    }

    /// Remove `id` from the bucket for `value`.
    pub fn remove_document(&mut self, id: InternalId, value: bool) {
        let bucket = if value {
            &mut self.true_ids
        } else {
            &mut self.false_ids
        };
        bucket.retain(|&p| p != id);
    }

    /// Total number of postings across both buckets.
    pub fn len(&self) -> usize {
        self.true_ids.len() + self.false_ids.len()
    }

    /// Check if both buckets are empty.
    pub fn is_empty(&self) -> bool {
        self.true_ids.is_empty() && self.false_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_where() {
        let mut idx = BoolIndex::new(false);
        idx.insert(1, true);
        idx.insert(2, false);
        idx.insert(3, true);
        assert_eq!(idx.where_value(true), &[1, 3]);
        assert_eq!(idx.where_value(false), &[2]);
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut idx = BoolIndex::new(false);
        idx.insert(1, true);
        idx.insert(1, true);
        assert_eq!(idx.where_value(true), &[1]);
    }

    #[test]
    fn test_remove() {
        let mut idx = BoolIndex::new(false);
        idx.insert(1, true);
        idx.insert(2, true);
        idx.remove_document(1, true);
        assert_eq!(idx.where_value(true), &[2]);
        // Removing from the wrong bucket changes nothing.
        idx.remove_document(2, false);
        assert_eq!(idx.where_value(true), &[2]);
    }
}
