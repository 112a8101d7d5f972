//! Self-balancing ordered index from numeric key to posting lists.
//!
//! Nodes are rebalanced with the usual height-based rotations; the skew
//! threshold is configurable so bulk ingestion can trade query sharpness
//! for insert throughput. Range queries concatenate postings in in-order
//! traversal and intentionally keep duplicates (array values insert the
//! same id under multiple keys); deduplication is the planner's job.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::data::InternalId;

/// Default skew threshold: rebalance as soon as heights differ by more
/// than one.
pub const DEFAULT_REBALANCE_THRESHOLD: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct AvlNode {
    key: f64,
    postings: Vec<InternalId>,
    height: i32,
    left: Option<Box<AvlNode>>,
    right: Option<Box<AvlNode>>,
}

impl AvlNode {
    fn leaf(key: f64, id: InternalId) -> Box<Self> {
        Box::new(Self {
            key,
            postings: vec![id],
            height: 1,
            left: None,
            right: None,
        })
    }
}

fn height(node: &Option<Box<AvlNode>>) -> i32 {
    node.as_ref().map_or(0, |n| n.height)
}

fn update_height(node: &mut AvlNode) {
    node.height = 1 + height(&node.left).max(height(&node.right));
}

fn balance_factor(node: &AvlNode) -> i32 {
    height(&node.left) - height(&node.right)
}

fn rotate_right(mut node: Box<AvlNode>) -> Box<AvlNode> {
    let mut pivot = node.left.take().expect("rotate_right requires a left child");
    node.left = pivot.right.take();
    update_height(&mut node);
    pivot.right = Some(node);
    update_height(&mut pivot);
    pivot
}

fn rotate_left(mut node: Box<AvlNode>) -> Box<AvlNode> {
    let mut pivot = node.right.take().expect("rotate_left requires a right child");
    node.right = pivot.left.take();
    update_height(&mut node);
    pivot.left = Some(node);
    update_height(&mut pivot);
    pivot
}

fn cmp_keys(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Ordered numeric index supporting exact, open-ended and bounded range
/// queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AVLIndex {
    root: Option<Box<AvlNode>>,
    is_array: bool,
}

impl AVLIndex {
    pub fn new(is_array: bool) -> Self {
        Self {
            root: None,
            is_array,
        }
    }

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    /// Insert `id` under `key`, rebalancing when the height skew exceeds
    /// `threshold`. Ids inserted under the same key keep insertion order.
    pub fn insert(&mut self, key: f64, id: InternalId, threshold: u32) {
        let root = self.root.take();
        self.root = Some(Self::insert_at(root, key, id, threshold as i32));
    }

    fn insert_at(
        node: Option<Box<AvlNode>>,
        key: f64,
        id: InternalId,
        threshold: i32,
    ) -> Box<AvlNode> {
        let Some(mut node) = node else {
            return AvlNode::leaf(key, id);
        };

        match cmp_keys(key, node.key) {
            Ordering::Equal => {
                if !node.postings.contains(&id) {
                    node.postings.push(id);
                }
                return node;
            }
            Ordering::Less => {
                node.left = Some(Self::insert_at(node.left.take(), key, id, threshold));
            }
            Ordering::Greater => {
                node.right = Some(Self::insert_at(node.right.take(), key, id, threshold));
            }
        }

        update_height(&mut node);
        let bf = balance_factor(&node);
        if bf > threshold {
            // Left-heavy
            if balance_factor(node.left.as_ref().unwrap()) < 0 {
                node.left = Some(rotate_left(node.left.take().unwrap()));
            }
            node = rotate_right(node);
        } else if bf < -threshold {
            // Right-heavy
            if balance_factor(node.right.as_ref().unwrap()) > 0 {
                node.right = Some(rotate_right(node.right.take().unwrap()));
            }
            node = rotate_left(node);
        }
        node
    }

    /// Postings stored under exactly `key`, or `None` when absent.
    pub fn find(&self, key: f64) -> Option<&[InternalId]> {
        let mut node = self.root.as_deref();
        while let Some(n) = node {
            match cmp_keys(key, n.key) {
                Ordering::Equal => return Some(&n.postings),
                Ordering::Less => node = n.left.as_deref(),
                Ordering::Greater => node = n.right.as_deref(),
            }
        }
        None
    }

    /// All postings with key greater than (or equal to, when `inclusive`)
    /// `key`, in ascending key order.
    pub fn greater_than(&self, key: f64, inclusive: bool) -> Vec<InternalId> {
        let mut out = Vec::new();
        Self::collect_range(&self.root, Some((key, inclusive)), None, &mut out);
        out
    }

    /// All postings with key less than (or equal to, when `inclusive`)
    /// `key`, in ascending key order.
    pub fn less_than(&self, key: f64, inclusive: bool) -> Vec<InternalId> {
        let mut out = Vec::new();
        Self::collect_range(&self.root, None, Some((key, inclusive)), &mut out);
        out
    }

    /// All postings with key in `[min, max]` (inclusive on both ends).
    /// Returns empty when `min > max`.
    pub fn range_search(&self, min: f64, max: f64) -> Vec<InternalId> {
        if min > max {
            return Vec::new();
        }
        let mut out = Vec::new();
        Self::collect_range(&self.root, Some((min, true)), Some((max, true)), &mut out);
        out
    }

    fn collect_range(
        node: &Option<Box<AvlNode>>,
        lower: Option<(f64, bool)>,
        upper: Option<(f64, bool)>,
        out: &mut Vec<InternalId>,
    ) {
        let Some(n) = node else {
            return;
        };

        let above_lower = lower.map_or(true, |(min, inc)| {
            if inc {
                n.key >= min
            } else {
                n.key > min
            }
        });
        let below_upper = upper.map_or(true, |(max, inc)| {
            if inc {
                n.key <= max
            } else {
                n.key < max
            }
        });

        if above_lower {
            Self::collect_range(&n.left, lower, upper, out);
        }
        if above_lower && below_upper {
            out.extend_from_slice(&n.postings);
        }
        if below_upper {
            Self::collect_range(&n.right, lower, upper, out);
        }
    }

    /// Remove every occurrence of `id` from the posting list at `key`.
    /// The node is retained even when its list empties.
    pub fn remove_document(&mut self, id: InternalId, key: f64) {
        let mut node = self.root.as_deref_mut();
        while let Some(n) = node {
            match cmp_keys(key, n.key) {
                Ordering::Equal => {
                    n.postings.retain(|&p| p != id);
                    return;
                }
                Ordering::Less => node = n.left.as_deref_mut(),
                Ordering::Greater => node = n.right.as_deref_mut(),
            }
        }
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        fn count(node: &Option<Box<AvlNode>>) -> usize {
            node.as_ref()
                .map_or(0, |n| 1 + count(&n.left) + count(&n.right))
        }
        count(&self.root)
    }

    /// Check if the index holds no keys.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_with(pairs: &[(f64, InternalId)]) -> AVLIndex {
        let mut idx = AVLIndex::new(false);
        for (key, id) in pairs {
            idx.insert(*key, *id, DEFAULT_REBALANCE_THRESHOLD);
        }
        idx
    }

    #[test]
    fn test_find_exact() {
        let idx = index_with(&[(10.0, 1), (20.0, 2), (10.0, 3)]);
        assert_eq!(idx.find(10.0), Some(&[1, 3][..]));
        assert_eq!(idx.find(20.0), Some(&[2][..]));
        assert_eq!(idx.find(15.0), None);
    }

    #[test]
    fn test_range_search() {
        let idx = index_with(&[(10.0, 1), (20.0, 2), (30.0, 3), (40.0, 4)]);
        assert_eq!(idx.range_search(15.0, 35.0), vec![2, 3]);
        assert_eq!(idx.range_search(10.0, 40.0), vec![1, 2, 3, 4]);
        assert_eq!(idx.range_search(20.0, 20.0), vec![2]);
    }

    #[test]
    fn test_range_search_inverted_bounds_is_empty() {
        let idx = index_with(&[(10.0, 1), (20.0, 2)]);
        assert!(idx.range_search(30.0, 10.0).is_empty());
    }

    #[test]
    fn test_greater_and_less_than() {
        let idx = index_with(&[(10.0, 1), (20.0, 2), (30.0, 3)]);
        assert_eq!(idx.greater_than(20.0, false), vec![3]);
        assert_eq!(idx.greater_than(20.0, true), vec![2, 3]);
        assert_eq!(idx.less_than(20.0, false), vec![1]);
        assert_eq!(idx.less_than(20.0, true), vec![1, 2]);
    }

    #[test]
    fn test_ascending_insert_stays_balanced() {
        let mut idx = AVLIndex::new(false);
        for i in 0..128 {
            idx.insert(i as f64, i as InternalId, DEFAULT_REBALANCE_THRESHOLD);
        }
        // A degenerate chain would be 128 deep; AVL keeps it logarithmic.
        assert!(idx.root.as_ref().unwrap().height <= 9);
        assert_eq!(idx.range_search(0.0, 127.0).len(), 128);
    }

    #[test]
    fn test_higher_threshold_still_orders_correctly() {
        let mut idx = AVLIndex::new(false);
        for i in 0..64 {
            idx.insert(i as f64, i as InternalId, 4);
        }
        assert_eq!(idx.range_search(10.0, 12.0), vec![10, 11, 12]);
    }

    #[test]
    fn test_remove_document_keeps_node() {
        let mut idx = index_with(&[(10.0, 1), (10.0, 2)]);
        idx.remove_document(1, 10.0);
        assert_eq!(idx.find(10.0), Some(&[2][..]));
        idx.remove_document(2, 10.0);
        // Node survives with an empty posting list.
        assert_eq!(idx.find(10.0), Some(&[][..]));
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn test_duplicate_ids_across_keys_are_preserved() {
        // Array values index one id under several keys.
        let idx = index_with(&[(1.0, 9), (2.0, 9), (3.0, 9)]);
        assert_eq!(idx.range_search(0.0, 5.0), vec![9, 9, 9]);
    }
}
