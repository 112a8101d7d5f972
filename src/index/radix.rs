//! Compressed trie mapping tokens to scored posting sets.
//!
//! Each node carries an edge label (the prefix shared by everything
//! below it), children keyed by their first character, and, at terminal
//! positions, a posting map from internal id to term frequency. Lookups
//! support exact matching and approximate matching within a Levenshtein
//! edit distance.

use std::collections::BTreeMap;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::analysis::{Analyzer, Language};
use crate::data::InternalId;

/// Accumulates per-document scores across properties and tokens.
///
/// Ids keep the order of their first contribution; the planner returns
/// them without any sorting.
#[derive(Debug, Default)]
pub struct ScoreAccumulator {
    order: Vec<InternalId>,
    scores: AHashMap<InternalId, f32>,
}

impl ScoreAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta` to the score of `id`, registering it on first sight.
    pub fn add(&mut self, id: InternalId, delta: f32) {
        match self.scores.entry(id) {
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(delta);
                self.order.push(id);
            }
            std::collections::hash_map::Entry::Occupied(mut slot) => {
                *slot.get_mut() += delta;
            }
        }
    }

    /// Drain into `(id, score)` pairs in first-contribution order.
    pub fn into_results(self) -> Vec<(InternalId, f32)> {
        let scores = self.scores;
        self.order
            .into_iter()
            .map(|id| (id, scores[&id]))
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
struct RadixNode {
    /// Edge label leading from the parent to this node. Empty at the root.
    label: String,
    is_word: bool,
    postings: AHashMap<InternalId, u32>,
    /// Children keyed by the first character of their label. BTreeMap
    /// keeps traversal order deterministic, which fixes discovery order
    /// for fuzzy results and the saved node table.
    children: BTreeMap<char, RadixNode>,
}

impl RadixNode {
    fn with_label(label: String) -> Self {
        Self {
            label,
            ..Self::default()
        }
    }

    /// A node with no postings and no children can be dropped.
    fn is_prunable(&self) -> bool {
        !self.is_word && self.children.is_empty()
    }
}

/// Compressed trie keyed by normalized tokens.
#[derive(Debug, Clone, Default)]
pub struct RadixIndex {
    root: RadixNode,
    is_array: bool,
}

/// Byte length of the common char-wise prefix of `a` and `b`.
fn common_prefix_bytes(a: &str, b: &str) -> usize {
    let mut len = 0;
    let mut ai = a.chars();
    let mut bi = b.chars();
    while let (Some(x), Some(y)) = (ai.next(), bi.next()) {
        if x != y {
            break;
        }
        len += x.len_utf8();
    }
    len
}

/// Levenshtein edit distance over chars.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

impl RadixIndex {
    pub fn new(is_array: bool) -> Self {
        Self {
            root: RadixNode::default(),
            is_array,
        }
    }

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    /// Tokenize `text` and index every resulting token for `id`.
    pub fn insert(
        &mut self,
        text: &str,
        id: InternalId,
        analyzer: &dyn Analyzer,
        language: Option<Language>,
        property: &str,
    ) {
        for token in analyzer.analyze(text, language, Some(property)) {
            self.insert_token(&token, id);
        }
    }

    /// Index a single already-normalized token for `id`.
    ///
    /// The term frequency of `(token, id)` is incremented, starting at 1.
    pub fn insert_token(&mut self, token: &str, id: InternalId) {
        Self::insert_at(&mut self.root, token, id);
    }

    fn insert_at(node: &mut RadixNode, rest: &str, id: InternalId) {
        if rest.is_empty() {
            node.is_word = true;
            *node.postings.entry(id).or_insert(0) += 1;
            return;
        }

        let first = rest.chars().next().unwrap();
        if !node.children.contains_key(&first) {
            let mut leaf = RadixNode::with_label(rest.to_string());
            leaf.is_word = true;
            leaf.postings.insert(id, 1);
            node.children.insert(first, leaf);
            return;
        }

        let child = node.children.get_mut(&first).unwrap();
        let shared = common_prefix_bytes(&child.label, rest);
        if shared == child.label.len() {
            Self::insert_at(child, &rest[shared..], id);
            return;
        }

        // Partial match: split the edge at the divergence point. The
        // existing subtree keeps all of its postings below the new
        // branch node.
        let mut detached = std::mem::take(child);
        let suffix = detached.label[shared..].to_string();
        let mut branch = RadixNode::with_label(detached.label[..shared].to_string());
        detached.label = suffix;
        branch
            .children
            .insert(detached.label.chars().next().unwrap(), detached);

        if rest.len() == shared {
            branch.is_word = true;
            branch.postings.insert(id, 1);
        } else {
            let tail = &rest[shared..];
            let mut leaf = RadixNode::with_label(tail.to_string());
            leaf.is_word = true;
            leaf.postings.insert(id, 1);
            branch.children.insert(tail.chars().next().unwrap(), leaf);
        }
        *child = branch;
    }

    /// Locate words matching `term`.
    ///
    /// With `exact` (or `tolerance == 0`) only the exact terminal is
    /// considered. Otherwise the trie is descended along the longest
    /// matching prefix and every terminal below it whose full word lies
    /// within `tolerance` edits of `term` is returned. An empty term
    /// matches every terminal. Results keep discovery order.
    pub fn find(&self, term: &str, exact: bool, tolerance: u32) -> Vec<(String, Vec<InternalId>)> {
        if term.is_empty() {
            let mut out = Vec::new();
            Self::collect_words(&self.root, String::new(), &mut out, None);
            return out;
        }

        if exact || tolerance == 0 {
            return match self.node_for(term) {
                Some(node) if node.is_word => {
                    vec![(term.to_string(), Self::posting_ids(node))]
                }
                _ => Vec::new(),
            };
        }

        // Greedy descent along the longest fully matched prefix.
        let mut node = &self.root;
        let mut prefix = String::new();
        let mut rest = term;
        loop {
            if rest.is_empty() {
                break;
            }
            let first = rest.chars().next().unwrap();
            let Some(child) = node.children.get(&first) else {
                break;
            };
            let shared = common_prefix_bytes(&child.label, rest);
            if shared == child.label.len() {
                prefix.push_str(&child.label);
                node = child;
                rest = &rest[shared..];
            } else if shared == rest.len() {
                // Term ends inside this edge; everything below extends it.
                prefix.push_str(&child.label);
                node = child;
                rest = "";
            } else {
                break;
            }
        }

        let mut out = Vec::new();
        Self::collect_words(node, prefix, &mut out, Some((term, tolerance as usize)));
        out
    }

    fn collect_words(
        node: &RadixNode,
        prefix: String,
        out: &mut Vec<(String, Vec<InternalId>)>,
        within: Option<(&str, usize)>,
    ) {
        if node.is_word {
            let keep = match within {
                Some((term, tolerance)) => edit_distance(&prefix, term) <= tolerance,
                None => true,
            };
            if keep {
                out.push((prefix.clone(), Self::posting_ids(node)));
            }
        }
        for child in node.children.values() {
            let mut extended = prefix.clone();
            extended.push_str(&child.label);
            Self::collect_words(child, extended, out, within);
        }
    }

    fn posting_ids(node: &RadixNode) -> Vec<InternalId> {
        let mut ids: Vec<InternalId> = node.postings.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn node_for(&self, word: &str) -> Option<&RadixNode> {
        let mut node = &self.root;
        let mut rest = word;
        while !rest.is_empty() {
            let first = rest.chars().next().unwrap();
            let child = node.children.get(&first)?;
            if !rest.starts_with(child.label.as_str()) {
                return None;
            }
            rest = &rest[child.label.len()..];
            node = child;
        }
        Some(node)
    }

    /// Term frequency of `word` in document `id`.
    pub fn term_frequency(&self, word: &str, id: InternalId) -> u32 {
        self.node_for(word)
            .and_then(|n| n.postings.get(&id))
            .copied()
            .unwrap_or(0)
    }

    /// Remove `id` from the posting map of `word`, pruning terminals
    /// that become empty and re-merging pass-through edges.
    pub fn remove_word(&mut self, word: &str, id: InternalId) {
        Self::remove_at(&mut self.root, word, id);
    }

    fn remove_at(node: &mut RadixNode, rest: &str, id: InternalId) {
        if rest.is_empty() {
            node.postings.remove(&id);
            if node.postings.is_empty() {
                node.is_word = false;
            }
            return;
        }

        let Some(first) = rest.chars().next() else {
            return;
        };
        let (prunable, mergeable) = match node.children.get_mut(&first) {
            Some(child) if rest.starts_with(child.label.as_str()) => {
                let tail = &rest[child.label.len()..];
                Self::remove_at(child, tail, id);
                (
                    child.is_prunable(),
                    !child.is_word && child.children.len() == 1,
                )
            }
            _ => return,
        };

        if prunable {
            node.children.remove(&first);
        } else if mergeable {
            // Re-compress the pass-through edge left behind.
            let mut child = node.children.remove(&first).unwrap();
            let (_, mut only) = child.children.pop_first().unwrap();
            only.label = format!("{}{}", child.label, only.label);
            node.children.insert(first, only);
        }
    }

    /// Score every `(word, ids)` entry of `found_words` into `results`.
    ///
    /// Each id gains `boost × tf × idf` per word, where
    /// `idf = ln(docs_count / (1 + docs_with_word)) + 1`. The smoothing
    /// keeps the factor finite and positive for any live corpus.
    pub fn calculate_score(
        &self,
        found_words: &[(String, Vec<InternalId>)],
        boost: f32,
        docs_count: usize,
        results: &mut ScoreAccumulator,
    ) {
        for (word, ids) in found_words {
            if ids.is_empty() {
                continue;
            }
            let idf = (docs_count as f32 / (1 + ids.len()) as f32).ln() + 1.0;
            for &id in ids {
                let tf = self.term_frequency(word, id) as f32;
                results.add(id, boost * tf * idf);
            }
        }
    }

    /// All indexed words in traversal order.
    pub fn words(&self) -> Vec<String> {
        let mut out = Vec::new();
        Self::collect_words(&self.root, String::new(), &mut out, None);
        out.into_iter().map(|(w, _)| w).collect()
    }

    /// Number of distinct indexed words.
    pub fn len(&self) -> usize {
        self.words().len()
    }

    /// Check if the trie holds no words.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compact the trie into a flat node table for serialization.
    pub fn to_saved(&self) -> SavedRadix {
        let mut nodes = Vec::new();
        Self::save_node(&self.root, &mut nodes);
        SavedRadix {
            is_array: self.is_array,
            nodes,
        }
    }

    fn save_node(node: &RadixNode, nodes: &mut Vec<SavedRadixNode>) -> usize {
        let slot = nodes.len();
        let mut postings: Vec<(InternalId, u32)> =
            node.postings.iter().map(|(k, v)| (*k, *v)).collect();
        postings.sort_unstable();
        nodes.push(SavedRadixNode {
            label: node.label.clone(),
            word: node.is_word,
            postings,
            children: Vec::new(),
        });
        let mut child_slots = Vec::with_capacity(node.children.len());
        for child in node.children.values() {
            child_slots.push(Self::save_node(child, nodes));
        }
        nodes[slot].children = child_slots;
        slot
    }

    /// Rebuild a trie from its saved node table.
    pub fn from_saved(saved: &SavedRadix) -> Self {
        let root = if saved.nodes.is_empty() {
            RadixNode::default()
        } else {
            Self::load_node(&saved.nodes, 0)
        };
        Self {
            root,
            is_array: saved.is_array,
        }
    }

    fn load_node(nodes: &[SavedRadixNode], slot: usize) -> RadixNode {
        let saved = &nodes[slot];
        let mut node = RadixNode::with_label(saved.label.clone());
        node.is_word = saved.word;
        node.postings = saved.postings.iter().copied().collect();
        for &child_slot in &saved.children {
            let child = Self::load_node(nodes, child_slot);
            if let Some(first) = child.label.chars().next() {
                node.children.insert(first, child);
            }
        }
        node
    }
}

/// Shared-prefix node table emitted by [`RadixIndex::to_saved`].
///
/// Entry 0 is the root; `children` holds indexes into the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedRadix {
    pub is_array: bool,
    pub nodes: Vec<SavedRadixNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedRadixNode {
    pub label: String,
    pub word: bool,
    pub postings: Vec<(InternalId, u32)>,
    pub children: Vec<usize>,
}
