//! Block K-D tree over 2-D geographic points.
//!
//! Leaves hold blocks of `(point, ids)` entries; interior nodes split
//! alternately on latitude and longitude at the median of a bulk-loaded
//! range. New points buffer into an overflow block, and once the buffer
//! outgrows its limit the whole tree is rebuilt from the live entries.
//! Radius and polygon queries prune leaves by bounding box, then test
//! every surviving point.

use serde::{Deserialize, Serialize};

use crate::data::{GeoPoint, InternalId};
use crate::geo::{
    equirectangular_distance, haversine_distance, point_in_polygon, polygon_area, BoundingBox,
};

/// Maximum entries per leaf block before a bulk-loaded range splits.
pub const BKD_BLOCK_CAPACITY: usize = 64;

/// Overflow entries buffered before the tree is rebuilt.
pub const BKD_OVERFLOW_LIMIT: usize = 32;

/// One indexed point and the documents located there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BkdEntry {
    pub point: GeoPoint,
    pub ids: Vec<InternalId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Axis {
    Lat,
    Lon,
}

impl Axis {
    fn of_depth(depth: usize) -> Self {
        if depth % 2 == 0 {
            Axis::Lat
        } else {
            Axis::Lon
        }
    }

    fn coord(&self, p: GeoPoint) -> f64 {
        match self {
            Axis::Lat => p.lat,
            Axis::Lon => p.lon,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum BkdNode {
    Leaf {
        entries: Vec<BkdEntry>,
    },
    Internal {
        axis: Axis,
        split: f64,
        left: Box<BkdNode>,
        right: Box<BkdNode>,
    },
}

/// Spatial index over geopoints supporting radius and polygon filters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BKDIndex {
    root: Option<BkdNode>,
    overflow: Vec<BkdEntry>,
    is_array: bool,
}

impl BKDIndex {
    pub fn new(is_array: bool) -> Self {
        Self {
            root: None,
            overflow: Vec::new(),
            is_array,
        }
    }

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    /// Index `id` at `point`.
    ///
    /// A point already present anywhere in the index gains the id on its
    /// existing entry; genuinely new points buffer into the overflow
    /// block until the next rebuild.
    pub fn insert(&mut self, point: GeoPoint, id: InternalId) {
        if let Some(entry) = self.entry_mut(point) {
            if !entry.ids.contains(&id) {
                entry.ids.push(id);
            }
            return;
        }

        self.overflow.push(BkdEntry {
            point,
            ids: vec![id],
        });
        if self.overflow.len() > BKD_OVERFLOW_LIMIT {
            self.rebuild();
        }
    }

    fn entry_mut(&mut self, point: GeoPoint) -> Option<&mut BkdEntry> {
        if let Some(pos) = self.overflow.iter().position(|e| e.point == point) {
            return self.overflow.get_mut(pos);
        }
        self.root.as_mut().and_then(|n| Self::find_in(n, point))
    }

    fn find_in(node: &mut BkdNode, point: GeoPoint) -> Option<&mut BkdEntry> {
        match node {
            BkdNode::Leaf { entries } => entries.iter_mut().find(|e| e.point == point),
            BkdNode::Internal {
                axis, split, left, right,
            } => {
                let c = axis.coord(point);
                // Median splits put equal coordinates on both sides.
                if c == *split {
                    if Self::contains_point(left, point) {
                        Self::find_in(left, point)
                    } else {
                        Self::find_in(right, point)
                    }
                } else if c < *split {
                    Self::find_in(left, point)
                } else {
                    Self::find_in(right, point)
                }
            }
        }
    }

    fn contains_point(node: &BkdNode, point: GeoPoint) -> bool {
        match node {
            BkdNode::Leaf { entries } => entries.iter().any(|e| e.point == point),
            BkdNode::Internal {
                axis, split, left, right,
            } => {
                let c = axis.coord(point);
                if c == *split {
                    Self::contains_point(left, point) || Self::contains_point(right, point)
                } else if c < *split {
                    Self::contains_point(left, point)
                } else {
                    Self::contains_point(right, point)
                }
            }
        }
    }

    /// Rebuild the tree from every live entry plus the overflow buffer.
    pub fn rebuild(&mut self) {
        let mut entries = self.entries();
        entries.retain(|e| !e.ids.is_empty());
        self.overflow.clear();
        self.root = if entries.is_empty() {
            None
        } else {
            Some(Self::build(entries, 0))
        };
    }

    fn build(mut entries: Vec<BkdEntry>, depth: usize) -> BkdNode {
        if entries.len() <= BKD_BLOCK_CAPACITY {
            return BkdNode::Leaf { entries };
        }
        let axis = Axis::of_depth(depth);
        entries.sort_by(|a, b| {
            axis.coord(a.point)
                .partial_cmp(&axis.coord(b.point))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let mid = entries.len() / 2;
        let split = axis.coord(entries[mid].point);
        let right_entries = entries.split_off(mid);
        BkdNode::Internal {
            axis,
            split,
            left: Box::new(Self::build(entries, depth + 1)),
            right: Box::new(Self::build(right_entries, depth + 1)),
        }
    }

    /// Every entry in the index, tree and overflow alike.
    pub fn entries(&self) -> Vec<BkdEntry> {
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            Self::collect_entries(root, &mut out);
        }
        out.extend(self.overflow.iter().cloned());
        out
    }

    fn collect_entries(node: &BkdNode, out: &mut Vec<BkdEntry>) {
        match node {
            BkdNode::Leaf { entries } => out.extend(entries.iter().cloned()),
            BkdNode::Internal { left, right, .. } => {
                Self::collect_entries(left, out);
                Self::collect_entries(right, out);
            }
        }
    }

    /// Documents within (or, with `inside == false`, strictly beyond)
    /// `meters` of `center`.
    ///
    /// `high_precision` selects great-circle distance over the cheaper
    /// equirectangular approximation.
    pub fn search_by_radius(
        &self,
        center: GeoPoint,
        meters: f64,
        inside: bool,
        high_precision: bool,
    ) -> Vec<InternalId> {
        let distance: fn(GeoPoint, GeoPoint) -> f64 = if high_precision {
            haversine_distance
        } else {
            equirectangular_distance
        };
        let matches = |p: GeoPoint| {
            let d = distance(center, p);
            if inside {
                d <= meters
            } else {
                d > meters
            }
        };

        let mut out = Vec::new();
        // Complement queries must visit every leaf; only inside queries
        // can prune by the disc's bounding box.
        let prune = inside.then(|| BoundingBox::around(center, meters));
        if let Some(root) = &self.root {
            Self::search_tree(root, &prune, &matches, &mut out);
        }
        for entry in &self.overflow {
            if matches(entry.point) {
                out.extend_from_slice(&entry.ids);
            }
        }
        out
    }

    /// Documents inside (or outside) the polygon described by `vertices`.
    ///
    /// Degenerate polygons (fewer than 3 vertices, or zero area) match
    /// nothing. `high_precision` is accepted for signature parity with
    /// radius search; the planar containment test does not use it.
    pub fn search_by_polygon(
        &self,
        vertices: &[GeoPoint],
        inside: bool,
        _high_precision: bool,
    ) -> Vec<InternalId> {
        if vertices.len() < 3 || polygon_area(vertices) == 0.0 {
            return Vec::new();
        }
        let matches = |p: GeoPoint| point_in_polygon(p, vertices) == inside;

        let mut out = Vec::new();
        let prune = if inside {
            BoundingBox::of_points(vertices)
        } else {
            None
        };
        if let Some(root) = &self.root {
            Self::search_tree(root, &prune, &matches, &mut out);
        }
        for entry in &self.overflow {
            if matches(entry.point) {
                out.extend_from_slice(&entry.ids);
            }
        }
        out
    }

    fn search_tree<F>(
        node: &BkdNode,
        prune: &Option<BoundingBox>,
        matches: &F,
        out: &mut Vec<InternalId>,
    ) where
        F: Fn(GeoPoint) -> bool,
    {
        match node {
            BkdNode::Leaf { entries } => {
                for entry in entries {
                    if !entry.ids.is_empty() && matches(entry.point) {
                        out.extend_from_slice(&entry.ids);
                    }
                }
            }
            BkdNode::Internal {
                axis, split, left, right,
            } => {
                let (go_left, go_right) = match prune {
                    Some(bbox) => match axis {
                        Axis::Lat => (bbox.min_lat <= *split, bbox.max_lat >= *split),
                        Axis::Lon => (bbox.min_lon <= *split, bbox.max_lon >= *split),
                    },
                    None => (true, true),
                };
                if go_left {
                    Self::search_tree(left, prune, matches, out);
                }
                if go_right {
                    Self::search_tree(right, prune, matches, out);
                }
            }
        }
    }

    /// Remove `id` from the entry at `point`.
    ///
    /// Returns `true` when the posting was removed outright (or nothing
    /// matched), `false` when an empty tombstone entry was left in a
    /// leaf and a later [`BKDIndex::rebuild`] is advisable. A `false`
    /// return is advisory, never a failure.
    pub fn remove_document(&mut self, id: InternalId, point: GeoPoint) -> bool {
        if let Some(pos) = self.overflow.iter().position(|e| e.point == point) {
            self.overflow[pos].ids.retain(|&p| p != id);
            if self.overflow[pos].ids.is_empty() {
                self.overflow.swap_remove(pos);
            }
            return true;
        }

        let Some(root) = self.root.as_mut() else {
            return true;
        };
        !Self::remove_in(root, point, id)
    }

    /// Returns true when a tombstone was left behind.
    fn remove_in(node: &mut BkdNode, point: GeoPoint, id: InternalId) -> bool {
        match node {
            BkdNode::Leaf { entries } => {
                if let Some(entry) = entries.iter_mut().find(|e| e.point == point) {
                    entry.ids.retain(|&p| p != id);
                    return entry.ids.is_empty();
                }
                false
            }
            BkdNode::Internal {
                axis, split, left, right,
            } => {
                if axis.coord(point) == *split {
                    Self::remove_in(left, point, id) || Self::remove_in(right, point, id)
                } else if axis.coord(point) < *split {
                    Self::remove_in(left, point, id)
                } else {
                    Self::remove_in(right, point, id)
                }
            }
        }
    }

    /// Number of live points.
    pub fn len(&self) -> usize {
        self.entries().iter().filter(|e| !e.ids.is_empty()).count()
    }

    /// Check if the index holds no live points.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint { lat, lon }
    }

    fn sorted(mut v: Vec<InternalId>) -> Vec<InternalId> {
        v.sort_unstable();
        v
    }

    #[test]
    fn test_radius_inside() {
        let mut idx = BKDIndex::new(false);
        idx.insert(pt(45.0, 9.0), 1);
        idx.insert(pt(45.001, 9.001), 2);
        idx.insert(pt(46.0, 10.0), 3);

        let hits = idx.search_by_radius(pt(45.0, 9.0), 200.0, true, false);
        assert_eq!(sorted(hits), vec![1, 2]);

        let hits = idx.search_by_radius(pt(45.0, 9.0), 200.0, true, true);
        assert_eq!(sorted(hits), vec![1, 2]);
    }

    #[test]
    fn test_radius_outside() {
        let mut idx = BKDIndex::new(false);
        idx.insert(pt(45.0, 9.0), 1);
        idx.insert(pt(46.0, 10.0), 2);
        let hits = idx.search_by_radius(pt(45.0, 9.0), 200.0, false, false);
        assert_eq!(hits, vec![2]);
    }

    #[test]
    fn test_polygon() {
        let mut idx = BKDIndex::new(false);
        idx.insert(pt(5.0, 5.0), 1);
        idx.insert(pt(20.0, 20.0), 2);
        let square = vec![pt(0.0, 0.0), pt(0.0, 10.0), pt(10.0, 10.0), pt(10.0, 0.0)];

        assert_eq!(idx.search_by_polygon(&square, true, false), vec![1]);
        assert_eq!(idx.search_by_polygon(&square, false, false), vec![2]);
    }

    #[test]
    fn test_degenerate_polygon_is_empty() {
        let mut idx = BKDIndex::new(false);
        idx.insert(pt(5.0, 5.0), 1);
        assert!(idx.search_by_polygon(&[pt(0.0, 0.0), pt(1.0, 1.0)], true, false).is_empty());
        let line = vec![pt(0.0, 0.0), pt(1.0, 1.0), pt(2.0, 2.0)];
        assert!(idx.search_by_polygon(&line, true, false).is_empty());
    }

    #[test]
    fn test_same_point_accumulates_ids() {
        let mut idx = BKDIndex::new(false);
        idx.insert(pt(45.0, 9.0), 1);
        idx.insert(pt(45.0, 9.0), 2);
        idx.insert(pt(45.0, 9.0), 2);
        let hits = idx.search_by_radius(pt(45.0, 9.0), 1.0, true, false);
        assert_eq!(sorted(hits), vec![1, 2]);
    }

    #[test]
    fn test_overflow_triggers_rebuild() {
        let mut idx = BKDIndex::new(false);
        for i in 0..200u64 {
            let lat = (i as f64) * 0.01;
            let lon = (i as f64) * 0.01;
            idx.insert(pt(lat, lon), i);
        }
        assert!(idx.root.is_some());
        assert!(idx.overflow.len() <= BKD_OVERFLOW_LIMIT);
        assert_eq!(idx.len(), 200);

        // Every point is still findable after rebuilds.
        let hits = idx.search_by_radius(pt(0.5, 0.5), 2_000.0, true, true);
        assert!(hits.contains(&50));
    }

    #[test]
    fn test_remove_from_overflow_is_clean() {
        let mut idx = BKDIndex::new(false);
        idx.insert(pt(45.0, 9.0), 1);
        assert!(idx.remove_document(1, pt(45.0, 9.0)));
        assert!(idx.is_empty());
    }

    #[test]
    fn test_remove_from_tree_leaves_tombstone() {
        let mut idx = BKDIndex::new(false);
        for i in 0..40u64 {
            idx.insert(pt(i as f64 * 0.1, 0.0), i);
        }
        // The rebuild moved early points into the tree.
        assert!(idx.root.is_some());
        let clean = idx.remove_document(0, pt(0.0, 0.0));
        assert!(!clean, "tree removal should request a rebuild");
        let hits = idx.search_by_radius(pt(0.0, 0.0), 10.0, true, true);
        assert!(!hits.contains(&0));

        idx.rebuild();
        assert_eq!(idx.len(), 39);
    }

    #[test]
    fn test_remove_missing_point_is_clean() {
        let mut idx = BKDIndex::new(false);
        idx.insert(pt(45.0, 9.0), 1);
        assert!(idx.remove_document(9, pt(0.0, 0.0)));
    }
}
