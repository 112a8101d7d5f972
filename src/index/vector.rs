//! Fixed-width dense vector storage with cached magnitudes.
//!
//! One slot exists per vector property. Vectors are stored contiguously
//! as `f32` with their Euclidean magnitude precomputed at insert time,
//! so the downstream cosine-similarity ranker never recomputes norms.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::data::DocumentId;
use crate::error::{CallaError, Result};

/// A stored vector: precomputed magnitude plus the dense data.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredVector {
    pub magnitude: f32,
    pub data: Vec<f32>,
}

impl StoredVector {
    fn new(data: Vec<f32>) -> Self {
        let magnitude = data.iter().map(|v| v * v).sum::<f32>().sqrt();
        Self { magnitude, data }
    }
}

/// Per-property vector storage of a fixed size.
#[derive(Debug, Clone, Default)]
pub struct VectorSlot {
    size: usize,
    vectors: AHashMap<DocumentId, StoredVector>,
}

impl VectorSlot {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            vectors: AHashMap::new(),
        }
    }

    /// Declared vector width.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Store `data` for `document_id`, replacing any previous vector.
    ///
    /// The length of `data` must equal the declared size.
    pub fn insert(&mut self, property: &str, document_id: DocumentId, data: &[f32]) -> Result<()> {
        if data.len() != self.size {
            return Err(CallaError::invalid_vector_size(
                property,
                self.size,
                data.len(),
            ));
        }
        self.vectors
            .insert(document_id, StoredVector::new(data.to_vec()));
        Ok(())
    }

    /// Fetch the stored vector for `document_id`.
    pub fn get(&self, document_id: &DocumentId) -> Option<&StoredVector> {
        self.vectors.get(document_id)
    }

    /// Delete the vector stored for `document_id`.
    pub fn remove(&mut self, document_id: &DocumentId) {
        self.vectors.remove(document_id);
    }

    /// Iterate all stored vectors.
    pub fn iter(&self) -> impl Iterator<Item = (&DocumentId, &StoredVector)> {
        self.vectors.iter()
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Check if the slot is empty.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Serializable form: plain arrays, magnitudes dropped.
    pub fn to_saved(&self) -> SavedVectors {
        let mut entries: Vec<(DocumentId, Vec<f32>)> = self
            .vectors
            .iter()
            .map(|(id, v)| (id.clone(), v.data.clone()))
            .collect();
        entries.sort_by_key(|(id, _)| id.to_string());
        SavedVectors {
            size: self.size,
            entries,
        }
    }

    /// Rebuild from plain arrays, re-materializing magnitudes.
    pub fn from_saved(saved: &SavedVectors) -> Self {
        let vectors = saved
            .entries
            .iter()
            .map(|(id, data)| (id.clone(), StoredVector::new(data.clone())))
            .collect();
        Self {
            size: saved.size,
            vectors,
        }
    }
}

/// Plain-array form emitted by [`VectorSlot::to_saved`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedVectors {
    pub size: usize,
    pub entries: Vec<(DocumentId, Vec<f32>)>,
}
