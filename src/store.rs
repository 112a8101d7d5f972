//! External-id to internal-id mapping.
//!
//! The id store is owned by the host engine, not by the index directory;
//! the directory only ever reads it, and call sites pass `&InternalIdStore`
//! where resolution is needed.

use ahash::AHashMap;

use crate::data::{DocumentId, InternalId};

/// Allocates and resolves compact internal ids for external document ids.
///
/// Ids are handed out sequentially starting at 1; interning the same
/// document id twice returns the original internal id.
#[derive(Debug, Clone, Default)]
pub struct InternalIdStore {
    ids: AHashMap<DocumentId, InternalId>,
    next: InternalId,
}

impl InternalIdStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            ids: AHashMap::new(),
            next: 0,
        }
    }

    /// Return the internal id for `document_id`, allocating one if needed.
    pub fn intern(&mut self, document_id: DocumentId) -> InternalId {
        if let Some(id) = self.ids.get(&document_id) {
            return *id;
        }
        self.next += 1;
        self.ids.insert(document_id, self.next);
        self.next
    }

    /// Resolve an already-interned document id.
    pub fn get(&self, document_id: &DocumentId) -> Option<InternalId> {
        self.ids.get(document_id).copied()
    }

    /// Number of interned documents.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
