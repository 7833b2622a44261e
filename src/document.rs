//! Document storage: id allocation and the document table.
//!
//! Externally a document is identified by an opaque string id generated at
//! insertion. Internally every document gets a `u32` ordinal in acceptance
//! order; posting sets are bitmaps over ordinals, and the table maps applied
//! ordinals back to the id and the stored payload for result projection.

use ahash::AHashMap;
use serde_json::Value;
use uuid::Uuid;

use crate::analysis::language::Language;

/// Internal document number. Assigned once, in acceptance order.
pub type Ordinal = u32;

/// Generate a fresh opaque document id.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// The ids the engine has accepted, mapped to their ordinals.
///
/// An id enters the registry when its insert is accepted and leaves when a
/// delete is applied, so delete validation can run synchronously even while
/// the insert is still queued.
#[derive(Debug, Default)]
pub struct IdRegistry {
    ids: AHashMap<String, Ordinal>,
    next: Ordinal,
}

impl IdRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        IdRegistry::default()
    }

    /// Accept an id, assigning the next ordinal.
    ///
    /// Returns `None` once the ordinal space is exhausted.
    pub fn allocate(&mut self, id: String) -> Option<Ordinal> {
        let ordinal = self.next;
        self.next = self.next.checked_add(1)?;
        self.ids.insert(id, ordinal);
        Some(ordinal)
    }

    /// The ordinal of an accepted id.
    pub fn ordinal_of(&self, id: &str) -> Option<Ordinal> {
        self.ids.get(id).copied()
    }

    /// Forget an id.
    pub fn remove(&mut self, id: &str) -> Option<Ordinal> {
        self.ids.remove(id)
    }

    /// Number of accepted ids.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check whether no ids are accepted.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// A document as stored in the table.
#[derive(Clone, Debug)]
pub struct StoredDocument {
    /// The public id handed back from `insert`.
    pub id: String,
    /// The document exactly as inserted.
    pub document: Value,
    /// The language the document was tokenized in. Deletion re-tokenizes
    /// with the same language so every posting is found again.
    pub language: Language,
}

/// The table of applied documents.
///
/// Write-mostly: mutated only on the writer lane, read during result
/// projection. Membership here means the document is fully indexed.
#[derive(Debug, Default)]
pub struct DocumentTable {
    docs: AHashMap<Ordinal, StoredDocument>,
}

impl DocumentTable {
    /// Create an empty table.
    pub fn new() -> Self {
        DocumentTable {
            docs: AHashMap::new(),
        }
    }

    /// Store a document under its ordinal.
    pub fn insert(&mut self, ordinal: Ordinal, id: String, document: Value, language: Language) {
        self.docs.insert(
            ordinal,
            StoredDocument {
                id,
                document,
                language,
            },
        );
    }

    /// Remove and return the document stored under an ordinal.
    pub fn remove(&mut self, ordinal: Ordinal) -> Option<StoredDocument> {
        self.docs.remove(&ordinal)
    }

    /// Look up a stored document by ordinal.
    pub fn get(&self, ordinal: Ordinal) -> Option<&StoredDocument> {
        self.docs.get(&ordinal)
    }

    /// Number of applied documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Check whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}
