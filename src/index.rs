//! Per-field indices and the schema-driven index set.
//!
//! [`IndexSet::for_schema`] walks the schema depth-first and creates one
//! index per leaf flat path: a [`TextIndex`] (radix tree plus token
//! occurrence counts) for text leaves, a [`NumericIndex`] for number leaves,
//! a [`BooleanIndex`] for boolean leaves. Documents are inserted and removed
//! as a whole; the caller supplies tokenization so the index set stays
//! agnostic of analyzers and languages.

pub mod boolean;
pub mod numeric;
pub mod radix;

use std::collections::BTreeMap;

use ahash::AHashMap;
use roaring::RoaringBitmap;
use serde_json::Value;

use crate::document::Ordinal;
use crate::error::{FalcataError, Result};
use crate::index::boolean::BooleanIndex;
use crate::index::numeric::NumericIndex;
use crate::index::radix::{RadixTree, TermSearch};
use crate::schema::{FieldKind, Schema};

/// Tokenization callback used when indexing or removing a document.
pub type TokenizeFn<'a> = dyn Fn(&str) -> Result<Vec<String>> + 'a;

/// The text index of one flat path: the radix tree plus occurrence counts
/// kept for a future ranking component (populated at insert, trimmed at
/// delete, never consumed by the planner).
#[derive(Clone, Debug, Default)]
pub struct TextIndex {
    tree: RadixTree,
    occurrences: AHashMap<String, u64>,
}

impl TextIndex {
    /// Create an empty text index.
    pub fn new() -> Self {
        TextIndex::default()
    }

    /// Add a posting and bump the token's occurrence count.
    pub fn insert(&mut self, token: &str, ordinal: Ordinal) {
        self.tree.insert(token, ordinal);
        *self.occurrences.entry(token.to_string()).or_insert(0) += 1;
    }

    /// Remove a posting. Returns `true` iff the posting was present.
    pub fn remove(&mut self, token: &str, ordinal: Ordinal) -> bool {
        let removed = self.tree.remove(token, ordinal);
        if removed {
            if let Some(count) = self.occurrences.get_mut(token) {
                *count -= 1;
                if *count == 0 {
                    self.occurrences.remove(token);
                }
            }
        }
        removed
    }

    /// The posting set of a token, empty if absent.
    pub fn find_exact(&self, token: &str) -> RoaringBitmap {
        self.tree.find_exact(token)
    }

    /// Union of the posting sets of every token starting with `prefix`.
    pub fn find_prefix(&self, prefix: &str) -> RoaringBitmap {
        self.tree.find_prefix(prefix)
    }

    /// Every token matching the search, mapped to its posting set.
    pub fn find(&self, search: &TermSearch<'_>) -> BTreeMap<String, RoaringBitmap> {
        self.tree.find(search)
    }

    /// Number of distinct tokens in this field.
    pub fn token_count(&self) -> usize {
        self.tree.token_count()
    }

    /// How many documents of this field contain the token.
    pub fn occurrence_of(&self, token: &str) -> u64 {
        self.occurrences.get(token).copied().unwrap_or(0)
    }
}

/// All indices of an engine, one per schema leaf.
#[derive(Debug, Default)]
pub struct IndexSet {
    text: BTreeMap<String, TextIndex>,
    numeric: BTreeMap<String, NumericIndex>,
    boolean: BTreeMap<String, BooleanIndex>,
}

impl IndexSet {
    /// Build empty indices for every leaf of the schema.
    pub fn for_schema(schema: &Schema) -> Self {
        let mut set = IndexSet::default();
        for (path, kind) in schema.flat_paths() {
            match kind {
                FieldKind::Text => {
                    set.text.insert(path, TextIndex::new());
                }
                FieldKind::Number => {
                    set.numeric.insert(path, NumericIndex::new());
                }
                FieldKind::Boolean => {
                    set.boolean.insert(path, BooleanIndex::new());
                }
            }
        }
        set
    }

    /// The text index at a flat path.
    pub fn text_index(&self, path: &str) -> Option<&TextIndex> {
        self.text.get(path)
    }

    /// The numeric index at a flat path.
    pub fn numeric_index(&self, path: &str) -> Option<&NumericIndex> {
        self.numeric.get(path)
    }

    /// The boolean index at a flat path.
    pub fn boolean_index(&self, path: &str) -> Option<&BooleanIndex> {
        self.boolean.get(path)
    }

    /// Index every leaf of a validated document.
    pub fn insert_document(
        &mut self,
        ordinal: Ordinal,
        document: &Value,
        tokenize: &TokenizeFn<'_>,
    ) -> Result<()> {
        for (path, value) in leaves_of(document) {
            if let Some(index) = self.text.get_mut(&path) {
                let text = expect_str(&path, value)?;
                for token in tokenize(text)? {
                    index.insert(&token, ordinal);
                }
            } else if let Some(index) = self.numeric.get_mut(&path) {
                let number = expect_f64(&path, value)?;
                index.insert(number, ordinal);
            } else if let Some(index) = self.boolean.get_mut(&path) {
                let flag = expect_bool(&path, value)?;
                index.insert(flag, ordinal);
            } else {
                return Err(FalcataError::invalid_doc_schema(format!(
                    "no index for field `{path}`"
                )));
            }
        }
        Ok(())
    }

    /// Undo every posting of a stored document.
    ///
    /// The document is re-tokenized with the same callback used at insert
    /// time. A missing radix posting means the indices and the document
    /// table disagree, which is fatal: `IndexRemovalFailure`. The sweep
    /// still covers every remaining field before the error is returned, so
    /// the caller can drop the document from the table without stranding
    /// postings; the first missing posting is the one reported.
    pub fn remove_document(
        &mut self,
        ordinal: Ordinal,
        id: &str,
        document: &Value,
        tokenize: &TokenizeFn<'_>,
    ) -> Result<()> {
        let mut failure = None;

        for (path, value) in leaves_of(document) {
            if let Some(index) = self.text.get_mut(&path) {
                let text = expect_str(&path, value)?;
                for token in tokenize(text)? {
                    if !index.remove(&token, ordinal) && failure.is_none() {
                        failure = Some(FalcataError::index_removal_failure(
                            id,
                            path.as_str(),
                            token,
                        ));
                    }
                }
            } else if let Some(index) = self.numeric.get_mut(&path) {
                let number = expect_f64(&path, value)?;
                index.remove(number, ordinal);
            } else if let Some(index) = self.boolean.get_mut(&path) {
                let flag = expect_bool(&path, value)?;
                index.remove(flag, ordinal);
            } else {
                return Err(FalcataError::invalid_doc_schema(format!(
                    "no index for field `{path}`"
                )));
            }
        }

        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Flatten a document into `(flat path, leaf value)` pairs.
fn leaves_of(document: &Value) -> Vec<(String, &Value)> {
    let mut out = Vec::new();
    if let Value::Object(map) = document {
        collect_leaves(map, None, &mut out);
    }
    out
}

fn collect_leaves<'a>(
    map: &'a serde_json::Map<String, Value>,
    prefix: Option<&str>,
    out: &mut Vec<(String, &'a Value)>,
) {
    for (name, value) in map {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{name}"),
            None => name.clone(),
        };
        match value {
            Value::Object(inner) => collect_leaves(inner, Some(&path), out),
            leaf => out.push((path, leaf)),
        }
    }
}

fn expect_str<'a>(path: &str, value: &'a Value) -> Result<&'a str> {
    value.as_str().ok_or_else(|| {
        FalcataError::invalid_doc_schema(format!("field `{path}` expected text, got {value}"))
    })
}

fn expect_f64(path: &str, value: &Value) -> Result<f64> {
    value
        .as_f64()
        .filter(|n| n.is_finite())
        .ok_or_else(|| {
            FalcataError::invalid_doc_schema(format!(
                "field `{path}` expected a finite number, got {value}"
            ))
        })
}

fn expect_bool(path: &str, value: &Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| {
        FalcataError::invalid_doc_schema(format!("field `{path}` expected boolean, got {value}"))
    })
}
