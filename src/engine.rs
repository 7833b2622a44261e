//! The search engine facade.
//!
//! A [`SearchEngine`] owns the schema, the analyzer, the shared index state,
//! and the writer lane. Inserts validate synchronously, get an id, and are
//! applied asynchronously in acceptance order; deletes block until applied;
//! searches run concurrently with the writer and with each other. Callers
//! that need read-your-writes call [`SearchEngine::flush`] first.

pub mod config;
pub mod search;
mod writer;

use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde_json::Value;

use crate::analysis::analyzer::Analyzer;
use crate::analysis::language::Language;
use crate::document::{generate_id, DocumentTable, IdRegistry};
use crate::error::{FalcataError, Result};
use crate::index::IndexSet;
use crate::query::planner::{self, QueryPlan};
use crate::schema::Schema;
use crate::util::elapsed::format_duration;

pub use config::{EngineConfig, EngineConfigBuilder};
pub use search::{Hit, SearchRequest, SearchResults};

use writer::{WriteOp, WriterLane};

/// Everything the writer mutates and searches read, behind one lock.
pub(crate) struct EngineState {
    pub(crate) indexes: IndexSet,
    pub(crate) docs: DocumentTable,
    pub(crate) registry: IdRegistry,
}

impl EngineState {
    pub(crate) fn for_schema(schema: &Schema) -> Self {
        EngineState {
            indexes: IndexSet::for_schema(schema),
            docs: DocumentTable::new(),
            registry: IdRegistry::new(),
        }
    }
}

/// An in-memory, typo-tolerant full-text search engine.
///
/// # Examples
///
/// ```
/// use falcata::engine::{EngineConfig, SearchEngine, SearchRequest};
/// use falcata::schema::Schema;
/// use serde_json::json;
///
/// # fn main() -> falcata::error::Result<()> {
/// let schema = Schema::builder().text("title").number("year").build();
/// let engine = SearchEngine::new(EngineConfig::builder().schema(schema).build()?)?;
///
/// engine.insert(json!({ "title": "The Lyra Book", "year": 2022 }), None)?;
/// engine.flush();
///
/// let results = engine.search(SearchRequest::new("lyra"))?;
/// assert_eq!(results.count, 1);
/// # Ok(())
/// # }
/// ```
pub struct SearchEngine {
    schema: Schema,
    analyzer: Arc<dyn Analyzer>,
    default_language: Language,
    state: Arc<RwLock<EngineState>>,
    writer: WriterLane,
}

impl SearchEngine {
    /// Create an engine from a configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let state = Arc::new(RwLock::new(EngineState::for_schema(&config.schema)));
        let writer = WriterLane::spawn(state.clone(), config.analyzer.clone())?;

        Ok(SearchEngine {
            schema: config.schema,
            analyzer: config.analyzer,
            default_language: config.default_language,
            state,
            writer,
        })
    }

    /// The engine's schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of fully applied documents.
    pub fn doc_count(&self) -> usize {
        self.state.read().docs.len()
    }

    /// How many applied documents of a text field contain a token.
    ///
    /// Occurrence bookkeeping is kept for a future ranking component; the
    /// planner itself never reads it.
    pub fn token_occurrence(&self, path: &str, token: &str) -> u64 {
        self.state
            .read()
            .indexes
            .text_index(path)
            .map(|index| index.occurrence_of(token))
            .unwrap_or(0)
    }

    /// Insert a document.
    ///
    /// Validation runs synchronously and the returned id is final, but the
    /// mutation is applied by the writer lane afterwards: a search issued
    /// immediately may not see the document yet. Two concurrent inserts are
    /// applied in acceptance order.
    pub fn insert(&self, document: Value, language: Option<Language>) -> Result<String> {
        self.schema.validate_document(&document)?;
        let language = language.unwrap_or(self.default_language);

        let id = generate_id();
        let ordinal = self
            .state
            .write()
            .registry
            .allocate(id.clone())
            .ok_or_else(|| FalcataError::engine("document ordinal space exhausted"))?;

        match self.writer.submit(WriteOp::Insert {
            ordinal,
            id: id.clone(),
            document,
            language,
        }) {
            Ok(()) => Ok(id),
            Err(error) => {
                self.state.write().registry.remove(&id);
                Err(error)
            }
        }
    }

    /// Delete a document by id, blocking until the removal is applied.
    ///
    /// Runs on the writer lane behind any queued inserts, so deleting an id
    /// whose insert is still in flight works. Unknown ids fail with
    /// `DocIdDoesNotExist`.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let ordinal = self
            .state
            .read()
            .registry
            .ordinal_of(id)
            .ok_or_else(|| FalcataError::doc_id_does_not_exist(id))?;

        let (ack, done) = crossbeam_channel::bounded(1);
        self.writer.submit(WriteOp::Delete {
            ordinal,
            id: id.to_string(),
            ack,
        })?;

        done.recv()
            .map_err(|_| FalcataError::engine("writer lane is shut down"))??;
        Ok(true)
    }

    /// Block until every previously accepted write has been applied.
    pub fn flush(&self) {
        self.writer.flush();
    }

    /// Run a search.
    pub fn search(&self, request: SearchRequest) -> Result<SearchResults> {
        let start = Instant::now();

        let language = request.language.unwrap_or(self.default_language);
        let tokens = self.analyzer.analyze(&request.term, language)?;

        let state = self.state.read();
        let plan = QueryPlan {
            tokens: &tokens,
            properties: request.properties.as_deref(),
            limit: request.limit,
            offset: request.offset,
            exact: request.exact,
            tolerance: request.tolerance,
            where_clause: request.where_clause.as_ref(),
        };
        let (count, hits) = planner::execute(&plan, &self.schema, &state.indexes, &state.docs)?;
        drop(state);

        Ok(SearchResults {
            count,
            hits,
            elapsed: format_duration(start.elapsed()),
        })
    }
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("schema", &self.schema)
            .field("default_language", &self.default_language)
            .field("analyzer", &self.analyzer.name())
            .field("doc_count", &self.doc_count())
            .finish()
    }
}
