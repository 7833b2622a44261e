//! Search request and result types.

use serde::Serialize;
use serde_json::Value;

use crate::analysis::language::Language;

pub use crate::query::planner::Hit;

/// A search request.
///
/// Defaults: all text properties, limit 10, offset 0, prefix matching
/// (`exact` false, tolerance 0), no filter, the engine's default language.
///
/// # Examples
///
/// ```
/// use falcata::engine::SearchRequest;
/// use serde_json::json;
///
/// let request = SearchRequest::new("lyra")
///     .tolerance(1)
///     .limit(5)
///     .with_where(json!({ "year": { ">=": 2020 } }));
/// ```
#[derive(Clone, Debug)]
pub struct SearchRequest {
    pub(crate) term: String,
    pub(crate) properties: Option<Vec<String>>,
    pub(crate) limit: usize,
    pub(crate) offset: usize,
    pub(crate) exact: bool,
    pub(crate) tolerance: u32,
    pub(crate) where_clause: Option<Value>,
    pub(crate) language: Option<Language>,
}

impl SearchRequest {
    /// Create a request for a term with default settings.
    pub fn new<S: Into<String>>(term: S) -> Self {
        SearchRequest {
            term: term.into(),
            properties: None,
            limit: 10,
            offset: 0,
            exact: false,
            tolerance: 0,
            where_clause: None,
            language: None,
        }
    }

    /// Restrict matching to a subset of the schema's text paths.
    pub fn properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties = Some(properties.into_iter().map(|p| p.into()).collect());
        self
    }

    /// Set the maximum number of hits to return.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Skip the first `offset` matching documents.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Match the term as a whole token only.
    pub fn exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    /// Set the maximum edit distance for typo tolerance.
    pub fn tolerance(mut self, tolerance: u32) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Attach a structured `where` filter.
    pub fn with_where(mut self, clause: Value) -> Self {
        self.where_clause = Some(clause);
        self
    }

    /// Override the engine's default language for this call.
    pub fn language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }
}

/// The outcome of a search.
#[derive(Clone, Debug, Serialize)]
pub struct SearchResults {
    /// Total number of distinct matching documents, independent of paging.
    pub count: usize,
    /// The requested page of hits.
    pub hits: Vec<Hit>,
    /// How long the query took, human-readable.
    pub elapsed: String,
}
