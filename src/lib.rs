//! # Falcata
//!
//! An in-memory, typo-tolerant full-text search engine for Rust.
//!
//! ## Features
//!
//! - Schema-driven indexing over nested documents
//! - Radix-tree text index with exact, prefix, and fuzzy (edit-distance) lookup
//! - Structured filters over numeric and boolean fields
//! - Pluggable tokenization pipeline with per-language stemming
//! - Serialized write lane, concurrent reads
//!
//! ## Quick start
//!
//! ```
//! use falcata::engine::{EngineConfig, SearchEngine, SearchRequest};
//! use falcata::schema::Schema;
//! use serde_json::json;
//!
//! # fn main() -> falcata::error::Result<()> {
//! let schema = Schema::from_value(&json!({
//!     "title": "text",
//!     "year": "number",
//! }))?;
//!
//! let engine = SearchEngine::new(EngineConfig::builder().schema(schema).build()?)?;
//! engine.insert(json!({ "title": "The Lyra Book", "year": 2022 }), None)?;
//! engine.flush();
//!
//! let results = engine.search(SearchRequest::new("lyra"))?;
//! assert_eq!(results.count, 1);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod document;
pub mod engine;
pub mod error;
pub mod index;
pub mod query;
pub mod schema;
pub mod util;

pub mod prelude {
    //! Convenience re-exports for the common entry points.

    pub use crate::analysis::language::Language;
    pub use crate::engine::{EngineConfig, SearchEngine, SearchRequest, SearchResults};
    pub use crate::error::{FalcataError, Result};
    pub use crate::schema::Schema;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
