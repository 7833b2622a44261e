//! Text analysis pipeline: tokenization, filtering, and language support.
//!
//! Analysis turns a raw string into the set of normalized tokens the text
//! index stores and the query planner looks up. The pipeline is pluggable:
//! an engine carries an [`analyzer::Analyzer`] implementation, and the
//! default [`analyzer::StandardAnalyzer`] chains a Unicode word tokenizer
//! with lowercase, stop-word, and stemming filters per language.

pub mod analyzer;
pub mod language;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

pub use analyzer::{Analyzer, StandardAnalyzer};
pub use language::Language;
