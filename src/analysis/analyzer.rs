//! Analyzers that combine tokenizers and filters.
//!
//! An [`Analyzer`] is the pluggable component an engine uses to turn text
//! into normalized tokens. The default [`StandardAnalyzer`] builds one
//! [`PipelineAnalyzer`] per language on demand: word tokenization, then
//! lowercase, stop-word, and stemming filters.

use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use parking_lot::RwLock;

use crate::analysis::language::Language;
use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::{LowercaseFilter, StemFilter, StopFilter, TokenFilter};
use crate::analysis::tokenizer::{Tokenizer, WordTokenizer};
use crate::error::Result;

/// Trait for analyzers that convert text into normalized tokens.
///
/// The output is a set in disguise: duplicates are collapsed, keeping the
/// first occurrence so downstream iteration order is deterministic.
pub trait Analyzer: Send + Sync {
    /// Analyze the given text in the given language.
    fn analyze(&self, text: &str, language: Language) -> Result<Vec<String>>;

    /// Get the name of this analyzer.
    fn name(&self) -> &'static str;
}

/// A configurable analyzer that chains a tokenizer with token filters.
pub struct PipelineAnalyzer {
    tokenizer: Arc<dyn Tokenizer>,
    filters: Vec<Arc<dyn TokenFilter>>,
}

impl PipelineAnalyzer {
    /// Create a new pipeline analyzer with the given tokenizer.
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        PipelineAnalyzer {
            tokenizer,
            filters: Vec::new(),
        }
    }

    /// Add a filter to the pipeline.
    pub fn add_filter(mut self, filter: Arc<dyn TokenFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Run the pipeline over the given text.
    pub fn run(&self, text: &str) -> Result<TokenStream> {
        let mut tokens = self.tokenizer.tokenize(text)?;
        for filter in &self.filters {
            tokens = filter.filter(tokens)?;
        }
        Ok(tokens)
    }
}

/// The default analyzer: Unicode word tokenization, lowercasing, language
/// stop-word removal, and Snowball stemming.
///
/// Pipelines are built lazily, one per language, and cached for the lifetime
/// of the analyzer.
///
/// # Examples
///
/// ```
/// use falcata::analysis::analyzer::{Analyzer, StandardAnalyzer};
/// use falcata::analysis::language::Language;
///
/// let analyzer = StandardAnalyzer::new();
/// let tokens = analyzer.analyze("The quick brown foxes", Language::English).unwrap();
///
/// // "the" is a stop word, "foxes" stems to "fox"
/// assert_eq!(tokens, vec!["quick", "brown", "fox"]);
/// ```
pub struct StandardAnalyzer {
    pipelines: RwLock<AHashMap<Language, Arc<PipelineAnalyzer>>>,
}

impl StandardAnalyzer {
    /// Create a new standard analyzer.
    pub fn new() -> Self {
        StandardAnalyzer {
            pipelines: RwLock::new(AHashMap::new()),
        }
    }

    fn pipeline_for(&self, language: Language) -> Arc<PipelineAnalyzer> {
        if let Some(pipeline) = self.pipelines.read().get(&language) {
            return pipeline.clone();
        }

        let pipeline = Arc::new(
            PipelineAnalyzer::new(Arc::new(WordTokenizer::new()))
                .add_filter(Arc::new(LowercaseFilter::new()))
                .add_filter(Arc::new(StopFilter::for_language(language)))
                .add_filter(Arc::new(StemFilter::for_language(language))),
        );

        self.pipelines
            .write()
            .entry(language)
            .or_insert(pipeline)
            .clone()
    }
}

impl Default for StandardAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for StandardAnalyzer {
    fn analyze(&self, text: &str, language: Language) -> Result<Vec<String>> {
        let pipeline = self.pipeline_for(language);

        let mut seen = AHashSet::new();
        let mut tokens = Vec::new();
        for token in pipeline.run(text)? {
            if token.is_stopped() || token.is_empty() {
                continue;
            }
            if seen.insert(token.text.clone()) {
                tokens.push(token.text);
            }
        }

        Ok(tokens)
    }

    fn name(&self) -> &'static str {
        "standard"
    }
}

impl std::fmt::Debug for StandardAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardAnalyzer").finish()
    }
}
