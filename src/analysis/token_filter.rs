//! Token filter implementations.
//!
//! Filters run after tokenization and transform the token stream: lowering
//! case, removing stop words, reducing words to their stems. Filters compose
//! in the order they are added to a pipeline.

use std::collections::HashSet;
use std::sync::Arc;

use rust_stemmers::Stemmer;

use crate::analysis::language::Language;
use crate::analysis::token::{Token, TokenStream};
use crate::error::Result;

/// Trait for filters that transform a token stream.
pub trait TokenFilter: Send + Sync {
    /// Apply this filter to a token stream.
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream>;

    /// Get the name of this filter (for debugging and configuration).
    fn name(&self) -> &'static str;
}

/// A filter that converts token text to lowercase.
///
/// # Examples
///
/// ```
/// use falcata::analysis::token::Token;
/// use falcata::analysis::token_filter::{LowercaseFilter, TokenFilter};
///
/// let filter = LowercaseFilter::new();
/// let tokens = vec![Token::new("Hello", 0), Token::new("WORLD", 1)];
/// let filtered: Vec<_> = filter.filter(Box::new(tokens.into_iter())).unwrap().collect();
///
/// assert_eq!(filtered[0].text, "hello");
/// assert_eq!(filtered[1].text, "world");
/// ```
#[derive(Clone, Debug, Default)]
pub struct LowercaseFilter;

impl LowercaseFilter {
    /// Create a new lowercase filter.
    pub fn new() -> Self {
        LowercaseFilter
    }
}

impl TokenFilter for LowercaseFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let filtered: Vec<Token> = tokens
            .map(|token| {
                if token.is_stopped() || token.text.chars().all(|c| c.is_lowercase()) {
                    token
                } else {
                    let lowered = token.text.to_lowercase();
                    token.with_text(lowered)
                }
            })
            .collect();

        Ok(Box::new(filtered.into_iter()))
    }

    fn name(&self) -> &'static str {
        "lowercase"
    }
}

/// A filter that removes stop words from the token stream.
#[derive(Clone, Debug)]
pub struct StopFilter {
    /// The set of stop words to remove
    stop_words: Arc<HashSet<String>>,
}

impl StopFilter {
    /// Create a stop filter with the bundled list for the given language.
    pub fn for_language(language: Language) -> Self {
        Self::from_words(language.stop_words().iter().copied())
    }

    /// Create a stop filter from a list of stop words.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stop_words = words.into_iter().map(|s| s.into()).collect();
        StopFilter {
            stop_words: Arc::new(stop_words),
        }
    }

    /// Check if a word is a stop word.
    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    /// Get the number of stop words.
    pub fn len(&self) -> usize {
        self.stop_words.len()
    }

    /// Check if the stop word set is empty.
    pub fn is_empty(&self) -> bool {
        self.stop_words.is_empty()
    }
}

impl TokenFilter for StopFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let filtered: Vec<Token> = tokens
            .filter(|token| token.is_stopped() || !self.is_stop_word(&token.text))
            .collect();

        Ok(Box::new(filtered.into_iter()))
    }

    fn name(&self) -> &'static str {
        "stop"
    }
}

/// A filter that reduces tokens to their stems using a Snowball stemmer.
///
/// # Examples
///
/// ```
/// use falcata::analysis::language::Language;
/// use falcata::analysis::token::Token;
/// use falcata::analysis::token_filter::{StemFilter, TokenFilter};
///
/// let filter = StemFilter::for_language(Language::English);
/// let tokens = vec![Token::new("running", 0), Token::new("books", 1)];
/// let stemmed: Vec<_> = filter.filter(Box::new(tokens.into_iter())).unwrap().collect();
///
/// assert_eq!(stemmed[0].text, "run");
/// assert_eq!(stemmed[1].text, "book");
/// ```
pub struct StemFilter {
    stemmer: Stemmer,
    language: Language,
}

impl StemFilter {
    /// Create a stem filter for the given language.
    pub fn for_language(language: Language) -> Self {
        StemFilter {
            stemmer: Stemmer::create(language.stemmer_algorithm()),
            language,
        }
    }

    /// The language this filter stems for.
    pub fn language(&self) -> Language {
        self.language
    }
}

impl std::fmt::Debug for StemFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StemFilter")
            .field("language", &self.language)
            .finish()
    }
}

impl TokenFilter for StemFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let stemmed: Vec<Token> = tokens
            .map(|token| {
                if token.is_stopped() {
                    token
                } else {
                    let stem = self.stemmer.stem(&token.text).into_owned();
                    token.with_text(stem)
                }
            })
            .collect();

        Ok(Box::new(stemmed.into_iter()))
    }

    fn name(&self) -> &'static str {
        "stem"
    }
}
