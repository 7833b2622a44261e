//! Supported languages for the analysis pipeline.

use std::fmt;

use rust_stemmers::Algorithm;
use serde::{Deserialize, Serialize};

use crate::error::{FalcataError, Result};

/// A language the default analysis pipeline knows how to process.
///
/// Each language maps to a Snowball stemming algorithm. Stop-word lists are
/// bundled for English; the other languages run with an empty stop list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Danish,
    Dutch,
    English,
    French,
    German,
    Italian,
    Norwegian,
    Portuguese,
    Russian,
    Spanish,
    Swedish,
}

impl Language {
    /// All supported languages.
    pub const ALL: [Language; 11] = [
        Language::Danish,
        Language::Dutch,
        Language::English,
        Language::French,
        Language::German,
        Language::Italian,
        Language::Norwegian,
        Language::Portuguese,
        Language::Russian,
        Language::Spanish,
        Language::Swedish,
    ];

    /// Resolve a two-letter ISO 639-1 code.
    ///
    /// # Examples
    ///
    /// ```
    /// use falcata::analysis::language::Language;
    ///
    /// assert_eq!(Language::from_code("en").unwrap(), Language::English);
    /// assert!(Language::from_code("tlh").is_err());
    /// ```
    pub fn from_code(code: &str) -> Result<Self> {
        match code {
            "da" => Ok(Language::Danish),
            "nl" => Ok(Language::Dutch),
            "en" => Ok(Language::English),
            "fr" => Ok(Language::French),
            "de" => Ok(Language::German),
            "it" => Ok(Language::Italian),
            "no" => Ok(Language::Norwegian),
            "pt" => Ok(Language::Portuguese),
            "ru" => Ok(Language::Russian),
            "es" => Ok(Language::Spanish),
            "sv" => Ok(Language::Swedish),
            _ => Err(FalcataError::language_not_supported(code)),
        }
    }

    /// Resolve a full lowercase language name ("english", "dutch", ...).
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "danish" => Ok(Language::Danish),
            "dutch" => Ok(Language::Dutch),
            "english" => Ok(Language::English),
            "french" => Ok(Language::French),
            "german" => Ok(Language::German),
            "italian" => Ok(Language::Italian),
            "norwegian" => Ok(Language::Norwegian),
            "portuguese" => Ok(Language::Portuguese),
            "russian" => Ok(Language::Russian),
            "spanish" => Ok(Language::Spanish),
            "swedish" => Ok(Language::Swedish),
            _ => Err(FalcataError::language_not_supported(name)),
        }
    }

    /// The lowercase name of this language.
    pub fn name(&self) -> &'static str {
        match self {
            Language::Danish => "danish",
            Language::Dutch => "dutch",
            Language::English => "english",
            Language::French => "french",
            Language::German => "german",
            Language::Italian => "italian",
            Language::Norwegian => "norwegian",
            Language::Portuguese => "portuguese",
            Language::Russian => "russian",
            Language::Spanish => "spanish",
            Language::Swedish => "swedish",
        }
    }

    /// The Snowball stemming algorithm for this language.
    pub fn stemmer_algorithm(&self) -> Algorithm {
        match self {
            Language::Danish => Algorithm::Danish,
            Language::Dutch => Algorithm::Dutch,
            Language::English => Algorithm::English,
            Language::French => Algorithm::French,
            Language::German => Algorithm::German,
            Language::Italian => Algorithm::Italian,
            Language::Norwegian => Algorithm::Norwegian,
            Language::Portuguese => Algorithm::Portuguese,
            Language::Russian => Algorithm::Russian,
            Language::Spanish => Algorithm::Spanish,
            Language::Swedish => Algorithm::Swedish,
        }
    }

    /// The bundled stop-word list for this language.
    ///
    /// Only English ships a list; the stemmer still applies for the other
    /// languages.
    pub fn stop_words(&self) -> &'static [&'static str] {
        match self {
            Language::English => ENGLISH_STOP_WORDS,
            _ => &[],
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::English
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Default English stop words.
static ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "an", "and", "are", "as", "at", "be", "been", "but", "by", "could", "day", "did",
    "down", "each", "find", "first", "for", "from", "get", "go", "had", "has", "have", "he", "her",
    "him", "his", "if", "in", "into", "is", "it", "its", "like", "made", "make", "many", "may",
    "more", "my", "no", "now", "of", "on", "or", "out", "part", "said", "so", "some", "than",
    "that", "the", "their", "them", "then", "these", "they", "this", "time", "to", "two", "up",
    "was", "way", "were", "what", "which", "who", "will", "with", "would",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        assert_eq!(Language::from_code("en").unwrap(), Language::English);
        assert_eq!(Language::from_code("pt").unwrap(), Language::Portuguese);

        let err = Language::from_code("xx").unwrap_err();
        assert_eq!(err.to_string(), "language not supported: xx");
    }

    #[test]
    fn test_from_name_roundtrip() {
        for language in Language::ALL {
            assert_eq!(Language::from_name(language.name()).unwrap(), language);
        }
    }

    #[test]
    fn test_stop_words() {
        assert!(Language::English.stop_words().contains(&"the"));
        assert!(Language::Italian.stop_words().is_empty());
    }

    #[test]
    fn test_default_is_english() {
        assert_eq!(Language::default(), Language::English);
    }
}
