//! Error types for the Falcata library.
//!
//! All failures are represented by the [`FalcataError`] enum. Validation
//! errors carry the offending value so callers can report precisely what was
//! rejected; writer-side failures are fatal for the item that triggered them
//! and are never retried inside the engine.
//!
//! # Examples
//!
//! ```
//! use falcata::error::{FalcataError, Result};
//!
//! fn check_language(code: &str) -> Result<()> {
//!     Err(FalcataError::language_not_supported(code))
//! }
//!
//! assert!(check_language("tlh").is_err());
//! ```

use thiserror::Error;

/// The main error type for Falcata operations.
#[derive(Error, Debug)]
pub enum FalcataError {
    /// The requested language is not in the supported set.
    #[error("language not supported: {language}")]
    LanguageNotSupported {
        /// The language code or name that was requested.
        language: String,
    },

    /// The schema declaration contains a value that is neither a nested
    /// object nor one of the known leaf types.
    #[error("invalid schema type: {found}")]
    InvalidSchemaType {
        /// A rendering of the unrecognized schema value.
        found: String,
    },

    /// An inserted document does not conform to the schema.
    #[error("document does not match schema: {reason}")]
    InvalidDocSchema {
        /// What the validator rejected.
        reason: String,
    },

    /// A search referenced a text property that is not in the schema.
    #[error("invalid property: {name} (known properties: {})", .known.join(", "))]
    InvalidProperty {
        /// The unknown property name.
        name: String,
        /// The text properties the schema actually declares.
        known: Vec<String>,
    },

    /// A `where` expression is malformed.
    #[error("invalid query parameter: {value} (allowed: {allowed})")]
    InvalidQueryParams {
        /// A rendering of the rejected value.
        value: String,
        /// What would have been accepted in its place.
        allowed: String,
    },

    /// A delete targeted a document id the engine has never accepted.
    #[error("document id does not exist: {id}")]
    DocIdDoesNotExist {
        /// The unknown id.
        id: String,
    },

    /// The radix tree reported a missing posting during removal. Fatal for
    /// the item; indicates index/table disagreement.
    #[error("failed to remove index entry for document {id}: field {field}, token {token}")]
    IndexRemovalFailure {
        /// Public id of the document being removed.
        id: String,
        /// Flat path of the text field.
        field: String,
        /// The token whose posting was missing.
        token: String,
    },

    /// Writer-lane lifecycle errors (channel closed, thread gone).
    #[error("engine error: {0}")]
    Engine(String),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for operations that may fail with [`FalcataError`].
pub type Result<T> = std::result::Result<T, FalcataError>;

impl FalcataError {
    /// Create a new language-not-supported error.
    pub fn language_not_supported<S: Into<String>>(language: S) -> Self {
        FalcataError::LanguageNotSupported {
            language: language.into(),
        }
    }

    /// Create a new invalid-schema-type error.
    pub fn invalid_schema_type<S: Into<String>>(found: S) -> Self {
        FalcataError::InvalidSchemaType {
            found: found.into(),
        }
    }

    /// Create a new document-validation error.
    pub fn invalid_doc_schema<S: Into<String>>(reason: S) -> Self {
        FalcataError::InvalidDocSchema {
            reason: reason.into(),
        }
    }

    /// Create a new invalid-property error.
    pub fn invalid_property<S: Into<String>>(name: S, known: Vec<String>) -> Self {
        FalcataError::InvalidProperty {
            name: name.into(),
            known,
        }
    }

    /// Create a new invalid-query-params error.
    pub fn invalid_query_params<V: Into<String>, A: Into<String>>(value: V, allowed: A) -> Self {
        FalcataError::InvalidQueryParams {
            value: value.into(),
            allowed: allowed.into(),
        }
    }

    /// Create a new unknown-document-id error.
    pub fn doc_id_does_not_exist<S: Into<String>>(id: S) -> Self {
        FalcataError::DocIdDoesNotExist { id: id.into() }
    }

    /// Create a new index-removal failure.
    pub fn index_removal_failure<I, F, T>(id: I, field: F, token: T) -> Self
    where
        I: Into<String>,
        F: Into<String>,
        T: Into<String>,
    {
        FalcataError::IndexRemovalFailure {
            id: id.into(),
            field: field.into(),
            token: token.into(),
        }
    }

    /// Create a new engine lifecycle error.
    pub fn engine<S: Into<String>>(msg: S) -> Self {
        FalcataError::Engine(msg.into())
    }
}
