//! Engine configuration.

use std::sync::Arc;

use crate::analysis::analyzer::{Analyzer, StandardAnalyzer};
use crate::analysis::language::Language;
use crate::error::{FalcataError, Result};
use crate::schema::Schema;

/// Configuration for a [`SearchEngine`](crate::engine::SearchEngine).
///
/// The schema is required; the default language falls back to English and
/// the analyzer to [`StandardAnalyzer`].
#[derive(Clone)]
pub struct EngineConfig {
    pub(crate) schema: Schema,
    pub(crate) default_language: Language,
    pub(crate) analyzer: Arc<dyn Analyzer>,
}

impl EngineConfig {
    /// Start building a configuration.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// The declared schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The language used when a call does not override it.
    pub fn default_language(&self) -> Language {
        self.default_language
    }
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("schema", &self.schema)
            .field("default_language", &self.default_language)
            .field("analyzer", &self.analyzer.name())
            .finish()
    }
}

/// Builder for [`EngineConfig`].
#[derive(Default)]
pub struct EngineConfigBuilder {
    schema: Option<Schema>,
    default_language: Option<Language>,
    analyzer: Option<Arc<dyn Analyzer>>,
}

impl EngineConfigBuilder {
    /// Set the schema (required).
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Set the default language.
    pub fn default_language(mut self, language: Language) -> Self {
        self.default_language = Some(language);
        self
    }

    /// Plug in a custom analyzer.
    pub fn analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Finish building.
    pub fn build(self) -> Result<EngineConfig> {
        let schema = self
            .schema
            .ok_or_else(|| FalcataError::engine("a schema is required"))?;

        Ok(EngineConfig {
            schema,
            default_language: self.default_language.unwrap_or_default(),
            analyzer: self
                .analyzer
                .unwrap_or_else(|| Arc::new(StandardAnalyzer::new())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let schema = Schema::builder().text("title").build();
        let config = EngineConfig::builder().schema(schema).build().unwrap();

        assert_eq!(config.default_language(), Language::English);
        assert_eq!(config.analyzer.name(), "standard");
    }

    #[test]
    fn test_schema_is_required() {
        assert!(EngineConfig::builder().build().is_err());
    }

    #[test]
    fn test_overrides() {
        let schema = Schema::builder().text("title").build();
        let config = EngineConfig::builder()
            .schema(schema)
            .default_language(Language::Spanish)
            .build()
            .unwrap();

        assert_eq!(config.default_language(), Language::Spanish);
    }
}
