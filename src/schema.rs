//! Schema management for document structure definition.
//!
//! A schema is a tree: internal nodes are maps from field name to sub-schema
//! and leaves are typed as text, number, or boolean. The schema is fixed at
//! engine construction; every index is keyed by the *flat path* of a leaf,
//! the dotted concatenation of field names from the root (`author.name`).

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::error::{FalcataError, Result};

/// The type of a schema leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Full-text searchable string field.
    Text,
    /// Finite numeric field, filterable with comparison operators.
    Number,
    /// Boolean field, filterable by value.
    Boolean,
}

impl FieldKind {
    /// The schema spelling of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A node in the schema tree.
#[derive(Clone, Debug, PartialEq)]
pub enum SchemaNode {
    /// A typed leaf.
    Field(FieldKind),
    /// A nested object with its own fields.
    Object(BTreeMap<String, SchemaNode>),
}

/// A schema defines the structure of the documents in an engine.
///
/// # Examples
///
/// ```
/// use falcata::schema::Schema;
/// use serde_json::json;
///
/// let schema = Schema::from_value(&json!({
///     "title": "text",
///     "year": "number",
///     "author": { "name": "text" },
/// })).unwrap();
///
/// assert_eq!(schema.text_paths(), vec!["author.name", "title"]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Schema {
    root: BTreeMap<String, SchemaNode>,
}

impl Schema {
    /// Build a schema from a JSON declaration.
    ///
    /// Leaves are declared with the strings `"text"`, `"number"`, or
    /// `"boolean"`; nested objects recurse. Anything else fails with
    /// `InvalidSchemaType`.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Schema {
                root: parse_object(map)?,
            }),
            other => Err(FalcataError::invalid_schema_type(other.to_string())),
        }
    }

    /// Start building a schema programmatically.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// The top-level fields of the schema.
    pub fn fields(&self) -> &BTreeMap<String, SchemaNode> {
        &self.root
    }

    /// Check whether the schema declares no fields.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// All flat leaf paths with their kinds, in lexicographic order.
    pub fn flat_paths(&self) -> Vec<(String, FieldKind)> {
        let mut paths = Vec::new();
        collect_paths(&self.root, None, &mut paths);
        paths
    }

    /// All text leaf paths, in lexicographic order.
    pub fn text_paths(&self) -> Vec<String> {
        self.flat_paths()
            .into_iter()
            .filter(|(_, kind)| *kind == FieldKind::Text)
            .map(|(path, _)| path)
            .collect()
    }

    /// Look up the kind of the leaf at a flat path, if there is one.
    pub fn leaf_kind(&self, path: &str) -> Option<FieldKind> {
        let mut level = &self.root;
        let mut parts = path.split('.').peekable();

        while let Some(part) = parts.next() {
            match level.get(part)? {
                SchemaNode::Field(kind) => {
                    return if parts.peek().is_none() {
                        Some(*kind)
                    } else {
                        None
                    };
                }
                SchemaNode::Object(inner) => {
                    if parts.peek().is_none() {
                        return None;
                    }
                    level = inner;
                }
            }
        }

        None
    }

    /// Validate a document against the schema.
    ///
    /// Every key present in the document must exist in the schema, leaf
    /// types must match, and nested objects recurse; failures from nested
    /// levels propagate. Fields declared in the schema may be absent from
    /// the document. Numbers must be finite.
    pub fn validate_document(&self, document: &Value) -> Result<()> {
        match document {
            Value::Object(map) => validate_object(&self.root, map, None),
            other => Err(FalcataError::invalid_doc_schema(format!(
                "expected an object, got {other}"
            ))),
        }
    }
}

fn parse_object(map: &serde_json::Map<String, Value>) -> Result<BTreeMap<String, SchemaNode>> {
    let mut fields = BTreeMap::new();

    for (name, value) in map {
        if name.is_empty() {
            return Err(FalcataError::invalid_schema_type(
                "field name cannot be empty",
            ));
        }

        let node = match value {
            Value::String(kind) => match kind.as_str() {
                "text" => SchemaNode::Field(FieldKind::Text),
                "number" => SchemaNode::Field(FieldKind::Number),
                "boolean" => SchemaNode::Field(FieldKind::Boolean),
                other => {
                    return Err(FalcataError::invalid_schema_type(format!(
                        "\"{other}\""
                    )));
                }
            },
            Value::Object(inner) => SchemaNode::Object(parse_object(inner)?),
            other => return Err(FalcataError::invalid_schema_type(other.to_string())),
        };

        fields.insert(name.clone(), node);
    }

    Ok(fields)
}

fn collect_paths(
    level: &BTreeMap<String, SchemaNode>,
    prefix: Option<&str>,
    out: &mut Vec<(String, FieldKind)>,
) {
    for (name, node) in level {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{name}"),
            None => name.clone(),
        };
        match node {
            SchemaNode::Field(kind) => out.push((path, *kind)),
            SchemaNode::Object(inner) => collect_paths(inner, Some(&path), out),
        }
    }
}

fn validate_object(
    level: &BTreeMap<String, SchemaNode>,
    map: &serde_json::Map<String, Value>,
    prefix: Option<&str>,
) -> Result<()> {
    for (name, value) in map {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{name}"),
            None => name.clone(),
        };

        let node = level.get(name).ok_or_else(|| {
            FalcataError::invalid_doc_schema(format!("unknown field `{path}`"))
        })?;

        match node {
            SchemaNode::Field(FieldKind::Text) => {
                if !value.is_string() {
                    return Err(type_mismatch(&path, FieldKind::Text, value));
                }
            }
            SchemaNode::Field(FieldKind::Number) => {
                let finite = value.as_f64().map(f64::is_finite).unwrap_or(false);
                if !finite {
                    return Err(type_mismatch(&path, FieldKind::Number, value));
                }
            }
            SchemaNode::Field(FieldKind::Boolean) => {
                if !value.is_boolean() {
                    return Err(type_mismatch(&path, FieldKind::Boolean, value));
                }
            }
            SchemaNode::Object(inner) => match value {
                Value::Object(inner_map) => validate_object(inner, inner_map, Some(&path))?,
                other => {
                    return Err(FalcataError::invalid_doc_schema(format!(
                        "field `{path}` expected a nested object, got {other}"
                    )));
                }
            },
        }
    }

    Ok(())
}

fn type_mismatch(path: &str, expected: FieldKind, got: &Value) -> FalcataError {
    FalcataError::invalid_doc_schema(format!("field `{path}` expected {expected}, got {got}"))
}

/// Builder for declaring a [`Schema`] in code.
///
/// # Examples
///
/// ```
/// use falcata::schema::Schema;
///
/// let schema = Schema::builder()
///     .text("title")
///     .number("year")
///     .boolean("inStock")
///     .object("author", |author| author.text("name"))
///     .build();
///
/// assert_eq!(schema.text_paths(), vec!["author.name", "title"]);
/// ```
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: BTreeMap<String, SchemaNode>,
}

impl SchemaBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        SchemaBuilder {
            fields: BTreeMap::new(),
        }
    }

    /// Declare a text leaf.
    pub fn text<S: Into<String>>(mut self, name: S) -> Self {
        self.fields
            .insert(name.into(), SchemaNode::Field(FieldKind::Text));
        self
    }

    /// Declare a numeric leaf.
    pub fn number<S: Into<String>>(mut self, name: S) -> Self {
        self.fields
            .insert(name.into(), SchemaNode::Field(FieldKind::Number));
        self
    }

    /// Declare a boolean leaf.
    pub fn boolean<S: Into<String>>(mut self, name: S) -> Self {
        self.fields
            .insert(name.into(), SchemaNode::Field(FieldKind::Boolean));
        self
    }

    /// Declare a nested object.
    pub fn object<S, F>(mut self, name: S, build: F) -> Self
    where
        S: Into<String>,
        F: FnOnce(SchemaBuilder) -> SchemaBuilder,
    {
        let inner = build(SchemaBuilder::new());
        self.fields
            .insert(name.into(), SchemaNode::Object(inner.fields));
        self
    }

    /// Finish building.
    pub fn build(self) -> Schema {
        Schema { root: self.fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn book_schema() -> Schema {
        Schema::from_value(&json!({
            "title": "text",
            "year": "number",
            "inStock": "boolean",
            "author": { "name": "text" },
        }))
        .unwrap()
    }

    #[test]
    fn test_from_value_flat_paths() {
        let schema = book_schema();
        let paths = schema.flat_paths();
        let names: Vec<&str> = paths.iter().map(|(p, _)| p.as_str()).collect();

        assert_eq!(names, vec!["author.name", "inStock", "title", "year"]);
        assert_eq!(schema.leaf_kind("author.name"), Some(FieldKind::Text));
        assert_eq!(schema.leaf_kind("year"), Some(FieldKind::Number));
        assert_eq!(schema.leaf_kind("author"), None);
        assert_eq!(schema.leaf_kind("missing"), None);
    }

    #[test]
    fn test_from_value_rejects_unknown_leaf() {
        let err = Schema::from_value(&json!({ "title": "string" })).unwrap_err();
        match err {
            FalcataError::InvalidSchemaType { found } => assert_eq!(found, "\"string\""),
            other => panic!("unexpected error: {other}"),
        }

        assert!(Schema::from_value(&json!({ "title": 42 })).is_err());
        assert!(Schema::from_value(&json!("text")).is_err());
    }

    #[test]
    fn test_builder_matches_json_declaration() {
        let built = Schema::builder()
            .text("title")
            .number("year")
            .boolean("inStock")
            .object("author", |author| author.text("name"))
            .build();

        assert_eq!(built, book_schema());
    }

    #[test]
    fn test_validate_document_accepts_conforming() {
        let schema = book_schema();
        schema
            .validate_document(&json!({
                "title": "The Lyra Book",
                "year": 2022,
                "inStock": true,
                "author": { "name": "N. K. Lyra" },
            }))
            .unwrap();

        // Partial documents are fine.
        schema.validate_document(&json!({ "title": "Solo" })).unwrap();
    }

    #[test]
    fn test_validate_document_rejects_type_mismatch() {
        let schema = book_schema();
        assert!(schema.validate_document(&json!({ "title": 42 })).is_err());
        assert!(schema.validate_document(&json!({ "year": "2022" })).is_err());
        assert!(schema.validate_document(&json!({ "inStock": "yes" })).is_err());
        assert!(schema.validate_document(&json!({ "author": "Lyra" })).is_err());
    }

    #[test]
    fn test_validate_document_rejects_unknown_keys() {
        let schema = book_schema();
        let err = schema
            .validate_document(&json!({ "publisher": "Foxglove" }))
            .unwrap_err();
        assert!(err.to_string().contains("publisher"));
    }

    #[test]
    fn test_validate_document_propagates_nested_failures() {
        let schema = book_schema();
        // The failure is two levels down and must not be swallowed.
        let err = schema
            .validate_document(&json!({ "author": { "name": 7 } }))
            .unwrap_err();
        assert!(err.to_string().contains("author.name"));

        let err = schema
            .validate_document(&json!({ "author": { "born": 1950 } }))
            .unwrap_err();
        assert!(err.to_string().contains("author.born"));
    }
}
