//! Structured `where` filters.
//!
//! A `where` clause is an object paralleling the schema: bare booleans at
//! boolean leaves, a single-operator comparison object at numeric leaves,
//! nested objects recursing. Normalization turns the tree into two flat
//! bags of lookups (no string encoding, no re-parsing) and validates
//! every referenced path against the schema up front.

use roaring::RoaringBitmap;
use serde_json::Value;

use crate::error::{FalcataError, Result};
use crate::index::numeric::Comparison;
use crate::index::IndexSet;
use crate::schema::{FieldKind, Schema, SchemaNode};

/// A normalized `where` clause: one bag of boolean lookups and one bag of
/// numeric lookups.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterSet {
    booleans: Vec<(String, bool)>,
    numerics: Vec<(String, Comparison, f64)>,
}

impl FilterSet {
    /// Normalize and validate a `where` value against the schema.
    pub fn from_value(clause: &Value, schema: &Schema) -> Result<Self> {
        let Value::Object(map) = clause else {
            return Err(FalcataError::invalid_query_params(
                clause.to_string(),
                "an object paralleling the schema",
            ));
        };

        let mut filter = FilterSet::default();
        collect_lookups(map, schema.fields(), None, &mut filter)?;
        Ok(filter)
    }

    /// The boolean lookups.
    pub fn booleans(&self) -> &[(String, bool)] {
        &self.booleans
    }

    /// The numeric lookups.
    pub fn numerics(&self) -> &[(String, Comparison, f64)] {
        &self.numerics
    }

    /// Check whether the clause constrains anything at all.
    pub fn is_empty(&self) -> bool {
        self.booleans.is_empty() && self.numerics.is_empty()
    }

    /// Evaluate the clause to a filter bitmap.
    ///
    /// Lookups union within each bag; the bags intersect. An empty bag
    /// contributes no constraint, and a fully empty clause evaluates to
    /// `None`, meaning "everything passes", which is not the same as the
    /// empty set.
    pub fn evaluate(&self, indexes: &IndexSet) -> Option<RoaringBitmap> {
        let boolean_hits = if self.booleans.is_empty() {
            None
        } else {
            let mut hits = RoaringBitmap::new();
            for (path, value) in &self.booleans {
                if let Some(index) = indexes.boolean_index(path) {
                    hits |= index.query(*value);
                }
            }
            Some(hits)
        };

        let numeric_hits = if self.numerics.is_empty() {
            None
        } else {
            let mut hits = RoaringBitmap::new();
            for (path, op, target) in &self.numerics {
                if let Some(index) = indexes.numeric_index(path) {
                    hits |= index.query(*op, *target);
                }
            }
            Some(hits)
        };

        match (boolean_hits, numeric_hits) {
            (Some(mut booleans), Some(numerics)) => {
                booleans &= numerics;
                Some(booleans)
            }
            (Some(booleans), None) => Some(booleans),
            (None, Some(numerics)) => Some(numerics),
            (None, None) => None,
        }
    }
}

fn collect_lookups(
    map: &serde_json::Map<String, Value>,
    level: &std::collections::BTreeMap<String, SchemaNode>,
    prefix: Option<&str>,
    out: &mut FilterSet,
) -> Result<()> {
    for (name, value) in map {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{name}"),
            None => name.clone(),
        };

        let node = level.get(name).ok_or_else(|| {
            FalcataError::invalid_query_params(
                format!("{{\"{path}\": ...}}"),
                "a boolean or numeric field declared in the schema",
            )
        })?;

        match node {
            SchemaNode::Field(FieldKind::Boolean) => match value {
                Value::Bool(flag) => out.booleans.push((path, *flag)),
                other => {
                    return Err(FalcataError::invalid_query_params(
                        other.to_string(),
                        format!("a bare boolean for field `{path}`"),
                    ));
                }
            },
            SchemaNode::Field(FieldKind::Number) => {
                out.numerics.push(numeric_lookup(&path, value)?);
            }
            SchemaNode::Field(FieldKind::Text) => {
                return Err(FalcataError::invalid_query_params(
                    format!("{{\"{path}\": ...}}"),
                    "filters apply to boolean and numeric fields only",
                ));
            }
            SchemaNode::Object(inner) => match value {
                Value::Object(inner_map) => {
                    collect_lookups(inner_map, inner, Some(&path), out)?;
                }
                other => {
                    return Err(FalcataError::invalid_query_params(
                        other.to_string(),
                        format!("a nested object for field `{path}`"),
                    ));
                }
            },
        }
    }

    Ok(())
}

fn numeric_lookup(path: &str, value: &Value) -> Result<(String, Comparison, f64)> {
    let Value::Object(comparison) = value else {
        return Err(FalcataError::invalid_query_params(
            value.to_string(),
            format!(
                "an object with one operator in {{{}}} for field `{path}`",
                Comparison::ALLOWED
            ),
        ));
    };

    if comparison.len() != 1 {
        return Err(FalcataError::invalid_query_params(
            value.to_string(),
            format!("exactly one comparison operator for field `{path}`"),
        ));
    }

    let (symbol, target) = comparison
        .iter()
        .next()
        .expect("length checked above");

    let op = Comparison::from_symbol(symbol).ok_or_else(|| {
        FalcataError::invalid_query_params(
            format!("\"{symbol}\""),
            format!("one of {}", Comparison::ALLOWED),
        )
    })?;

    let target = target.as_f64().filter(|n| n.is_finite()).ok_or_else(|| {
        FalcataError::invalid_query_params(
            target.to_string(),
            format!("a finite number for field `{path}`"),
        )
    })?;

    Ok((path.to_string(), op, target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use serde_json::json;

    fn book_schema() -> Schema {
        Schema::builder()
            .text("title")
            .number("year")
            .boolean("inStock")
            .object("meta", |meta| meta.number("pages").boolean("digital"))
            .build()
    }

    #[test]
    fn test_normalizes_nested_lookups() {
        let schema = book_schema();
        let filter = FilterSet::from_value(
            &json!({
                "inStock": true,
                "year": { ">=": 2020 },
                "meta": { "pages": { "<": 300 } },
            }),
            &schema,
        )
        .unwrap();

        assert_eq!(filter.booleans(), &[("inStock".to_string(), true)]);
        assert_eq!(
            filter.numerics(),
            &[
                ("year".to_string(), Comparison::Gte, 2020.0),
                ("meta.pages".to_string(), Comparison::Lt, 300.0),
            ]
        );
    }

    #[test]
    fn test_rejects_two_operators_on_one_field() {
        let schema = book_schema();
        let err = FilterSet::from_value(&json!({ "year": { "<": 2020, ">": 2000 } }), &schema)
            .unwrap_err();
        match err {
            FalcataError::InvalidQueryParams { allowed, .. } => {
                assert!(allowed.contains("exactly one comparison operator"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_unknown_operator_and_fields() {
        let schema = book_schema();

        assert!(FilterSet::from_value(&json!({ "year": { "~": 2020 } }), &schema).is_err());
        assert!(FilterSet::from_value(&json!({ "publisher": true }), &schema).is_err());
        // Text fields are not filterable.
        assert!(FilterSet::from_value(&json!({ "title": "lyra" }), &schema).is_err());
        // Wrong shapes.
        assert!(FilterSet::from_value(&json!({ "inStock": 1 }), &schema).is_err());
        assert!(FilterSet::from_value(&json!({ "year": 2020 }), &schema).is_err());
        assert!(FilterSet::from_value(&json!({ "meta": true }), &schema).is_err());
        assert!(FilterSet::from_value(&json!("inStock"), &schema).is_err());
    }

    #[test]
    fn test_empty_clause_is_unconstrained() {
        let schema = book_schema();
        let filter = FilterSet::from_value(&json!({}), &schema).unwrap();
        assert!(filter.is_empty());

        let indexes = IndexSet::for_schema(&schema);
        assert!(filter.evaluate(&indexes).is_none());
    }

    #[test]
    fn test_evaluate_unions_within_bags_and_intersects_across() {
        let schema = book_schema();
        let mut indexes = IndexSet::for_schema(&schema);
        let tokenize = |_: &str| Ok(Vec::new());

        // doc 0: 2019, in stock; doc 1: 2022, in stock; doc 2: 2022, not in stock.
        for (ordinal, year, in_stock) in [(0, 2019, true), (1, 2022, true), (2, 2022, false)] {
            indexes
                .insert_document(
                    ordinal,
                    &json!({ "year": year, "inStock": in_stock }),
                    &tokenize,
                )
                .unwrap();
        }

        let filter = FilterSet::from_value(
            &json!({ "inStock": true, "year": { ">=": 2020 } }),
            &schema,
        )
        .unwrap();
        let hits = filter.evaluate(&indexes).unwrap();
        assert_eq!(hits.iter().collect::<Vec<_>>(), vec![1]);

        // Numeric-only clause: the boolean bag contributes no constraint.
        let filter = FilterSet::from_value(&json!({ "year": { "=": 2022 } }), &schema).unwrap();
        let hits = filter.evaluate(&indexes).unwrap();
        assert_eq!(hits.iter().collect::<Vec<_>>(), vec![1, 2]);
    }
}
