//! The search algorithm.
//!
//! A query walks tokens × selected text paths. Every (token, path) pair
//! yields a candidate bitmap from the radix tree, which is intersected with
//! the filter set, stripped of documents already seen, counted, and
//! streamed into the hit list under the global offset/limit window. The
//! walk never stops early: `count` is the exact number of distinct matching
//! documents even when only a page of hits is returned.
//!
//! Ordering is deterministic for identical engine state: tokens in
//! first-occurrence order of the analyzed term, then property order (schema
//! order when all properties are selected), then matched tokens in
//! lexicographic order, then ascending insertion ordinal.

use roaring::RoaringBitmap;
use serde::Serialize;
use serde_json::Value;

use crate::document::DocumentTable;
use crate::error::{FalcataError, Result};
use crate::index::radix::TermSearch;
use crate::index::IndexSet;
use crate::query::filter::FilterSet;
use crate::schema::Schema;

/// A single search hit: the document id and the stored document.
#[derive(Clone, Debug, Serialize)]
pub struct Hit {
    /// The opaque id returned from `insert`.
    pub id: String,
    /// The document exactly as inserted.
    pub document: Value,
}

/// Resolved inputs of one search execution.
#[derive(Clone, Debug)]
pub struct QueryPlan<'a> {
    /// Normalized tokens of the search term, in first-occurrence order.
    pub tokens: &'a [String],
    /// Text paths to search; `None` selects every text path.
    pub properties: Option<&'a [String]>,
    /// Maximum number of hits to return.
    pub limit: usize,
    /// Number of matching documents to skip globally.
    pub offset: usize,
    /// Whole-token matching only.
    pub exact: bool,
    /// Maximum edit distance; 0 means prefix matching.
    pub tolerance: u32,
    /// The structured `where` clause.
    pub where_clause: Option<&'a Value>,
}

/// Execute a plan against the indices and the document table.
///
/// Returns the total count of distinct matching documents and the projected
/// page of hits.
pub fn execute(
    plan: &QueryPlan<'_>,
    schema: &Schema,
    indexes: &IndexSet,
    docs: &DocumentTable,
) -> Result<(usize, Vec<Hit>)> {
    let properties = resolve_properties(plan.properties, schema)?;

    let filter = match plan.where_clause {
        Some(clause) => FilterSet::from_value(clause, schema)?.evaluate(indexes),
        None => None,
    };

    let mut seen = RoaringBitmap::new();
    let mut page = Vec::new();
    let mut count = 0usize;
    let mut skipped = 0usize;

    for token in plan.tokens {
        for path in &properties {
            let Some(index) = indexes.text_index(path) else {
                continue;
            };

            let matches = index.find(&TermSearch {
                term: token,
                exact: plan.exact,
                tolerance: plan.tolerance,
            });

            let mut candidates = RoaringBitmap::new();
            for postings in matches.values() {
                candidates |= postings;
            }
            if let Some(filter) = &filter {
                candidates &= filter;
            }
            candidates -= &seen;

            count += candidates.len() as usize;
            seen |= &candidates;

            for ordinal in candidates.iter() {
                if skipped < plan.offset {
                    skipped += 1;
                    continue;
                }
                if page.len() >= plan.limit {
                    break;
                }
                page.push(ordinal);
            }
        }
    }

    // Project through the document table. A missing entry means the search
    // raced an in-flight write; the hit is dropped rather than fabricated.
    let hits = page
        .into_iter()
        .filter_map(|ordinal| {
            docs.get(ordinal).map(|stored| Hit {
                id: stored.id.clone(),
                document: stored.document.clone(),
            })
        })
        .collect();

    Ok((count, hits))
}

fn resolve_properties(
    requested: Option<&[String]>,
    schema: &Schema,
) -> Result<Vec<String>> {
    let known = schema.text_paths();
    match requested {
        None => Ok(known),
        Some(list) => {
            for name in list {
                if !known.contains(name) {
                    return Err(FalcataError::invalid_property(name, known));
                }
            }
            Ok(list.to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::language::Language;
    use serde_json::json;

    fn tokenize(text: &str) -> Result<Vec<String>> {
        let mut seen = std::collections::HashSet::new();
        Ok(text
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .filter(|w| seen.insert(w.clone()))
            .collect())
    }

    struct Fixture {
        schema: Schema,
        indexes: IndexSet,
        docs: DocumentTable,
    }

    fn fixture(documents: &[Value]) -> Fixture {
        let schema = Schema::builder()
            .text("title")
            .text("summary")
            .number("year")
            .boolean("inStock")
            .build();
        let mut indexes = IndexSet::for_schema(&schema);
        let mut docs = DocumentTable::new();

        for (ordinal, document) in documents.iter().enumerate() {
            let ordinal = ordinal as u32;
            indexes
                .insert_document(ordinal, document, &tokenize)
                .unwrap();
            docs.insert(
                ordinal,
                format!("doc-{ordinal}"),
                document.clone(),
                Language::English,
            );
        }

        Fixture {
            schema,
            indexes,
            docs,
        }
    }

    fn plan<'a>(tokens: &'a [String]) -> QueryPlan<'a> {
        QueryPlan {
            tokens,
            properties: None,
            limit: 10,
            offset: 0,
            exact: false,
            tolerance: 0,
            where_clause: None,
        }
    }

    fn run(fixture: &Fixture, plan: &QueryPlan<'_>) -> (usize, Vec<String>) {
        let (count, hits) = execute(plan, &fixture.schema, &fixture.indexes, &fixture.docs).unwrap();
        (count, hits.into_iter().map(|h| h.id).collect())
    }

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_matches_across_all_text_paths() {
        let fixture = fixture(&[
            json!({ "title": "lyra book", "year": 2022, "inStock": true }),
            json!({ "summary": "about lyra", "year": 2019, "inStock": false }),
            json!({ "title": "unrelated", "year": 2020, "inStock": true }),
        ]);

        let tokens = toks(&["lyra"]);
        let (count, ids) = run(&fixture, &plan(&tokens));
        assert_eq!(count, 2);
        // Property order is lexicographic when all paths are selected, so
        // the summary hit streams before the title hit.
        assert_eq!(ids, vec!["doc-1", "doc-0"]);
    }

    #[test]
    fn test_no_duplicate_ids_across_tokens_and_paths() {
        // Both tokens hit the same document through two fields.
        let fixture = fixture(&[
            json!({ "title": "lyra song", "summary": "lyra song again" }),
        ]);

        let tokens = toks(&["lyra", "song"]);
        let (count, ids) = run(&fixture, &plan(&tokens));
        assert_eq!(count, 1);
        assert_eq!(ids, vec!["doc-0"]);
    }

    #[test]
    fn test_count_is_global_while_page_is_bounded() {
        let documents: Vec<Value> = (0..7)
            .map(|i| json!({ "title": format!("lyra volume {i}") }))
            .collect();
        let fixture = fixture(&documents);

        let tokens = toks(&["lyra"]);
        let mut paged = plan(&tokens);
        paged.limit = 2;
        paged.offset = 1;

        let (count, ids) = run(&fixture, &paged);
        assert_eq!(count, 7);
        assert_eq!(ids, vec!["doc-1", "doc-2"]);
    }

    #[test]
    fn test_offset_spans_token_boundaries() {
        let fixture = fixture(&[
            json!({ "title": "alpha" }),
            json!({ "title": "beta" }),
            json!({ "title": "beta alpha" }),
        ]);

        // "alpha" matches docs 0 and 2, then "beta" adds doc 1.
        let tokens = toks(&["alpha", "beta"]);
        let mut paged = plan(&tokens);
        paged.limit = 2;
        paged.offset = 2;

        let (count, ids) = run(&fixture, &paged);
        assert_eq!(count, 3);
        assert_eq!(ids, vec!["doc-1"]);
    }

    #[test]
    fn test_where_filter_intersects_text_hits() {
        let fixture = fixture(&[
            json!({ "title": "lyra book", "year": 2022, "inStock": true }),
            json!({ "title": "lyra cookbook", "year": 2019, "inStock": false }),
        ]);

        let tokens = toks(&["lyra"]);
        let clause = json!({ "year": { ">=": 2020 } });
        let mut filtered = plan(&tokens);
        filtered.where_clause = Some(&clause);

        let (count, ids) = run(&fixture, &filtered);
        assert_eq!(count, 1);
        assert_eq!(ids, vec!["doc-0"]);

        let clause = json!({ "inStock": true });
        let mut filtered = plan(&tokens);
        filtered.where_clause = Some(&clause);
        let (_, ids) = run(&fixture, &filtered);
        assert_eq!(ids, vec!["doc-0"]);
    }

    #[test]
    fn test_malformed_where_fails_before_matching() {
        let fixture = fixture(&[json!({ "title": "lyra" })]);

        let tokens: Vec<String> = Vec::new();
        let clause = json!({ "year": { "<": 2020, ">": 2000 } });
        let mut bad = plan(&tokens);
        bad.where_clause = Some(&clause);

        let err = execute(&bad, &fixture.schema, &fixture.indexes, &fixture.docs).unwrap_err();
        match err {
            FalcataError::InvalidQueryParams { .. } => {}
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_property_is_rejected() {
        let fixture = fixture(&[json!({ "title": "lyra" })]);

        let tokens = toks(&["lyra"]);
        let properties = vec!["body".to_string()];
        let mut bad = plan(&tokens);
        bad.properties = Some(&properties);

        let err = execute(&bad, &fixture.schema, &fixture.indexes, &fixture.docs).unwrap_err();
        match err {
            FalcataError::InvalidProperty { name, known } => {
                assert_eq!(name, "body");
                assert_eq!(known, vec!["summary".to_string(), "title".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_property_subset_restricts_matching() {
        let fixture = fixture(&[
            json!({ "title": "lyra" }),
            json!({ "summary": "lyra" }),
        ]);

        let tokens = toks(&["lyra"]);
        let properties = vec!["title".to_string()];
        let mut restricted = plan(&tokens);
        restricted.properties = Some(&properties);

        let (count, ids) = run(&fixture, &restricted);
        assert_eq!(count, 1);
        assert_eq!(ids, vec!["doc-0"]);
    }

    #[test]
    fn test_exact_and_fuzzy_modes() {
        let fixture = fixture(&[
            json!({ "title": "lyra" }),
            json!({ "title": "lyrae" }),
        ]);

        let tokens = toks(&["lyra"]);
        let mut exact = plan(&tokens);
        exact.exact = true;
        let (count, ids) = run(&fixture, &exact);
        assert_eq!(count, 1);
        assert_eq!(ids, vec!["doc-0"]);

        // Prefix mode picks up "lyrae" too.
        let (count, _) = run(&fixture, &plan(&tokens));
        assert_eq!(count, 2);

        let typo = toks(&["lira"]);
        let mut fuzzy = plan(&typo);
        fuzzy.tolerance = 1;
        let (count, ids) = run(&fixture, &fuzzy);
        assert_eq!(count, 1);
        assert_eq!(ids, vec!["doc-0"]);
    }

    #[test]
    fn test_empty_token_list_matches_nothing() {
        let fixture = fixture(&[json!({ "title": "lyra" })]);
        let tokens: Vec<String> = Vec::new();
        let (count, ids) = run(&fixture, &plan(&tokens));
        assert_eq!(count, 0);
        assert!(ids.is_empty());
    }
}
