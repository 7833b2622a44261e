//! Criterion benchmarks for the Falcata search engine.
//!
//! Covers the hot paths: analysis, insertion through the writer lane, and
//! the three term-matching modes of the query planner.

use criterion::{criterion_group, criterion_main, Criterion};
use falcata::analysis::{Analyzer, Language, StandardAnalyzer};
use falcata::engine::{EngineConfig, SearchEngine, SearchRequest};
use falcata::schema::Schema;
use serde_json::json;
use std::hint::black_box;

const WORDS: &[&str] = &[
    "search", "engine", "full", "text", "index", "query", "document", "field", "term", "phrase",
    "boolean", "radix", "prefix", "fuzzy", "tolerance", "filter", "planner", "posting", "token",
    "stemming",
];

/// Build an engine loaded with `count` synthetic documents.
fn loaded_engine(count: usize) -> SearchEngine {
    let schema = Schema::builder()
        .text("title")
        .text("body")
        .number("year")
        .boolean("published")
        .build();
    let engine = SearchEngine::new(
        EngineConfig::builder()
            .schema(schema)
            .build()
            .expect("engine config"),
    )
    .expect("engine");

    for i in 0..count {
        let title = format!("{} {}", WORDS[i % WORDS.len()], WORDS[(i * 7) % WORDS.len()]);
        let body = (0..8)
            .map(|j| WORDS[(i + j * 3) % WORDS.len()])
            .collect::<Vec<_>>()
            .join(" ");
        engine
            .insert(
                json!({
                    "title": title,
                    "body": body,
                    "year": 1990 + (i % 35) as i64,
                    "published": i % 2 == 0,
                }),
                None,
            )
            .expect("insert");
    }
    engine.flush();
    engine
}

fn bench_analysis(c: &mut Criterion) {
    let analyzer = StandardAnalyzer::new();
    c.bench_function("analyze_sentence", |b| {
        b.iter(|| {
            analyzer
                .analyze(
                    black_box("The quick brown foxes are searching for tokenized documents"),
                    Language::English,
                )
                .unwrap()
        })
    });
}

fn bench_insert(c: &mut Criterion) {
    c.bench_function("insert_1k_documents", |b| {
        b.iter(|| black_box(loaded_engine(1_000)))
    });
}

fn bench_search(c: &mut Criterion) {
    let engine = loaded_engine(5_000);

    c.bench_function("search_prefix", |b| {
        b.iter(|| engine.search(black_box(SearchRequest::new("sear"))).unwrap())
    });

    c.bench_function("search_exact_filtered", |b| {
        b.iter(|| {
            engine
                .search(black_box(
                    SearchRequest::new("search")
                        .exact(true)
                        .with_where(json!({ "year": { ">=": 2010 }, "published": true })),
                ))
                .unwrap()
        })
    });

    c.bench_function("search_fuzzy_tolerance_1", |b| {
        b.iter(|| {
            engine
                .search(black_box(SearchRequest::new("serach").tolerance(1)))
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_analysis, bench_insert, bench_search);
criterion_main!(benches);
