use catalog_core::{build, Document, MatchMode, RankingWeights, SearchEngine, SynonymMap};
use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::json;

const ADJECTIVES: &[&str] = &["red", "blue", "wool", "cotton", "dark", "soft", "classic", "mini"];
const NOUNS: &[&str] = &["beanie", "scarf", "chocolate", "candy", "mug", "sandals", "boots", "tea"];
const ORIGINS: &[&str] = &["Peru", "USA", "China", "Italy", "France"];

fn corpus(n: usize) -> Vec<Document> {
    (0..n)
        .map(|i| {
            let rating = (i % 5) as f64 + 1.0;
            let title = format!("{} {} {}", ADJECTIVES[i % 8], ADJECTIVES[(i / 8) % 8], NOUNS[i % 7]);
            serde_json::from_value(json!({
                "url": format!("https://shop.dev/product/{i}"),
                "title": title,
                "description": format!("A {} {} for every day", ADJECTIVES[(i * 3) % 8], NOUNS[(i * 5) % 8]),
                "product_features": {"made in": ORIGINS[i % 5]},
                "product_reviews": [{"rating": rating}],
            }))
            .expect("valid document")
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let docs = corpus(2_000);
    c.bench_function("build_2000_docs", |b| b.iter(|| build(docs.clone())));
}

fn bench_search(c: &mut Criterion) {
    let engine = SearchEngine::new(build(corpus(2_000)).bundle, SynonymMap::builtin_origins());
    let w = RankingWeights::default();
    c.bench_function("search_any", |b| b.iter(|| engine.search("wool beanie america", MatchMode::Any, &w).unwrap()));
    c.bench_function("search_all", |b| b.iter(|| engine.search("dark chocolate", MatchMode::All, &w).unwrap()));
}

criterion_group!(benches, bench_build, bench_search);
criterion_main!(benches);
