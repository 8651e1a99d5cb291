use catalog_core::persist::{save_bundle, IndexPaths};
use catalog_core::{build, BuildStatus, Document, MatchMode, RankingWeights, SearchEngine, SynonymMap};
use serde_json::json;

fn beanie_corpus() -> Vec<Document> {
    vec![serde_json::from_value(json!({
        "url": "u1",
        "title": "Red Wool Beanie",
        "description": "",
        "product_features": {"made in": "Peru"},
        "product_reviews": [{"rating": 4}, {"rating": 5}]
    }))
    .unwrap()]
}

fn engine(docs: Vec<Document>) -> SearchEngine {
    SearchEngine::new(build(docs).bundle, SynonymMap::builtin_origins())
}

#[test]
fn any_query_scores_reviews() {
    let e = engine(beanie_corpus());
    let w = RankingWeights::default();
    let r = e.search("beanie", MatchMode::Any, &w).unwrap();
    assert_eq!(r.metadata.document_count, 1);
    let hit = &r.ranked_documents[0];
    assert_eq!(hit.url, "u1");
    let expected = (4.5 * 0.3 + 2.0 * 0.1) * w.review;
    assert!((hit.scores.review_score - expected).abs() < 1e-12);
    assert_eq!(hit.scores.exact_match_score, 0.0);
    assert!((hit.final_score - hit.scores.final_score()).abs() < 1e-12);
}

#[test]
fn exact_query_matches_title() {
    let e = engine(beanie_corpus());
    let w = RankingWeights::default();
    let r = e.search("Red Wool Beanie", MatchMode::Exact, &w).unwrap();
    assert_eq!(r.metadata.document_count, 1);
    assert_eq!(r.ranked_documents[0].scores.exact_match_score, w.exact_match);
    assert_eq!(r.metadata.search_mode, MatchMode::Exact);
}

#[test]
fn empty_corpus_answers_nothing() {
    let out = build(Vec::new());
    assert_eq!(out.status, BuildStatus::NoData);
    let e = SearchEngine::new(out.bundle, SynonymMap::new());
    for mode in [MatchMode::Any, MatchMode::All, MatchMode::Exact] {
        assert_eq!(e.search("beanie", mode, &RankingWeights::default()).unwrap().metadata.document_count, 0);
    }
}

#[test]
fn blank_queries_are_empty_results() {
    let e = engine(beanie_corpus());
    for q in ["", "   ", "the of and"] {
        for mode in [MatchMode::Any, MatchMode::All, MatchMode::Exact] {
            let r = e.search(q, mode, &RankingWeights::default()).unwrap();
            assert_eq!(r.metadata.document_count, 0, "{q:?} {mode}");
            assert!(r.ranked_documents.is_empty());
        }
    }
}

#[test]
fn origin_synonym_query_boosts_origin_match() {
    let docs = vec![
        serde_json::from_value(json!({"url": "a", "title": "Cat-Ear Beanie", "product_features": {"made in": "USA"}})).unwrap(),
        serde_json::from_value(json!({"url": "b", "title": "Cat-Ear Beanie", "product_features": {"made in": "China"}})).unwrap(),
    ];
    let e = engine(docs);
    let r = e.search("beanie america", MatchMode::Any, &RankingWeights::default()).unwrap();
    assert_eq!(r.metadata.document_count, 2);
    assert_eq!(r.ranked_documents[0].url, "a");
    assert!(r.ranked_documents[0].scores.origin_match_score > 0.0);
    assert_eq!(r.ranked_documents[1].scores.origin_match_score, 0.0);
}

#[test]
fn ties_break_on_url() {
    let docs = ["c", "a", "b"]
        .iter()
        .map(|u| serde_json::from_value(json!({"url": u, "title": "Plain Mug"})).unwrap())
        .collect();
    let r = engine(docs).search("mug", MatchMode::All, &RankingWeights::default()).unwrap();
    let urls: Vec<_> = r.ranked_documents.iter().map(|d| d.url.as_str()).collect();
    assert_eq!(urls, vec!["a", "b", "c"]);
}

#[test]
fn open_from_disk_and_search_concurrently() {
    let dir = tempfile::tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    save_bundle(&paths, &build(beanie_corpus()).bundle).unwrap();
    let e = SearchEngine::open(&paths, SynonymMap::builtin_origins()).unwrap();

    std::thread::scope(|s| {
        for q in ["beanie", "wool", "peruvian"] {
            let e = e.clone();
            s.spawn(move || {
                let r = e.search(q, MatchMode::Any, &RankingWeights::default()).unwrap();
                assert_eq!(r.metadata.document_count, 1, "{q}");
            });
        }
    });
}

#[test]
fn open_refuses_incomplete_folder() {
    let dir = tempfile::tempdir().unwrap();
    let err = SearchEngine::open(&IndexPaths::new(dir.path()), SynonymMap::new()).unwrap_err();
    assert!(matches!(err, catalog_core::CatalogError::MissingIndexFile { .. }));
}

#[test]
fn search_rejects_invalid_weights() {
    let e = engine(beanie_corpus());
    let negative = RankingWeights { review: -0.3, ..RankingWeights::default() };
    match e.search("beanie", MatchMode::Any, &negative) {
        Err(catalog_core::CatalogError::InvalidWeights { name, .. }) => assert_eq!(name, "review"),
        other => panic!("expected InvalidWeights, got {other:?}"),
    }
    let nan = RankingWeights { bm25: f64::NAN, ..RankingWeights::default() };
    assert!(e.search("", MatchMode::Exact, &nan).is_err());
}
