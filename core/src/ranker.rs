//! Multi-signal document scoring.
//!
//! The final score is the plain sum of five weighted components. Nothing is
//! normalized across documents beyond what BM25 itself does.

use crate::document::Document;
use crate::error::{CatalogError, Result};
use crate::index::{IndexBundle, ReviewAggregate};
use crate::matcher::{is_exact_match, normalize_exact};
use crate::query::ParsedQuery;
use crate::tokenizer::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const BM25_K1: f64 = 1.5;
pub const BM25_B: f64 = 0.75;
/// Fixed stand-in for the corpus average length. Not recomputed per corpus.
pub const ASSUMED_AVG_DOC_LENGTH: f64 = 300.0;

pub const REVIEW_RATING_FACTOR: f64 = 0.3;
pub const REVIEW_COUNT_FACTOR: f64 = 0.1;
pub const REVIEW_COUNT_CAP: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
    pub bm25: f64,
    pub exact_match: f64,
    pub review: f64,
    pub title_match: f64,
    pub origin_match: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self { bm25: 0.4, exact_match: 2.0, review: 0.3, title_match: 0.2, origin_match: 0.1 }
    }
}

impl RankingWeights {
    /// Every coefficient must be finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("bm25", self.bm25),
            ("exact_match", self.exact_match),
            ("review", self.review),
            ("title_match", self.title_match),
            ("origin_match", self.origin_match),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(CatalogError::InvalidWeights { name, value });
            }
        }
        Ok(())
    }
}

/// Weighted components of one document's score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub bm25_score: f64,
    pub exact_match_score: f64,
    pub review_score: f64,
    pub title_match_score: f64,
    pub origin_match_score: f64,
}

impl ComponentScores {
    pub fn final_score(&self) -> f64 {
        self.bm25_score + self.exact_match_score + self.review_score + self.title_match_score + self.origin_match_score
    }
}

/// Score one document. Pure in (bundle statistics, document, query, weights).
pub fn rank(bundle: &IndexBundle, url: &str, doc: &Document, query: &ParsedQuery, weights: &RankingWeights) -> ComponentScores {
    let needle = normalize_exact(&query.raw);
    ComponentScores {
        bm25_score: bm25(bundle, doc, query) * weights.bm25,
        exact_match_score: if !needle.is_empty() && is_exact_match(doc, &needle) { weights.exact_match } else { 0.0 },
        review_score: bundle.reviews.get(url).map(review_quality).unwrap_or(0.0) * weights.review,
        title_match_score: title_overlap(doc, query) as f64 * weights.title_match,
        origin_match_score: if origin_in_query(doc, query) { weights.origin_match } else { 0.0 },
    }
}

/// Okapi BM25 over title+description, summed over the expanded tokens.
///
/// idf is `ln((N - df + 0.5) / (df + 0.5))` and is left unclamped: a term in
/// more than half of the documents lowers the score. Tokens absent from both
/// positional indices are skipped.
pub fn bm25(bundle: &IndexBundle, doc: &Document, query: &ParsedQuery) -> f64 {
    let doc_tokens = tokenize(&format!("{} {}", doc.title(), doc.description()));
    let doc_len = doc_tokens.len() as f64;
    let n = bundle.num_docs() as f64;
    let norm = BM25_K1 * (1.0 - BM25_B + BM25_B * doc_len / ASSUMED_AVG_DOC_LENGTH);

    let mut score = 0.0;
    for token in &query.expanded {
        let df = bundle.doc_freq(token);
        if df == 0 { continue; }
        let df = df as f64;
        let idf = ((n - df + 0.5) / (df + 0.5)).ln();
        let tf = doc_tokens.iter().filter(|t| *t == token).count() as f64;
        score += idf * (tf * (BM25_K1 + 1.0)) / (tf + norm);
    }
    score
}

/// Unweighted review quality: rating dominates, review volume adds a capped bonus.
pub fn review_quality(agg: &ReviewAggregate) -> f64 {
    agg.average_rating * REVIEW_RATING_FACTOR + agg.total_reviews.min(REVIEW_COUNT_CAP) as f64 * REVIEW_COUNT_FACTOR
}

/// Expanded query tokens that also occur in the tokenized title.
pub fn title_overlap(doc: &Document, query: &ParsedQuery) -> usize {
    let title: HashSet<String> = tokenize(doc.title()).into_iter().collect();
    query.expanded.iter().filter(|t| title.contains(*t)).count()
}

/// The lowercased origin value is literally one of the expanded tokens.
pub fn origin_in_query(doc: &Document, query: &ParsedQuery) -> bool {
    doc.origin().is_some_and(|o| query.expanded.contains(&o.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::synonyms::SynonymMap;
    use serde_json::json;

    fn docs(values: Vec<serde_json::Value>) -> IndexBundle {
        build(values.into_iter().map(|v| serde_json::from_value(v).unwrap()).collect()).bundle
    }

    #[test]
    fn idf_negative_for_ubiquitous_term() {
        let b = docs(vec![json!({"url": "a", "title": "wool hat"}), json!({"url": "b", "title": "wool scarf"})]);
        let q = ParsedQuery::parse("wool", &SynonymMap::new());
        let s = bm25(&b, b.document("a").unwrap(), &q);
        assert!(s < 0.0, "idf should stay negative, got {s}");
    }

    #[test]
    fn bm25_matches_closed_form() {
        let b = docs(vec![
            json!({"url": "a", "title": "wool hat", "description": "hat"}),
            json!({"url": "b", "title": "scarf"}),
            json!({"url": "c", "title": "gloves"}),
        ]);
        let q = ParsedQuery::parse("hat", &SynonymMap::new());
        // N=3, df=1, tf=2, dl=3
        let idf = ((3.0 - 1.0 + 0.5) / 1.5f64).ln();
        let norm = 1.5 * (0.25 + 0.75 * 3.0 / 300.0);
        let want = idf * (2.0 * 2.5) / (2.0 + norm);
        assert!((bm25(&b, b.document("a").unwrap(), &q) - want).abs() < 1e-12);
        assert_eq!(bm25(&b, b.document("b").unwrap(), &q), 0.0);
    }

    #[test]
    fn components_apply_weights() {
        let b = docs(vec![json!({"url": "u1", "title": "Red Wool Beanie", "description": "",
            "product_features": {"made in": "Peru"}, "product_reviews": [{"rating": 4}, {"rating": 5}]})]);
        let w = RankingWeights { bm25: 0.0, exact_match: 2.0, review: 0.5, title_match: 0.25, origin_match: 0.1 };
        let q = ParsedQuery::parse("wool beanie peru", &SynonymMap::new());
        let s = rank(&b, "u1", b.document("u1").unwrap(), &q, &w);
        assert_eq!(s.bm25_score, 0.0);
        assert_eq!(s.exact_match_score, 0.0);
        assert!((s.review_score - (4.5 * 0.3 + 2.0 * 0.1) * 0.5).abs() < 1e-12);
        assert!((s.title_match_score - 0.5).abs() < 1e-12);
        assert!((s.origin_match_score - 0.1).abs() < 1e-12);
        assert!((s.final_score() - (s.review_score + 0.5 + 0.1)).abs() < 1e-12);
    }

    #[test]
    fn review_count_is_capped() {
        let agg = ReviewAggregate { total_reviews: 25, average_rating: 5.0, last_rating: Some(5.0) };
        assert!((review_quality(&agg) - (1.5 + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn weights_reject_negative() {
        assert!(RankingWeights::default().validate().is_ok());
        let w = RankingWeights { review: -0.1, ..Default::default() };
        assert!(matches!(w.validate(), Err(CatalogError::InvalidWeights { name: "review", .. })));
        let w = RankingWeights { bm25: f64::NAN, ..Default::default() };
        assert!(w.validate().is_err());
    }
}
