use crate::error::Result;
use crate::index::IndexBundle;
use crate::matcher::{match_documents, MatchMode};
use crate::persist::{load_bundle, IndexPaths};
use crate::query::ParsedQuery;
use crate::ranker::{rank, RankingWeights};
use crate::results::{RankedDocument, SearchResult};
use crate::synonyms::SynonymMap;
use std::sync::Arc;

/// Query front end over one immutable bundle. Cheap to clone and safe to
/// share between threads; a re-index builds a new engine.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    bundle: Arc<IndexBundle>,
    synonyms: Arc<SynonymMap>,
}

impl SearchEngine {
    pub fn new(bundle: impl Into<Arc<IndexBundle>>, synonyms: impl Into<Arc<SynonymMap>>) -> Self {
        Self { bundle: bundle.into(), synonyms: synonyms.into() }
    }

    /// Load the bundle under `paths`. Fails on an incomplete index folder.
    pub fn open(paths: &IndexPaths, synonyms: SynonymMap) -> Result<Self> {
        let bundle = load_bundle(paths)?;
        Ok(Self::new(bundle, synonyms))
    }

    pub fn bundle(&self) -> &IndexBundle { &self.bundle }

    pub fn synonyms(&self) -> &SynonymMap { &self.synonyms }

    pub fn parse(&self, raw: &str) -> ParsedQuery { ParsedQuery::parse(raw, &self.synonyms) }

    /// Match and rank `raw`. Weights are checked first; a negative or
    /// non-finite weight is rejected before any matching happens.
    pub fn search(&self, raw: &str, mode: MatchMode, weights: &RankingWeights) -> Result<SearchResult> {
        weights.validate()?;
        let query = self.parse(raw);
        if query.is_blank() {
            tracing::debug!(query = raw, "blank query");
            return Ok(SearchResult::empty(raw, mode));
        }
        let candidates = match_documents(&self.bundle, &query, mode);
        let ranked = candidates
            .into_iter()
            .filter_map(|url| {
                let doc = self.bundle.document(url)?;
                let scores = rank(&self.bundle, url, doc, &query, weights);
                Some(RankedDocument {
                    url: url.to_string(),
                    title: doc.title().to_string(),
                    final_score: scores.final_score(),
                    scores,
                })
            })
            .collect();
        let result = SearchResult::assemble(raw, mode, ranked);
        tracing::debug!(query = raw, %mode, hits = result.document_count(), "search complete");
        Ok(result)
    }
}
