use crate::error::CatalogError;
use crate::index::{FeatureField, IndexBundle};
use crate::query::ParsedQuery;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Documents containing at least one expanded token.
    #[default]
    Any,
    /// Documents containing every expanded token.
    All,
    /// Raw query equal to the title, brand or origin after lowercase+trim.
    Exact,
}

impl MatchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchMode::Any => "any",
            MatchMode::All => "all",
            MatchMode::Exact => "exact",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for MatchMode {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(MatchMode::Any),
            "all" => Ok(MatchMode::All),
            "exact" => Ok(MatchMode::Exact),
            other => Err(CatalogError::InvalidMode(other.to_string())),
        }
    }
}

pub fn normalize_exact(s: &str) -> String { s.trim().to_lowercase() }

/// Candidate urls for a query. Unknown tokens simply contribute nothing.
pub fn match_documents<'a>(bundle: &'a IndexBundle, query: &ParsedQuery, mode: MatchMode) -> BTreeSet<&'a str> {
    match mode {
        MatchMode::Any => match_any(bundle, query.expanded.iter().map(String::as_str)),
        MatchMode::All => match_all(bundle, query.expanded.iter().map(String::as_str)),
        MatchMode::Exact => match_exact(bundle, &query.raw),
    }
}

/// Union over tokens of the title, description and feature postings.
pub fn match_any<'a, 't>(bundle: &'a IndexBundle, tokens: impl IntoIterator<Item = &'t str>) -> BTreeSet<&'a str> {
    let mut out = BTreeSet::new();
    for token in tokens {
        out.extend(token_documents(bundle, token));
    }
    out
}

/// Intersection of the per-token ANY results; no tokens means no documents.
pub fn match_all<'a, 't>(bundle: &'a IndexBundle, tokens: impl IntoIterator<Item = &'t str>) -> BTreeSet<&'a str> {
    let mut acc: Option<BTreeSet<&'a str>> = None;
    for token in tokens {
        let docs: BTreeSet<&'a str> = token_documents(bundle, token).collect();
        let next = match acc {
            None => docs,
            Some(prev) => prev.intersection(&docs).copied().collect(),
        };
        if next.is_empty() { return next; }
        acc = Some(next);
    }
    acc.unwrap_or_default()
}

/// Scan the live documents for a normalized exact equality.
pub fn match_exact<'a>(bundle: &'a IndexBundle, raw: &str) -> BTreeSet<&'a str> {
    let needle = normalize_exact(raw);
    if needle.is_empty() { return BTreeSet::new(); }
    bundle
        .documents
        .iter()
        .filter(|(_, doc)| is_exact_match(doc, &needle))
        .map(|(url, _)| url.as_str())
        .collect()
}

/// `needle` must already be normalized.
pub fn is_exact_match(doc: &crate::document::Document, needle: &str) -> bool {
    normalize_exact(doc.title()) == needle
        || doc.brand_text().is_some_and(|b| normalize_exact(&b) == needle)
        || doc.origin().is_some_and(|o| normalize_exact(&o) == needle)
}

fn token_documents<'a>(bundle: &'a IndexBundle, token: &str) -> impl Iterator<Item = &'a str> + 'a {
    let title = bundle.title.documents(token);
    let desc = bundle.description.documents(token);
    let feats: Vec<&'a str> = FeatureField::ALL
        .iter()
        .filter_map(|f| bundle.feature(*f))
        .flat_map(|idx| idx.documents(token))
        .collect();
    title.chain(desc).chain(feats)
}
