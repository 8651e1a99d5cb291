use crate::document::{Document, ORIGIN_KEY};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Documents are keyed by their url.
pub type DocUrl = String;

/// token -> url -> positions within that field's token sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionalIndex(BTreeMap<String, BTreeMap<DocUrl, Vec<usize>>>);

impl PositionalIndex {
    pub fn new() -> Self { Self::default() }

    /// Positions must be pushed in tokenization order.
    pub fn push(&mut self, token: String, url: &str, position: usize) {
        self.0.entry(token).or_default().entry(url.to_string()).or_default().push(position);
    }

    pub fn postings(&self, token: &str) -> Option<&BTreeMap<DocUrl, Vec<usize>>> { self.0.get(token) }

    pub fn documents<'a>(&'a self, token: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.0.get(token).into_iter().flat_map(|p| p.keys().map(String::as_str))
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> { self.0.keys().map(String::as_str) }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

/// token -> urls whose feature value contains the token. No positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureIndex(BTreeMap<String, BTreeSet<DocUrl>>);

impl FeatureIndex {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, token: String, url: &str) {
        self.0.entry(token).or_default().insert(url.to_string());
    }

    pub fn documents<'a>(&'a self, token: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.0.get(token).into_iter().flat_map(|s| s.iter().map(String::as_str))
    }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewAggregate {
    pub total_reviews: usize,
    pub average_rating: f64,
    pub last_rating: Option<f64>,
}

impl ReviewAggregate {
    /// None for a document without reviews, so the average is never 0/0.
    pub fn from_document(doc: &Document) -> Option<Self> {
        let reviews = &doc.product_reviews;
        if reviews.is_empty() { return None; }
        let total_reviews = reviews.len();
        let sum: f64 = reviews.iter().map(|r| r.rating.unwrap_or(0.0)).sum();
        Some(Self {
            total_reviews,
            average_rating: sum / total_reviews as f64,
            last_rating: reviews.last().and_then(|r| r.rating),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewIndex(BTreeMap<DocUrl, ReviewAggregate>);

impl ReviewIndex {
    pub fn insert(&mut self, url: &str, agg: ReviewAggregate) { self.0.insert(url.to_string(), agg); }

    pub fn get(&self, url: &str) -> Option<&ReviewAggregate> { self.0.get(url) }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

/// Free-text fields carrying a positional index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TextField {
    Title,
    Description,
}

impl TextField {
    pub const ALL: [TextField; 2] = [TextField::Title, TextField::Description];

    pub fn name(self) -> &'static str {
        match self {
            TextField::Title => "title",
            TextField::Description => "description",
        }
    }

    pub fn text(self, doc: &Document) -> &str {
        match self {
            TextField::Title => doc.title(),
            TextField::Description => doc.description(),
        }
    }
}

/// Structured attributes carrying a membership-only feature index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeatureField {
    Brand,
    Origin,
    Flavor,
    Container,
}

impl FeatureField {
    pub const ALL: [FeatureField; 4] =
        [FeatureField::Brand, FeatureField::Origin, FeatureField::Flavor, FeatureField::Container];

    /// Suffix of the persisted `index_<name>.json` file.
    pub fn name(self) -> &'static str {
        match self {
            FeatureField::Brand => "brand",
            FeatureField::Origin => "made_in",
            FeatureField::Flavor => "flavor",
            FeatureField::Container => "container",
        }
    }

    pub fn value(self, doc: &Document) -> Option<String> {
        match self {
            FeatureField::Brand => doc.brand_text(),
            FeatureField::Origin => doc.feature_text(ORIGIN_KEY),
            FeatureField::Flavor => doc.feature_text("flavor"),
            FeatureField::Container => doc.feature_text("container"),
        }
    }
}

/// Every index built from one corpus snapshot. Read-only once assembled;
/// a re-index produces a new bundle.
#[derive(Debug, Clone, Default)]
pub struct IndexBundle {
    pub documents: BTreeMap<DocUrl, Document>,
    pub title: PositionalIndex,
    pub description: PositionalIndex,
    pub features: BTreeMap<FeatureField, FeatureIndex>,
    pub reviews: ReviewIndex,
}

impl IndexBundle {
    pub fn num_docs(&self) -> usize { self.documents.len() }

    pub fn is_empty(&self) -> bool { self.documents.is_empty() }

    pub fn document(&self, url: &str) -> Option<&Document> { self.documents.get(url) }

    pub fn positional(&self, field: TextField) -> &PositionalIndex {
        match field {
            TextField::Title => &self.title,
            TextField::Description => &self.description,
        }
    }

    pub fn feature(&self, field: FeatureField) -> Option<&FeatureIndex> { self.features.get(&field) }

    /// Number of documents containing `token` in the title or the description.
    pub fn doc_freq(&self, token: &str) -> usize {
        let title = self.title.postings(token);
        let desc = self.description.postings(token);
        match (title, desc) {
            (None, None) => 0,
            (Some(t), None) => t.len(),
            (None, Some(d)) => d.len(),
            (Some(t), Some(d)) => t.len() + d.keys().filter(|u| !t.contains_key(*u)).count(),
        }
    }
}
