//! Builds every index of an [`IndexBundle`] from a corpus snapshot.

use crate::document::Document;
use crate::index::{DocUrl, FeatureField, FeatureIndex, IndexBundle, PositionalIndex, ReviewAggregate, ReviewIndex, TextField};
use crate::tokenizer::{tokenize, tokenize_with_positions};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    Indexed { documents: usize },
    /// Nothing to index. The bundle is empty but valid.
    NoData,
}

#[derive(Debug)]
pub struct BuildOutcome {
    pub bundle: IndexBundle,
    pub status: BuildStatus,
    /// Documents dropped for lacking a url.
    pub skipped: usize,
    /// Documents replaced by a later one with the same url.
    pub duplicates: usize,
}

pub fn build(corpus: Vec<Document>) -> BuildOutcome {
    let mut documents: BTreeMap<DocUrl, Document> = BTreeMap::new();
    let mut skipped = 0usize;
    let mut duplicates = 0usize;
    for mut doc in corpus {
        let url = match doc.url.as_deref().map(str::trim) {
            Some(u) if !u.is_empty() => u.to_string(),
            _ => {
                tracing::warn!(title = doc.title(), "skipping document without url");
                skipped += 1;
                continue;
            }
        };
        // Stored trimmed so the key, postings and persisted record agree.
        doc.url = Some(url.clone());
        let doc = doc.with_product_ref();
        if documents.insert(url.clone(), doc).is_some() {
            tracing::warn!(%url, "duplicate url, keeping the later document");
            duplicates += 1;
        }
    }

    // Builders only read `documents` and each owns its output.
    let ((title, description), (features, reviews)) = rayon::join(
        || {
            rayon::join(
                || build_positional(TextField::Title, &documents),
                || build_positional(TextField::Description, &documents),
            )
        },
        || rayon::join(|| build_features(&documents), || build_reviews(&documents)),
    );

    let status = if documents.is_empty() {
        tracing::warn!("corpus is empty, built an empty index bundle");
        BuildStatus::NoData
    } else {
        BuildStatus::Indexed { documents: documents.len() }
    };
    tracing::info!(
        documents = documents.len(),
        skipped,
        duplicates,
        title_terms = title.len(),
        description_terms = description.len(),
        reviewed = reviews.len(),
        "index bundle built"
    );

    BuildOutcome {
        bundle: IndexBundle { documents, title, description, features, reviews },
        status,
        skipped,
        duplicates,
    }
}

pub fn build_positional(field: TextField, documents: &BTreeMap<DocUrl, Document>) -> PositionalIndex {
    let mut index = PositionalIndex::new();
    for (url, doc) in documents {
        for (token, pos) in tokenize_with_positions(field.text(doc)) {
            index.push(token, url, pos);
        }
    }
    index
}

pub fn build_feature(field: FeatureField, documents: &BTreeMap<DocUrl, Document>) -> FeatureIndex {
    let mut index = FeatureIndex::new();
    for (url, doc) in documents {
        let Some(value) = field.value(doc) else { continue };
        for token in tokenize(&value) {
            index.insert(token, url);
        }
    }
    index
}

fn build_features(documents: &BTreeMap<DocUrl, Document>) -> BTreeMap<FeatureField, FeatureIndex> {
    use rayon::prelude::*;
    FeatureField::ALL.par_iter().map(|&f| (f, build_feature(f, documents))).collect()
}

pub fn build_reviews(documents: &BTreeMap<DocUrl, Document>) -> ReviewIndex {
    let mut index = ReviewIndex::default();
    for (url, doc) in documents {
        if let Some(agg) = ReviewAggregate::from_document(doc) {
            index.insert(url, agg);
        }
    }
    index
}
