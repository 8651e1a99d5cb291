//! Product catalog indexing and ranked retrieval.

pub mod builder;
pub mod corpus;
pub mod document;
pub mod engine;
pub mod error;
pub mod index;
pub mod matcher;
pub mod persist;
pub mod query;
pub mod ranker;
pub mod results;
pub mod synonyms;
pub mod tokenizer;

pub use builder::{build, BuildOutcome, BuildStatus};
pub use document::{Document, ProductRef, Review};
pub use engine::SearchEngine;
pub use error::{CatalogError, Result};
pub use index::{DocUrl, FeatureField, FeatureIndex, IndexBundle, PositionalIndex, ReviewAggregate, ReviewIndex, TextField};
pub use matcher::MatchMode;
pub use ranker::{ComponentScores, RankingWeights};
pub use results::{RankedDocument, SearchMetadata, SearchResult};
pub use synonyms::SynonymMap;
