//! Ordering and packaging of ranked documents, plus optional persistence.

use crate::error::Result;
use crate::matcher::MatchMode;
use crate::ranker::ComponentScores;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

lazy_static! {
    static ref SLUG: Regex = Regex::new(r"[^a-z0-9]+").expect("valid regex");
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMetadata {
    pub query: String,
    pub search_mode: MatchMode,
    pub document_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedDocument {
    pub url: String,
    pub title: String,
    pub scores: ComponentScores,
    pub final_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub metadata: SearchMetadata,
    pub ranked_documents: Vec<RankedDocument>,
}

impl SearchResult {
    pub fn empty(query: &str, mode: MatchMode) -> Self {
        Self::assemble(query, mode, Vec::new())
    }

    /// Sort by final score descending; equal scores fall back to url order.
    pub fn assemble(query: &str, mode: MatchMode, mut ranked: Vec<RankedDocument>) -> Self {
        ranked.sort_by(compare_ranked);
        Self {
            metadata: SearchMetadata { query: query.to_string(), search_mode: mode, document_count: ranked.len() },
            ranked_documents: ranked,
        }
    }

    pub fn document_count(&self) -> usize { self.metadata.document_count }

    /// Keep the first `k` documents. `document_count` still reports total hits.
    pub fn truncate(&mut self, k: usize) { self.ranked_documents.truncate(k); }
}

fn compare_ranked(a: &RankedDocument, b: &RankedDocument) -> Ordering {
    b.final_score.total_cmp(&a.final_score).then_with(|| a.url.cmp(&b.url))
}

/// `search_<slug>_<YYYYmmdd_HHMMSS_micros>.json`
pub fn result_file_name(query: &str, at: time::OffsetDateTime) -> String {
    let lowered = query.to_lowercase();
    let slug = SLUG.replace_all(&lowered, "_");
    let stamp = at
        .format(time::macros::format_description!(
            "[year][month][day]_[hour][minute][second]_[subsecond digits:6]"
        ))
        .unwrap_or_default();
    format!("search_{slug}_{stamp}.json")
}

const MAX_NAME_ATTEMPTS: usize = 100;

/// Open a fresh file for `name` in `dir`. An existing file is never
/// overwritten; a `_N` suffix is tried instead.
fn create_unique(dir: &Path, name: &str) -> Result<(PathBuf, File)> {
    let stem = name.strip_suffix(".json").unwrap_or(name);
    let mut last_err = None;
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let path = match attempt {
            0 => dir.join(name),
            n => dir.join(format!("{stem}_{n}.json")),
        };
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => return Ok((path, f)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => last_err = Some(e),
            Err(e) => return Err(e.into()),
        }
    }
    Err(last_err.unwrap_or_else(|| ErrorKind::AlreadyExists.into()).into())
}

/// Write one result file into `dir`, creating the directory if needed.
pub fn save_result(dir: &Path, result: &SearchResult) -> Result<PathBuf> {
    create_dir_all(dir)?;
    let name = result_file_name(&result.metadata.query, time::OffsetDateTime::now_utc());
    let (path, f) = create_unique(dir, &name)?;
    let mut f = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut f, result)?;
    f.flush()?;
    tracing::info!(path = %path.display(), "search results saved");
    Ok(path)
}
