use crate::corpus::write_jsonl;
use crate::document::Document;
use crate::error::{CatalogError, Result};
use crate::index::{FeatureField, FeatureIndex, IndexBundle, PositionalIndex, ReviewIndex, TextField};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{create_dir_all, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: usize,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    /// `{root}/index_<name>.json`
    pub fn index(&self, name: &str) -> PathBuf { self.root.join(format!("index_{name}.json")) }
    pub fn reviews(&self) -> PathBuf { self.index("reviews") }
    pub fn documents(&self) -> PathBuf { self.root.join("documents.jsonl") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }

    /// Every file a complete bundle needs.
    pub fn required(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = TextField::ALL.iter().map(|f| self.index(f.name())).collect();
        files.extend(FeatureField::ALL.iter().map(|f| self.index(f.name())));
        files.push(self.reviews());
        files.push(self.documents());
        files.push(self.meta());
        files
    }
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut f, value)?;
    f.flush()?;
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let f = File::open(path)?;
    let value = serde_json::from_reader(BufReader::new(f))?;
    Ok(value)
}

pub fn save_positional(paths: &IndexPaths, field: TextField, index: &PositionalIndex) -> Result<()> {
    save_json(&paths.index(field.name()), index)
}

pub fn load_positional(paths: &IndexPaths, field: TextField) -> Result<PositionalIndex> {
    load_json(&paths.index(field.name()))
}

pub fn save_feature(paths: &IndexPaths, field: FeatureField, index: &FeatureIndex) -> Result<()> {
    save_json(&paths.index(field.name()), index)
}

pub fn load_feature(paths: &IndexPaths, field: FeatureField) -> Result<FeatureIndex> {
    load_json(&paths.index(field.name()))
}

pub fn save_reviews(paths: &IndexPaths, index: &ReviewIndex) -> Result<()> {
    save_json(&paths.reviews(), index)
}

pub fn load_reviews(paths: &IndexPaths) -> Result<ReviewIndex> {
    load_json(&paths.reviews())
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    save_json(&paths.meta(), meta)
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    load_json(&paths.meta())
}

/// Write every index of the bundle plus the normalized documents and meta.
pub fn save_bundle(paths: &IndexPaths, bundle: &IndexBundle) -> Result<()> {
    create_dir_all(&paths.root)?;
    for field in TextField::ALL {
        save_positional(paths, field, bundle.positional(field))?;
    }
    let empty = FeatureIndex::new();
    for field in FeatureField::ALL {
        save_feature(paths, field, bundle.feature(field).unwrap_or(&empty))?;
    }
    save_reviews(paths, &bundle.reviews)?;
    write_jsonl(&paths.documents(), bundle.documents.values())?;
    let meta = MetaFile {
        num_docs: bundle.num_docs(),
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "".into()),
        version: FORMAT_VERSION,
    };
    save_meta(paths, &meta)?;
    tracing::info!(root = %paths.root.display(), num_docs = meta.num_docs, "index bundle saved");
    Ok(())
}

/// Read the stored documents. Unlike corpus input, every line must decode and
/// carry a url: postings refer to these records.
pub fn load_documents(paths: &IndexPaths) -> Result<BTreeMap<String, Document>> {
    let path = paths.documents();
    let corrupt = |lineno: usize, detail: String| CatalogError::CorruptIndex {
        path: path.clone(),
        detail: format!("line {lineno}: {detail}"),
    };
    let mut documents = BTreeMap::new();
    for (i, line) in BufReader::new(File::open(&path)?).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: Document = serde_json::from_str(&line).map_err(|e| corrupt(i + 1, e.to_string()))?;
        let url = doc.url.clone().ok_or_else(|| corrupt(i + 1, "document without url".into()))?;
        documents.insert(url, doc);
    }
    Ok(documents)
}

/// Load a complete bundle. Any missing index file is fatal: a partial bundle
/// is never served.
pub fn load_bundle(paths: &IndexPaths) -> Result<IndexBundle> {
    if let Some(path) = paths.required().into_iter().find(|p| !p.is_file()) {
        return Err(CatalogError::MissingIndexFile { path });
    }
    let title = load_positional(paths, TextField::Title)?;
    let description = load_positional(paths, TextField::Description)?;
    let mut features = BTreeMap::new();
    for field in FeatureField::ALL {
        features.insert(field, load_feature(paths, field)?);
    }
    let reviews = load_reviews(paths)?;

    let documents = load_documents(paths)?;
    let meta = load_meta(paths)?;
    if meta.num_docs != documents.len() {
        return Err(CatalogError::CorruptIndex {
            path: paths.documents(),
            detail: format!("meta.json records {} documents, found {}", meta.num_docs, documents.len()),
        });
    }
    tracing::info!(root = %paths.root.display(), num_docs = documents.len(), "index bundle loaded");
    Ok(IndexBundle { documents, title, description, features, reviews })
}
