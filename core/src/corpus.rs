//! Lenient readers for the line-delimited corpus.
//!
//! Unreadable files and malformed records are logged and counted, never
//! returned as errors: a bad line must not sink a whole build.

use crate::document::Document;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Default)]
pub struct CorpusLoad {
    pub documents: Vec<Document>,
    /// Records that could not be decoded.
    pub skipped: usize,
}

impl CorpusLoad {
    pub fn extend(&mut self, other: CorpusLoad) {
        self.documents.extend(other.documents);
        self.skipped += other.skipped;
    }
}

/// Read one document per line. Blank lines are ignored.
pub fn read_jsonl(path: &Path) -> CorpusLoad {
    let mut load = CorpusLoad::default();
    let f = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "corpus file unreadable");
            return load;
        }
    };
    for (lineno, line) in BufReader::new(f).lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                tracing::warn!(path = %path.display(), line = lineno + 1, error = %e, "read error, stopping");
                load.skipped += 1;
                break;
            }
        };
        if line.trim().is_empty() { continue; }
        match serde_json::from_str::<Document>(&line) {
            Ok(doc) => load.documents.push(doc),
            Err(e) => {
                tracing::warn!(path = %path.display(), line = lineno + 1, error = %e, "skipping malformed record");
                load.skipped += 1;
            }
        }
    }
    load
}

/// Read a JSON file holding either an array of documents or a single one.
pub fn read_json(path: &Path) -> CorpusLoad {
    let mut load = CorpusLoad::default();
    let value: serde_json::Value = match File::open(path)
        .map_err(|e| e.to_string())
        .and_then(|f| serde_json::from_reader::<_, serde_json::Value>(BufReader::new(f)).map_err(|e| e.to_string()))
    {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "corpus file unreadable");
            return load;
        }
    };
    let items = match value {
        serde_json::Value::Array(arr) => arr,
        obj @ serde_json::Value::Object(_) => vec![obj],
        _ => {
            tracing::warn!(path = %path.display(), "corpus file holds neither an array nor an object");
            return load;
        }
    };
    for (i, v) in items.into_iter().enumerate() {
        match serde_json::from_value::<Document>(v) {
            Ok(doc) => load.documents.push(doc),
            Err(e) => {
                tracing::warn!(path = %path.display(), item = i, error = %e, "skipping malformed record");
                load.skipped += 1;
            }
        }
    }
    load
}

pub fn write_jsonl<'a, I>(path: &Path, docs: I) -> crate::Result<()>
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut out = BufWriter::new(File::create(path)?);
    for doc in docs {
        serde_json::to_writer(&mut out, doc)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("c.jsonl");
        fs::write(&p, "{\"url\":\"u1\",\"title\":\"A\"}\nnot json\n\n{\"url\":\"u2\"}\n").unwrap();
        let load = read_jsonl(&p);
        assert_eq!(load.documents.len(), 2);
        assert_eq!(load.skipped, 1);
    }

    #[test]
    fn missing_file_is_empty_not_error() {
        let load = read_jsonl(Path::new("/definitely/not/here.jsonl"));
        assert!(load.documents.is_empty());
        assert_eq!(load.skipped, 0);
    }

    #[test]
    fn json_array_and_object() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.json");
        fs::write(&a, r#"[{"url":"u1"},{"url":"u2"},42]"#).unwrap();
        let load = read_json(&a);
        assert_eq!(load.documents.len(), 2);
        assert_eq!(load.skipped, 1);

        let o = dir.path().join("o.json");
        fs::write(&o, r#"{"url":"u3","title":"x"}"#).unwrap();
        assert_eq!(read_json(&o).documents.len(), 1);
    }
}
