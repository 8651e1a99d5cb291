//! Origin synonym groups used to broaden query recall.
//!
//! A group is a canonical term plus its variants. Matching treats the
//! relation as symmetric: any member of a group pulls in the whole group.
//! Expansion is one hop only; groups are never chained.

use crate::tokenizer::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Built-in groups used when no synonym file is configured.
pub const ORIGIN_SYNONYM_GROUPS: &[(&str, &[&str])] = &[
    ("usa", &["america", "us", "unitedstates", "american"]),
    ("uk", &["england", "britain", "unitedkingdom", "british", "english"]),
    ("china", &["prc", "chinese"]),
    ("france", &["french"]),
    ("germany", &["deutschland", "german"]),
    ("italy", &["italia", "italian"]),
    ("japan", &["nippon", "japanese"]),
    ("mexico", &["mexican"]),
    ("peru", &["peruvian"]),
    ("spain", &["espana", "spanish"]),
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Vec<String>>", into = "BTreeMap<String, Vec<String>>")]
pub struct SynonymMap {
    groups: BTreeMap<String, BTreeSet<String>>,
    // synonym -> canonical terms it belongs to
    reverse: HashMap<String, Vec<String>>,
}

impl From<BTreeMap<String, Vec<String>>> for SynonymMap {
    fn from(raw: BTreeMap<String, Vec<String>>) -> Self {
        Self::from_groups(raw)
    }
}

impl From<SynonymMap> for BTreeMap<String, Vec<String>> {
    fn from(map: SynonymMap) -> Self {
        map.groups.into_iter().map(|(k, v)| (k, v.into_iter().collect())).collect()
    }
}

impl SynonymMap {
    pub fn new() -> Self { Self::default() }

    /// Terms go through the query tokenizer so they compare equal to query
    /// tokens. Entries that do not reduce to exactly one token can never
    /// match and are dropped with a warning.
    pub fn from_groups<I, S, V, T>(groups: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: AsRef<str>,
        V: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut map = Self::default();
        for (canonical, synonyms) in groups {
            let Some(canonical) = normalize(canonical.as_ref()) else { continue };
            let entry = map.groups.entry(canonical.clone()).or_default();
            for syn in synonyms {
                let Some(syn) = normalize(syn.as_ref()) else { continue };
                if syn == canonical { continue; }
                entry.insert(syn);
            }
        }
        for (canonical, synonyms) in &map.groups {
            for syn in synonyms {
                map.reverse.entry(syn.clone()).or_default().push(canonical.clone());
            }
        }
        map
    }

    pub fn builtin_origins() -> Self {
        Self::from_groups(ORIGIN_SYNONYM_GROUPS.iter().map(|(c, s)| (*c, s.iter().copied())))
    }

    /// Load `{canonical: [synonym, ...]}` from a JSON file.
    pub fn from_json_file(path: &Path) -> crate::Result<Self> {
        let f = File::open(path)?;
        let raw: BTreeMap<String, Vec<String>> = serde_json::from_reader(BufReader::new(f))?;
        let map = Self::from_groups(raw);
        tracing::info!(path = %path.display(), groups = map.groups.len(), "loaded synonym map");
        Ok(map)
    }

    pub fn len(&self) -> usize { self.groups.len() }

    pub fn is_empty(&self) -> bool { self.groups.is_empty() }

    pub fn synonyms_of(&self, canonical: &str) -> Option<&BTreeSet<String>> {
        self.groups.get(canonical)
    }

    /// Input tokens plus every member of any group they touch, deduplicated.
    pub fn expand<I, T>(&self, tokens: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut out = BTreeSet::new();
        for token in tokens {
            let token = token.as_ref();
            out.insert(token.to_string());
            if let Some(syns) = self.groups.get(token) {
                out.extend(syns.iter().cloned());
            }
            if let Some(canonicals) = self.reverse.get(token) {
                for canonical in canonicals {
                    out.insert(canonical.clone());
                    if let Some(syns) = self.groups.get(canonical) {
                        out.extend(syns.iter().cloned());
                    }
                }
            }
        }
        out
    }
}

fn normalize(term: &str) -> Option<String> {
    let mut tokens = tokenize(term);
    if tokens.len() != 1 {
        tracing::warn!(term, tokens = tokens.len(), "synonym entry is not a single token, ignored");
        return None;
    }
    tokens.pop()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> SynonymMap {
        SynonymMap::from_groups([("usa", vec!["america", "us"]), ("uk", vec!["England", "britain"])])
    }

    #[test]
    fn canonical_pulls_in_synonyms() {
        let e = map().expand(["usa", "beanie"]);
        let want: BTreeSet<String> = ["usa", "america", "us", "beanie"].iter().map(|s| s.to_string()).collect();
        assert_eq!(e, want);
    }

    #[test]
    fn synonym_pulls_in_canonical_and_siblings() {
        let e = map().expand(["england"]);
        assert!(e.contains("uk"));
        assert!(e.contains("britain"));
        assert!(!e.contains("usa"));
    }

    #[test]
    fn expansion_is_closed() {
        let m = map();
        let once = m.expand(["america", "hat"]);
        let twice = m.expand(once.iter());
        assert_eq!(once, twice);
    }

    #[test]
    fn shipped_file_matches_builtin() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../data/origin_synonyms.json");
        let from_file = SynonymMap::from_json_file(&path).unwrap();
        assert_eq!(BTreeMap::from(from_file), BTreeMap::from(SynonymMap::builtin_origins()));
    }

    #[test]
    fn entries_are_tokenized_like_queries() {
        let m = SynonymMap::from_groups([("USA", vec!["U.S.", "united states", "America!"])]);
        let syns: Vec<&str> = m.synonyms_of("usa").unwrap().iter().map(String::as_str).collect();
        assert_eq!(syns, vec!["america", "us"]);
        let q = crate::query::ParsedQuery::parse("U.S. hats", &m);
        assert!(q.expanded.contains("usa"));
        assert!(q.expanded.contains("america"));
    }

    #[test]
    fn parses_json_object() {
        let m: SynonymMap = serde_json::from_str(r#"{"Peru": ["peruvian", " PE "]}"#).unwrap();
        assert_eq!(m.len(), 1);
        assert!(m.expand(["pe"]).contains("peru"));
    }
}
