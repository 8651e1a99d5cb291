use crate::synonyms::SynonymMap;
use crate::tokenizer::tokenize;
use std::collections::BTreeSet;

/// A raw query with its tokens and their synonym expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuery {
    pub raw: String,
    pub tokens: Vec<String>,
    /// Deduplicated and ordered; this is what matching and ranking consume.
    pub expanded: BTreeSet<String>,
}

impl ParsedQuery {
    pub fn parse(raw: &str, synonyms: &SynonymMap) -> Self {
        let tokens = tokenize(raw);
        let expanded = synonyms.expand(&tokens);
        Self { raw: raw.to_string(), tokens, expanded }
    }

    /// Empty or all-stopword queries carry nothing to search for.
    pub fn is_blank(&self) -> bool { self.tokens.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_origin_terms() {
        let syn = SynonymMap::from_groups([("usa", ["america"])]);
        let q = ParsedQuery::parse("Cat-Ear Beanie America", &syn);
        assert_eq!(q.tokens, vec!["catear", "beanie", "america"]);
        assert!(q.expanded.contains("usa"));
        assert_eq!(q.expanded.len(), 4);
    }

    #[test]
    fn stopword_only_query_is_blank() {
        assert!(ParsedQuery::parse("the and of", &SynonymMap::new()).is_blank());
        assert!(ParsedQuery::parse("  ", &SynonymMap::new()).is_blank());
    }
}
