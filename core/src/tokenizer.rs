use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // ASCII punctuation only; letters with diacritics survive.
    static ref PUNCT: Regex = Regex::new(r"[[:punct:]]").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        // Apostrophes are already stripped by the time a token is checked,
        // so contractions are listed in their collapsed form.
        let words: &[&str] = &[
            "a","about","above","after","again","against","ain","all","am","an","and","any","are","aren","arent","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","couldn","couldnt",
            "d","did","didn","didnt","do","does","doesn","doesnt","doing","don","dont","down","during",
            "each","few","for","from","further",
            "had","hadn","hadnt","has","hasn","hasnt","have","haven","havent","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","isn","isnt","it","its","itself",
            "just","ll","m","ma","me","mightn","mightnt","more","most","mustn","mustnt","my","myself",
            "needn","neednt","no","nor","not","now",
            "o","of","off","on","once","only","or","other","our","ours","ourselves","out","over","own",
            "re","s","same","shan","shant","she","shes","should","shouldn","shouldnt","shouldve","so","some","such",
            "t","than","that","thatll","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","ve","very",
            "was","wasn","wasnt","we","were","weren","werent","what","when","where","which","while","who","whom","why","will","with","won","wont","wouldn","wouldnt",
            "y","you","youd","youll","your","youre","yours","yourself","yourselves","youve"
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Normalize free text into terms: NFKC, lowercase, ASCII punctuation removed,
/// whitespace split, stopwords dropped. Order and duplicates are preserved.
pub fn tokenize(text: &str) -> Vec<String> {
    if text.is_empty() { return Vec::new(); }
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    let stripped = PUNCT.replace_all(&normalized, "");
    stripped
        .split_whitespace()
        .filter(|w| !is_stopword(w))
        .map(str::to_owned)
        .collect()
}

/// Tokenize text into (term, position). Positions count surviving tokens only,
/// so they are dense and strictly increasing.
pub fn tokenize_with_positions(text: &str) -> impl Iterator<Item = (String, usize)> {
    tokenize(text).into_iter().enumerate().map(|(pos, term)| (term, pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Red Wool Beanie, made in Peru!");
        assert_eq!(t, vec!["red", "wool", "beanie", "made", "peru"]);
    }

    #[test]
    fn positions_skip_stopwords() {
        let t: Vec<_> = tokenize_with_positions("box of the chocolate box").collect();
        assert_eq!(
            t,
            vec![("box".to_string(), 0), ("chocolate".to_string(), 1), ("box".to_string(), 2)]
        );
    }

    #[test]
    fn contractions_collapse_before_stopword_check() {
        assert!(tokenize("don't you're it's").is_empty());
    }
}
