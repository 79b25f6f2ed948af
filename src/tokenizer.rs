//! The default text tokenizer.
//!
//! Text is normalized to Unicode NFD, combining marks are dropped, the
//! remainder is lowercased, and words are the maximal runs of ASCII
//! letters. Every other rune is a token break, so digits, punctuation and
//! non-Latin script act as separators and never reach the tree.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Folds text for indexing: NFD-decompose, strip combining marks, lowercase.
///
/// `"réveillez"` folds to `"reveillez"`; the accents decompose into marks
/// that are filtered out before lowercasing.
pub fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Splits text into indexable words.
///
/// Input is folded first, then split on every non-ASCII-letter rune.
/// Empty tokens are dropped, so consecutive separators collapse.
pub struct WordTokenizer;

impl WordTokenizer {
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let folded = fold(text);
        let mut tokens = Vec::new();
        let mut word = String::new();
        for ch in folded.chars() {
            if ch.is_ascii_alphabetic() {
                word.push(ch);
            } else if !word.is_empty() {
                tokens.push(std::mem::take(&mut word));
            }
        }
        if !word.is_empty() {
            tokens.push(word);
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_diacritics() {
        assert_eq!(fold("réveillez-vous à l'heure!"), "reveillez-vous a l'heure!");
        assert_eq!(fold("Ärger"), "arger");
    }

    #[test]
    fn test_fold_lowercases() {
        assert_eq!(fold("This Is MIXED"), "this is mixed");
    }

    #[test]
    fn test_tokenize_splits_on_non_letters() {
        let tokens = WordTokenizer.tokenize("The last phrase (this one) contains french");
        assert_eq!(
            tokens,
            vec!["the", "last", "phrase", "this", "one", "contains", "french"]
        );
    }

    #[test]
    fn test_tokenize_drops_digits_and_punctuation() {
        let tokens = WordTokenizer.tokenize("0\talice\thunting-bobby-crown\t25");
        assert_eq!(tokens, vec!["alice", "hunting", "bobby", "crown"]);
    }

    #[test]
    fn test_tokenize_folds_diacritics() {
        let tokens = WordTokenizer.tokenize("réveillez-vous à l'heure!");
        assert_eq!(tokens, vec!["reveillez", "vous", "a", "l", "heure"]);
    }

    #[test]
    fn test_tokenize_empty_and_separator_only() {
        assert!(WordTokenizer.tokenize("").is_empty());
        assert!(WordTokenizer.tokenize(" \t 123 ---").is_empty());
    }
}
