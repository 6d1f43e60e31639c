use crate::checker::position::LineIndex;
use crate::{Position, Token};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // A letter followed by letters, apostrophes or hyphens.
    static ref WORD_RE: Regex = Regex::new(r"[A-Za-z][A-Za-z'-]*").unwrap();
}

/// A word occurrence borrowed from the text it was found in. Spans are
/// absolute: the base offset passed to [`words`] is already applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Word<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Lazily scan `text` for words, shifting every span by `base`.
///
/// Calling this again restarts the scan; the whole-document token list and
/// the per-chunk checkers both go through here so their spans line up.
pub fn words(text: &str, base: usize) -> impl Iterator<Item = Word<'_>> + '_ {
    WORD_RE.find_iter(text).map(move |m| Word {
        text: m.as_str(),
        start: base + m.start(),
        end: base + m.end(),
    })
}

/// Collect the positioned token list for a whole document.
pub fn collect_tokens(text: &str, lines: &LineIndex) -> Vec<Token> {
    words(text, 0)
        .map(|word| Token {
            text: word.text.to_string(),
            position: Position::new(word.start, word.end, lines),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_keep_apostrophes_and_hyphens() {
        let found: Vec<_> = words("She don't like long-term plans.", 0)
            .map(|w| w.text)
            .collect();
        assert_eq!(found, vec!["She", "don't", "like", "long-term", "plans"]);
    }

    #[test]
    fn test_words_must_start_with_letter() {
        let found: Vec<_> = words("'quoted' 42nd -dash", 0).map(|w| w.text).collect();
        assert_eq!(found, vec!["quoted'", "nd", "dash"]);
    }

    #[test]
    fn test_base_offset_applied() {
        let word = words("  hello", 100).next().unwrap();
        assert_eq!((word.start, word.end), (102, 107));
    }

    #[test]
    fn test_iterator_restarts() {
        let text = "one two";
        assert_eq!(words(text, 0).count(), 2);
        assert_eq!(words(text, 0).count(), 2);
    }

    #[test]
    fn test_collect_tokens_positions() {
        let text = "Hello\nworld";
        let lines = LineIndex::new(text);
        let tokens = collect_tokens(text, &lines);

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].text, "world");
        assert_eq!(tokens[1].position.line, 2);
        assert_eq!(tokens[1].position.col, 1);
        assert_eq!(tokens[1].position.start, 6);
    }
}
