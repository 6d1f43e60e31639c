use crate::checker::bktree::BkTree;
use crate::checker::dictionary::Lexicon;
use std::cmp::Reverse;
use std::time::Instant;
use tracing::info;

pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

const STRIP_CHARS: &[char] = &['.', ',', '!', '?', ';', ':', '\'', '"'];

/// Spelling index: exact membership through the lexicon, bounded-distance
/// suggestions through a BK-tree. Read-only once built.
pub struct SpellIndex {
    lexicon: Lexicon,
    tree: BkTree,
    max_distance: usize,
}

impl SpellIndex {
    pub fn build(lexicon: Lexicon, max_distance: usize) -> Self {
        let started = Instant::now();
        let tree: BkTree = lexicon.words().iter().collect();

        info!(
            words = tree.len(),
            max_distance,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Built spelling index"
        );

        Self {
            lexicon,
            tree,
            max_distance,
        }
    }

    pub fn is_correct(&self, word: &str) -> bool {
        self.lexicon.contains(word.trim_matches(STRIP_CHARS))
    }

    /// Ranked corrections for `word`, at most `limit`.
    ///
    /// Candidates are ordered by distance, then frequency (descending), then
    /// length, then alphabetically. A capitalized query gets capitalized
    /// suggestions.
    pub fn suggest(&self, word: &str, limit: usize) -> Vec<String> {
        let query = word.trim_matches(STRIP_CHARS).to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let mut candidates = self.tree.search(&query, self.max_distance);
        candidates.sort_by_key(|&(term, dist)| {
            (
                dist,
                Reverse(self.lexicon.frequency(term)),
                term.chars().count(),
                term,
            )
        });

        let capitalize = word.chars().next().is_some_and(char::is_uppercase);
        candidates
            .into_iter()
            .take(limit)
            .map(|(term, _)| {
                if capitalize {
                    capitalize_first(term)
                } else {
                    term.to_string()
                }
            })
            .collect()
    }

    pub fn max_distance(&self) -> usize {
        self.max_distance
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

fn capitalize_first(term: &str) -> String {
    let mut chars = term.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
