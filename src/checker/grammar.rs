//! Heuristic grammar rules over a token window.
//!
//! Each rule looks at the current token and at most three tokens before it.
//! The table is fixed; adding a rule means adding an entry to [`RULES`].

use crate::checker::position::LineIndex;
use crate::checker::tokenizer::Word;
use crate::{Issue, Position};
use lazy_static::lazy_static;
use std::collections::HashSet;

const IRREGULAR_PAST: &[(&str, &[&str])] = &[("runned", &["ran"]), ("seen", &["saw"])];

lazy_static! {
    static ref SINGULAR_SUBJECTS: HashSet<&'static str> =
        HashSet::from(["he", "she", "it", "cat", "dog", "student", "child"]);
    static ref BASE_VERBS: HashSet<&'static str> =
        HashSet::from(["chase", "run", "walk", "talk", "wait", "plan"]);
    static ref ARTICLE_NOUNS: HashSet<&'static str> =
        HashSet::from(["park", "zoo", "market", "office"]);
    static ref MASS_NOUNS: HashSet<&'static str> = HashSet::from(["homework"]);
}

/// Lowercased tokens of one chunk and the index of the token under test.
pub struct Window<'a> {
    lower: &'a [String],
    idx: usize,
}

impl<'a> Window<'a> {
    fn current(&self) -> &'a str {
        &self.lower[self.idx]
    }

    fn previous(&self) -> Option<&'a str> {
        self.idx.checked_sub(1).map(|i| self.lower[i].as_str())
    }

    fn lookback(&self, n: usize) -> &'a [String] {
        &self.lower[self.idx.saturating_sub(n)..self.idx]
    }

    fn previous_in(&self, set: &[&str]) -> bool {
        self.previous().is_some_and(|prev| set.contains(&prev))
    }
}

pub struct Rule {
    pub name: &'static str,
    pub message: &'static str,
    /// Suggestions when the rule fires, `None` otherwise.
    pub check: fn(&Window) -> Option<Vec<String>>,
}

pub static RULES: &[Rule] = &[
    Rule {
        name: "irregular-past",
        message: "Use the correct past tense form.",
        check: |w| {
            IRREGULAR_PAST
                .iter()
                .find(|(misuse, _)| *misuse == w.current())
                .map(|(_, forms)| forms.iter().map(|f| f.to_string()).collect())
        },
    },
    Rule {
        name: "plural-was",
        message: "Use a plural verb with a plural subject.",
        check: |w| (w.current() == "was" && w.previous_in(&["they", "we"])).then(|| vec!["were".into()]),
    },
    Rule {
        name: "singular-dont",
        message: "Use \"doesn't\" for third-person singular.",
        check: |w| {
            (matches!(w.current(), "dont" | "don't") && w.previous_in(&["she", "he", "it"]))
                .then(|| vec!["doesn't".into()])
        },
    },
    Rule {
        name: "compound-subject-is",
        message: "Use a plural verb after a compound subject.",
        check: |w| {
            (w.current() == "is" && w.lookback(3).iter().any(|t| t == "and"))
                .then(|| vec!["are".into()])
        },
    },
    Rule {
        name: "third-person-singular",
        message: "Use the third-person singular verb with a singular subject.",
        check: |w| {
            let verb = w.current();
            let subject = w.previous()?;
            (BASE_VERBS.contains(verb) && SINGULAR_SUBJECTS.contains(subject))
                .then(|| vec![format!("{}s", verb), format!("{}ed", verb)])
        },
    },
    Rule {
        name: "missing-article",
        message: "Add an article before the noun.",
        check: |w| {
            let noun = w.current();
            (ARTICLE_NOUNS.contains(noun) && w.previous_in(&["at", "in", "to", "into"]))
                .then(|| vec![format!("the {}", noun)])
        },
    },
    Rule {
        name: "mass-noun-plural",
        message: "Use the singular form for this mass noun.",
        check: |w| {
            let stem = w.current().strip_suffix('s')?;
            MASS_NOUNS.contains(stem).then(|| vec![stem.to_string()])
        },
    },
];

/// Run every rule over the tokens of one chunk. Spans are taken from the
/// tokens as given, so they must already be document-absolute.
pub fn check(words: &[Word<'_>], lines: &LineIndex) -> Vec<Issue> {
    let lower: Vec<String> = words.iter().map(|w| w.text.to_lowercase()).collect();
    let mut issues = Vec::new();

    for (idx, word) in words.iter().enumerate() {
        let window = Window { lower: &lower, idx };
        for rule in RULES {
            if let Some(suggestions) = (rule.check)(&window) {
                issues.push(Issue::grammar(
                    rule.message,
                    word.text,
                    suggestions,
                    Position::new(word.start, word.end, lines),
                ));
            }
        }
    }

    issues
}
