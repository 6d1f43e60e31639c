//! DocChk: spelling and grammar analysis for whole documents.
//!
//! Text is split into overlapping chunks, each chunk is checked against a
//! BK-tree spelling index, a fixed table of grammar heuristics and an optional
//! external grammar engine, and the per-chunk findings are merged into one
//! deduplicated, ordered report per document.

pub mod analysis;
pub mod checker;
pub mod cli;
pub mod config;
pub mod dict;
pub mod error;

pub use analysis::{AnalysisResult, AnalysisService, Document, Stats};
pub use checker::suggestions::SpellIndex;
pub use config::Config;
pub use error::{AnalysisError, DictionaryError, GrammarError};

use checker::position::LineIndex;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Half-open `[start, end)` byte span into the document, plus the 1-based
/// line/column of `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(start: usize, end: usize, lines: &LineIndex) -> Self {
        let (line, col) = lines.offset_to_position(start);
        Self {
            start,
            end,
            line,
            col,
        }
    }

    pub fn span(&self) -> (usize, usize) {
        (self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Spelling,
    Grammar,
}

impl IssueKind {
    /// Grammar findings win over spelling findings at the same span.
    fn rank(self) -> u8 {
        match self {
            IssueKind::Grammar => 0,
            IssueKind::Spelling => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Suggestion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    #[serde(default)]
    pub severity: Severity,
    pub message: String,
    pub original: String,
    pub suggestions: Vec<String>,
    pub position: Position,
}

impl Issue {
    pub fn spelling(original: &str, suggestions: Vec<String>, position: Position) -> Self {
        Self {
            kind: IssueKind::Spelling,
            severity: Severity::Error,
            message: "Possible misspelling".to_string(),
            original: original.to_string(),
            suggestions,
            position,
        }
    }

    pub fn grammar(
        message: &str,
        original: &str,
        suggestions: Vec<String>,
        position: Position,
    ) -> Self {
        Self {
            kind: IssueKind::Grammar,
            severity: Severity::Error,
            message: message.to_string(),
            original: original.to_string(),
            suggestions,
            position,
        }
    }

    pub fn span(&self) -> (usize, usize) {
        self.position.span()
    }

    /// Ordering used when several issues share a span: lower is better.
    pub fn rank(&self) -> (u8, Reverse<usize>, Reverse<usize>) {
        (
            self.kind.rank(),
            Reverse(self.suggestions.len()),
            Reverse(self.message.len()),
        )
    }
}
