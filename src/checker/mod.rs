pub mod bktree;
pub mod dictionary;
pub mod external;
pub mod grammar;
pub mod position;
pub mod suggestions;
pub mod tokenizer;

use crate::error::AnalysisError;
use crate::{Issue, Position};
use external::GrammarGate;
use lazy_static::lazy_static;
use position::LineIndex;
use std::collections::HashMap;
use suggestions::SpellIndex;
use tokenizer::Word;

lazy_static! {
    // Frequent typos whose corrections the index ranks poorly.
    static ref COMMON_MISSPELLINGS: HashMap<&'static str, &'static str> = HashMap::from([
        ("buss", "bus"),
        ("tommorrrow", "tomorrow"),
        ("zooo", "zoo"),
        ("sisted", "sister"),
    ]);
}

/// Shared, read-only inputs for analyzing the chunks of one document.
#[derive(Clone, Copy)]
pub struct ChunkContext<'a> {
    pub lines: &'a LineIndex,
    pub index: &'a SpellIndex,
    pub grammar: Option<&'a GrammarGate>,
    pub max_suggestions: usize,
}

/// Check one chunk. `start_offset` is the chunk's position in the document;
/// every returned span is document-absolute.
pub fn analyze_chunk(
    chunk: &str,
    start_offset: usize,
    ctx: &ChunkContext<'_>,
) -> Result<Vec<Issue>, AnalysisError> {
    let words: Vec<Word<'_>> = tokenizer::words(chunk, start_offset).collect();
    let mut issues = Vec::new();

    for word in &words {
        let lower = word.text.to_lowercase();
        let suggestions = if let Some(fix) = COMMON_MISSPELLINGS.get(lower.as_str()) {
            vec![fix.to_string()]
        } else if !ctx.index.is_correct(word.text) {
            ctx.index.suggest(word.text, ctx.max_suggestions)
        } else {
            continue;
        };

        issues.push(Issue::spelling(
            word.text,
            suggestions,
            Position::new(word.start, word.end, ctx.lines),
        ));
    }

    if let Some(gate) = ctx.grammar {
        for m in gate.check(chunk)? {
            let local_end = (m.offset + m.error_length).min(chunk.len());
            let local_start = m.offset.min(local_end);
            let start = start_offset + local_start;
            let end = start_offset + local_end;

            issues.push(Issue {
                kind: m.kind(),
                severity: m.severity(),
                original: chunk.get(local_start..local_end).unwrap_or_default().to_string(),
                suggestions: m.replacements.into_iter().take(external::MAX_REPLACEMENTS).collect(),
                position: Position::new(start, end, ctx.lines),
                message: m.message,
            });
        }
    }

    issues.extend(grammar::check(&words, ctx.lines));
    Ok(issues)
}
