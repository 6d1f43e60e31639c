use crate::analysis::service::AnalysisContext;
use crate::checker::position::LineIndex;
use crate::checker::{self, tokenizer, ChunkContext};
use crate::error::AnalysisError;
use crate::{Issue, IssueKind, Severity, Token};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, error};

/// Weight of a `suggestion`-severity issue relative to an `error`.
const SUGGESTION_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub error: usize,
    pub suggestion: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub duration_ms: u64,
    pub chunk_count: usize,
    pub worker_count: usize,
    pub byte_size: usize,
    pub token_count: usize,
    pub spelling_issue_count: usize,
    pub grammar_issue_count: usize,
    pub severity_counts: SeverityCounts,
    pub weighted_error_score: f64,
    pub weighted_accuracy: f64,
    pub grammar_enabled: bool,
}

impl Stats {
    /// Issue counts and the weighted accuracy score for a finished document.
    ///
    /// `weighted_accuracy` is `100 - weighted_errors / token_count * 100`,
    /// floored at 0, and exactly 100 when there are no tokens.
    pub fn from_issues(issues: &[Issue], token_count: usize) -> Self {
        let mut severity_counts = SeverityCounts::default();
        let mut spelling_issue_count = 0;
        let mut grammar_issue_count = 0;

        for issue in issues {
            match issue.severity {
                Severity::Error => severity_counts.error += 1,
                Severity::Suggestion => severity_counts.suggestion += 1,
            }
            match issue.kind {
                IssueKind::Spelling => spelling_issue_count += 1,
                IssueKind::Grammar => grammar_issue_count += 1,
            }
        }

        let weighted_error_score =
            severity_counts.error as f64 + SUGGESTION_WEIGHT * severity_counts.suggestion as f64;
        let weighted_accuracy = if token_count > 0 {
            (100.0 - weighted_error_score / token_count as f64 * 100.0).max(0.0)
        } else {
            100.0
        };

        Self {
            duration_ms: 0,
            chunk_count: 0,
            worker_count: 0,
            byte_size: 0,
            token_count,
            spelling_issue_count,
            grammar_issue_count,
            severity_counts,
            weighted_error_score,
            weighted_accuracy,
            grammar_enabled: false,
        }
    }
}

/// Outcome of analyzing one document. A failed analysis carries `error`
/// and nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub document_id: String,
    pub tokens: Vec<Token>,
    pub issues: Vec<Issue>,
    pub stats: Option<Stats>,
    pub error: Option<String>,
}

impl AnalysisResult {
    pub fn failed(document_id: &str, error: String) -> Self {
        Self {
            document_id: document_id.to_string(),
            tokens: Vec::new(),
            issues: Vec::new(),
            stats: None,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn spelling_issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.kind == IssueKind::Spelling)
    }

    pub fn grammar_issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.kind == IssueKind::Grammar)
    }

    /// Drop the token list for callers that only want findings.
    pub fn without_tokens(mut self) -> Self {
        self.tokens = Vec::new();
        self
    }
}

/// Keep one issue per `(start, end)` span, choosing by [`Issue::rank`]
/// (first seen wins ties), and return them ordered by span.
pub fn deduplicate<I>(issues: I) -> Vec<Issue>
where
    I: IntoIterator<Item = Issue>,
{
    let mut best: BTreeMap<(usize, usize), Issue> = BTreeMap::new();
    for issue in issues {
        match best.get(&issue.span()) {
            Some(current) if current.rank() <= issue.rank() => {}
            _ => {
                best.insert(issue.span(), issue);
            }
        }
    }
    best.into_values().collect()
}

/// Analyze one document: chunk it, check the chunks on the context's chunk
/// pool, merge and score. Never fails; errors and panics end up in the
/// result's `error` field.
pub fn analyze_document(document_id: &str, text: &str, ctx: &AnalysisContext) -> AnalysisResult {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| run(document_id, text, ctx)))
        .unwrap_or_else(|payload| Err(AnalysisError::Panicked(panic_message(payload))));

    match outcome {
        Ok(result) => result,
        Err(e) => {
            error!(document = document_id, error = %e, "Document analysis failed");
            AnalysisResult::failed(document_id, e.to_string())
        }
    }
}

fn run(
    document_id: &str,
    text: &str,
    ctx: &AnalysisContext,
) -> Result<AnalysisResult, AnalysisError> {
    let started = Instant::now();
    let lines = LineIndex::new(text);
    let tokens = tokenizer::collect_tokens(text, &lines);
    let chunks = ctx.chunker().split(text);

    let chunk_ctx = ChunkContext {
        lines: &lines,
        index: ctx.index(),
        grammar: ctx.grammar().gate(),
        max_suggestions: ctx.max_suggestions(),
    };

    // Every chunk must finish before deduplication sees the full issue set.
    let per_chunk: Vec<Vec<Issue>> = ctx.run_chunks(|| {
        chunks
            .par_iter()
            .map(|chunk| checker::analyze_chunk(chunk.text, chunk.start_offset, &chunk_ctx))
            .collect::<Result<Vec<_>, _>>()
    })?;

    let issues = deduplicate(per_chunk.into_iter().flatten());

    let mut stats = Stats::from_issues(&issues, tokens.len());
    stats.duration_ms = started.elapsed().as_millis() as u64;
    stats.chunk_count = chunks.len();
    stats.worker_count = ctx.chunk_workers().min(chunks.len());
    stats.byte_size = text.len();
    stats.grammar_enabled = ctx.grammar().is_enabled();

    debug!(
        document = document_id,
        chunks = stats.chunk_count,
        issues = issues.len(),
        duration_ms = stats.duration_ms,
        "Analyzed document"
    );

    Ok(AnalysisResult {
        document_id: document_id.to_string(),
        tokens,
        issues,
        stats: Some(stats),
        error: None,
    })
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
