use crate::{AnalysisResult, Issue, IssueKind, Severity, Stats, Token};
use colored::*;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// One document as reported in JSON, issues split by kind.
#[derive(Debug, Serialize)]
struct JsonDocument<'a> {
    document_id: &'a str,
    spelling: Vec<&'a Issue>,
    grammar: Vec<&'a Issue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tokens: Option<&'a [Token]>,
    stats: Option<&'a Stats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
    documents_checked: usize,
    total_issues: usize,
    documents: Vec<JsonDocument<'a>>,
}

pub fn render_json(results: &[AnalysisResult], include_tokens: bool) -> serde_json::Result<String> {
    let output = JsonOutput {
        documents_checked: results.len(),
        total_issues: total_issues(results),
        documents: results
            .iter()
            .map(|r| JsonDocument {
                document_id: &r.document_id,
                spelling: r.spelling_issues().collect(),
                grammar: r.grammar_issues().collect(),
                tokens: include_tokens.then_some(r.tokens.as_slice()),
                stats: r.stats.as_ref(),
                error: r.error.as_deref(),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&output)
}

pub fn total_issues(results: &[AnalysisResult]) -> usize {
    results.iter().map(|r| r.issues.len()).sum()
}

pub fn print_text_report(result: &AnalysisResult) {
    if let Some(error) = &result.error {
        println!("\n{}", result.document_id.bold().underline());
        println!("  {} analysis failed: {}", "✗".red().bold(), error);
        return;
    }
    if result.issues.is_empty() {
        return;
    }

    println!("\n{}", result.document_id.bold().underline());
    for issue in &result.issues {
        println!("{}", format_issue(issue));
        if !issue.suggestions.is_empty() {
            let suggestions = issue
                .suggestions
                .iter()
                .map(|s| s.green().to_string())
                .collect::<Vec<_>>()
                .join(&", ".dimmed().to_string());
            println!("    {} {}", "→".dimmed(), suggestions);
        }
    }

    if let Some(stats) = &result.stats {
        println!(
            "  {}",
            format!(
                "accuracy {:.1}% over {} words, {} chunks in {} ms",
                stats.weighted_accuracy, stats.token_count, stats.chunk_count, stats.duration_ms
            )
            .dimmed()
        );
    }
}

fn format_issue(issue: &Issue) -> String {
    let line_info = format!("{}:{}", issue.position.line, issue.position.col);
    let kind = match issue.kind {
        IssueKind::Spelling => "spelling",
        IssueKind::Grammar => "grammar",
    };
    let original = match issue.severity {
        Severity::Error => issue.original.red().bold(),
        Severity::Suggestion => issue.original.yellow().bold(),
    };
    format!(
        "  {} {} {} {}",
        line_info.blue().bold(),
        format!("[{}]", kind).dimmed(),
        original,
        issue.message
    )
}

pub fn print_check_summary(results: &[AnalysisResult]) {
    let total = total_issues(results);
    let failed = results.iter().filter(|r| !r.is_ok()).count();
    let documents = results.len();

    println!();
    if total == 0 && failed == 0 {
        println!("{}", "✓ No issues found!".green().bold());
        return;
    }

    if total > 0 {
        println!(
            "{} {} {} found in {} {}",
            "✗".red().bold(),
            total.to_string().red().bold(),
            if total == 1 { "issue" } else { "issues" },
            documents,
            if documents == 1 { "document" } else { "documents" }
        );
    }
    if failed > 0 {
        println!(
            "{} {} could not be analyzed",
            "✗".red().bold(),
            if failed == 1 {
                "1 document".to_string()
            } else {
                format!("{} documents", failed)
            }
        );
    }
}
