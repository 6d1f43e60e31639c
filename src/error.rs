use std::path::PathBuf;
use thiserror::Error;

/// Failures while building the spelling index. These are fatal: a broken
/// dictionary is reported, never papered over.
#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("Failed to read dictionary {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse dictionary {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Dictionary {0} must be a JSON array of words or an object of word frequencies")]
    UnsupportedShape(PathBuf),

    #[error("Failed to build membership set: {0}")]
    Fst(#[from] fst::Error),
}

#[derive(Debug, Error)]
pub enum GrammarError {
    /// The engine could not be reached or initialized. Callers degrade to
    /// rule-based grammar coverage.
    #[error("Grammar engine unavailable: {0}")]
    Unavailable(String),

    #[error("Grammar engine request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Grammar engine returned a malformed response: {0}")]
    Protocol(String),
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),

    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error("Analysis panicked: {0}")]
    Panicked(String),
}
