use crate::analysis::chunker::Chunker;
use crate::analysis::document::{analyze_document, AnalysisResult};
use crate::checker::dictionary::Lexicon;
use crate::checker::external::GrammarBackend;
use crate::checker::suggestions::SpellIndex;
use crate::config::Config;
use crate::error::{AnalysisError, DictionaryError};
use dashmap::DashMap;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A named text to analyze.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct IndexKey {
    dictionary_path: Option<PathBuf>,
    language: String,
    max_distance: usize,
}

/// Spelling indexes built so far, shared between services. An index is
/// built once per dictionary and distance and never mutated afterwards.
#[derive(Default)]
pub struct IndexRegistry {
    indexes: DashMap<IndexKey, Arc<SpellIndex>>,
}

impl IndexRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&self, config: &Config) -> Result<Arc<SpellIndex>, DictionaryError> {
        let key = IndexKey {
            dictionary_path: config.dictionary_path.clone(),
            language: config.language.clone(),
            max_distance: config.max_edit_distance,
        };

        if let Some(index) = self.indexes.get(&key) {
            debug!(language = %key.language, "Reusing spelling index");
            return Ok(Arc::clone(index.value()));
        }

        let lexicon = Lexicon::load(config.dictionary_path.as_deref(), &config.language)?;
        let index = Arc::new(SpellIndex::build(lexicon, config.max_edit_distance));

        // A concurrent build for the same key may have won; keep whichever landed first.
        let entry = self.indexes.entry(key).or_insert(index);
        Ok(Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }
}

/// Everything one document analysis reads. Immutable once built.
///
/// The chunk pool is shared by every document the service runs at once
/// rather than built per document: thread start-up would otherwise be paid
/// for each document, and rayon's work stealing keeps one document's chunks
/// from starving another's. A document reports as its worker count the
/// number of pool threads its chunks can occupy.
pub struct AnalysisContext {
    index: Arc<SpellIndex>,
    grammar: GrammarBackend,
    chunker: Chunker,
    max_suggestions: usize,
    chunk_workers: usize,
    chunk_pool: Option<ThreadPool>,
}

impl AnalysisContext {
    pub fn new(config: &Config, index: Arc<SpellIndex>, grammar: GrammarBackend) -> Self {
        let chunk_workers = config.resolved_chunk_workers();
        Self {
            index,
            grammar,
            chunker: Chunker::new(config.chunk_size, config.chunk_overlap),
            max_suggestions: config.max_suggestions,
            chunk_workers,
            chunk_pool: build_pool(chunk_workers, "docchk-chunk"),
        }
    }

    pub fn index(&self) -> &SpellIndex {
        &self.index
    }

    pub fn grammar(&self) -> &GrammarBackend {
        &self.grammar
    }

    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    pub fn max_suggestions(&self) -> usize {
        self.max_suggestions
    }

    pub fn chunk_workers(&self) -> usize {
        self.chunk_workers
    }

    /// Run `op` on the chunk pool, or on the global pool if ours failed to start.
    pub(crate) fn run_chunks<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        match &self.chunk_pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

/// Analyzes batches of documents in parallel.
///
/// Documents run on the document pool, the chunks of each document on the
/// chunk pool. Results come back in input order, one per document, and a
/// failing document never affects the others.
pub struct AnalysisService {
    context: AnalysisContext,
    document_workers: usize,
    document_pool: Option<ThreadPool>,
}

impl AnalysisService {
    pub fn new(config: &Config, registry: &IndexRegistry) -> Result<Self, AnalysisError> {
        let index = registry.get_or_build(config)?;
        let grammar = GrammarBackend::from_config(config);
        Ok(Self::with_parts(config, index, grammar))
    }

    /// Assemble a service from an existing index and grammar backend.
    pub fn with_parts(config: &Config, index: Arc<SpellIndex>, grammar: GrammarBackend) -> Self {
        let document_workers = config.resolved_document_workers();
        let context = AnalysisContext::new(config, index, grammar);

        info!(
            document_workers,
            chunk_workers = context.chunk_workers(),
            grammar = context.grammar().is_enabled(),
            "Analysis service ready"
        );

        Self {
            context,
            document_workers,
            document_pool: build_pool(document_workers, "docchk-doc"),
        }
    }

    pub fn analyze(&self, documents: &[Document]) -> Vec<AnalysisResult> {
        let run = || -> Vec<AnalysisResult> {
            documents
                .par_iter()
                .map(|doc| analyze_document(&doc.id, &doc.content, &self.context))
                .collect()
        };
        match &self.document_pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }

    pub fn analyze_one(&self, document: &Document) -> AnalysisResult {
        analyze_document(&document.id, &document.content, &self.context)
    }

    pub fn context(&self) -> &AnalysisContext {
        &self.context
    }

    pub fn document_workers(&self) -> usize {
        self.document_workers
    }
}

fn build_pool(threads: usize, name: &'static str) -> Option<ThreadPool> {
    match ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(move |i| format!("{}-{}", name, i))
        .build()
    {
        Ok(pool) => Some(pool),
        Err(e) => {
            warn!(pool = name, error = %e, "Failed to start worker pool, using the global pool");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::dictionary::DictionarySource;
    use crate::checker::external::{EngineMatch, GrammarEngine, GrammarGate};
    use crate::error::GrammarError;
    use crate::IssueKind;

    fn config() -> Config {
        Config {
            grammar_enabled: false,
            document_workers: 2,
            chunk_workers: 2,
            ..Config::default()
        }
    }

    fn index(words: &[&str]) -> Arc<SpellIndex> {
        let lexicon = Lexicon::from_entries(
            words.iter().map(|w| (w.to_string(), 1)),
            DictionarySource::Builtin,
        )
        .unwrap();
        Arc::new(SpellIndex::build(lexicon, 2))
    }

    struct Panicking;

    impl GrammarEngine for Panicking {
        fn check(&mut self, text: &str) -> Result<Vec<EngineMatch>, GrammarError> {
            if text.contains("explode") {
                panic!("engine crashed");
            }
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_results_in_input_order() {
        let service = AnalysisService::with_parts(
            &config(),
            index(&["one", "two", "three"]),
            GrammarBackend::Disabled("test".into()),
        );
        let docs: Vec<_> = (0..20)
            .map(|i| Document::new(format!("doc-{i}"), "one two three"))
            .collect();

        let results = service.analyze(&docs);
        let ids: Vec<_> = results.iter().map(|r| r.document_id.as_str()).collect();
        let expected: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, expected);
        assert!(results.iter().all(|r| r.is_ok() && r.issues.is_empty()));
    }

    #[test]
    fn test_panic_isolated_to_one_document() {
        let service = AnalysisService::with_parts(
            &config(),
            index(&["fine", "text", "explode"]),
            GrammarBackend::Enabled(GrammarGate::new(Box::new(Panicking))),
        );
        let docs = vec![
            Document::new("a", "fine text"),
            Document::new("b", "explode"),
            Document::new("c", "fine text"),
        ];

        let results = service.analyze(&docs);
        assert!(results[0].is_ok());
        assert!(results[2].is_ok());
        assert_eq!(results[1].error.as_deref(), Some("Analysis panicked: engine crashed"));
        assert!(results[1].stats.is_none());
    }

    #[test]
    fn test_stats_filled_in() {
        let service = AnalysisService::with_parts(
            &config(),
            index(&["the", "cat", "sat"]),
            GrammarBackend::Disabled("test".into()),
        );
        let result = service.analyze_one(&Document::new("d", "The cat szt"));
        let stats = result.stats.unwrap();
        assert_eq!(stats.token_count, 3);
        assert_eq!(stats.chunk_count, 1);
        assert_eq!(stats.byte_size, 11);
        // one chunk keeps one worker busy
        assert_eq!(stats.worker_count, 1);
        assert!(!stats.grammar_enabled);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].kind, IssueKind::Spelling);
    }

    #[test]
    fn test_registry_reuses_index() {
        let registry = IndexRegistry::new();
        let first = registry.get_or_build(&config()).unwrap();
        let second = registry.get_or_build(&config()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);

        let wider = Config {
            max_edit_distance: 3,
            ..config()
        };
        registry.get_or_build(&wider).unwrap();
        assert_eq!(registry.len(), 2);
    }
}
