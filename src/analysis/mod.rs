pub mod chunker;
pub mod document;
pub mod service;

pub use chunker::{Chunk, Chunker};
pub use document::{analyze_document, deduplicate, AnalysisResult, SeverityCounts, Stats};
pub use service::{AnalysisContext, AnalysisService, Document, IndexRegistry};
