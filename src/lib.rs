//! Groundcheck - hallucinated API detection for AI-generated code.
//!
//! Groundcheck checks the framework APIs a source file uses against a
//! knowledge base of the APIs that actually exist. It reports imports of
//! modules that do not exist, calls to members a framework never had,
//! arguments a signature cannot accept, deprecated APIs, and usage
//! sequences typical of generated code.
//!
//! # Architecture
//!
//! - `knowledge`: Index of real framework API surface, reloadable
//! - `analysis`: tree-sitter extraction of usage facts and local type resolution
//! - `detect`: Validation rules and the per-file pipeline
//! - `score`: Confidence scoring and severity banding
//! - `batch`: Bounded concurrent analysis with cancellation
//! - `report`: Output formatting (JSON, pretty)
//! - `config`: YAML detector configuration
//!
//! # Adding a New Language
//!
//! See `src/analysis/languages/` for the Python analyzer. Implement the
//! `LanguageAnalyzer` trait and register it in `languages/mod.rs`.

pub mod analysis;
pub mod batch;
pub mod config;
pub mod detect;
pub mod knowledge;
pub mod report;
pub mod score;

pub use analysis::{register_analyzers, LanguageAnalyzer, PythonAnalyzer, UsageFact, UsageKind};
pub use batch::{analyze_batch, BatchAnalyzer, BatchOutcome, CancellationToken, SourceInput};
pub use config::DetectorConfig;
pub use detect::{FileAnalyzer, Issue, IssueKind, Severity};
pub use knowledge::{Index, KnowledgeBase, KnowledgeEntry};
pub use report::{AnalysisReport, ReportStatus};
pub use score::Scorer;

/// Initialize all subsystems.
///
/// Call this once at startup. Lookups also initialize lazily.
pub fn init() {
    register_analyzers();
}
