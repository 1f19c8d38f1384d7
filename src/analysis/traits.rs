//! Core traits for language analysis.

use std::path::Path;

use thiserror::Error;

use super::{Deadline, SymbolTable, UsageFact};

/// Per-file failures. These end up as ParseError issues on the file's
/// report and never abort a batch.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("analysis exceeded the {budget_ms}ms budget")]
    Timeout { budget_ms: u64 },
    #[error("cannot read source: {0}")]
    Io(#[from] std::io::Error),
    #[error("no analyzer registered for language {0:?}")]
    UnsupportedLanguage(String),
    #[error("parser setup failed: {0}")]
    Parser(String),
}

impl AnalysisError {
    /// Machine-readable reason code carried into the issue evidence.
    pub fn evidence_code(&self) -> &'static str {
        match self {
            AnalysisError::Syntax { .. } => "syntax_error",
            AnalysisError::Timeout { .. } => "timeout",
            AnalysisError::Io(_) => "io_error",
            AnalysisError::UnsupportedLanguage(_) => "unsupported_language",
            AnalysisError::Parser(_) => "parser_error",
        }
    }
}

/// Holds a parsed tree-sitter tree and associated metadata.
pub struct ParsedFile {
    /// The tree-sitter parse tree.
    pub tree: tree_sitter::Tree,
    /// The original source code (kept for node text extraction).
    pub source: Vec<u8>,
    /// The file path (for error reporting).
    pub path: String,
}

impl ParsedFile {
    /// Get text for a tree-sitter node.
    pub fn node_text(&self, node: tree_sitter::Node) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }
}

/// Output of the usage extractor for one file.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Facts in extraction order; `facts[i].seq == i`.
    pub facts: Vec<UsageFact>,
    pub symbols: SymbolTable,
}

/// Language-specific analyzer trait.
///
/// # Thread Safety
///
/// tree_sitter::Parser is not Sync, so implementations create a parser
/// per call.
pub trait LanguageAnalyzer: Send + Sync {
    /// Returns the language identifier (e.g., "python").
    fn language_id(&self) -> &'static str;

    /// Returns file extensions this analyzer handles (without dot).
    fn file_extensions(&self) -> &'static [&'static str];

    /// Parse source into a syntax tree.
    ///
    /// Trees containing error or missing nodes are rejected with
    /// [`AnalysisError::Syntax`].
    fn parse(
        &self,
        path: &Path,
        source: &[u8],
        deadline: &Deadline,
    ) -> Result<ParsedFile, AnalysisError>;

    /// Walk the tree once and collect usage facts and local bindings.
    fn extract_usages(
        &self,
        parsed: &ParsedFile,
        deadline: &Deadline,
    ) -> Result<Extraction, AnalysisError>;

    /// Check if this analyzer handles the given file extension.
    fn handles_extension(&self, ext: &str) -> bool {
        self.file_extensions().contains(&ext)
    }
}
