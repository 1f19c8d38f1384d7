//! Language-specific analyzer implementations.

mod python;

pub use python::PythonAnalyzer;

use super::LanguageAnalyzer;
use once_cell::sync::OnceCell;

/// Static storage for Python analyzer.
static PYTHON_ANALYZER: OnceCell<PythonAnalyzer> = OnceCell::new();

/// Register all available language analyzers.
///
/// Idempotent; lookups call it implicitly.
pub fn register_analyzers() {
    PYTHON_ANALYZER.get_or_init(PythonAnalyzer::new);
}

/// Get an analyzer for the given file extension.
pub fn get_analyzer(ext: &str) -> Option<&'static dyn LanguageAnalyzer> {
    register_analyzers();

    match ext {
        "py" | "pyi" => PYTHON_ANALYZER.get().map(|a| a as &'static dyn LanguageAnalyzer),
        _ => None,
    }
}

/// Get an analyzer by language ID.
pub fn get_analyzer_by_id(lang_id: &str) -> Option<&'static dyn LanguageAnalyzer> {
    register_analyzers();

    match lang_id {
        "python" => PYTHON_ANALYZER.get().map(|a| a as &'static dyn LanguageAnalyzer),
        _ => None,
    }
}

/// Get all registered language IDs.
pub fn registered_languages() -> Vec<String> {
    vec!["python".to_string()]
}
