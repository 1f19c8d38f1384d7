//! AST-backed usage extraction and local type resolution.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌────────────────────┐
//! │ Source File │────▶│ Analyzer     │────▶│ Extraction         │
//! └─────────────┘     │ (Python)     │     │ (UsageFacts,       │
//!                     └──────────────┘     │  SymbolTable)      │
//!                                          └────────────────────┘
//!                                                    │
//!                                                    ▼
//!                                          ┌────────────────────┐
//!                                          │ Resolver           │
//!                                          │ (origin+confidence)│
//!                                          └────────────────────┘
//! ```
//!
//! # Adding a New Language
//!
//! 1. Create a new module in `src/analysis/languages/`
//! 2. Implement the `LanguageAnalyzer` trait, producing `UsageFact`s and a
//!    `SymbolTable` in one pass
//! 3. Register the analyzer in `languages/mod.rs`

mod deadline;
mod facts;
mod languages;
pub mod resolver;
mod symbols;
mod traits;

pub use deadline::Deadline;
pub use facts::{is_pascal_case, Origin, Resolution, ResolutionConfidence, UsageFact, UsageKind};
pub use languages::{
    get_analyzer, get_analyzer_by_id, register_analyzers, registered_languages, PythonAnalyzer,
};
pub use resolver::resolve;
pub use symbols::{Binding, BindingOrigin, SymbolTable};
pub use traits::{AnalysisError, Extraction, LanguageAnalyzer, ParsedFile};
