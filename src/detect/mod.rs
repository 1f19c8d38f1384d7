//! Detection rules that turn resolved usages into scored issues.

mod patterns;
mod runner;
mod signature;
mod stdlib;
mod types;
mod validator;

pub use patterns::detect_patterns;
pub(crate) use runner::failed_report;
pub use runner::FileAnalyzer;
pub use signature::{Mismatch, ParamSpec};
pub use stdlib::is_stdlib;
pub use types::{
    round3, round_to_3, sort_issues, Candidate, DeprecationInfo, Evidence, Issue, IssueKind,
    MatchQuality, Severity,
};
pub use validator::{validate, ValidatorOptions};
