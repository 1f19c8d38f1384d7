//! Core types for detection results.

use serde::{Deserialize, Serialize, Serializer};

use crate::analysis::ResolutionConfidence;

/// Severity levels for issues, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            "info" => Ok(Severity::Info),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// Categories of hallucination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    #[serde(rename = "non_existent_api")]
    NonExistentApi,
    #[serde(rename = "impossible_import")]
    ImpossibleImport,
    #[serde(rename = "ai_code_pattern")]
    AiCodePattern,
    #[serde(rename = "framework_violation")]
    FrameworkViolation,
    #[serde(rename = "deprecated_usage")]
    DeprecatedUsage,
    #[serde(rename = "parse_error")]
    ParseError,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::NonExistentApi => "non_existent_api",
            IssueKind::ImpossibleImport => "impossible_import",
            IssueKind::AiCodePattern => "ai_code_pattern",
            IssueKind::FrameworkViolation => "framework_violation",
            IssueKind::DeprecatedUsage => "deprecated_usage",
            IssueKind::ParseError => "parse_error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "non_existent_api" => Some(IssueKind::NonExistentApi),
            "impossible_import" => Some(IssueKind::ImpossibleImport),
            "ai_code_pattern" => Some(IssueKind::AiCodePattern),
            "framework_violation" => Some(IssueKind::FrameworkViolation),
            "deprecated_usage" => Some(IssueKind::DeprecatedUsage),
            "parse_error" => Some(IssueKind::ParseError),
            _ => None,
        }
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why an issue was raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// Machine-readable reason code, e.g. `no_such_member`.
    pub code: String,
    pub message: String,
}

/// A single detected issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: Severity,
    #[serde(serialize_with = "round3")]
    pub confidence: f64,
    /// 1-based; 0 for file-level issues.
    pub line: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<String>,
    pub evidence: Evidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Issue {
    /// An unscored issue; the scorer fills in confidence and severity.
    pub fn new(kind: IssueKind, line: usize, code: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Info,
            confidence: 0.0,
            line,
            api: None,
            evidence: Evidence {
                code: code.to_string(),
                message: message.into(),
            },
            suggestion: None,
        }
    }

    pub fn with_api(mut self, api: impl Into<String>) -> Self {
        self.api = Some(api.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Create a unique key for this issue (for deduplication/comparison).
    pub fn key(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.kind,
            self.line,
            self.api.as_deref().unwrap_or(""),
            self.evidence.message
        )
    }
}

/// Report ordering: line, then severity (Critical first), kind, message.
pub fn sort_issues(issues: &mut [Issue]) {
    issues.sort_by(|a, b| {
        a.line
            .cmp(&b.line)
            .then(a.severity.cmp(&b.severity))
            .then(a.kind.cmp(&b.kind))
            .then_with(|| a.evidence.message.cmp(&b.evidence.message))
    });
}

/// How specific the knowledge-base lookup behind an issue was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchQuality {
    /// The subject (or its exact parent) was found or proven missing.
    Exact,
    /// A near-miss candidate exists within the suggestion distance.
    Fuzzy,
    /// Only an ancestor path could be confirmed.
    Ancestor,
    /// No lookup backs the issue, e.g. sequence patterns.
    Heuristic,
}

/// Deprecation metadata carried from the matched entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeprecationInfo {
    pub since: Option<String>,
    pub removed_in: Option<String>,
}

/// A validator finding awaiting scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub issue: Issue,
    pub resolution: ResolutionConfidence,
    pub quality: MatchQuality,
    pub deprecation: Option<DeprecationInfo>,
}

impl Candidate {
    pub fn new(issue: Issue, resolution: ResolutionConfidence, quality: MatchQuality) -> Self {
        Self {
            issue,
            resolution,
            quality,
            deprecation: None,
        }
    }
}

/// Serialize a float rounded to three decimals.
pub fn round3<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to_3(*value))
}

pub fn round_to_3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
