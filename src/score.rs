//! Confidence scoring and severity banding.
//!
//! Confidence is the sum of three components, clamped to `[0, 1]`:
//!
//! | component          | values                                              |
//! |--------------------|-----------------------------------------------------|
//! | resolution         | high 0.4, medium 0.3, low 0.15                      |
//! | lookup specificity | exact 0.4, fuzzy 0.25, ancestor 0.1, heuristic 0.1  |
//! | intrinsic (kind)   | 0.2, except framework violation 0.15, pattern 0.1   |
//!
//! Severity follows from confidence, except for deprecations, which are
//! banded by how long the API has been deprecated.

use chrono::{NaiveDate, Utc};

use crate::analysis::ResolutionConfidence;
use crate::detect::{round_to_3, Candidate, DeprecationInfo, Issue, IssueKind, MatchQuality, Severity};

/// Component weights.
pub mod weights {
    pub const RESOLUTION_HIGH: f64 = 0.4;
    pub const RESOLUTION_MEDIUM: f64 = 0.3;
    pub const RESOLUTION_LOW: f64 = 0.15;

    pub const MATCH_EXACT: f64 = 0.4;
    pub const MATCH_FUZZY: f64 = 0.25;
    pub const MATCH_ANCESTOR: f64 = 0.1;
    pub const MATCH_HEURISTIC: f64 = 0.1;

    pub const INTRINSIC_DEFAULT: f64 = 0.2;
    pub const INTRINSIC_FRAMEWORK_VIOLATION: f64 = 0.15;
    pub const INTRINSIC_PATTERN: f64 = 0.1;

    /// Sequence heuristics never score above this.
    pub const PATTERN_CEILING: f64 = 0.6;
}

/// Lower bounds of each severity band.
pub mod bands {
    pub const CRITICAL: f64 = 0.9;
    pub const HIGH: f64 = 0.75;
    pub const MEDIUM: f64 = 0.5;
    pub const LOW: f64 = 0.25;
}

/// Deprecation age thresholds, in years.
const DEPRECATION_HIGH_YEARS: f64 = 3.0;
const DEPRECATION_MEDIUM_YEARS: f64 = 1.0;

fn resolution_weight(resolution: ResolutionConfidence) -> f64 {
    match resolution {
        ResolutionConfidence::High => weights::RESOLUTION_HIGH,
        ResolutionConfidence::Medium => weights::RESOLUTION_MEDIUM,
        ResolutionConfidence::Low => weights::RESOLUTION_LOW,
    }
}

fn match_weight(quality: MatchQuality) -> f64 {
    match quality {
        MatchQuality::Exact => weights::MATCH_EXACT,
        MatchQuality::Fuzzy => weights::MATCH_FUZZY,
        MatchQuality::Ancestor => weights::MATCH_ANCESTOR,
        MatchQuality::Heuristic => weights::MATCH_HEURISTIC,
    }
}

fn intrinsic_weight(kind: IssueKind) -> f64 {
    match kind {
        IssueKind::FrameworkViolation => weights::INTRINSIC_FRAMEWORK_VIOLATION,
        IssueKind::AiCodePattern => weights::INTRINSIC_PATTERN,
        IssueKind::ImpossibleImport
        | IssueKind::NonExistentApi
        | IssueKind::DeprecatedUsage
        | IssueKind::ParseError => weights::INTRINSIC_DEFAULT,
    }
}

/// Map a confidence to its severity band.
pub fn severity_for(confidence: f64) -> Severity {
    match confidence {
        c if c >= bands::CRITICAL => Severity::Critical,
        c if c >= bands::HIGH => Severity::High,
        c if c >= bands::MEDIUM => Severity::Medium,
        c if c >= bands::LOW => Severity::Low,
        _ => Severity::Info,
    }
}

/// Parse a deprecation marker as a date: `YYYY-MM-DD`, `YYYY-MM` or `YYYY`.
/// Version strings such as `0.95.0` yield `None`.
fn parse_deprecation_date(since: &str) -> Option<NaiveDate> {
    let since = since.trim();
    if let Ok(date) = NaiveDate::parse_from_str(since, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", since), "%Y-%m-%d") {
        return Some(date);
    }
    if since.len() == 4 && since.chars().all(|c| c.is_ascii_digit()) {
        let year = since.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }
    None
}

/// Scores validator candidates.
#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    reference_date: NaiveDate,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(Utc::now().date_naive())
    }
}

impl Scorer {
    /// Deprecation ages are measured against `reference_date`.
    pub fn new(reference_date: NaiveDate) -> Self {
        Self { reference_date }
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// Compute confidence and severity for an issue.
    pub fn score(
        &self,
        mut issue: Issue,
        resolution: ResolutionConfidence,
        quality: MatchQuality,
    ) -> Issue {
        let raw = resolution_weight(resolution) + match_weight(quality) + intrinsic_weight(issue.kind);
        let mut confidence = raw.clamp(0.0, 1.0);
        if issue.kind == IssueKind::AiCodePattern {
            confidence = confidence.min(weights::PATTERN_CEILING);
        }
        issue.confidence = round_to_3(confidence);
        issue.severity = severity_for(issue.confidence);
        issue
    }

    /// Score a candidate, applying deprecation-age severity where relevant.
    pub fn finalize(&self, candidate: Candidate) -> Issue {
        let Candidate {
            issue,
            resolution,
            quality,
            deprecation,
        } = candidate;
        let mut issue = self.score(issue, resolution, quality);
        if issue.kind == IssueKind::DeprecatedUsage {
            issue.severity = self.deprecation_severity(deprecation.as_ref());
        }
        issue
    }

    /// Severity for a deprecated API, by how long ago it was deprecated.
    pub fn deprecation_severity(&self, info: Option<&DeprecationInfo>) -> Severity {
        let Some(info) = info else {
            return Severity::Medium;
        };
        if info.removed_in.is_some() {
            return Severity::High;
        }
        let Some(since) = info.since.as_deref().and_then(parse_deprecation_date) else {
            return Severity::Medium;
        };

        let years = (self.reference_date - since).num_days() as f64 / 365.25;
        if years >= DEPRECATION_HIGH_YEARS {
            Severity::High
        } else if years >= DEPRECATION_MEDIUM_YEARS {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// Split issues into reported and suppressed by confidence.
    pub fn partition(issues: Vec<Issue>, min_confidence: f64) -> (Vec<Issue>, Vec<Issue>) {
        issues
            .into_iter()
            .partition(|issue| issue.confidence >= min_confidence)
    }
}
