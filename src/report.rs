//! Per-file analysis reports and their output formats.
//!
//! Supports two output formats:
//! - JSON: structured output for programmatic consumption
//! - Pretty: colored terminal output for human readability

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write;

use colored::*;
use serde::{Deserialize, Serialize};

use crate::analysis::UsageFact;
use crate::detect::{round3, Issue, Severity};

/// Whether the pipeline ran to completion for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Completed,
    ParseFailed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Completed => "completed",
            ReportStatus::ParseFailed => "parse_failed",
        }
    }
}

/// Outcome of analyzing one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub file_path: String,
    pub status: ReportStatus,
    /// Frameworks referenced by the file, sorted.
    pub frameworks_detected: Vec<String>,
    /// Reported issues, ordered by line, severity, kind, message.
    pub issues: Vec<Issue>,
    #[serde(serialize_with = "round3")]
    pub overall_confidence: f64,
    #[serde(serialize_with = "round3")]
    pub processing_time_ms: f64,
    /// Issues below the confidence threshold.
    #[serde(skip)]
    pub debug_trace: Vec<Issue>,
    /// Resolved facts, when retained.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facts: Option<Vec<UsageFact>>,
}

impl AnalysisReport {
    pub fn is_completed(&self) -> bool {
        self.status == ReportStatus::Completed
    }
}

// =============================================================================
// JSON Format
// =============================================================================

/// Batch-level JSON envelope.
#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub version: String,
    pub summary: JsonSummary,
    pub files: &'a [AnalysisReport],
}

/// Aggregate counts across a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonSummary {
    pub files_analyzed: usize,
    pub files_failed: usize,
    pub total_issues: usize,
    pub suppressed_issues: usize,
    /// Issue counts keyed by severity.
    pub by_severity: BTreeMap<String, usize>,
    /// Issue counts keyed by kind.
    pub by_kind: BTreeMap<String, usize>,
}

/// Summarize a batch of reports.
pub fn summarize(reports: &[AnalysisReport]) -> JsonSummary {
    let mut summary = JsonSummary {
        files_analyzed: reports.len(),
        ..Default::default()
    };
    for report in reports {
        if !report.is_completed() {
            summary.files_failed += 1;
        }
        summary.suppressed_issues += report.debug_trace.len();
        for issue in &report.issues {
            summary.total_issues += 1;
            *summary
                .by_severity
                .entry(issue.severity.as_str().to_string())
                .or_insert(0) += 1;
            *summary
                .by_kind
                .entry(issue.kind.as_str().to_string())
                .or_insert(0) += 1;
        }
    }
    summary
}

/// Render reports as a pretty-printed JSON document.
pub fn to_json(reports: &[AnalysisReport]) -> anyhow::Result<String> {
    let report = JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        summary: summarize(reports),
        files: reports,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Write reports in JSON format.
pub fn write_json<W: Write>(out: &mut W, reports: &[AnalysisReport]) -> anyhow::Result<()> {
    let json = to_json(reports)?;
    writeln!(out, "{}", json)?;
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Render reports as colored terminal text.
pub fn render_pretty(reports: &[AnalysisReport]) -> String {
    let mut out = String::new();
    let summary = summarize(reports);

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{} v{}",
        "groundcheck".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    let _ = writeln!(out);

    for report in reports {
        write_file_header(&mut out, report);
        if report.issues.is_empty() && report.is_completed() {
            let _ = writeln!(out, "    {}", "no issues".green());
        }
        for issue in &report.issues {
            write_issue(&mut out, issue);
        }
        let _ = writeln!(out);
    }

    let status = if summary.total_issues == 0 {
        "CLEAN".green().bold()
    } else {
        "ISSUES FOUND".red().bold()
    };
    let _ = writeln!(
        out,
        "  {}: {} file(s), {} issue(s), {} failed, {} suppressed",
        status,
        summary.files_analyzed,
        summary.total_issues,
        summary.files_failed,
        summary.suppressed_issues
    );
    out
}

fn write_file_header(out: &mut String, report: &AnalysisReport) {
    let status = match report.status {
        ReportStatus::Completed => report.status.as_str().green(),
        ReportStatus::ParseFailed => report.status.as_str().red(),
    };
    let frameworks = if report.frameworks_detected.is_empty() {
        String::new()
    } else {
        format!(" [{}]", report.frameworks_detected.join(", "))
    };
    let _ = writeln!(
        out,
        "  {} ({}, confidence {:.2}, {:.1}ms){}",
        report.file_path.bold(),
        status,
        report.overall_confidence,
        report.processing_time_ms,
        frameworks.dimmed()
    );
}

fn write_issue(out: &mut String, issue: &Issue) {
    let _ = writeln!(
        out,
        "    {} {:>4}  {} ({:.2})",
        severity_tag(issue.severity),
        issue.line,
        issue.kind.as_str().bold(),
        issue.confidence
    );
    let _ = writeln!(out, "            {}", issue.evidence.message);
    if let Some(suggestion) = &issue.suggestion {
        let _ = writeln!(out, "            {}", suggestion.dimmed());
    }
}

fn severity_tag(severity: Severity) -> ColoredString {
    match severity {
        Severity::Critical => "CRIT ".red().bold(),
        Severity::High => "HIGH ".red(),
        Severity::Medium => "MED  ".yellow(),
        Severity::Low => "LOW  ".blue(),
        Severity::Info => "INFO ".dimmed(),
    }
}
