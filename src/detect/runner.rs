//! Per-file pipeline: parse, extract, resolve, validate, score.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use crate::analysis::{
    get_analyzer_by_id, resolve, resolver::coverage_weight, AnalysisError, Deadline,
    LanguageAnalyzer, ResolutionConfidence, UsageFact, UsageKind,
};
use crate::config::DetectorConfig;
use crate::knowledge::{root_segment, Index};
use crate::report::{AnalysisReport, ReportStatus};
use crate::score::Scorer;

use super::{sort_issues, validate, Issue, IssueKind, MatchQuality, ValidatorOptions};

/// Runs the detection pipeline for single files against one index snapshot.
pub struct FileAnalyzer<'a> {
    index: &'a Index,
    analyzer: &'static dyn LanguageAnalyzer,
    options: ValidatorOptions,
    scorer: Scorer,
    min_confidence: f64,
    timeout: Duration,
    target: Duration,
    retain_facts: bool,
}

impl<'a> FileAnalyzer<'a> {
    /// Create an analyzer for the configured language.
    pub fn new(index: &'a Index, config: &DetectorConfig) -> anyhow::Result<Self> {
        let analyzer = get_analyzer_by_id(&config.language)
            .ok_or_else(|| AnalysisError::UnsupportedLanguage(config.language.clone()))?;
        Ok(Self {
            index,
            analyzer,
            options: ValidatorOptions::from_config(config)?,
            scorer: Scorer::new(config.effective_reference_date()),
            min_confidence: config.min_confidence,
            timeout: config.per_file_timeout(),
            target: config.target_duration(),
            retain_facts: config.retain_facts,
        })
    }

    pub fn index(&self) -> &Index {
        self.index
    }

    /// Read and analyze a file on disk. Files whose extension the configured
    /// language does not handle are reported as unsupported without reading.
    pub fn analyze_path(&self, path: &Path) -> AnalysisReport {
        let deadline = Deadline::new(self.timeout);
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if !self.analyzer.handles_extension(ext) {
                let err = AnalysisError::UnsupportedLanguage(format!(".{}", ext));
                debug!(file = %path.display(), language = self.analyzer.language_id(), "skipping file");
                return failed_report(path, err.evidence_code(), &err.to_string(), deadline.elapsed());
            }
        }
        match fs::read(path) {
            Ok(source) => self.run(path, &source, deadline),
            Err(e) => {
                let err = AnalysisError::Io(e);
                warn!(file = %path.display(), error = %err, "cannot read file");
                failed_report(path, err.evidence_code(), &err.to_string(), deadline.elapsed())
            }
        }
    }

    /// Analyze in-memory source attributed to `path`.
    pub fn analyze_source(&self, path: &Path, source: &[u8]) -> AnalysisReport {
        self.run(path, source, Deadline::new(self.timeout))
    }

    fn run(&self, path: &Path, source: &[u8], deadline: Deadline) -> AnalysisReport {
        let report = match self.pipeline(path, source, &deadline) {
            Ok(report) => report,
            Err(err) => {
                match &err {
                    AnalysisError::Timeout { budget_ms } => {
                        warn!(file = %path.display(), budget_ms = *budget_ms, "analysis timed out")
                    }
                    _ => debug!(file = %path.display(), error = %err, "analysis failed"),
                }
                failed_report(path, err.evidence_code(), &err.to_string(), deadline.elapsed())
            }
        };

        let elapsed = deadline.elapsed();
        if elapsed > self.target {
            warn!(
                file = %path.display(),
                elapsed_ms = elapsed.as_millis() as u64,
                target_ms = self.target.as_millis() as u64,
                "file exceeded target analysis time"
            );
        }
        report
    }

    fn pipeline(
        &self,
        path: &Path,
        source: &[u8],
        deadline: &Deadline,
    ) -> Result<AnalysisReport, AnalysisError> {
        let parsed = self.analyzer.parse(path, source, deadline)?;
        debug!(file = %path.display(), "parsed");

        deadline.check()?;
        let extraction = self.analyzer.extract_usages(&parsed, deadline)?;
        debug!(
            file = %path.display(),
            facts = extraction.facts.len(),
            bindings = extraction.symbols.len(),
            "extracted usages"
        );

        deadline.check()?;
        let facts = resolve(extraction.facts, &extraction.symbols);

        deadline.check()?;
        let candidates = validate(&facts, &extraction.symbols, self.index, &self.options);
        debug!(file = %path.display(), candidates = candidates.len(), "validated");

        deadline.check()?;
        let scored: Vec<Issue> = candidates
            .into_iter()
            .map(|c| self.scorer.finalize(c))
            .collect();
        let (mut issues, mut debug_trace) = Scorer::partition(scored, self.min_confidence);
        sort_issues(&mut issues);
        dedup(&mut issues);
        sort_issues(&mut debug_trace);

        Ok(AnalysisReport {
            file_path: path.display().to_string(),
            status: ReportStatus::Completed,
            frameworks_detected: self.frameworks_in(&facts),
            issues,
            overall_confidence: overall_confidence(&facts),
            processing_time_ms: millis(deadline.elapsed()),
            debug_trace,
            facts: if self.retain_facts { Some(facts) } else { None },
        })
    }

    fn frameworks_in(&self, facts: &[UsageFact]) -> Vec<String> {
        let found: BTreeSet<&str> = facts
            .iter()
            .filter_map(|f| f.resolved_path())
            .filter_map(|path| self.index.framework_for_root(root_segment(path)))
            .collect();
        found.into_iter().map(String::from).collect()
    }
}

/// A ParseFailed report carrying a single ParseError issue.
pub(crate) fn failed_report(
    path: &Path,
    code: &str,
    message: &str,
    elapsed: Duration,
) -> AnalysisReport {
    let issue = Scorer::default().score(
        Issue::new(IssueKind::ParseError, 0, code, message),
        ResolutionConfidence::High,
        MatchQuality::Exact,
    );
    AnalysisReport {
        file_path: path.display().to_string(),
        status: ReportStatus::ParseFailed,
        frameworks_detected: Vec::new(),
        issues: vec![issue],
        overall_confidence: 0.0,
        processing_time_ms: millis(elapsed),
        debug_trace: Vec::new(),
        facts: None,
    }
}

fn millis(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}

fn dedup(issues: &mut Vec<Issue>) {
    let mut seen = HashSet::new();
    issues.retain(|issue| seen.insert(issue.key()));
}

/// Mean resolution weight over non-import facts; 1.0 when there are none.
fn overall_confidence(facts: &[UsageFact]) -> f64 {
    let weights: Vec<f64> = facts
        .iter()
        .filter(|f| f.kind != UsageKind::Import)
        .map(coverage_weight)
        .collect();
    if weights.is_empty() {
        return 1.0;
    }
    weights.iter().sum::<f64>() / weights.len() as f64
}
