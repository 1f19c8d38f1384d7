//! Concurrent analysis of many files.
//!
//! Each batch takes one snapshot of the knowledge base and runs one pipeline
//! per file on a rayon pool sized to `max_concurrency`. Reports come back in
//! input order. Failures (syntax, timeout, unreadable file, cancellation)
//! stay inside the file's own report.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::{validate as validate_config, DetectorConfig};
use crate::detect::{failed_report, FileAnalyzer};
use crate::knowledge::{Index, KnowledgeBase};
use crate::report::AnalysisReport;

/// One unit of batch input.
#[derive(Debug, Clone)]
pub enum SourceInput {
    /// A file read from disk.
    Path(PathBuf),
    /// Source held in memory, reported under `virtual_path`.
    Memory { virtual_path: PathBuf, source: String },
}

impl SourceInput {
    pub fn path(&self) -> &Path {
        match self {
            SourceInput::Path(path) => path,
            SourceInput::Memory { virtual_path, .. } => virtual_path,
        }
    }
}

impl From<PathBuf> for SourceInput {
    fn from(path: PathBuf) -> Self {
        SourceInput::Path(path)
    }
}

/// Cooperative cancellation flag shared with a running batch.
///
/// Checked before each file starts; files already running finish normally.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Result of a batch run.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// One report per input, in input order.
    pub reports: Vec<AnalysisReport>,
    /// Most files observed in flight at once.
    pub peak_concurrency: usize,
    /// Whether cancellation was requested during the batch.
    pub cancelled: bool,
}

/// Active/peak counters for in-flight pipelines.
#[derive(Debug, Default)]
struct ActivityGauge {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl ActivityGauge {
    fn enter(&self) -> ActiveGuard<'_> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        ActiveGuard(self)
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

struct ActiveGuard<'a>(&'a ActivityGauge);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Runs batches against a reloadable knowledge base.
pub struct BatchAnalyzer {
    knowledge: Arc<KnowledgeBase>,
    config: DetectorConfig,
}

impl BatchAnalyzer {
    /// Create a batch analyzer; the configuration is validated up front.
    pub fn new(knowledge: Arc<KnowledgeBase>, config: DetectorConfig) -> anyhow::Result<Self> {
        validate_config(&config)?;
        Ok(Self { knowledge, config })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Analyze every input, honoring `token` between files.
    pub fn analyze_batch(&self, inputs: &[SourceInput], token: &CancellationToken) -> BatchOutcome {
        let index = self.knowledge.snapshot();
        run_batch(&index, &self.config, inputs, token)
    }
}

/// Analyze files on disk against `index` with default settings.
pub fn analyze_batch(paths: &[PathBuf], index: &Index, max_concurrency: usize) -> Vec<AnalysisReport> {
    let config = DetectorConfig {
        max_concurrency: max_concurrency.max(1),
        ..Default::default()
    };
    let inputs: Vec<SourceInput> = paths.iter().cloned().map(SourceInput::Path).collect();
    run_batch(index, &config, &inputs, &CancellationToken::new()).reports
}

fn run_batch(
    index: &Index,
    config: &DetectorConfig,
    inputs: &[SourceInput],
    token: &CancellationToken,
) -> BatchOutcome {
    let started = Instant::now();

    let analyzer = match FileAnalyzer::new(index, config) {
        Ok(analyzer) => analyzer,
        Err(e) => {
            warn!(error = %e, "cannot set up file analyzer");
            let message = e.to_string();
            return BatchOutcome {
                reports: inputs
                    .iter()
                    .map(|input| failed_report(input.path(), "parser_error", &message, Duration::ZERO))
                    .collect(),
                peak_concurrency: 0,
                cancelled: token.is_cancelled(),
            };
        }
    };

    let gauge = ActivityGauge::default();
    let analyze_one = |input: &SourceInput| -> AnalysisReport {
        if token.is_cancelled() {
            return failed_report(
                input.path(),
                "cancelled",
                "batch cancelled before analysis started",
                Duration::ZERO,
            );
        }
        let _active = gauge.enter();
        match input {
            SourceInput::Path(path) => analyzer.analyze_path(path),
            SourceInput::Memory {
                virtual_path,
                source,
            } => analyzer.analyze_source(virtual_path, source.as_bytes()),
        }
    };

    let reports: Vec<AnalysisReport> = match rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_concurrency)
        .build()
    {
        Ok(pool) => pool.install(|| inputs.par_iter().map(|input| analyze_one(input)).collect()),
        Err(e) => {
            warn!(error = %e, "cannot build worker pool, analyzing sequentially");
            inputs.iter().map(|input| analyze_one(input)).collect()
        }
    };

    let failed = reports.iter().filter(|r| !r.is_completed()).count();
    info!(
        files = reports.len(),
        failed,
        peak = gauge.peak(),
        generation = index.generation(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "batch complete"
    );

    BatchOutcome {
        reports,
        peak_concurrency: gauge.peak(),
        cancelled: token.is_cancelled(),
    }
}
