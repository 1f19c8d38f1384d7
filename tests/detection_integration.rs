//! Integration tests for the full detection pipeline.
//!
//! These tests validate that the detector correctly identifies hallucinated
//! APIs when run against the testdata fixtures and in-memory sources.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use groundcheck::batch::{analyze_batch, BatchAnalyzer, CancellationToken, SourceInput};
use groundcheck::config::DetectorConfig;
use groundcheck::detect::{FileAnalyzer, IssueKind, Severity};
use groundcheck::knowledge::{load_entries, EntryType, Index, KnowledgeBase, KnowledgeEntry};
use groundcheck::report::{AnalysisReport, ReportStatus};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    groundcheck::init();
}

fn testdata_entries() -> Vec<KnowledgeEntry> {
    load_entries(testdata_path().join("knowledge.yaml")).expect("should load knowledge base")
}

fn testdata_config() -> DetectorConfig {
    DetectorConfig::parse_file(testdata_path().join("config.yaml")).expect("should parse config")
}

fn fastapi_index() -> Index {
    Index::build(vec![
        KnowledgeEntry::new("fastapi", EntryType::Class, "fastapi.FastAPI").with_parameters(&[]),
    ])
    .unwrap()
}

fn analyze(index: &Index, source: &str) -> AnalysisReport {
    setup();
    let analyzer = FileAnalyzer::new(index, &DetectorConfig::default()).unwrap();
    analyzer.analyze_source(Path::new("app.py"), source.as_bytes())
}

fn memory(name: &str, source: &str) -> SourceInput {
    SourceInput::Memory {
        virtual_path: PathBuf::from(name),
        source: source.to_string(),
    }
}

// =============================================================================
// Single-file behavior
// =============================================================================

#[test]
fn test_exact_match_produces_no_issues() {
    let report = analyze(
        &fastapi_index(),
        "from fastapi import FastAPI; app = FastAPI()\n",
    );
    assert_eq!(report.status, ReportStatus::Completed);
    assert!(report.issues.is_empty(), "unexpected issues: {:?}", report.issues);
}

#[test]
fn test_nonexistent_method_is_flagged() {
    let report = analyze(
        &fastapi_index(),
        "from fastapi import FastAPI; app = FastAPI(); app.nonexistent_method()\n",
    );
    assert_eq!(report.issues.len(), 1);
    let issue = &report.issues[0];
    assert_eq!(issue.kind, IssueKind::NonExistentApi);
    assert!(matches!(issue.severity, Severity::High | Severity::Critical));
    assert_eq!(issue.api.as_deref(), Some("fastapi.FastAPI.nonexistent_method"));
}

#[test]
fn test_deprecated_function_is_flagged() {
    let index = Index::build(vec![KnowledgeEntry::new(
        "pkg",
        EntryType::Function,
        "pkg.old_fn",
    )
    .deprecated_since("2020-01-01")])
    .unwrap();

    // No import in sight: the call is unresolved but spelled out in full
    let report = analyze(&index, "pkg.old_fn()\n");
    assert_eq!(report.issues.len(), 1, "issues: {:?}", report.issues);
    assert_eq!(report.issues[0].kind, IssueKind::DeprecatedUsage);
    assert_eq!(report.issues[0].line, 1);
    assert_eq!(report.issues[0].api.as_deref(), Some("pkg.old_fn"));

    let report = analyze(&index, "import pkg\npkg.old_fn()\n");
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].kind, IssueKind::DeprecatedUsage);
    assert_eq!(report.issues[0].line, 2);
}

#[test]
fn test_missing_class_attribute_is_flagged() {
    let report = analyze(
        &fastapi_index(),
        "from fastapi import FastAPI\nx = FastAPI.nonexistent_attr\n",
    );
    assert_eq!(report.issues.len(), 1, "issues: {:?}", report.issues);
    assert_eq!(report.issues[0].kind, IssueKind::NonExistentApi);
    assert_eq!(report.issues[0].line, 2);
    assert_eq!(
        report.issues[0].api.as_deref(),
        Some("fastapi.FastAPI.nonexistent_attr")
    );

    let report = analyze(&fastapi_index(), "import fastapi\nfastapi.FastAPI.bogus.thing()\n");
    assert_eq!(report.issues.len(), 1, "issues: {:?}", report.issues);
    assert_eq!(report.issues[0].kind, IssueKind::NonExistentApi);
}

#[test]
fn test_call_against_empty_signature() {
    let report = analyze(
        &fastapi_index(),
        "from fastapi import FastAPI\napp = FastAPI(1, debug=True)\n",
    );
    assert_eq!(report.issues.len(), 1, "issues: {:?}", report.issues);
    assert_eq!(report.issues[0].kind, IssueKind::FrameworkViolation);
    assert_eq!(report.issues[0].evidence.code, "too_many_positional");
}

#[test]
fn test_augmented_attribute_write_is_not_flagged() {
    let report = analyze(
        &fastapi_index(),
        "import fastapi\nfastapi.FastAPI.counter = 0\nfastapi.other += 1\n",
    );
    assert!(report.issues.is_empty(), "unexpected issues: {:?}", report.issues);
}

#[test]
fn test_unknown_origin_is_never_flagged() {
    let report = analyze(
        &fastapi_index(),
        "client = make_client()\nclient.fetch_everything()\nwidget.frobnicate(1, 2, 3)\n",
    );
    assert!(report.issues.is_empty());
    assert_eq!(report.overall_confidence, 0.0);
}

#[test]
fn test_low_confidence_patterns_go_to_debug_trace() {
    let source = "c = Client()\nc.open()\nc.auth()\nc.retry()\nc.send()\n";
    let report = analyze(&fastapi_index(), source);

    assert!(report.issues.is_empty());
    assert_eq!(report.debug_trace.len(), 1);
    assert_eq!(report.debug_trace[0].kind, IssueKind::AiCodePattern);
    assert_eq!(report.debug_trace[0].evidence.code, "method_burst");
    assert!(report.debug_trace[0].confidence < 0.5);
}

#[test]
fn test_timeout_is_reported_as_parse_error() {
    setup();
    let index = fastapi_index();
    let config = DetectorConfig {
        per_file_timeout_ms: 0,
        ..Default::default()
    };
    let analyzer = FileAnalyzer::new(&index, &config).unwrap();
    let report = analyzer.analyze_source(Path::new("slow.py"), b"import fastapi\n");

    assert_eq!(report.status, ReportStatus::ParseFailed);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].kind, IssueKind::ParseError);
    assert_eq!(report.issues[0].evidence.code, "timeout");
}

// =============================================================================
// Fixtures
// =============================================================================

#[test]
fn test_clean_fixture() {
    setup();
    let index = Index::build(testdata_entries()).unwrap();
    let analyzer = FileAnalyzer::new(&index, &testdata_config()).unwrap();
    let report = analyzer.analyze_path(&testdata_path().join("clean_app.py"));

    assert_eq!(report.status, ReportStatus::Completed);
    assert!(report.issues.is_empty(), "unexpected issues: {:?}", report.issues);
    assert_eq!(report.frameworks_detected, vec!["FastAPI".to_string()]);
}

#[test]
fn test_hallucinated_fixture() {
    setup();
    let index = Index::build(testdata_entries()).unwrap();
    let analyzer = FileAnalyzer::new(&index, &testdata_config()).unwrap();
    let report = analyzer.analyze_path(&testdata_path().join("hallucinated_app.py"));

    let found: Vec<(usize, IssueKind)> = report.issues.iter().map(|i| (i.line, i.kind)).collect();
    assert_eq!(
        found,
        vec![
            (2, IssueKind::ImpossibleImport),
            (3, IssueKind::ImpossibleImport),
            (5, IssueKind::FrameworkViolation),
            (12, IssueKind::NonExistentApi),
            (13, IssueKind::DeprecatedUsage),
        ]
    );

    // `import fastap` is a near miss of the framework root
    assert_eq!(report.issues[1].suggestion.as_deref(), Some("did you mean `fastapi`?"));
    assert_eq!(report.issues[1].severity, Severity::High);

    // `tittle=` is an unknown keyword of FastAPI()
    assert_eq!(report.issues[2].evidence.code, "unknown_keyword");
    assert_eq!(report.issues[2].suggestion.as_deref(), Some("did you mean `title`?"));

    // Deprecated in mid-2023, measured from the configured reference date
    assert_eq!(report.issues[4].severity, Severity::Medium);
    assert_eq!(
        report.issues[4].suggestion.as_deref(),
        Some("use `fastapi.FastAPI.lifespan` instead")
    );
}

#[test]
fn test_broken_fixture() {
    setup();
    let index = Index::build(testdata_entries()).unwrap();
    let analyzer = FileAnalyzer::new(&index, &testdata_config()).unwrap();
    let report = analyzer.analyze_path(&testdata_path().join("broken.py"));

    assert_eq!(report.status, ReportStatus::ParseFailed);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].evidence.code, "syntax_error");
    assert_eq!(report.issues[0].severity, Severity::Critical);
    assert!(report.frameworks_detected.is_empty());
}

#[test]
fn test_analysis_is_deterministic() {
    setup();
    let index = Index::build(testdata_entries()).unwrap();
    let config = DetectorConfig {
        retain_facts: true,
        ..testdata_config()
    };
    let analyzer = FileAnalyzer::new(&index, &config).unwrap();
    let path = testdata_path().join("hallucinated_app.py");

    let first = analyzer.analyze_path(&path);
    let second = analyzer.analyze_path(&path);
    assert_eq!(timeless_json(&first), timeless_json(&second));
    assert_eq!(first.debug_trace, second.debug_trace);

    // Same holds across concurrent batches
    let paths: Vec<PathBuf> = ["clean_app.py", "hallucinated_app.py", "broken.py"]
        .iter()
        .map(|name| testdata_path().join(name))
        .collect();
    let a: Vec<_> = analyze_batch(&paths, &index, 3).iter().map(timeless_json).collect();
    let b: Vec<_> = analyze_batch(&paths, &index, 1).iter().map(timeless_json).collect();
    assert_eq!(a, b);
}

/// Serialized report with the wall-clock field zeroed.
fn timeless_json(report: &AnalysisReport) -> serde_json::Value {
    let mut value = serde_json::to_value(report).expect("report should serialize");
    value["processing_time_ms"] = serde_json::json!(0.0);
    value
}

// =============================================================================
// Batches
// =============================================================================

#[test]
fn test_batch_preserves_order_and_isolates_failures() {
    setup();
    let testdata = testdata_path();
    let paths = vec![
        testdata.join("clean_app.py"),
        testdata.join("broken.py"),
        testdata.join("does_not_exist.py"),
        testdata.join("hallucinated_app.py"),
    ];
    let index = Index::build(testdata_entries()).unwrap();
    let reports = analyze_batch(&paths, &index, 2);

    assert_eq!(reports.len(), paths.len());
    for (report, path) in reports.iter().zip(&paths) {
        assert_eq!(report.file_path, path.display().to_string());
    }
    assert_eq!(reports[0].status, ReportStatus::Completed);
    assert_eq!(reports[1].issues[0].evidence.code, "syntax_error");
    assert_eq!(reports[2].issues[0].evidence.code, "io_error");
    assert_eq!(reports[3].status, ReportStatus::Completed);
    assert_eq!(reports[3].issues.len(), 5);
}

#[test]
fn test_batch_respects_concurrency_bound() {
    setup();
    let kb = Arc::new(KnowledgeBase::from_entries(testdata_entries()).unwrap());
    let config = DetectorConfig {
        max_concurrency: 3,
        ..Default::default()
    };
    let batch = BatchAnalyzer::new(kb, config).unwrap();

    let inputs: Vec<SourceInput> = (0..24)
        .map(|i| {
            memory(
                &format!("mem/app_{}.py", i),
                "from fastapi import FastAPI\napp = FastAPI()\napp.get(\"/\")\n",
            )
        })
        .collect();
    let outcome = batch.analyze_batch(&inputs, &CancellationToken::new());

    assert_eq!(outcome.reports.len(), 24);
    assert!(outcome.peak_concurrency >= 1);
    assert!(outcome.peak_concurrency <= 3, "peak {}", outcome.peak_concurrency);
    assert!(!outcome.cancelled);
    assert_eq!(outcome.reports[7].file_path, Path::new("mem/app_7.py").display().to_string());
    assert!(outcome.reports.iter().all(|r| r.issues.is_empty()));
}

#[test]
fn test_cancelled_batch() {
    setup();
    let kb = Arc::new(KnowledgeBase::from_entries(testdata_entries()).unwrap());
    let batch = BatchAnalyzer::new(kb, DetectorConfig::default()).unwrap();
    let token = CancellationToken::new();
    token.cancel();

    let inputs = vec![
        memory("a.py", "import fastapi\n"),
        memory("b.py", "import fastapi\n"),
    ];
    let outcome = batch.analyze_batch(&inputs, &token);

    assert!(outcome.cancelled);
    assert_eq!(outcome.peak_concurrency, 0);
    for report in &outcome.reports {
        assert_eq!(report.status, ReportStatus::ParseFailed);
        assert_eq!(report.issues[0].evidence.code, "cancelled");
    }
}

#[test]
fn test_reload_between_batches() {
    setup();
    let kb = Arc::new(KnowledgeBase::from_entries(testdata_entries()).unwrap());
    let batch = BatchAnalyzer::new(Arc::clone(&kb), DetectorConfig::default()).unwrap();
    let inputs = vec![memory("app.py", "import pkg\npkg.new_fn()\n")];

    let before = batch.analyze_batch(&inputs, &CancellationToken::new());
    assert!(before.reports[0].issues.is_empty());

    let old_snapshot = kb.snapshot();
    let generation = kb
        .reload(vec![KnowledgeEntry::new("Pkg", EntryType::Function, "pkg.other_fn")])
        .unwrap();
    assert_eq!(generation, 1);

    let after = batch.analyze_batch(&inputs, &CancellationToken::new());
    assert_eq!(after.reports[0].issues.len(), 1);
    assert_eq!(after.reports[0].issues[0].kind, IssueKind::NonExistentApi);

    // A snapshot taken before the reload keeps the old view
    let analyzer = FileAnalyzer::new(&old_snapshot, &DetectorConfig::default()).unwrap();
    let report = analyzer.analyze_source(Path::new("app.py"), b"import pkg\npkg.new_fn()\n");
    assert!(report.issues.is_empty());
}

#[test]
fn test_duplicate_entries_are_rejected() {
    let mut entries = testdata_entries();
    entries.push(KnowledgeEntry::new("FastAPI", EntryType::Class, "fastapi.FastAPI"));
    assert!(Index::build(entries.clone()).is_err());

    let kb = KnowledgeBase::from_entries(testdata_entries()).unwrap();
    assert!(kb.reload(entries).is_err());
    assert_eq!(kb.snapshot().generation(), 0);
}

#[test]
fn test_invalid_config_is_rejected() {
    let kb = Arc::new(KnowledgeBase::from_entries(testdata_entries()).unwrap());
    let config = DetectorConfig {
        max_concurrency: 0,
        ..Default::default()
    };
    assert!(BatchAnalyzer::new(kb, config).is_err());
}
