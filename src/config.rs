//! Detector configuration.
//!
//! Loaded from YAML; every field has a default so an empty document is a
//! valid configuration.

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::analysis::get_analyzer_by_id;

/// Top-level detector configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectorConfig {
    /// Upper bound on files analyzed at once.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Issues scoring below this go to the debug trace instead of the report.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    /// Hard per-file cap; files over it are reported as timeouts.
    #[serde(default = "default_per_file_timeout_ms")]
    pub per_file_timeout_ms: u64,
    /// Soft per-file target; files over it are logged.
    #[serde(default = "default_target_file_ms")]
    pub target_file_ms: u64,
    #[serde(default = "default_fuzzy_distance")]
    pub fuzzy_suggestion_distance: usize,
    #[serde(default = "default_language")]
    pub language: String,
    /// Date deprecation ages are measured against. Defaults to today (UTC).
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
    /// Keep extracted facts on each report.
    #[serde(default)]
    pub retain_facts: bool,
    /// Glob patterns for modules that are never reported as impossible
    /// imports (e.g. "internal_*", "mycompany.*").
    #[serde(default)]
    pub allowed_modules: Vec<String>,
    #[serde(default)]
    pub patterns: PatternConfig,
}

/// Settings for the sequence-based AI code pattern checks.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PatternConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// More than this many distinct methods on a fresh object is a burst.
    #[serde(default = "default_burst_threshold")]
    pub burst_method_threshold: usize,
    /// Lines after the instantiation that count toward a burst.
    #[serde(default = "default_burst_window")]
    pub burst_window_lines: usize,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            burst_method_threshold: default_burst_threshold(),
            burst_window_lines: default_burst_window(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_concurrency() -> usize {
    10
}

fn default_min_confidence() -> f64 {
    0.5
}

fn default_per_file_timeout_ms() -> u64 {
    2000
}

fn default_target_file_ms() -> u64 {
    200
}

fn default_fuzzy_distance() -> usize {
    2
}

fn default_language() -> String {
    "python".to_string()
}

fn default_burst_threshold() -> usize {
    3
}

fn default_burst_window() -> usize {
    10
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            min_confidence: default_min_confidence(),
            per_file_timeout_ms: default_per_file_timeout_ms(),
            target_file_ms: default_target_file_ms(),
            fuzzy_suggestion_distance: default_fuzzy_distance(),
            language: default_language(),
            reference_date: None,
            retain_facts: false,
            allowed_modules: Vec::new(),
            patterns: PatternConfig::default(),
        }
    }
}

impl DetectorConfig {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    pub fn parse(yaml: &str) -> anyhow::Result<Self> {
        let config: DetectorConfig = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn per_file_timeout(&self) -> Duration {
        Duration::from_millis(self.per_file_timeout_ms)
    }

    pub fn target_duration(&self) -> Duration {
        Duration::from_millis(self.target_file_ms)
    }

    /// The configured reference date, or today in UTC.
    pub fn effective_reference_date(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| chrono::Utc::now().date_naive())
    }

    /// Compile `allowed_modules` into a matcher.
    pub fn allowed_module_set(&self) -> anyhow::Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.allowed_modules {
            let glob = Glob::new(pattern)
                .map_err(|e| anyhow::anyhow!("invalid allowed_modules pattern {:?}: {}", pattern, e))?;
            builder.add(glob);
        }
        Ok(builder.build()?)
    }
}

/// Validate a configuration.
pub fn validate(config: &DetectorConfig) -> anyhow::Result<()> {
    if config.max_concurrency == 0 {
        anyhow::bail!("max_concurrency must be at least 1");
    }

    if !(0.0..=1.0).contains(&config.min_confidence) {
        anyhow::bail!(
            "min_confidence {} is outside [0, 1]",
            config.min_confidence
        );
    }

    if config.per_file_timeout_ms == 0 {
        anyhow::bail!("per_file_timeout_ms must be positive");
    }

    if get_analyzer_by_id(&config.language).is_none() {
        anyhow::bail!("unsupported language {:?}", config.language);
    }

    if config.patterns.burst_window_lines == 0 {
        anyhow::bail!("patterns.burst_window_lines must be positive");
    }

    // Validate allowed_modules glob patterns compile
    config.allowed_module_set()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = DetectorConfig::parse("{}").unwrap();
        assert_eq!(config.max_concurrency, 10);
        assert_eq!(config.min_confidence, 0.5);
        assert_eq!(config.per_file_timeout_ms, 2000);
        assert_eq!(config.target_file_ms, 200);
        assert_eq!(config.language, "python");
        assert!(config.patterns.enabled);
        assert_eq!(config.patterns.burst_method_threshold, 3);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
max_concurrency: 4
min_confidence: 0.7
reference_date: 2024-06-01
allowed_modules:
  - "internal_*"
patterns:
  enabled: false
"#;
        let config = DetectorConfig::parse(yaml).unwrap();
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(
            config.effective_reference_date(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
        assert!(!config.patterns.enabled);
        assert_eq!(config.patterns.burst_window_lines, 10);

        let allowed = config.allowed_module_set().unwrap();
        assert!(allowed.is_match("internal_tools"));
        assert!(!allowed.is_match("fastapi"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = DetectorConfig {
            max_concurrency: 0,
            ..Default::default()
        };
        assert!(validate(&config).is_err());

        let config = DetectorConfig {
            min_confidence: 1.5,
            ..Default::default()
        };
        assert!(validate(&config).is_err());

        let config = DetectorConfig {
            language: "cobol".to_string(),
            ..Default::default()
        };
        assert!(validate(&config).is_err());

        let config = DetectorConfig {
            allowed_modules: vec!["[".to_string()],
            ..Default::default()
        };
        assert!(validate(&config).is_err());
    }
}
