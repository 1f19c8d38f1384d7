//! Cross-references resolved usages against the knowledge base.
//!
//! Rules are applied per fact in priority order and the first that matches
//! wins:
//!
//! 1. impossible imports (unknown module or member under a framework root)
//! 2. non-existent APIs (provably missing member of a catalogued module/class)
//! 3. framework violations (call incompatible with a closed signature)
//! 4. deprecated usage
//!
//! Sequence patterns run afterwards over the whole file.

use globset::GlobSet;

use crate::analysis::{Origin, ResolutionConfidence, SymbolTable, UsageFact, UsageKind};
use crate::config::{DetectorConfig, PatternConfig};
use crate::knowledge::{parent_path, root_segment, EntryType, Index, KnowledgeEntry};

use super::signature::{Mismatch, ParamSpec};
use super::stdlib::is_stdlib;
use super::{detect_patterns, Candidate, DeprecationInfo, Issue, IssueKind, MatchQuality};

/// Root names within this distance of a framework root are treated as
/// attempts to import that framework.
const IMPORT_ROOT_DISTANCE: usize = 2;

/// Knobs the validator needs, precompiled from [`DetectorConfig`].
#[derive(Debug, Clone)]
pub struct ValidatorOptions {
    pub allowed_modules: GlobSet,
    pub fuzzy_distance: usize,
    pub patterns: PatternConfig,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            allowed_modules: GlobSet::empty(),
            fuzzy_distance: 2,
            patterns: PatternConfig::default(),
        }
    }
}

impl ValidatorOptions {
    pub fn from_config(config: &DetectorConfig) -> anyhow::Result<Self> {
        Ok(Self {
            allowed_modules: config.allowed_module_set()?,
            fuzzy_distance: config.fuzzy_suggestion_distance,
            patterns: config.patterns.clone(),
        })
    }
}

/// Validate resolved facts, returning unscored candidates.
pub fn validate(
    facts: &[UsageFact],
    symbols: &SymbolTable,
    index: &Index,
    options: &ValidatorOptions,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for fact in facts {
        match fact.kind {
            UsageKind::Import => candidates.extend(check_import(fact, index, options)),
            _ => candidates.extend(check_usage(fact, index, options)),
        }
    }
    candidates.extend(detect_patterns(facts, symbols, &options.patterns));
    candidates
}

fn check_import(fact: &UsageFact, index: &Index, options: &ValidatorOptions) -> Vec<Candidate> {
    let module = fact.identifier.as_str();
    if module.starts_with('.') || is_stdlib(module) || options.allowed_modules.is_match(module) {
        return Vec::new();
    }

    if !index.contains_path(module) {
        return check_unknown_module(fact, index, options).into_iter().collect();
    }

    if let Some(entry) = index.lookup_exact(module) {
        if entry.deprecated {
            return vec![deprecation_candidate(fact, entry)];
        }
    }

    // Module is known: every imported member must be too
    let mut candidates = Vec::new();
    for member in fact.arguments.iter().filter(|m| m.as_str() != "*") {
        let path = format!("{}.{}", module, member);
        match index.lookup_exact(&path) {
            Some(entry) if entry.deprecated => candidates.push(deprecation_candidate(fact, entry)),
            Some(_) => {}
            None if index.is_known_module(&path) => {}
            None => {
                let mut issue = Issue::new(
                    IssueKind::ImpossibleImport,
                    fact.line,
                    "unknown_member",
                    format!("cannot import name `{}` from `{}`", member, module),
                )
                .with_api(path.clone());
                if let Some(best) = index.fuzzy_candidates(&path, options.fuzzy_distance).first() {
                    issue = issue.with_suggestion(format!("did you mean `{}`?", best.full_name));
                }
                candidates.push(Candidate::new(
                    issue,
                    ResolutionConfidence::High,
                    MatchQuality::Exact,
                ));
            }
        }
    }
    candidates
}

fn check_unknown_module(
    fact: &UsageFact,
    index: &Index,
    options: &ValidatorOptions,
) -> Option<Candidate> {
    let module = fact.identifier.as_str();
    let root = root_segment(module);
    let (framework_root, distance) = index.nearest_root(root, IMPORT_ROOT_DISTANCE)?;

    let (code, message, quality, suggestion) = if distance == 0 {
        let suggestion = index
            .fuzzy_candidates(module, options.fuzzy_distance)
            .first()
            .map(|e| format!("did you mean `{}`?", e.full_name));
        (
            "unknown_module",
            format!("module `{}` does not exist in `{}`", module, framework_root),
            MatchQuality::Exact,
            suggestion,
        )
    } else {
        let corrected = format!("{}{}", framework_root, &module[root.len()..]);
        (
            "unknown_package",
            format!(
                "package `{}` does not exist; it resembles `{}`",
                root, framework_root
            ),
            MatchQuality::Fuzzy,
            Some(format!("did you mean `{}`?", corrected)),
        )
    };

    let mut issue = Issue::new(IssueKind::ImpossibleImport, fact.line, code, message)
        .with_api(module.to_string());
    if let Some(suggestion) = suggestion {
        issue = issue.with_suggestion(suggestion);
    }
    Some(Candidate::new(issue, ResolutionConfidence::High, quality))
}

fn check_usage(fact: &UsageFact, index: &Index, options: &ValidatorOptions) -> Option<Candidate> {
    let Some(path) = fact.resolved_path() else {
        return check_unresolved(fact, index);
    };
    index.framework_for_root(root_segment(path))?;

    if let Some(entry) = index.lookup_exact(path) {
        if fact.kind.is_call() {
            if let Some(candidate) = check_signature(fact, entry, options) {
                return Some(candidate);
            }
        }
        if entry.deprecated {
            return Some(deprecation_candidate(fact, entry));
        }
        return None;
    }
    if index.is_known_module(path) {
        return None;
    }

    // Unknown or low-confidence origins never prove absence
    if !fact.resolution.can_prove_absence() {
        return None;
    }
    check_missing(fact, path, index, options)
}

/// An unresolved name can still be a deprecated API spelled out in full,
/// e.g. `pkg.old_fn()` without a visible import. Absence is never claimed.
fn check_unresolved(fact: &UsageFact, index: &Index) -> Option<Candidate> {
    if fact.opaque {
        return None;
    }
    let entry = index.lookup_exact(&fact.identifier)?;
    if !entry.deprecated {
        return None;
    }
    let mut candidate = deprecation_candidate(fact, entry);
    candidate.resolution = ResolutionConfidence::Low;
    Some(candidate)
}

fn check_missing(
    fact: &UsageFact,
    path: &str,
    index: &Index,
    options: &ValidatorOptions,
) -> Option<Candidate> {
    let segments: Vec<&str> = path.split('.').collect();
    let k = (2..=segments.len()).find(|&k| !index.contains_path(&segments[..k].join(".")))?;

    let first_missing = segments[..k].join(".");
    let parent = parent_path(&first_missing)?;
    let is_final = k == segments.len();

    // Return types of functions and methods are not catalogued
    let parent_type = index.path_type(parent)?;
    if !parent_type.has_catalogued_members() {
        return None;
    }
    // Instances may carry attributes set at runtime; only their method
    // calls are checked
    let through_import = matches!(fact.resolved_origin, Some(Origin::Known(_)));
    if parent_type == EntryType::Class && !through_import && !(is_final && fact.kind.is_call()) {
        return None;
    }

    let candidates = index.fuzzy_candidates(&first_missing, options.fuzzy_distance);
    let quality = if is_final {
        MatchQuality::Exact
    } else if !candidates.is_empty() {
        MatchQuality::Fuzzy
    } else {
        MatchQuality::Ancestor
    };

    let member = segments[k - 1];
    let mut issue = Issue::new(
        IssueKind::NonExistentApi,
        fact.line,
        "unknown_member",
        format!("`{}` is not a member of `{}`", member, parent),
    )
    .with_api(path.to_string());
    if let Some(best) = candidates.first() {
        issue = issue.with_suggestion(format!("did you mean `{}`?", best.full_name));
    }
    Some(Candidate::new(issue, fact.resolution, quality))
}

fn check_signature(
    fact: &UsageFact,
    entry: &KnowledgeEntry,
    options: &ValidatorOptions,
) -> Option<Candidate> {
    let params = ParamSpec::from_entry(entry)?;
    let mismatch = params.check(fact, options.fuzzy_distance)?;

    let (message, suggestion) = match &mismatch {
        Mismatch::TooManyPositional { given, max } => (
            format!(
                "`{}` accepts at most {} positional argument{} but {} were given",
                entry.full_name,
                max,
                if *max == 1 { "" } else { "s" },
                given
            ),
            None,
        ),
        Mismatch::UnknownKeyword { name, suggestion } => (
            format!(
                "`{}` has no parameter named `{}`",
                entry.full_name, name
            ),
            suggestion.as_ref().map(|s| format!("did you mean `{}`?", s)),
        ),
    };

    let mut issue = Issue::new(
        IssueKind::FrameworkViolation,
        fact.line,
        mismatch.code(),
        message,
    )
    .with_api(entry.full_name.clone());
    if let Some(suggestion) = suggestion {
        issue = issue.with_suggestion(suggestion);
    }
    Some(Candidate::new(issue, fact.resolution, MatchQuality::Exact))
}

fn deprecation_candidate(fact: &UsageFact, entry: &KnowledgeEntry) -> Candidate {
    let mut message = format!("`{}` is deprecated", entry.full_name);
    if let Some(since) = &entry.deprecated_since {
        message.push_str(&format!(" since {}", since));
    }
    if let Some(removed) = &entry.removed_in {
        message.push_str(&format!(" and removed in {}", removed));
    }

    let code = if entry.removed_in.is_some() {
        "removed"
    } else {
        "deprecated"
    };
    let mut issue = Issue::new(IssueKind::DeprecatedUsage, fact.line, code, message)
        .with_api(entry.full_name.clone());
    if let Some(replacement) = &entry.replacement {
        issue = issue.with_suggestion(format!("use `{}` instead", replacement));
    }

    let resolution = if fact.kind == UsageKind::Import {
        ResolutionConfidence::High
    } else {
        fact.resolution
    };
    let mut candidate = Candidate::new(issue, resolution, MatchQuality::Exact);
    candidate.deprecation = Some(DeprecationInfo {
        since: entry.deprecated_since.clone(),
        removed_in: entry.removed_in.clone(),
    });
    candidate
}
