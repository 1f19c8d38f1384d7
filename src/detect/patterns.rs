//! Sequence patterns typical of generated code.
//!
//! These checks look at the order and shape of usages rather than at the
//! knowledge base, so they are scored as heuristics and capped well below
//! lookup-backed issues.

use std::collections::BTreeSet;

use crate::analysis::{
    is_pascal_case, BindingOrigin, ResolutionConfidence, SymbolTable, UsageFact, UsageKind,
};
use crate::config::PatternConfig;

use super::{Candidate, Issue, IssueKind, MatchQuality};

/// Run every enabled pattern check.
pub fn detect_patterns(
    facts: &[UsageFact],
    symbols: &SymbolTable,
    config: &PatternConfig,
) -> Vec<Candidate> {
    if !config.enabled {
        return Vec::new();
    }
    let mut candidates = detect_case_mismatch(facts, symbols);
    candidates.extend(detect_method_burst(facts, symbols, config));
    candidates
}

/// An imported class that is only ever "used" through a call with the wrong
/// casing, e.g. `from fastapi import APIRouter` then `apirouter()`.
fn detect_case_mismatch(facts: &[UsageFact], symbols: &SymbolTable) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for (local, binding) in symbols.imported_names() {
        if !is_pascal_case(local) {
            continue;
        }
        let BindingOrigin::Imported(path) = &binding.origin else {
            continue;
        };

        let referenced = facts.iter().any(|f| {
            f.kind != UsageKind::Import && f.seq >= binding.seq && root_of(&f.identifier) == local
        });
        if referenced {
            continue;
        }

        let miscased = facts.iter().find(|f| {
            f.kind.is_call() && !f.opaque && {
                let root = root_of(&f.identifier);
                root != local && root.eq_ignore_ascii_case(local)
            }
        });
        if let Some(call) = miscased {
            let written = root_of(&call.identifier);
            let issue = Issue::new(
                IssueKind::AiCodePattern,
                call.line,
                "case_mismatch",
                format!(
                    "`{}` is imported but called as `{}`",
                    local, written
                ),
            )
            .with_api(path.clone())
            .with_suggestion(format!("use `{}`", local));
            candidates.push(Candidate::new(
                issue,
                ResolutionConfidence::High,
                MatchQuality::Heuristic,
            ));
        }
    }
    candidates
}

/// Many distinct methods called on a freshly constructed object in quick
/// succession, as if exploring an API surface that may not exist.
fn detect_method_burst(
    facts: &[UsageFact],
    symbols: &SymbolTable,
    config: &PatternConfig,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for (name, binding) in symbols.bindings() {
        let (api, resolution) = match &binding.origin {
            BindingOrigin::Instance(path) => (path, ResolutionConfidence::Medium),
            BindingOrigin::LocalInstance(path) => (path, ResolutionConfidence::Low),
            _ => continue,
        };

        let constructed = facts.iter().any(|f| {
            f.kind == UsageKind::ClassInstantiation && f.line == binding.line && f.seq < binding.seq
        });
        if !constructed {
            continue;
        }

        // The burst ends at the next write to the same name
        let until = symbols
            .history(name)
            .iter()
            .map(|b| b.seq)
            .find(|&seq| seq > binding.seq)
            .unwrap_or(usize::MAX);

        let prefix = format!("{}.", name);
        let methods: BTreeSet<&str> = facts
            .iter()
            .filter(|f| {
                f.kind == UsageKind::MethodCall
                    && !f.opaque
                    && f.seq >= binding.seq
                    && f.seq < until
                    && f.line <= binding.line + config.burst_window_lines
            })
            .filter_map(|f| f.identifier.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('.'))
            .collect();

        if methods.len() > config.burst_method_threshold {
            let listed: Vec<&str> = methods.iter().copied().collect();
            let issue = Issue::new(
                IssueKind::AiCodePattern,
                binding.line,
                "method_burst",
                format!(
                    "`{}` receives {} distinct method calls within {} lines of its creation: {}",
                    name,
                    methods.len(),
                    config.burst_window_lines,
                    listed.join(", ")
                ),
            )
            .with_api(api.clone());
            candidates.push(Candidate::new(issue, resolution, MatchQuality::Heuristic));
        }
    }
    candidates
}

fn root_of(identifier: &str) -> &str {
    identifier.split('.').next().unwrap_or(identifier)
}
