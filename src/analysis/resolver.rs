//! Best-effort local type resolution.
//!
//! Fills `resolved_origin` and `resolution` on every fact using only the
//! file's own symbol table. Nothing crosses file boundaries and nothing is
//! executed; when a name cannot be traced to an import the fact is marked
//! unknown, which downstream rules treat as "cannot prove absence".

use super::{Origin, Resolution, ResolutionConfidence, SymbolTable, UsageFact, UsageKind};

/// Resolve every fact against the symbol table.
pub fn resolve(facts: Vec<UsageFact>, symbols: &SymbolTable) -> Vec<UsageFact> {
    facts
        .into_iter()
        .map(|mut fact| {
            let resolution = resolve_fact(&fact, symbols);
            fact.resolved_origin = Some(resolution.origin);
            fact.resolution = resolution.confidence;
            fact
        })
        .collect()
}

fn resolve_fact(fact: &UsageFact, symbols: &SymbolTable) -> Resolution {
    if fact.kind == UsageKind::Import {
        return Resolution {
            origin: Origin::Known(fact.identifier.clone()),
            confidence: ResolutionConfidence::High,
        };
    }
    if fact.opaque {
        return Resolution::unknown();
    }
    symbols.resolve_path(&fact.identifier, fact.seq)
}

/// Resolution weight used for the report-level confidence.
pub fn coverage_weight(fact: &UsageFact) -> f64 {
    match (&fact.resolved_origin, fact.resolution) {
        (None, _) | (Some(Origin::Unknown), _) => 0.0,
        (Some(_), ResolutionConfidence::High) => 1.0,
        (Some(_), ResolutionConfidence::Medium) => 0.75,
        (Some(_), ResolutionConfidence::Low) => 0.4,
    }
}
