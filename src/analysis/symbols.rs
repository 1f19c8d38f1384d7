//! Per-file symbol table built during extraction.

use std::collections::HashMap;
use std::fmt;

use super::{Origin, Resolution, ResolutionConfidence};

/// What a local name was bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindingOrigin {
    /// `import x` / `from x import y`: the bound module or member path.
    Imported(String),
    /// Result of calling a callee that resolved through the table.
    Instance(String),
    /// Result of calling an unresolved callee, by its literal name.
    LocalInstance(String),
    /// Anything else (literals, destructuring, awaited values).
    Opaque,
}

impl fmt::Display for BindingOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingOrigin::Imported(p) => write!(f, "imported:{}", p),
            BindingOrigin::Instance(p) | BindingOrigin::LocalInstance(p) => {
                write!(f, "instance:{}", p)
            }
            BindingOrigin::Opaque => write!(f, "opaque"),
        }
    }
}

/// A single write to a local name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub origin: BindingOrigin,
    pub line: usize,
    /// Facts with `seq >= self.seq` see this binding.
    pub seq: usize,
}

/// Local name -> ordered bindings.
///
/// Scoping is flat per file; the last visible write wins.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    bindings: HashMap<String, Vec<Binding>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: &str, origin: BindingOrigin, line: usize, seq: usize) {
        self.bindings
            .entry(name.to_string())
            .or_default()
            .push(Binding { origin, line, seq });
    }

    /// The binding in effect for `name` at extraction position `seq`.
    pub fn visible(&self, name: &str, seq: usize) -> Option<&Binding> {
        self.bindings
            .get(name)?
            .iter()
            .rev()
            .find(|b| b.seq <= seq)
    }

    /// A name written with more than one distinct origin.
    pub fn is_shadowed(&self, name: &str) -> bool {
        match self.bindings.get(name) {
            Some(list) => list.iter().any(|b| b.origin != list[0].origin),
            None => false,
        }
    }

    /// All bindings of a name, in write order.
    pub fn history(&self, name: &str) -> &[Binding] {
        self.bindings.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Local names bound by imports, sorted by name.
    pub fn imported_names(&self) -> Vec<(&str, &Binding)> {
        let mut names: Vec<_> = self
            .bindings
            .iter()
            .filter_map(|(name, list)| {
                list.iter()
                    .find(|b| matches!(b.origin, BindingOrigin::Imported(_)))
                    .map(|b| (name.as_str(), b))
            })
            .collect();
        names.sort_by(|a, b| a.0.cmp(b.0));
        names
    }

    /// Every write, ordered by position then name.
    pub fn bindings(&self) -> Vec<(&str, &Binding)> {
        let mut all: Vec<_> = self
            .bindings
            .iter()
            .flat_map(|(name, list)| list.iter().map(move |b| (name.as_str(), b)))
            .collect();
        all.sort_by(|a, b| a.1.seq.cmp(&b.1.seq).then(a.0.cmp(b.0)));
        all
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Resolve a dotted path as seen from extraction position `seq`.
    ///
    /// The longest bound prefix wins; the remaining segments are appended to
    /// the binding's path.
    pub fn resolve_path(&self, path: &str, seq: usize) -> Resolution {
        let segments: Vec<&str> = path.split('.').collect();

        for k in (1..=segments.len()).rev() {
            let prefix = segments[..k].join(".");
            let Some(binding) = self.visible(&prefix, seq) else {
                continue;
            };
            let rest = &segments[k..];

            let (origin, confidence) = match &binding.origin {
                BindingOrigin::Imported(base) => {
                    (Origin::Known(join(base, rest)), ResolutionConfidence::High)
                }
                // A bare instance used as a callee has no catalogued path
                BindingOrigin::Instance(base) if !rest.is_empty() => {
                    (Origin::Inferred(join(base, rest)), ResolutionConfidence::Medium)
                }
                _ => return Resolution::unknown(),
            };

            let confidence = if self.is_shadowed(&prefix) {
                ResolutionConfidence::Low
            } else {
                confidence
            };
            return Resolution { origin, confidence };
        }

        Resolution::unknown()
    }
}

fn join(base: &str, rest: &[&str]) -> String {
    if rest.is_empty() {
        base.to_string()
    } else {
        format!("{}.{}", base, rest.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_prefix_wins() {
        let mut table = SymbolTable::new();
        table.bind("fastapi", BindingOrigin::Imported("fastapi".into()), 1, 1);
        table.bind(
            "self.client",
            BindingOrigin::Instance("httpx.Client".into()),
            5,
            4,
        );

        let r = table.resolve_path("fastapi.routing.APIRouter", 2);
        assert_eq!(r.origin, Origin::Known("fastapi.routing.APIRouter".into()));
        assert_eq!(r.confidence, ResolutionConfidence::High);

        let r = table.resolve_path("self.client.get", 6);
        assert_eq!(r.origin, Origin::Inferred("httpx.Client.get".into()));
        assert_eq!(r.confidence, ResolutionConfidence::Medium);
    }

    #[test]
    fn test_binding_not_visible_before_write() {
        let mut table = SymbolTable::new();
        table.bind("app", BindingOrigin::Instance("fastapi.FastAPI".into()), 3, 5);
        assert!(table.resolve_path("app.get", 4).origin.is_unknown());
        assert!(!table.resolve_path("app.get", 5).origin.is_unknown());
    }

    #[test]
    fn test_shadowed_name_is_low_confidence() {
        let mut table = SymbolTable::new();
        table.bind("json", BindingOrigin::Imported("json".into()), 1, 1);
        table.bind("json", BindingOrigin::LocalInstance("load_json".into()), 9, 7);

        // Before the rebinding the import is in effect, but the name is reused
        let r = table.resolve_path("json.dumps", 3);
        assert_eq!(r.origin, Origin::Known("json.dumps".into()));
        assert_eq!(r.confidence, ResolutionConfidence::Low);

        // After it, last write wins and the literal instance is unresolvable
        assert!(table.resolve_path("json.dumps", 8).origin.is_unknown());
    }

    #[test]
    fn test_unbound_and_opaque() {
        let mut table = SymbolTable::new();
        table.bind("x", BindingOrigin::Opaque, 1, 0);
        assert!(table.resolve_path("x.foo", 3).origin.is_unknown());
        assert!(table.resolve_path("print", 3).origin.is_unknown());
    }

    #[test]
    fn test_binding_display() {
        assert_eq!(
            BindingOrigin::Imported("fastapi.FastAPI".into()).to_string(),
            "imported:fastapi.FastAPI"
        );
        assert_eq!(
            BindingOrigin::LocalInstance("Helper".into()).to_string(),
            "instance:Helper"
        );
    }
}
