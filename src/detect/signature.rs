//! Call-signature compatibility against catalogued parameter lists.

use crate::analysis::UsageFact;
use crate::knowledge::{within_distance, EntryType, KnowledgeEntry};

/// Parsed parameter list of a catalogued callable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParamSpec {
    /// Names accepted positionally, in order.
    positional: Vec<String>,
    /// Names accepted as keywords.
    keywords: Vec<String>,
    varargs: bool,
    varkw: bool,
}

/// A way a call disagrees with its signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    TooManyPositional { given: usize, max: usize },
    UnknownKeyword { name: String, suggestion: Option<String> },
}

impl Mismatch {
    pub fn code(&self) -> &'static str {
        match self {
            Mismatch::TooManyPositional { .. } => "too_many_positional",
            Mismatch::UnknownKeyword { .. } => "unknown_keyword",
        }
    }
}

impl ParamSpec {
    /// Parse an entry's parameter list. `None` when the signature was not
    /// captured; an empty list parses to a signature that takes nothing.
    ///
    /// Accepts `name`, `name: type`, `name=default`, `*args`, `**kwargs`,
    /// and the bare `*` and `/` markers.
    pub fn from_entry(entry: &KnowledgeEntry) -> Option<Self> {
        if entry.entry_type == EntryType::Module {
            return None;
        }
        let parameters = entry.parameters.as_ref()?;

        let mut names: Vec<&str> = parameters
            .iter()
            .map(|p| {
                let p = p.split(':').next().unwrap_or(p);
                p.split('=').next().unwrap_or(p).trim()
            })
            .filter(|p| !p.is_empty())
            .collect();

        let bound = matches!(entry.entry_type, EntryType::Method | EntryType::Class);
        if bound && matches!(names.first(), Some(&"self") | Some(&"cls")) {
            names.remove(0);
        }

        let mut params = ParamSpec::default();
        let mut keyword_only = false;
        for name in names {
            match name {
                "/" => {
                    // Everything so far is positional-only
                    params.keywords.clear();
                }
                "*" => keyword_only = true,
                _ if name.starts_with("**") => params.varkw = true,
                _ if name.starts_with('*') => {
                    params.varargs = true;
                    keyword_only = true;
                }
                _ if keyword_only => params.keywords.push(name.to_string()),
                _ => {
                    params.positional.push(name.to_string());
                    params.keywords.push(name.to_string());
                }
            }
        }
        Some(params)
    }

    pub fn max_positional(&self) -> Option<usize> {
        (!self.varargs).then_some(self.positional.len())
    }

    pub fn accepts_keyword(&self, name: &str) -> bool {
        self.varkw || self.keywords.iter().any(|k| k == name)
    }

    /// First incompatibility between the call and this signature.
    pub fn check(&self, fact: &UsageFact, max_suggestion_distance: usize) -> Option<Mismatch> {
        if !fact.has_star_args() {
            let given = fact.positional_args().count();
            if let Some(max) = self.max_positional() {
                if given > max {
                    return Some(Mismatch::TooManyPositional { given, max });
                }
            }
        }

        // Explicit names are checked even alongside a `**opts` splat
        for name in fact.keyword_args() {
            if !self.accepts_keyword(name) {
                return Some(Mismatch::UnknownKeyword {
                    name: name.to_string(),
                    suggestion: self.closest_keyword(name, max_suggestion_distance),
                });
            }
        }
        None
    }

    fn closest_keyword(&self, name: &str, max: usize) -> Option<String> {
        self.keywords
            .iter()
            .filter_map(|k| within_distance(name, k, max).map(|d| (d, k)))
            .min()
            .map(|(_, k)| k.clone())
    }
}
