//! Knowledge entry definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of API element recorded in the knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Class,
    Method,
    Function,
    Module,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Class => "class",
            EntryType::Method => "method",
            EntryType::Function => "function",
            EntryType::Module => "module",
        }
    }

    /// Whether members of this element are catalogued in the knowledge base.
    ///
    /// Module members and class methods are listed by ingestion; the return
    /// values of functions and methods are not.
    pub fn has_catalogued_members(&self) -> bool {
        matches!(self, EntryType::Class | EntryType::Module)
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One real, documented API element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Framework display name (e.g., "FastAPI").
    #[serde(default)]
    pub framework: String,
    #[serde(rename = "type", alias = "entry_type")]
    pub entry_type: EntryType,
    /// Canonical dotted path, unique within an index.
    pub full_name: String,
    /// Ordered parameter names. Entries may carry annotations (`name: int`),
    /// defaults (`name=None`) and the `*args`, `**kwargs`, `*`, `/` markers.
    /// `None` means the signature was not captured; an empty list is a
    /// callable that takes no arguments.
    #[serde(default)]
    pub parameters: Option<Vec<String>>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub deprecated_since: Option<String>,
    #[serde(default)]
    pub removed_in: Option<String>,
    /// Successor API, if the docs name one.
    #[serde(default)]
    pub replacement: Option<String>,
}

impl KnowledgeEntry {
    pub fn new(framework: &str, entry_type: EntryType, full_name: &str) -> Self {
        Self {
            framework: framework.to_string(),
            entry_type,
            full_name: full_name.to_string(),
            parameters: None,
            deprecated: false,
            deprecated_since: None,
            removed_in: None,
            replacement: None,
        }
    }

    pub fn with_parameters(mut self, params: &[&str]) -> Self {
        self.parameters = Some(params.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn deprecated_since(mut self, since: &str) -> Self {
        self.deprecated = true;
        self.deprecated_since = Some(since.to_string());
        self
    }

    pub fn removed_in(mut self, version: &str) -> Self {
        self.removed_in = Some(version.to_string());
        self
    }

    pub fn replaced_by(mut self, replacement: &str) -> Self {
        self.replacement = Some(replacement.to_string());
        self
    }

    /// First dotted segment of the full name.
    pub fn root(&self) -> &str {
        root_segment(&self.full_name)
    }

    /// Last dotted segment of the full name.
    pub fn simple_name(&self) -> &str {
        self.full_name
            .rsplit_once('.')
            .map(|(_, last)| last)
            .unwrap_or(&self.full_name)
    }

    /// Parent path, `None` for a root entry.
    pub fn parent(&self) -> Option<&str> {
        parent_path(&self.full_name)
    }
}

/// First segment of a dotted path.
pub fn root_segment(path: &str) -> &str {
    path.split('.').next().unwrap_or(path)
}

/// Everything before the last dot.
pub fn parent_path(path: &str) -> Option<&str> {
    path.rsplit_once('.').map(|(parent, _)| parent)
}
