//! Usage facts extracted from AST analysis.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of API touchpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageKind {
    Import,
    ClassInstantiation,
    MethodCall,
    FunctionCall,
    AttributeAccess,
}

impl UsageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageKind::Import => "import",
            UsageKind::ClassInstantiation => "class_instantiation",
            UsageKind::MethodCall => "method_call",
            UsageKind::FunctionCall => "function_call",
            UsageKind::AttributeAccess => "attribute_access",
        }
    }

    /// Check if this usage invokes something with arguments.
    pub fn is_call(&self) -> bool {
        matches!(
            self,
            UsageKind::ClassInstantiation | UsageKind::MethodCall | UsageKind::FunctionCall
        )
    }
}

impl fmt::Display for UsageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How sure the resolver is about an origin.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionConfidence {
    #[default]
    Low,
    Medium,
    High,
}

impl ResolutionConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionConfidence::Low => "low",
            ResolutionConfidence::Medium => "medium",
            ResolutionConfidence::High => "high",
        }
    }

    /// High and Medium resolutions are trusted enough to prove absence.
    pub fn can_prove_absence(&self) -> bool {
        *self >= ResolutionConfidence::Medium
    }
}

impl fmt::Display for ResolutionConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Best-effort origin of a usage.
///
/// Serialized as `known:<path>`, `inferred:<path>` or `unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Origin {
    /// Reached directly through an import binding.
    Known(String),
    /// Reached through an instance created from a resolved callee.
    Inferred(String),
    Unknown,
}

impl Origin {
    /// The qualified API path, if resolved.
    pub fn path(&self) -> Option<&str> {
        match self {
            Origin::Known(p) | Origin::Inferred(p) => Some(p),
            Origin::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Origin::Unknown)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Known(p) => write!(f, "known:{}", p),
            Origin::Inferred(p) => write!(f, "inferred:{}", p),
            Origin::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for Origin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "unknown" {
            return Ok(Origin::Unknown);
        }
        match s.split_once(':') {
            Some(("known", path)) => Ok(Origin::Known(path.to_string())),
            Some(("inferred", path)) => Ok(Origin::Inferred(path.to_string())),
            _ => Err(format!("unknown origin: {}", s)),
        }
    }
}

impl From<Origin> for String {
    fn from(origin: Origin) -> Self {
        origin.to_string()
    }
}

impl TryFrom<String> for Origin {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Origin plus the confidence it was resolved with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub origin: Origin,
    pub confidence: ResolutionConfidence,
}

impl Resolution {
    pub fn unknown() -> Self {
        Self {
            origin: Origin::Unknown,
            confidence: ResolutionConfidence::Low,
        }
    }
}

/// One observed API touchpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageFact {
    pub kind: UsageKind,
    /// Dotted path as written (module path for imports).
    pub identifier: String,
    /// Root symbol of the receiver expression, for calls and accesses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_name: Option<String>,
    /// Filled in by the resolver.
    #[serde(default)]
    pub resolved_origin: Option<Origin>,
    #[serde(default)]
    pub resolution: ResolutionConfidence,
    /// Positional arguments, then keywords as `name=value`. Imported member
    /// names for `from ... import` statements.
    #[serde(default)]
    pub arguments: Vec<String>,
    /// 1-based line number.
    pub line: usize,
    /// Callee or receiver shape could not be reduced to a dotted path.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub opaque: bool,
    /// Position in extraction order.
    #[serde(skip)]
    pub seq: usize,
}

impl UsageFact {
    pub fn new(kind: UsageKind, identifier: &str, line: usize) -> Self {
        Self {
            kind,
            identifier: identifier.to_string(),
            object_name: None,
            resolved_origin: None,
            resolution: ResolutionConfidence::Low,
            arguments: Vec::new(),
            line,
            opaque: false,
            seq: 0,
        }
    }

    /// Resolved API path, if the resolver found one.
    pub fn resolved_path(&self) -> Option<&str> {
        self.resolved_origin.as_ref().and_then(Origin::path)
    }

    /// Last segment of the identifier as written.
    pub fn member_name(&self) -> &str {
        self.identifier
            .rsplit_once('.')
            .map(|(_, last)| last)
            .unwrap_or(&self.identifier)
    }

    pub fn positional_args(&self) -> impl Iterator<Item = &str> {
        self.arguments
            .iter()
            .map(String::as_str)
            .filter(|a| keyword_name(a).is_none() && !a.starts_with("**"))
    }

    pub fn keyword_args(&self) -> impl Iterator<Item = &str> {
        self.arguments.iter().filter_map(|a| keyword_name(a))
    }

    pub fn has_star_args(&self) -> bool {
        self.arguments
            .iter()
            .any(|a| a.starts_with('*') && !a.starts_with("**"))
    }

    pub fn has_star_kwargs(&self) -> bool {
        self.arguments.iter().any(|a| a.starts_with("**"))
    }
}

/// PascalCase: leading uppercase letter and not ALL_CAPS.
pub fn is_pascal_case(name: &str) -> bool {
    let name = name.trim_start_matches('_');
    name.starts_with(|c: char| c.is_uppercase()) && name.chars().any(|c| c.is_lowercase())
}

/// Keyword name of a `name=value` argument.
fn keyword_name(arg: &str) -> Option<&str> {
    let (name, _) = arg.split_once('=')?;
    let name = name.trim();
    let is_ident = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    // "a == b" and "x<=y" are positional expressions
    let is_comparison = arg[name.len()..].trim_start().starts_with("==");
    (is_ident && !is_comparison).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_roundtrip_strings() {
        let known = Origin::Known("fastapi.FastAPI".to_string());
        assert_eq!(known.to_string(), "known:fastapi.FastAPI");
        assert_eq!("unknown".parse::<Origin>().unwrap(), Origin::Unknown);
        assert!("bogus".parse::<Origin>().is_err());
    }

    #[test]
    fn test_argument_partition() {
        let mut fact = UsageFact::new(UsageKind::MethodCall, "app.get", 3);
        fact.arguments = vec![
            "\"/items\"".to_string(),
            "a == b".to_string(),
            "*extra".to_string(),
            "response_model=Item".to_string(),
            "**opts".to_string(),
        ];
        let positional: Vec<_> = fact.positional_args().collect();
        assert_eq!(positional, vec!["\"/items\"", "a == b", "*extra"]);
        let keywords: Vec<_> = fact.keyword_args().collect();
        assert_eq!(keywords, vec!["response_model"]);
        assert!(fact.has_star_args());
        assert!(fact.has_star_kwargs());
    }

    #[test]
    fn test_pascal_case() {
        assert!(is_pascal_case("FastAPI"));
        assert!(is_pascal_case("_Private"));
        assert!(!is_pascal_case("HTTP_200_OK"));
        assert!(!is_pascal_case("get"));
    }

    #[test]
    fn test_confidence_ordering() {
        assert!(ResolutionConfidence::High.can_prove_absence());
        assert!(ResolutionConfidence::Medium.can_prove_absence());
        assert!(!ResolutionConfidence::Low.can_prove_absence());
    }
}
