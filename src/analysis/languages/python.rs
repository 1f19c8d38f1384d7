//! Python usage extractor using tree-sitter.
//!
//! A single depth-first walk over the syntax tree. Only a closed set of node
//! kinds produce facts or bindings; every other node is descended into, so
//! calls nested in decorators, comprehensions, lambdas and f-string
//! interpolations are still seen.

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use tree_sitter::{Language, Node, Parser};

use crate::analysis::{
    is_pascal_case, AnalysisError, BindingOrigin, Deadline, Extraction, LanguageAnalyzer, Origin,
    ParsedFile, SymbolTable, UsageFact, UsageKind,
};

/// Nodes visited between deadline checks.
const DEADLINE_CHECK_INTERVAL: usize = 256;

/// Longest argument or opaque-callee text kept on a fact.
const MAX_TEXT_LEN: usize = 120;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref DOTTED_NAME: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap();
}

pub struct PythonAnalyzer {
    language: Language,
}

impl PythonAnalyzer {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_python::LANGUAGE.into(),
        }
    }

    fn create_parser(&self, deadline: &Deadline) -> Result<Parser, AnalysisError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| AnalysisError::Parser(e.to_string()))?;
        if let Some(remaining) = deadline.remaining() {
            // Zero would disable the timeout; callers check expiry first
            parser.set_timeout_micros((remaining.as_micros() as u64).max(1));
        }
        Ok(parser)
    }
}

impl Default for PythonAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for PythonAnalyzer {
    fn language_id(&self) -> &'static str {
        "python"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["py", "pyi"]
    }

    fn parse(
        &self,
        path: &Path,
        source: &[u8],
        deadline: &Deadline,
    ) -> Result<ParsedFile, AnalysisError> {
        deadline.check()?;
        let mut parser = self.create_parser(deadline)?;
        let tree = match parser.parse(source, None) {
            Some(tree) => tree,
            None if deadline.remaining().is_some() => {
                return Err(AnalysisError::Timeout {
                    budget_ms: deadline.budget_ms(),
                })
            }
            None => {
                return Err(AnalysisError::Parser(format!(
                    "no syntax tree produced for {}",
                    path.display()
                )))
            }
        };

        let root = tree.root_node();
        if root.has_error() {
            let (line, message) = first_syntax_error(root, source);
            return Err(AnalysisError::Syntax { line, message });
        }

        Ok(ParsedFile {
            tree,
            source: source.to_vec(),
            path: path.to_string_lossy().to_string(),
        })
    }

    fn extract_usages(
        &self,
        parsed: &ParsedFile,
        deadline: &Deadline,
    ) -> Result<Extraction, AnalysisError> {
        let mut walker = UsageWalker::new(parsed, deadline);
        walker.visit(parsed.tree.root_node())?;
        Ok(Extraction {
            facts: walker.facts,
            symbols: walker.symbols,
        })
    }
}

/// Locate the first ERROR or MISSING node, in document order.
fn first_syntax_error(root: Node, source: &[u8]) -> (usize, String) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_missing() {
            return (
                node.start_position().row + 1,
                format!("missing {}", node.kind()),
            );
        }
        if node.is_error() {
            let text = node.utf8_text(source).unwrap_or("");
            let snippet = collapse(text);
            let message = if snippet.is_empty() {
                "unexpected end of input".to_string()
            } else {
                format!("unexpected `{}`", snippet)
            };
            return (node.start_position().row + 1, message);
        }
        let mut cursor = node.walk();
        let children: Vec<Node> = node
            .children(&mut cursor)
            .filter(|c| c.has_error() || c.is_missing())
            .collect();
        stack.extend(children.into_iter().rev());
    }
    (root.start_position().row + 1, "syntax error".to_string())
}

/// Whitespace-collapsed, length-capped node text.
fn collapse(text: &str) -> String {
    let collapsed = WHITESPACE.replace_all(text.trim(), " ");
    if collapsed.chars().count() > MAX_TEXT_LEN {
        let mut cut: String = collapsed.chars().take(MAX_TEXT_LEN).collect();
        cut.push_str("...");
        cut
    } else {
        collapsed.into_owned()
    }
}

fn line_of(node: Node) -> usize {
    node.start_position().row + 1
}

struct UsageWalker<'a> {
    parsed: &'a ParsedFile,
    deadline: &'a Deadline,
    facts: Vec<UsageFact>,
    symbols: SymbolTable,
    visited: usize,
}

impl<'a> UsageWalker<'a> {
    fn new(parsed: &'a ParsedFile, deadline: &'a Deadline) -> Self {
        Self {
            parsed,
            deadline,
            facts: Vec::new(),
            symbols: SymbolTable::new(),
            visited: 0,
        }
    }

    fn text(&self, node: Node<'a>) -> &'a str {
        let parsed: &'a ParsedFile = self.parsed;
        parsed.node_text(node)
    }

    fn emit(&mut self, mut fact: UsageFact) {
        fact.seq = self.facts.len();
        self.facts.push(fact);
    }

    /// Bindings become visible to facts emitted after this point.
    fn bind(&mut self, name: &str, origin: BindingOrigin, line: usize) {
        let seq = self.facts.len();
        self.symbols.bind(name, origin, line, seq);
    }

    fn visit(&mut self, node: Node<'a>) -> Result<(), AnalysisError> {
        self.visited += 1;
        if self.visited % DEADLINE_CHECK_INTERVAL == 0 {
            self.deadline.check()?;
        }

        match node.kind() {
            "import_statement" => self.visit_import(node),
            "import_from_statement" => self.visit_import_from(node),
            "future_import_statement" => self.visit_future_import(node),
            "assignment" => self.visit_assignment(node).map(|_| ()),
            "augmented_assignment" => self.visit_augmented_assignment(node),
            "call" => self.visit_call(node),
            "attribute" => self.visit_attribute(node),
            "with_item" => self.visit_with_item(node),
            "comment" => Ok(()),
            _ => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: Node<'a>) -> Result<(), AnalysisError> {
        let mut cursor = node.walk();
        let children: Vec<Node<'a>> = node.named_children(&mut cursor).collect();
        for child in children {
            self.visit(child)?;
        }
        Ok(())
    }

    fn field_children(&self, node: Node<'a>, field: &str) -> Vec<Node<'a>> {
        let mut cursor = node.walk();
        node.children_by_field_name(field, &mut cursor).collect()
    }

    // import a.b, c as d
    fn visit_import(&mut self, node: Node<'a>) -> Result<(), AnalysisError> {
        let line = line_of(node);
        for name in self.field_children(node, "name") {
            let (module, alias) = match name.kind() {
                "aliased_import" => (
                    name.child_by_field_name("name").map(|n| self.text(n)),
                    name.child_by_field_name("alias").map(|n| self.text(n)),
                ),
                _ => (Some(self.text(name)), None),
            };
            let Some(module) = module else { continue };

            self.emit(UsageFact::new(UsageKind::Import, module, line));
            match alias {
                Some(alias) => self.bind(alias, BindingOrigin::Imported(module.to_string()), line),
                None => {
                    // `import a.b` binds `a`
                    let root = module.split('.').next().unwrap_or(module);
                    self.bind(root, BindingOrigin::Imported(root.to_string()), line);
                }
            }
        }
        Ok(())
    }

    // from m import a, b as c
    fn visit_import_from(&mut self, node: Node<'a>) -> Result<(), AnalysisError> {
        let line = line_of(node);
        let Some(module_node) = node.child_by_field_name("module_name") else {
            return Ok(());
        };
        let module = self.text(module_node);
        let relative = module_node.kind() == "relative_import";

        let mut members = Vec::new();
        let mut locals = Vec::new();
        for name in self.field_children(node, "name") {
            let (member, local) = match name.kind() {
                "aliased_import" => {
                    let member = name.child_by_field_name("name").map(|n| self.text(n));
                    let alias = name.child_by_field_name("alias").map(|n| self.text(n));
                    (member, alias.or(member))
                }
                _ => (Some(self.text(name)), Some(self.text(name))),
            };
            if let (Some(member), Some(local)) = (member, local) {
                members.push(member.to_string());
                locals.push((member, local));
            }
        }

        let mut cursor = node.walk();
        let wildcard = node
            .children(&mut cursor)
            .any(|c| c.kind() == "wildcard_import");
        if wildcard {
            members.push("*".to_string());
        }

        let mut fact = UsageFact::new(UsageKind::Import, module, line);
        fact.arguments = members;
        self.emit(fact);

        for (member, local) in locals {
            // Relative targets are outside any catalogued framework
            let origin = if relative {
                BindingOrigin::Opaque
            } else {
                BindingOrigin::Imported(format!("{}.{}", module, member))
            };
            self.bind(local, origin, line);
        }
        Ok(())
    }

    fn visit_future_import(&mut self, node: Node<'a>) -> Result<(), AnalysisError> {
        let mut fact = UsageFact::new(UsageKind::Import, "__future__", line_of(node));
        fact.arguments = self
            .field_children(node, "name")
            .into_iter()
            .map(|n| self.text(n).to_string())
            .collect();
        self.emit(fact);
        Ok(())
    }

    /// Returns the origin bound to the targets so chained assignments
    /// (`a = b = Client()`) share it.
    fn visit_assignment(&mut self, node: Node<'a>) -> Result<BindingOrigin, AnalysisError> {
        if let Some(annotation) = node.child_by_field_name("type") {
            self.visit(annotation)?;
        }

        let origin = match node.child_by_field_name("right") {
            Some(right) if right.kind() == "assignment" => Some(self.visit_assignment(right)?),
            Some(right) => {
                self.visit(right)?;
                Some(self.value_origin(right))
            }
            // Bare annotation `x: int` binds nothing
            None => None,
        };

        if let Some(left) = node.child_by_field_name("left") {
            match &origin {
                Some(origin) => self.bind_target(left, origin.clone())?,
                None => self.visit_target_reads(left)?,
            }
        }
        Ok(origin.unwrap_or(BindingOrigin::Opaque))
    }

    // x.y += 1 writes `x.y`; only the receiver is read
    fn visit_augmented_assignment(&mut self, node: Node<'a>) -> Result<(), AnalysisError> {
        if let Some(right) = node.child_by_field_name("right") {
            self.visit(right)?;
        }
        match node.child_by_field_name("left") {
            Some(left) => self.visit_target_reads(left),
            None => Ok(()),
        }
    }

    fn bind_target(&mut self, target: Node<'a>, origin: BindingOrigin) -> Result<(), AnalysisError> {
        let line = line_of(target);
        match target.kind() {
            "identifier" => {
                let name = self.text(target);
                self.bind(name, origin, line);
                Ok(())
            }
            "attribute" => match dotted_path(target, &self.parsed.source) {
                Some(path) => {
                    self.bind(&path, origin, line);
                    Ok(())
                }
                None => self.visit_target_reads(target),
            },
            "pattern_list" | "tuple_pattern" | "list_pattern" | "list_splat_pattern" => {
                let mut cursor = target.walk();
                let parts: Vec<Node<'a>> = target.named_children(&mut cursor).collect();
                for part in parts {
                    self.bind_target(part, BindingOrigin::Opaque)?;
                }
                Ok(())
            }
            _ => self.visit(target),
        }
    }

    /// Visit the read parts of an assignment target (receiver chains and
    /// subscripts) without emitting the written attribute itself.
    fn visit_target_reads(&mut self, target: Node<'a>) -> Result<(), AnalysisError> {
        match target.kind() {
            "identifier" => Ok(()),
            "attribute" => match target.child_by_field_name("object") {
                Some(object) => self.visit(object),
                None => Ok(()),
            },
            _ => self.visit(target),
        }
    }

    /// Origin of a value expression, evaluated at the current position.
    fn value_origin(&self, value: Node<'a>) -> BindingOrigin {
        let seq = self.facts.len();
        match value.kind() {
            "call" => {
                let Some(callee) = value.child_by_field_name("function") else {
                    return BindingOrigin::Opaque;
                };
                match dotted_path(callee, &self.parsed.source) {
                    Some(path) => match self.symbols.resolve_path(&path, seq).origin.path() {
                        Some(resolved) => BindingOrigin::Instance(resolved.to_string()),
                        None => BindingOrigin::LocalInstance(path),
                    },
                    None => BindingOrigin::Opaque,
                }
            }
            "identifier" | "attribute" => {
                let Some(path) = dotted_path(value, &self.parsed.source) else {
                    return BindingOrigin::Opaque;
                };
                if let Some(binding) = self.symbols.visible(&path, seq) {
                    return binding.origin.clone();
                }
                match self.symbols.resolve_path(&path, seq).origin {
                    Origin::Known(resolved) => BindingOrigin::Imported(resolved),
                    _ => BindingOrigin::Opaque,
                }
            }
            _ => BindingOrigin::Opaque,
        }
    }

    fn visit_call(&mut self, node: Node<'a>) -> Result<(), AnalysisError> {
        let line = line_of(node);
        let Some(callee) = node.child_by_field_name("function") else {
            return self.visit_children(node);
        };
        let is_attribute = callee.kind() == "attribute";

        let mut fact = match dotted_path(callee, &self.parsed.source) {
            Some(path) => {
                let last = path.rsplit('.').next().unwrap_or(&path);
                let kind = classify_call(is_attribute, last);
                let mut fact = UsageFact::new(kind, &path, line);
                if is_attribute {
                    fact.object_name = path.split('.').next().map(str::to_string);
                }
                fact
            }
            None => {
                let last = if is_attribute {
                    callee
                        .child_by_field_name("attribute")
                        .map(|n| self.text(n))
                        .unwrap_or("")
                } else {
                    ""
                };
                let mut fact =
                    UsageFact::new(classify_call(is_attribute, last), &collapse(self.text(callee)), line);
                fact.opaque = true;
                fact
            }
        };

        let arguments = node.child_by_field_name("arguments");
        if let Some(args) = arguments {
            fact.arguments = self.argument_texts(args);
        }
        self.emit(fact);

        // Calls hidden in the receiver chain, e.g. `get_app().run()`
        let base = chain_base(callee);
        if base.kind() != "identifier" {
            self.visit(base)?;
        }
        if let Some(args) = arguments {
            self.visit_arguments(args)?;
        }
        Ok(())
    }

    fn argument_texts(&self, args: Node<'a>) -> Vec<String> {
        if args.kind() != "argument_list" {
            // Bare generator argument: f(x for x in xs)
            return vec![collapse(self.text(args))];
        }

        let mut positional = Vec::new();
        let mut keywords = Vec::new();
        let mut cursor = args.walk();
        for arg in args.named_children(&mut cursor) {
            match arg.kind() {
                "comment" => {}
                "keyword_argument" => {
                    let name = arg.child_by_field_name("name").map(|n| self.text(n));
                    let value = arg.child_by_field_name("value").map(|n| self.text(n));
                    match (name, value) {
                        (Some(name), Some(value)) => {
                            keywords.push(format!("{}={}", name, collapse(value)))
                        }
                        _ => keywords.push(collapse(self.text(arg))),
                    }
                }
                "dictionary_splat" => keywords.push(collapse(self.text(arg))),
                _ => positional.push(collapse(self.text(arg))),
            }
        }
        positional.extend(keywords);
        positional
    }

    fn visit_arguments(&mut self, args: Node<'a>) -> Result<(), AnalysisError> {
        if args.kind() != "argument_list" {
            return self.visit(args);
        }
        let mut cursor = args.walk();
        let children: Vec<Node<'a>> = args.named_children(&mut cursor).collect();
        for arg in children {
            match arg.kind() {
                "keyword_argument" => {
                    if let Some(value) = arg.child_by_field_name("value") {
                        self.visit(value)?;
                    }
                }
                _ => self.visit(arg)?,
            }
        }
        Ok(())
    }

    // Only reached for the outermost attribute of a chain that is not a callee
    fn visit_attribute(&mut self, node: Node<'a>) -> Result<(), AnalysisError> {
        match dotted_path(node, &self.parsed.source) {
            Some(path) => {
                let mut fact = UsageFact::new(UsageKind::AttributeAccess, &path, line_of(node));
                fact.object_name = path.split('.').next().map(str::to_string);
                self.emit(fact);
                Ok(())
            }
            None => self.visit(chain_base(node)),
        }
    }

    // with X(...) as name
    fn visit_with_item(&mut self, node: Node<'a>) -> Result<(), AnalysisError> {
        let Some(value) = node.child_by_field_name("value") else {
            return self.visit_children(node);
        };
        if value.kind() != "as_pattern" {
            return self.visit(value);
        }

        let Some(expr) = value.named_child(0) else {
            return Ok(());
        };
        self.visit(expr)?;
        let origin = self.value_origin(expr);

        if let Some(alias) = value.child_by_field_name("alias") {
            let target = self.text(alias).trim();
            if DOTTED_NAME.is_match(target) {
                self.bind(target, origin, line_of(alias));
            }
        }
        Ok(())
    }
}

fn classify_call(is_attribute: bool, last_segment: &str) -> UsageKind {
    if is_pascal_case(last_segment) {
        UsageKind::ClassInstantiation
    } else if is_attribute {
        UsageKind::MethodCall
    } else {
        UsageKind::FunctionCall
    }
}

/// `a.b.c` for identifier/attribute chains; `None` for anything else.
fn dotted_path(node: Node, source: &[u8]) -> Option<String> {
    match node.kind() {
        "identifier" => node.utf8_text(source).ok().map(str::to_string),
        "attribute" => {
            let object = node.child_by_field_name("object")?;
            let attribute = node.child_by_field_name("attribute")?;
            let base = dotted_path(object, source)?;
            let name = attribute.utf8_text(source).ok()?;
            Some(format!("{}.{}", base, name))
        }
        _ => None,
    }
}

/// The innermost receiver of an attribute chain.
fn chain_base(node: Node) -> Node {
    let mut current = node;
    while current.kind() == "attribute" {
        match current.child_by_field_name("object") {
            Some(object) => current = object,
            None => break,
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(source: &str) -> Extraction {
        let analyzer = PythonAnalyzer::new();
        let deadline = Deadline::unbounded();
        let parsed = analyzer
            .parse(Path::new("test.py"), source.as_bytes(), &deadline)
            .unwrap();
        analyzer.extract_usages(&parsed, &deadline).unwrap()
    }

    fn find<'e>(extraction: &'e Extraction, identifier: &str) -> &'e UsageFact {
        extraction
            .facts
            .iter()
            .find(|f| f.identifier == identifier)
            .unwrap_or_else(|| panic!("no fact for {}", identifier))
    }

    #[test]
    fn test_extract_imports() {
        let source = r#"
import os
import numpy as np
import os.path
from fastapi import FastAPI, APIRouter as Router
from . import local_module
from typing import *
"#;
        let extraction = extract(source);
        let imports: Vec<_> = extraction
            .facts
            .iter()
            .filter(|f| f.kind == UsageKind::Import)
            .map(|f| f.identifier.as_str())
            .collect();
        assert_eq!(imports, vec!["os", "numpy", "os.path", "fastapi", ".", "typing"]);

        let fastapi = find(&extraction, "fastapi");
        assert_eq!(fastapi.arguments, vec!["FastAPI", "APIRouter"]);
        assert_eq!(fastapi.line, 5);
        assert_eq!(find(&extraction, "typing").arguments, vec!["*"]);

        let symbols = &extraction.symbols;
        assert_eq!(
            symbols.visible("np", usize::MAX).map(|b| &b.origin),
            Some(&BindingOrigin::Imported("numpy".into()))
        );
        assert_eq!(
            symbols.visible("Router", usize::MAX).map(|b| &b.origin),
            Some(&BindingOrigin::Imported("fastapi.APIRouter".into()))
        );
        assert_eq!(
            symbols.visible("local_module", usize::MAX).map(|b| &b.origin),
            Some(&BindingOrigin::Opaque)
        );
    }

    #[test]
    fn test_call_classification() {
        let source = r#"
from fastapi import FastAPI
app = FastAPI(title="demo")
app.include_router(router, prefix="/v1")
print("hello")
MAX_SIZE(3)
"#;
        let extraction = extract(source);

        let ctor = find(&extraction, "FastAPI");
        assert_eq!(ctor.kind, UsageKind::ClassInstantiation);
        assert_eq!(ctor.arguments, vec!["title=\"demo\""]);

        let method = find(&extraction, "app.include_router");
        assert_eq!(method.kind, UsageKind::MethodCall);
        assert_eq!(method.object_name.as_deref(), Some("app"));
        assert_eq!(method.arguments, vec!["router", "prefix=\"/v1\""]);

        assert_eq!(find(&extraction, "print").kind, UsageKind::FunctionCall);
        // ALL_CAPS is not a class name
        assert_eq!(find(&extraction, "MAX_SIZE").kind, UsageKind::FunctionCall);
    }

    #[test]
    fn test_instance_binding_from_resolved_callee() {
        let source = r#"
from fastapi import FastAPI
app = FastAPI()
helper = make_helper()
"#;
        let extraction = extract(source);
        let symbols = &extraction.symbols;
        assert_eq!(
            symbols.visible("app", usize::MAX).map(|b| &b.origin),
            Some(&BindingOrigin::Instance("fastapi.FastAPI".into()))
        );
        assert_eq!(
            symbols.visible("helper", usize::MAX).map(|b| &b.origin),
            Some(&BindingOrigin::LocalInstance("make_helper".into()))
        );
    }

    #[test]
    fn test_chained_and_destructuring_assignment() {
        let source = r#"
import httpx
a = b = httpx.Client()
x, y = httpx.Client(), 1
self.client = httpx.Client()
"#;
        let extraction = extract(source);
        let symbols = &extraction.symbols;
        let client = BindingOrigin::Instance("httpx.Client".into());
        assert_eq!(symbols.visible("a", usize::MAX).map(|b| &b.origin), Some(&client));
        assert_eq!(symbols.visible("b", usize::MAX).map(|b| &b.origin), Some(&client));
        assert_eq!(
            symbols.visible("x", usize::MAX).map(|b| &b.origin),
            Some(&BindingOrigin::Opaque)
        );
        assert_eq!(
            symbols.visible("self.client", usize::MAX).map(|b| &b.origin),
            Some(&client)
        );
    }

    #[test]
    fn test_attribute_access_outermost_only() {
        let source = r#"
import fastapi
status = fastapi.status.HTTP_200_OK
"#;
        let extraction = extract(source);
        let accesses: Vec<_> = extraction
            .facts
            .iter()
            .filter(|f| f.kind == UsageKind::AttributeAccess)
            .map(|f| f.identifier.as_str())
            .collect();
        assert_eq!(accesses, vec!["fastapi.status.HTTP_200_OK"]);
    }

    #[test]
    fn test_augmented_assignment_target_is_a_write() {
        let source = r#"
import fastapi
fastapi.other += 1
counters[fastapi.key] -= step(2)
"#;
        let extraction = extract(source);
        let accesses: Vec<_> = extraction
            .facts
            .iter()
            .filter(|f| f.kind == UsageKind::AttributeAccess)
            .map(|f| f.identifier.as_str())
            .collect();
        assert_eq!(accesses, vec!["fastapi.key"]);
        assert_eq!(find(&extraction, "step").kind, UsageKind::FunctionCall);
    }

    #[test]
    fn test_opaque_callee() {
        let source = r#"
handlers[0].run(1)
get_app().start()
"#;
        let extraction = extract(source);
        let run = find(&extraction, "handlers[0].run");
        assert!(run.opaque);
        assert_eq!(run.kind, UsageKind::MethodCall);

        let start = find(&extraction, "get_app().start");
        assert!(start.opaque);
        // The receiver call is still extracted
        let inner = find(&extraction, "get_app");
        assert_eq!(inner.kind, UsageKind::FunctionCall);
        assert!(!inner.opaque);
    }

    #[test]
    fn test_with_binding_and_nested_calls() {
        let source = r#"
import httpx

@app.get("/items")
def handler():
    with httpx.Client() as client:
        client.get(f"{build_url()}/items")
"#;
        let extraction = extract(source);
        assert_eq!(
            extraction
                .symbols
                .visible("client", usize::MAX)
                .map(|b| &b.origin),
            Some(&BindingOrigin::Instance("httpx.Client".into()))
        );
        assert_eq!(find(&extraction, "app.get").line, 4);
        assert_eq!(find(&extraction, "client.get").line, 7);
        assert_eq!(find(&extraction, "build_url").kind, UsageKind::FunctionCall);
    }

    #[test]
    fn test_seq_matches_position() {
        let extraction = extract("import os\nos.getcwd()\nos.listdir('.')\n");
        for (i, fact) in extraction.facts.iter().enumerate() {
            assert_eq!(fact.seq, i);
        }
    }

    #[test]
    fn test_syntax_error() {
        let analyzer = PythonAnalyzer::new();
        let result = analyzer.parse(
            Path::new("broken.py"),
            b"import os\n\ndef broken(:\n    pass\n",
            &Deadline::unbounded(),
        );
        match result {
            Err(AnalysisError::Syntax { line, .. }) => assert_eq!(line, 3),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected a syntax error"),
        }
    }
}
