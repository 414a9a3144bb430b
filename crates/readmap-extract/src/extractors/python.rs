//! Python classes, functions and module constants via tree-sitter-python.

use readmap_core::{FileSymbol, MapError, SymbolKind};
use tree_sitter::Node;

use crate::source::{ContentParser, Extracted, SourceFile};
use crate::syntax::{self, child_has_kind, field_text, node_text, signature_from, unquote};

#[derive(Debug, Clone, Copy, Default)]
pub struct PythonParser;

impl ContentParser for PythonParser {
    fn name(&self) -> &'static str {
        "python"
    }

    fn parse(&self, source: &SourceFile) -> Result<Option<Extracted>, MapError> {
        let tree = syntax::parse(&tree_sitter_python::LANGUAGE.into(), &source.content)?;
        let src = source.content.as_bytes();
        let root = tree.root_node();

        let mut symbols = Vec::new();
        let mut cursor = root.walk();
        for node in root.named_children(&mut cursor) {
            match node.kind() {
                "expression_statement" => symbols.extend(module_binding(&node, src)),
                _ => symbols.extend(definition(&node, src, false)),
            }
        }

        let mut imports = Vec::new();
        collect_imports(&root, src, &mut imports);
        imports.sort();
        imports.dedup();

        Ok(Some(Extracted::new(symbols).with_imports(imports)))
    }
}

/// A class or function, possibly wrapped in decorators.
fn definition(node: &Node, src: &[u8], in_class: bool) -> Option<FileSymbol> {
    match node.kind() {
        "decorated_definition" => {
            let inner = node.child_by_field_name("definition")?;
            let decorators = decorator_names(node, src);
            let symbol = definition(&inner, src, in_class)?;
            let mut modifiers = symbol.modifiers.clone();
            modifiers.extend(decorators);
            Some(symbol.with_modifiers(modifiers))
        }
        "function_definition" => {
            let name = field_text(node, "name", src)?;
            let kind = if in_class {
                SymbolKind::Method
            } else {
                SymbolKind::Function
            };
            let mut symbol = base(node, name, kind, src);
            if let Some(params) = node.child_by_field_name("parameters") {
                symbol = symbol.with_signature(signature_from(node, params, src));
            }
            if child_has_kind(node, "async") {
                symbol = symbol.with_modifiers(vec!["async".into()]);
            }
            Some(symbol)
        }
        "class_definition" => {
            let name = field_text(node, "name", src)?;
            let mut symbol = base(node, name, SymbolKind::Class, src);
            if let Some(bases) = field_text(node, "superclasses", src) {
                symbol = symbol.with_signature(syntax::collapse_whitespace(&bases));
            }
            let members = node
                .child_by_field_name("body")
                .map(|body| {
                    let mut cursor = body.walk();
                    body.named_children(&mut cursor)
                        .filter_map(|child| definition(&child, src, true))
                        .collect()
                })
                .unwrap_or_default();
            Some(symbol.with_children(members))
        }
        _ => None,
    }
}

fn base(node: &Node, name: String, kind: SymbolKind, src: &[u8]) -> FileSymbol {
    let exported = !name.starts_with('_');
    let symbol = FileSymbol::new(name, kind, syntax::start_line(node), syntax::end_line(node))
        .with_exported(exported);
    match docstring(node, src) {
        Some(doc) => symbol.with_docstring(doc),
        None => symbol,
    }
}

/// First line of the string literal opening a class or function body.
fn docstring(node: &Node, src: &[u8]) -> Option<String> {
    let body = node.child_by_field_name("body")?;
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let literal = first.named_child(0).filter(|n| n.kind() == "string")?;
    let text = node_text(&literal, src);
    unquote(&text)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// `staticmethod` shows as `static`; other decorators keep their name.
fn decorator_names(node: &Node, src: &[u8]) -> Vec<String> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() == "decorator")
        .filter_map(|decorator| {
            let expr = decorator.named_child(0)?;
            let target = if expr.kind() == "call" {
                expr.child_by_field_name("function")?
            } else {
                expr
            };
            let name = node_text(&target, src);
            Some(match name.as_str() {
                "staticmethod" => "static".to_string(),
                _ => name,
            })
        })
        .collect()
}

/// Module-level `NAME = ...` constants and annotated assignments.
fn module_binding(statement: &Node, src: &[u8]) -> Option<FileSymbol> {
    let assignment = statement
        .named_child(0)
        .filter(|n| n.kind() == "assignment")?;
    let left = assignment.child_by_field_name("left")?;
    if left.kind() != "identifier" {
        return None;
    }
    let name = node_text(&left, src);
    let annotated = assignment.child_by_field_name("type").is_some();
    let kind = if is_upper(&name) {
        SymbolKind::Constant
    } else if annotated {
        SymbolKind::Variable
    } else {
        return None;
    };
    let mut symbol = FileSymbol::new(
        name,
        kind,
        syntax::start_line(statement),
        syntax::end_line(statement),
    );
    if let Some(ty) = field_text(&assignment, "type", src) {
        symbol = symbol.with_signature(format!(": {ty}"));
    }
    Some(symbol)
}

fn is_upper(name: &str) -> bool {
    name.chars().any(|c| c.is_alphabetic()) && !name.chars().any(char::is_lowercase)
}

/// Every imported module anywhere in the file, relative imports keeping
/// their leading dots.
fn collect_imports(node: &Node, src: &[u8], imports: &mut Vec<String>) {
    match node.kind() {
        "import_statement" => {
            let mut cursor = node.walk();
            for name in node.children_by_field_name("name", &mut cursor) {
                let module = if name.kind() == "aliased_import" {
                    field_text(&name, "name", src)
                } else {
                    Some(node_text(&name, src))
                };
                imports.extend(module);
            }
        }
        "import_from_statement" => {
            imports.extend(field_text(node, "module_name", src));
        }
        _ => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                collect_imports(&child, src, imports);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"import os
import numpy as np
from . import sibling
from typing import Optional

MAX_SIZE = 100
timeout: float = 2.5
helper_value = 3


class Store(Base):
    """Key-value store.

    Longer description.
    """

    @staticmethod
    def create(path: str) -> "Store":
        return Store()

    @classmethod
    def default(cls):
        pass

    async def fetch(self, key):
        import json
        return None

    def _evict(self):
        pass


@app.route("/")
async def index(request) -> str:
    '''Serve the index.'''
    return "ok"


def _private():
    pass
"#;

    fn parse() -> Extracted {
        PythonParser
            .parse(&SourceFile::from_text("/app/store.py", SOURCE))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn module_level_symbols() {
        let extracted = parse();
        let summary: Vec<(&str, SymbolKind)> = extracted
            .symbols
            .iter()
            .map(|s| (s.name.as_str(), s.kind))
            .collect();
        assert_eq!(
            summary,
            [
                ("MAX_SIZE", SymbolKind::Constant),
                ("timeout", SymbolKind::Variable),
                ("Store", SymbolKind::Class),
                ("index", SymbolKind::Function),
                ("_private", SymbolKind::Function),
            ]
        );
        assert_eq!(extracted.symbols[1].signature.as_deref(), Some(": float"));
        assert_eq!(extracted.symbols[4].is_exported, Some(false));
    }

    #[test]
    fn class_members_and_docstrings() {
        let extracted = parse();
        let store = &extracted.symbols[2];
        assert_eq!((store.start_line, store.end_line), (11, 30));
        assert_eq!(store.signature.as_deref(), Some("(Base)"));
        assert_eq!(store.docstring.as_deref(), Some("Key-value store."));

        let methods: Vec<(&str, Vec<&str>)> = store
            .children
            .iter()
            .map(|m| (m.name.as_str(), m.modifiers.iter().map(String::as_str).collect()))
            .collect();
        assert_eq!(
            methods,
            [
                ("create", vec!["static"]),
                ("default", vec!["classmethod"]),
                ("fetch", vec!["async"]),
                ("_evict", vec![]),
            ]
        );
        assert!(store.children.iter().all(|m| m.kind == SymbolKind::Method));
        assert_eq!(store.children[0].start_line, 18);
        assert_eq!(
            store.children[0].signature.as_deref(),
            Some("(path: str) -> \"Store\"")
        );
    }

    #[test]
    fn decorated_async_function() {
        let extracted = parse();
        let index = &extracted.symbols[3];
        assert_eq!(index.modifiers, ["async", "app.route"]);
        assert_eq!(index.signature.as_deref(), Some("(request) -> str"));
        assert_eq!(index.docstring.as_deref(), Some("Serve the index."));
    }

    #[test]
    fn imports_are_sorted_and_include_nested() {
        let extracted = parse();
        assert_eq!(extracted.imports, [".", "json", "numpy", "os", "typing"]);
    }
}
