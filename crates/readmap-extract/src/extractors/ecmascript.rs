//! TypeScript and JavaScript via the tree-sitter grammars for each dialect.

use std::collections::HashSet;

use readmap_core::{FileSymbol, MapError, SymbolKind};
use tree_sitter::{Language, Node};

use crate::source::{ContentParser, Extracted, SourceFile};
use crate::syntax::{
    self, child_has_kind, collapse_whitespace, field_text, first_doc_line, node_text,
    preceding_comments, signature_from, text_between, unquote,
};

const MAX_TYPE_CHARS: usize = 200;

const MEMBER_MODIFIERS: &[&str] = &[
    "static", "async", "abstract", "readonly", "override", "get", "set",
];

/// Grammar for a file extension: TSX for `.tsx`, JavaScript (which accepts
/// JSX) for the `js` family, TypeScript otherwise.
fn grammar(extension: Option<&str>) -> Language {
    match extension {
        Some("tsx") => tree_sitter_typescript::LANGUAGE_TSX.into(),
        Some("js" | "jsx" | "mjs" | "cjs") => tree_sitter_javascript::LANGUAGE.into(),
        _ => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
    }
}

/// Outlines ES modules: functions, classes with their members, interfaces,
/// type aliases, enums, namespaces and top-level bindings. Export status
/// comes from `export` keywords and local `export { .. }` clauses; JSDoc
/// blocks provide docstrings; import sources become imports.
#[derive(Debug, Clone, Copy, Default)]
pub struct EcmaParser;

impl ContentParser for EcmaParser {
    fn name(&self) -> &'static str {
        "ecmascript"
    }

    fn parse(&self, source: &SourceFile) -> Result<Option<Extracted>, MapError> {
        let language = grammar(source.extension().as_deref());
        let tree = syntax::parse(&language, &source.content)?;
        let mut module = Module::new(source.content.as_bytes());
        let root = tree.root_node();
        let mut cursor = root.walk();
        for statement in root.named_children(&mut cursor) {
            module.statement(&statement);
        }
        Ok(Some(module.finish()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Export {
    exported: bool,
    default: bool,
}

struct Module<'s> {
    src: &'s [u8],
    symbols: Vec<FileSymbol>,
    imports: Vec<String>,
    exported_names: HashSet<String>,
    default_names: HashSet<String>,
}

impl<'s> Module<'s> {
    fn new(src: &'s [u8]) -> Self {
        Self {
            src,
            symbols: Vec::new(),
            imports: Vec::new(),
            exported_names: HashSet::new(),
            default_names: HashSet::new(),
        }
    }

    fn statement(&mut self, node: &Node) {
        match node.kind() {
            "import_statement" => {
                if let Some(module) = field_text(node, "source", self.src) {
                    let module = unquote(&module).to_string();
                    if !self.imports.contains(&module) {
                        self.imports.push(module);
                    }
                }
            }
            "export_statement" => self.export_statement(node),
            _ => self.declaration(node, node, Export::default()),
        }
    }

    fn export_statement(&mut self, node: &Node) {
        let export = Export {
            exported: true,
            default: child_has_kind(node, "default"),
        };
        if let Some(declaration) = node.child_by_field_name("declaration") {
            self.declaration(&declaration, node, export);
        } else if let Some(value) = node.child_by_field_name("value") {
            if value.kind() == "identifier" {
                self.default_names.insert(node_text(&value, self.src));
            } else {
                self.declaration(&value, node, export);
            }
        } else if node.child_by_field_name("source").is_none() {
            // Local `export { a, b as default }` clauses.
            let mut cursor = node.walk();
            for clause in node.named_children(&mut cursor) {
                if clause.kind() != "export_clause" {
                    continue;
                }
                let mut inner = clause.walk();
                for specifier in clause.named_children(&mut inner) {
                    let Some(name) = field_text(&specifier, "name", self.src) else {
                        continue;
                    };
                    if field_text(&specifier, "alias", self.src).as_deref() == Some("default") {
                        self.default_names.insert(name.clone());
                    }
                    self.exported_names.insert(name);
                }
            }
        }
    }

    fn declaration(&mut self, node: &Node, outer: &Node, export: Export) {
        let docstring = jsdoc(outer, self.src);
        for symbol in declaration_symbols(node, self.src) {
            let mut modifiers = symbol.modifiers.clone();
            if export.exported {
                modifiers.push("export".into());
            }
            if export.default {
                modifiers.push("default".into());
            }
            let mut symbol = symbol
                .with_modifiers(modifiers)
                .with_exported(export.exported);
            if symbol.docstring.is_none() {
                if let Some(doc) = &docstring {
                    symbol = symbol.with_docstring(doc.clone());
                }
            }
            self.symbols.push(symbol);
        }
    }

    /// Apply `export { .. }` clauses seen anywhere in the module.
    fn finish(mut self) -> Extracted {
        for symbol in &mut self.symbols {
            let default = self.default_names.contains(&symbol.name);
            if !default && !self.exported_names.contains(&symbol.name) {
                continue;
            }
            if symbol.is_exported != Some(true) {
                symbol.is_exported = Some(true);
                symbol.modifiers.push("export".into());
            }
            if default && !symbol.modifiers.iter().any(|m| m == "default") {
                symbol.modifiers.push("default".into());
            }
        }
        Extracted::new(self.symbols).with_imports(self.imports)
    }
}

/// Symbols declared by one statement; `let a = 1, b = 2` yields two.
fn declaration_symbols(node: &Node, src: &[u8]) -> Vec<FileSymbol> {
    let name = || field_text(node, "name", src).unwrap_or_else(|| "default".to_string());
    let symbol = match node.kind() {
        "function_declaration"
        | "generator_function_declaration"
        | "function_signature"
        | "function_expression"
        | "function"
        | "arrow_function" => function_symbol(node, node, name(), SymbolKind::Function, src)
            .with_modifiers(function_modifiers(node)),
        "class_declaration" | "abstract_class_declaration" | "class" => class_symbol(node, src),
        "interface_declaration" => {
            let members = node
                .child_by_field_name("body")
                .map(|body| interface_members(&body, src))
                .unwrap_or_default();
            with_heading(node, name(), SymbolKind::Interface, src).with_children(members)
        }
        "type_alias_declaration" => {
            let name_node = node.child_by_field_name("name");
            let symbol = base(node, name(), SymbolKind::Type);
            match name_node {
                Some(n) => {
                    symbol.with_signature(clip(text_between(n.start_byte(), node.end_byte(), src)))
                }
                None => symbol,
            }
        }
        "enum_declaration" => {
            let members = node
                .child_by_field_name("body")
                .map(|body| enum_members(&body, src))
                .unwrap_or_default();
            base(node, name(), SymbolKind::Enum).with_children(members)
        }
        "internal_module" | "module" => {
            let members = node
                .child_by_field_name("body")
                .map(|body| {
                    let mut cursor = body.walk();
                    body.named_children(&mut cursor)
                        .flat_map(|statement| {
                            let inner = match statement.kind() {
                                "export_statement" => statement.child_by_field_name("declaration"),
                                _ => Some(statement),
                            };
                            inner.map(|n| declaration_symbols(&n, src)).unwrap_or_default()
                        })
                        .collect()
                })
                .unwrap_or_default();
            base(node, name(), SymbolKind::Namespace).with_children(members)
        }
        "expression_statement" => {
            return node
                .named_child(0)
                .filter(|n| matches!(n.kind(), "internal_module" | "module"))
                .map(|n| declaration_symbols(&n, src))
                .unwrap_or_default();
        }
        "lexical_declaration" | "variable_declaration" => {
            let constant = node.child(0).is_some_and(|kw| kw.kind() == "const");
            let mut cursor = node.walk();
            return node
                .named_children(&mut cursor)
                .filter(|child| child.kind() == "variable_declarator")
                .filter_map(|declarator| binding_symbol(&declarator, constant, src))
                .collect();
        }
        _ => return Vec::new(),
    };
    vec![symbol]
}

fn base(node: &Node, name: String, kind: SymbolKind) -> FileSymbol {
    FileSymbol::new(name, kind, syntax::start_line(node), syntax::end_line(node))
}

/// Class or interface whose signature runs from the name to the body, so
/// generics and heritage clauses stay visible.
fn with_heading(node: &Node, name: String, kind: SymbolKind, src: &[u8]) -> FileSymbol {
    let symbol = base(node, name, kind);
    let Some(name_node) = node.child_by_field_name("name") else {
        return symbol;
    };
    let end = node
        .child_by_field_name("body")
        .map_or(node.end_byte(), |body| body.start_byte());
    let heading = text_between(name_node.start_byte(), end, src);
    if heading.is_empty() || heading == symbol.name {
        symbol
    } else {
        symbol.with_signature(heading)
    }
}

fn function_symbol(
    node: &Node,
    span: &Node,
    name: String,
    kind: SymbolKind,
    src: &[u8],
) -> FileSymbol {
    let mut symbol = base(span, name, kind);
    let params = node
        .child_by_field_name("parameters")
        .or_else(|| node.child_by_field_name("parameter"));
    if let Some(params) = params {
        let signature = signature_from(node, params, src);
        symbol = symbol.with_signature(signature.trim_end_matches("=>").trim_end());
    }
    symbol
}

fn function_modifiers(node: &Node) -> Vec<String> {
    let mut modifiers = Vec::new();
    if child_has_kind(node, "async") {
        modifiers.push("async".to_string());
    }
    if node.kind().starts_with("generator") || child_has_kind(node, "*") {
        modifiers.push("generator".to_string());
    }
    modifiers
}

fn class_symbol(node: &Node, src: &[u8]) -> FileSymbol {
    let name = field_text(node, "name", src).unwrap_or_else(|| "default".to_string());
    let mut symbol = with_heading(node, name, SymbolKind::Class, src);
    if node.kind() == "abstract_class_declaration" {
        symbol = symbol.with_modifiers(vec!["abstract".into()]);
    }
    let members = node
        .child_by_field_name("body")
        .map(|body| class_members(&body, src))
        .unwrap_or_default();
    symbol.with_children(members)
}

fn class_members(body: &Node, src: &[u8]) -> Vec<FileSymbol> {
    let mut cursor = body.walk();
    body.named_children(&mut cursor)
        .filter_map(|member| {
            let symbol = match member.kind() {
                "method_definition" | "method_signature" | "abstract_method_signature" => {
                    let name = field_text(&member, "name", src)?;
                    function_symbol(&member, &member, name, SymbolKind::Method, src)
                        .with_modifiers(member_modifiers(&member, src))
                }
                "public_field_definition" | "field_definition" => {
                    let name = field_text(&member, "name", src)
                        .or_else(|| field_text(&member, "property", src))?;
                    let symbol = base(&member, name, SymbolKind::Property)
                        .with_modifiers(member_modifiers(&member, src));
                    match field_text(&member, "type", src) {
                        Some(ty) => symbol.with_signature(collapse_whitespace(&ty)),
                        None => symbol,
                    }
                }
                _ => return None,
            };
            Some(match jsdoc(&member, src) {
                Some(doc) => symbol.with_docstring(doc),
                None => symbol,
            })
        })
        .collect()
}

/// Accessibility and keyword modifiers on a class member, in source order.
fn member_modifiers(member: &Node, src: &[u8]) -> Vec<String> {
    let mut modifiers = Vec::new();
    let mut cursor = member.walk();
    for child in member.children(&mut cursor) {
        let kind = child.kind();
        if kind == "accessibility_modifier" {
            modifiers.push(node_text(&child, src));
        } else if kind == "override_modifier" {
            modifiers.push("override".to_string());
        } else if kind == "*" {
            modifiers.push("generator".to_string());
        } else if MEMBER_MODIFIERS.contains(&kind) {
            modifiers.push(kind.to_string());
        }
    }
    modifiers
}

fn interface_members(body: &Node, src: &[u8]) -> Vec<FileSymbol> {
    let mut cursor = body.walk();
    body.named_children(&mut cursor)
        .filter_map(|member| match member.kind() {
            "property_signature" => {
                let name = field_text(&member, "name", src)?;
                let symbol = base(&member, name, SymbolKind::Property);
                Some(match field_text(&member, "type", src) {
                    Some(ty) => symbol.with_signature(collapse_whitespace(&ty)),
                    None => symbol,
                })
            }
            "method_signature" => {
                let name = field_text(&member, "name", src)?;
                Some(function_symbol(&member, &member, name, SymbolKind::Method, src))
            }
            _ => None,
        })
        .collect()
}

fn enum_members(body: &Node, src: &[u8]) -> Vec<FileSymbol> {
    let mut cursor = body.walk();
    body.named_children(&mut cursor)
        .filter_map(|member| {
            let name = match member.kind() {
                "property_identifier" | "string" => node_text(&member, src),
                "enum_assignment" => field_text(&member, "name", src)?,
                _ => return None,
            };
            Some(base(&member, unquote(&name).to_string(), SymbolKind::Property))
        })
        .collect()
}

/// `const f = () => ..` is a function; anything else is a binding typed by
/// its annotation.
fn binding_symbol(declarator: &Node, constant: bool, src: &[u8]) -> Option<FileSymbol> {
    let name = field_text(declarator, "name", src)?;
    if let Some(value) = declarator.child_by_field_name("value") {
        if matches!(
            value.kind(),
            "arrow_function" | "function_expression" | "function" | "generator_function"
        ) {
            return Some(
                function_symbol(&value, declarator, name, SymbolKind::Function, src)
                    .with_modifiers(function_modifiers(&value)),
            );
        }
    }
    let kind = if constant {
        SymbolKind::Constant
    } else {
        SymbolKind::Variable
    };
    let symbol = base(declarator, name, kind);
    Some(match field_text(declarator, "type", src) {
        Some(ty) => symbol.with_signature(collapse_whitespace(&ty)),
        None => symbol,
    })
}

/// First description line of a `/** .. */` block directly above `node`.
fn jsdoc(node: &Node, src: &[u8]) -> Option<String> {
    let comments = preceding_comments(node, src, &["decorator"]);
    let block = comments.iter().rev().find(|c| c.starts_with("/**"))?;
    first_doc_line([block.as_str()]).filter(|line| !line.starts_with('@'))
}

fn clip(text: String) -> String {
    if text.chars().count() > MAX_TYPE_CHARS {
        let head: String = text.chars().take(MAX_TYPE_CHARS).collect();
        format!("{head}...")
    } else {
        text
    }
}
