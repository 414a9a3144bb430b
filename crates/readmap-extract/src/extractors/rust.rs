//! Rust items via tree-sitter-rust.

use readmap_core::{FileSymbol, MapError, SymbolKind};
use tree_sitter::Node;

use crate::source::{ContentParser, Extracted, SourceFile};
use crate::syntax::{
    self, child_has_kind, collapse_whitespace, field_text, first_doc_line, node_text,
    preceding_comments, text_between,
};

const DOC_SKIP: &[&str] = &["attribute_item"];

/// Where an item is declared; decides function vs method and visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Module,
    Impl,
    Trait,
}

/// Extracts functions, types, traits, impl blocks, modules, constants,
/// statics and `macro_rules!` definitions, nesting members under their
/// container. `use` arguments become imports.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustParser;

impl ContentParser for RustParser {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn parse(&self, source: &SourceFile) -> Result<Option<Extracted>, MapError> {
        let tree = syntax::parse(&tree_sitter_rust::LANGUAGE.into(), &source.content)?;
        let src = source.content.as_bytes();
        let mut imports = Vec::new();
        let symbols = collect_items(&tree.root_node(), src, Scope::Module, &mut imports);
        Ok(Some(Extracted::new(symbols).with_imports(imports)))
    }
}

fn collect_items(
    parent: &Node,
    src: &[u8],
    scope: Scope,
    imports: &mut Vec<String>,
) -> Vec<FileSymbol> {
    let mut symbols = Vec::new();
    let mut cursor = parent.walk();
    for node in parent.named_children(&mut cursor) {
        if node.kind() == "use_declaration" {
            if let Some(argument) = node.child_by_field_name("argument") {
                imports.push(collapse_whitespace(&node_text(&argument, src)));
            }
            continue;
        }
        if let Some(symbol) = item_symbol(&node, src, scope, imports) {
            symbols.push(symbol);
        }
    }
    symbols
}

fn item_symbol(
    node: &Node,
    src: &[u8],
    scope: Scope,
    imports: &mut Vec<String>,
) -> Option<FileSymbol> {
    let body = node.child_by_field_name("body");
    let symbol = match node.kind() {
        "function_item" | "function_signature_item" => {
            let kind = if scope == Scope::Module {
                SymbolKind::Function
            } else {
                SymbolKind::Method
            };
            named(node, src, kind)?
                .with_signature(syntax::header_signature(node, src))
                .with_modifiers(modifiers(node))
        }
        "struct_item" | "union_item" => {
            let fields = body.map(|b| field_symbols(&b, src)).unwrap_or_default();
            type_symbol(node, src, SymbolKind::Struct)?.with_children(fields)
        }
        "enum_item" => {
            let variants = body.map(|b| variant_symbols(&b, src)).unwrap_or_default();
            type_symbol(node, src, SymbolKind::Enum)?.with_children(variants)
        }
        "trait_item" => {
            let members = body
                .map(|b| collect_items(&b, src, Scope::Trait, imports))
                .unwrap_or_default();
            type_symbol(node, src, SymbolKind::Interface)?.with_children(members)
        }
        "impl_item" => {
            let target = field_text(node, "type", src)?;
            let name = match field_text(node, "trait", src) {
                Some(tr) => format!("impl {tr} for {target}"),
                None => format!("impl {target}"),
            };
            let methods = body
                .map(|b| collect_items(&b, src, Scope::Impl, imports))
                .unwrap_or_default();
            with_docs(
                FileSymbol::new(
                    collapse_whitespace(&name),
                    SymbolKind::Class,
                    syntax::start_line(node),
                    syntax::end_line(node),
                ),
                node,
                src,
            )
            .with_children(methods)
        }
        "mod_item" => {
            let items = body
                .map(|b| collect_items(&b, src, Scope::Module, imports))
                .unwrap_or_default();
            named(node, src, SymbolKind::Module)?
                .with_modifiers(modifiers(node))
                .with_children(items)
        }
        "type_item" | "associated_type" => type_symbol(node, src, SymbolKind::Type)?,
        "const_item" => binding(node, src, SymbolKind::Constant)?,
        "static_item" => {
            let mut extra = vec!["static".to_string()];
            if child_has_kind(node, "mutable_specifier") {
                extra.push("mut".into());
            }
            let symbol = binding(node, src, SymbolKind::Variable)?;
            let mut mods = symbol.modifiers.clone();
            mods.extend(extra);
            symbol.with_modifiers(mods)
        }
        "macro_definition" => {
            named(node, src, SymbolKind::Function)?.with_modifiers(vec!["macro".into()])
        }
        _ => return None,
    };

    Some(match scope {
        Scope::Trait => symbol,
        Scope::Module | Scope::Impl => {
            let exported = child_has_kind(node, "visibility_modifier");
            symbol.with_exported(exported)
        }
    })
}

/// Symbol named by the `name` field, spanning the whole node, with its doc
/// comment.
fn named(node: &Node, src: &[u8], kind: SymbolKind) -> Option<FileSymbol> {
    let name = field_text(node, "name", src)?;
    let symbol = FileSymbol::new(name, kind, syntax::start_line(node), syntax::end_line(node));
    Some(with_docs(symbol, node, src))
}

/// Type-like item whose signature is the name plus generics, so the rendered
/// line reads `struct Pool<T>` rather than repeating the keyword.
fn type_symbol(node: &Node, src: &[u8], kind: SymbolKind) -> Option<FileSymbol> {
    let name_node = node.child_by_field_name("name")?;
    let end = node
        .child_by_field_name("body")
        .map_or(node.end_byte(), |body| body.start_byte());
    let signature = text_between(name_node.start_byte(), end, src);
    let symbol = named(node, src, kind)?.with_modifiers(modifiers(node));
    if signature.is_empty() || signature == symbol.name {
        Some(symbol)
    } else {
        Some(symbol.with_signature(signature))
    }
}

/// `const` / `static`: signature is `NAME: Type` without the value.
fn binding(node: &Node, src: &[u8], kind: SymbolKind) -> Option<FileSymbol> {
    let name_node = node.child_by_field_name("name")?;
    let end = node
        .child_by_field_name("value")
        .map_or(node.end_byte(), |value| value.start_byte());
    let signature = text_between(name_node.start_byte(), end, src);
    Some(
        named(node, src, kind)?
            .with_signature(signature)
            .with_modifiers(modifiers(node)),
    )
}

fn field_symbols(body: &Node, src: &[u8]) -> Vec<FileSymbol> {
    let mut cursor = body.walk();
    body.named_children(&mut cursor)
        .filter(|child| child.kind() == "field_declaration")
        .filter_map(|field| {
            let symbol = named(&field, src, SymbolKind::Property)?;
            let signature = collapse_whitespace(&node_text(&field, src));
            Some(symbol.with_signature(signature))
        })
        .collect()
}

fn variant_symbols(body: &Node, src: &[u8]) -> Vec<FileSymbol> {
    let mut cursor = body.walk();
    body.named_children(&mut cursor)
        .filter(|child| child.kind() == "enum_variant")
        .filter_map(|variant| named(&variant, src, SymbolKind::Property))
        .collect()
}

/// `pub` plus function qualifiers, in source order.
fn modifiers(node: &Node) -> Vec<String> {
    let mut mods = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "visibility_modifier" => mods.push("pub".to_string()),
            "function_modifiers" => {
                let mut inner = child.walk();
                for qualifier in child.children(&mut inner) {
                    match qualifier.kind() {
                        "async" | "unsafe" | "const" | "default" => {
                            mods.push(qualifier.kind().to_string());
                        }
                        "extern_modifier" => mods.push("extern".to_string()),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
    mods
}

/// First line of the outer doc comment (`///` or `/** */`) above `node`.
fn with_docs(symbol: FileSymbol, node: &Node, src: &[u8]) -> FileSymbol {
    let comments = preceding_comments(node, src, DOC_SKIP);
    let docs = comments
        .iter()
        .map(String::as_str)
        .filter(|c| c.starts_with("///") || c.starts_with("/**"));
    match first_doc_line(docs) {
        Some(doc) => symbol.with_docstring(doc),
        None => symbol,
    }
}
