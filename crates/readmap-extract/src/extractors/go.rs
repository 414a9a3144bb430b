//! Go declarations via tree-sitter-go.

use readmap_core::{FileSymbol, MapError, SymbolKind};
use tree_sitter::Node;

use crate::source::{ContentParser, Extracted, SourceFile};
use crate::syntax::{
    self, collapse_whitespace, field_text, first_doc_line, node_text, preceding_comments,
    signature_from, text_between, unquote,
};

/// Functions, methods, type specs, constants and package-level variables.
/// Exported status follows Go's capitalisation rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoParser;

impl ContentParser for GoParser {
    fn name(&self) -> &'static str {
        "go"
    }

    fn parse(&self, source: &SourceFile) -> Result<Option<Extracted>, MapError> {
        let tree = syntax::parse(&tree_sitter_go::LANGUAGE.into(), &source.content)?;
        let src = source.content.as_bytes();
        let root = tree.root_node();

        let mut symbols = Vec::new();
        let mut imports = Vec::new();
        let mut cursor = root.walk();
        for node in root.named_children(&mut cursor) {
            match node.kind() {
                "import_declaration" => collect_imports(&node, src, &mut imports),
                "function_declaration" => symbols.extend(function(&node, src, None)),
                "method_declaration" => {
                    let receiver = node.child_by_field_name("receiver");
                    symbols.extend(function(&node, src, receiver));
                }
                "type_declaration" => symbols.extend(type_specs(&node, src)),
                "const_declaration" => {
                    symbols.extend(value_specs(&node, src, SymbolKind::Constant));
                }
                "var_declaration" => {
                    symbols.extend(value_specs(&node, src, SymbolKind::Variable));
                }
                _ => {}
            }
        }
        Ok(Some(Extracted::new(symbols).with_imports(imports)))
    }
}

fn is_exported(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_uppercase())
}

fn declared(
    name: String,
    kind: SymbolKind,
    span: &Node,
    doc_anchor: &Node,
    src: &[u8],
) -> FileSymbol {
    let exported = is_exported(&name);
    let symbol = FileSymbol::new(name, kind, syntax::start_line(span), syntax::end_line(span))
        .with_exported(exported);
    let comments = preceding_comments(doc_anchor, src, &[]);
    match first_doc_line(comments.iter().map(String::as_str)) {
        Some(doc) => symbol.with_docstring(doc),
        None => symbol,
    }
}

/// A function, or a method when `receiver` is set; the receiver then leads
/// the signature.
fn function(node: &Node, src: &[u8], receiver: Option<Node>) -> Option<FileSymbol> {
    let name = field_text(node, "name", src)?;
    let kind = if receiver.is_some() {
        SymbolKind::Method
    } else {
        SymbolKind::Function
    };
    let from = receiver.or_else(|| node.child_by_field_name("parameters"))?;
    Some(declared(name, kind, node, node, src).with_signature(signature_from(node, from, src)))
}

fn type_specs(declaration: &Node, src: &[u8]) -> Vec<FileSymbol> {
    let mut cursor = declaration.walk();
    let specs: Vec<Node> = declaration
        .named_children(&mut cursor)
        .filter(|n| matches!(n.kind(), "type_spec" | "type_alias"))
        .collect();
    let single = specs.len() == 1;
    specs
        .iter()
        .filter_map(|spec| {
            // A lone spec spans (and is documented by) the whole declaration.
            let anchor = if single { declaration } else { spec };
            type_spec(spec, anchor, src)
        })
        .collect()
}

fn type_spec(spec: &Node, anchor: &Node, src: &[u8]) -> Option<FileSymbol> {
    let name_node = spec.child_by_field_name("name")?;
    let name = node_text(&name_node, src);
    let ty = spec.child_by_field_name("type")?;
    let symbol = match ty.kind() {
        "struct_type" => declared(name, SymbolKind::Struct, anchor, anchor, src)
            .with_children(struct_fields(&ty, src)),
        "interface_type" => declared(name, SymbolKind::Interface, anchor, anchor, src)
            .with_children(interface_methods(&ty, src)),
        _ => declared(name, SymbolKind::Type, anchor, anchor, src)
            .with_signature(text_between(name_node.start_byte(), spec.end_byte(), src)),
    };
    Some(symbol)
}

fn struct_fields(struct_type: &Node, src: &[u8]) -> Vec<FileSymbol> {
    let mut fields = Vec::new();
    let mut cursor = struct_type.walk();
    for list in struct_type.named_children(&mut cursor) {
        if list.kind() != "field_declaration_list" {
            continue;
        }
        let mut inner = list.walk();
        for field in list.named_children(&mut inner) {
            if field.kind() != "field_declaration" {
                continue;
            }
            let ty = field_text(&field, "type", src).map(|t| collapse_whitespace(&t));
            let mut names_cursor = field.walk();
            let names: Vec<String> = field
                .children_by_field_name("name", &mut names_cursor)
                .map(|n| node_text(&n, src))
                .collect();
            // Embedded fields are named by their type.
            let names = if names.is_empty() {
                ty.iter().cloned().collect()
            } else {
                names
            };
            for name in names {
                let mut symbol = declared(name, SymbolKind::Property, &field, &field, src);
                if let Some(ty) = &ty {
                    symbol = symbol.with_signature(ty.clone());
                }
                fields.push(symbol);
            }
        }
    }
    fields
}

fn interface_methods(interface_type: &Node, src: &[u8]) -> Vec<FileSymbol> {
    let mut cursor = interface_type.walk();
    interface_type
        .named_children(&mut cursor)
        .filter(|n| matches!(n.kind(), "method_elem" | "method_spec"))
        .filter_map(|method| {
            let name = field_text(&method, "name", src)?;
            let params = method.child_by_field_name("parameters")?;
            let signature = text_between(params.start_byte(), method.end_byte(), src);
            Some(
                declared(name, SymbolKind::Method, &method, &method, src)
                    .with_signature(signature),
            )
        })
        .collect()
}

/// `const` / `var` specs, including grouped ones. Blank identifiers are
/// skipped.
fn value_specs(declaration: &Node, src: &[u8], kind: SymbolKind) -> Vec<FileSymbol> {
    let mut specs = Vec::new();
    gather_specs(declaration, &mut specs);
    let single = specs.len() == 1;

    let mut symbols = Vec::new();
    for spec in specs {
        let anchor = if single { *declaration } else { spec };
        let ty = field_text(&spec, "type", src).map(|t| collapse_whitespace(&t));
        let mut cursor = spec.walk();
        for name_node in spec.children_by_field_name("name", &mut cursor) {
            let name = node_text(&name_node, src);
            if name == "_" {
                continue;
            }
            let mut symbol = declared(name, kind, &anchor, &anchor, src);
            if let Some(ty) = &ty {
                symbol = symbol.with_signature(ty.clone());
            }
            symbols.push(symbol);
        }
    }
    symbols
}

fn gather_specs<'t>(node: &Node<'t>, specs: &mut Vec<Node<'t>>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "const_spec" | "var_spec" => specs.push(child),
            "var_spec_list" | "const_spec_list" => gather_specs(&child, specs),
            _ => {}
        }
    }
}

/// Import paths; named imports keep their alias (`log github.com/..`),
/// dot and blank imports do not.
fn collect_imports(node: &Node, src: &[u8], imports: &mut Vec<String>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "import_spec" => {
                let Some(path) = field_text(&child, "path", src) else {
                    continue;
                };
                let path = unquote(&path).to_string();
                let alias = child
                    .child_by_field_name("name")
                    .filter(|n| n.kind() == "package_identifier")
                    .map(|n| node_text(&n, src));
                imports.push(match alias {
                    Some(alias) => format!("{alias} {path}"),
                    None => path,
                });
            }
            "import_spec_list" => collect_imports(&child, src, imports),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"package server

import (
	"context"
	"fmt"
	log "github.com/sirupsen/logrus"
	_ "net/http/pprof"
)

// MaxConns bounds the pool.
const MaxConns = 10

var (
	defaultName string = "srv"
	_          = fmt.Sprintf
)

// Server handles requests.
type Server struct {
	Name  string
	conns int
	*log.Logger
}

type Handler interface {
	Serve(ctx context.Context) error
}

type Mode int

// NewServer builds a server.
func NewServer(name string) *Server {
	return &Server{Name: name}
}

func (s *Server) Start(ctx context.Context) error {
	return nil
}
"#;

    fn parse() -> Extracted {
        GoParser
            .parse(&SourceFile::from_text("/srv/server.go", SOURCE))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn declarations_in_order() {
        let extracted = parse();
        let summary: Vec<(&str, SymbolKind)> = extracted
            .symbols
            .iter()
            .map(|s| (s.name.as_str(), s.kind))
            .collect();
        assert_eq!(
            summary,
            [
                ("MaxConns", SymbolKind::Constant),
                ("defaultName", SymbolKind::Variable),
                ("Server", SymbolKind::Struct),
                ("Handler", SymbolKind::Interface),
                ("Mode", SymbolKind::Type),
                ("NewServer", SymbolKind::Function),
                ("Start", SymbolKind::Method),
            ]
        );
        assert_eq!(
            extracted.imports,
            ["context", "fmt", "log github.com/sirupsen/logrus", "net/http/pprof"]
        );
    }

    #[test]
    fn docs_signatures_and_export() {
        let extracted = parse();
        let max = &extracted.symbols[0];
        assert_eq!(max.docstring.as_deref(), Some("MaxConns bounds the pool."));
        assert_eq!(max.start_line, 11);

        let default_name = &extracted.symbols[1];
        assert_eq!(default_name.signature.as_deref(), Some("string"));
        assert_eq!(default_name.is_exported, Some(false));

        let new_server = &extracted.symbols[5];
        assert_eq!(new_server.signature.as_deref(), Some("(name string) *Server"));
        assert_eq!(new_server.docstring.as_deref(), Some("NewServer builds a server."));
        assert_eq!((new_server.start_line, new_server.end_line), (32, 34));
        assert_eq!(new_server.is_exported, Some(true));

        let start = &extracted.symbols[6];
        assert_eq!(
            start.signature.as_deref(),
            Some("(s *Server) Start(ctx context.Context) error")
        );
        assert!(start.docstring.is_none());

        assert_eq!(extracted.symbols[4].signature.as_deref(), Some("Mode int"));
    }

    #[test]
    fn struct_and_interface_members() {
        let extracted = parse();
        let server = &extracted.symbols[2];
        assert_eq!((server.start_line, server.end_line), (19, 23));
        assert_eq!(server.docstring.as_deref(), Some("Server handles requests."));
        let fields: Vec<(&str, Option<&str>)> = server
            .children
            .iter()
            .map(|f| (f.name.as_str(), f.signature.as_deref()))
            .collect();
        assert_eq!(
            fields,
            [
                ("Name", Some("string")),
                ("conns", Some("int")),
                ("log.Logger", Some("log.Logger")),
            ]
        );

        let handler = &extracted.symbols[3];
        assert_eq!(handler.children[0].name, "Serve");
        assert_eq!(
            handler.children[0].signature.as_deref(),
            Some("(ctx context.Context) error")
        );
    }
}
