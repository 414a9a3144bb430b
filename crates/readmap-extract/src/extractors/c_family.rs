//! C and C++ declarations via tree-sitter-c and tree-sitter-cpp.

use readmap_core::{FileSymbol, MapError, SymbolKind};
use tree_sitter::{Language, Node};

use crate::source::{ContentParser, Extracted, SourceFile};
use crate::syntax::{
    self, collapse_whitespace, field_text, first_doc_line, header_signature, node_text,
    preceding_comments, text_between,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    C,
    Cpp,
}

/// Functions, prototypes, records, enums, typedefs and macros. The C++
/// dialect adds classes with access sections, namespaces and templates.
///
/// Headers (`.h`) are registered with the C++ dialect, whose grammar also
/// accepts plain C.
#[derive(Debug, Clone, Copy)]
pub struct CFamilyParser {
    dialect: Dialect,
}

impl CFamilyParser {
    pub fn c() -> Self {
        Self { dialect: Dialect::C }
    }

    pub fn cpp() -> Self {
        Self {
            dialect: Dialect::Cpp,
        }
    }

    fn language(&self) -> Language {
        match self.dialect {
            Dialect::C => tree_sitter_c::LANGUAGE.into(),
            Dialect::Cpp => tree_sitter_cpp::LANGUAGE.into(),
        }
    }
}

impl ContentParser for CFamilyParser {
    fn name(&self) -> &'static str {
        match self.dialect {
            Dialect::C => "c",
            Dialect::Cpp => "cpp",
        }
    }

    fn parse(&self, source: &SourceFile) -> Result<Option<Extracted>, MapError> {
        let tree = syntax::parse(&self.language(), &source.content)?;
        let src = source.content.as_bytes();
        let mut imports = Vec::new();
        let symbols = items(&tree.root_node(), src, &mut imports);
        Ok(Some(Extracted::new(symbols).with_imports(imports)))
    }
}

#[derive(Debug, Clone, Copy)]
enum Scope {
    File,
    Member { public: bool },
}

/// Declarations directly inside a translation unit, namespace body or
/// preprocessor conditional.
fn items(container: &Node, src: &[u8], imports: &mut Vec<String>) -> Vec<FileSymbol> {
    let mut symbols = Vec::new();
    let mut cursor = container.walk();
    for node in container.named_children(&mut cursor) {
        match node.kind() {
            "preproc_include" => {
                if let Some(path) = field_text(&node, "path", src) {
                    imports.push(path.trim_matches(['"', '<', '>']).to_string());
                }
            }
            "preproc_def" | "preproc_function_def" => symbols.extend(macro_symbol(&node, src)),
            "preproc_ifdef" | "preproc_if" | "preproc_else" | "preproc_elif"
            | "preproc_elifdef" => symbols.extend(items(&node, src, imports)),
            "linkage_specification" => {
                let Some(body) = node.child_by_field_name("body") else {
                    continue;
                };
                if body.kind() == "declaration_list" {
                    symbols.extend(items(&body, src, imports));
                } else {
                    symbols.extend(declaration(&body, &node, src, Scope::File));
                }
            }
            "namespace_definition" => symbols.push(namespace(&node, src, imports)),
            _ => symbols.extend(declaration(&node, &node, src, Scope::File)),
        }
    }
    symbols
}

fn namespace(node: &Node, src: &[u8], imports: &mut Vec<String>) -> FileSymbol {
    let name = field_text(node, "name", src).unwrap_or_else(|| "(anonymous)".into());
    let children = node
        .child_by_field_name("body")
        .map(|body| items(&body, src, imports))
        .unwrap_or_default();
    let symbol = FileSymbol::new(
        name,
        SymbolKind::Namespace,
        syntax::start_line(node),
        syntax::end_line(node),
    );
    documented(symbol.with_children(children), node, src)
}

/// Symbols declared by `node`. `anchor` supplies the line range and leading
/// comments; it differs from `node` for template and `extern "C"` wrappers.
fn declaration(node: &Node, anchor: &Node, src: &[u8], scope: Scope) -> Vec<FileSymbol> {
    match node.kind() {
        "function_definition" => node
            .child_by_field_name("declarator")
            .and_then(function_declarator)
            .map(|declarator| function(node, declarator, anchor, src, scope))
            .into_iter()
            .collect(),
        "declaration" | "field_declaration" => values(node, anchor, src, scope),
        "struct_specifier" | "union_specifier" | "class_specifier" | "enum_specifier" => {
            record(node, anchor, src, None).into_iter().collect()
        }
        "type_definition" => type_definition(node, anchor, src),
        "alias_declaration" => {
            let Some(name) = field_text(node, "name", src) else {
                return Vec::new();
            };
            let mut symbol = spanned(name, SymbolKind::Type, anchor, src);
            if let Some(ty) = field_text(node, "type", src) {
                symbol = symbol.with_signature(collapse_whitespace(&ty));
            }
            vec![symbol]
        }
        "template_declaration" => {
            let mut cursor = node.walk();
            let inner = node
                .named_children(&mut cursor)
                .find(|child| child.kind() != "template_parameter_list");
            inner
                .map(|inner| declaration(&inner, anchor, src, scope))
                .unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

fn function(
    node: &Node,
    declarator: Node,
    anchor: &Node,
    src: &[u8],
    scope: Scope,
) -> FileSymbol {
    let name = declared_name(declarator, src);
    let kind = if matches!(scope, Scope::Member { .. }) || name.contains("::") {
        SymbolKind::Method
    } else {
        SymbolKind::Function
    };
    linked(name, kind, node, anchor, src, scope).with_signature(header_signature(node, src))
}

/// Prototypes, variables and fields, plus any record defined inline in the
/// declared type.
fn values(node: &Node, anchor: &Node, src: &[u8], scope: Scope) -> Vec<FileSymbol> {
    let mut symbols = Vec::new();
    if let Some(ty) = node.child_by_field_name("type") {
        if is_record(ty.kind()) {
            symbols.extend(record(&ty, anchor, src, None));
        }
    }

    let ty = field_text(node, "type", src).map(|t| collapse_whitespace(&t));
    let constant = has_qualifier(node, src, &["const", "constexpr"]);
    let mut cursor = node.walk();
    for declarator in node.children_by_field_name("declarator", &mut cursor) {
        if let Some(prototype) = function_declarator(declarator) {
            symbols.push(function(node, prototype, anchor, src, scope));
            continue;
        }
        let kind = match scope {
            Scope::Member { .. } => SymbolKind::Property,
            Scope::File if constant => SymbolKind::Constant,
            Scope::File => SymbolKind::Variable,
        };
        let name = declared_name(declarator, src);
        let mut symbol = linked(name, kind, node, anchor, src, scope);
        if let Some(ty) = &ty {
            symbol = symbol.with_signature(ty.clone());
        }
        symbols.push(symbol);
    }
    symbols
}

fn is_record(kind: &str) -> bool {
    matches!(
        kind,
        "struct_specifier" | "union_specifier" | "class_specifier" | "enum_specifier"
    )
}

/// A struct, union, class or enum with a body. Forward declarations yield
/// nothing. `alias` names records introduced through `typedef`.
fn record(spec: &Node, anchor: &Node, src: &[u8], alias: Option<String>) -> Option<FileSymbol> {
    let body = spec.child_by_field_name("body")?;
    let name = alias
        .or_else(|| field_text(spec, "name", src))
        .unwrap_or_else(|| "(anonymous)".into());

    let (kind, children) = match spec.kind() {
        "enum_specifier" => (SymbolKind::Enum, enumerators(&body, src)),
        "class_specifier" => (SymbolKind::Class, members(&body, src, false)),
        _ => (SymbolKind::Struct, members(&body, src, true)),
    };
    let mut symbol = spanned(name, kind, anchor, src).with_children(children);
    if spec.kind() == "union_specifier" {
        symbol = symbol.with_modifiers(vec!["union".into()]);
    }
    let mut cursor = spec.walk();
    let bases = spec
        .children(&mut cursor)
        .find(|child| child.kind() == "base_class_clause");
    if let Some(bases) = bases {
        let text = node_text(&bases, src);
        symbol = symbol.with_signature(collapse_whitespace(text.trim_start_matches(':')));
    }
    Some(symbol)
}

/// Record members, tracking `public:` / `private:` sections.
fn members(body: &Node, src: &[u8], public_by_default: bool) -> Vec<FileSymbol> {
    let mut public = public_by_default;
    let mut members = Vec::new();
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        if child.kind() == "access_specifier" {
            public = node_text(&child, src).trim_end_matches(':').trim() == "public";
            continue;
        }
        members.extend(declaration(&child, &child, src, Scope::Member { public }));
    }
    members
}

fn enumerators(body: &Node, src: &[u8]) -> Vec<FileSymbol> {
    let mut cursor = body.walk();
    body.named_children(&mut cursor)
        .filter(|child| child.kind() == "enumerator")
        .filter_map(|enumerator| {
            let name = field_text(&enumerator, "name", src)?;
            Some(spanned(name, SymbolKind::Constant, &enumerator, src))
        })
        .collect()
}

/// `typedef struct {..} name;` becomes the record itself; any other typedef
/// is a type alias.
fn type_definition(node: &Node, anchor: &Node, src: &[u8]) -> Vec<FileSymbol> {
    let mut cursor = node.walk();
    let names: Vec<String> = node
        .children_by_field_name("declarator", &mut cursor)
        .map(|declarator| declared_name(declarator, src))
        .collect();
    let spec = node
        .child_by_field_name("type")
        .filter(|ty| is_record(ty.kind()) && ty.child_by_field_name("body").is_some());
    if let Some(spec) = spec {
        return record(&spec, anchor, src, names.into_iter().next())
            .into_iter()
            .collect();
    }
    let signature = text_between(node.start_byte(), node.end_byte(), src);
    names
        .into_iter()
        .map(|name| spanned(name, SymbolKind::Type, anchor, src).with_signature(signature.clone()))
        .collect()
}

/// `#define` constants and function-like macros. Include guards are skipped.
fn macro_symbol(node: &Node, src: &[u8]) -> Option<FileSymbol> {
    let name = field_text(node, "name", src)?;
    let value = field_text(node, "value", src).map(|v| collapse_whitespace(&v));
    if value.is_none() && is_include_guard(node, &name, src) {
        return None;
    }
    let (kind, signature) = match node.child_by_field_name("parameters") {
        Some(params) => (SymbolKind::Function, Some(node_text(&params, src))),
        None => (SymbolKind::Constant, value),
    };
    let mut symbol = spanned(name, kind, node, src).with_modifiers(vec!["macro".into()]);
    if let Some(signature) = signature.filter(|s| !s.is_empty()) {
        symbol = symbol.with_signature(signature);
    }
    Some(symbol)
}

fn is_include_guard(node: &Node, name: &str, src: &[u8]) -> bool {
    node.parent()
        .filter(|parent| parent.kind() == "preproc_ifdef")
        .and_then(|parent| field_text(&parent, "name", src))
        .is_some_and(|guard| guard == name)
}

/// The function declarator inside `declarator`, looking through pointer and
/// reference wrappers. Function pointers (`int (*cb)(int)`) declare
/// variables and yield `None`.
fn function_declarator(declarator: Node) -> Option<Node> {
    let mut node = declarator;
    loop {
        if node.kind() == "function_declarator" {
            let target = node.child_by_field_name("declarator")?;
            return (target.kind() != "parenthesized_declarator").then_some(node);
        }
        node = inner_declarator(&node)?;
    }
}

fn inner_declarator<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    node.child_by_field_name("declarator").or_else(|| match node.kind() {
        "parenthesized_declarator" | "reference_declarator" => {
            node.named_child(node.named_child_count().checked_sub(1)?)
        }
        _ => None,
    })
}

/// The identifier at the bottom of a declarator chain.
fn declared_name(declarator: Node, src: &[u8]) -> String {
    let mut node = declarator;
    while let Some(inner) = inner_declarator(&node) {
        node = inner;
    }
    node_text(&node, src)
}

fn has_qualifier(node: &Node, src: &[u8], qualifiers: &[&str]) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|child| {
        child.kind() == "type_qualifier" && qualifiers.contains(&node_text(&child, src).as_str())
    });
    found
}

fn modifiers(node: &Node, src: &[u8]) -> Vec<String> {
    let mut modifiers = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "storage_class_specifier" => modifiers.push(node_text(&child, src)),
            "virtual" => modifiers.push("virtual".into()),
            _ => {}
        }
    }
    modifiers
}

fn spanned(name: String, kind: SymbolKind, anchor: &Node, src: &[u8]) -> FileSymbol {
    let symbol = FileSymbol::new(name, kind, syntax::start_line(anchor), syntax::end_line(anchor));
    documented(symbol, anchor, src)
}

/// A function or variable with linkage: file-scope `static` hides it, and
/// members follow their access section.
fn linked(
    name: String,
    kind: SymbolKind,
    node: &Node,
    anchor: &Node,
    src: &[u8],
    scope: Scope,
) -> FileSymbol {
    let modifiers = modifiers(node, src);
    let exported = match scope {
        Scope::File => !modifiers.iter().any(|m| m == "static"),
        Scope::Member { public } => public,
    };
    spanned(name, kind, anchor, src)
        .with_modifiers(modifiers)
        .with_exported(exported)
}

fn documented(symbol: FileSymbol, anchor: &Node, src: &[u8]) -> FileSymbol {
    let comments = preceding_comments(anchor, src, &[]);
    match first_doc_line(comments.iter().map(String::as_str)) {
        Some(doc) => symbol.with_docstring(doc),
        None => symbol,
    }
}
