//! Shared tree-sitter helpers for the code extractors.

use readmap_core::MapError;
use tree_sitter::{Language, Node, Parser, Tree};

/// Parse `content` with `language`.
///
/// Tree-sitter is error-tolerant, so a tree comes back even for files with
/// syntax errors; extractors walk whatever it recovered.
///
/// # Errors
///
/// Returns [`MapError::Parse`] if the grammar cannot be loaded or the parser
/// produces no tree.
pub fn parse(language: &Language, content: &str) -> Result<Tree, MapError> {
    let mut parser = Parser::new();
    parser
        .set_language(language)
        .map_err(|e| MapError::Parse(format!("failed to set language: {e}")))?;
    parser
        .parse(content, None)
        .ok_or_else(|| MapError::Parse("parser produced no tree".into()))
}

pub fn node_text(node: &Node, source: &[u8]) -> String {
    let start = node.start_byte();
    let end = node.end_byte();
    if start >= source.len() || end > source.len() {
        return String::new();
    }
    String::from_utf8_lossy(&source[start..end]).into_owned()
}

/// 1-indexed first line of `node`.
pub fn start_line(node: &Node) -> u32 {
    node.start_position().row as u32 + 1
}

/// 1-indexed last line of `node`.
///
/// A node ending at column 0 (trailing newline included) ends on the line
/// before.
pub fn end_line(node: &Node) -> u32 {
    let end = node.end_position();
    let row = if end.column == 0 && end.row > node.start_position().row {
        end.row - 1
    } else {
        end.row
    };
    row as u32 + 1
}

pub fn field_text(node: &Node, field: &str, source: &[u8]) -> Option<String> {
    node.child_by_field_name(field)
        .map(|child| node_text(&child, source))
        .filter(|text| !text.is_empty())
}

pub fn find_child_text(node: &Node, kind: &str, source: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == kind {
            let text = node_text(&child, source);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

pub fn child_has_kind(node: &Node, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|child| child.kind() == kind);
    found
}

/// Declaration text of `node` up to its `body` field, whitespace collapsed.
pub fn header_signature(node: &Node, source: &[u8]) -> String {
    signature_from(node, *node, source)
}

/// Declaration text from `from` up to the `body` field of `node`.
///
/// Used where the name is already shown separately and the signature should
/// start at the parameter list.
pub fn signature_from(node: &Node, from: Node, source: &[u8]) -> String {
    let end = node
        .child_by_field_name("body")
        .map_or(node.end_byte(), |body| body.start_byte());
    text_between(from.start_byte(), end, source)
}

/// Source text in `start..end`, whitespace collapsed and trailing
/// declaration punctuation removed.
pub fn text_between(start: usize, end: usize, source: &[u8]) -> String {
    if start >= end || end > source.len() {
        return String::new();
    }
    let text = String::from_utf8_lossy(&source[start..end]);
    collapse_whitespace(&text)
        .trim_end_matches(['{', ':', ';', '='])
        .trim_end()
        .to_string()
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Contiguous comment nodes directly above `node`, in source order.
///
/// Attribute / decorator siblings listed in `skip` are stepped over so that
/// `/// doc` followed by `#[derive(..)]` still attaches to the item.
pub fn preceding_comments(node: &Node, source: &[u8], skip: &[&str]) -> Vec<String> {
    let mut comments = Vec::new();
    let mut next_row = node.start_position().row;
    let mut current = node.prev_sibling();
    while let Some(sibling) = current {
        if skip.contains(&sibling.kind()) {
            next_row = sibling.start_position().row;
            current = sibling.prev_sibling();
            continue;
        }
        if !sibling.kind().contains("comment") {
            break;
        }
        let comment_end = end_line(&sibling) as usize - 1;
        if comment_end + 1 < next_row {
            break;
        }
        comments.push(node_text(&sibling, source));
        next_row = sibling.start_position().row;
        current = sibling.prev_sibling();
    }
    comments.reverse();
    comments
}

/// First non-empty line of a comment block with comment markers removed.
///
/// # Examples
///
/// ```
/// use readmap_extract::syntax::first_doc_line;
///
/// let block = ["/**", " * Loads the config.", " * @param path where", " */"].join("\n");
/// assert_eq!(first_doc_line([block.as_str()]).as_deref(), Some("Loads the config."));
/// assert_eq!(first_doc_line(["/// Parses input."]).as_deref(), Some("Parses input."));
/// ```
pub fn first_doc_line<'a>(comments: impl IntoIterator<Item = &'a str>) -> Option<String> {
    comments
        .into_iter()
        .flat_map(str::lines)
        .map(strip_comment_markers)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

fn strip_comment_markers(line: &str) -> &str {
    let mut line = line.trim();
    for prefix in ["///", "//!", "//", "/**", "/*", "#"] {
        if let Some(rest) = line.strip_prefix(prefix) {
            line = rest;
            break;
        }
    }
    line = line.trim_end_matches("*/").trim();
    line.strip_prefix('*').unwrap_or(line).trim()
}

/// Strip quotes (and Python string prefixes) from a string literal.
pub fn unquote(literal: &str) -> &str {
    let body = literal.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    for quote in ["\"\"\"", "'''", "\"", "'", "`"] {
        if let Some(inner) = body
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rust() -> Language {
        tree_sitter_rust::LANGUAGE.into()
    }

    #[test]
    fn header_stops_at_body() {
        let src = "pub fn run(\n    x: u32,\n) -> bool {\n    true\n}\n";
        let tree = parse(&rust(), src).unwrap();
        let func = tree.root_node().child(0).unwrap();
        assert_eq!(
            header_signature(&func, src.as_bytes()),
            "pub fn run( x: u32, ) -> bool"
        );
        assert_eq!(start_line(&func), 1);
        assert_eq!(end_line(&func), 5);
    }

    #[test]
    fn bodiless_nodes_drop_trailing_semicolon() {
        let src = "const LIMIT: usize = 10;\n";
        let tree = parse(&rust(), src).unwrap();
        let item = tree.root_node().child(0).unwrap();
        assert_eq!(header_signature(&item, src.as_bytes()), "const LIMIT: usize = 10");
    }

    #[test]
    fn comments_attach_across_attributes() {
        let src = "// unrelated\n\n/// Config holder.\n#[derive(Debug)]\nstruct Config;\n";
        let tree = parse(&rust(), src).unwrap();
        let root = tree.root_node();
        let mut cursor = root.walk();
        let item = root
            .children(&mut cursor)
            .find(|n| n.kind() == "struct_item")
            .unwrap();
        let comments = preceding_comments(&item, src.as_bytes(), &["attribute_item"]);
        assert_eq!(comments.len(), 1);
        assert_eq!(
            first_doc_line(comments.iter().map(String::as_str)).as_deref(),
            Some("Config holder.")
        );
    }

    #[test]
    fn unquote_handles_prefixes() {
        assert_eq!(unquote("\"\"\"Doc.\"\"\""), "Doc.");
        assert_eq!(unquote("r'raw'"), "raw");
        assert_eq!(unquote("\"fmt\""), "fmt");
        assert_eq!(unquote("`tpl`"), "tpl");
    }

    #[test]
    fn whitespace_collapses() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
    }
}
