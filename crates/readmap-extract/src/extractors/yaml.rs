//! YAML top-level keys with their immediate children.

use std::sync::OnceLock;

use readmap_core::{FileSymbol, MapError, SymbolKind};
use regex::Regex;

use crate::source::{ContentParser, Extracted, SourceFile};

const MAX_CHILDREN: usize = 10;
const MAX_CHILD_INDENT: usize = 4;

fn skip_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(---|\.\.\.|\s*#|\s*$)").expect("valid regex"))
}

fn key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\s*)([a-zA-Z_][\w.-]*)\s*:").expect("valid regex"))
}

fn array_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\s*)-\s+([a-zA-Z_][\w.-]*)\s*:").expect("valid regex"))
}

#[derive(Debug)]
struct Key {
    name: String,
    indent: usize,
    line: u32,
    array_item: bool,
}

/// Mapping keys found line by line, without a full YAML parse.
///
/// Keys at indent 0 become the roots, each with up to ten keys nested at
/// indent 1 to 4 below it. `- key:` array entries count as indented by
/// the dash. Documents with no indent-0 keys use their shallowest keys as
/// roots instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlParser;

impl ContentParser for YamlParser {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn parse(&self, source: &SourceFile) -> Result<Option<Extracted>, MapError> {
        let keys = scan_keys(&source.content);
        let Some(min_indent) = keys.iter().map(|k| k.indent).min() else {
            return Ok(None);
        };
        let total = source.total_lines() as u32;
        let symbols = if min_indent == 0 {
            top_level(&keys, total)
        } else {
            shallowest(&keys, min_indent, total)
        };
        Ok(Some(Extracted::new(symbols)))
    }
}

fn scan_keys(content: &str) -> Vec<Key> {
    let mut keys = Vec::new();
    for (i, line) in content.lines().enumerate() {
        if skip_re().is_match(line) {
            continue;
        }
        let line_no = i as u32 + 1;
        if let Some(caps) = key_re().captures(line) {
            keys.push(Key {
                name: caps[2].to_string(),
                indent: caps[1].len(),
                line: line_no,
                array_item: false,
            });
        } else if let Some(caps) = array_key_re().captures(line) {
            keys.push(Key {
                name: caps[2].to_string(),
                indent: caps[1].len() + 2,
                line: line_no,
                array_item: true,
            });
        }
    }
    keys
}

fn top_level(keys: &[Key], total_lines: u32) -> Vec<FileSymbol> {
    let roots: Vec<&Key> = keys.iter().filter(|k| k.indent == 0).collect();
    roots
        .iter()
        .enumerate()
        .map(|(i, root)| {
            let next_line = roots.get(i + 1).map(|next| next.line);
            let end = next_line.map_or(total_lines, |line| line - 1);
            let children = keys
                .iter()
                .filter(|k| {
                    (1..=MAX_CHILD_INDENT).contains(&k.indent)
                        && k.line > root.line
                        && next_line.map_or(true, |line| k.line < line)
                })
                .take(MAX_CHILDREN)
                .map(|k| {
                    let kind = if k.array_item {
                        SymbolKind::Variable
                    } else {
                        SymbolKind::Property
                    };
                    FileSymbol::new(k.name.clone(), kind, k.line, k.line)
                })
                .collect();
            FileSymbol::new(root.name.clone(), SymbolKind::Property, root.line, end)
                .with_children(children)
        })
        .collect()
}

fn shallowest(keys: &[Key], indent: usize, total_lines: u32) -> Vec<FileSymbol> {
    let roots: Vec<&Key> = keys.iter().filter(|k| k.indent == indent).collect();
    roots
        .iter()
        .enumerate()
        .map(|(i, k)| {
            let end = roots.get(i + 1).map_or(total_lines, |next| next.line - 1);
            FileSymbol::new(k.name.clone(), SymbolKind::Property, k.line, end)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Option<Vec<FileSymbol>> {
        YamlParser
            .parse(&SourceFile::from_text("/ci/config.yml", content))
            .unwrap()
            .map(|e| e.symbols)
    }

    #[test]
    fn top_level_keys_with_children() {
        let doc = "\
---
# build settings
name: ci
jobs:
  build:
    runs-on: ubuntu
  steps:
  - uses: checkout
    with: x
env:
  RUST_LOG: debug
";
        let symbols = parse(doc).unwrap();
        let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["name", "jobs", "env"]);

        let jobs = &symbols[1];
        assert_eq!((jobs.start_line, jobs.end_line), (4, 9));
        let children: Vec<(&str, SymbolKind)> = jobs
            .children
            .iter()
            .map(|c| (c.name.as_str(), c.kind))
            .collect();
        assert_eq!(
            children,
            [
                ("build", SymbolKind::Property),
                ("runs-on", SymbolKind::Property),
                ("steps", SymbolKind::Property),
                ("uses", SymbolKind::Variable),
                ("with", SymbolKind::Property),
            ]
        );
        assert_eq!(symbols[2].end_line, 11);
    }

    #[test]
    fn children_are_capped() {
        let mut doc = String::from("root:\n");
        for i in 0..15 {
            doc.push_str(&format!("  key{i}: {i}\n"));
        }
        let symbols = parse(&doc).unwrap();
        assert_eq!(symbols[0].children.len(), MAX_CHILDREN);
    }

    #[test]
    fn indented_only_documents_use_shallowest_keys() {
        let symbols = parse("  a: 1\n    b: 2\n  c: 3\n").unwrap();
        let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["a", "c"]);
        assert_eq!(symbols[0].end_line, 2);
    }

    #[test]
    fn comments_only_is_no_map() {
        assert!(parse("# nothing\n---\n").is_none());
    }
}
