//! TOML tables and their keys.

use std::sync::OnceLock;

use readmap_core::{FileSymbol, MapError, SymbolKind};
use regex::Regex;

use crate::source::{ContentParser, Extracted, SourceFile};

const MAX_KEYS: usize = 10;

fn array_table_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\[\[([^\]]+)\]\]\s*(?:#.*)?$").expect("valid regex"))
}

fn table_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\[([^\]]+)\]\s*(?:#.*)?$").expect("valid regex"))
}

fn key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([a-zA-Z_][\w.-]*)\s*=").expect("valid regex"))
}

#[derive(Debug, Default)]
struct Table {
    /// Display name including brackets; empty for the implicit root table.
    header: String,
    line: u32,
    keys: Vec<(String, u32)>,
}

impl Table {
    fn is_root(&self) -> bool {
        self.header.is_empty()
    }

    fn key_symbols(&self) -> Vec<FileSymbol> {
        self.keys
            .iter()
            .take(MAX_KEYS)
            .map(|(name, line)| FileSymbol::new(name.clone(), SymbolKind::Property, *line, *line))
            .collect()
    }
}

/// `[table]` and `[[array]]` headers with up to ten keys each.
///
/// Keys before the first header are emitted as top-level properties.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlParser;

impl ContentParser for TomlParser {
    fn name(&self) -> &'static str {
        "toml"
    }

    fn parse(&self, source: &SourceFile) -> Result<Option<Extracted>, MapError> {
        let tables = scan_tables(&source.content);
        let total = source.total_lines() as u32;

        let mut symbols = Vec::new();
        for (i, table) in tables.iter().enumerate() {
            if table.is_root() {
                symbols.extend(table.key_symbols());
                continue;
            }
            let end = tables.get(i + 1).map_or(total, |next| next.line - 1);
            symbols.push(
                FileSymbol::new(table.header.clone(), SymbolKind::Namespace, table.line, end)
                    .with_children(table.key_symbols()),
            );
        }
        Ok((!symbols.is_empty()).then(|| Extracted::new(symbols)))
    }
}

fn scan_tables(content: &str) -> Vec<Table> {
    let mut tables = Vec::new();
    let mut current = Table {
        line: 1,
        ..Table::default()
    };

    for (i, line) in content.lines().enumerate() {
        let line_no = i as u32 + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let header = array_table_re()
            .captures(trimmed)
            .map(|caps| format!("[[{}]]", &caps[1]))
            .or_else(|| {
                table_re()
                    .captures(trimmed)
                    .map(|caps| format!("[{}]", &caps[1]))
            });
        if let Some(header) = header {
            let finished = std::mem::replace(
                &mut current,
                Table {
                    header,
                    line: line_no,
                    keys: Vec::new(),
                },
            );
            if !finished.is_root() || !finished.keys.is_empty() {
                tables.push(finished);
            }
            continue;
        }

        if let Some(caps) = key_re().captures(trimmed) {
            current.keys.push((caps[1].to_string(), line_no));
        }
    }
    if !current.is_root() || !current.keys.is_empty() {
        tables.push(current);
    }
    tables
}
