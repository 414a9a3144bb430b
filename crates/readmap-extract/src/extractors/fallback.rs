//! Last-resort extraction from column-0 declaration keywords.

use std::sync::OnceLock;

use readmap_core::{FileSymbol, MapError, SymbolKind};
use regex::Regex;

use crate::extractors::inferred_end;
use crate::source::{ContentParser, Extracted, SourceFile};

const MAX_MATCHES: usize = 500;

const PATTERNS: &[(&str, SymbolKind)] = &[
    ("class ", SymbolKind::Class),
    ("def ", SymbolKind::Function),
    ("async def ", SymbolKind::Function),
    ("func ", SymbolKind::Function),
    ("function ", SymbolKind::Function),
    ("export ", SymbolKind::Function),
    ("struct ", SymbolKind::Struct),
    ("enum ", SymbolKind::Enum),
    ("interface ", SymbolKind::Interface),
    ("type ", SymbolKind::Type),
    ("#define ", SymbolKind::Constant),
    ("CREATE TABLE", SymbolKind::Table),
    ("CREATE VIEW", SymbolKind::View),
    ("CREATE FUNCTION", SymbolKind::Function),
    ("CREATE PROCEDURE", SymbolKind::Procedure),
    ("ALTER TABLE", SymbolKind::Table),
];

fn keyword_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(?:export\s+(?:default\s+)?(?:async\s+)?(?:function\*?|const|let|var|class|interface|type|enum)\s+|(?:async\s+)?def\s+|class\s+|func\s+(?:\([^)]*\)\s*)?|function\*?\s+|struct\s+|enum\s+|interface\s+|type\s+|#define\s+|create\s+(?:or\s+replace\s+)?(?:table|view|function|procedure|index|trigger)\s+(?:if\s+not\s+exists\s+)?|alter\s+table\s+)",
        )
        .expect("valid regex")
    })
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w$.]+").expect("valid regex"))
}

/// Strip the declaration keyword from `line` and return the identifier
/// that follows it.
///
/// # Examples
///
/// ```
/// use readmap_extract::extractors::fallback::declared_name;
///
/// assert_eq!(declared_name("async def fetch(url):"), "fetch");
/// assert_eq!(declared_name("export default async function handler() {"), "handler");
/// assert_eq!(declared_name("func (s *Server) Start() error {"), "Start");
/// assert_eq!(declared_name("#define MAX_LEN 64"), "MAX_LEN");
/// ```
pub fn declared_name(line: &str) -> String {
    let rest = keyword_re()
        .find(line)
        .map_or(line, |m| &line[m.end()..])
        .trim_start();
    if let Some(m) = identifier_re().find(rest) {
        return m.as_str().to_string();
    }
    rest.split(|c: char| c.is_whitespace() || "({<:".contains(c))
        .next()
        .filter(|word| !word.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// Matches lines starting (at column 0) with common declaration keywords
/// across languages. Works on any text but knows nothing about nesting.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinePatternParser;

impl ContentParser for LinePatternParser {
    fn name(&self) -> &'static str {
        "line-pattern"
    }

    fn parse(&self, source: &SourceFile) -> Result<Option<Extracted>, MapError> {
        let matches: Vec<(u32, &str, SymbolKind)> = source
            .content
            .lines()
            .enumerate()
            .filter_map(|(i, line)| {
                PATTERNS
                    .iter()
                    .find(|(prefix, _)| line.starts_with(prefix))
                    .map(|(_, kind)| (i as u32 + 1, line.trim(), *kind))
            })
            .take(MAX_MATCHES)
            .collect();
        if matches.is_empty() {
            return Ok(None);
        }

        let total = source.total_lines() as u32;
        let symbols = matches
            .iter()
            .enumerate()
            .map(|(i, (line, text, kind))| {
                let next = matches.get(i + 1).map(|(next, _, _)| *next);
                FileSymbol::new(declared_name(text), *kind, *line, inferred_end(*line, next, total))
            })
            .collect();
        Ok(Some(Extracted::new(symbols)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_at_column_zero() {
        let content = "\
#define BUF 512
struct packet {
  int len;
};

  def indented_is_ignored():
def handle(p):
    pass
CREATE TABLE users (id int);
";
        let extracted = LinePatternParser
            .parse(&SourceFile::from_text("/src/mixed.txt", content))
            .unwrap()
            .unwrap();
        let summary: Vec<(&str, SymbolKind, u32, u32)> = extracted
            .symbols
            .iter()
            .map(|s| (s.name.as_str(), s.kind, s.start_line, s.end_line))
            .collect();
        assert_eq!(
            summary,
            [
                ("BUF", SymbolKind::Constant, 1, 1),
                ("packet", SymbolKind::Struct, 2, 6),
                ("handle", SymbolKind::Function, 7, 8),
                ("users", SymbolKind::Table, 9, 9),
            ]
        );
    }

    #[test]
    fn last_match_spans_at_most_fifty_lines() {
        let mut content = String::from("class Big:\n");
        content.push_str(&"    x = 1\n".repeat(200));
        let extracted = LinePatternParser
            .parse(&SourceFile::from_text("/a.py", content))
            .unwrap()
            .unwrap();
        assert_eq!(extracted.symbols[0].end_line, 51);
    }

    #[test]
    fn matches_are_capped() {
        let content = "def f():\n".repeat(MAX_MATCHES + 20);
        let extracted = LinePatternParser
            .parse(&SourceFile::from_text("/a.py", content))
            .unwrap()
            .unwrap();
        assert_eq!(extracted.symbols.len(), MAX_MATCHES);
    }

    #[test]
    fn prose_is_no_map() {
        let source = SourceFile::from_text("/notes.txt", "hello\nworld\n");
        assert!(LinePatternParser.parse(&source).unwrap().is_none());
    }

    #[test]
    fn unnamed_declarations() {
        assert_eq!(declared_name("(anonymous)"), "unknown");
        assert_eq!(declared_name("CREATE TABLE IF NOT EXISTS audit_log ("), "audit_log");
        assert_eq!(declared_name("type Handler func(w)"), "Handler");
    }
}
