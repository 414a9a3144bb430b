//! SQL DDL statements found by line-anchored patterns.

use std::collections::HashSet;
use std::sync::OnceLock;

use readmap_core::{FileSymbol, MapError, SymbolKind};
use regex::{Captures, Regex};

use crate::source::{ContentParser, Extracted, SourceFile};

struct Pattern {
    regex: Regex,
    kind: SymbolKind,
    prefix: &'static str,
    name: fn(&Captures) -> String,
}

fn qualified_name(caps: &Captures) -> String {
    caps.get(2)
        .or_else(|| caps.get(1))
        .map_or_else(|| "unknown".to_string(), |m| m.as_str().to_string())
}

fn index_name(caps: &Captures) -> String {
    format!("{} ON {}", &caps[1], &caps[2])
}

fn patterns() -> &'static [Pattern] {
    static PATTERNS: OnceLock<Vec<Pattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let p = |regex: &str,
                 kind: SymbolKind,
                 prefix: &'static str,
                 name: fn(&Captures) -> String| Pattern {
            regex: Regex::new(regex).expect("valid regex"),
            kind,
            prefix,
            name,
        };
        vec![
            p(
                r#"(?i)^\s*CREATE\s+(?:OR\s+REPLACE\s+)?(?:TEMP(?:ORARY)?\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?(?:"?(\w+)"?\.)?"?(\w+)"?"#,
                SymbolKind::Table,
                "TABLE",
                qualified_name,
            ),
            p(
                r#"(?i)^\s*CREATE\s+(?:OR\s+REPLACE\s+)?(?:TEMP(?:ORARY)?\s+)?(?:MATERIALIZED\s+)?VIEW\s+(?:IF\s+NOT\s+EXISTS\s+)?(?:"?(\w+)"?\.)?"?(\w+)"?"#,
                SymbolKind::View,
                "VIEW",
                qualified_name,
            ),
            p(
                r#"(?i)^\s*CREATE\s+(?:UNIQUE\s+)?(?:CLUSTERED\s+)?(?:NONCLUSTERED\s+)?INDEX\s+(?:IF\s+NOT\s+EXISTS\s+)?(?:CONCURRENTLY\s+)?"?(\w+)"?\s+ON\s+"?(\w+)"?"#,
                SymbolKind::Index,
                "INDEX",
                index_name,
            ),
            p(
                r#"(?i)^\s*CREATE\s+(?:OR\s+REPLACE\s+)?(?:DEFINER\s*=\s*\S+\s+)?(?:AGGREGATE\s+)?FUNCTION\s+(?:IF\s+NOT\s+EXISTS\s+)?(?:"?(\w+)"?\.)?"?(\w+)"?"#,
                SymbolKind::Function,
                "FUNCTION",
                qualified_name,
            ),
            p(
                r#"(?i)^\s*CREATE\s+(?:OR\s+REPLACE\s+)?(?:DEFINER\s*=\s*\S+\s+)?PROCEDURE\s+(?:IF\s+NOT\s+EXISTS\s+)?(?:"?(\w+)"?\.)?"?(\w+)"?"#,
                SymbolKind::Procedure,
                "PROCEDURE",
                qualified_name,
            ),
            p(
                r#"(?i)^\s*CREATE\s+(?:OR\s+REPLACE\s+)?(?:CONSTRAINT\s+)?TRIGGER\s+(?:IF\s+NOT\s+EXISTS\s+)?"?(\w+)"?"#,
                SymbolKind::Trigger,
                "TRIGGER",
                qualified_name,
            ),
            p(
                r#"(?i)^\s*CREATE\s+(?:OR\s+REPLACE\s+)?(?:TYPE|DOMAIN)\s+(?:IF\s+NOT\s+EXISTS\s+)?(?:"?(\w+)"?\.)?"?(\w+)"?"#,
                SymbolKind::Type,
                "TYPE",
                qualified_name,
            ),
            p(
                r#"(?i)^\s*CREATE\s+SCHEMA\s+(?:IF\s+NOT\s+EXISTS\s+)?(?:AUTHORIZATION\s+)?"?(\w+)"?"#,
                SymbolKind::Schema,
                "SCHEMA",
                qualified_name,
            ),
            p(
                r#"(?i)^\s*ALTER\s+TABLE\s+(?:IF\s+EXISTS\s+)?(?:ONLY\s+)?(?:"?(\w+)"?\.)?"?(\w+)"?"#,
                SymbolKind::Table,
                "ALTER TABLE",
                qualified_name,
            ),
        ]
    })
}

fn statement_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*(CREATE|ALTER)\s+").expect("valid regex"))
}

/// `CREATE ...` / `ALTER TABLE` statements, one symbol each, named
/// `<PREFIX> <name>`.
///
/// A statement ends at the first line containing `;`, or just before the
/// next `CREATE`/`ALTER`, and never overlaps the next match.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlParser;

impl ContentParser for SqlParser {
    fn name(&self) -> &'static str {
        "sql"
    }

    fn parse(&self, source: &SourceFile) -> Result<Option<Extracted>, MapError> {
        let lines: Vec<&str> = source.content.lines().collect();
        let mut seen = HashSet::new();
        let mut matches: Vec<(usize, String, SymbolKind)> = Vec::new();

        for pattern in patterns() {
            for (idx, line) in lines.iter().enumerate() {
                if line.is_empty() || seen.contains(&idx) {
                    continue;
                }
                if let Some(caps) = pattern.regex.captures(line) {
                    seen.insert(idx);
                    let name = format!("{} {}", pattern.prefix, (pattern.name)(&caps));
                    matches.push((idx, name, pattern.kind));
                }
            }
        }
        if matches.is_empty() {
            return Ok(None);
        }
        matches.sort_by_key(|(idx, _, _)| *idx);

        let symbols = matches
            .iter()
            .enumerate()
            .map(|(i, (idx, name, kind))| {
                let next_start = matches.get(i + 1).map_or(lines.len(), |(next, _, _)| *next);
                let end = statement_end(&lines, *idx).min(next_start).max(idx + 1);
                FileSymbol::new(name.clone(), *kind, *idx as u32 + 1, end as u32)
            })
            .collect();
        Ok(Some(Extracted::new(symbols)))
    }
}

/// 1-indexed end line of the statement starting at `start` (0-indexed).
fn statement_end(lines: &[&str], start: usize) -> usize {
    for (i, line) in lines.iter().enumerate().skip(start) {
        if line.is_empty() {
            continue;
        }
        if line.contains(';') {
            return i + 1;
        }
        if i > start && statement_start_re().is_match(line) {
            return i;
        }
    }
    lines.len()
}
