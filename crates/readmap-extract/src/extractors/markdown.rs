//! Markdown headings nested by level.

use std::sync::OnceLock;

use readmap_core::{FileSymbol, MapError, SymbolKind};
use regex::Regex;

use crate::source::{ContentParser, Extracted, SourceFile};

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("valid regex"))
}

struct Heading {
    level: usize,
    text: String,
    line: u32,
}

/// ATX headings (`#` .. `######`) outside fenced code blocks.
///
/// A heading spans until the next heading of the same or a higher level, so
/// subsections always sit inside their parent's range.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownParser;

impl ContentParser for MarkdownParser {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn parse(&self, source: &SourceFile) -> Result<Option<Extracted>, MapError> {
        let headings = scan_headings(&source.content);
        if headings.is_empty() {
            return Ok(None);
        }
        let total = source.total_lines() as u32;
        Ok(Some(Extracted::new(nest(&headings, total))))
    }
}

fn scan_headings(content: &str) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut in_fence = false;
    for (i, line) in content.lines().enumerate() {
        if line.starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(caps) = heading_re().captures(line) {
            headings.push(Heading {
                level: caps[1].len(),
                text: caps[2].trim().to_string(),
                line: i as u32 + 1,
            });
        }
    }
    headings
}

fn nest(headings: &[Heading], total_lines: u32) -> Vec<FileSymbol> {
    let mut roots = Vec::new();
    let mut stack: Vec<(usize, FileSymbol)> = Vec::new();

    for (i, heading) in headings.iter().enumerate() {
        let end = headings[i + 1..]
            .iter()
            .find(|next| next.level <= heading.level)
            .map_or(total_lines, |next| next.line - 1)
            .max(heading.line);
        let symbol = FileSymbol::new(heading.text.clone(), SymbolKind::Heading, heading.line, end)
            .with_signature(format!("{} {}", "#".repeat(heading.level), heading.text));

        while stack.last().is_some_and(|(level, _)| *level >= heading.level) {
            close_top(&mut stack, &mut roots);
        }
        stack.push((heading.level, symbol));
    }
    while !stack.is_empty() {
        close_top(&mut stack, &mut roots);
    }
    roots
}

fn close_top(stack: &mut Vec<(usize, FileSymbol)>, roots: &mut Vec<FileSymbol>) {
    if let Some((_, done)) = stack.pop() {
        match stack.last_mut() {
            Some((_, parent)) => parent.children.push(done),
            None => roots.push(done),
        }
    }
}
