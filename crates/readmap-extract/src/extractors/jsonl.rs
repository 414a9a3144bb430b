//! JSON Lines: schema of the first record plus a few sample lines.

use readmap_core::{FileSymbol, MapError, SymbolKind};
use serde_json::Value;

use crate::source::{ContentParser, Extracted, SourceFile};

const SCAN_LINES: usize = 100;
const SHOWN_SAMPLES: usize = 5;
const SCHEMA_KEYS: usize = 5;
const PREVIEW_CHARS: usize = 80;

/// Samples the first hundred lines for records that parse as JSON.
///
/// The first valid record defines the schema symbol; up to five records are
/// listed as `Line N: <preview>`, followed by a marker covering the rest of
/// the file. Files with no parseable record in the sampled range yield no
/// map.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLinesParser;

impl ContentParser for JsonLinesParser {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    fn parse(&self, source: &SourceFile) -> Result<Option<Extracted>, MapError> {
        let total = source.total_lines() as u32;
        let samples: Vec<(u32, &str, Value)> = source
            .content
            .lines()
            .enumerate()
            .take(SCAN_LINES)
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(i, line)| {
                serde_json::from_str::<Value>(line)
                    .ok()
                    .map(|value| (i as u32 + 1, line, value))
            })
            .take(SHOWN_SAMPLES)
            .collect();
        let Some((_, _, first)) = samples.first() else {
            return Ok(None);
        };

        let mut symbols = vec![FileSymbol::new(
            format!("Schema: {}", schema_label(first)),
            SymbolKind::Class,
            1,
            1,
        )];
        for (line_no, line, _) in &samples {
            symbols.push(FileSymbol::new(
                format!("Line {line_no}: {}", preview(line)),
                SymbolKind::Variable,
                *line_no,
                *line_no,
            ));
        }
        let last_shown = samples.last().map_or(0, |(line_no, _, _)| *line_no);
        if total > last_shown {
            symbols.push(FileSymbol::new(
                format!("... {} more lines", total - last_shown),
                SymbolKind::Variable,
                last_shown + 1,
                total,
            ));
        }
        Ok(Some(Extracted::new(symbols)))
    }
}

fn schema_label(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let keys: Vec<&str> = map.keys().take(SCHEMA_KEYS).map(String::as_str).collect();
            let more = if map.len() > SCHEMA_KEYS { "..." } else { "" };
            if keys.is_empty() {
                "object".to_string()
            } else {
                format!("object {{{}{more}}}", keys.join(", "))
            }
        }
        Value::Array(items) => format!("array[{}]", items.len()),
        Value::String(_) => "string".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Null => "null".to_string(),
    }
}

fn preview(line: &str) -> String {
    if line.chars().count() > PREVIEW_CHARS {
        let head: String = line.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        line.to_string()
    }
}
