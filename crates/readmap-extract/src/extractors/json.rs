//! JSON schema outlines: keys with value types, nested to a fixed depth.

use readmap_core::{FileSymbol, MapError, SymbolKind};
use serde_json::{Map, Value};

use crate::source::{ContentParser, Extracted, SourceFile};

const MAX_DEPTH: usize = 4;

/// Short type label for a JSON value.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use readmap_extract::extractors::json::type_name;
///
/// assert_eq!(type_name(&json!("x")), "string");
/// assert_eq!(type_name(&json!({"a": 1})), "{...}");
/// assert_eq!(type_name(&json!([])), "[]");
/// assert_eq!(type_name(&json!([{"a": 1}, {"a": 2}])), "[](2) {...}");
/// assert_eq!(type_name(&json!([1, 2, 3])), "[](3) number");
/// ```
pub fn type_name(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(_) => "boolean".into(),
        Value::Number(_) => "number".into(),
        Value::String(_) => "string".into(),
        Value::Object(_) => "{...}".into(),
        Value::Array(items) => match items.first() {
            None => "[]".into(),
            Some(Value::Object(_)) => format!("[]({}) {{...}}", items.len()),
            Some(Value::Array(_)) => format!("[]({}) [...]", items.len()),
            Some(first) => format!("[]({}) {}", items.len(), type_name(first)),
        },
    }
}

/// Parses the document with `serde_json` and outlines its keys.
///
/// Objects become properties with their keys as children; arrays of
/// objects are summarised by their first element, whose keys are prefixed
/// with `[].`. Everything else is a `key: type` leaf. Line numbers come
/// from scanning the text for each key in document order.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl ContentParser for JsonParser {
    fn name(&self) -> &'static str {
        "json"
    }

    fn parse(&self, source: &SourceFile) -> Result<Option<Extracted>, MapError> {
        let value: Value = serde_json::from_str(&source.content)?;
        let total = (source.total_lines() as u32).max(1);
        let mut locator = KeyLocator::new(&source.content);

        let mut symbols = match &value {
            Value::Object(map) => outline_object(map, "", 1, &mut locator),
            Value::Array(items) => outline_array_items(items, "[].", 1, &mut locator)
                .unwrap_or_else(|| {
                    vec![FileSymbol::new(
                        format!("[]: {}", type_name(&value)),
                        SymbolKind::Variable,
                        1,
                        1,
                    )]
                }),
            scalar => vec![FileSymbol::new(
                format!("root: {}", type_name(scalar)),
                SymbolKind::Variable,
                1,
                1,
            )],
        };
        if symbols.is_empty() {
            return Ok(None);
        }
        assign_ends(&mut symbols, total);
        Ok(Some(Extracted::new(symbols)))
    }
}

fn outline_object(
    map: &Map<String, Value>,
    prefix: &str,
    depth: usize,
    locator: &mut KeyLocator,
) -> Vec<FileSymbol> {
    map.iter()
        .map(|(key, value)| outline_entry(key, value, prefix, depth, locator))
        .collect()
}

fn outline_entry(
    key: &str,
    value: &Value,
    prefix: &str,
    depth: usize,
    locator: &mut KeyLocator,
) -> FileSymbol {
    let line = locator.find(key);
    let name = format!("{prefix}{key}");
    if depth < MAX_DEPTH {
        match value {
            Value::Object(map) if !map.is_empty() => {
                let children = outline_object(map, "", depth + 1, locator);
                return FileSymbol::new(name, SymbolKind::Property, line, line)
                    .with_children(children);
            }
            Value::Array(items) => {
                if let Some(children) = outline_array_items(items, "[].", depth + 1, locator) {
                    let name = format!("{name} ({} items)", items.len());
                    return FileSymbol::new(name, SymbolKind::Property, line, line)
                        .with_children(children);
                }
            }
            _ => {}
        }
    }
    FileSymbol::new(
        format!("{name}: {}", type_name(value)),
        SymbolKind::Variable,
        line,
        line,
    )
}

/// Children for an array whose first element is a non-empty object.
fn outline_array_items(
    items: &[Value],
    prefix: &str,
    depth: usize,
    locator: &mut KeyLocator,
) -> Option<Vec<FileSymbol>> {
    match items.first() {
        Some(Value::Object(first)) if !first.is_empty() => {
            Some(outline_object(first, prefix, depth, locator))
        }
        _ => None,
    }
}

/// Containers run until the next sibling or their parent's end.
fn assign_ends(symbols: &mut [FileSymbol], parent_end: u32) {
    let starts: Vec<u32> = symbols.iter().map(|s| s.start_line).collect();
    for (i, symbol) in symbols.iter_mut().enumerate() {
        if symbol.kind != SymbolKind::Property {
            continue;
        }
        let end = starts
            .get(i + 1)
            .map_or(parent_end, |next| next.saturating_sub(1))
            .max(symbol.start_line);
        symbol.end_line = end;
        assign_ends(&mut symbol.children, end);
    }
}

/// Finds `"key":` occurrences moving forward through the text.
struct KeyLocator<'a> {
    content: &'a str,
    line_starts: Vec<usize>,
    cursor: usize,
}

impl<'a> KeyLocator<'a> {
    fn new(content: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(content.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            content,
            line_starts,
            cursor: 0,
        }
    }

    /// Line of the next occurrence of `key` after the previous match, or the
    /// current line when the key cannot be found verbatim.
    fn find(&mut self, key: &str) -> u32 {
        let quoted = serde_json::to_string(key).unwrap_or_else(|_| format!("\"{key}\""));
        let content = self.content;
        let rest = &content[self.cursor..];
        let mut from = 0;
        while let Some(pos) = rest[from..].find(&quoted) {
            let start = self.cursor + from + pos;
            let after = from + pos + quoted.len();
            let tail = &rest[after..];
            let value = tail.trim_start();
            if value.starts_with(':') {
                self.cursor += after + (tail.len() - value.len()) + 1;
                return self.line_of(start);
            }
            from = from + pos + 1;
        }
        self.line_of(self.cursor)
    }

    fn line_of(&self, offset: usize) -> u32 {
        let idx = self.line_starts.partition_point(|start| *start <= offset);
        idx.max(1) as u32
    }
}
