//! CSV / TSV summaries: shape, header columns and one sample row.

use readmap_core::{FileSymbol, MapError, SymbolKind};

use crate::source::{ContentParser, Extracted, SourceFile};

const SAMPLE_VALUES: usize = 5;
const SAMPLE_VALUE_CHARS: usize = 20;

/// Summarises delimited text without reading it as a table of symbols.
///
/// The delimiter is a tab when the header line holds more tabs than commas.
/// Blank lines are ignored when counting rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvParser;

impl ContentParser for CsvParser {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn parse(&self, source: &SourceFile) -> Result<Option<Extracted>, MapError> {
        let rows: Vec<&str> = source
            .content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .collect();
        let Some((header_line, data)) = rows.split_first() else {
            return Ok(None);
        };
        let delimiter = detect_delimiter(header_line);
        let headers = split_record(header_line, delimiter);
        let sample = data.first().map(|line| split_record(line, delimiter));
        let data_rows = data.len();
        let total = source.total_lines() as u32;
        let columns = headers.len();

        let mut symbols = Vec::with_capacity(columns + 2);
        symbols.push(FileSymbol::new(
            format!("{data_rows} rows \u{00d7} {columns} columns"),
            SymbolKind::Table,
            1,
            total.max(1),
        ));
        symbols.extend(headers.iter().enumerate().map(|(i, header)| {
            let name = if header.is_empty() {
                format!("Column {}", i + 1)
            } else {
                header.clone()
            };
            FileSymbol::new(name, SymbolKind::Property, 1, 1)
                .with_signature(format!("Column {} of {columns}", i + 1))
        }));
        if let Some(values) = sample {
            let joiner = if delimiter == '\t' { " | " } else { ", " };
            let preview = values
                .iter()
                .take(SAMPLE_VALUES)
                .map(|v| shorten(v))
                .collect::<Vec<_>>()
                .join(joiner);
            symbols.push(FileSymbol::new(
                format!("Sample: {preview}"),
                SymbolKind::Variable,
                2,
                2,
            ));
        }

        let mut extracted = Extracted::new(symbols);
        if delimiter == '\t' || source.extension().as_deref() == Some("tsv") {
            extracted = extracted.with_language("TSV");
        }
        Ok(Some(extracted))
    }
}

fn detect_delimiter(line: &str) -> char {
    let tabs = line.matches('\t').count();
    let commas = line.matches(',').count();
    if tabs > commas {
        '\t'
    } else {
        ','
    }
}

/// Split one record, honouring double quotes and `""` escapes.
fn split_record(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == delimiter && !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            c => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

fn shorten(value: &str) -> String {
    if value.chars().count() > SAMPLE_VALUE_CHARS {
        let head: String = value.chars().take(SAMPLE_VALUE_CHARS - 3).collect();
        format!("{head}...")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(path: &str, content: &str) -> Extracted {
        CsvParser
            .parse(&SourceFile::from_text(path, content))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn summary_columns_and_sample() {
        let content = "id,name,,note\n1,\"Smith, Jane\",x,a very long note that keeps going\n\n2,Bob,y,short\n";
        let extracted = parse("/data/people.csv", content);
        let names: Vec<&str> = extracted.symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "2 rows \u{00d7} 4 columns",
                "id",
                "name",
                "Column 3",
                "note",
                "Sample: 1, Smith, Jane, x, a very long note ...",
            ]
        );
        assert_eq!(extracted.symbols[0].end_line, 4);
        assert_eq!(extracted.symbols[2].signature.as_deref(), Some("Column 2 of 4"));
        assert!(extracted.language.is_none());
    }

    #[test]
    fn tabs_switch_to_tsv() {
        let extracted = parse("/data/export.txt", "a\tb\tc\n1\t2\t3\n");
        assert_eq!(extracted.language.as_deref(), Some("TSV"));
        assert_eq!(extracted.symbols.last().unwrap().name, "Sample: 1 | 2 | 3");
    }

    #[test]
    fn header_only_file_has_zero_rows() {
        let extracted = parse("/data/empty.csv", "a,b\n");
        assert_eq!(extracted.symbols[0].name, "0 rows \u{00d7} 2 columns");
        assert_eq!(extracted.symbols.len(), 3);
    }

    #[test]
    fn escaped_quotes_survive() {
        assert_eq!(
            split_record(r#""say ""hi""",2"#, ','),
            vec!["say \"hi\"".to_string(), "2".to_string()]
        );
    }

    #[test]
    fn blank_file_is_no_map() {
        let source = SourceFile::from_text("/data/blank.csv", "\n\n");
        assert!(CsvParser.parse(&source).unwrap().is_none());
    }
}
