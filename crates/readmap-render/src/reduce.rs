use readmap_core::{DetailLevel, FileMap, FileSymbol};

/// Reduce a map to `level`, returning a new map.
///
/// - `Full` keeps everything.
/// - `Compact` and `Minimal` strip signatures and docstrings from every
///   symbol, recursively. Minimal only differs at render time, where it
///   shows direct children without further nesting.
/// - `Outline` keeps name, kind and line range of top-level symbols and
///   drops imports. `Truncated` needs a symbol count, so here it produces
///   the Outline shape; use [`reduce_to_truncated`](crate::reduce_to_truncated)
///   for real truncation.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use readmap_core::{DetailLevel, FileMap, FileSymbol, SymbolKind};
/// use readmap_render::reduce_to_level;
///
/// let map = FileMap::new(PathBuf::from("/a.py"), 3000, 90_000, "Python").with_symbols(vec![
///     FileSymbol::new("Parser", SymbolKind::Class, 1, 40)
///         .with_children(vec![FileSymbol::new("feed", SymbolKind::Method, 2, 9)
///             .with_signature("(self, data)")]),
/// ]);
///
/// let compact = reduce_to_level(&map, DetailLevel::Compact);
/// assert_eq!(compact.detail_level, DetailLevel::Compact);
/// assert!(compact.symbols[0].children[0].signature.is_none());
///
/// let outline = reduce_to_level(&map, DetailLevel::Outline);
/// assert!(outline.symbols[0].children.is_empty());
/// ```
pub fn reduce_to_level(map: &FileMap, level: DetailLevel) -> FileMap {
    match level {
        DetailLevel::Full => FileMap {
            detail_level: DetailLevel::Full,
            ..map.clone()
        },
        DetailLevel::Compact | DetailLevel::Minimal => FileMap {
            path: map.path.clone(),
            total_lines: map.total_lines,
            total_bytes: map.total_bytes,
            language: map.language.clone(),
            symbols: map.symbols.iter().map(strip_details).collect(),
            imports: map.imports.clone(),
            detail_level: level,
            truncated_info: map.truncated_info,
        },
        DetailLevel::Outline | DetailLevel::Truncated => FileMap {
            path: map.path.clone(),
            total_lines: map.total_lines,
            total_bytes: map.total_bytes,
            language: map.language.clone(),
            symbols: map.symbols.iter().map(FileSymbol::outline).collect(),
            imports: Vec::new(),
            detail_level: DetailLevel::Outline,
            truncated_info: map.truncated_info,
        },
    }
}

fn strip_details(symbol: &FileSymbol) -> FileSymbol {
    FileSymbol {
        name: symbol.name.clone(),
        kind: symbol.kind,
        start_line: symbol.start_line,
        end_line: symbol.end_line,
        signature: None,
        modifiers: symbol.modifiers.clone(),
        children: symbol.children.iter().map(strip_details).collect(),
        docstring: None,
        is_exported: symbol.is_exported,
    }
}
