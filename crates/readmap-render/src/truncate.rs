use readmap_core::{DetailLevel, FileMap, FileSymbol, TruncatedInfo};

use crate::reduce::reduce_to_level;

/// Keep only the first and last `symbols_each` top-level symbols, in
/// outline shape, and record how many were dropped from the middle.
///
/// When the map has at most `2 * symbols_each` symbols nothing would be
/// dropped, so the plain Outline reduction is returned instead.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use readmap_core::{DetailLevel, FileMap, FileSymbol, SymbolKind};
/// use readmap_render::reduce_to_truncated;
///
/// let symbols = (0..30)
///     .map(|i| FileSymbol::new(format!("f{i}"), SymbolKind::Function, i * 2 + 1, i * 2 + 2))
///     .collect();
/// let map = FileMap::new(PathBuf::from("/big.go"), 9000, 300_000, "Go").with_symbols(symbols);
///
/// let truncated = reduce_to_truncated(&map, 10);
/// assert_eq!(truncated.detail_level, DetailLevel::Truncated);
/// assert_eq!(truncated.symbols.len(), 20);
/// assert_eq!(truncated.truncated_info.unwrap().omitted_symbols, 10);
/// ```
pub fn reduce_to_truncated(map: &FileMap, symbols_each: usize) -> FileMap {
    let total = map.symbols.len();
    if total <= symbols_each.saturating_mul(2) {
        return reduce_to_level(map, DetailLevel::Outline);
    }

    let head = map.symbols[..symbols_each].iter();
    let tail = map.symbols[total - symbols_each..].iter();

    FileMap {
        path: map.path.clone(),
        total_lines: map.total_lines,
        total_bytes: map.total_bytes,
        language: map.language.clone(),
        symbols: head.chain(tail).map(FileSymbol::outline).collect(),
        imports: Vec::new(),
        detail_level: DetailLevel::Truncated,
        truncated_info: Some(TruncatedInfo::new(total, symbols_each)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use readmap_core::SymbolKind;
    use std::path::PathBuf;

    fn flat_map(count: u32) -> FileMap {
        let symbols = (0..count)
            .map(|i| {
                FileSymbol::new(format!("function_{i}"), SymbolKind::Function, i * 4 + 1, i * 4 + 3)
                    .with_signature("(x)")
            })
            .collect();
        FileMap::new(PathBuf::from("/path/to/test.py"), count as usize * 4 + 1, 0, "Python")
            .with_symbols(symbols)
            .with_imports(vec!["json".into()])
    }

    #[test]
    fn keeps_boundaries_and_counts_the_gap() {
        let truncated = reduce_to_truncated(&flat_map(1000), 50);
        assert_eq!(truncated.symbols.len(), 100);
        assert_eq!(truncated.symbols[0].name, "function_0");
        assert_eq!(truncated.symbols[49].name, "function_49");
        assert_eq!(truncated.symbols[50].name, "function_950");
        assert_eq!(truncated.symbols[99].name, "function_999");

        let info = truncated.truncated_info.unwrap();
        assert_eq!(info.total_symbols, 1000);
        assert_eq!(info.shown_symbols, 100);
        assert_eq!(info.omitted_symbols, 900);
        assert!(truncated.imports.is_empty());
    }

    #[test]
    fn kept_symbols_are_outline_shaped() {
        let truncated = reduce_to_truncated(&flat_map(100), 10);
        assert!(truncated.symbols.iter().all(|s| s.signature.is_none()));
    }

    #[test]
    fn exactly_twice_each_returns_outline() {
        let map = flat_map(20);
        let result = reduce_to_truncated(&map, 10);
        assert_eq!(result.detail_level, DetailLevel::Outline);
        assert!(result.truncated_info.is_none());
        assert_eq!(result, reduce_to_level(&map, DetailLevel::Outline));
    }

    #[test]
    fn one_over_the_boundary_truncates() {
        let result = reduce_to_truncated(&flat_map(21), 10);
        assert_eq!(result.detail_level, DetailLevel::Truncated);
        assert_eq!(result.truncated_info.unwrap().omitted_symbols, 1);
    }
}
