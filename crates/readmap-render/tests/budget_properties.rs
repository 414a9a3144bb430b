//! Properties of the reduce → truncate → fit pipeline on synthetic maps.

use std::path::PathBuf;

use readmap_core::{DetailLevel, FileMap, FileSymbol, SymbolKind};
use readmap_render::{
    format_file_map, format_file_map_with_budget, reduce_to_level, reduce_to_truncated, Renderer,
};

fn flat_map(count: u32) -> FileMap {
    let symbols = (0..count)
        .map(|i| FileSymbol::new(format!("function_{i}"), SymbolKind::Function, i * 4 + 1, i * 4 + 3))
        .collect();
    FileMap::new(
        PathBuf::from("/path/to/test.py"),
        count as usize * 4 + 1,
        u64::from(count) * 100,
        "Python",
    )
    .with_symbols(symbols)
}

fn long_name_map(count: u32, name_len: usize) -> FileMap {
    let pad = "x".repeat(name_len);
    let symbols = (0..count)
        .map(|i| FileSymbol::new(format!("function_{pad}_{i}"), SymbolKind::Function, i * 4 + 1, i * 4 + 3))
        .collect();
    FileMap::new(
        PathBuf::from("/path/to/test.py"),
        count as usize * 4 + 1,
        u64::from(count) * (name_len as u64 + 50),
        "Python",
    )
    .with_symbols(symbols)
}

fn class_map() -> FileMap {
    let classes = (0..40u32)
        .map(|c| {
            let base = c * 100 + 1;
            let methods = (0..5u32)
                .map(|m| {
                    let start = base + 2 + m * 15;
                    FileSymbol::new(format!("method_{m}"), SymbolKind::Method, start, start + 12)
                        .with_signature("(self, request: Request, timeout: float = 3.0) -> Response")
                        .with_modifiers(vec!["async".into()])
                        .with_children(vec![FileSymbol::new(
                            "closure",
                            SymbolKind::Function,
                            start + 2,
                            start + 4,
                        )])
                })
                .collect();
            FileSymbol::new(format!("Service{c}"), SymbolKind::Class, base, base + 90)
                .with_docstring("Handles one kind of request.")
                .with_children(methods)
        })
        .collect();
    FileMap::new(PathBuf::from("/srv/services.py"), 4000, 160_000, "Python")
        .with_symbols(classes)
        .with_imports((0..14).map(|i| format!("pkg.mod{i}")).collect())
}

fn size_at(map: &FileMap, level: DetailLevel) -> usize {
    format_file_map(&reduce_to_level(map, level), level).len()
}

#[test]
fn reduction_sizes_are_monotonic() {
    let map = class_map();
    let full = size_at(&map, DetailLevel::Full);
    let compact = size_at(&map, DetailLevel::Compact);
    let minimal = size_at(&map, DetailLevel::Minimal);
    let outline = size_at(&map, DetailLevel::Outline);
    assert!(full >= compact, "full {full} < compact {compact}");
    assert!(compact >= minimal, "compact {compact} < minimal {minimal}");
    assert!(minimal >= outline, "minimal {minimal} < outline {outline}");
}

#[test]
fn reduction_sizes_are_monotonic_without_signatures() {
    let map = flat_map(30);
    let full = size_at(&map, DetailLevel::Full);
    let compact = size_at(&map, DetailLevel::Compact);
    let minimal = size_at(&map, DetailLevel::Minimal);
    let outline = size_at(&map, DetailLevel::Outline);
    assert!(full >= compact, "full {full} < compact {compact}");
    assert!(compact >= minimal, "compact {compact} < minimal {minimal}");
    assert!(minimal >= outline, "minimal {minimal} < outline {outline}");
}

#[test]
fn truncation_keeps_exactly_twice_each() {
    let map = flat_map(777);
    for each in [10, 50, 200, 388] {
        let truncated = reduce_to_truncated(&map, each);
        assert_eq!(truncated.symbols.len(), each * 2);
        let info = truncated.truncated_info.unwrap();
        assert_eq!(info.omitted_symbols, 777 - each * 2);
        assert_eq!(info.total_symbols, 777);
    }
}

#[test]
fn truncation_is_a_no_op_at_the_boundary() {
    let map = flat_map(100);
    let truncated = reduce_to_truncated(&map, 50);
    assert_eq!(truncated.detail_level, DetailLevel::Outline);
    assert!(truncated.truncated_info.is_none());
    assert_eq!(truncated.symbols.len(), 100);
}

#[test]
fn outline_reduction_is_idempotent() {
    let once = reduce_to_level(&class_map(), DetailLevel::Outline);
    assert_eq!(reduce_to_level(&once, DetailLevel::Outline), once);
}

#[test]
fn five_thousand_symbols_truncate_under_ceiling() {
    let renderer = Renderer::default();
    let fitted = renderer.fit(&flat_map(5000), 100 * 1024);
    assert_eq!(fitted.level, DetailLevel::Truncated);
    assert!(fitted.text.contains("more symbols"));
    assert!(fitted.text.contains("[Map \u{2264}100.0 KB |"));
    assert!(fitted.text.len() <= 100 * 1024);
}

#[test]
fn small_map_keeps_signatures_verbatim() {
    let sigs = [
        "(path: str) -> bytes",
        "(a, b=2)",
        "pub fn close(&mut self)",
        "()",
        "(*args, **kwargs)",
    ];
    let names = ["read", "add", "close", "reset", "wrap"];
    let symbols = names
        .iter()
        .zip(sigs)
        .enumerate()
        .map(|(i, (name, sig))| {
            let start = i as u32 * 10 + 1;
            FileSymbol::new(*name, SymbolKind::Function, start, start + 8).with_signature(sig)
        })
        .collect();
    let map = FileMap::new(PathBuf::from("/a/b.py"), 2100, 60_000, "Python").with_symbols(symbols);

    let fitted = Renderer::default().fit(&map, 100 * 1024);
    assert_eq!(fitted.level, DetailLevel::Full);
    for sig in sigs {
        assert!(fitted.text.contains(sig), "missing {sig}");
    }
}

#[test]
fn medium_map_is_not_truncated() {
    let text = format_file_map_with_budget(&flat_map(200), 100 * 1024);
    assert!(!text.contains("more symbols"));
}

#[test]
fn binary_search_picks_the_largest_fit() {
    let map = long_name_map(2_000, 2_000);
    let max_bytes = 100 * 1024;
    let fitted = Renderer::default().fit(&map, max_bytes);
    let each = fitted.symbols_each.expect("map should be truncated");

    assert!(fitted.text.len() <= max_bytes);
    assert!(each >= 10);
    assert!(each < 50, "default count of 50 cannot fit 2 KB names");

    let one_more = reduce_to_truncated(&map, each + 1);
    let rendered = format_file_map(&one_more, DetailLevel::Truncated);
    assert!(rendered.len() > max_bytes);
}

#[test]
fn budget_holds_whenever_the_floor_fits() {
    let map = flat_map(2500);
    let floor = format_file_map(&reduce_to_truncated(&map, 10), DetailLevel::Truncated).len();
    for max_bytes in [floor, floor + 1, floor * 2, 10 * 1024, 30 * 1024, 60 * 1024] {
        let text = format_file_map_with_budget(&map, max_bytes);
        assert!(
            text.len() <= max_bytes,
            "{} bytes exceeds budget {max_bytes}",
            text.len()
        );
    }
}
