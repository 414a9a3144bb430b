//! Detail reduction, truncation and budget-fitted text rendering of file maps.
//!
//! A [`FileMap`] is degraded through [`DetailLevel`] tiers (Full, Compact,
//! Minimal, Outline) until its rendering fits a byte budget; when even the
//! outline overflows, only the first and last top-level symbols are kept,
//! with the count found by binary search.

pub mod budget;
pub mod format;
pub mod reduce;
pub mod truncate;

use readmap_core::{DetailLevel, FileMap, Thresholds};

pub use budget::{Fitted, Renderer};
pub use reduce::reduce_to_level;
pub use truncate::reduce_to_truncated;

/// Render `map` at `level` using the default thresholds.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use readmap_core::{DetailLevel, FileMap, FileSymbol, SymbolKind};
/// use readmap_render::format_file_map;
///
/// let map = FileMap::new(PathBuf::from("/db/schema.sql"), 4000, 150_000, "SQL")
///     .with_symbols(vec![FileSymbol::new("TABLE users", SymbolKind::Table, 1, 12)]);
///
/// let text = format_file_map(&map, DetailLevel::Full);
/// assert!(text.contains("TABLE users: [1-12]"));
/// ```
pub fn format_file_map(map: &FileMap, level: DetailLevel) -> String {
    format::render(map, level, &Thresholds::default())
}

/// Render `map` within `max_bytes` using the default thresholds.
///
/// See [`Renderer::fit`] for the tier and truncation rules.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use readmap_core::{FileMap, FileSymbol, SymbolKind};
/// use readmap_render::format_file_map_with_budget;
///
/// let symbols = (0..5000u32)
///     .map(|i| FileSymbol::new(format!("function_{i}"), SymbolKind::Function, i * 4 + 1, i * 4 + 3))
///     .collect();
/// let map = FileMap::new(PathBuf::from("/gen/huge.py"), 20_001, 500_000, "Python").with_symbols(symbols);
///
/// let text = format_file_map_with_budget(&map, 100 * 1024);
/// assert!(text.len() <= 100 * 1024);
/// assert!(text.contains("more symbols"));
/// ```
pub fn format_file_map_with_budget(map: &FileMap, max_bytes: usize) -> String {
    Renderer::default().format_with_budget(map, max_bytes)
}
