use readmap_core::{DetailLevel, FileMap, Thresholds};
use tracing::debug;

use crate::format::render;
use crate::reduce::reduce_to_level;
use crate::truncate::reduce_to_truncated;

/// A rendering chosen by [`Renderer::fit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fitted {
    /// The rendered map.
    pub text: String,
    /// Tier that produced `text`.
    pub level: DetailLevel,
    /// Symbols kept on each side when the map had to be truncated.
    pub symbols_each: Option<usize>,
}

impl Fitted {
    /// UTF-8 byte length of the rendered text.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Renders maps against the byte budgets in a [`Thresholds`].
///
/// Stateless apart from its thresholds; the same input always produces the
/// same output.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use readmap_core::{DetailLevel, FileMap, FileSymbol, SymbolKind, Thresholds};
/// use readmap_render::Renderer;
///
/// let map = FileMap::new(PathBuf::from("/lib.rs"), 2500, 70_000, "Rust").with_symbols(vec![
///     FileSymbol::new("run", SymbolKind::Function, 1, 40).with_signature("pub fn run() -> Result<()>"),
/// ]);
///
/// let fitted = Renderer::new(Thresholds::default()).fit(&map, 100 * 1024);
/// assert_eq!(fitted.level, DetailLevel::Full);
/// assert!(fitted.text.contains("pub fn run() -> Result<()>: [1-40]"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    thresholds: Thresholds,
}

impl Renderer {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Render `map` at `level` without any budget check.
    pub fn format(&self, map: &FileMap, level: DetailLevel) -> String {
        render(map, level, &self.thresholds)
    }

    /// Render `map` as richly as possible within `max_bytes`.
    ///
    /// Tiers are tried from Full to Outline against their own budget and
    /// `max_bytes`; the first fit wins. Then the whole Outline is tried
    /// against `max_bytes` alone. Past that, a binary search finds the
    /// largest per-side symbol count whose truncated rendering fits. If even
    /// the floor of `min_symbols_each` overflows, that floor is returned
    /// anyway, so the result may exceed `max_bytes` in that one case.
    pub fn fit(&self, map: &FileMap, max_bytes: usize) -> Fitted {
        let t = &self.thresholds;
        let tiers = [
            (DetailLevel::Full, t.full_target_bytes),
            (DetailLevel::Compact, t.compact_target_bytes),
            (DetailLevel::Minimal, t.max_map_bytes),
            (DetailLevel::Outline, t.max_outline_bytes),
        ];

        for (level, budget) in tiers {
            let text = self.format(&reduce_to_level(map, level), level);
            let size = text.len();
            debug!(%level, size, budget, max_bytes, "tier rendered");
            if size <= budget && size <= max_bytes {
                return Fitted {
                    text,
                    level,
                    symbols_each: None,
                };
            }
        }

        let outline = self.format(&reduce_to_level(map, DetailLevel::Outline), DetailLevel::Outline);
        if outline.len() <= max_bytes {
            debug!(size = outline.len(), max_bytes, "outline fits overall budget");
            return Fitted {
                text: outline,
                level: DetailLevel::Outline,
                symbols_each: None,
            };
        }

        let floor = t.min_symbols_each;
        if let Some(fitted) = self.search_truncation(map, floor, max_bytes) {
            return fitted;
        }

        debug!(floor, max_bytes, "no truncation fits, using floor");
        self.truncated(map, floor)
    }

    /// Keep `thresholds.truncated_symbols_each` symbols from each end of `map`.
    ///
    /// Unlike [`fit`](Self::fit) this ignores any byte budget; a map with no
    /// more than twice that many symbols comes back as a plain Outline.
    pub fn truncate(&self, map: &FileMap) -> Fitted {
        self.truncated(map, self.thresholds.truncated_symbols_each)
    }

    /// Shorthand for `self.fit(map, max_bytes).text`.
    pub fn format_with_budget(&self, map: &FileMap, max_bytes: usize) -> String {
        self.fit(map, max_bytes).text
    }

    /// Largest `symbols_each` in `[floor, total / 2]` that fits `max_bytes`.
    fn search_truncation(&self, map: &FileMap, floor: usize, max_bytes: usize) -> Option<Fitted> {
        let mut low = floor;
        let mut high = map.symbols.len() / 2;
        let mut best = None;

        while low <= high {
            let mid = low + (high - low) / 2;
            let candidate = self.truncated(map, mid);
            let fits = candidate.len() <= max_bytes;
            debug!(symbols_each = mid, size = candidate.len(), fits, "truncation probe");
            if fits {
                best = Some(candidate);
                low = mid + 1;
            } else {
                match mid.checked_sub(1) {
                    Some(lower) => high = lower,
                    None => break,
                }
            }
        }

        best
    }

    fn truncated(&self, map: &FileMap, symbols_each: usize) -> Fitted {
        let reduced = reduce_to_truncated(map, symbols_each);
        let symbols_each = reduced.truncated_info.map(|_| symbols_each);
        Fitted {
            text: self.format(&reduced, DetailLevel::Truncated),
            level: reduced.detail_level,
            symbols_each,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use readmap_core::{FileSymbol, SymbolKind};
    use std::path::PathBuf;

    fn flat_map(count: u32) -> FileMap {
        let symbols = (0..count)
            .map(|i| FileSymbol::new(format!("function_{i}"), SymbolKind::Function, i * 4 + 1, i * 4 + 3))
            .collect();
        FileMap::new(PathBuf::from("/path/to/test.py"), count as usize * 4 + 1, u64::from(count) * 100, "Python")
            .with_symbols(symbols)
    }

    fn signed_map(count: u32, sig_len: usize) -> FileMap {
        let symbols = (0..count)
            .map(|i| {
                FileSymbol::new(format!("handler_{i}"), SymbolKind::Function, i * 10 + 1, i * 10 + 9)
                    .with_signature(format!("({})", "a".repeat(sig_len)))
            })
            .collect();
        FileMap::new(PathBuf::from("/srv/handlers.py"), count as usize * 10, 500_000, "Python")
            .with_symbols(symbols)
    }

    #[test]
    fn small_map_stays_full() {
        let fitted = Renderer::default().fit(&signed_map(5, 8), 100 * 1024);
        assert_eq!(fitted.level, DetailLevel::Full);
        assert!(fitted.text.contains("handler_3(aaaaaaaa): [31-39]"));
        assert_eq!(fitted.symbols_each, None);
    }

    #[test]
    fn large_signatures_fall_to_compact() {
        // ~200 symbols with 60-byte signatures overflow 10 KB but not 15 KB once stripped
        let fitted = Renderer::default().fit(&signed_map(200, 60), 100 * 1024);
        assert_eq!(fitted.level, DetailLevel::Compact);
        assert!(fitted.text.contains("| compact]"));
    }

    #[test]
    fn tight_max_bytes_overrides_tier_budget() {
        let map = signed_map(5, 8);
        let full = Renderer::default().format(&map, DetailLevel::Full);
        let fitted = Renderer::default().fit(&map, full.len() - 1);
        assert_ne!(fitted.level, DetailLevel::Full);
        assert!(fitted.len() < full.len());
    }

    #[test]
    fn huge_map_is_truncated_within_budget() {
        let fitted = Renderer::default().fit(&flat_map(5000), 100 * 1024);
        assert_eq!(fitted.level, DetailLevel::Truncated);
        assert!(fitted.len() <= 100 * 1024);
        assert!(fitted.text.contains("more symbols"));
        assert!(fitted.symbols_each.unwrap() >= 10);
    }

    #[test]
    fn impossible_budget_returns_floor() {
        let fitted = Renderer::default().fit(&flat_map(500), 200);
        assert_eq!(fitted.level, DetailLevel::Truncated);
        assert_eq!(fitted.symbols_each, Some(10));
        assert!(fitted.len() > 200);
    }

    #[test]
    fn floor_follows_thresholds() {
        let thresholds = Thresholds {
            min_symbols_each: 3,
            ..Thresholds::default()
        };
        let fitted = Renderer::new(thresholds).fit(&flat_map(500), 200);
        assert_eq!(fitted.symbols_each, Some(3));
    }

    #[test]
    fn truncate_uses_the_configured_count() {
        let thresholds = Thresholds {
            truncated_symbols_each: 12,
            ..Thresholds::default()
        };
        let fitted = Renderer::new(thresholds).truncate(&flat_map(5000));
        assert_eq!(fitted.level, DetailLevel::Truncated);
        assert_eq!(fitted.symbols_each, Some(12));
        assert!(fitted.text.contains("[Map \u{2264}100.0 KB | 24 of 5,000 symbols]"));
        assert!(fitted.text.contains("4,976 more symbols"));

        let default = Renderer::default().truncate(&flat_map(5000));
        assert_eq!(default.symbols_each, Some(50));
    }

    #[test]
    fn truncate_leaves_small_maps_whole() {
        let fitted = Renderer::default().truncate(&flat_map(80));
        assert_eq!(fitted.level, DetailLevel::Outline);
        assert_eq!(fitted.symbols_each, None);
        assert!(!fitted.text.contains("more symbols"));
    }

    #[test]
    fn fit_is_deterministic() {
        let renderer = Renderer::default();
        let map = flat_map(3000);
        assert_eq!(renderer.fit(&map, 40 * 1024), renderer.fit(&map, 40 * 1024));
    }
}
