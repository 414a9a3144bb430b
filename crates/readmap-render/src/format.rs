use std::fmt::Write;

use readmap_core::{DetailLevel, FileMap, FileSymbol, SymbolKind, Thresholds};

/// Border drawn above and below the header and around the footer.
pub const RULE: &str = "\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}";

const MAX_LISTED_IMPORTS: usize = 10;

/// Render `map` as a bordered text block at `level`.
///
/// The map is expected to already be reduced to `level`; this only decides
/// how much of what is present gets printed. Tier notices quote the budgets
/// in `thresholds` and are padded to one width across the four tiers, so a
/// coarser tier never renders larger than a finer one.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use readmap_core::{DetailLevel, FileMap, FileSymbol, SymbolKind, Thresholds};
/// use readmap_render::format::render;
///
/// let map = FileMap::new(PathBuf::from("/srv/app.py"), 2400, 81_920, "Python")
///     .with_symbols(vec![FileSymbol::new("main", SymbolKind::Function, 10, 42)]);
/// let text = render(&map, DetailLevel::Full, &Thresholds::default());
///
/// assert!(text.contains("File Map: app.py"));
/// assert!(text.contains("2,400 lines \u{2502} 80.0 KB \u{2502} Python"));
/// assert!(text.contains("main: [10-42]"));
/// ```
pub fn render(map: &FileMap, level: DetailLevel, thresholds: &Thresholds) -> String {
    let mut lines: Vec<String> = vec![
        String::new(),
        RULE.to_string(),
        format!("File Map: {}", map.file_name()),
        format!(
            "{} lines \u{2502} {} \u{2502} {}",
            format_number(map.total_lines as u64),
            format_size(map.total_bytes),
            map.language
        ),
        RULE.to_string(),
        String::new(),
    ];

    lines.push(tier_notice(map, level, thresholds));
    lines.push(String::new());

    if shows_nested(level) && !map.imports.is_empty() {
        lines.push(import_line(&map.imports));
        lines.push(String::new());
    }

    let (first, last) = split_shown(map);
    if let Some(info) = map.truncated_info {
        push_symbols(&mut lines, first, level, 0);
        lines.push(String::new());
        lines.push(format!(
            "  \u{2500} \u{2500} \u{2500} {} more symbols \u{2500} \u{2500} \u{2500}",
            format_number(info.omitted_symbols as u64)
        ));
        lines.push(String::new());
        push_symbols(&mut lines, last, level, 0);
    } else {
        push_symbols(&mut lines, &map.symbols, level, 0);
    }

    lines.push(String::new());
    lines.push(RULE.to_string());
    if map.truncated_info.is_some() {
        if let (Some(last_first), Some(first_last)) = (first.last(), last.first()) {
            lines.push(format!(
                "Omitted symbols are in lines {}-{}.",
                format_number(u64::from(last_first.end_line) + 1),
                format_number(u64::from(first_last.start_line).saturating_sub(1))
            ));
        }
        lines.push("Use read(path, offset=LINE, limit=N) to view specific sections.".to_string());
    } else {
        lines.push("Use read(path, offset=LINE, limit=N) for targeted reads.".to_string());
    }
    lines.push(RULE.to_string());

    lines.join("\n")
}

/// Human-readable byte size with one decimal above 1 KiB.
///
/// # Examples
///
/// ```
/// use readmap_render::format::format_size;
///
/// assert_eq!(format_size(512), "512 B");
/// assert_eq!(format_size(20 * 1024), "20.0 KB");
/// assert_eq!(format_size(3 * 1024 * 1024 / 2), "1.5 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    if bytes < KIB {
        format!("{bytes} B")
    } else if bytes < MIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    }
}

/// Integer with comma thousands separators.
///
/// # Examples
///
/// ```
/// use readmap_render::format::format_number;
///
/// assert_eq!(format_number(999), "999");
/// assert_eq!(format_number(1_234_567), "1,234,567");
/// ```
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn shows_nested(level: DetailLevel) -> bool {
    !matches!(level, DetailLevel::Outline | DetailLevel::Truncated)
}

fn tier_notice(map: &FileMap, level: DetailLevel, thresholds: &Thresholds) -> String {
    if let Some(info) = map.truncated_info {
        return notice(
            thresholds.max_truncated_bytes,
            &format!(
                "{} of {} symbols",
                info.shown_symbols,
                format_number(info.total_symbols as u64)
            ),
        );
    }
    let width = TIERS
        .iter()
        .map(|&tier| tier_notice_unpadded(tier, thresholds).len())
        .max()
        .unwrap_or(0);
    let mut text = tier_notice_unpadded(level, thresholds);
    let pad = width - text.len();
    text.extend(std::iter::repeat(' ').take(pad));
    text
}

const TIERS: [DetailLevel; 4] = [
    DetailLevel::Full,
    DetailLevel::Compact,
    DetailLevel::Minimal,
    DetailLevel::Outline,
];

fn tier_notice_unpadded(level: DetailLevel, thresholds: &Thresholds) -> String {
    match level {
        DetailLevel::Full => notice(thresholds.full_target_bytes, "full"),
        DetailLevel::Compact => notice(thresholds.compact_target_bytes, "compact"),
        DetailLevel::Minimal => notice(thresholds.max_map_bytes, "minimal"),
        DetailLevel::Outline | DetailLevel::Truncated => {
            notice(thresholds.max_outline_bytes, "outline")
        }
    }
}

fn notice(budget: usize, label: &str) -> String {
    format!("[Map \u{2264}{} | {label}]", format_size(budget as u64))
}

fn import_line(imports: &[String]) -> String {
    let mut line = String::from("imports: ");
    let shown = imports.len().min(MAX_LISTED_IMPORTS);
    line.push_str(&imports[..shown].join(", "));
    if imports.len() > MAX_LISTED_IMPORTS {
        let _ = write!(line, ", ...{} more", imports.len() - MAX_LISTED_IMPORTS);
    }
    line
}

/// First and second half of the symbol list, split the way truncation kept them.
fn split_shown(map: &FileMap) -> (&[FileSymbol], &[FileSymbol]) {
    map.symbols.split_at(map.symbols.len() / 2)
}

fn push_symbols(lines: &mut Vec<String>, symbols: &[FileSymbol], level: DetailLevel, indent: usize) {
    for symbol in symbols {
        lines.push(symbol_line(symbol, level, indent));
        if !shows_nested(level) || symbol.children.is_empty() {
            continue;
        }
        if level == DetailLevel::Minimal {
            for child in &symbol.children {
                lines.push(symbol_line(child, level, indent + 1));
            }
        } else {
            push_symbols(lines, &symbol.children, level, indent + 1);
        }
    }
}

fn symbol_line(symbol: &FileSymbol, level: DetailLevel, indent: usize) -> String {
    let prefix = "  ".repeat(indent);
    let range = if symbol.start_line == symbol.end_line {
        format!("[{}]", symbol.start_line)
    } else {
        format!("[{}-{}]", symbol.start_line, symbol.end_line)
    };

    let name = if level == DetailLevel::Full {
        display_name(symbol)
    } else {
        symbol.name.clone()
    };

    let mut line = match symbol.kind {
        kind if kind.is_type_like() => format!("{prefix}{kind} {name}: {range}"),
        SymbolKind::Variable | SymbolKind::Constant => format!("{prefix}{name} = ... {range}"),
        _ => format!("{prefix}{name}: {range}"),
    };

    if level == DetailLevel::Full {
        if let Some(doc) = &symbol.docstring {
            let _ = write!(line, "  // {doc}");
        }
    }
    line
}

/// Name decorated with modifiers and signature for the Full tier.
///
/// Signatures that already contain the name (whole declarations such as
/// `pub fn parse(input: &str)`) replace it; partial ones (`(x, y) -> int`)
/// are appended after the modifiers and name.
fn display_name(symbol: &FileSymbol) -> String {
    let with_modifiers = || {
        if symbol.modifiers.is_empty() {
            symbol.name.clone()
        } else {
            format!("{} {}", symbol.modifiers.join(" "), symbol.name)
        }
    };
    match &symbol.signature {
        Some(sig) if sig.contains(&symbol.name) => sig.clone(),
        Some(sig) => format!("{}{sig}", with_modifiers()),
        None => with_modifiers(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use readmap_core::TruncatedInfo;
    use std::path::PathBuf;

    fn sample_map() -> FileMap {
        let method = FileSymbol::new("process", SymbolKind::Method, 12, 30)
            .with_signature("(self, item: Item) -> bool")
            .with_modifiers(vec!["async".into()]);
        let nested = FileSymbol::new("inner", SymbolKind::Function, 14, 16);
        let class = FileSymbol::new("Processor", SymbolKind::Class, 10, 80)
            .with_children(vec![method.with_children(vec![nested])]);
        let constant = FileSymbol::new("LIMIT", SymbolKind::Constant, 3, 3);
        let rust_fn = FileSymbol::new("parse", SymbolKind::Function, 82, 90)
            .with_signature("pub fn parse(input: &str) -> Ast")
            .with_modifiers(vec!["pub".into()])
            .with_docstring("Parse an input string.");
        FileMap::new(PathBuf::from("/work/proc.py"), 3100, 120_000, "Python")
            .with_symbols(vec![constant, class, rust_fn])
            .with_imports(vec!["os".into(), "typing".into()])
    }

    #[test]
    fn header_and_footer_layout() {
        let text = render(&sample_map(), DetailLevel::Full, &Thresholds::default());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "");
        assert_eq!(lines[1], RULE);
        assert_eq!(lines[2], "File Map: proc.py");
        assert_eq!(lines[3], "3,100 lines \u{2502} 117.2 KB \u{2502} Python");
        assert_eq!(lines[4], RULE);
        assert_eq!(lines[5], "");
        assert_eq!(lines[6].trim_end(), "[Map \u{2264}10.0 KB | full]");
        assert_eq!(lines[7], "");
        assert_eq!(lines[8], "imports: os, typing");
        assert_eq!(*lines.last().unwrap(), RULE);
        assert_eq!(
            lines[lines.len() - 2],
            "Use read(path, offset=LINE, limit=N) for targeted reads."
        );
    }

    #[test]
    fn full_level_uses_signatures_and_templates() {
        let text = render(&sample_map(), DetailLevel::Full, &Thresholds::default());
        assert!(text.contains("\nLIMIT = ... [3]\n"));
        assert!(text.contains("\nclass Processor: [10-80]\n"));
        assert!(text.contains("\n  async process(self, item: Item) -> bool: [12-30]\n"));
        assert!(text.contains("\n    inner: [14-16]\n"));
        assert!(text.contains(
            "\npub fn parse(input: &str) -> Ast: [82-90]  // Parse an input string.\n"
        ));
        assert!(text.contains("[Map \u{2264}10.0 KB | full]"));
    }

    #[test]
    fn compact_shows_notice_and_plain_names() {
        let map = crate::reduce_to_level(&sample_map(), DetailLevel::Compact);
        let text = render(&map, DetailLevel::Compact, &Thresholds::default());
        assert!(text.contains("[Map \u{2264}15.0 KB | compact]"));
        assert!(text.contains("\n  process: [12-30]\n"));
        assert!(text.contains("\n    inner: [14-16]\n"));
        assert!(!text.contains("//"));
    }

    #[test]
    fn minimal_shows_direct_children_only() {
        let map = crate::reduce_to_level(&sample_map(), DetailLevel::Minimal);
        let text = render(&map, DetailLevel::Minimal, &Thresholds::default());
        assert!(text.contains("[Map \u{2264}20.0 KB | minimal]"));
        assert!(text.contains("\n  process: [12-30]\n"));
        assert!(!text.contains("inner"));
    }

    #[test]
    fn outline_hides_imports_and_children() {
        let map = crate::reduce_to_level(&sample_map(), DetailLevel::Outline);
        let text = render(&map, DetailLevel::Outline, &Thresholds::default());
        assert!(text.contains("[Map \u{2264}50.0 KB | outline]"));
        assert!(!text.contains("imports:"));
        assert!(!text.contains("process"));
    }

    #[test]
    fn tier_notices_share_one_width() {
        let thresholds = Thresholds {
            max_outline_bytes: 200 * 1024,
            ..Thresholds::default()
        };
        let widths: Vec<usize> = TIERS
            .iter()
            .map(|&level| tier_notice(&sample_map(), level, &thresholds).len())
            .collect();
        assert!(widths.iter().all(|&w| w == widths[0]), "{widths:?}");
        assert_eq!(
            tier_notice(&sample_map(), DetailLevel::Full, &thresholds),
            "[Map \u{2264}10.0 KB | full]    "
        );
    }

    #[test]
    fn import_list_is_capped() {
        let imports: Vec<String> = (0..13).map(|i| format!("m{i}")).collect();
        let line = import_line(&imports);
        assert_eq!(
            line,
            "imports: m0, m1, m2, m3, m4, m5, m6, m7, m8, m9, ...3 more"
        );
    }

    #[test]
    fn truncated_layout_reports_gap() {
        let symbols = vec![
            FileSymbol::new("a", SymbolKind::Function, 1, 3),
            FileSymbol::new("b", SymbolKind::Function, 5, 7),
            FileSymbol::new("y", SymbolKind::Function, 4001, 4003),
            FileSymbol::new("z", SymbolKind::Function, 4005, 4007),
        ];
        let mut map = FileMap::new(PathBuf::from("/x.py"), 4010, 200_000, "Python")
            .with_symbols(symbols);
        map.detail_level = DetailLevel::Truncated;
        map.truncated_info = Some(TruncatedInfo::new(1500, 2));

        let text = render(&map, DetailLevel::Truncated, &Thresholds::default());
        assert!(text.contains("[Map \u{2264}100.0 KB | 4 of 1,500 symbols]"));
        assert!(text.contains(
            "b: [5-7]\n\n  \u{2500} \u{2500} \u{2500} 1,496 more symbols \u{2500} \u{2500} \u{2500}\n\ny: [4001-4003]"
        ));
        assert!(text.contains("Omitted symbols are in lines 8-4,000."));
        assert!(text.contains("Use read(path, offset=LINE, limit=N) to view specific sections."));
    }

    #[test]
    fn numbers_and_sizes() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(100_000), "100,000");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(100 * 1024), "100.0 KB");
    }

    #[test]
    fn signature_without_name_keeps_modifiers() {
        let sym = FileSymbol::new("get", SymbolKind::Function, 1, 2)
            .with_signature("(key)")
            .with_modifiers(vec!["static".into(), "async".into()]);
        assert_eq!(display_name(&sym), "static async get(key)");

        let bare = FileSymbol::new("VERSION", SymbolKind::Constant, 1, 1)
            .with_modifiers(vec!["export".into()]);
        assert_eq!(display_name(&bare), "export VERSION");
    }
}
