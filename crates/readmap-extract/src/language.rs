use std::path::Path;

/// Language identifier plus display name, detected from a file extension.
///
/// `id` selects extractors in the registry; `name` is what the rendered map
/// shows. Several extensions can share an id but differ in name (`.cljs` is
/// `clojure` / `ClojureScript`).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use readmap_extract::language::detect_language;
///
/// let info = detect_language(Path::new("src/lib.RS")).unwrap();
/// assert_eq!(info.id, "rust");
/// assert_eq!(info.name, "Rust");
/// assert!(detect_language(Path::new("notes.txt")).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LanguageInfo {
    pub id: &'static str,
    pub name: &'static str,
}

const fn lang(id: &'static str, name: &'static str) -> LanguageInfo {
    LanguageInfo { id, name }
}

const EXTENSIONS: &[(&str, LanguageInfo)] = &[
    ("py", lang("python", "Python")),
    ("pyw", lang("python", "Python")),
    ("pyi", lang("python", "Python")),
    ("ts", lang("typescript", "TypeScript")),
    ("tsx", lang("typescript", "TypeScript")),
    ("mts", lang("typescript", "TypeScript")),
    ("cts", lang("typescript", "TypeScript")),
    ("js", lang("javascript", "JavaScript")),
    ("jsx", lang("javascript", "JavaScript")),
    ("mjs", lang("javascript", "JavaScript")),
    ("cjs", lang("javascript", "JavaScript")),
    ("go", lang("go", "Go")),
    ("rs", lang("rust", "Rust")),
    ("c", lang("c", "C")),
    ("h", lang("c-header", "C Header")),
    ("cpp", lang("cpp", "C++")),
    ("cc", lang("cpp", "C++")),
    ("cxx", lang("cpp", "C++")),
    ("hpp", lang("cpp", "C++")),
    ("hxx", lang("cpp", "C++")),
    ("clj", lang("clojure", "Clojure")),
    ("cljs", lang("clojure", "ClojureScript")),
    ("cljc", lang("clojure", "Clojure")),
    ("edn", lang("clojure", "EDN")),
    ("sql", lang("sql", "SQL")),
    ("json", lang("json", "JSON")),
    ("jsonc", lang("json", "JSON")),
    ("jsonl", lang("jsonl", "JSON Lines")),
    ("md", lang("markdown", "Markdown")),
    ("mdx", lang("markdown", "Markdown")),
    ("yml", lang("yaml", "YAML")),
    ("yaml", lang("yaml", "YAML")),
    ("toml", lang("toml", "TOML")),
    ("csv", lang("csv", "CSV")),
    ("tsv", lang("csv", "TSV")),
];

/// Detect the language of `path` from its extension, case-insensitively.
pub fn detect_language(path: &Path) -> Option<LanguageInfo> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    EXTENSIONS
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, info)| *info)
}

/// Every recognised extension, with its leading dot.
///
/// # Examples
///
/// ```
/// use readmap_extract::language::supported_extensions;
///
/// let exts = supported_extensions();
/// assert!(exts.contains(&".py".to_string()));
/// assert!(exts.contains(&".tsv".to_string()));
/// ```
pub fn supported_extensions() -> Vec<String> {
    EXTENSIONS.iter().map(|(ext, _)| format!(".{ext}")).collect()
}

/// Whether `path` has a recognised extension.
pub fn is_supported(path: &Path) -> bool {
    detect_language(path).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_share_ids() {
        let ids: Vec<&str> = ["a.ts", "a.tsx", "a.mts", "a.cts"]
            .iter()
            .map(|p| detect_language(Path::new(p)).unwrap().id)
            .collect();
        assert!(ids.iter().all(|id| *id == "typescript"));
    }

    #[test]
    fn header_files_are_their_own_language() {
        let info = detect_language(Path::new("include/api.h")).unwrap();
        assert_eq!(info, lang("c-header", "C Header"));
    }

    #[test]
    fn display_name_can_differ_within_an_id() {
        assert_eq!(detect_language(Path::new("x.cljs")).unwrap().name, "ClojureScript");
        assert_eq!(detect_language(Path::new("x.edn")).unwrap().name, "EDN");
        assert_eq!(detect_language(Path::new("x.tsv")).unwrap().name, "TSV");
    }

    #[test]
    fn unknown_and_missing_extensions() {
        assert!(!is_supported(Path::new("Makefile")));
        assert!(!is_supported(Path::new("archive.tar.gz")));
        assert!(is_supported(Path::new("README.MD")));
    }

    #[test]
    fn extension_list_is_complete() {
        assert_eq!(supported_extensions().len(), EXTENSIONS.len());
    }
}
