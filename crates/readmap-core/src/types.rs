use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Classification of extracted symbols.
///
/// The lowercase name doubles as the label used by the text formatter for
/// type-like kinds (`class Foo: [1-10]`).
///
/// # Examples
///
/// ```
/// use readmap_core::SymbolKind;
///
/// assert_eq!(SymbolKind::Class.as_str(), "class");
/// assert_eq!(SymbolKind::Procedure.to_string(), "procedure");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Class,
    Function,
    Method,
    Variable,
    Constant,
    Interface,
    Type,
    Enum,
    Struct,
    Import,
    Module,
    Namespace,
    Property,
    Heading,
    Table,
    View,
    Procedure,
    Trigger,
    Index,
    Schema,
    Unknown,
}

impl SymbolKind {
    /// Lowercase label for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Class => "class",
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Variable => "variable",
            SymbolKind::Constant => "constant",
            SymbolKind::Interface => "interface",
            SymbolKind::Type => "type",
            SymbolKind::Enum => "enum",
            SymbolKind::Struct => "struct",
            SymbolKind::Import => "import",
            SymbolKind::Module => "module",
            SymbolKind::Namespace => "namespace",
            SymbolKind::Property => "property",
            SymbolKind::Heading => "heading",
            SymbolKind::Table => "table",
            SymbolKind::View => "view",
            SymbolKind::Procedure => "procedure",
            SymbolKind::Trigger => "trigger",
            SymbolKind::Index => "index",
            SymbolKind::Schema => "schema",
            SymbolKind::Unknown => "unknown",
        }
    }

    /// Whether a symbol of this kind is a type-like container.
    pub fn is_type_like(self) -> bool {
        matches!(
            self,
            SymbolKind::Class
                | SymbolKind::Interface
                | SymbolKind::Struct
                | SymbolKind::Enum
                | SymbolKind::Type
        )
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much information a [`FileMap`] retains, from most to least.
///
/// # Examples
///
/// ```
/// use readmap_core::DetailLevel;
///
/// assert!(DetailLevel::Full < DetailLevel::Outline);
/// assert_eq!(DetailLevel::Minimal.to_string(), "minimal");
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    #[default]
    Full,
    Compact,
    Minimal,
    Outline,
    Truncated,
}

impl fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DetailLevel::Full => "full",
            DetailLevel::Compact => "compact",
            DetailLevel::Minimal => "minimal",
            DetailLevel::Outline => "outline",
            DetailLevel::Truncated => "truncated",
        };
        f.write_str(label)
    }
}

/// One structural element of a file: a class, function, heading, column...
///
/// Line numbers are 1-indexed and inclusive. Extractors are expected to keep
/// `end_line >= start_line` and to nest children inside their parent's range;
/// neither is checked here.
///
/// # Examples
///
/// ```
/// use readmap_core::{FileSymbol, SymbolKind};
///
/// let method = FileSymbol::new("run", SymbolKind::Method, 3, 8)
///     .with_signature("(self) -> None");
/// let class = FileSymbol::new("Worker", SymbolKind::Class, 1, 20).with_children(vec![method]);
///
/// assert_eq!(class.children.len(), 1);
/// assert_eq!(class.children[0].signature.as_deref(), Some("(self) -> None"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSymbol {
    /// Symbol name (function name, heading text, column name, ...).
    pub name: String,
    /// What kind of symbol this is.
    pub kind: SymbolKind,
    /// First line of the symbol (1-indexed).
    pub start_line: u32,
    /// Last line of the symbol (1-indexed, inclusive).
    pub end_line: u32,
    /// Full or partial declaration text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Modifiers in display order (`async`, `static`, `export`, ...).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<String>,
    /// Nested symbols in source order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileSymbol>,
    /// First line of the attached documentation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    /// Whether the symbol is exported from its module.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_exported: Option<bool>,
}

impl FileSymbol {
    /// Create a bare symbol with only a name, kind and line range.
    pub fn new(name: impl Into<String>, kind: SymbolKind, start_line: u32, end_line: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            start_line,
            end_line,
            signature: None,
            modifiers: Vec::new(),
            children: Vec::new(),
            docstring: None,
            is_exported: None,
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_modifiers(mut self, modifiers: Vec<String>) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_children(mut self, children: Vec<FileSymbol>) -> Self {
        self.children = children;
        self
    }

    pub fn with_docstring(mut self, docstring: impl Into<String>) -> Self {
        self.docstring = Some(docstring.into());
        self
    }

    pub fn with_exported(mut self, exported: bool) -> Self {
        self.is_exported = Some(exported);
        self
    }

    /// The outline shape of this symbol: name, kind and line range only.
    pub fn outline(&self) -> FileSymbol {
        FileSymbol::new(self.name.clone(), self.kind, self.start_line, self.end_line)
    }

    /// Number of symbols in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(FileSymbol::subtree_len).sum::<usize>()
    }
}

/// Counts reported when a map only shows its first and last symbols.
///
/// # Examples
///
/// ```
/// use readmap_core::TruncatedInfo;
///
/// let info = TruncatedInfo::new(500, 50);
/// assert_eq!(info.shown_symbols, 100);
/// assert_eq!(info.omitted_symbols, 400);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TruncatedInfo {
    /// Top-level symbols in the untruncated map.
    pub total_symbols: usize,
    /// Top-level symbols kept (first half plus last half).
    pub shown_symbols: usize,
    /// Top-level symbols dropped from the middle.
    pub omitted_symbols: usize,
}

impl TruncatedInfo {
    /// Build the counts for keeping `symbols_each` symbols on each side.
    pub fn new(total_symbols: usize, symbols_each: usize) -> Self {
        let shown = symbols_each * 2;
        Self {
            total_symbols,
            shown_symbols: shown,
            omitted_symbols: total_symbols.saturating_sub(shown),
        }
    }
}

/// One file's extracted structure.
///
/// Created once by an extractor and treated as an immutable value after
/// that: reductions build new maps instead of editing this one.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use readmap_core::{DetailLevel, FileMap, FileSymbol, SymbolKind};
///
/// let map = FileMap::new(PathBuf::from("/src/app.py"), 4000, 120_000, "Python")
///     .with_symbols(vec![FileSymbol::new("main", SymbolKind::Function, 1, 30)]);
///
/// assert_eq!(map.detail_level, DetailLevel::Full);
/// assert_eq!(map.file_name(), "app.py");
/// assert!(map.truncated_info.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMap {
    /// Absolute path of the mapped file.
    pub path: PathBuf,
    /// Line count of the original file.
    pub total_lines: usize,
    /// Byte size of the original file.
    pub total_bytes: u64,
    /// Display name of the language (`"Python"`, `"SQL"`, ...).
    pub language: String,
    /// Top-level symbols in source order.
    pub symbols: Vec<FileSymbol>,
    /// Import / use strings in source order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
    /// Reduction tier that produced this instance.
    pub detail_level: DetailLevel,
    /// Present only when the truncator has run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncated_info: Option<TruncatedInfo>,
}

impl FileMap {
    /// Create an empty full-detail map for a file.
    pub fn new(
        path: PathBuf,
        total_lines: usize,
        total_bytes: u64,
        language: impl Into<String>,
    ) -> Self {
        Self {
            path,
            total_lines,
            total_bytes,
            language: language.into(),
            symbols: Vec::new(),
            imports: Vec::new(),
            detail_level: DetailLevel::Full,
            truncated_info: None,
        }
    }

    pub fn with_symbols(mut self, symbols: Vec<FileSymbol>) -> Self {
        self.symbols = symbols;
        self
    }

    pub fn with_imports(mut self, imports: Vec<String>) -> Self {
        self.imports = imports;
        self
    }

    /// Final path component, or the whole path when it has none.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Total number of symbols including nested children.
    pub fn symbol_count(&self) -> usize {
        self.symbols.iter().map(FileSymbol::subtree_len).sum()
    }
}

/// Output format for the command-line caller.
///
/// # Examples
///
/// ```
/// use readmap_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Budget-fitted text map.
    #[default]
    Text,
    /// The extracted [`FileMap`] as camelCase JSON.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("sarif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn detail_levels_are_ordered_by_aggressiveness() {
        let levels = [
            DetailLevel::Full,
            DetailLevel::Compact,
            DetailLevel::Minimal,
            DetailLevel::Outline,
            DetailLevel::Truncated,
        ];
        assert!(levels.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn outline_drops_everything_but_identity() {
        let sym = FileSymbol::new("load", SymbolKind::Function, 4, 9)
            .with_signature("def load(path)")
            .with_modifiers(vec!["async".into()])
            .with_docstring("Load things.")
            .with_exported(true)
            .with_children(vec![FileSymbol::new("inner", SymbolKind::Function, 5, 6)]);

        assert_eq!(sym.outline(), FileSymbol::new("load", SymbolKind::Function, 4, 9));
    }

    #[test]
    fn symbol_count_includes_children() {
        let map = FileMap::new(PathBuf::from("/a.ts"), 10, 100, "TypeScript").with_symbols(vec![
            FileSymbol::new("A", SymbolKind::Class, 1, 5).with_children(vec![
                FileSymbol::new("x", SymbolKind::Method, 2, 2),
                FileSymbol::new("y", SymbolKind::Method, 3, 4),
            ]),
            FileSymbol::new("f", SymbolKind::Function, 6, 9),
        ]);
        assert_eq!(map.symbol_count(), 4);
    }

    #[test]
    fn file_map_serializes_camel_case_and_skips_empty() {
        let map = FileMap::new(PathBuf::from("/tmp/q.sql"), 3, 42, "SQL")
            .with_symbols(vec![FileSymbol::new("TABLE users", SymbolKind::Table, 1, 3)]);
        let json = serde_json::to_string(&map).unwrap();
        assert!(json.contains("\"totalLines\":3"));
        assert!(json.contains("\"detailLevel\":\"full\""));
        assert!(json.contains("\"startLine\":1"));
        assert!(!json.contains("imports"));
        assert!(!json.contains("truncatedInfo"));
        assert!(!json.contains("signature"));

        let back: FileMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn truncated_info_saturates() {
        let info = TruncatedInfo::new(5, 10);
        assert_eq!(info.omitted_symbols, 0);
    }
}
