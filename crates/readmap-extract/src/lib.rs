//! Structural map extraction for large files.
//!
//! Detects a file's language from its extension and runs the matching
//! strategies: tree-sitter for Rust, Python, TypeScript/JavaScript, Go and
//! C/C++; in-process scanners for Clojure, SQL, Markdown, YAML, TOML, CSV,
//! JSON and JSON Lines; then universal ctags and a line-pattern fallback.
//! Every strategy either produces a [`FileMap`] or quietly yields `None`.

pub mod extractors;
pub mod language;
pub mod registry;
pub mod source;
pub mod syntax;

use std::path::Path;

use readmap_core::{AbortSignal, ExtractorConfig, FileMap, Thresholds};

pub use registry::{ExtractFuture, Extractor, ExtractorRegistry};
pub use source::{ContentExtractor, ContentParser, Extracted, SourceFile};

/// Generate a map for `path` with the default extractor set.
///
/// Returns `None` when no strategy recognises anything in the file or the
/// signal is aborted.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use readmap_core::AbortSignal;
/// use readmap_extract::generate_map;
///
/// # async fn run() {
/// if let Some(map) = generate_map(Path::new("schema.sql"), &AbortSignal::new()).await {
///     println!("{} symbols in {}", map.symbol_count(), map.language);
/// }
/// # }
/// ```
pub async fn generate_map(path: &Path, signal: &AbortSignal) -> Option<FileMap> {
    ExtractorRegistry::with_defaults(&ExtractorConfig::default())
        .generate(path, signal)
        .await
}

/// Whether a file is large enough to warrant a map instead of a full read.
///
/// # Examples
///
/// ```
/// use readmap_core::Thresholds;
/// use readmap_extract::should_generate_map;
///
/// let thresholds = Thresholds::default();
/// assert!(!should_generate_map(120, 4_000, &thresholds));
/// assert!(should_generate_map(2_500, 4_000, &thresholds));
/// assert!(should_generate_map(10, 80_000, &thresholds));
/// ```
pub fn should_generate_map(total_lines: usize, total_bytes: u64, thresholds: &Thresholds) -> bool {
    thresholds.exceeds_read_limit(total_lines, total_bytes)
}
