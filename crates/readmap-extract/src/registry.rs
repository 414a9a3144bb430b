use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use readmap_core::{AbortSignal, ExtractorConfig, FileMap};
use tracing::debug;

use crate::extractors::{
    c_family::CFamilyParser, clojure::ClojureParser, csv::CsvParser, ctags::CtagsExtractor,
    ecmascript::EcmaParser, fallback::LinePatternParser, go::GoParser, json::JsonParser,
    jsonl::JsonLinesParser, markdown::MarkdownParser, python::PythonParser, rust::RustParser,
    sql::SqlParser, toml::TomlParser, yaml::YamlParser,
};
use crate::language::detect_language;
use crate::source::ContentExtractor;

/// Boxed future returned by [`Extractor::extract`].
pub type ExtractFuture<'a> = Pin<Box<dyn Future<Output = Option<FileMap>> + Send + 'a>>;

/// One strategy for turning a file into a [`FileMap`].
///
/// Implementations never fail loudly: every problem (missing tool, parse
/// error, unreadable file, nothing found, abort) yields `None` so the
/// registry can move on to the next strategy.
pub trait Extractor: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Extract a map for `path`, giving up promptly once `signal` is aborted.
    fn extract<'a>(&'a self, path: &'a Path, signal: &'a AbortSignal) -> ExtractFuture<'a>;
}

/// Per-language extraction strategies plus a universal fallback chain.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use readmap_core::{AbortSignal, ExtractorConfig};
/// use readmap_extract::ExtractorRegistry;
///
/// # async fn run() {
/// let registry = ExtractorRegistry::with_defaults(&ExtractorConfig::default());
/// if let Some(map) = registry.generate(Path::new("src/big.py"), &AbortSignal::new()).await {
///     println!("{} symbols", map.symbol_count());
/// }
/// # }
/// ```
#[derive(Default)]
pub struct ExtractorRegistry {
    by_language: HashMap<String, Vec<Arc<dyn Extractor>>>,
    fallbacks: Vec<Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// A registry with no strategies at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in strategies for every detected language, followed by
    /// ctags (when enabled) and the line-pattern fallback.
    pub fn with_defaults(config: &ExtractorConfig) -> Self {
        let mut registry = Self::empty();

        registry.register("python", Arc::new(ContentExtractor::new(PythonParser)));
        registry.register("go", Arc::new(ContentExtractor::new(GoParser)));
        let ecma: Arc<dyn Extractor> = Arc::new(ContentExtractor::new(EcmaParser));
        registry.register("typescript", Arc::clone(&ecma));
        registry.register("javascript", ecma);
        registry.register("rust", Arc::new(ContentExtractor::new(RustParser)));
        registry.register("c", Arc::new(ContentExtractor::new(CFamilyParser::c())));
        let cpp: Arc<dyn Extractor> = Arc::new(ContentExtractor::new(CFamilyParser::cpp()));
        registry.register("cpp", Arc::clone(&cpp));
        registry.register("c-header", cpp);
        registry.register("clojure", Arc::new(ContentExtractor::new(ClojureParser)));
        registry.register("sql", Arc::new(ContentExtractor::new(SqlParser)));
        registry.register("markdown", Arc::new(ContentExtractor::new(MarkdownParser)));
        registry.register("yaml", Arc::new(ContentExtractor::new(YamlParser)));
        registry.register("toml", Arc::new(ContentExtractor::new(TomlParser)));
        registry.register("csv", Arc::new(ContentExtractor::new(CsvParser)));
        registry.register("json", Arc::new(ContentExtractor::new(JsonParser)));
        registry.register("jsonl", Arc::new(ContentExtractor::new(JsonLinesParser)));

        if config.ctags {
            registry.register_fallback(Arc::new(CtagsExtractor::new(
                config.ctags_command.clone(),
                Duration::from_secs(config.timeout_secs),
            )));
        }
        registry.register_fallback(Arc::new(ContentExtractor::new(LinePatternParser)));
        registry
    }

    /// Append `extractor` to the strategies tried for `language_id`.
    pub fn register(&mut self, language_id: impl Into<String>, extractor: Arc<dyn Extractor>) {
        self.by_language
            .entry(language_id.into())
            .or_default()
            .push(extractor);
    }

    /// Append `extractor` to the chain tried after every language strategy.
    pub fn register_fallback(&mut self, extractor: Arc<dyn Extractor>) {
        self.fallbacks.push(extractor);
    }

    /// Names of the strategies that would be tried for `path`, in order.
    pub fn strategies_for(&self, path: &Path) -> Vec<&'static str> {
        self.chain(path).map(|e| e.name()).collect()
    }

    /// Produce a map for `path` from the first strategy that returns one.
    ///
    /// Language strategies run in registration order, then the fallback
    /// chain. The signal is checked before each attempt; once aborted no
    /// further strategy starts and `None` is returned.
    pub async fn generate(&self, path: &Path, signal: &AbortSignal) -> Option<FileMap> {
        for extractor in self.chain(path) {
            if signal.is_aborted() {
                debug!(path = %path.display(), "extraction aborted");
                return None;
            }
            if let Some(map) = extractor.extract(path, signal).await {
                debug!(
                    extractor = extractor.name(),
                    path = %path.display(),
                    symbols = map.symbol_count(),
                    "map generated"
                );
                return Some(map);
            }
            debug!(extractor = extractor.name(), path = %path.display(), "no map, trying next strategy");
        }
        None
    }

    fn chain<'a>(&'a self, path: &Path) -> impl Iterator<Item = &'a Arc<dyn Extractor>> + 'a {
        let specific = detect_language(path)
            .and_then(|info| self.by_language.get(info.id))
            .map(Vec::as_slice)
            .unwrap_or_default();
        specific.iter().chain(self.fallbacks.iter())
    }
}
