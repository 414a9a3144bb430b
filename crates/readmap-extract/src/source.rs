use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use readmap_core::{AbortSignal, FileMap, FileSymbol, MapError};
use tracing::{debug, warn};

use crate::language::detect_language;
use crate::registry::{ExtractFuture, Extractor};

/// A file's content as seen by an in-process parser.
///
/// # Examples
///
/// ```
/// use readmap_extract::source::SourceFile;
///
/// let file = SourceFile::from_text("/tmp/a.py", "import os\n\ndef main():\n    pass\n");
/// assert_eq!(file.total_lines(), 4);
/// assert_eq!(file.total_bytes, 32);
/// ```
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Absolute path when it could be resolved, otherwise as given.
    pub path: PathBuf,
    /// Content decoded as UTF-8, with invalid sequences replaced.
    pub content: String,
    /// Size of the file on disk.
    pub total_bytes: u64,
}

impl SourceFile {
    /// Read `path` from disk.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::FileNotFound`] if the file does not exist, or
    /// [`MapError::Io`] for any other read failure.
    pub async fn load(path: &Path) -> Result<Self, MapError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => MapError::FileNotFound(path.to_path_buf()),
            _ => MapError::Io(e),
        })?;
        let resolved = tokio::fs::canonicalize(path)
            .await
            .unwrap_or_else(|_| path.to_path_buf());
        Ok(Self {
            path: resolved,
            total_bytes: bytes.len() as u64,
            content: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    /// Build a source file from in-memory text.
    pub fn from_text(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            path: path.into(),
            total_bytes: content.len() as u64,
            content,
        }
    }

    pub fn total_lines(&self) -> usize {
        self.content.lines().count()
    }

    /// Lowercase extension without the dot.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
    }

    pub(crate) fn into_map(self, extracted: Extracted) -> FileMap {
        let total_lines = self.total_lines();
        let language = extracted
            .language
            .or_else(|| detect_language(&self.path).map(|l| l.name.to_string()))
            .unwrap_or_else(|| "Unknown".to_string());
        FileMap::new(self.path, total_lines, self.total_bytes, language)
            .with_symbols(extracted.symbols)
            .with_imports(extracted.imports)
    }
}

/// What a parser found in one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub symbols: Vec<FileSymbol>,
    pub imports: Vec<String>,
    /// Display name overriding the one detected from the extension.
    pub language: Option<String>,
}

impl Extracted {
    pub fn new(symbols: Vec<FileSymbol>) -> Self {
        Self {
            symbols,
            ..Self::default()
        }
    }

    pub fn with_imports(mut self, imports: Vec<String>) -> Self {
        self.imports = imports;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// A synchronous parser over already-loaded file content.
///
/// `Ok(None)` means "nothing recognisable here"; errors are reserved for
/// content the parser could not process at all. Both end up as "no map"
/// once wrapped in a [`ContentExtractor`].
pub trait ContentParser: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Extract symbols from `source`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Parse`] when the content cannot be parsed.
    fn parse(&self, source: &SourceFile) -> Result<Option<Extracted>, MapError>;
}

/// Adapts a [`ContentParser`] to the [`Extractor`] contract: loads the file,
/// honours the abort signal, and turns errors and empty results into `None`.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use readmap_core::AbortSignal;
/// use readmap_extract::extractors::markdown::MarkdownParser;
/// use readmap_extract::{ContentExtractor, Extractor};
///
/// # async fn run() {
/// let extractor = ContentExtractor::new(MarkdownParser);
/// let map = extractor.extract(Path::new("README.md"), &AbortSignal::new()).await;
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ContentExtractor<P> {
    parser: P,
}

impl<P: ContentParser> ContentExtractor<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }
}

impl<P: ContentParser> Extractor for ContentExtractor<P> {
    fn name(&self) -> &'static str {
        self.parser.name()
    }

    fn extract<'a>(&'a self, path: &'a Path, signal: &'a AbortSignal) -> ExtractFuture<'a> {
        Box::pin(async move {
            if signal.is_aborted() {
                return None;
            }
            let source = match SourceFile::load(path).await {
                Ok(source) => source,
                Err(e) => {
                    warn!(extractor = self.parser.name(), path = %path.display(), error = %e, "could not read file");
                    return None;
                }
            };
            if signal.is_aborted() {
                return None;
            }

            match self.parser.parse(&source) {
                Ok(Some(extracted)) if !extracted.symbols.is_empty() => {
                    Some(source.into_map(extracted))
                }
                Ok(_) => {
                    debug!(extractor = self.parser.name(), path = %path.display(), "no symbols found");
                    None
                }
                Err(e) => {
                    warn!(extractor = self.parser.name(), path = %path.display(), error = %e, "extraction failed");
                    None
                }
            }
        })
    }
}
