//! Universal/Exuberant ctags as a language-agnostic strategy.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use readmap_core::{AbortSignal, FileSymbol, MapError, SymbolKind};
use serde::Deserialize;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::extractors::inferred_end;
use crate::registry::{ExtractFuture, Extractor};
use crate::source::{Extracted, SourceFile};

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Map a ctags kind (single letter or long name) onto a [`SymbolKind`].
///
/// # Examples
///
/// ```
/// use readmap_core::SymbolKind;
/// use readmap_extract::extractors::ctags::kind_from_tag;
///
/// assert_eq!(kind_from_tag("f"), SymbolKind::Function);
/// assert_eq!(kind_from_tag("trait"), SymbolKind::Interface);
/// assert_eq!(kind_from_tag("Q"), SymbolKind::Unknown);
/// ```
pub fn kind_from_tag(kind: &str) -> SymbolKind {
    match kind {
        "c" | "C" | "class" => SymbolKind::Class,
        "d" | "macro" | "constant" => SymbolKind::Constant,
        "e" | "g" | "enum" | "enumerator" => SymbolKind::Enum,
        "f" | "F" | "r" | "function" | "prototype" => SymbolKind::Function,
        "i" | "I" | "interface" | "trait" => SymbolKind::Interface,
        "m" | "M" | "method" => SymbolKind::Method,
        "n" | "namespace" => SymbolKind::Namespace,
        "p" | "P" | "w" | "z" | "property" | "member" | "field" => SymbolKind::Property,
        "s" | "S" | "struct" => SymbolKind::Struct,
        "t" | "T" | "a" | "u" | "type" | "typedef" | "union" | "alias" => SymbolKind::Type,
        "v" | "x" | "A" | "b" | "l" | "variable" => SymbolKind::Variable,
        "h" | "module" | "package" => SymbolKind::Module,
        _ => SymbolKind::Unknown,
    }
}

/// One record of `--output-format=json`.
#[derive(Debug, Deserialize)]
struct JsonTag {
    #[serde(rename = "_type", default)]
    record_type: Option<String>,
    name: Option<String>,
    line: Option<u32>,
    kind: Option<String>,
}

/// A tag reduced to what the map needs.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Tag {
    name: String,
    line: u32,
    kind: SymbolKind,
}

/// Tags from universal-ctags JSON output. Pseudo-tags and malformed lines
/// are skipped.
fn parse_json_tags(output: &str) -> Vec<Tag> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str::<JsonTag>(line).ok())
        .filter(|tag| tag.record_type.as_deref().map_or(true, |t| t == "tag"))
        .filter_map(|tag| {
            Some(Tag {
                name: tag.name?,
                line: tag.line?,
                kind: kind_from_tag(tag.kind.as_deref()?),
            })
        })
        .collect()
}

/// Tags from the classic tab-separated format produced with
/// `--excmd=number`: `name<TAB>file<TAB>line;"<TAB>kind`.
fn parse_legacy_tags(output: &str) -> Vec<Tag> {
    output
        .lines()
        .filter(|line| !line.starts_with('!'))
        .filter_map(|line| {
            let parts: Vec<&str> = line.split('\t').collect();
            if parts.len() < 4 {
                return None;
            }
            let line_no = parts[2].split(";\"").next()?.trim().parse().ok()?;
            let kind = parts[3].chars().next()?.to_string();
            Some(Tag {
                name: parts[0].to_string(),
                line: line_no,
                kind: kind_from_tag(&kind),
            })
        })
        .collect()
}

fn tags_to_symbols(mut tags: Vec<Tag>, total_lines: u32) -> Vec<FileSymbol> {
    tags.sort_by_key(|tag| tag.line);
    let starts: Vec<u32> = tags.iter().map(|tag| tag.line).collect();
    tags.into_iter()
        .enumerate()
        .map(|(i, tag)| {
            let end = inferred_end(tag.line, starts.get(i + 1).copied(), total_lines);
            FileSymbol::new(tag.name, tag.kind, tag.line, end)
        })
        .collect()
}

/// Runs an external ctags binary and turns its tags into a flat map.
///
/// Availability is probed once per extractor with `--version`; only
/// Universal and Exuberant Ctags are accepted. JSON output is preferred and
/// the legacy tab format is used when the JSON invocation fails. Every
/// subprocess is killed when the timeout elapses or the signal aborts.
#[derive(Debug)]
pub struct CtagsExtractor {
    command: String,
    timeout: Duration,
    available: OnceCell<bool>,
}

impl CtagsExtractor {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
            available: OnceCell::new(),
        }
    }

    /// Whether the configured command looks like a supported ctags.
    pub async fn is_available(&self) -> bool {
        *self
            .available
            .get_or_init(|| async {
                let signal = AbortSignal::new();
                match self.run(&["--version"], PROBE_TIMEOUT, &signal).await {
                    Ok(out) => {
                        let supported =
                            out.contains("Universal Ctags") || out.contains("Exuberant Ctags");
                        debug!(command = %self.command, supported, "ctags probe");
                        supported
                    }
                    Err(e) => {
                        debug!(command = %self.command, error = %e, "ctags not available");
                        false
                    }
                }
            })
            .await
    }

    /// Run the command and return its stdout; stderr is only logged.
    async fn run(
        &self,
        args: &[&str],
        timeout: Duration,
        signal: &AbortSignal,
    ) -> Result<String, MapError> {
        let mut command = Command::new(&self.command);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::select! {
            _ = signal.cancelled() => {
                return Err(MapError::Subprocess(format!("{} aborted", self.command)));
            }
            result = tokio::time::timeout(timeout, command.output()) => match result {
                Ok(output) => output?,
                Err(_) => {
                    return Err(MapError::Subprocess(format!(
                        "{} timed out after {}s",
                        self.command,
                        timeout.as_secs()
                    )));
                }
            },
        };
        if !output.status.success() {
            return Err(MapError::Subprocess(format!(
                "{} exited with {}",
                self.command, output.status
            )));
        }
        if !output.stderr.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!(command = %self.command, stderr = %stderr.trim_end(), "ctags wrote to stderr");
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn tags(&self, path: &Path, signal: &AbortSignal) -> Result<Vec<Tag>, MapError> {
        let file = path.to_string_lossy();
        let file: &str = &file;
        match self
            .run(
                &["--output-format=json", "--fields=+n", "-f", "-", file],
                self.timeout,
                signal,
            )
            .await
        {
            Ok(out) => return Ok(parse_json_tags(&out)),
            Err(e) if signal.is_aborted() => return Err(e),
            Err(e) => debug!(error = %e, "json output unavailable, using legacy format"),
        }
        let out = self
            .run(&["--excmd=number", "-f", "-", file], self.timeout, signal)
            .await?;
        Ok(parse_legacy_tags(&out))
    }
}

impl Extractor for CtagsExtractor {
    fn name(&self) -> &'static str {
        "ctags"
    }

    fn extract<'a>(&'a self, path: &'a Path, signal: &'a AbortSignal) -> ExtractFuture<'a> {
        Box::pin(async move {
            if signal.is_aborted() || !self.is_available().await {
                return None;
            }
            let source = match SourceFile::load(path).await {
                Ok(source) => source,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "could not read file");
                    return None;
                }
            };
            let tags = match self.tags(&source.path, signal).await {
                Ok(tags) => tags,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ctags failed");
                    return None;
                }
            };
            if tags.is_empty() || signal.is_aborted() {
                return None;
            }
            let symbols = tags_to_symbols(tags, source.total_lines() as u32);
            Some(source.into_map(Extracted::new(symbols)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_records() {
        let output = r#"{"_type": "ptag", "name": "JSON_OUTPUT_VERSION", "path": "0.0"}
{"_type": "tag", "name": "Server", "path": "a.go", "line": 3, "kind": "struct"}
{"_type": "tag", "name": "Start", "path": "a.go", "line": 8, "kind": "func"}
not json
{"_type": "tag", "name": "nameless_line", "kind": "function"}
"#;
        let tags = parse_json_tags(output);
        assert_eq!(
            tags,
            vec![
                Tag { name: "Server".into(), line: 3, kind: SymbolKind::Struct },
                Tag { name: "Start".into(), line: 8, kind: SymbolKind::Unknown },
            ]
        );
    }

    #[test]
    fn legacy_records() {
        let output = "!_TAG_FILE_FORMAT\t2\t/extended format/\n\
                      main\tsrc/a.c\t12;\"\tf\n\
                      BUF\tsrc/a.c\t3;\"\td\tfile:\n\
                      short\tline\n";
        let tags = parse_legacy_tags(output);
        assert_eq!(
            tags,
            vec![
                Tag { name: "main".into(), line: 12, kind: SymbolKind::Function },
                Tag { name: "BUF".into(), line: 3, kind: SymbolKind::Constant },
            ]
        );
    }

    #[test]
    fn symbols_are_sorted_with_inferred_ends() {
        let tags = parse_legacy_tags("b\tf\t30;\"\tf\na\tf\t10;\"\tc\n");
        let symbols = tags_to_symbols(tags, 45);
        let summary: Vec<(&str, u32, u32)> = symbols
            .iter()
            .map(|s| (s.name.as_str(), s.start_line, s.end_line))
            .collect();
        assert_eq!(summary, [("a", 10, 29), ("b", 30, 45)]);
    }

    // Every subprocess scenario lives in one test so no other test in this
    // binary forks while a script is still open for writing.
    #[cfg(unix)]
    #[tokio::test]
    async fn runs_external_ctags() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("lib.zig");
        std::fs::write(&target, "const a = 1;\n\npub fn main() void {\n}\n").unwrap();

        let missing = CtagsExtractor::new("/nonexistent/ctags-binary", Duration::from_secs(2));
        assert!(!missing.is_available().await);
        assert!(missing.extract(&target, &AbortSignal::new()).await.is_none());

        let script = |name: &str, body: &str| {
            let path = dir.path().join(name);
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path.to_string_lossy().into_owned()
        };
        let json = script(
            "json-ctags",
            r#"if [ "$1" = "--version" ]; then echo "Universal Ctags 6.1.0"; exit 0; fi
if [ "$1" = "--output-format=json" ]; then
  echo '{"_type": "tag", "name": "main", "line": 3, "kind": "function"}'
  echo '{"_type": "tag", "name": "a", "line": 1, "kind": "constant"}'
  exit 0
fi
exit 1"#,
        );
        let legacy = script(
            "legacy-ctags",
            r#"if [ "$1" = "--version" ]; then echo "Exuberant Ctags 5.8"; exit 0; fi
if [ "$1" = "--excmd=number" ]; then
  printf 'main\tlib.zig\t3;"\tf\n'
  printf 'ghost\tlib.zig\t2;"\tv\n' >&2
  exit 0
fi
exit 1"#,
        );
        let impostor = script("impostor-ctags", r#"echo "ctags (GNU Emacs 29.1)""#);

        let map = CtagsExtractor::new(json.clone(), Duration::from_secs(5))
            .extract(&target, &AbortSignal::new())
            .await
            .unwrap();
        assert_eq!(map.language, "Unknown");
        assert_eq!(map.total_lines, 4);
        let summary: Vec<(&str, SymbolKind, u32, u32)> = map
            .symbols
            .iter()
            .map(|s| (s.name.as_str(), s.kind, s.start_line, s.end_line))
            .collect();
        assert_eq!(
            summary,
            [
                ("a", SymbolKind::Constant, 1, 2),
                ("main", SymbolKind::Function, 3, 4),
            ]
        );

        let map = CtagsExtractor::new(legacy, Duration::from_secs(5))
            .extract(&target, &AbortSignal::new())
            .await
            .unwrap();
        assert_eq!(map.symbols.len(), 1, "stderr must not be parsed as tags");
        assert_eq!(map.symbols[0].name, "main");
        assert_eq!(map.symbols[0].kind, SymbolKind::Function);

        let impostor = CtagsExtractor::new(impostor, Duration::from_secs(5));
        assert!(impostor.extract(&target, &AbortSignal::new()).await.is_none());

        let signal = AbortSignal::new();
        signal.abort();
        let aborted = CtagsExtractor::new(json, Duration::from_secs(5));
        assert!(aborted.extract(&target, &signal).await.is_none());
    }
}
