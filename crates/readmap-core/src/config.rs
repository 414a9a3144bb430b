use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MapError;

/// Top-level configuration loaded from `.readmap.toml`.
///
/// Every field has a default, so an empty file (or no file) is valid.
///
/// # Examples
///
/// ```
/// use readmap_core::ReadmapConfig;
///
/// let config = ReadmapConfig::default();
/// assert_eq!(config.thresholds.max_lines, 2000);
/// assert!(config.extractors.ctags);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadmapConfig {
    /// Size thresholds and per-tier byte budgets.
    #[serde(default)]
    pub thresholds: Thresholds,
    /// Extractor toggles.
    #[serde(default)]
    pub extractors: ExtractorConfig,
}

impl ReadmapConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Io`] if the file cannot be read, or
    /// [`MapError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use readmap_core::ReadmapConfig;
    /// use std::path::Path;
    ///
    /// let config = ReadmapConfig::from_file(Path::new(".readmap.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, MapError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Toml`] if parsing fails, or [`MapError::Config`]
    /// if the thresholds are inconsistent.
    ///
    /// # Examples
    ///
    /// ```
    /// use readmap_core::ReadmapConfig;
    ///
    /// let toml = r#"
    /// [thresholds]
    /// truncated_symbols_each = 20
    /// "#;
    /// let config = ReadmapConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.thresholds.truncated_symbols_each, 20);
    /// assert_eq!(config.thresholds.min_symbols_each, 10);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, MapError> {
        let config: Self = toml::from_str(content)?;
        config.thresholds.validate()?;
        Ok(config)
    }
}

/// Size thresholds and tier budgets, all in bytes unless noted.
///
/// # Examples
///
/// ```
/// use readmap_core::Thresholds;
///
/// let t = Thresholds::default();
/// assert_eq!(t.full_target_bytes, 10 * 1024);
/// assert_eq!(t.max_truncated_bytes, 100 * 1024);
/// assert!(t.exceeds_read_limit(2001, 10));
/// assert!(!t.exceeds_read_limit(100, 10));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Lines above which a file gets a map instead of a full read.
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,
    /// Bytes above which a file gets a map instead of a full read.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    /// Budget for the Minimal tier.
    #[serde(default = "default_max_map_bytes")]
    pub max_map_bytes: usize,
    /// Budget for the Full tier.
    #[serde(default = "default_full_target_bytes")]
    pub full_target_bytes: usize,
    /// Budget for the Compact tier.
    #[serde(default = "default_compact_target_bytes")]
    pub compact_target_bytes: usize,
    /// Budget for the Outline tier.
    #[serde(default = "default_max_outline_bytes")]
    pub max_outline_bytes: usize,
    /// Absolute ceiling for truncated output and the default overall budget.
    #[serde(default = "default_max_truncated_bytes")]
    pub max_truncated_bytes: usize,
    /// Symbols kept on each side by a default truncation.
    #[serde(default = "default_truncated_symbols_each")]
    pub truncated_symbols_each: usize,
    /// Floor for the truncation search; always shown as a last resort.
    #[serde(default = "default_min_symbols_each")]
    pub min_symbols_each: usize,
}

fn default_max_lines() -> usize {
    2000
}

fn default_max_bytes() -> u64 {
    50 * 1024
}

fn default_max_map_bytes() -> usize {
    20 * 1024
}

fn default_full_target_bytes() -> usize {
    10 * 1024
}

fn default_compact_target_bytes() -> usize {
    15 * 1024
}

fn default_max_outline_bytes() -> usize {
    50 * 1024
}

fn default_max_truncated_bytes() -> usize {
    100 * 1024
}

fn default_truncated_symbols_each() -> usize {
    50
}

fn default_min_symbols_each() -> usize {
    10
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_lines: default_max_lines(),
            max_bytes: default_max_bytes(),
            max_map_bytes: default_max_map_bytes(),
            full_target_bytes: default_full_target_bytes(),
            compact_target_bytes: default_compact_target_bytes(),
            max_outline_bytes: default_max_outline_bytes(),
            max_truncated_bytes: default_max_truncated_bytes(),
            truncated_symbols_each: default_truncated_symbols_each(),
            min_symbols_each: default_min_symbols_each(),
        }
    }
}

impl Thresholds {
    /// Whether a file of this size is too large to read in full.
    pub fn exceeds_read_limit(&self, total_lines: usize, total_bytes: u64) -> bool {
        total_lines > self.max_lines || total_bytes > self.max_bytes
    }

    /// Reject settings the renderer cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Config`] when the truncation floor is zero or
    /// larger than the default per-side count.
    pub fn validate(&self) -> Result<(), MapError> {
        if self.min_symbols_each == 0 {
            return Err(MapError::Config(
                "thresholds.min_symbols_each must be at least 1".into(),
            ));
        }
        if self.min_symbols_each > self.truncated_symbols_each {
            return Err(MapError::Config(format!(
                "thresholds.min_symbols_each ({}) exceeds truncated_symbols_each ({})",
                self.min_symbols_each, self.truncated_symbols_each
            )));
        }
        Ok(())
    }
}

/// Which extraction strategies are enabled.
///
/// # Examples
///
/// ```
/// use readmap_core::ExtractorConfig;
///
/// let config = ExtractorConfig::default();
/// assert_eq!(config.ctags_command, "ctags");
/// assert_eq!(config.timeout_secs, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Try universal-ctags before the line-pattern fallback.
    #[serde(default = "default_true")]
    pub ctags: bool,
    /// Executable used for the ctags strategy.
    #[serde(default = "default_ctags_command")]
    pub ctags_command: String,
    /// Timeout for external tools, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_ctags_command() -> String {
    "ctags".into()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            ctags: default_true(),
            ctags_command: default_ctags_command(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = ReadmapConfig::from_toml("").unwrap();
        assert_eq!(config, ReadmapConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let toml = r#"
[thresholds]
max_lines = 500
full_target_bytes = 4096

[extractors]
ctags = false
"#;
        let config = ReadmapConfig::from_toml(toml).unwrap();
        assert_eq!(config.thresholds.max_lines, 500);
        assert_eq!(config.thresholds.full_target_bytes, 4096);
        assert_eq!(config.thresholds.compact_target_bytes, 15 * 1024);
        assert!(!config.extractors.ctags);
        assert_eq!(config.extractors.ctags_command, "ctags");
    }

    #[test]
    fn zero_floor_is_rejected() {
        let toml = "[thresholds]\nmin_symbols_each = 0\n";
        let err = ReadmapConfig::from_toml(toml).unwrap_err();
        assert!(matches!(err, MapError::Config(_)));
    }

    #[test]
    fn floor_above_default_count_is_rejected() {
        let toml = "[thresholds]\nmin_symbols_each = 60\n";
        assert!(ReadmapConfig::from_toml(toml).is_err());
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let err = ReadmapConfig::from_toml("[thresholds\n").unwrap_err();
        assert!(matches!(err, MapError::Toml(_)));
    }

    #[test]
    fn from_file_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".readmap.toml");
        std::fs::write(&path, "[extractors]\ntimeout_secs = 3\n").unwrap();
        let config = ReadmapConfig::from_file(&path).unwrap();
        assert_eq!(config.extractors.timeout_secs, 3);
    }

    #[test]
    fn read_limit_checks_either_dimension() {
        let t = Thresholds::default();
        assert!(t.exceeds_read_limit(10, 50 * 1024 + 1));
        assert!(!t.exceeds_read_limit(2000, 50 * 1024));
    }
}
