use std::path::PathBuf;

/// Errors that can occur while extracting or configuring a map.
///
/// Extractors use this type internally; at the extractor boundary every
/// error is logged and turned into "no map", so it never reaches the
/// renderer. The binary converts it to a `miette` diagnostic.
///
/// # Examples
///
/// ```
/// use readmap_core::MapError;
///
/// let err = MapError::Parse("unbalanced brackets".into());
/// assert_eq!(err.to_string(), "parse error: unbalanced brackets");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Source content could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// An external tool failed or produced unusable output.
    #[error("subprocess error: {0}")]
    Subprocess(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: MapError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn subprocess_error_displays_message() {
        let err = MapError::Subprocess("ctags exited with 2".into());
        assert_eq!(err.to_string(), "subprocess error: ctags exited with 2");
    }

    #[test]
    fn file_not_found_shows_path() {
        let err = MapError::FileNotFound(PathBuf::from("/tmp/missing.rs"));
        assert!(err.to_string().contains("/tmp/missing.rs"));
    }
}
