//! Core types, configuration, and error handling for readmap.
//!
//! This crate provides the shared foundation used by the extraction and
//! rendering crates:
//! - [`FileMap`] / [`FileSymbol`]: the symbol tree produced by extractors
//! - [`MapError`]: unified error type using `thiserror`
//! - [`ReadmapConfig`] / [`Thresholds`]: configuration loaded from `.readmap.toml`
//! - [`AbortSignal`]: cooperative cancellation handle threaded into extractors

mod config;
mod error;
mod signal;
mod types;

pub use config::{ExtractorConfig, ReadmapConfig, Thresholds};
pub use error::MapError;
pub use signal::AbortSignal;
pub use types::{DetailLevel, FileMap, FileSymbol, OutputFormat, SymbolKind, TruncatedInfo};

/// A convenience `Result` type for readmap operations.
pub type Result<T> = std::result::Result<T, MapError>;
