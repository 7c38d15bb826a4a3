//! Error types for mapproxy configuration tooling.

use thiserror::Error;

/// Result type alias using MapProxyError.
pub type MapProxyResult<T> = Result<T, MapProxyError>;

/// Primary error type for configuration synthesis and maintenance.
#[derive(Debug, Error)]
pub enum MapProxyError {
    // === Pre-flight Errors ===
    #[error("Mode '{mode}' requires {setting} to be set")]
    MissingPrerequisite {
        mode: &'static str,
        setting: &'static str,
    },

    #[error("Invalid cache catalog: {0}")]
    InvalidCatalog(String),

    #[error("Invalid layer list: {0}")]
    InvalidLayerList(String),

    // === Resolution Errors ===
    #[error("Lookup failed for layer '{layer}': {message}")]
    LookupFailure { layer: String, message: String },

    #[error("Temporal source unavailable: {0}")]
    SourceUnavailable(String),

    // === Storage Errors ===
    #[error("Failed to persist configuration: {0}")]
    Persistence(String),

    #[error("Cache directory error: {0}")]
    CacheDirectory(String),
}

impl MapProxyError {
    pub fn lookup(layer: impl Into<String>, message: impl ToString) -> Self {
        MapProxyError::LookupFailure {
            layer: layer.into(),
            message: message.to_string(),
        }
    }

    /// Whether the error aborts the whole command.
    ///
    /// Only per-layer lookups are recoverable; the resolver logs them and
    /// moves on to the next layer.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, MapProxyError::LookupFailure { .. })
    }

    /// Short category label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            MapProxyError::MissingPrerequisite { .. }
            | MapProxyError::InvalidCatalog(_)
            | MapProxyError::InvalidLayerList(_) => "configuration",
            MapProxyError::LookupFailure { .. } => "lookup",
            MapProxyError::SourceUnavailable(_) => "source",
            MapProxyError::Persistence(_) => "persistence",
            MapProxyError::CacheDirectory(_) => "cache",
        }
    }
}
