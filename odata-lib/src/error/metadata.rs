//! Schema loading errors

/// Errors that can occur while loading a schema from a source.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// The schema file could not be read.
    #[error("Failed to read schema: {0}")]
    Io(#[from] std::io::Error),

    /// The schema document is malformed.
    #[error("Failed to parse schema: {0}")]
    Parse(#[from] serde_json::Error),

    /// The schema source reported an error.
    #[error("Schema source error: {0}")]
    Source(String),

    /// Metadata was requested synchronously before the session loaded it.
    #[error("Schema not loaded, resolve the command asynchronously first")]
    NotLoaded,
}
