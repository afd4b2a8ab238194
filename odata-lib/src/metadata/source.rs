//! Schema sources

use std::path::PathBuf;

use async_trait::async_trait;

use super::Schema;
use crate::error::Error;
use crate::error::MetadataError;

/// Trait for loading a service schema.
///
/// A [`Session`](crate::Session) calls [`load`](SchemaSource::load) at most
/// once per session; implementations may perform I/O.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use odata_lib::metadata::{Schema, SchemaSource};
///
/// struct RemoteSchema { /* ... */ }
///
/// #[async_trait]
/// impl SchemaSource for RemoteSchema {
///     async fn load(&self) -> Result<Schema, odata_lib::error::Error> {
///         // fetch and convert the service document
///     }
/// }
/// ```
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Loads the schema.
    async fn load(&self) -> Result<Schema, Error>;
}

#[async_trait]
impl SchemaSource for Schema {
    async fn load(&self) -> Result<Schema, Error> {
        Ok(self.clone())
    }
}

/// A schema source parsing a JSON document held in memory.
#[derive(Debug, Clone)]
pub struct JsonSchemaSource {
    json: String,
}

impl JsonSchemaSource {
    /// Creates a source from a JSON document.
    pub fn new(json: impl Into<String>) -> Self {
        Self { json: json.into() }
    }
}

#[async_trait]
impl SchemaSource for JsonSchemaSource {
    async fn load(&self) -> Result<Schema, Error> {
        Schema::from_json(&self.json)
    }
}

/// A schema source reading a JSON document from disk.
#[derive(Debug, Clone)]
pub struct FileSchemaSource {
    path: PathBuf,
}

impl FileSchemaSource {
    /// Creates a source reading the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SchemaSource for FileSchemaSource {
    async fn load(&self) -> Result<Schema, Error> {
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(MetadataError::from)?;
        Schema::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_json_source() {
        let source = JsonSchemaSource::new(r#"{ "namespace": "Demo" }"#);
        let schema = source.load().await.unwrap();
        assert_eq!(schema.namespace, "Demo");
    }

    #[tokio::test]
    async fn test_json_source_parse_error() {
        let source = JsonSchemaSource::new("{ not json");
        let err = source.load().await.unwrap_err();
        assert!(matches!(err, Error::Metadata(MetadataError::Parse(_))));
    }

    #[tokio::test]
    async fn test_file_source_missing_file() {
        let source = FileSchemaSource::new("/nonexistent/schema.json");
        let err = source.load().await.unwrap_err();
        assert!(matches!(err, Error::Metadata(MetadataError::Io(_))));
    }
}
