//! Seams to the hosted backend.
//!
//! [`TablesApi`] covers structured rows, [`StorageApi`] covers file
//! buckets. [`AppwriteClient`] implements both over REST; the `mock`
//! module provides in-memory doubles with the same failure kinds.

mod appwrite;
mod error;
pub mod mock;
mod query;

pub use appwrite::AppwriteClient;
pub use error::{RemoteError, RemoteErrorKind};
pub use query::Query;
pub use reqwest::Url;

use async_trait::async_trait;
use models::{FileUpload, RowList, StoredFile};
use serde_json::Value;

/// Addresses one row table inside one database.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub database_id: String,
    pub table_id: String,
}

impl TableRef {
    pub fn new(database_id: impl Into<String>, table_id: impl Into<String>) -> Self {
        Self { database_id: database_id.into(), table_id: table_id.into() }
    }
}

/// Structured-row store.
#[async_trait]
pub trait TablesApi: Send + Sync {
    /// Insert `data` under `row_id`. Fails with `Conflict` if the id is taken.
    async fn create_row(&self, table: &TableRef, row_id: &str, data: Value) -> Result<Value, RemoteError>;
    /// Merge `data` into an existing row. Fails with `NotFound` if absent.
    async fn update_row(&self, table: &TableRef, row_id: &str, data: Value) -> Result<Value, RemoteError>;
    async fn delete_row(&self, table: &TableRef, row_id: &str) -> Result<(), RemoteError>;
    async fn get_row(&self, table: &TableRef, row_id: &str) -> Result<Value, RemoteError>;
    async fn list_rows(&self, table: &TableRef, queries: &[Query]) -> Result<RowList<Value>, RemoteError>;
}

/// Blob store scoped by bucket.
#[async_trait]
pub trait StorageApi: Send + Sync {
    async fn create_file(&self, bucket_id: &str, file_id: &str, upload: FileUpload) -> Result<StoredFile, RemoteError>;
    async fn delete_file(&self, bucket_id: &str, file_id: &str) -> Result<(), RemoteError>;
    /// Build the preview handle for a file. No network round trip.
    fn file_preview_url(&self, bucket_id: &str, file_id: &str) -> Result<Url, RemoteError>;
}
