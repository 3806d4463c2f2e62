//! Post facade over the hosted row table and file bucket.
//!
//! Built once at startup and shared as `Arc<RecordService<..>>`. Every
//! call is a single live round trip; nothing is cached or retried.

use std::sync::Arc;

use models::{FileUpload, NewPost, Post, PostPatch, PostStatus, RowList, StoredFile};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::errors::ServiceError;
use crate::remote::{AppwriteClient, Query, RemoteError, RemoteErrorKind, StorageApi, TableRef, TablesApi, Url};

/// Fixed ids every call is scoped to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreTargets {
    pub database_id: String,
    pub table_id: String,
    pub bucket_id: String,
}

impl StoreTargets {
    pub fn new(database_id: impl Into<String>, table_id: impl Into<String>, bucket_id: impl Into<String>) -> Self {
        Self { database_id: database_id.into(), table_id: table_id.into(), bucket_id: bucket_id.into() }
    }

    pub fn from_config(cfg: &configs::AppwriteConfig) -> Self {
        Self::new(cfg.database_id.clone(), cfg.table_id.clone(), cfg.bucket_id.clone())
    }

    pub fn table(&self) -> TableRef { TableRef::new(self.database_id.clone(), self.table_id.clone()) }
}

/// Result of a delete that reached the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

impl DeleteOutcome {
    pub fn is_deleted(self) -> bool { self == DeleteOutcome::Deleted }
}

pub struct RecordService<T: TablesApi = AppwriteClient, S: StorageApi = AppwriteClient> {
    tables: Arc<T>,
    storage: Arc<S>,
    targets: StoreTargets,
    table: TableRef,
}

impl RecordService<AppwriteClient, AppwriteClient> {
    /// Open the REST connection described by `cfg`. One client backs both seams.
    pub fn connect(cfg: &configs::AppwriteConfig) -> Result<Self, ServiceError> {
        let client = AppwriteClient::from_config(cfg).map_err(|e| ServiceError::Config(e.to_string()))?;
        let client = Arc::new(client);
        info!(endpoint = %client.endpoint(), project = %client.project_id(), "appwrite client ready");
        Ok(Self::new(Arc::clone(&client), client, StoreTargets::from_config(cfg)))
    }
}

impl<T: TablesApi, S: StorageApi> RecordService<T, S> {
    pub fn new(tables: Arc<T>, storage: Arc<S>, targets: StoreTargets) -> Self {
        let table = targets.table();
        Self { tables, storage, targets, table }
    }

    pub fn targets(&self) -> &StoreTargets { &self.targets }

    /// Create a post keyed by its slug.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use models::{NewPost, PostStatus};
    /// use service::{RecordService, StoreTargets};
    /// use service::remote::mock::{MemoryStorage, MemoryTables};
    ///
    /// let svc = RecordService::new(
    ///     Arc::new(MemoryTables::new()),
    ///     Arc::new(MemoryStorage::new()),
    ///     StoreTargets::new("db", "posts", "images"),
    /// );
    /// let input = NewPost {
    ///     title: "Hello".into(),
    ///     slug: "hello-world".into(),
    ///     content: "...".into(),
    ///     featured_image: None,
    ///     status: PostStatus::Active,
    ///     user_id: "u1".into(),
    /// };
    /// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    /// let post = rt.block_on(svc.create_post(input)).unwrap();
    /// assert_eq!(post.slug, "hello-world");
    /// ```
    #[instrument(skip(self, input), fields(slug = %input.slug))]
    pub async fn create_post(&self, input: NewPost) -> Result<Post, ServiceError> {
        if let Err(e) = input.validate() {
            warn!(error = %e, "create post rejected");
            return Err(e.into());
        }
        let row = self
            .tables
            .create_row(&self.table, &input.slug, input.row_data())
            .await
            .and_then(decode_post)
            .map_err(|e| {
                error!(error = %e, kind = %e.kind, transient = e.kind.is_transient(), "create post failed");
                ServiceError::Write(e)
            })?;
        info!(slug = %row.slug, user_id = %row.user_id, "post_created");
        Ok(row)
    }

    /// Apply `patch` to an existing post. Fields left `None` keep their value.
    #[instrument(skip(self, patch))]
    pub async fn update_post(&self, slug: &str, patch: PostPatch) -> Result<Post, ServiceError> {
        require_key(slug)?;
        if patch.is_empty() {
            debug!("empty patch, only touching the row");
        }
        let row = self
            .tables
            .update_row(&self.table, slug, patch.row_data())
            .await
            .and_then(decode_post)
            .map_err(|e| {
                error!(error = %e, kind = %e.kind, transient = e.kind.is_transient(), "update post failed");
                ServiceError::Write(e)
            })?;
        info!(slug = %row.slug, "post_updated");
        Ok(row)
    }

    /// Delete a post. A missing slug is an outcome, not an error.
    #[instrument(skip(self))]
    pub async fn delete_post(&self, slug: &str) -> Result<DeleteOutcome, ServiceError> {
        require_key(slug)?;
        let outcome = delete_outcome(self.tables.delete_row(&self.table, slug).await)?;
        info!(?outcome, "post_delete");
        Ok(outcome)
    }

    #[instrument(skip(self))]
    pub async fn get_post(&self, slug: &str) -> Result<Post, ServiceError> {
        require_key(slug)?;
        self.tables
            .get_row(&self.table, slug)
            .await
            .and_then(decode_post)
            .map_err(|e| {
                if e.kind == RemoteErrorKind::NotFound {
                    info!(error = %e, "post not found");
                } else {
                    error!(error = %e, kind = %e.kind, transient = e.kind.is_transient(), "get post failed");
                }
                ServiceError::Lookup(e)
            })
    }

    /// List posts whose status is `active`, in server order.
    #[instrument(skip(self))]
    pub async fn list_posts(&self) -> Result<RowList<Post>, ServiceError> {
        let queries = [Query::equal("status", [PostStatus::Active.as_str()])];
        let mut page = self
            .tables
            .list_rows(&self.table, &queries)
            .await
            .and_then(|raw| raw.decode::<Post>().map_err(|e| RemoteError::decode(e.to_string())))
            .map_err(|e| {
                error!(error = %e, kind = %e.kind, transient = e.kind.is_transient(), "list posts failed");
                ServiceError::Read(e)
            })?;
        // Anything the remote filter lets through is dropped and no longer counted.
        let fetched = page.rows.len();
        page.rows.retain(|p| p.status == PostStatus::Active);
        let dropped = fetched - page.rows.len();
        if dropped > 0 {
            warn!(dropped, "inactive rows in filtered listing");
            page.total = page.total.saturating_sub(dropped as u64);
        }
        info!(count = page.rows.len(), total = page.total, "posts_listed");
        Ok(page)
    }

    /// Upload a file under a freshly generated key.
    #[instrument(skip(self, upload), fields(name = %upload.name, size = upload.bytes.len()))]
    pub async fn upload_file(&self, upload: FileUpload) -> Result<StoredFile, ServiceError> {
        upload.validate()?;
        let file_id = models::id::unique();
        let file = self
            .storage
            .create_file(&self.targets.bucket_id, &file_id, upload)
            .await
            .map_err(|e| {
                error!(error = %e, kind = %e.kind, transient = e.kind.is_transient(), "upload file failed");
                ServiceError::Write(e)
            })?;
        info!(file_id = %file.id, "file_uploaded");
        Ok(file)
    }

    #[instrument(skip(self))]
    pub async fn delete_file(&self, file_id: &str) -> Result<DeleteOutcome, ServiceError> {
        require_key(file_id)?;
        let outcome = delete_outcome(self.storage.delete_file(&self.targets.bucket_id, file_id).await)?;
        info!(?outcome, "file_delete");
        Ok(outcome)
    }

    /// Preview handle embeddable as an image source.
    pub fn file_preview_url(&self, file_id: &str) -> Result<Url, ServiceError> {
        require_key(file_id)?;
        self.storage.file_preview_url(&self.targets.bucket_id, file_id).map_err(|e| {
            error!(error = %e, file_id, "preview url failed");
            match e.kind {
                RemoteErrorKind::Invalid => ServiceError::Config(e.to_string()),
                _ => ServiceError::Lookup(e),
            }
        })
    }
}

/// Empty keys would address the collection endpoint instead of one item.
fn require_key(key: &str) -> Result<(), ServiceError> {
    if key.trim().is_empty() {
        return Err(models::ModelError::Validation("key must not be empty".into()).into());
    }
    Ok(())
}

fn decode_post(row: Value) -> Result<Post, RemoteError> {
    serde_json::from_value(row).map_err(|e| RemoteError::decode(format!("post row: {e}")))
}

fn delete_outcome(res: Result<(), RemoteError>) -> Result<DeleteOutcome, ServiceError> {
    match res {
        Ok(()) => Ok(DeleteOutcome::Deleted),
        Err(e) if e.kind == RemoteErrorKind::NotFound => Ok(DeleteOutcome::NotFound),
        Err(e) => {
            error!(error = %e, kind = %e.kind, transient = e.kind.is_transient(), "delete failed");
            Err(ServiceError::Delete(e))
        }
    }
}
