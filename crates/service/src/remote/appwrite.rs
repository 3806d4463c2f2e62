use std::fmt;

use async_trait::async_trait;
use models::{FileUpload, RowList, StoredFile};
use reqwest::{
    multipart::{Form, Part},
    Method, RequestBuilder, Response, Url,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use super::{Query, RemoteError, StorageApi, TableRef, TablesApi};

const PROJECT_HEADER: &str = "X-Appwrite-Project";
const KEY_HEADER: &str = "X-Appwrite-Key";

/// Connection handle to one project on the hosted backend.
///
/// Cheap to clone; the inner `reqwest::Client` pools connections. Never
/// mutated after construction.
#[derive(Clone)]
pub struct AppwriteClient {
    http: reqwest::Client,
    endpoint: Url,
    project_id: String,
    api_key: Option<String>,
}

impl fmt::Debug for AppwriteClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppwriteClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("project_id", &self.project_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl AppwriteClient {
    /// `endpoint` is the API root, e.g. `https://cloud.appwrite.io/v1`.
    pub fn new(endpoint: &str, project_id: impl Into<String>) -> Result<Self, RemoteError> {
        let endpoint = Url::parse(endpoint.trim())
            .map_err(|e| RemoteError::invalid(format!("endpoint {endpoint:?}: {e}")))?;
        if endpoint.cannot_be_a_base() {
            return Err(RemoteError::invalid(format!("endpoint {endpoint} cannot be a base URL")));
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("quillpost/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, endpoint, project_id: project_id.into(), api_key: None })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn from_config(cfg: &configs::AppwriteConfig) -> Result<Self, RemoteError> {
        let client = Self::new(&cfg.endpoint, cfg.project_id.clone())?;
        Ok(match cfg.api_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => client.with_api_key(key),
            None => client,
        })
    }

    pub fn endpoint(&self) -> &Url { &self.endpoint }

    pub fn project_id(&self) -> &str { &self.project_id }

    /// Append percent-encoded path segments to the endpoint.
    fn url(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::invalid("endpoint cannot be a base URL"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn rows_url(&self, table: &TableRef, row_id: Option<&str>) -> Result<Url, RemoteError> {
        let mut segments = vec!["tablesdb", table.database_id.as_str(), "tables", table.table_id.as_str(), "rows"];
        segments.extend(row_id);
        self.url(&segments)
    }

    fn files_url(&self, bucket_id: &str, file_id: Option<&str>) -> Result<Url, RemoteError> {
        let mut segments = vec!["storage", "buckets", bucket_id, "files"];
        segments.extend(file_id);
        self.url(&segments)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, path = %url.path(), "appwrite request");
        let rb = self.http.request(method, url).header(PROJECT_HEADER, &self.project_id);
        match &self.api_key {
            Some(key) => rb.header(KEY_HEADER, key),
            None => rb,
        }
    }

    async fn send(rb: RequestBuilder) -> Result<Response, RemoteError> {
        let resp = rb.send().await.map_err(|e| RemoteError::transport(e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(RemoteError::from_response(status.as_u16(), &body))
    }

    async fn send_json<T: DeserializeOwned>(rb: RequestBuilder) -> Result<T, RemoteError> {
        let resp = Self::send(rb).await?;
        let bytes = resp.bytes().await.map_err(|e| RemoteError::transport(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| RemoteError::decode(e.to_string()))
    }
}

#[async_trait]
impl TablesApi for AppwriteClient {
    async fn create_row(&self, table: &TableRef, row_id: &str, data: Value) -> Result<Value, RemoteError> {
        let url = self.rows_url(table, None)?;
        Self::send_json(self.request(Method::POST, url).json(&json!({ "rowId": row_id, "data": data }))).await
    }

    async fn update_row(&self, table: &TableRef, row_id: &str, data: Value) -> Result<Value, RemoteError> {
        let url = self.rows_url(table, Some(row_id))?;
        Self::send_json(self.request(Method::PATCH, url).json(&json!({ "data": data }))).await
    }

    async fn delete_row(&self, table: &TableRef, row_id: &str) -> Result<(), RemoteError> {
        let url = self.rows_url(table, Some(row_id))?;
        Self::send(self.request(Method::DELETE, url)).await.map(|_| ())
    }

    async fn get_row(&self, table: &TableRef, row_id: &str) -> Result<Value, RemoteError> {
        let url = self.rows_url(table, Some(row_id))?;
        Self::send_json(self.request(Method::GET, url)).await
    }

    async fn list_rows(&self, table: &TableRef, queries: &[Query]) -> Result<RowList<Value>, RemoteError> {
        let mut url = self.rows_url(table, None)?;
        if !queries.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for q in queries {
                pairs.append_pair("queries[]", &q.to_string());
            }
        }
        Self::send_json(self.request(Method::GET, url)).await
    }
}

#[async_trait]
impl StorageApi for AppwriteClient {
    async fn create_file(&self, bucket_id: &str, file_id: &str, upload: FileUpload) -> Result<StoredFile, RemoteError> {
        let url = self.files_url(bucket_id, None)?;
        let mut part = Part::bytes(upload.bytes).file_name(upload.name);
        if let Some(mime) = upload.mime_type.as_deref() {
            part = part.mime_str(mime).map_err(|e| RemoteError::invalid(format!("mime type {mime:?}: {e}")))?;
        }
        let form = Form::new().text("fileId", file_id.to_string()).part("file", part);
        Self::send_json(self.request(Method::POST, url).multipart(form)).await
    }

    async fn delete_file(&self, bucket_id: &str, file_id: &str) -> Result<(), RemoteError> {
        let url = self.files_url(bucket_id, Some(file_id))?;
        Self::send(self.request(Method::DELETE, url)).await.map(|_| ())
    }

    fn file_preview_url(&self, bucket_id: &str, file_id: &str) -> Result<Url, RemoteError> {
        let mut url = self.url(&["storage", "buckets", bucket_id, "files", file_id, "preview"])?;
        url.query_pairs_mut().append_pair("project", &self.project_id);
        Ok(url)
    }
}
