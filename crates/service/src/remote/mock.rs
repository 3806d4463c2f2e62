//! In-memory doubles for [`TablesApi`] and [`StorageApi`].
//!
//! They reproduce the remote platform's observable behaviour closely
//! enough for facade and HTTP tests: `409` on a taken id, `404` on a
//! missing one, server-side metadata fields, equality filters. Either
//! double can be switched "offline" to simulate an unreachable backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use models::{FileUpload, RowList, StoredFile};
use serde_json::{Map, Value};

use super::{Query, RemoteError, StorageApi, TableRef, TablesApi, Url};

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, false)
}

fn offline_error() -> RemoteError {
    RemoteError::transport("backend unreachable (offline)")
}

struct MemRow {
    table: TableRef,
    id: String,
    doc: Map<String, Value>,
}

/// Row tables kept in insertion order, which is also the list order.
#[derive(Default)]
pub struct MemoryTables {
    rows: Mutex<Vec<MemRow>>,
    offline: AtomicBool,
}

impl MemoryTables {
    pub fn new() -> Self { Self::default() }

    /// While offline every call fails with a `Transport` error.
    pub fn set_offline(&self, offline: bool) { self.offline.store(offline, Ordering::SeqCst); }

    pub fn len(&self) -> usize { self.rows.lock().unwrap().len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Store a row as-is, bypassing validation. Handy for seeding fixtures.
    pub fn seed(&self, table: &TableRef, row_id: &str, data: Value) {
        let doc = build_doc(table, row_id, data);
        self.rows.lock().unwrap().push(MemRow { table: table.clone(), id: row_id.to_string(), doc });
    }

    fn check_online(&self) -> Result<(), RemoteError> {
        if self.offline.load(Ordering::SeqCst) { Err(offline_error()) } else { Ok(()) }
    }
}

fn build_doc(table: &TableRef, row_id: &str, data: Value) -> Map<String, Value> {
    let mut doc = match data {
        Value::Object(m) => m,
        _ => Map::new(),
    };
    let ts = now();
    doc.insert("$id".into(), Value::from(row_id));
    doc.insert("$databaseId".into(), Value::from(table.database_id.as_str()));
    doc.insert("$tableId".into(), Value::from(table.table_id.as_str()));
    doc.insert("$createdAt".into(), Value::from(ts.clone()));
    doc.insert("$updatedAt".into(), Value::from(ts));
    doc.insert("$permissions".into(), Value::Array(Vec::new()));
    doc
}

fn row_not_found(row_id: &str) -> RemoteError {
    RemoteError { error_type: Some("row_not_found".into()), ..RemoteError::not_found(format!("row {row_id:?} not found")) }
}

#[async_trait]
impl TablesApi for MemoryTables {
    async fn create_row(&self, table: &TableRef, row_id: &str, data: Value) -> Result<Value, RemoteError> {
        self.check_online()?;
        if !data.is_object() {
            return Err(RemoteError::from_response(400, "row data must be an object"));
        }
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|r| &r.table == table && r.id == row_id) {
            return Err(RemoteError {
                error_type: Some("row_already_exists".into()),
                ..RemoteError::conflict(format!("row {row_id:?} already exists"))
            });
        }
        let doc = build_doc(table, row_id, data);
        let out = Value::Object(doc.clone());
        rows.push(MemRow { table: table.clone(), id: row_id.to_string(), doc });
        Ok(out)
    }

    async fn update_row(&self, table: &TableRef, row_id: &str, data: Value) -> Result<Value, RemoteError> {
        self.check_online()?;
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| &r.table == table && r.id == row_id)
            .ok_or_else(|| row_not_found(row_id))?;
        if let Value::Object(patch) = data {
            for (k, v) in patch.into_iter().filter(|(k, _)| !k.starts_with('$')) {
                row.doc.insert(k, v);
            }
        }
        row.doc.insert("$updatedAt".into(), Value::from(now()));
        Ok(Value::Object(row.doc.clone()))
    }

    async fn delete_row(&self, table: &TableRef, row_id: &str) -> Result<(), RemoteError> {
        self.check_online()?;
        let mut rows = self.rows.lock().unwrap();
        let idx = rows
            .iter()
            .position(|r| &r.table == table && r.id == row_id)
            .ok_or_else(|| row_not_found(row_id))?;
        rows.remove(idx);
        Ok(())
    }

    async fn get_row(&self, table: &TableRef, row_id: &str) -> Result<Value, RemoteError> {
        self.check_online()?;
        let rows = self.rows.lock().unwrap();
        rows.iter()
            .find(|r| &r.table == table && r.id == row_id)
            .map(|r| Value::Object(r.doc.clone()))
            .ok_or_else(|| row_not_found(row_id))
    }

    async fn list_rows(&self, table: &TableRef, queries: &[Query]) -> Result<RowList<Value>, RemoteError> {
        self.check_online()?;
        if let Some(q) = queries.iter().find(|q| q.method() != "equal") {
            return Err(RemoteError::from_response(400, &format!("unsupported query method {:?}", q.method())));
        }
        let rows = self.rows.lock().unwrap();
        let matched: Vec<Value> = rows
            .iter()
            .filter(|r| &r.table == table)
            .map(|r| Value::Object(r.doc.clone()))
            .filter(|doc| queries.iter().all(|q| q.matches(doc)))
            .collect();
        Ok(RowList { total: matched.len() as u64, rows: matched })
    }
}

/// File buckets. Preview handles use the `memory://{bucket}/{file}/preview` form.
#[derive(Default)]
pub struct MemoryStorage {
    files: Mutex<HashMap<(String, String), (StoredFile, Vec<u8>)>>,
    offline: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }

    pub fn set_offline(&self, offline: bool) { self.offline.store(offline, Ordering::SeqCst); }

    pub fn len(&self) -> usize { self.files.lock().unwrap().len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Dereference a preview handle. `None` once the file is gone.
    pub fn resolve(&self, url: &Url) -> Option<Vec<u8>> {
        if url.scheme() != "memory" {
            return None;
        }
        let bucket = url.host_str()?.to_string();
        let mut segments = url.path_segments()?;
        let file_id = segments.next()?.to_string();
        if segments.next() != Some("preview") {
            return None;
        }
        let files = self.files.lock().unwrap();
        files.get(&(bucket, file_id)).map(|(_, bytes)| bytes.clone())
    }

    fn check_online(&self) -> Result<(), RemoteError> {
        if self.offline.load(Ordering::SeqCst) { Err(offline_error()) } else { Ok(()) }
    }
}

#[async_trait]
impl StorageApi for MemoryStorage {
    async fn create_file(&self, bucket_id: &str, file_id: &str, upload: FileUpload) -> Result<StoredFile, RemoteError> {
        self.check_online()?;
        let key = (bucket_id.to_string(), file_id.to_string());
        let mut files = self.files.lock().unwrap();
        if files.contains_key(&key) {
            return Err(RemoteError::conflict(format!("file {file_id:?} already exists")));
        }
        let descriptor = StoredFile {
            id: file_id.to_string(),
            bucket_id: bucket_id.to_string(),
            name: upload.name,
            mime_type: upload.mime_type,
            size: upload.bytes.len() as u64,
            created_at: Some(Utc::now()),
        };
        files.insert(key, (descriptor.clone(), upload.bytes));
        Ok(descriptor)
    }

    async fn delete_file(&self, bucket_id: &str, file_id: &str) -> Result<(), RemoteError> {
        self.check_online()?;
        let mut files = self.files.lock().unwrap();
        files
            .remove(&(bucket_id.to_string(), file_id.to_string()))
            .map(|_| ())
            .ok_or_else(|| RemoteError::not_found(format!("file {file_id:?} not found")))
    }

    fn file_preview_url(&self, bucket_id: &str, file_id: &str) -> Result<Url, RemoteError> {
        let mut url = Url::parse(&format!("memory://{bucket_id}"))
            .map_err(|e| RemoteError::invalid(format!("bucket {bucket_id:?}: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| RemoteError::invalid("preview handle cannot carry a path"))?
            .clear()
            .push(file_id)
            .push("preview");
        Ok(url)
    }
}
