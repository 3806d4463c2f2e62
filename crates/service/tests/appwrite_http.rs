//! Drives `RecordService` over the real REST client against an in-process
//! fake of the hosted backend.

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Multipart, Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use models::{FileUpload, NewPost, PostPatch, PostStatus};
use serde_json::{json, Value};
use service::{remote::RemoteErrorKind, DeleteOutcome, RecordService, ServiceError};
use tokio::net::TcpListener;

#[derive(Clone, Debug)]
struct Seen {
    method: String,
    path: String,
    query: Option<String>,
    project: Option<String>,
    key: Option<String>,
}

#[derive(Clone, Default)]
struct Fake {
    rows: Arc<Mutex<Vec<(String, Value)>>>,
    files: Arc<Mutex<HashMap<String, Value>>>,
    seen: Arc<Mutex<Vec<Seen>>>,
}

fn platform_error(status: StatusCode, message: &str, kind: &str) -> Response {
    let body = json!({ "message": message, "code": status.as_u16(), "type": kind, "version": "1.7.4" });
    (status, Json(body)).into_response()
}

fn header(req: &Request, name: &str) -> Option<String> {
    req.headers().get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}

async fn record(State(fake): State<Fake>, req: Request, next: Next) -> Response {
    let seen = Seen {
        method: req.method().to_string(),
        path: req.uri().path().to_string(),
        query: req.uri().query().map(str::to_string),
        project: header(&req, "x-appwrite-project"),
        key: header(&req, "x-appwrite-key"),
    };
    let project_ok = seen.project.as_deref() == Some("proj");
    fake.seen.lock().unwrap().push(seen);
    if !project_ok {
        return platform_error(StatusCode::UNAUTHORIZED, "Project is not accessible", "general_access_forbidden");
    }
    next.run(req).await
}

async fn create_row(State(fake): State<Fake>, Path((db, _table)): Path<(String, String)>, Json(body): Json<Value>) -> Response {
    if db == "broken" {
        return platform_error(StatusCode::INTERNAL_SERVER_ERROR, "Server Error", "general_unknown");
    }
    let id = body["rowId"].as_str().unwrap_or_default().to_string();
    let mut rows = fake.rows.lock().unwrap();
    if rows.iter().any(|(rid, _)| *rid == id) {
        return platform_error(StatusCode::CONFLICT, "Row with the requested ID already exists.", "row_already_exists");
    }
    let mut doc = body["data"].as_object().cloned().unwrap_or_default();
    doc.insert("$id".into(), json!(id));
    doc.insert("$createdAt".into(), json!("2025-01-01T00:00:00.000+00:00"));
    doc.insert("$updatedAt".into(), json!("2025-01-01T00:00:00.000+00:00"));
    rows.push((id, Value::Object(doc.clone())));
    (StatusCode::CREATED, Json(Value::Object(doc))).into_response()
}

fn row_missing() -> Response {
    platform_error(StatusCode::NOT_FOUND, "Row with the requested ID could not be found.", "row_not_found")
}

async fn get_row(State(fake): State<Fake>, Path((_db, _table, id)): Path<(String, String, String)>) -> Response {
    let rows = fake.rows.lock().unwrap();
    match rows.iter().find(|(rid, _)| *rid == id) {
        Some((_, doc)) => Json(doc.clone()).into_response(),
        None => row_missing(),
    }
}

async fn update_row(
    State(fake): State<Fake>,
    Path((_db, _table, id)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> Response {
    let mut rows = fake.rows.lock().unwrap();
    let Some((_, doc)) = rows.iter_mut().find(|(rid, _)| *rid == id) else {
        return row_missing();
    };
    if let (Some(target), Some(patch)) = (doc.as_object_mut(), body["data"].as_object()) {
        for (k, v) in patch {
            target.insert(k.clone(), v.clone());
        }
    }
    Json(doc.clone()).into_response()
}

async fn delete_row(State(fake): State<Fake>, Path((_db, _table, id)): Path<(String, String, String)>) -> Response {
    let mut rows = fake.rows.lock().unwrap();
    match rows.iter().position(|(rid, _)| *rid == id) {
        Some(idx) => {
            rows.remove(idx);
            StatusCode::NO_CONTENT.into_response()
        }
        None => row_missing(),
    }
}

async fn list_rows(State(fake): State<Fake>, Query(params): Query<Vec<(String, String)>>) -> Response {
    let queries: Vec<Value> = params
        .iter()
        .filter(|(k, _)| k == "queries[]")
        .filter_map(|(_, v)| serde_json::from_str(v).ok())
        .collect();
    let rows = fake.rows.lock().unwrap();
    let matched: Vec<Value> = rows
        .iter()
        .map(|(_, doc)| doc.clone())
        .filter(|doc| {
            queries.iter().all(|q| {
                let values = q["values"].as_array().cloned().unwrap_or_default();
                q["method"] == "equal" && q["attribute"].as_str().map_or(false, |a| values.contains(&doc[a]))
            })
        })
        .collect();
    Json(json!({ "total": matched.len(), "rows": matched })).into_response()
}

async fn create_file(State(fake): State<Fake>, Path(bucket): Path<String>, mut form: Multipart) -> Response {
    let mut file_id = String::new();
    let mut name = String::new();
    let mut mime = None;
    let mut size = 0usize;
    while let Ok(Some(field)) = form.next_field().await {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("fileId") => file_id = field.text().await.unwrap_or_default(),
            Some("file") => {
                name = field.file_name().unwrap_or_default().to_string();
                mime = field.content_type().map(str::to_string);
                size = field.bytes().await.map(|b| b.len()).unwrap_or_default();
            }
            _ => {}
        }
    }
    let descriptor = json!({
        "$id": file_id,
        "bucketId": bucket,
        "name": name,
        "mimeType": mime,
        "sizeOriginal": size,
        "$createdAt": "2025-01-01T00:00:00.000+00:00"
    });
    fake.files.lock().unwrap().insert(file_id, descriptor.clone());
    (StatusCode::CREATED, Json(descriptor)).into_response()
}

async fn delete_file(State(fake): State<Fake>, Path((_bucket, id)): Path<(String, String)>) -> Response {
    match fake.files.lock().unwrap().remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => platform_error(StatusCode::NOT_FOUND, "The requested file could not be found.", "storage_file_not_found"),
    }
}

fn router(fake: Fake) -> Router {
    Router::new()
        .route("/v1/tablesdb/:db/tables/:table/rows", post(create_row).get(list_rows))
        .route("/v1/tablesdb/:db/tables/:table/rows/:row", get(get_row).patch(update_row).delete(delete_row))
        .route("/v1/storage/buckets/:bucket/files", post(create_file))
        .route("/v1/storage/buckets/:bucket/files/:file", delete(delete_file))
        .layer(middleware::from_fn_with_state(fake.clone(), record))
        .with_state(fake)
}

async fn start_fake(fake: Fake) -> anyhow::Result<String> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let app = router(fake);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("fake backend error: {}", e);
        }
    });
    Ok(format!("http://{}:{}/v1", addr.ip(), addr.port()))
}

fn config(endpoint: &str, database_id: &str) -> configs::AppwriteConfig {
    configs::AppwriteConfig {
        endpoint: endpoint.to_string(),
        project_id: "proj".into(),
        database_id: database_id.into(),
        table_id: "posts".into(),
        bucket_id: "images".into(),
        api_key: Some("server-key".into()),
    }
}

fn hello() -> NewPost {
    NewPost {
        title: "Hello".into(),
        slug: "hello-world".into(),
        content: "...".into(),
        featured_image: None,
        status: PostStatus::Active,
        user_id: "u1".into(),
    }
}

#[tokio::test]
async fn post_lifecycle_over_rest() -> anyhow::Result<()> {
    let fake = Fake::default();
    let base = start_fake(fake.clone()).await?;
    let svc = RecordService::connect(&config(&base, "db"))?;

    let created = svc.create_post(hello()).await?;
    assert_eq!(created.slug, "hello-world");
    assert!(created.created_at.is_some());

    svc.create_post(NewPost { slug: "draft".into(), status: PostStatus::Inactive, ..hello() }).await?;

    let got = svc.get_post("hello-world").await?;
    assert_eq!((got.title.as_str(), got.content.as_str()), ("Hello", "..."));

    let updated = svc
        .update_post("hello-world", PostPatch { content: Some("more".into()), ..Default::default() })
        .await?;
    assert_eq!(updated.content, "more");
    assert_eq!(updated.title, "Hello");

    let page = svc.list_posts().await?;
    assert_eq!(page.total, 1);
    assert_eq!(page.rows[0].slug, "hello-world");

    assert_eq!(svc.delete_post("hello-world").await?, DeleteOutcome::Deleted);
    assert_eq!(svc.delete_post("hello-world").await?, DeleteOutcome::NotFound);
    assert!(svc.get_post("hello-world").await.unwrap_err().is_not_found());

    let seen = fake.seen.lock().unwrap().clone();
    assert!(seen.iter().all(|s| s.project.as_deref() == Some("proj")));
    assert!(seen.iter().all(|s| s.key.as_deref() == Some("server-key")));
    let list = seen.iter().find(|s| s.method == "GET" && s.path == "/v1/tablesdb/db/tables/posts/rows").unwrap();
    let query = list.query.as_deref().unwrap_or_default();
    assert!(query.starts_with("queries%5B%5D="), "{query}");
    let patch = seen.iter().find(|s| s.method == "PATCH").unwrap();
    assert_eq!(patch.path, "/v1/tablesdb/db/tables/posts/rows/hello-world");
    Ok(())
}

#[tokio::test]
async fn duplicate_slug_maps_to_conflict() -> anyhow::Result<()> {
    let base = start_fake(Fake::default()).await?;
    let svc = RecordService::connect(&config(&base, "db"))?;
    svc.create_post(hello()).await?;
    let err = svc.create_post(hello()).await.unwrap_err();
    assert!(err.is_conflict());
    let remote = err.remote().unwrap();
    assert_eq!(remote.status, Some(409));
    assert_eq!(remote.error_type.as_deref(), Some("row_already_exists"));
    Ok(())
}

#[tokio::test]
async fn server_failure_maps_to_server_kind() -> anyhow::Result<()> {
    let base = start_fake(Fake::default()).await?;
    let svc = RecordService::connect(&config(&base, "broken"))?;
    let err = svc.create_post(hello()).await.unwrap_err();
    assert!(matches!(err, ServiceError::Write(_)));
    assert_eq!(err.kind(), Some(RemoteErrorKind::Server));
    Ok(())
}

#[tokio::test]
async fn file_upload_uses_multipart_and_fresh_ids() -> anyhow::Result<()> {
    let fake = Fake::default();
    let base = start_fake(fake.clone()).await?;
    let svc = RecordService::connect(&config(&base, "db"))?;

    let upload = FileUpload::new("cover.png", vec![7u8; 10]).with_mime_type("image/png");
    let a = svc.upload_file(upload.clone()).await?;
    let b = svc.upload_file(upload).await?;
    assert_ne!(a.id, b.id);
    assert_eq!(a.name, "cover.png");
    assert_eq!(a.size, 10);
    assert_eq!(a.mime_type.as_deref(), Some("image/png"));
    assert!(fake.files.lock().unwrap().contains_key(&a.id));

    let url = svc.file_preview_url(&a.id)?;
    assert_eq!(url.as_str(), format!("{base}/storage/buckets/images/files/{}/preview?project=proj", a.id));

    assert_eq!(svc.delete_file(&a.id).await?, DeleteOutcome::Deleted);
    assert_eq!(svc.delete_file(&a.id).await?, DeleteOutcome::NotFound);
    Ok(())
}

#[tokio::test]
async fn unreachable_backend_is_transport_error() -> anyhow::Result<()> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
    let addr = listener.local_addr()?;
    drop(listener);
    let svc = RecordService::connect(&config(&format!("http://{addr}/v1"), "db"))?;

    let err = svc.list_posts().await.unwrap_err();
    assert!(matches!(err, ServiceError::Read(_)));
    assert_eq!(err.kind(), Some(RemoteErrorKind::Transport));

    let err = svc.delete_post("hello-world").await.unwrap_err();
    assert!(matches!(err, ServiceError::Delete(_)));
    Ok(())
}
