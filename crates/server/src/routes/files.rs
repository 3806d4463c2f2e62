use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use models::{FileUpload, StoredFile};
use serde::{Deserialize, Serialize};
use service::{
    remote::{StorageApi, TablesApi},
    DeleteOutcome,
};

use super::AppState;
use crate::errors::JsonApiError;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PreviewUrl {
    pub url: String,
}

/// Raw-body upload: `POST /api/files?name=cover.png` with the file as the body.
pub async fn upload<T: TablesApi, S: StorageApi>(
    State(svc): State<AppState<T, S>>,
    Query(q): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<StoredFile>), JsonApiError> {
    let mut upload = FileUpload::new(q.name.unwrap_or_default(), body.to_vec());
    if let Some(mime) = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
        upload = upload.with_mime_type(mime);
    }
    let file = svc.upload_file(upload).await?;
    Ok((StatusCode::CREATED, Json(file)))
}

pub async fn delete<T: TablesApi, S: StorageApi>(
    State(svc): State<AppState<T, S>>,
    Path(id): Path<String>,
) -> Result<StatusCode, JsonApiError> {
    match svc.delete_file(&id).await? {
        DeleteOutcome::Deleted => Ok(StatusCode::NO_CONTENT),
        DeleteOutcome::NotFound => Ok(StatusCode::NOT_FOUND),
    }
}

pub async fn preview<T: TablesApi, S: StorageApi>(
    State(svc): State<AppState<T, S>>,
    Path(id): Path<String>,
) -> Result<Json<PreviewUrl>, JsonApiError> {
    let url = svc.file_preview_url(&id)?;
    Ok(Json(PreviewUrl { url: url.to_string() }))
}
