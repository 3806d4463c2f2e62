use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use models::{NewPost, Post, PostPatch, RowList};
use service::{
    remote::{StorageApi, TablesApi},
    DeleteOutcome,
};
use tracing::info;

use super::AppState;
use crate::errors::JsonApiError;

pub async fn list<T: TablesApi, S: StorageApi>(
    State(svc): State<AppState<T, S>>,
) -> Result<Json<RowList<Post>>, JsonApiError> {
    Ok(Json(svc.list_posts().await?))
}

pub async fn create<T: TablesApi, S: StorageApi>(
    State(svc): State<AppState<T, S>>,
    Json(input): Json<NewPost>,
) -> Result<(StatusCode, Json<Post>), JsonApiError> {
    info!(slug = %input.slug, "post_create_request");
    let post = svc.create_post(input).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get<T: TablesApi, S: StorageApi>(
    State(svc): State<AppState<T, S>>,
    Path(slug): Path<String>,
) -> Result<Json<Post>, JsonApiError> {
    Ok(Json(svc.get_post(&slug).await?))
}

pub async fn update<T: TablesApi, S: StorageApi>(
    State(svc): State<AppState<T, S>>,
    Path(slug): Path<String>,
    Json(patch): Json<PostPatch>,
) -> Result<Json<Post>, JsonApiError> {
    Ok(Json(svc.update_post(&slug, patch).await?))
}

pub async fn delete<T: TablesApi, S: StorageApi>(
    State(svc): State<AppState<T, S>>,
    Path(slug): Path<String>,
) -> Result<StatusCode, JsonApiError> {
    match svc.delete_post(&slug).await? {
        DeleteOutcome::Deleted => Ok(StatusCode::NO_CONTENT),
        DeleteOutcome::NotFound => Ok(StatusCode::NOT_FOUND),
    }
}
