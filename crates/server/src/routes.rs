use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;
use service::{
    remote::{StorageApi, TablesApi},
    RecordService,
};

pub mod files;
pub mod pages;
pub mod posts;

/// Shared handler state: the facade built once at startup.
pub type AppState<T, S> = Arc<RecordService<T, S>>;

pub async fn health() -> Json<Health> {
    Json(Health::ok())
}

/// Build the full application router: HTML index, health and the JSON API.
pub fn build_router<T, S>(svc: AppState<T, S>, cors: CorsLayer) -> Router
where
    T: TablesApi + 'static,
    S: StorageApi + 'static,
{
    let api = Router::new()
        .route("/api/posts", get(posts::list::<T, S>).post(posts::create::<T, S>))
        .route(
            "/api/posts/:slug",
            get(posts::get::<T, S>).patch(posts::update::<T, S>).delete(posts::delete::<T, S>),
        )
        .route("/api/files", post(files::upload::<T, S>))
        .route("/api/files/:id", delete(files::delete::<T, S>))
        .route("/api/files/:id/preview", get(files::preview::<T, S>));

    Router::new()
        .route("/", get(pages::index::<T, S>))
        .route("/health", get(health))
        .merge(api)
        .with_state(svc)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
