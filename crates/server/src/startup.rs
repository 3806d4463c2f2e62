use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::Router;
use configs::AppConfig;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::routes;
use service::RecordService;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, cfg.server.port).parse()?)
}

/// Connect the facade described by `cfg` and build the router around it.
pub fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let svc = Arc::new(RecordService::connect(&cfg.appwrite)?);
    let targets = svc.targets();
    info!(
        database = %targets.database_id,
        table = %targets.table_id,
        bucket = %targets.bucket_id,
        "record service constructed"
    );
    Ok(routes::build_router(svc, build_cors()))
}

/// Serve until `shutdown` resolves.
pub async fn run<F>(cfg: AppConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_app(&cfg)?;
    let addr = bind_addr(&cfg)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "http server listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    info!("http server stopped");
    Ok(())
}
