//! HTTP surface of the sync server

use std::future::Future;
use std::path::Path as FsPath;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde_json::Value;
use tokio::net::TcpListener;

use dirsync_core::{DeleteRequest, ServerConfig, SyncItem};

use crate::{AppError, Error, Result, SyncService};

type Reply = std::result::Result<StatusCode, AppError>;

/// Build the router over `service`.
pub fn router(service: SyncService) -> Router {
    Router::new()
        .route("/health", get(health))
        // `exists/{hash}` shadows the catch-all for every verb, so the other
        // verbs are forwarded to the item handlers.
        .route(
            "/sync/exists/{hash}",
            get(exists)
                .post(create_exists)
                .put(update_exists)
                .delete(delete_exists),
        )
        .route("/sync/{*path}", post(create).put(update).delete(delete))
        // Whole files travel base64-encoded in one body.
        .layer(DefaultBodyLimit::disable())
        .with_state(service)
}

/// Serve `root` on the configured address until ctrl-c.
pub async fn serve(root: &FsPath, config: &ServerConfig) -> Result<()> {
    let service = SyncService::open(root, config)?;
    let listener = TcpListener::bind(&config.bind)
        .await
        .map_err(|source| Error::Bind {
            addr: config.bind.clone(),
            source,
        })?;

    tracing::info!(root = %root.display(), addr = %config.bind, "Sync server listening");
    serve_with_shutdown(listener, service, async {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, shutting down");
        }
    })
    .await
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    service: SyncService,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(Error::Serve)
}

async fn health() -> &'static str {
    "ok"
}

async fn exists(State(service): State<SyncService>, Path(hash): Path<String>) -> Reply {
    if service.exists(&hash).await? {
        Ok(StatusCode::OK)
    } else {
        Ok(StatusCode::NO_CONTENT)
    }
}

fn parse_body(body: &[u8]) -> Result<Value> {
    serde_json::from_slice(body)
        .map_err(|e| Error::validation(format!("malformed JSON body: {e}")))
}

async fn apply(service: &SyncService, path: &str, body: &[u8], update: bool) -> Reply {
    let item = SyncItem::from_value(parse_body(body)?).map_err(Error::from)?;
    service.apply(path, item, update).await?;
    Ok(StatusCode::OK)
}

async fn remove(service: &SyncService, path: &str, body: &[u8]) -> Reply {
    let request = DeleteRequest::from_value(&parse_body(body)?).map_err(Error::from)?;
    service.delete(path, request).await?;
    Ok(StatusCode::OK)
}

async fn create(
    State(service): State<SyncService>,
    Path(path): Path<String>,
    body: Bytes,
) -> Reply {
    apply(&service, &path, &body, false).await
}

async fn update(
    State(service): State<SyncService>,
    Path(path): Path<String>,
    body: Bytes,
) -> Reply {
    apply(&service, &path, &body, true).await
}

async fn delete(
    State(service): State<SyncService>,
    Path(path): Path<String>,
    body: Bytes,
) -> Reply {
    remove(&service, &path, &body).await
}

async fn create_exists(
    State(service): State<SyncService>,
    Path(hash): Path<String>,
    body: Bytes,
) -> Reply {
    apply(&service, &format!("exists/{hash}"), &body, false).await
}

async fn update_exists(
    State(service): State<SyncService>,
    Path(hash): Path<String>,
    body: Bytes,
) -> Reply {
    apply(&service, &format!("exists/{hash}"), &body, true).await
}

async fn delete_exists(
    State(service): State<SyncService>,
    Path(hash): Path<String>,
    body: Bytes,
) -> Reply {
    remove(&service, &format!("exists/{hash}"), &body).await
}
