// Server module - HTTP endpoint serving the log file as a download

use crate::error::{DblogError, Result};
use crate::logs::LogDownload;
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Route of the download endpoint
pub const DOWNLOAD_ROUTE: &str = "/admin/reports/dblog-file/download";

/// Shared state of the download server
#[derive(Debug, Clone)]
pub struct ServerState {
    log_path: PathBuf,
}

impl ServerState {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }
}

/// Build the router exposing the download and health endpoints
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route(DOWNLOAD_ROUTE, get(download))
        .route("/healthz", get(healthz))
        .with_state(Arc::new(state))
}

/// Serve until ctrl-c
pub async fn serve(addr: SocketAddr, state: ServerState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| DblogError::ServerError(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!(%addr, route = DOWNLOAD_ROUTE, "Download server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down download server");
        })
        .await
        .map_err(|e| DblogError::ServerError(e.to_string()))
}

async fn download(State(state): State<Arc<ServerState>>) -> Response {
    match LogDownload::load(&state.log_path).await {
        Ok(download) => {
            let disposition = HeaderValue::from_str(&download.content_disposition())
                .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
            let headers = [
                (header::CONTENT_TYPE, HeaderValue::from_static(download.content_type())),
                (header::CONTENT_DISPOSITION, disposition),
                (header::CONTENT_LENGTH, HeaderValue::from(download.content_length())),
            ];
            (StatusCode::OK, headers, download.into_body()).into_response()
        }
        Err(DblogError::FileNotFound(path)) => {
            tracing::debug!(path = %path.display(), "Log file requested but not found");
            (StatusCode::NOT_FOUND, "File not found.").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Log file could not be read");
            (StatusCode::NOT_FOUND, "Cannot read file.").into_response()
        }
    }
}

async fn healthz() -> &'static str {
    "ok"
}
