//! HTTP transport.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/serveFaqs` | Keyword lookup (`req=getFaqs` / `req=demo`) or feedback (`feedback`) |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! `/serveFaqs` always answers with HTML: a result page, an error page, or an
//! empty body acknowledging feedback. Query parameters are passed through as
//! an [`IncomingParameters`] bag; repeated keys keep every value.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the lookup form can be
//! hosted on a different origin.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::assemble::ResponseAssembler;
use crate::audit::{AuditSink, FileAuditLog, TracingAuditLog};
use crate::config::Config;
use crate::db;
use crate::handler::RequestHandler;
use crate::lookup::FaqLookupService;
use crate::models::IncomingParameters;
use crate::render::HtmlRenderer;
use crate::store::SqliteArchive;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    handler: Arc<RequestHandler>,
}

/// Wires the archive pool, audit sink and page layout described by `config`
/// into a [`RequestHandler`].
pub async fn build_handler(config: &Config) -> anyhow::Result<RequestHandler> {
    let pool = db::connect(config).await?;
    let store = Arc::new(SqliteArchive::new(pool));

    let audit: Arc<dyn AuditSink> = match &config.audit.path {
        Some(path) => {
            let log = FileAuditLog::open(path).await?;
            tracing::info!(path = %log.path().display(), "writing audit log");
            Arc::new(log)
        }
        None => Arc::new(TracingAuditLog),
    };

    let layout = Arc::new(HtmlRenderer::new(config.contact.clone()));
    Ok(RequestHandler::new(
        FaqLookupService::new(store, config.lookup.query_timeout()),
        ResponseAssembler::new(layout),
        audit,
    ))
}

/// Builds the router around an already wired handler.
pub fn router(handler: Arc<RequestHandler>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/serveFaqs", get(handle_serve_faqs))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState { handler })
}

/// Starts the HTTP server.
///
/// Binds to `[server].bind` and serves until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let handler = Arc::new(build_handler(config).await?);
    let app = router(handler);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!("forum archive server listening on http://{}", config.server.bind);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ GET /serveFaqs ============

async fn handle_serve_faqs(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let params = IncomingParameters::from_pairs(pairs);
    let resp = state.handler.handle(params).await;
    let status = StatusCode::from_u16(resp.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Html(resp.body)).into_response()
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: String,
    /// The crate version from `Cargo.toml`.
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
