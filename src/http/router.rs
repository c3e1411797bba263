// HTTP router.
//
// Returns a composable `Router` with the export service as state. The
// `/api/...` paths serve the older front-end and answer in its response shapes.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use super::handlers;
use crate::core::export::{DocumentRenderer, DocumentStore, ExportService, SpreadsheetReader};

pub fn build_router<R, S, W>(service: Arc<ExportService<R, S, W>>) -> Router
where
    R: SpreadsheetReader + 'static,
    S: DocumentStore + 'static,
    W: DocumentRenderer + 'static,
{
    Router::new()
        .route("/health", get(handlers::health))
        .route("/columns", post(handlers::columns::<R, S, W>))
        .route("/export", post(handlers::export::<R, S, W>))
        .route("/api/obter_colunas", post(handlers::legacy_columns::<R, S, W>))
        .route("/api/processar", post(handlers::legacy_export::<R, S, W>))
        .layer(CorsLayer::permissive())
        .with_state(service)
}
