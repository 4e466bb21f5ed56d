//! JSON HTTP surface of the admin service.
//!
//! # Routes
//!
//! - `GET  /health`
//! - `GET|POST /api/translations`, `GET|PATCH|DELETE /api/translations/{id}`
//! - `POST /api/translations/{id}/translate`
//! - `GET  /api/categories`, `GET /api/stats`
//! - `POST /api/sync`, `POST /api/batch-translate`, `POST /api/translate`
//! - `GET  /api/export`, `POST /api/import`
//! - `GET|PUT /api/settings`

mod error;
mod handlers;

use axum::Router;
use axum::routing::{
    get,
    post,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

use crate::service::AdminService;

/// Builds the router with every admin route.
pub fn router(service: AdminService) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/translations",
            get(handlers::list_translations).post(handlers::create_translation),
        )
        .route(
            "/api/translations/{id}",
            get(handlers::get_translation)
                .patch(handlers::update_translation)
                .delete(handlers::delete_translation),
        )
        .route("/api/translations/{id}/translate", post(handlers::translate_translation))
        .route("/api/categories", get(handlers::categories))
        .route("/api/stats", get(handlers::stats))
        .route("/api/sync", post(handlers::sync))
        .route("/api/batch-translate", post(handlers::batch_translate))
        .route("/api/translate", post(handlers::preview))
        .route("/api/export", get(handlers::export))
        .route("/api/import", post(handlers::import))
        .route("/api/settings", get(handlers::get_settings).put(handlers::put_settings))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}

/// Serves the admin API until the process is stopped.
///
/// # Errors
/// I/O errors from binding or accepting connections.
pub async fn serve(service: AdminService, bind: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    tracing::info!("Admin API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(service)).await
}
