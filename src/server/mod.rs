//! HTTP surface for the watcher.
//!
//! Routes mirror the flat JSON document: cycle triggers, read-only listing
//! dumps, wishlist management, and credential checks.

mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::error::Result;
use crate::storage::CatalogStore;
use crate::sync::SyncEngine;

/// Shared state handed to every handler.
pub struct AppState {
    pub store: Arc<CatalogStore>,
    pub engine: Arc<SyncEngine>,
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth", post(routes::auth))
        .route("/available-now", get(routes::available_now))
        .route("/on-order", get(routes::on_order))
        .route("/all-best-sellers", get(routes::all_best_sellers))
        .route("/all-on-order", get(routes::all_on_order))
        .route(
            "/wish-list",
            get(routes::get_wishlist)
                .post(routes::add_wishlist)
                .delete(routes::remove_wishlist),
        )
        .fallback(routes::not_found)
        .with_state(state)
}

/// Serve the router until the process is terminated.
pub async fn serve(state: Arc<AppState>, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("server listening at http://localhost:{}", port);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
