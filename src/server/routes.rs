// src/server/routes.rs

//! Request handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::Category;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct WishlistBody {
    pub title: String,
}

/// `POST /auth`: check a credential pair against the user store.
/// A missing or malformed body is unauthenticated, not a client error.
pub async fn auth(
    State(state): State<Arc<AppState>>,
    body: Option<Json<Credentials>>,
) -> Response {
    log::info!("authenticating...");
    let Some(Json(body)) = body else {
        log::info!("unauthenticated.");
        return (StatusCode::UNAUTHORIZED, Json(serde_json::json!({}))).into_response();
    };
    match state.store.authenticate(&body.username, &body.password).await {
        Some(user_id) => {
            log::info!("authenticated!");
            Json(serde_json::json!({ "userId": user_id })).into_response()
        }
        None => {
            log::info!("unauthenticated.");
            (StatusCode::UNAUTHORIZED, Json(serde_json::json!({}))).into_response()
        }
    }
}

/// `GET /available-now`: run an available-now cycle on demand.
pub async fn available_now(State(state): State<Arc<AppState>>) -> Response {
    run_cycle(&state, Category::AvailableNow).await
}

/// `GET /on-order`: run an on-order cycle on demand.
pub async fn on_order(State(state): State<Arc<AppState>>) -> Response {
    run_cycle(&state, Category::OnOrder).await
}

async fn run_cycle(state: &AppState, category: Category) -> Response {
    match state.engine.run_cycle(category).await {
        Ok(alerts) if alerts.is_empty() => {
            format!("No new titles {}.", category).into_response()
        }
        Ok(alerts) => Json(alerts).into_response(),
        Err(e) => {
            log::error!("{} cycle failed: {}", category, e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// `GET /all-best-sellers`: current available-now store contents.
pub async fn all_best_sellers(State(state): State<Arc<AppState>>) -> Response {
    Json(state.store.items_by_category(Category::AvailableNow).await).into_response()
}

/// `GET /all-on-order`: current on-order store contents.
pub async fn all_on_order(State(state): State<Arc<AppState>>) -> Response {
    Json(state.store.items_by_category(Category::OnOrder).await).into_response()
}

/// `GET /wish-list`
pub async fn get_wishlist(State(state): State<Arc<AppState>>) -> Response {
    log::info!("sending wish list.");
    Json(state.store.wishlist().await).into_response()
}

/// `POST /wish-list`: append a phrase, return the new list.
pub async fn add_wishlist(
    State(state): State<Arc<AppState>>,
    Json(body): Json<WishlistBody>,
) -> Response {
    match state.store.add_wishlist_entry(&body.title).await {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => internal_error(e),
    }
}

/// `DELETE /wish-list`: remove a phrase; 404 enumerates current entries.
pub async fn remove_wishlist(
    State(state): State<Arc<AppState>>,
    Json(body): Json<WishlistBody>,
) -> Response {
    match state.store.remove_wishlist_entry(&body.title).await {
        Ok(entries) => Json(entries).into_response(),
        Err(e @ AppError::WishlistNotFound { .. }) => {
            (StatusCode::NOT_FOUND, e.to_string()).into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// Fallback for unmatched routes.
pub async fn not_found() -> Response {
    log::info!("Endpoint not found.");
    (StatusCode::NOT_FOUND, "Endpoint not found.").into_response()
}

fn internal_error(e: AppError) -> Response {
    log::error!("{}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
}
