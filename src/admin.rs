//! Health and admin HTTP surface — plain CRUD over profiles and orders.
//!
//! No business logic lives here; terminal order statuses are set through
//! these routes and nowhere else.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::Json;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::order::OrderStatus;
use crate::store::{Role, Store};

/// Shared state for the admin routes.
#[derive(Clone)]
pub struct AdminState {
    pub store: Arc<dyn Store>,
}

/// Build the health, read-only API, and admin CRUD routes.
pub fn admin_routes(state: AdminState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/orders", get(list_orders))
        .route("/api/orders/{identity}", get(customer_orders))
        .route("/api/shopkeeper/orders/{identity}", get(shopkeeper_orders))
        .route("/admin/profiles/{role}", get(list_profiles))
        .route("/admin/profiles/{role}/{identity}", delete(delete_profile))
        .route("/admin/orders/{id}", delete(delete_order))
        .route("/admin/orders/{id}/status", post(update_order_status))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn parse_role(role: &str) -> Option<Role> {
    match role {
        "customer" | "customers" => Some(Role::Customer),
        "shopkeeper" | "shopkeepers" => Some(Role::Shopkeeper),
        _ => None,
    }
}

fn error_json(status: StatusCode, message: &str) -> axum::response::Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// GET /health
async fn health(State(state): State<AdminState>) -> impl IntoResponse {
    match state.store.list_orders(1).await {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ok",
                "service": "kirana-relay",
                "database": "connected",
            })),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "error",
                "service": "kirana-relay",
                "database": "disconnected",
            })),
        ),
    }
}

/// GET /api/orders — most recent orders.
async fn list_orders(State(state): State<AdminState>) -> axum::response::Response {
    match state.store.list_orders(50).await {
        Ok(orders) => Json(serde_json::json!({
            "total": orders.len(),
            "orders": orders,
        }))
        .into_response(),
        Err(e) => error_json(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

/// GET /api/orders/{identity} — one customer's orders.
async fn customer_orders(
    State(state): State<AdminState>,
    Path(identity): Path<String>,
) -> axum::response::Response {
    match state.store.orders_for_customer(&identity).await {
        Ok(orders) => Json(serde_json::json!({
            "identity": identity,
            "total": orders.len(),
            "orders": orders,
        }))
        .into_response(),
        Err(e) => error_json(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

/// GET /api/shopkeeper/orders/{identity} — orders a shopkeeper was
/// notified about.
async fn shopkeeper_orders(
    State(state): State<AdminState>,
    Path(identity): Path<String>,
) -> axum::response::Response {
    match state.store.orders_for_recipient(&identity).await {
        Ok(orders) => Json(serde_json::json!({
            "identity": identity,
            "total": orders.len(),
            "orders": orders,
        }))
        .into_response(),
        Err(e) => error_json(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

/// GET /admin/profiles/{role}
async fn list_profiles(
    State(state): State<AdminState>,
    Path(role): Path<String>,
) -> axum::response::Response {
    let Some(role) = parse_role(&role) else {
        return error_json(StatusCode::BAD_REQUEST, "role must be customer or shopkeeper");
    };
    match state.store.list_profiles(role).await {
        Ok(profiles) => Json(serde_json::json!({
            "total": profiles.len(),
            "profiles": profiles,
        }))
        .into_response(),
        Err(e) => error_json(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

/// DELETE /admin/profiles/{role}/{identity}
async fn delete_profile(
    State(state): State<AdminState>,
    Path((role, identity)): Path<(String, String)>,
) -> axum::response::Response {
    let Some(role) = parse_role(&role) else {
        return error_json(StatusCode::BAD_REQUEST, "role must be customer or shopkeeper");
    };
    match state.store.delete_profile(role, &identity).await {
        Ok(true) => Json(serde_json::json!({
            "status": "deleted",
            "identity": identity,
        }))
        .into_response(),
        Ok(false) => error_json(StatusCode::NOT_FOUND, "no such profile"),
        Err(e) => error_json(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

/// DELETE /admin/orders/{id}
async fn delete_order(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> axum::response::Response {
    match state.store.delete_order(id).await {
        Ok(true) => Json(serde_json::json!({
            "status": "deleted",
            "order_id": id,
        }))
        .into_response(),
        Ok(false) => error_json(StatusCode::NOT_FOUND, "no such order"),
        Err(e) => error_json(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

#[derive(serde::Deserialize)]
struct StatusUpdate {
    status: String,
}

/// POST /admin/orders/{id}/status — the only place terminal statuses
/// are set.
async fn update_order_status(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
    Json(update): Json<StatusUpdate>,
) -> axum::response::Response {
    let Some(status) = OrderStatus::parse(&update.status) else {
        return error_json(StatusCode::BAD_REQUEST, "unknown status");
    };
    match state.store.update_order_status(id, status).await {
        Ok(true) => Json(serde_json::json!({
            "status": "updated",
            "order_id": id,
            "new_status": status,
        }))
        .into_response(),
        Ok(false) => error_json(StatusCode::NOT_FOUND, "no such order"),
        Err(e) => error_json(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}
