//! Router assembly.
//!
//! Resource paths are parameterized; handlers resolve the concrete resource
//! from the registry and enforce its verb policy, so one route pair serves all
//! four collections.

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::handlers::{create, delete_collection, list, patch_item, read};
use crate::state::AppState;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route(
            "/:resource",
            get(list).post(create).delete(delete_collection),
        )
        .route("/:resource/:id", get(read).patch(patch_item))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
