//! Listener on the app port. The sidecar probes it and asks it for
//! subscriptions; these processes only publish, so the list is empty.

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

pub fn app_router() -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/dapr/subscribe", get(subscriptions))
}

async fn health() -> &'static str {
    "OK"
}

async fn subscriptions() -> Json<Value> {
    Json(json!([]))
}
