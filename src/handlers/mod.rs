pub mod mandates;
pub mod transactions;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let store = match state.mandates.ping().await {
        Ok(()) => "connected",
        Err(_) => "disconnected",
    };

    let healthy = store == "connected";
    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = Json(json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "store": store,
    }));

    (status_code, body)
}
