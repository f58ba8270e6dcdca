//! Administrative escape hatches. These bypass the invariants the regular
//! routes protect (monotonic counters, never-deleted orders); deployments
//! are expected to fence this router off at the proxy layer.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, post},
    Json, Router,
};

use washline_infra::LifecycleEngine;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/counters/:key/reset", post(reset_counter))
        .route("/orders/:ticket", delete(delete_order))
}

pub async fn reset_counter(
    Extension(engine): Extension<Arc<LifecycleEngine>>,
    Path(key): Path<String>,
    Json(body): Json<dto::ResetCounterRequest>,
) -> axum::response::Response {
    match engine.reset_counter(&key, body.value).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_order(
    Extension(engine): Extension<Arc<LifecycleEngine>>,
    Path(ticket): Path<String>,
) -> axum::response::Response {
    match engine.delete_order(&ticket).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
