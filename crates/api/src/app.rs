//! Application assembly: router tree and shared service injection.

use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::extract::Extension;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{BoxError, Router};
use tower::timeout::TimeoutLayer;
use tower::ServiceBuilder;

use washline_infra::LifecycleEngine;

pub mod dto;
pub mod errors;
pub mod routes;

/// Per-request deadline. Hitting it drops the in-flight handler future, and
/// with it any pending storage statement; a statement commits atomically or
/// not at all, so a timed-out request never leaves a partial counter
/// increment or status write. Detached notification tasks are unaffected.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the full application router with the engine injected as an
/// extension. All routing below assumes a single-store deployment; there is
/// no tenant scoping.
pub fn build_app(engine: Arc<LifecycleEngine>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/orders", routes::orders::router())
        .nest("/customers", routes::customers::router())
        .nest("/admin", routes::admin::router())
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout))
                .layer(TimeoutLayer::new(REQUEST_TIMEOUT)),
        )
        .layer(Extension(engine))
}

async fn handle_timeout(err: BoxError) -> (StatusCode, String) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            "request timed out".to_string(),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("unhandled middleware error: {err}"),
        )
    }
}
