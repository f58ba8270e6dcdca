use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use washline_core::PhoneNumber;
use washline_infra::LifecycleEngine;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(register_customer))
        .route("/previews/next-id", get(preview_next_id))
        .route("/:phone", get(get_customer))
}

pub async fn register_customer(
    Extension(engine): Extension<Arc<LifecycleEngine>>,
    Json(body): Json<dto::RegisterCustomerRequest>,
) -> axum::response::Response {
    let draft = match body.into_draft() {
        Ok(d) => d,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match engine.register_customer(draft).await {
        Ok(customer) => (StatusCode::CREATED, Json(customer)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_customer(
    Extension(engine): Extension<Arc<LifecycleEngine>>,
    Path(phone): Path<String>,
) -> axum::response::Response {
    let phone = match PhoneNumber::parse(&phone) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match engine.get_customer(&phone).await {
        Ok(customer) => Json(customer).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn preview_next_id(
    Extension(engine): Extension<Arc<LifecycleEngine>>,
) -> axum::response::Response {
    match engine.preview_next_customer_id().await {
        Ok(customer_id) => {
            Json(serde_json::json!({ "customer_id": customer_id })).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}
