use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use washline_infra::LifecycleEngine;
use washline_orders::{OrderStatus, Rack};

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_order))
        .route("/previews/next-numbers", get(preview_next_numbers))
        .route("/:ticket", get(get_order).patch(update_order))
        .route("/:ticket/status", post(transition_status))
        .route("/:ticket/rack", post(assign_rack))
        .route("/:ticket/delivery", post(assign_delivery))
}

pub async fn create_order(
    Extension(engine): Extension<Arc<LifecycleEngine>>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    let draft = match body.into_draft() {
        Ok(d) => d,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match engine.create_order(draft).await {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(engine): Extension<Arc<LifecycleEngine>>,
    Path(ticket): Path<String>,
) -> axum::response::Response {
    match engine.get_order(&ticket).await {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn transition_status(
    Extension(engine): Extension<Arc<LifecycleEngine>>,
    Path(ticket): Path<String>,
    Json(body): Json<dto::TransitionRequest>,
) -> axum::response::Response {
    // Reject out-of-enumeration labels before anything touches storage.
    let status = match OrderStatus::parse(&body.status) {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match engine.transition(&ticket, status).await {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn assign_rack(
    Extension(engine): Extension<Arc<LifecycleEngine>>,
    Path(ticket): Path<String>,
    Json(body): Json<dto::AssignRackRequest>,
) -> axum::response::Response {
    let rack = match body.rack.as_deref().map(Rack::parse).transpose() {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match engine.assign_rack(&ticket, rack).await {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn assign_delivery(
    Extension(engine): Extension<Arc<LifecycleEngine>>,
    Path(ticket): Path<String>,
    Json(body): Json<dto::AssignDeliveryRequest>,
) -> axum::response::Response {
    match engine.assign_delivery(&ticket, body.assignee_id).await {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_order(
    Extension(engine): Extension<Arc<LifecycleEngine>>,
    Path(ticket): Path<String>,
    Json(body): Json<dto::UpdateOrderRequest>,
) -> axum::response::Response {
    if let Some(payment_status) = body.payment_status {
        if let Err(e) = engine.update_payment_status(&ticket, payment_status).await {
            return errors::domain_error_to_response(e);
        }
    }
    if let Some(notes) = body.notes {
        if let Err(e) = engine.update_notes(&ticket, Some(notes)).await {
            return errors::domain_error_to_response(e);
        }
    }

    match engine.get_order(&ticket).await {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    /// Scope date for the day-scoped counters; defaults to today.
    pub date: Option<NaiveDate>,
}

pub async fn preview_next_numbers(
    Extension(engine): Extension<Arc<LifecycleEngine>>,
    Query(query): Query<PreviewQuery>,
) -> axum::response::Response {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());

    match engine.preview_next_numbers(date).await {
        Ok((ticket_number, order_number)) => Json(serde_json::json!({
            "ticket_number": ticket_number,
            "order_number": order_number,
        }))
        .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
