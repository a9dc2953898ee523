use axum::{
    extract::{Path, State},
    routing::{post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::entities::{after_sales_case, refund_record};
use crate::errors::ServiceError;
use crate::services::after_sales::{
    CreateCaseRequest, RecordRefundRequest, UpdateCaseStatusRequest,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
struct LinkShipmentRequest {
    shipment_id: i64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_case))
        .route("/:id/status", put(update_status))
        .route("/:id/shipment", put(link_shipment))
        .route("/:id/refunds", post(record_refund))
}

async fn create_case(
    State(state): State<AppState>,
    Json(payload): Json<CreateCaseRequest>,
) -> Result<Json<after_sales_case::Model>, ServiceError> {
    Ok(Json(state.services.after_sales.create_case(payload).await?))
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCaseStatusRequest>,
) -> Result<Json<after_sales_case::Model>, ServiceError> {
    Ok(Json(state.services.after_sales.update_status(id, payload).await?))
}

async fn link_shipment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<LinkShipmentRequest>,
) -> Result<Json<after_sales_case::Model>, ServiceError> {
    Ok(Json(
        state
            .services
            .after_sales
            .link_shipment(id, payload.shipment_id)
            .await?,
    ))
}

async fn record_refund(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<RecordRefundRequest>,
) -> Result<Json<refund_record::Model>, ServiceError> {
    Ok(Json(state.services.after_sales.record_refund(id, payload).await?))
}
