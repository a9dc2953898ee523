use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::errors::ServiceError;
use crate::services::purchase_orders::{
    PurchaseOrderResponse, UpdatePurchaseOrderStatusRequest,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
struct CreateFromOrdersRequest {
    order_ids: Option<Vec<i64>>,
    created_by: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/from-orders", post(create_from_orders))
        .route("/:id", get(get_purchase_order))
        .route("/:id/status", put(update_status))
}

async fn create_from_orders(
    State(state): State<AppState>,
    Json(payload): Json<CreateFromOrdersRequest>,
) -> Result<Json<Vec<PurchaseOrderResponse>>, ServiceError> {
    Ok(Json(
        state
            .services
            .purchase_orders
            .create_from_orders(payload.order_ids, payload.created_by)
            .await?,
    ))
}

async fn get_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PurchaseOrderResponse>, ServiceError> {
    Ok(Json(state.services.purchase_orders.get_purchase_order(id).await?))
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePurchaseOrderStatusRequest>,
) -> Result<Json<PurchaseOrderResponse>, ServiceError> {
    Ok(Json(
        state
            .services
            .purchase_orders
            .update_status(id, payload)
            .await?,
    ))
}
