use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::entities::order::{self, OrderStatus};
use crate::errors::ServiceError;
use crate::services::orders::{CreateOrderRequest, OrderResponse, UpdateOrderStatusRequest};
use crate::AppState;

#[derive(Debug, Deserialize)]
struct ListOrdersQuery {
    status: Option<OrderStatus>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/:id", get(get_order))
        .route("/:id/status", put(update_status))
}

async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<OrderResponse>, ServiceError> {
    Ok(Json(state.services.orders.create_order(payload).await?))
}

async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<order::Model>>, ServiceError> {
    Ok(Json(state.services.orders.list_orders(query.status).await?))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, ServiceError> {
    Ok(Json(state.services.orders.get_order(id).await?))
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> Result<Json<OrderResponse>, ServiceError> {
    Ok(Json(state.services.orders.update_status(id, payload).await?))
}
