use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::entities::shipment;
use crate::errors::ServiceError;
use crate::services::shipments::{CreateShipmentRequest, ShipmentResponse};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_shipment).get(list_shipments))
        .route("/:id", get(get_shipment))
}

async fn create_shipment(
    State(state): State<AppState>,
    Json(payload): Json<CreateShipmentRequest>,
) -> Result<Json<ShipmentResponse>, ServiceError> {
    Ok(Json(state.services.shipments.create_shipment(payload).await?))
}

async fn list_shipments(
    State(state): State<AppState>,
) -> Result<Json<Vec<shipment::Model>>, ServiceError> {
    Ok(Json(state.services.shipments.list_shipments().await?))
}

async fn get_shipment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ShipmentResponse>, ServiceError> {
    Ok(Json(state.services.shipments.get_shipment(id).await?))
}
