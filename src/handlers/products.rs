use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};

use crate::entities::product;
use crate::errors::ServiceError;
use crate::services::products::{
    CreateProductRequest, ProductResponse, UpsertLocalizationRequest,
};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/import", post(import_product))
        .route("/", get(list_products))
        .route("/:id", get(get_product))
        .route("/:id/localization", put(upsert_localization))
}

async fn import_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<Json<ProductResponse>, ServiceError> {
    let product = state.services.products.create_product(payload).await?;
    Ok(Json(product))
}

async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<product::Model>>, ServiceError> {
    Ok(Json(state.services.products.list_products().await?))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProductResponse>, ServiceError> {
    Ok(Json(state.services.products.get_product(id).await?))
}

async fn upsert_localization(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpsertLocalizationRequest>,
) -> Result<Json<ProductResponse>, ServiceError> {
    Ok(Json(
        state
            .services
            .products
            .upsert_localization(id, payload)
            .await?,
    ))
}
