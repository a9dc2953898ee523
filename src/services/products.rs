use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::db::DbPool;
use crate::entities::{product, product_localization, product_option};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateProductOptionRequest {
    #[validate(length(min = 1, message = "Option key is required"))]
    pub option_key: String,
    #[validate(length(min = 1, message = "Option name is required"))]
    pub raw_name: String,
    #[serde(default)]
    pub raw_price_diff: Decimal,
    pub localized_name: Option<String>,
}

/// Intake payload for a scraped product. The scraping client itself lives
/// outside this service; it posts its results here.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "Source URL is required"))]
    pub source_url: String,
    #[validate(length(min = 1, message = "Source site is required"))]
    pub source_site: String,
    #[validate(length(min = 1, message = "Title is required"))]
    pub raw_title: String,
    pub raw_description: Option<String>,
    pub raw_price: Decimal,
    #[validate(length(min = 1, max = 10, message = "Currency is required"))]
    pub raw_currency: String,
    pub exchange_rate: Option<Decimal>,
    pub margin_rate: Option<Decimal>,
    pub vat_rate: Option<Decimal>,
    pub shipping_fee: Option<Decimal>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub detail_image_urls: Vec<String>,
    #[serde(default)]
    pub options: Vec<CreateProductOptionRequest>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpsertLocalizationRequest {
    #[validate(length(min = 2, max = 10, message = "Locale is required"))]
    pub locale: String,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub description: Option<String>,
    pub option_display_name_format: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductResponse {
    #[serde(flatten)]
    pub product: product::Model,
    pub options: Vec<product_option::Model>,
    pub localizations: Vec<product_localization::Model>,
}

/// Service for managing sourced products and their localizations.
#[derive(Clone)]
pub struct ProductService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl ProductService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a product with its options in one transaction.
    #[instrument(skip(self, request), fields(source_site = %request.source_site))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        request.validate()?;
        for option in &request.options {
            option.validate()?;
        }

        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let product = product::ActiveModel {
            source_url: Set(request.source_url),
            source_site: Set(request.source_site),
            raw_title: Set(request.raw_title),
            raw_description: Set(request.raw_description),
            raw_price: Set(request.raw_price),
            raw_currency: Set(request.raw_currency),
            exchange_rate: Set(request.exchange_rate),
            margin_rate: Set(request.margin_rate),
            vat_rate: Set(request.vat_rate),
            shipping_fee: Set(request.shipping_fee),
            image_urls: Set(serde_json::json!(request.image_urls)),
            detail_image_urls: Set(serde_json::json!(request.detail_image_urls)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for option in request.options {
            product_option::ActiveModel {
                product_id: Set(product.id),
                option_key: Set(option.option_key),
                raw_name: Set(option.raw_name),
                raw_price_diff: Set(option.raw_price_diff),
                localized_name: Set(option.localized_name),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;
        info!(product_id = product.id, "Product created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::ProductCreated(product.id)).await {
                warn!(error = %e, product_id = product.id, "Failed to send product created event");
            }
        }

        self.load_response(product).await
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: i64) -> Result<ProductResponse, ServiceError> {
        let db = &*self.db_pool;
        let product = product::Entity::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;
        self.load_response(product).await
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<product::Model>, ServiceError> {
        let db = &*self.db_pool;
        Ok(product::Entity::find()
            .order_by_asc(product::Column::Id)
            .all(db)
            .await?)
    }

    /// Creates or updates the localization row for (product, locale). At
    /// most one row exists per pair; repeated calls update in place.
    #[instrument(skip(self, request), fields(locale = %request.locale))]
    pub async fn upsert_localization(
        &self,
        product_id: i64,
        request: UpsertLocalizationRequest,
    ) -> Result<ProductResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let product = product::Entity::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

        let existing = product_localization::Entity::find()
            .filter(product_localization::Column::ProductId.eq(product_id))
            .filter(product_localization::Column::Locale.eq(request.locale.clone()))
            .one(db)
            .await?;

        match existing {
            Some(row) => {
                let mut active: product_localization::ActiveModel = row.into();
                active.title = Set(request.title);
                active.description = Set(request.description);
                active.option_display_name_format = Set(request.option_display_name_format);
                active.update(db).await?;
            }
            None => {
                product_localization::ActiveModel {
                    product_id: Set(product_id),
                    locale: Set(request.locale.clone()),
                    title: Set(request.title),
                    description: Set(request.description),
                    option_display_name_format: Set(request.option_display_name_format),
                    ..Default::default()
                }
                .insert(db)
                .await?;
            }
        }

        info!(product_id, locale = %request.locale, "Localization upserted");

        if let Some(event_sender) = &self.event_sender {
            let event = Event::ProductLocalized {
                product_id,
                locale: request.locale,
            };
            if let Err(e) = event_sender.send(event).await {
                warn!(error = %e, product_id, "Failed to send localization event");
            }
        }

        self.load_response(product).await
    }

    async fn load_response(&self, product: product::Model) -> Result<ProductResponse, ServiceError> {
        let db = &*self.db_pool;
        let options = product_option::Entity::find()
            .filter(product_option::Column::ProductId.eq(product.id))
            .order_by_asc(product_option::Column::Id)
            .all(db)
            .await?;
        let localizations = product_localization::Entity::find()
            .filter(product_localization::Column::ProductId.eq(product.id))
            .order_by_asc(product_localization::Column::Id)
            .all(db)
            .await?;

        Ok(ProductResponse {
            product,
            options,
            localizations,
        })
    }
}
