use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

/// A sourced item scraped from an overseas marketplace. Pricing override
/// columns are optional layers under the per-call and process-wide defaults.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub source_url: String,
    pub source_site: String,
    pub raw_title: String,
    pub raw_description: Option<String>,
    pub raw_price: Decimal,
    pub raw_currency: String,
    pub exchange_rate: Option<Decimal>,
    pub margin_rate: Option<Decimal>,
    pub vat_rate: Option<Decimal>,
    pub shipping_fee: Option<Decimal>,
    pub image_urls: Json,
    pub detail_image_urls: Json,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_option::Entity")]
    ProductOption,
    #[sea_orm(has_many = "super::product_localization::Entity")]
    ProductLocalization,
}

impl Related<super::product_option::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductOption.def()
    }
}

impl Related<super::product_localization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductLocalization.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            active_model.created_at = Set(now);
        }
        if let ActiveValue::NotSet = active_model.updated_at {
            active_model.updated_at = Set(Some(now));
        }

        Ok(active_model)
    }
}
