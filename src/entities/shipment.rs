use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A physical shipment, overseas or domestic, linked to orders through
/// `order_shipment_links`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shipments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub carrier_name: String,
    pub tracking_number: String,
    pub shipment_type: String,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub last_status: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_shipment_link::Entity")]
    OrderShipmentLink,
}

impl Related<super::order_shipment_link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderShipmentLink.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
