use rust_decimal::prelude::*;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One purchase-order line, keyed by the (product, option) grouping. The unit
/// cost comes from the first contributing order item, not an average.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_order_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub purchase_order_id: i64,
    pub product_id: i64,
    pub product_option_id: Option<i64>,
    pub sku: Option<String>,
    pub unit_cost: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::purchase_order::Entity",
        from = "Column::PurchaseOrderId",
        to = "super::purchase_order::Column::Id"
    )]
    PurchaseOrder,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(has_many = "super::purchase_order_source_link::Entity")]
    PurchaseOrderSourceLink,
}

impl Related<super::purchase_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrder.def()
    }
}

impl Related<super::purchase_order_source_link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrderSourceLink.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
