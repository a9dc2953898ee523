use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Audit row tying a purchase-order line back to one contributing order item
/// and the quantity it contributed. Enables per-item reconciliation even
/// though the line's unit cost is taken from a single representative item.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_order_source_links")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub purchase_order_item_id: i64,
    pub order_id: i64,
    pub order_item_id: i64,
    pub source_quantity: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::purchase_order_item::Entity",
        from = "Column::PurchaseOrderItemId",
        to = "super::purchase_order_item::Column::Id"
    )]
    PurchaseOrderItem,
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    #[sea_orm(
        belongs_to = "super::order_item::Entity",
        from = "Column::OrderItemId",
        to = "super::order_item::Column::Id"
    )]
    OrderItem,
}

impl Related<super::purchase_order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrderItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
