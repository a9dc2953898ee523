use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::db::DbPool;
use crate::entities::order::{self, OrderStatus};
use crate::entities::purchase_order::{self, PurchaseOrderStatus};
use crate::entities::{
    order_item, purchase_order_item, purchase_order_source_link, purchase_order_status_history,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::orders::transition_order_status;

const DEFAULT_SUPPLIER: &str = "TAOBAO_DEFAULT";
const DEFAULT_CURRENCY: &str = "CNY";
const AGGREGATION_REASON: &str = "Aggregated into purchase order";

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdatePurchaseOrderStatusRequest {
    pub new_status: PurchaseOrderStatus,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PurchaseOrderItemResponse {
    pub id: i64,
    pub product_id: i64,
    pub product_option_id: Option<i64>,
    pub quantity: i32,
    pub unit_cost: Decimal,
    pub line_total: Decimal,
    pub source_links: Vec<purchase_order_source_link::Model>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PurchaseOrderResponse {
    pub id: i64,
    pub supplier_name: String,
    pub status: PurchaseOrderStatus,
    pub currency: String,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub items: Vec<PurchaseOrderItemResponse>,
    pub status_history: Vec<purchase_order_status_history::Model>,
}

/// Service aggregating open orders into supplier purchase orders.
#[derive(Clone)]
pub struct PurchaseOrderService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl PurchaseOrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Aggregates NEW orders (optionally restricted to `order_ids`) into one
    /// purchase order, grouping line items by (product, option).
    ///
    /// Per group the quantity is the sum of the contributing items and the
    /// unit cost comes from the first contributing item; each contributing
    /// item gets its own source link for reconciliation. Every aggregated
    /// order flips to PENDING_PURCHASE with a history row. All of this is a
    /// single transaction. With no eligible orders nothing is written and an
    /// empty list is returned.
    ///
    /// Callers must serialize invocations over the same order set; there is
    /// no lock around the read-then-aggregate sequence.
    #[instrument(skip(self))]
    pub async fn create_from_orders(
        &self,
        order_ids: Option<Vec<i64>>,
        created_by: Option<String>,
    ) -> Result<Vec<PurchaseOrderResponse>, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let mut query = order::Entity::find()
            .filter(order::Column::Status.eq(OrderStatus::New))
            .order_by_asc(order::Column::Id);
        if let Some(ids) = order_ids.as_ref().filter(|ids| !ids.is_empty()) {
            query = query.filter(order::Column::Id.is_in(ids.clone()));
        }
        let orders = query.all(&txn).await?;

        if orders.is_empty() {
            info!("No eligible orders; no purchase order created");
            return Ok(Vec::new());
        }

        // Group items by (product, option), preserving first-seen order.
        let mut group_keys: Vec<(i64, Option<i64>)> = Vec::new();
        let mut groups: HashMap<(i64, Option<i64>), Vec<order_item::Model>> = HashMap::new();
        for order in &orders {
            let items = order_item::Entity::find()
                .filter(order_item::Column::OrderId.eq(order.id))
                .order_by_asc(order_item::Column::Id)
                .all(&txn)
                .await?;
            for item in items {
                let key = (item.product_id, item.product_option_id);
                if !groups.contains_key(&key) {
                    group_keys.push(key);
                }
                groups.entry(key).or_default().push(item);
            }
        }

        let purchase_order = purchase_order::ActiveModel {
            supplier_name: Set(DEFAULT_SUPPLIER.to_string()),
            status: Set(PurchaseOrderStatus::Created),
            currency: Set(DEFAULT_CURRENCY.to_string()),
            total_amount: Set(Decimal::ZERO),
            expected_arrival_date: Set(None),
            snapshot_json: Set(None),
            created_by: Set(created_by),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        purchase_order_status_history::ActiveModel {
            purchase_order_id: Set(purchase_order.id),
            previous_status: Set(None),
            new_status: Set(PurchaseOrderStatus::Created),
            changed_at: Set(Utc::now()),
            reason: Set(Some("Purchase order created".to_string())),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut total_amount = Decimal::ZERO;
        let mut item_responses = Vec::with_capacity(group_keys.len());
        for key in &group_keys {
            let items = &groups[key];
            let quantity: i32 = items.iter().map(|i| i.quantity).sum();
            // First-item-wins: the unit cost is not averaged across orders.
            let unit_cost = items[0].unit_price_krw;
            let line_total = unit_cost * Decimal::from(quantity);

            let po_item = purchase_order_item::ActiveModel {
                purchase_order_id: Set(purchase_order.id),
                product_id: Set(key.0),
                product_option_id: Set(key.1),
                sku: Set(None),
                unit_cost: Set(unit_cost),
                quantity: Set(quantity),
                line_total: Set(line_total),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            total_amount += line_total;

            let mut source_links = Vec::with_capacity(items.len());
            for item in items {
                let link = purchase_order_source_link::ActiveModel {
                    purchase_order_item_id: Set(po_item.id),
                    order_id: Set(item.order_id),
                    order_item_id: Set(item.id),
                    source_quantity: Set(item.quantity),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
                source_links.push(link);
            }

            item_responses.push(PurchaseOrderItemResponse {
                id: po_item.id,
                product_id: po_item.product_id,
                product_option_id: po_item.product_option_id,
                quantity: po_item.quantity,
                unit_cost: po_item.unit_cost,
                line_total: po_item.line_total,
                source_links,
            });
        }

        let mut po_active: purchase_order::ActiveModel = purchase_order.into();
        po_active.total_amount = Set(total_amount);
        let purchase_order = po_active.update(&txn).await?;

        for order in orders {
            transition_order_status(
                &txn,
                order,
                OrderStatus::PendingPurchase,
                Some(AGGREGATION_REASON.to_string()),
            )
            .await?;
        }

        txn.commit().await?;
        info!(
            purchase_order_id = purchase_order.id,
            total_amount = %purchase_order.total_amount,
            lines = item_responses.len(),
            "Purchase order created from orders"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::PurchaseOrderCreated(purchase_order.id))
                .await
            {
                warn!(error = %e, "Failed to send purchase order created event");
            }
        }

        let history = self.load_history(purchase_order.id).await?;
        Ok(vec![PurchaseOrderResponse {
            id: purchase_order.id,
            supplier_name: purchase_order.supplier_name,
            status: purchase_order.status,
            currency: purchase_order.currency,
            total_amount: purchase_order.total_amount,
            created_at: purchase_order.created_at,
            created_by: purchase_order.created_by,
            items: item_responses,
            status_history: history,
        }])
    }

    /// Appends a history row and mutates the status. Any status value is
    /// accepted; transition legality is deliberately not enforced.
    #[instrument(skip(self, request), fields(new_status = ?request.new_status))]
    pub async fn update_status(
        &self,
        purchase_order_id: i64,
        request: UpdatePurchaseOrderStatusRequest,
    ) -> Result<PurchaseOrderResponse, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let purchase_order = purchase_order::Entity::find_by_id(purchase_order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                warn!(purchase_order_id, "Purchase order not found for status update");
                ServiceError::NotFound("Purchase order not found".to_string())
            })?;

        let old_status = purchase_order.status.clone();

        purchase_order_status_history::ActiveModel {
            purchase_order_id: Set(purchase_order.id),
            previous_status: Set(Some(old_status.clone())),
            new_status: Set(request.new_status.clone()),
            changed_at: Set(Utc::now()),
            reason: Set(request.reason),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut active: purchase_order::ActiveModel = purchase_order.into();
        active.status = Set(request.new_status.clone());
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        info!(purchase_order_id, old_status = ?old_status, new_status = ?request.new_status, "Purchase order status updated");

        if let Some(event_sender) = &self.event_sender {
            let event = Event::PurchaseOrderStatusChanged {
                purchase_order_id,
                old_status: format!("{:?}", old_status),
                new_status: format!("{:?}", request.new_status),
            };
            if let Err(e) = event_sender.send(event).await {
                warn!(error = %e, "Failed to send purchase order status changed event");
            }
        }

        self.load_response(updated).await
    }

    /// Retrieves a purchase order with its lines, source links and history.
    #[instrument(skip(self))]
    pub async fn get_purchase_order(
        &self,
        purchase_order_id: i64,
    ) -> Result<PurchaseOrderResponse, ServiceError> {
        let db = &*self.db_pool;
        let purchase_order = purchase_order::Entity::find_by_id(purchase_order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Purchase order not found".to_string()))?;
        self.load_response(purchase_order).await
    }

    async fn load_response(
        &self,
        purchase_order: purchase_order::Model,
    ) -> Result<PurchaseOrderResponse, ServiceError> {
        let db = &*self.db_pool;
        let items = purchase_order_item::Entity::find()
            .filter(purchase_order_item::Column::PurchaseOrderId.eq(purchase_order.id))
            .order_by_asc(purchase_order_item::Column::Id)
            .all(db)
            .await?;

        let mut item_responses = Vec::with_capacity(items.len());
        for item in items {
            let source_links = purchase_order_source_link::Entity::find()
                .filter(purchase_order_source_link::Column::PurchaseOrderItemId.eq(item.id))
                .order_by_asc(purchase_order_source_link::Column::Id)
                .all(db)
                .await?;
            item_responses.push(PurchaseOrderItemResponse {
                id: item.id,
                product_id: item.product_id,
                product_option_id: item.product_option_id,
                quantity: item.quantity,
                unit_cost: item.unit_cost,
                line_total: item.line_total,
                source_links,
            });
        }

        let status_history = self.load_history(purchase_order.id).await?;

        Ok(PurchaseOrderResponse {
            id: purchase_order.id,
            supplier_name: purchase_order.supplier_name,
            status: purchase_order.status,
            currency: purchase_order.currency,
            total_amount: purchase_order.total_amount,
            created_at: purchase_order.created_at,
            created_by: purchase_order.created_by,
            items: item_responses,
            status_history,
        })
    }

    async fn load_history(
        &self,
        purchase_order_id: i64,
    ) -> Result<Vec<purchase_order_status_history::Model>, ServiceError> {
        let db = &*self.db_pool;
        Ok(purchase_order_status_history::Entity::find()
            .filter(
                purchase_order_status_history::Column::PurchaseOrderId.eq(purchase_order_id),
            )
            .order_by_asc(purchase_order_status_history::Column::Id)
            .all(db)
            .await?)
    }
}
