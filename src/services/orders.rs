use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use validator::Validate;

use crate::db::DbPool;
use crate::entities::order::{self, OrderStatus};
use crate::entities::{order_item, order_status_history};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateOrderItemRequest {
    pub product_id: i64,
    pub product_option_id: Option<i64>,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
    pub unit_price_krw: Decimal,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "External order id is required"))]
    pub external_order_id: String,
    #[validate(length(min = 1, message = "Channel name is required"))]
    pub channel_name: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub order_datetime: DateTime<Utc>,
    #[serde(default = "default_order_status")]
    pub status: OrderStatus,
    pub total_amount_krw: Decimal,
    pub items: Vec<CreateOrderItemRequest>,
}

fn default_order_status() -> OrderStatus {
    OrderStatus::New
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub new_status: OrderStatus,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: i64,
    pub external_order_id: String,
    pub channel_name: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub order_datetime: DateTime<Utc>,
    pub status: OrderStatus,
    pub total_amount_krw: Decimal,
    pub created_at: DateTime<Utc>,
    pub items: Vec<order_item::Model>,
    pub status_history: Vec<order_status_history::Model>,
}

/// Writes the status mutation and its history row together on the given
/// connection. The previous value is read from the entity immediately before
/// the overwrite; callers supply the new status and reason verbatim.
pub(crate) async fn transition_order_status<C: ConnectionTrait>(
    conn: &C,
    current: order::Model,
    new_status: OrderStatus,
    reason: Option<String>,
) -> Result<order::Model, ServiceError> {
    let previous = current.status.clone();

    order_status_history::ActiveModel {
        order_id: Set(current.id),
        previous_status: Set(Some(previous)),
        new_status: Set(new_status.clone()),
        changed_at: Set(Utc::now()),
        reason: Set(reason),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    let mut active: order::ActiveModel = current.into();
    active.status = Set(new_status);
    active.updated_at = Set(Some(Utc::now()));
    let updated = active.update(conn).await?;
    Ok(updated)
}

/// Service for managing customer orders.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates an order with its items and the initial history row
    /// (previous=None) in one transaction.
    #[instrument(skip(self, request), fields(external_order_id = %request.external_order_id))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;
        for item in &request.items {
            item.validate()?;
        }

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        let order = order::ActiveModel {
            external_order_id: Set(request.external_order_id.clone()),
            channel_name: Set(request.channel_name),
            customer_name: Set(request.customer_name),
            customer_phone: Set(request.customer_phone),
            customer_address: Set(request.customer_address),
            order_datetime: Set(request.order_datetime),
            status: Set(request.status.clone()),
            total_amount_krw: Set(request.total_amount_krw),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for item in request.items {
            order_item::ActiveModel {
                order_id: Set(order.id),
                product_id: Set(item.product_id),
                product_option_id: Set(item.product_option_id),
                quantity: Set(item.quantity),
                unit_price_krw: Set(item.unit_price_krw),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        order_status_history::ActiveModel {
            order_id: Set(order.id),
            previous_status: Set(None),
            new_status: Set(request.status),
            changed_at: Set(Utc::now()),
            reason: Set(Some("initial import".to_string())),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        info!(order_id = order.id, "Order created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::OrderCreated(order.id)).await {
                warn!(error = %e, order_id = order.id, "Failed to send order created event");
            }
        }

        self.load_response(order).await
    }

    /// Retrieves an order with its items and history (insertion order).
    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: i64) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;
        let order = order::Entity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;
        self.load_response(order).await
    }

    /// Lists orders, optionally filtered by status.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<order::Model>, ServiceError> {
        let db = &*self.db_pool;
        let mut query = order::Entity::find().order_by_asc(order::Column::Id);
        if let Some(status) = status {
            query = query.filter(order::Column::Status.eq(status));
        }
        Ok(query.all(db).await?)
    }

    /// Mutates the status and appends the matching history row atomically.
    /// Any status value is accepted; transition legality is not enforced.
    #[instrument(skip(self, request), fields(new_status = ?request.new_status))]
    pub async fn update_status(
        &self,
        order_id: i64,
        request: UpdateOrderStatusRequest,
    ) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let order = order::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                warn!(order_id = order_id, "Order not found for status update");
                ServiceError::NotFound("Order not found".to_string())
            })?;

        let old_status = order.status.clone();
        let updated =
            transition_order_status(&txn, order, request.new_status.clone(), request.reason)
                .await?;

        txn.commit().await?;
        info!(order_id = order_id, old_status = ?old_status, new_status = ?request.new_status, "Order status updated");

        if let Some(event_sender) = &self.event_sender {
            let event = Event::OrderStatusChanged {
                order_id,
                old_status: format!("{:?}", old_status),
                new_status: format!("{:?}", request.new_status),
            };
            if let Err(e) = event_sender.send(event).await {
                warn!(error = %e, order_id = order_id, "Failed to send status changed event");
            }
        }

        self.load_response(updated).await
    }

    async fn load_response(&self, order: order::Model) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;
        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .order_by_asc(order_item::Column::Id)
            .all(db)
            .await?;
        let status_history = order_status_history::Entity::find()
            .filter(order_status_history::Column::OrderId.eq(order.id))
            .order_by_asc(order_status_history::Column::Id)
            .all(db)
            .await?;

        Ok(OrderResponse {
            id: order.id,
            external_order_id: order.external_order_id,
            channel_name: order.channel_name,
            customer_name: order.customer_name,
            customer_phone: order.customer_phone,
            customer_address: order.customer_address,
            order_datetime: order.order_datetime,
            status: order.status,
            total_amount_krw: order.total_amount_krw,
            created_at: order.created_at,
            items,
            status_history,
        })
    }
}
