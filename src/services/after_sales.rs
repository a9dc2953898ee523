use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::db::DbPool;
use crate::entities::after_sales_case::{
    self, AfterSalesCaseStatus, AfterSalesCaseType, NotificationChannel,
};
use crate::entities::order::{self, OrderStatus};
use crate::entities::refund_record::{self, RefundAmountType, RefundStatus};
use crate::entities::{order_item, shipment};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::orders::transition_order_status;

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCaseRequest {
    pub order_id: i64,
    pub order_item_id: Option<i64>,
    pub shipment_id: Option<i64>,
    pub case_type: AfterSalesCaseType,
    #[serde(default = "default_notification_channel")]
    pub customer_notification_channel: NotificationChannel,
    pub claim_amount_krw: Option<Decimal>,
    pub summary: Option<String>,
    pub customer_note: Option<String>,
    /// When set, the parent order transitions to this status in the same
    /// transaction, with its own history row.
    pub order_status_after_creation: Option<OrderStatus>,
}

fn default_notification_channel() -> NotificationChannel {
    NotificationChannel::InApp
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateCaseStatusRequest {
    pub new_status: AfterSalesCaseStatus,
    pub resolution_note: Option<String>,
    pub order_status_after_update: Option<OrderStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecordRefundRequest {
    #[serde(default = "default_amount_type")]
    pub amount_type: RefundAmountType,
    pub refund_amount_krw: Decimal,
    #[serde(default = "default_refund_currency")]
    pub refund_currency: String,
    #[serde(default = "default_refund_status")]
    pub status: RefundStatus,
    pub refund_method: Option<String>,
    pub reason: Option<String>,
    /// When set, the parent order transitions to this status in the same
    /// transaction, reflecting refund progress in its history.
    pub order_status_after_refund: Option<OrderStatus>,
}

fn default_amount_type() -> RefundAmountType {
    RefundAmountType::Full
}

fn default_refund_currency() -> String {
    "KRW".to_string()
}

fn default_refund_status() -> RefundStatus {
    RefundStatus::Requested
}

/// Service for after-sales cases and refunds.
#[derive(Clone)]
pub struct AfterSalesService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl AfterSalesService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Opens a case against an order. Referenced order, item and shipment
    /// must exist; the optional order-status cascade happens in the same
    /// transaction.
    #[instrument(skip(self, request), fields(order_id = request.order_id, case_type = ?request.case_type))]
    pub async fn create_case(
        &self,
        request: CreateCaseRequest,
    ) -> Result<after_sales_case::Model, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let order = order::Entity::find_by_id(request.order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        if let Some(order_item_id) = request.order_item_id {
            order_item::Entity::find_by_id(order_item_id)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Order item not found".to_string()))?;
        }
        if let Some(shipment_id) = request.shipment_id {
            shipment::Entity::find_by_id(shipment_id)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Shipment not found".to_string()))?;
        }

        let case = after_sales_case::ActiveModel {
            order_id: Set(request.order_id),
            order_item_id: Set(request.order_item_id),
            shipment_id: Set(request.shipment_id),
            case_type: Set(request.case_type),
            status: Set(AfterSalesCaseStatus::Open),
            customer_notification_channel: Set(request.customer_notification_channel),
            claim_amount_krw: Set(request.claim_amount_krw),
            summary: Set(request.summary),
            customer_note: Set(request.customer_note),
            resolution_note: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        if let Some(new_status) = request.order_status_after_creation {
            transition_order_status(
                &txn,
                order,
                new_status,
                Some("after-sales case created".to_string()),
            )
            .await?;
        }

        txn.commit().await?;
        info!(case_id = case.id, order_id = case.order_id, "After-sales case opened");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::AfterSalesCaseOpened(case.id)).await {
                warn!(error = %e, case_id = case.id, "Failed to send case opened event");
            }
        }

        Ok(case)
    }

    /// Updates a case's status (any value accepted) and optionally cascades
    /// an order status change in the same transaction.
    #[instrument(skip(self, request), fields(new_status = ?request.new_status))]
    pub async fn update_status(
        &self,
        case_id: i64,
        request: UpdateCaseStatusRequest,
    ) -> Result<after_sales_case::Model, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let case = after_sales_case::Entity::find_by_id(case_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("After-sales case not found".to_string()))?;

        let order_id = case.order_id;
        let mut active: after_sales_case::ActiveModel = case.into();
        active.status = Set(request.new_status);
        if request.resolution_note.is_some() {
            active.resolution_note = Set(request.resolution_note.clone());
        }
        let updated = active.update(&txn).await?;

        if let Some(new_status) = request.order_status_after_update {
            let order = order::Entity::find_by_id(order_id)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;
            let reason = request
                .resolution_note
                .unwrap_or_else(|| "after-sales status updated".to_string());
            transition_order_status(&txn, order, new_status, Some(reason)).await?;
        }

        txn.commit().await?;
        info!(case_id, "After-sales case status updated");

        Ok(updated)
    }

    /// Re-points a case at a shipment (e.g. the return leg's tracking).
    #[instrument(skip(self))]
    pub async fn link_shipment(
        &self,
        case_id: i64,
        shipment_id: i64,
    ) -> Result<after_sales_case::Model, ServiceError> {
        let db = &*self.db_pool;

        let case = after_sales_case::Entity::find_by_id(case_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("After-sales case not found".to_string()))?;
        shipment::Entity::find_by_id(shipment_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Shipment not found".to_string()))?;

        let mut active: after_sales_case::ActiveModel = case.into();
        active.shipment_id = Set(Some(shipment_id));
        let updated = active.update(db).await?;

        info!(case_id, shipment_id, "Shipment linked to after-sales case");
        Ok(updated)
    }

    /// Records a refund against a case and its order. The optional
    /// order-status cascade happens in the same transaction.
    #[instrument(skip(self, request))]
    pub async fn record_refund(
        &self,
        case_id: i64,
        request: RecordRefundRequest,
    ) -> Result<refund_record::Model, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let case = after_sales_case::Entity::find_by_id(case_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("After-sales case not found".to_string()))?;

        let refund = refund_record::ActiveModel {
            order_id: Set(case.order_id),
            order_item_id: Set(case.order_item_id),
            shipment_id: Set(case.shipment_id),
            after_sales_case_id: Set(Some(case.id)),
            amount_type: Set(request.amount_type),
            refund_amount_krw: Set(request.refund_amount_krw),
            refund_currency: Set(request.refund_currency),
            status: Set(request.status),
            refund_method: Set(request.refund_method),
            reason: Set(request.reason.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        if let Some(new_status) = request.order_status_after_refund {
            let order = order::Entity::find_by_id(case.order_id)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;
            let reason = request
                .reason
                .unwrap_or_else(|| "refund recorded".to_string());
            transition_order_status(&txn, order, new_status, Some(reason)).await?;
        }

        txn.commit().await?;

        info!(refund_id = refund.id, case_id, "Refund recorded");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::RefundRecorded(refund.id)).await {
                warn!(error = %e, refund_id = refund.id, "Failed to send refund recorded event");
            }
        }

        Ok(refund)
    }
}
