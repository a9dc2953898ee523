use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::db::DbPool;
use crate::entities::{order, order_shipment_link, shipment};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateShipmentRequest {
    #[validate(length(min = 1, message = "Carrier name is required"))]
    pub carrier_name: String,
    #[validate(length(min = 1, message = "Tracking number is required"))]
    pub tracking_number: String,
    #[validate(length(min = 1, message = "Shipment type is required"))]
    pub shipment_type: String,
    pub shipped_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub linked_order_ids: Vec<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShipmentResponse {
    #[serde(flatten)]
    pub shipment: shipment::Model,
    pub linked_order_ids: Vec<i64>,
}

/// Service for shipments and their order links.
#[derive(Clone)]
pub struct ShipmentService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl ShipmentService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a shipment and links it to the given orders, all in one
    /// transaction. Unknown order ids fail the whole request.
    #[instrument(skip(self, request), fields(tracking_number = %request.tracking_number))]
    pub async fn create_shipment(
        &self,
        request: CreateShipmentRequest,
    ) -> Result<ShipmentResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let txn = db.begin().await?;

        for order_id in &request.linked_order_ids {
            order::Entity::find_by_id(*order_id)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;
        }

        let shipment = shipment::ActiveModel {
            carrier_name: Set(request.carrier_name),
            tracking_number: Set(request.tracking_number),
            shipment_type: Set(request.shipment_type),
            shipped_at: Set(request.shipped_at),
            delivered_at: Set(None),
            last_status: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for order_id in &request.linked_order_ids {
            order_shipment_link::ActiveModel {
                order_id: Set(*order_id),
                shipment_id: Set(shipment.id),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;
        info!(shipment_id = shipment.id, "Shipment created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::ShipmentCreated(shipment.id)).await {
                warn!(error = %e, shipment_id = shipment.id, "Failed to send shipment created event");
            }
        }

        Ok(ShipmentResponse {
            shipment,
            linked_order_ids: request.linked_order_ids,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_shipment(&self, shipment_id: i64) -> Result<ShipmentResponse, ServiceError> {
        let db = &*self.db_pool;
        let shipment = shipment::Entity::find_by_id(shipment_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Shipment not found".to_string()))?;

        let linked_order_ids = order_shipment_link::Entity::find()
            .filter(order_shipment_link::Column::ShipmentId.eq(shipment.id))
            .order_by_asc(order_shipment_link::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(|link| link.order_id)
            .collect();

        Ok(ShipmentResponse {
            shipment,
            linked_order_ids,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_shipments(&self) -> Result<Vec<shipment::Model>, ServiceError> {
        let db = &*self.db_pool;
        Ok(shipment::Entity::find()
            .order_by_asc(shipment::Column::Id)
            .all(db)
            .await?)
    }
}
