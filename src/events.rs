use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

/// Domain events emitted after successful state changes. Delivery is
/// best-effort; a send failure never fails the originating request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ProductCreated(i64),
    ProductLocalized { product_id: i64, locale: String },

    OrderCreated(i64),
    OrderStatusChanged {
        order_id: i64,
        old_status: String,
        new_status: String,
    },

    PurchaseOrderCreated(i64),
    PurchaseOrderStatusChanged {
        purchase_order_id: i64,
        old_status: String,
        new_status: String,
    },

    ShipmentCreated(i64),
    AfterSalesCaseOpened(i64),
    RefundRecorded(i64),

    CatalogExported { channel: String, rows: usize },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel, logging each event. Stands in for downstream
/// consumers (notifications, webhooks) that live outside this service.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        info!(event = ?event, "Domain event");
    }
}
