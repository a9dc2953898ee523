mod common;

use rust_decimal_macros::dec;

use daigou_api::entities::order::OrderStatus;
use daigou_api::errors::ServiceError;
use daigou_api::services::orders::{OrderService, UpdateOrderStatusRequest};

#[tokio::test]
async fn creating_an_order_writes_the_initial_history_row() {
    let db = common::setup_test_db().await;
    let product = common::seed_product(db.clone(), "가방", dec!(100), vec![]).await;

    let order = common::seed_order(
        db.clone(),
        "EXT-1001",
        vec![(product.product.id, None, 2, dec!(25000))],
    )
    .await;

    assert_eq!(order.status, OrderStatus::New);
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.status_history.len(), 1);

    let initial = &order.status_history[0];
    assert_eq!(initial.previous_status, None);
    assert_eq!(initial.new_status, OrderStatus::New);
    assert_eq!(initial.reason.as_deref(), Some("initial import"));
}

#[tokio::test]
async fn status_updates_append_history_in_insertion_order() {
    let db = common::setup_test_db().await;
    let product = common::seed_product(db.clone(), "가방", dec!(100), vec![]).await;
    let order = common::seed_order(
        db.clone(),
        "EXT-1002",
        vec![(product.product.id, None, 1, dec!(25000))],
    )
    .await;

    let service = OrderService::new(db, None);
    let updated = service
        .update_status(
            order.id,
            UpdateOrderStatusRequest {
                new_status: OrderStatus::OverseaOrdered,
                reason: Some("placed with supplier".to_string()),
            },
        )
        .await
        .unwrap();
    let updated = service
        .update_status(
            updated.id,
            UpdateOrderStatusRequest {
                new_status: OrderStatus::OverseaInTransit,
                reason: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, OrderStatus::OverseaInTransit);
    assert_eq!(updated.status_history.len(), 3);

    let transitions: Vec<(Option<OrderStatus>, OrderStatus)> = updated
        .status_history
        .iter()
        .map(|row| (row.previous_status.clone(), row.new_status.clone()))
        .collect();
    assert_eq!(
        transitions,
        vec![
            (None, OrderStatus::New),
            (Some(OrderStatus::New), OrderStatus::OverseaOrdered),
            (
                Some(OrderStatus::OverseaOrdered),
                OrderStatus::OverseaInTransit
            ),
        ]
    );
    assert_eq!(
        updated.status_history[1].reason.as_deref(),
        Some("placed with supplier")
    );
    assert_eq!(updated.status_history[2].reason, None);
}

#[tokio::test]
async fn any_status_value_is_accepted() {
    let db = common::setup_test_db().await;
    let product = common::seed_product(db.clone(), "가방", dec!(100), vec![]).await;
    let order = common::seed_order(
        db.clone(),
        "EXT-1003",
        vec![(product.product.id, None, 1, dec!(25000))],
    )
    .await;

    // DELIVERED straight from NEW: no transition graph is enforced.
    let service = OrderService::new(db, None);
    let updated = service
        .update_status(
            order.id,
            UpdateOrderStatusRequest {
                new_status: OrderStatus::Delivered,
                reason: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, OrderStatus::Delivered);
}

#[tokio::test]
async fn listing_filters_by_status() {
    let db = common::setup_test_db().await;
    let product = common::seed_product(db.clone(), "가방", dec!(100), vec![]).await;
    let first = common::seed_order(
        db.clone(),
        "EXT-1004",
        vec![(product.product.id, None, 1, dec!(25000))],
    )
    .await;
    common::seed_order(
        db.clone(),
        "EXT-1005",
        vec![(product.product.id, None, 1, dec!(25000))],
    )
    .await;

    let service = OrderService::new(db, None);
    service
        .update_status(
            first.id,
            UpdateOrderStatusRequest {
                new_status: OrderStatus::Cancelled,
                reason: None,
            },
        )
        .await
        .unwrap();

    let new_orders = service.list_orders(Some(OrderStatus::New)).await.unwrap();
    assert_eq!(new_orders.len(), 1);
    assert_eq!(new_orders[0].external_order_id, "EXT-1005");

    let all = service.list_orders(None).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn missing_order_is_a_not_found_error() {
    let db = common::setup_test_db().await;
    let service = OrderService::new(db, None);
    let err = service.get_order(9999).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}
