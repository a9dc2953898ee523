mod common;

use rust_decimal_macros::dec;

use daigou_api::entities::order::OrderStatus;
use daigou_api::entities::purchase_order::PurchaseOrderStatus;
use daigou_api::services::orders::OrderService;
use daigou_api::services::purchase_orders::{
    PurchaseOrderService, UpdatePurchaseOrderStatusRequest,
};

#[tokio::test]
async fn aggregation_groups_by_product_and_option() {
    let db = common::setup_test_db().await;
    let product = common::seed_product(
        db.clone(),
        "가방",
        dec!(100),
        vec![("红色", Some("빨강"), dec!(10))],
    )
    .await;
    let product_id = product.product.id;
    let option_id = product.options[0].id;

    // The base line appears in both orders with different unit prices; the
    // option line only in the second.
    let first = common::seed_order(
        db.clone(),
        "EXT-2001",
        vec![(product_id, None, 2, dec!(100))],
    )
    .await;
    let second = common::seed_order(
        db.clone(),
        "EXT-2002",
        vec![
            (product_id, None, 3, dec!(120)),
            (product_id, Some(option_id), 2, dec!(150)),
        ],
    )
    .await;

    let service = PurchaseOrderService::new(db.clone(), None);
    let created = service.create_from_orders(None, Some("tester".to_string())).await.unwrap();
    assert_eq!(created.len(), 1);
    let po = &created[0];

    assert_eq!(po.supplier_name, "TAOBAO_DEFAULT");
    assert_eq!(po.currency, "CNY");
    assert_eq!(po.status, PurchaseOrderStatus::Created);
    assert_eq!(po.created_by.as_deref(), Some("tester"));
    assert_eq!(po.items.len(), 2);

    // First-seen order: the base line before the option line.
    let base = &po.items[0];
    assert_eq!(base.product_id, product_id);
    assert_eq!(base.product_option_id, None);
    assert_eq!(base.quantity, 5);
    // Unit cost comes from the first contributing item, never averaged.
    assert_eq!(base.unit_cost, dec!(100));
    assert_eq!(base.line_total, dec!(500));
    let link_quantities: Vec<i32> = base.source_links.iter().map(|l| l.source_quantity).collect();
    assert_eq!(link_quantities, vec![2, 3]);
    assert_eq!(base.source_links[0].order_id, first.id);
    assert_eq!(base.source_links[1].order_id, second.id);

    let option_line = &po.items[1];
    assert_eq!(option_line.product_option_id, Some(option_id));
    assert_eq!(option_line.quantity, 2);
    assert_eq!(option_line.unit_cost, dec!(150));
    assert_eq!(option_line.line_total, dec!(300));

    assert_eq!(po.total_amount, dec!(800));
}

#[tokio::test]
async fn aggregated_orders_flip_to_pending_purchase_with_history() {
    let db = common::setup_test_db().await;
    let product = common::seed_product(db.clone(), "가방", dec!(100), vec![]).await;
    let order = common::seed_order(
        db.clone(),
        "EXT-2003",
        vec![(product.product.id, None, 1, dec!(100))],
    )
    .await;

    PurchaseOrderService::new(db.clone(), None)
        .create_from_orders(None, None)
        .await
        .unwrap();

    let order = OrderService::new(db, None).get_order(order.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::PendingPurchase);
    let last = order.status_history.last().unwrap();
    assert_eq!(last.previous_status, Some(OrderStatus::New));
    assert_eq!(last.new_status, OrderStatus::PendingPurchase);
    assert_eq!(last.reason.as_deref(), Some("Aggregated into purchase order"));
}

#[tokio::test]
async fn no_eligible_orders_writes_nothing() {
    let db = common::setup_test_db().await;
    let service = PurchaseOrderService::new(db, None);

    let created = service.create_from_orders(None, None).await.unwrap();
    assert!(created.is_empty());
    assert!(service.get_purchase_order(1).await.is_err());
}

#[tokio::test]
async fn explicit_order_ids_restrict_the_aggregation() {
    let db = common::setup_test_db().await;
    let product = common::seed_product(db.clone(), "가방", dec!(100), vec![]).await;
    let product_id = product.product.id;

    let picked = common::seed_order(
        db.clone(),
        "EXT-2004",
        vec![(product_id, None, 1, dec!(100))],
    )
    .await;
    let skipped = common::seed_order(
        db.clone(),
        "EXT-2005",
        vec![(product_id, None, 1, dec!(100))],
    )
    .await;

    let created = PurchaseOrderService::new(db.clone(), None)
        .create_from_orders(Some(vec![picked.id]), None)
        .await
        .unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].items[0].source_links.len(), 1);

    let orders = OrderService::new(db, None);
    assert_eq!(
        orders.get_order(picked.id).await.unwrap().status,
        OrderStatus::PendingPurchase
    );
    assert_eq!(
        orders.get_order(skipped.id).await.unwrap().status,
        OrderStatus::New
    );
}

#[tokio::test]
async fn purchase_order_status_updates_append_history() {
    let db = common::setup_test_db().await;
    let product = common::seed_product(db.clone(), "가방", dec!(100), vec![]).await;
    common::seed_order(
        db.clone(),
        "EXT-2006",
        vec![(product.product.id, None, 1, dec!(100))],
    )
    .await;

    let service = PurchaseOrderService::new(db, None);
    let created = service.create_from_orders(None, None).await.unwrap();
    let po_id = created[0].id;

    let updated = service
        .update_status(
            po_id,
            UpdatePurchaseOrderStatusRequest {
                new_status: PurchaseOrderStatus::Ordered,
                reason: Some("paid at supplier".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, PurchaseOrderStatus::Ordered);
    assert_eq!(updated.status_history.len(), 2);
    assert_eq!(
        updated.status_history[0].previous_status, None,
        "creation row comes first"
    );
    let last = updated.status_history.last().unwrap();
    assert_eq!(last.previous_status, Some(PurchaseOrderStatus::Created));
    assert_eq!(last.new_status, PurchaseOrderStatus::Ordered);
    assert_eq!(last.reason.as_deref(), Some("paid at supplier"));
}
