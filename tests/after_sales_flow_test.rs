mod common;

use rust_decimal_macros::dec;

use daigou_api::entities::after_sales_case::{
    AfterSalesCaseStatus, AfterSalesCaseType, NotificationChannel,
};
use daigou_api::entities::order::OrderStatus;
use daigou_api::entities::refund_record::{RefundAmountType, RefundStatus};
use daigou_api::errors::ServiceError;
use daigou_api::services::after_sales::{
    AfterSalesService, CreateCaseRequest, RecordRefundRequest, UpdateCaseStatusRequest,
};
use daigou_api::services::orders::OrderService;
use daigou_api::services::shipments::{CreateShipmentRequest, ShipmentService};

fn case_request(order_id: i64) -> CreateCaseRequest {
    CreateCaseRequest {
        order_id,
        order_item_id: None,
        shipment_id: None,
        case_type: AfterSalesCaseType::Return,
        customer_notification_channel: NotificationChannel::InApp,
        claim_amount_krw: Some(dec!(25000)),
        summary: Some("색상 불량".to_string()),
        customer_note: None,
        order_status_after_creation: None,
    }
}

#[tokio::test]
async fn opening_a_case_can_cascade_the_order_status() {
    let db = common::setup_test_db().await;
    let product = common::seed_product(db.clone(), "가방", dec!(100), vec![]).await;
    let order = common::seed_order(
        db.clone(),
        "EXT-3001",
        vec![(product.product.id, None, 1, dec!(25000))],
    )
    .await;

    let service = AfterSalesService::new(db.clone(), None);
    let mut request = case_request(order.id);
    request.order_status_after_creation = Some(OrderStatus::Cancelled);
    let case = service.create_case(request).await.unwrap();

    assert_eq!(case.status, AfterSalesCaseStatus::Open);
    assert_eq!(case.case_type, AfterSalesCaseType::Return);

    let order = OrderService::new(db, None).get_order(order.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    let last = order.status_history.last().unwrap();
    assert_eq!(last.reason.as_deref(), Some("after-sales case created"));
}

#[tokio::test]
async fn case_against_a_missing_order_is_rejected() {
    let db = common::setup_test_db().await;
    let service = AfterSalesService::new(db, None);
    let err = service.create_case(case_request(9999)).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn resolution_note_becomes_the_cascade_reason() {
    let db = common::setup_test_db().await;
    let product = common::seed_product(db.clone(), "가방", dec!(100), vec![]).await;
    let order = common::seed_order(
        db.clone(),
        "EXT-3002",
        vec![(product.product.id, None, 1, dec!(25000))],
    )
    .await;

    let service = AfterSalesService::new(db.clone(), None);
    let case = service.create_case(case_request(order.id)).await.unwrap();

    let updated = service
        .update_status(
            case.id,
            UpdateCaseStatusRequest {
                new_status: AfterSalesCaseStatus::Resolved,
                resolution_note: Some("전액 환불 합의".to_string()),
                order_status_after_update: Some(OrderStatus::Cancelled),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, AfterSalesCaseStatus::Resolved);
    assert_eq!(updated.resolution_note.as_deref(), Some("전액 환불 합의"));

    let order = OrderService::new(db, None).get_order(order.id).await.unwrap();
    let last = order.status_history.last().unwrap();
    assert_eq!(last.reason.as_deref(), Some("전액 환불 합의"));
}

#[tokio::test]
async fn refunds_inherit_the_case_references() {
    let db = common::setup_test_db().await;
    let product = common::seed_product(db.clone(), "가방", dec!(100), vec![]).await;
    let order = common::seed_order(
        db.clone(),
        "EXT-3003",
        vec![(product.product.id, None, 1, dec!(25000))],
    )
    .await;

    let service = AfterSalesService::new(db, None);
    let case = service.create_case(case_request(order.id)).await.unwrap();

    let refund = service
        .record_refund(
            case.id,
            RecordRefundRequest {
                amount_type: RefundAmountType::Full,
                refund_amount_krw: dec!(25000),
                refund_currency: "KRW".to_string(),
                status: RefundStatus::Requested,
                refund_method: Some("card".to_string()),
                reason: Some("return accepted".to_string()),
                order_status_after_refund: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(refund.order_id, order.id);
    assert_eq!(refund.after_sales_case_id, Some(case.id));
    assert_eq!(refund.status, RefundStatus::Requested);
    assert_eq!(refund.refund_amount_krw, dec!(25000));
}

#[tokio::test]
async fn refunds_carry_their_status_and_can_cascade_the_order() {
    let db = common::setup_test_db().await;
    let product = common::seed_product(db.clone(), "가방", dec!(100), vec![]).await;
    let order = common::seed_order(
        db.clone(),
        "EXT-3005",
        vec![(product.product.id, None, 1, dec!(25000))],
    )
    .await;

    let service = AfterSalesService::new(db.clone(), None);
    let case = service.create_case(case_request(order.id)).await.unwrap();

    let refund = service
        .record_refund(
            case.id,
            RecordRefundRequest {
                amount_type: RefundAmountType::Full,
                refund_amount_krw: dec!(25000),
                refund_currency: "KRW".to_string(),
                status: RefundStatus::Processed,
                refund_method: None,
                reason: None,
                order_status_after_refund: Some(OrderStatus::Cancelled),
            },
        )
        .await
        .unwrap();
    assert_eq!(refund.status, RefundStatus::Processed);

    let order = OrderService::new(db, None).get_order(order.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    let last = order.status_history.last().unwrap();
    assert_eq!(last.reason.as_deref(), Some("refund recorded"));
}

#[tokio::test]
async fn linking_a_shipment_validates_both_sides() {
    let db = common::setup_test_db().await;
    let product = common::seed_product(db.clone(), "가방", dec!(100), vec![]).await;
    let order = common::seed_order(
        db.clone(),
        "EXT-3004",
        vec![(product.product.id, None, 1, dec!(25000))],
    )
    .await;

    let service = AfterSalesService::new(db.clone(), None);
    let case = service.create_case(case_request(order.id)).await.unwrap();

    let err = service.link_shipment(case.id, 9999).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let shipment = ShipmentService::new(db, None)
        .create_shipment(CreateShipmentRequest {
            carrier_name: "CJ대한통운".to_string(),
            tracking_number: "1234567890".to_string(),
            shipment_type: "RETURN".to_string(),
            shipped_at: None,
            linked_order_ids: vec![order.id],
        })
        .await
        .unwrap();

    let updated = service
        .link_shipment(case.id, shipment.shipment.id)
        .await
        .unwrap();
    assert_eq!(updated.shipment_id, Some(shipment.shipment.id));
}
