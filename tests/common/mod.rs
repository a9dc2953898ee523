#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database};

use daigou_api::db::{self, DbPool};
use daigou_api::services::orders::{
    CreateOrderItemRequest, CreateOrderRequest, OrderResponse, OrderService,
};
use daigou_api::services::products::{
    CreateProductOptionRequest, CreateProductRequest, ProductResponse, ProductService,
};

/// Fresh in-memory database with the full schema. A single connection keeps
/// the in-memory database alive and shared across the test.
pub async fn setup_test_db() -> Arc<DbPool> {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    opt.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.expect("connect to sqlite");
    db::run_migrations(&db).await.expect("create schema");
    Arc::new(db)
}

/// Seeds a product; each `(raw_name, localized_name, price_diff)` tuple
/// becomes one option.
pub async fn seed_product(
    db: Arc<DbPool>,
    raw_title: &str,
    raw_price: Decimal,
    options: Vec<(&str, Option<&str>, Decimal)>,
) -> ProductResponse {
    let service = ProductService::new(db, None);
    service
        .create_product(CreateProductRequest {
            source_url: format!("https://item.example.com/{}", raw_title),
            source_site: "TAOBAO".to_string(),
            raw_title: raw_title.to_string(),
            raw_description: Some(format!("{} description", raw_title)),
            raw_price,
            raw_currency: "CNY".to_string(),
            exchange_rate: None,
            margin_rate: None,
            vat_rate: None,
            shipping_fee: None,
            image_urls: vec![format!("https://img.example.com/{}.jpg", raw_title)],
            detail_image_urls: vec![],
            options: options
                .into_iter()
                .enumerate()
                .map(|(idx, (raw_name, localized_name, raw_price_diff))| {
                    CreateProductOptionRequest {
                        option_key: format!("opt-{}", idx + 1),
                        raw_name: raw_name.to_string(),
                        raw_price_diff,
                        localized_name: localized_name.map(str::to_string),
                    }
                })
                .collect(),
        })
        .await
        .expect("seed product")
}

/// Seeds a NEW order with the given `(product_id, option_id, quantity,
/// unit_price_krw)` items.
pub async fn seed_order(
    db: Arc<DbPool>,
    external_order_id: &str,
    items: Vec<(i64, Option<i64>, i32, Decimal)>,
) -> OrderResponse {
    let service = OrderService::new(db, None);
    let total: Decimal = items
        .iter()
        .map(|(_, _, qty, price)| *price * Decimal::from(*qty))
        .sum();
    service
        .create_order(CreateOrderRequest {
            external_order_id: external_order_id.to_string(),
            channel_name: "smartstore".to_string(),
            customer_name: "홍길동".to_string(),
            customer_phone: "010-0000-0000".to_string(),
            customer_address: "서울특별시 어딘가 1-2".to_string(),
            order_datetime: Utc::now(),
            status: daigou_api::entities::order::OrderStatus::New,
            total_amount_krw: total,
            items: items
                .into_iter()
                .map(
                    |(product_id, product_option_id, quantity, unit_price_krw)| {
                        CreateOrderItemRequest {
                            product_id,
                            product_option_id,
                            quantity,
                            unit_price_krw,
                        }
                    },
                )
                .collect(),
        })
        .await
        .expect("seed order")
}
