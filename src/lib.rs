#![forbid(unsafe_code)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod services;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::events::EventSender;
use crate::services::after_sales::AfterSalesService;
use crate::services::exports::CatalogExporter;
use crate::services::orders::OrderService;
use crate::services::pricing::PricingService;
use crate::services::products::ProductService;
use crate::services::purchase_orders::PurchaseOrderService;
use crate::services::shipments::ShipmentService;
use crate::services::templates::ChannelTemplateLoader;

/// All service instances, constructed once and cloned into handlers.
#[derive(Clone)]
pub struct AppServices {
    pub products: ProductService,
    pub orders: OrderService,
    pub purchase_orders: PurchaseOrderService,
    pub shipments: ShipmentService,
    pub after_sales: AfterSalesService,
    pub exporter: CatalogExporter,
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub services: AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DbPool>,
        config: AppConfig,
        event_sender: Option<Arc<EventSender>>,
    ) -> Result<Self, ServiceError> {
        let pricing = PricingService::from_config(&config.pricing)?;
        let loader = ChannelTemplateLoader::new(config.export.template_dir.clone());
        let exporter = CatalogExporter::new(
            loader,
            pricing,
            config.export.default_locale.clone(),
            config.export.return_policy_image_url.clone(),
            event_sender.clone(),
        );

        let services = AppServices {
            products: ProductService::new(db.clone(), event_sender.clone()),
            orders: OrderService::new(db.clone(), event_sender.clone()),
            purchase_orders: PurchaseOrderService::new(db.clone(), event_sender.clone()),
            shipments: ShipmentService::new(db.clone(), event_sender.clone()),
            after_sales: AfterSalesService::new(db.clone(), event_sender),
            exporter,
        };

        Ok(Self {
            db,
            config,
            services,
        })
    }
}

/// Assembles the full application router.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/products", handlers::products::router())
        .nest("/api/orders", handlers::orders::router())
        .nest("/api/purchase-orders", handlers::purchase_orders::router())
        .nest("/api/shipments", handlers::shipments::router())
        .nest("/api/after-sales", handlers::after_sales::router())
        .nest("/api/exports", handlers::exports::router())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
