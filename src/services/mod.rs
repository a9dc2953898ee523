pub mod after_sales;
pub mod exports;
pub mod orders;
pub mod pricing;
pub mod products;
pub mod purchase_orders;
pub mod shipments;
pub mod templates;
