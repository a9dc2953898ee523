//! Thin HTTP layer: request extraction, service dispatch, response shaping.

pub mod after_sales;
pub mod exports;
pub mod orders;
pub mod products;
pub mod purchase_orders;
pub mod shipments;
