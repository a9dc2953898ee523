//! sea-orm entities, one module per table.

pub mod after_sales_case;
pub mod order;
pub mod order_item;
pub mod order_shipment_link;
pub mod order_status_history;
pub mod product;
pub mod product_localization;
pub mod product_option;
pub mod purchase_order;
pub mod purchase_order_item;
pub mod purchase_order_source_link;
pub mod purchase_order_status_history;
pub mod refund_record;
pub mod sales_channel_template;
pub mod shipment;
