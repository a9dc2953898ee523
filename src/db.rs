use std::time::Duration;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};
use tracing::{debug, info};

use crate::entities;

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Establishes a connection pool to the database.
pub async fn establish_connection(database_url: &str) -> Result<DbPool, DbErr> {
    debug!("Configuring database connection for {}", database_url);

    let mut opt = ConnectOptions::new(database_url.to_string());
    opt.max_connections(10)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(false);

    let pool = Database::connect(opt).await?;
    info!("Database connection established");
    Ok(pool)
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}

/// Creates the schema from the entity definitions. Parents before children so
/// foreign keys resolve.
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_table(db, entities::product::Entity).await?;
    create_table(db, entities::product_option::Entity).await?;
    create_table(db, entities::product_localization::Entity).await?;
    create_table(db, entities::sales_channel_template::Entity).await?;
    create_table(db, entities::order::Entity).await?;
    create_table(db, entities::order_item::Entity).await?;
    create_table(db, entities::order_status_history::Entity).await?;
    create_table(db, entities::shipment::Entity).await?;
    create_table(db, entities::order_shipment_link::Entity).await?;
    create_table(db, entities::purchase_order::Entity).await?;
    create_table(db, entities::purchase_order_item::Entity).await?;
    create_table(db, entities::purchase_order_source_link::Entity).await?;
    create_table(db, entities::purchase_order_status_history::Entity).await?;
    create_table(db, entities::after_sales_case::Entity).await?;
    create_table(db, entities::refund_record::Entity).await?;
    info!("Schema ready");
    Ok(())
}
