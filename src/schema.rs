//! Idempotent DDL for the storefront tables, applied at startup when
//! `auto_migrate` is set and by the test harness. Production deployments on
//! Postgres are expected to provision the schema out of band.

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr};

const PRODUCTS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS products (
    id uuid PRIMARY KEY,
    name varchar NOT NULL,
    description text NOT NULL,
    price_minor bigint NOT NULL,
    active boolean NOT NULL,
    stock integer,
    created_at timestamptz NOT NULL,
    updated_at timestamptz NOT NULL
)
"#;

const ORDERS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS orders (
    id uuid PRIMARY KEY,
    user_id varchar,
    status varchar(20) NOT NULL,
    payment_method varchar(20) NOT NULL,
    payment_status varchar(20) NOT NULL,
    total_minor bigint NOT NULL,
    currency varchar(3) NOT NULL,
    shipping_address text NOT NULL,
    gateway_order_id varchar,
    gateway_payment_id varchar,
    payment_verified_at timestamptz,
    created_at timestamptz NOT NULL,
    updated_at timestamptz NOT NULL
)
"#;

const ORDER_ITEMS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS order_items (
    id uuid PRIMARY KEY,
    order_id uuid NOT NULL,
    product_id uuid NOT NULL,
    name varchar NOT NULL,
    unit_price_minor bigint NOT NULL,
    quantity integer NOT NULL,
    customization text,
    created_at timestamptz NOT NULL
)
"#;

const INDEX_DDL: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_orders_created_at ON orders (created_at)",
    "CREATE INDEX IF NOT EXISTS idx_order_items_order_id ON order_items (order_id)",
];

pub async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.execute_unprepared(PRODUCTS_DDL).await?;
    db.execute_unprepared(ORDERS_DDL).await?;
    db.execute_unprepared(ORDER_ITEMS_DDL).await?;
    for ddl in INDEX_DDL {
        db.execute_unprepared(ddl).await?;
    }
    Ok(())
}
