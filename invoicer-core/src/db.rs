use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::info;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS invoices (
    id                  BIGSERIAL PRIMARY KEY,
    invoice_id          UUID NOT NULL UNIQUE,
    due_date            DATE NOT NULL,
    description         TEXT,
    amount              NUMERIC NOT NULL,
    status              VARCHAR(32) NOT NULL,
    outstanding_amount  NUMERIC NOT NULL,
    payment_history     JSONB NOT NULL DEFAULT '[]',
    invoice_history     JSONB NOT NULL DEFAULT '[]',
    created_by          INT NOT NULL DEFAULT 1,
    items               JSONB NOT NULL DEFAULT '[]',
    reminders           JSONB NOT NULL DEFAULT '[]',
    is_discount         BOOLEAN NOT NULL DEFAULT FALSE,
    discount_percentage NUMERIC NOT NULL DEFAULT 0,
    note                TEXT,
    is_settled          BOOLEAN NOT NULL DEFAULT FALSE,
    is_shared           BOOLEAN NOT NULL DEFAULT FALSE,
    customer_info       JSONB NOT NULL DEFAULT '{}',
    created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at          TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE INDEX IF NOT EXISTS invoices_created_at_idx ON invoices (created_at DESC);
CREATE INDEX IF NOT EXISTS invoices_status_idx ON invoices (status);
"#;

/// Create a Postgres connection pool for `database_url`.
///
/// Returns a `sqlx::PgPool` or an error if the pool cannot be created.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Creates the `invoices` table and its indexes if they are missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    pool.execute(SCHEMA).await?;
    info!("Database schema ready");
    Ok(())
}
