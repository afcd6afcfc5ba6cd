use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::{error, warn};
use uuid::Uuid;

use crate::error::{LedgerError, Result};
use crate::ledger::DashboardBucket;
use crate::models::{BucketTotal, Invoice, InvoiceStatus};
use crate::store::{InvoiceStore, PageParams};

const INVOICE_COLUMNS: &str = r#"
    invoice_id, due_date, description, amount, status, outstanding_amount,
    payment_history, invoice_history, items, reminders, is_discount,
    discount_percentage, note, is_settled, is_shared, customer_info,
    created_at, updated_at
"#;

const AGGREGATE_SELECT: &str =
    "SELECT COALESCE(SUM(amount), 0) AS sum, COUNT(*) AS count FROM invoices";

/// Row layout of the `invoices` table.
///
/// Embedded documents are read as raw JSON and decoded separately so that
/// one unreadable fragment does not fail the whole row.
#[derive(Debug, FromRow)]
struct InvoiceRow {
    invoice_id: Uuid,
    due_date: NaiveDate,
    description: Option<String>,
    amount: Decimal,
    status: String,
    outstanding_amount: Decimal,
    payment_history: Value,
    invoice_history: Value,
    items: Value,
    reminders: Value,
    is_discount: bool,
    discount_percentage: Decimal,
    note: Option<String>,
    is_settled: bool,
    is_shared: bool,
    customer_info: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = LedgerError;

    fn try_from(row: InvoiceRow) -> Result<Self> {
        let id = row.invoice_id;
        let status = row
            .status
            .parse::<InvoiceStatus>()
            .map_err(LedgerError::Persistence)?;

        Ok(Invoice {
            invoice_id: id,
            due_date: row.due_date,
            description: row.description,
            amount: row.amount,
            status,
            outstanding_amount: row.outstanding_amount,
            payment_history: decode_or_default(id, "payment_history", row.payment_history),
            invoice_history: decode_or_default(id, "invoice_history", row.invoice_history),
            items: decode_or_default(id, "items", row.items),
            reminders: decode_or_default(id, "reminders", row.reminders),
            is_discount: row.is_discount,
            discount_percentage: row.discount_percentage,
            note: row.note,
            is_settled: row.is_settled,
            is_shared: row.is_shared,
            customer_info: decode_or_default(id, "customer_info", row.customer_info),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Decodes an embedded JSON document, falling back to the empty value.
fn decode_or_default<T>(invoice_id: Uuid, column: &str, value: Value) -> T
where
    T: DeserializeOwned + Default,
{
    if value.is_null() {
        return T::default();
    }
    serde_json::from_value(value).unwrap_or_else(|e| {
        warn!(
            "Unreadable {} on invoice {}, treating as empty: {}",
            column, invoice_id, e
        );
        T::default()
    })
}

/// PostgreSQL-backed invoice store.
///
/// Items, histories, reminders and customer info live in JSONB columns on the
/// invoice row rather than in child tables.
#[derive(Debug, Clone)]
pub struct PgInvoiceStore {
    pool: PgPool,
}

impl PgInvoiceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InvoiceStore for PgInvoiceStore {
    async fn find_by_id(&self, invoice_id: Uuid) -> Result<Invoice> {
        let query = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE invoice_id = $1");
        let row = sqlx::query_as::<_, InvoiceRow>(&query)
            .bind(invoice_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to fetch invoice {}: {}", invoice_id, e);
                LedgerError::from(e)
            })?;

        row.ok_or(LedgerError::NotFound(invoice_id))
            .and_then(Invoice::try_from)
    }

    async fn find_page(&self, page: PageParams) -> Result<Vec<Invoice>> {
        let query = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, InvoiceRow>(&query)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to list invoices: {}", e);
                LedgerError::from(e)
            })?;

        rows.into_iter().map(Invoice::try_from).collect()
    }

    async fn insert(&self, invoice: &Invoice) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO invoices (
                invoice_id, due_date, description, amount, status, outstanding_amount,
                payment_history, invoice_history, items, reminders, is_discount,
                discount_percentage, note, is_settled, is_shared, customer_info,
                created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18
            )
            "#,
        )
        .bind(invoice.invoice_id)
        .bind(invoice.due_date)
        .bind(&invoice.description)
        .bind(invoice.amount)
        .bind(invoice.status.as_str())
        .bind(invoice.outstanding_amount)
        .bind(Json(&invoice.payment_history))
        .bind(Json(&invoice.invoice_history))
        .bind(Json(&invoice.items))
        .bind(Json(&invoice.reminders))
        .bind(invoice.is_discount)
        .bind(invoice.discount_percentage)
        .bind(&invoice.note)
        .bind(invoice.is_settled)
        .bind(invoice.is_shared)
        .bind(Json(&invoice.customer_info))
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to insert invoice {}: {}", invoice.invoice_id, e);
            LedgerError::from(e)
        })?;

        Ok(())
    }

    async fn replace(&self, invoice_id: Uuid, invoice: &Invoice) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET
                due_date = $2,
                description = $3,
                amount = $4,
                status = $5,
                outstanding_amount = $6,
                payment_history = $7,
                invoice_history = $8,
                items = $9,
                reminders = $10,
                is_discount = $11,
                discount_percentage = $12,
                note = $13,
                is_settled = $14,
                is_shared = $15,
                customer_info = $16,
                updated_at = $17
            WHERE invoice_id = $1
            "#,
        )
        .bind(invoice_id)
        .bind(invoice.due_date)
        .bind(&invoice.description)
        .bind(invoice.amount)
        .bind(invoice.status.as_str())
        .bind(invoice.outstanding_amount)
        .bind(Json(&invoice.payment_history))
        .bind(Json(&invoice.invoice_history))
        .bind(Json(&invoice.items))
        .bind(Json(&invoice.reminders))
        .bind(invoice.is_discount)
        .bind(invoice.discount_percentage)
        .bind(&invoice.note)
        .bind(invoice.is_settled)
        .bind(invoice.is_shared)
        .bind(Json(&invoice.customer_info))
        .bind(invoice.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to update invoice {}: {}", invoice_id, e);
            LedgerError::from(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound(invoice_id));
        }
        Ok(())
    }

    async fn aggregate(&self, bucket: DashboardBucket, now: DateTime<Utc>) -> Result<BucketTotal> {
        let sql = match bucket {
            DashboardBucket::Paid | DashboardBucket::Draft => {
                format!("{AGGREGATE_SELECT} WHERE status = $1")
            }
            DashboardBucket::Overdue => {
                format!("{AGGREGATE_SELECT} WHERE status != $1 AND due_date <= $2")
            }
            DashboardBucket::Unpaid => format!("{AGGREGATE_SELECT} WHERE status != $1"),
        };
        let status = match bucket {
            DashboardBucket::Draft => InvoiceStatus::Draft,
            _ => InvoiceStatus::FullPayment,
        };

        let mut query = sqlx::query_as::<_, (Decimal, i64)>(&sql).bind(status.as_str());
        if bucket == DashboardBucket::Overdue {
            query = query.bind(now.date_naive());
        }

        let (sum, count) = query.fetch_one(&self.pool).await.map_err(|e| {
            error!("Error fetching {} invoice statistics: {}", bucket, e);
            LedgerError::from(e)
        })?;

        Ok(BucketTotal { sum, count })
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
