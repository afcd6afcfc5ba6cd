pub mod memory;
pub mod postgres;

pub use memory::InMemoryInvoiceStore;
pub use postgres::PgInvoiceStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::ledger::DashboardBucket;
use crate::models::{BucketTotal, Invoice};

/// Page window for listing invoices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub limit: i64,
    pub offset: i64,
}

/// Persistence collaborator for invoices.
///
/// The ledger never talks to a database directly; handlers read a snapshot
/// through this trait, run the ledger, and write the result back. Concurrent
/// updates to the same invoice are not serialized here.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Fetches one invoice, or `LedgerError::NotFound`.
    async fn find_by_id(&self, invoice_id: Uuid) -> Result<Invoice>;

    /// Lists invoices newest-created first.
    async fn find_page(&self, page: PageParams) -> Result<Vec<Invoice>>;

    async fn insert(&self, invoice: &Invoice) -> Result<()>;

    /// Overwrites a stored invoice, or `LedgerError::NotFound`.
    ///
    /// `created_at` is kept from the stored row; `updated_at` is taken from `invoice`.
    async fn replace(&self, invoice_id: Uuid, invoice: &Invoice) -> Result<()>;

    /// Sum of `amount` and count over the invoices in `bucket`.
    async fn aggregate(&self, bucket: DashboardBucket, now: DateTime<Utc>) -> Result<BucketTotal>;

    /// Cheap liveness probe.
    async fn health_check(&self) -> Result<()>;
}
