use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{LedgerError, Result};
use crate::ledger::dashboard::{total_for, DashboardBucket};
use crate::models::{BucketTotal, Invoice};
use crate::store::{InvoiceStore, PageParams};

/// Process-local invoice store.
///
/// Used when no database is configured and by the HTTP tests. Invoices are
/// kept in insertion order behind a shared lock; clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInvoiceStore {
    invoices: Arc<RwLock<Vec<Invoice>>>,
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InvoiceStore for InMemoryInvoiceStore {
    async fn find_by_id(&self, invoice_id: Uuid) -> Result<Invoice> {
        self.invoices
            .read()
            .await
            .iter()
            .find(|invoice| invoice.invoice_id == invoice_id)
            .cloned()
            .ok_or(LedgerError::NotFound(invoice_id))
    }

    async fn find_page(&self, page: PageParams) -> Result<Vec<Invoice>> {
        let invoices = self.invoices.read().await;

        // Newest insert first, then a stable sort keeps that order for equal timestamps.
        let mut newest_first: Vec<&Invoice> = invoices.iter().rev().collect();
        newest_first.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(newest_first
            .into_iter()
            .skip(page.offset.max(0) as usize)
            .take(page.limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn insert(&self, invoice: &Invoice) -> Result<()> {
        let mut invoices = self.invoices.write().await;
        if invoices.iter().any(|i| i.invoice_id == invoice.invoice_id) {
            return Err(LedgerError::Persistence(format!(
                "invoice {} already exists",
                invoice.invoice_id
            )));
        }
        invoices.push(invoice.clone());
        Ok(())
    }

    async fn replace(&self, invoice_id: Uuid, invoice: &Invoice) -> Result<()> {
        let mut invoices = self.invoices.write().await;
        let slot = invoices
            .iter_mut()
            .find(|i| i.invoice_id == invoice_id)
            .ok_or(LedgerError::NotFound(invoice_id))?;

        let mut stored = invoice.clone();
        stored.invoice_id = invoice_id;
        stored.created_at = slot.created_at;
        *slot = stored;
        Ok(())
    }

    async fn aggregate(&self, bucket: DashboardBucket, now: DateTime<Utc>) -> Result<BucketTotal> {
        total_for(self.invoices.read().await.iter(), bucket, now)
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
