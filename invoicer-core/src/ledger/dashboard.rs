use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

use crate::error::{LedgerError, Result};
use crate::models::{BucketTotal, Invoice, InvoiceDashboard, InvoiceStatus};
use crate::store::InvoiceStore;

/// Dashboard predicates. Buckets overlap: an overdue invoice is also unpaid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashboardBucket {
    /// status = FULL_PAYMENT
    Paid,
    /// due date <= today and status != FULL_PAYMENT
    Overdue,
    /// status = DRAFT
    Draft,
    /// status != FULL_PAYMENT
    Unpaid,
}

impl DashboardBucket {
    pub const ALL: [DashboardBucket; 4] = [
        DashboardBucket::Paid,
        DashboardBucket::Overdue,
        DashboardBucket::Draft,
        DashboardBucket::Unpaid,
    ];

    pub fn matches(&self, invoice: &Invoice, today: NaiveDate) -> bool {
        match self {
            DashboardBucket::Paid => invoice.status == InvoiceStatus::FullPayment,
            DashboardBucket::Overdue => {
                invoice.due_date <= today && invoice.status != InvoiceStatus::FullPayment
            }
            DashboardBucket::Draft => invoice.status == InvoiceStatus::Draft,
            DashboardBucket::Unpaid => invoice.status != InvoiceStatus::FullPayment,
        }
    }
}

impl fmt::Display for DashboardBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DashboardBucket::Paid => write!(f, "paid"),
            DashboardBucket::Overdue => write!(f, "overdue"),
            DashboardBucket::Draft => write!(f, "draft"),
            DashboardBucket::Unpaid => write!(f, "unpaid"),
        }
    }
}

impl InvoiceDashboard {
    fn set(&mut self, bucket: DashboardBucket, total: BucketTotal) {
        match bucket {
            DashboardBucket::Paid => {
                self.total_paid = total.sum;
                self.total_paid_count = total.count;
            }
            DashboardBucket::Overdue => {
                self.total_overdue = total.sum;
                self.total_overdue_count = total.count;
            }
            DashboardBucket::Draft => {
                self.total_draft = total.sum;
                self.total_draft_count = total.count;
            }
            DashboardBucket::Unpaid => {
                self.total_unpaid = total.sum;
                self.total_unpaid_count = total.count;
            }
        }
    }
}

/// Totals one bucket over an in-memory invoice set.
pub fn total_for<'a>(
    invoices: impl IntoIterator<Item = &'a Invoice>,
    bucket: DashboardBucket,
    now: DateTime<Utc>,
) -> Result<BucketTotal> {
    let today = now.date_naive();
    invoices
        .into_iter()
        .filter(|invoice| bucket.matches(invoice, today))
        .try_fold(BucketTotal::default(), |acc, invoice| -> Result<BucketTotal> {
            Ok(BucketTotal {
                sum: acc
                    .sum
                    .checked_add(invoice.amount)
                    .ok_or_else(LedgerError::total_overflow)?,
                count: acc.count + 1,
            })
        })
}

/// Builds the dashboard from four store aggregates. Nothing is cached.
pub async fn build_dashboard(
    store: &dyn InvoiceStore,
    now: DateTime<Utc>,
) -> Result<InvoiceDashboard> {
    let mut dashboard = InvoiceDashboard::default();
    for bucket in DashboardBucket::ALL {
        let total = store.aggregate(bucket, now).await?;
        dashboard.set(bucket, total);
    }
    Ok(dashboard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CustomerInfo;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap()
    }

    fn invoice(status: InvoiceStatus, amount: i64, due_in_days: i64) -> Invoice {
        Invoice {
            invoice_id: Uuid::new_v4(),
            due_date: now().date_naive() + Duration::days(due_in_days),
            description: None,
            amount: Decimal::from(amount),
            status,
            outstanding_amount: Decimal::from(amount),
            payment_history: Vec::new(),
            invoice_history: Vec::new(),
            items: Vec::new(),
            reminders: Vec::new(),
            is_discount: false,
            discount_percentage: Decimal::ZERO,
            note: None,
            is_settled: false,
            is_shared: false,
            customer_info: CustomerInfo::default(),
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn test_due_today_counts_as_overdue() {
        let today = now().date_naive();
        assert!(DashboardBucket::Overdue.matches(&invoice(InvoiceStatus::Sent, 10, 0), today));
        assert!(!DashboardBucket::Overdue.matches(&invoice(InvoiceStatus::Sent, 10, 1), today));
        assert!(!DashboardBucket::Overdue
            .matches(&invoice(InvoiceStatus::FullPayment, 10, -5), today));
    }

    #[test]
    fn test_buckets_overlap() {
        let invoices = vec![
            invoice(InvoiceStatus::FullPayment, 100, -2),
            invoice(InvoiceStatus::Sent, 40, -1),
            invoice(InvoiceStatus::Draft, 25, 10),
            invoice(InvoiceStatus::PartialPayment, 60, 3),
        ];

        let paid = total_for(&invoices, DashboardBucket::Paid, now()).unwrap();
        assert_eq!(paid, BucketTotal { sum: Decimal::from(100), count: 1 });

        let overdue = total_for(&invoices, DashboardBucket::Overdue, now()).unwrap();
        assert_eq!(overdue, BucketTotal { sum: Decimal::from(40), count: 1 });

        let draft = total_for(&invoices, DashboardBucket::Draft, now()).unwrap();
        assert_eq!(draft, BucketTotal { sum: Decimal::from(25), count: 1 });

        let unpaid = total_for(&invoices, DashboardBucket::Unpaid, now()).unwrap();
        assert_eq!(unpaid, BucketTotal { sum: Decimal::from(125), count: 3 });
    }

    #[test]
    fn test_empty_set_is_zero() {
        let total = total_for(&Vec::<Invoice>::new(), DashboardBucket::Unpaid, now()).unwrap();
        assert_eq!(total, BucketTotal::default());
    }

    #[test]
    fn test_overflowing_bucket_is_an_error() {
        let mut big = invoice(InvoiceStatus::Sent, 0, 5);
        big.amount = Decimal::MAX;
        let invoices = vec![big.clone(), big];

        let err = total_for(&invoices, DashboardBucket::Unpaid, now()).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        let paid = total_for(&invoices, DashboardBucket::Paid, now()).unwrap();
        assert_eq!(paid, BucketTotal::default());
    }
}
