use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Invoice status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Draft,
    Created,
    Sent,
    PartialPayment,
    FullPayment,
    Canceled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "DRAFT",
            InvoiceStatus::Created => "CREATED",
            InvoiceStatus::Sent => "SENT",
            InvoiceStatus::PartialPayment => "PARTIAL_PAYMENT",
            InvoiceStatus::FullPayment => "FULL_PAYMENT",
            InvoiceStatus::Canceled => "CANCELED",
        }
    }

    /// Statuses reached by applying payments.
    pub fn is_payment(&self) -> bool {
        matches!(self, InvoiceStatus::PartialPayment | InvoiceStatus::FullPayment)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(InvoiceStatus::Draft),
            "CREATED" => Ok(InvoiceStatus::Created),
            "SENT" => Ok(InvoiceStatus::Sent),
            "PARTIAL_PAYMENT" => Ok(InvoiceStatus::PartialPayment),
            "FULL_PAYMENT" => Ok(InvoiceStatus::FullPayment),
            "CANCELED" => Ok(InvoiceStatus::Canceled),
            other => Err(format!("unknown invoice status: {other}")),
        }
    }
}

/// Reminder offsets relative to the due date. Stored, never dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reminder {
    #[serde(rename = "14 days before due date")]
    TwoWeeks,
    #[serde(rename = "7 days before due date")]
    AWeek,
    #[serde(rename = "3 days before due date")]
    ThreeDays,
    #[serde(rename = "A day before due date")]
    ADay,
    #[serde(rename = "Due date")]
    DueDate,
}

/// A single billed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl Item {
    /// Quantity × unit price, or an overflow error.
    pub fn line_total(&self) -> crate::error::Result<Decimal> {
        Decimal::from(self.quantity)
            .checked_mul(self.unit_price)
            .ok_or_else(crate::error::LedgerError::total_overflow)
    }
}

/// One accepted payment and the balance it left behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub amount_paid: Decimal,
    pub amount_balance: Decimal,
    pub date_paid: DateTime<Utc>,
}

/// One status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub action: InvoiceStatus,
    pub action_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
}

/// Invoice aggregate.
///
/// Embedded documents (items, histories, customer info, reminders) are typed
/// here and only encoded to JSON at the store boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier for the invoice, immutable once assigned
    pub invoice_id: Uuid,

    /// Due date for payment
    pub due_date: NaiveDate,

    pub description: Option<String>,

    /// Item subtotal less discount
    pub amount: Decimal,

    pub status: InvoiceStatus,

    /// Remaining unpaid balance
    pub outstanding_amount: Decimal,

    /// Append-only log of accepted payments
    pub payment_history: Vec<PaymentRecord>,

    /// Append-only log of status transitions, seeded with CREATED
    pub invoice_history: Vec<HistoryEntry>,

    pub items: Vec<Item>,

    pub reminders: Vec<Reminder>,

    pub is_discount: bool,

    /// Retained even when the discount is switched off
    pub discount_percentage: Decimal,

    pub note: Option<String>,

    pub is_settled: bool,

    pub is_shared: bool,

    pub customer_info: CustomerInfo,

    /// Timestamp when the invoice was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the invoice was last written by the store
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Sum of recorded payments, `None` on overflow.
    pub fn total_paid(&self) -> Option<Decimal> {
        self.payment_history
            .iter()
            .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(p.amount_paid))
    }
}

/// Invoice creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvoice {
    /// `YYYY-MM-DD`
    pub due_date: String,
    #[serde(default)]
    pub description: Option<String>,
    pub items: Vec<Item>,
    pub customer_info: CustomerInfo,
    #[serde(default)]
    pub is_discount: bool,
    #[serde(default)]
    pub discount_percentage: Option<Decimal>,
    #[serde(default, rename = "reminder")]
    pub reminders: Vec<Reminder>,
}

/// Invoice update request. Absent fields leave the invoice untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateInvoice {
    pub due_date: Option<String>,
    pub description: Option<String>,
    pub status: Option<InvoiceStatus>,
    pub items: Option<Vec<Item>>,
    pub customer_info: Option<CustomerInfo>,
    pub is_discount: Option<bool>,
    pub discount_percentage: Option<Decimal>,
    pub paid_amount: Option<Decimal>,
    pub note: Option<String>,
    pub is_settled: Option<bool>,
    pub is_shared: Option<bool>,
    #[serde(rename = "reminder")]
    pub reminders: Option<Vec<Reminder>>,
}

impl UpdateInvoice {
    /// Whether the request touches items or discount inputs.
    pub fn touches_amount(&self) -> bool {
        self.items.is_some() || self.is_discount.is_some() || self.discount_percentage.is_some()
    }
}

/// Sum and count of the invoices falling into one dashboard bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketTotal {
    pub sum: Decimal,
    pub count: i64,
}

/// Dashboard statistics (paid, overdue, draft, unpaid).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDashboard {
    pub total_paid: Decimal,
    pub total_paid_count: i64,
    pub total_overdue: Decimal,
    pub total_overdue_count: i64,
    pub total_draft: Decimal,
    pub total_draft_count: i64,
    pub total_unpaid: Decimal,
    pub total_unpaid_count: i64,
}
