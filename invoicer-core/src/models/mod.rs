pub mod invoice;
pub mod sender;

pub use invoice::{
    BucketTotal, CreateInvoice, CustomerInfo, HistoryEntry, Invoice, InvoiceDashboard,
    InvoiceStatus, Item, PaymentRecord, Reminder, UpdateInvoice,
};
pub use sender::{BankDetail, Sender};
