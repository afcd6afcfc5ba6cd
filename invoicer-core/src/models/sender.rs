use serde::{Deserialize, Serialize};

/// Bank account invoices are paid into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetail {
    pub account_number: String,
    pub bank_code: String,
    pub bank_name: String,
}

/// The invoicing party shown on every invoice.
///
/// Built once from configuration at startup and shared read-only through
/// application state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub bank_detail: BankDetail,
}
