use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;

use crate::models::InvoiceStatus;

/// Decides whether a direct status edit is allowed.
///
/// Only consulted for explicit status changes in an update. Statuses derived
/// from payments bypass the policy.
pub trait TransitionPolicy: fmt::Debug + Send + Sync {
    /// Returns `true` if an invoice in `from` may be moved to `to`.
    fn allows(&self, from: InvoiceStatus, to: InvoiceStatus) -> bool;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Accepts every transition.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissiveTransitions;

impl TransitionPolicy for PermissiveTransitions {
    fn allows(&self, _from: InvoiceStatus, _to: InvoiceStatus) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "permissive"
    }
}

/// Moves invoices forward through the lifecycle only.
///
/// - Draft -> Created -> Sent -> PartialPayment -> FullPayment
/// - Created -> Draft is still allowed (drafts are made from fresh invoices)
/// - Any non-terminal state -> Canceled
/// - Canceled and FullPayment are terminal
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardOnlyTransitions;

impl ForwardOnlyTransitions {
    fn stage(status: InvoiceStatus) -> u8 {
        match status {
            InvoiceStatus::Draft => 0,
            InvoiceStatus::Created => 1,
            InvoiceStatus::Sent => 2,
            InvoiceStatus::PartialPayment => 3,
            InvoiceStatus::FullPayment => 4,
            InvoiceStatus::Canceled => 5,
        }
    }
}

impl TransitionPolicy for ForwardOnlyTransitions {
    fn allows(&self, from: InvoiceStatus, to: InvoiceStatus) -> bool {
        match (from, to) {
            (InvoiceStatus::Canceled, _) | (InvoiceStatus::FullPayment, _) => false,
            (_, InvoiceStatus::Canceled) => true,
            (InvoiceStatus::Created, InvoiceStatus::Draft) => true,
            (from, to) => Self::stage(to) >= Self::stage(from),
        }
    }

    fn name(&self) -> &'static str {
        "forward-only"
    }
}

/// Picks the policy selected by configuration.
pub fn policy_for(strict: bool) -> Arc<dyn TransitionPolicy> {
    if strict {
        Arc::new(ForwardOnlyTransitions)
    } else {
        Arc::new(PermissiveTransitions)
    }
}

/// Status derived from the balance left after a payment.
pub fn payment_status(outstanding: Decimal) -> InvoiceStatus {
    if outstanding.is_zero() {
        InvoiceStatus::FullPayment
    } else {
        InvoiceStatus::PartialPayment
    }
}
