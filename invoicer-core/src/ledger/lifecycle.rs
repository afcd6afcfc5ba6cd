use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{LedgerError, Result};
use crate::ledger::amount::{compute_amount, validate_discount_percentage, validate_items};
use crate::ledger::transitions::{payment_status, PermissiveTransitions, TransitionPolicy};
use crate::models::{
    CreateInvoice, CustomerInfo, HistoryEntry, Invoice, InvoiceStatus, PaymentRecord,
    UpdateInvoice,
};

const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Invoice lifecycle rules: construction, partial updates and payments.
///
/// Holds no mutable state. Every call works on a borrowed snapshot and returns
/// a new one, so a single ledger can be shared by any number of handlers.
#[derive(Debug, Clone)]
pub struct InvoiceLedger {
    policy: Arc<dyn TransitionPolicy>,
}

impl Default for InvoiceLedger {
    fn default() -> Self {
        Self::new(Arc::new(PermissiveTransitions))
    }
}

impl InvoiceLedger {
    pub fn new(policy: Arc<dyn TransitionPolicy>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &dyn TransitionPolicy {
        self.policy.as_ref()
    }

    /// Builds a new invoice from a creation request.
    ///
    /// Validation runs in order: payload shape, due date format, due date in
    /// the future, items, discount percentage.
    ///
    /// # Errors
    ///
    /// - `Validation` for missing customer fields, bad items or discount
    /// - `InvalidDueDate` if the due date is unparseable, today or in the past
    pub fn create(&self, input: &CreateInvoice, now: DateTime<Utc>) -> Result<Invoice> {
        validate_customer(&input.customer_info)?;

        let due_date = parse_due_date(&input.due_date)?;
        ensure_future(due_date, now)?;

        validate_items(&input.items)?;

        let discount_percentage = match (input.is_discount, input.discount_percentage) {
            (_, Some(pct)) => {
                validate_discount_percentage(pct)?;
                pct
            }
            (true, None) => {
                return Err(LedgerError::validation(
                    "discount_percentage is required when is_discount is true",
                ))
            }
            (false, None) => Decimal::ZERO,
        };

        let amount = compute_amount(&input.items, input.is_discount, discount_percentage)?;

        let invoice = Invoice {
            invoice_id: Uuid::new_v4(),
            due_date,
            description: input.description.clone(),
            amount,
            status: InvoiceStatus::Created,
            outstanding_amount: amount,
            payment_history: Vec::new(),
            invoice_history: vec![HistoryEntry {
                action: InvoiceStatus::Created,
                action_date: now,
            }],
            items: input.items.clone(),
            reminders: input.reminders.clone(),
            is_discount: input.is_discount,
            discount_percentage,
            note: None,
            is_settled: false,
            is_shared: false,
            customer_info: input.customer_info.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(invoice_id = %invoice.invoice_id, amount = %invoice.amount, "invoice created");
        Ok(invoice)
    }

    /// Applies a partial update to `existing` and returns the new snapshot.
    ///
    /// Steps run in a fixed order: due date, status, items and discount,
    /// customer info, payment, then flags and free text. A payment overrides
    /// any status set earlier in the same call. On error nothing is applied.
    ///
    /// Items and discount inputs are locked once `existing` has reached a
    /// payment status; touching them then is a silent no-op.
    pub fn update(
        &self,
        existing: &Invoice,
        input: &UpdateInvoice,
        now: DateTime<Utc>,
    ) -> Result<Invoice> {
        validate_update(input)?;

        let mut invoice = existing.clone();

        if let Some(raw) = &input.due_date {
            let due_date = parse_due_date(raw)?;
            if due_date != invoice.due_date {
                ensure_future(due_date, now)?;
                invoice.due_date = due_date;
            }
        }

        if let Some(target) = input.status {
            if target != invoice.status {
                if !self.policy.allows(invoice.status, target) {
                    return Err(LedgerError::validation(format!(
                        "status cannot change from {} to {}",
                        invoice.status, target
                    )));
                }
                record_transition(&mut invoice, target, now);
            }
        }

        if input.touches_amount() {
            if existing.status.is_payment() {
                debug!(
                    invoice_id = %invoice.invoice_id,
                    status = %existing.status,
                    "items and discount are locked after payment, ignoring"
                );
            } else {
                reprice(&mut invoice, input)?;
            }
        }

        if let Some(customer_info) = &input.customer_info {
            invoice.customer_info = customer_info.clone();
        }

        if let Some(paid) = input.paid_amount {
            apply_payment(&mut invoice, paid, now)?;
        }

        if let Some(is_settled) = input.is_settled {
            invoice.is_settled = is_settled;
        }
        if let Some(is_shared) = input.is_shared {
            invoice.is_shared = is_shared;
        }
        if let Some(note) = &input.note {
            invoice.note = Some(note.clone());
        }
        if let Some(description) = &input.description {
            invoice.description = Some(description.clone());
        }
        if let Some(reminders) = &input.reminders {
            invoice.reminders = reminders.clone();
        }

        Ok(invoice)
    }
}

/// Parses a `YYYY-MM-DD` due date.
pub fn parse_due_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DUE_DATE_FORMAT).map_err(|_| {
        LedgerError::InvalidDueDate("due_date must be a date format, eg: 2006-01-02".to_string())
    })
}

/// A due date must fall strictly after the current UTC day.
pub fn ensure_future(due_date: NaiveDate, now: DateTime<Utc>) -> Result<()> {
    if due_date <= now.date_naive() {
        return Err(LedgerError::InvalidDueDate(
            "due_date can not be today or be in the past".to_string(),
        ));
    }
    Ok(())
}

fn validate_customer(customer: &CustomerInfo) -> Result<()> {
    if customer.name.trim().is_empty() {
        return Err(LedgerError::validation("customer_info.name is required"));
    }
    if customer.email.trim().is_empty() {
        return Err(LedgerError::validation("customer_info.email is required"));
    }
    Ok(())
}

fn validate_update(input: &UpdateInvoice) -> Result<()> {
    if let Some(items) = &input.items {
        validate_items(items)?;
    }
    if let Some(pct) = input.discount_percentage {
        validate_discount_percentage(pct)?;
    }
    if let Some(customer) = &input.customer_info {
        validate_customer(customer)?;
    }
    if let Some(paid) = input.paid_amount {
        if paid <= Decimal::ZERO {
            return Err(LedgerError::validation("paid_amount must be greater than 0"));
        }
    }
    Ok(())
}

/// Recomputes the amount from new or stored items and discount inputs.
fn reprice(invoice: &mut Invoice, input: &UpdateInvoice) -> Result<()> {
    if let Some(items) = &input.items {
        invoice.items = items.clone();
    }
    if let Some(is_discount) = input.is_discount {
        invoice.is_discount = is_discount;
    }
    if let Some(pct) = input.discount_percentage {
        invoice.discount_percentage = pct;
    }

    invoice.amount = compute_amount(
        &invoice.items,
        invoice.is_discount,
        invoice.discount_percentage,
    )?;
    invoice.outstanding_amount = invoice
        .total_paid()
        .and_then(|paid| invoice.amount.checked_sub(paid))
        .ok_or_else(LedgerError::total_overflow)?
        .max(Decimal::ZERO);
    Ok(())
}

fn apply_payment(invoice: &mut Invoice, paid: Decimal, now: DateTime<Utc>) -> Result<()> {
    if invoice.outstanding_amount <= Decimal::ZERO {
        debug!(invoice_id = %invoice.invoice_id, "nothing outstanding, payment ignored");
        return Ok(());
    }
    if paid > invoice.outstanding_amount {
        return Err(LedgerError::Overpayment {
            paid,
            outstanding: invoice.outstanding_amount,
        });
    }

    invoice.outstanding_amount -= paid;
    let date_paid = next_stamp(invoice.payment_history.last().map(|p| p.date_paid), now);
    invoice.payment_history.push(PaymentRecord {
        amount_paid: paid,
        amount_balance: invoice.outstanding_amount,
        date_paid,
    });

    let status = payment_status(invoice.outstanding_amount);
    record_transition(invoice, status, now);
    Ok(())
}

fn record_transition(invoice: &mut Invoice, status: InvoiceStatus, now: DateTime<Utc>) {
    let action_date = next_stamp(invoice.invoice_history.last().map(|h| h.action_date), now);
    invoice.status = status;
    invoice.invoice_history.push(HistoryEntry {
        action: status,
        action_date,
    });
}

/// Keeps log timestamps non-decreasing even if the clock steps back.
fn next_stamp(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match last {
        Some(last) if last > now => last,
        _ => now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::transitions::ForwardOnlyTransitions;
    use crate::models::{Item, Reminder};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn days_from_now(days: i64) -> String {
        (now().date_naive() + Duration::days(days))
            .format("%Y-%m-%d")
            .to_string()
    }

    fn customer() -> CustomerInfo {
        CustomerInfo {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone_number: "+44 20 0000 0000".to_string(),
        }
    }

    fn item(name: &str, quantity: u32, unit_price: i64) -> Item {
        Item {
            name: name.to_string(),
            quantity,
            unit_price: Decimal::from(unit_price),
        }
    }

    fn create_input() -> CreateInvoice {
        CreateInvoice {
            due_date: days_from_now(7),
            description: Some("Consulting".to_string()),
            items: vec![item("Hours", 2, 50)],
            customer_info: customer(),
            is_discount: false,
            discount_percentage: None,
            reminders: vec![Reminder::AWeek],
        }
    }

    fn created() -> Invoice {
        InvoiceLedger::default().create(&create_input(), now()).unwrap()
    }

    fn pay(invoice: &Invoice, amount: Decimal) -> Result<Invoice> {
        let update = UpdateInvoice {
            paid_amount: Some(amount),
            ..Default::default()
        };
        InvoiceLedger::default().update(invoice, &update, now())
    }

    #[test]
    fn test_create_scenario() {
        let invoice = created();

        assert_eq!(invoice.amount, Decimal::from(100));
        assert_eq!(invoice.outstanding_amount, Decimal::from(100));
        assert_eq!(invoice.status, InvoiceStatus::Created);
        assert_eq!(invoice.invoice_history.len(), 1);
        assert_eq!(invoice.invoice_history[0].action, InvoiceStatus::Created);
        assert_eq!(invoice.invoice_history[0].action_date, now());
        assert!(invoice.payment_history.is_empty());
        assert_eq!(invoice.reminders, vec![Reminder::AWeek]);
    }

    #[test]
    fn test_create_assigns_fresh_ids() {
        assert_ne!(created().invoice_id, created().invoice_id);
    }

    #[test]
    fn test_create_with_discount() {
        let input = CreateInvoice {
            is_discount: true,
            discount_percentage: Some(Decimal::from(10)),
            ..create_input()
        };
        let invoice = InvoiceLedger::default().create(&input, now()).unwrap();
        assert_eq!(invoice.amount, Decimal::from(90));
        assert_eq!(invoice.outstanding_amount, Decimal::from(90));
    }

    #[test]
    fn test_create_discount_requires_percentage() {
        let input = CreateInvoice {
            is_discount: true,
            ..create_input()
        };
        let err = InvoiceLedger::default().create(&input, now()).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_create_rejects_out_of_range_discount() {
        let input = CreateInvoice {
            is_discount: true,
            discount_percentage: Some(Decimal::from(101)),
            ..create_input()
        };
        let err = InvoiceLedger::default().create(&input, now()).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_create_due_today_rejected() {
        let input = CreateInvoice {
            due_date: days_from_now(0),
            ..create_input()
        };
        let err = InvoiceLedger::default().create(&input, now()).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidDueDate(_)));
    }

    #[test]
    fn test_create_due_yesterday_rejected() {
        let input = CreateInvoice {
            due_date: days_from_now(-1),
            ..create_input()
        };
        let err = InvoiceLedger::default().create(&input, now()).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidDueDate(_)));
    }

    #[test]
    fn test_create_due_tomorrow_accepted() {
        let input = CreateInvoice {
            due_date: days_from_now(1),
            ..create_input()
        };
        assert!(InvoiceLedger::default().create(&input, now()).is_ok());
    }

    #[test]
    fn test_create_unparseable_due_date() {
        let input = CreateInvoice {
            due_date: "03/09/2024".to_string(),
            ..create_input()
        };
        let err = InvoiceLedger::default().create(&input, now()).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidDueDate(_)));
    }

    #[test]
    fn test_create_validation_precedes_due_date() {
        let input = CreateInvoice {
            due_date: "not-a-date".to_string(),
            customer_info: CustomerInfo {
                email: String::new(),
                ..customer()
            },
            ..create_input()
        };
        let err = InvoiceLedger::default().create(&input, now()).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_create_rejects_overflowing_total() {
        let input = CreateInvoice {
            items: vec![Item {
                quantity: 2,
                unit_price: Decimal::MAX,
                ..item("Hours", 0, 0)
            }],
            ..create_input()
        };
        let err = InvoiceLedger::default().create(&input, now()).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(ref msg) if msg == "invoice total overflow"));
    }

    #[test]
    fn test_update_rejects_overflowing_items() {
        let invoice = created();
        let update = UpdateInvoice {
            items: Some(vec![
                item("Hours", 2, 50),
                Item {
                    unit_price: Decimal::MAX,
                    ..item("Retainer", 1, 0)
                },
            ]),
            ..Default::default()
        };
        let err = InvoiceLedger::default().update(&invoice, &update, now()).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_empty_update_is_identity() {
        let invoice = created();
        let updated = InvoiceLedger::default()
            .update(&invoice, &UpdateInvoice::default(), now() + Duration::hours(1))
            .unwrap();
        assert_eq!(updated, invoice);
    }

    #[test]
    fn test_full_payment_scenario() {
        let input = CreateInvoice {
            is_discount: true,
            discount_percentage: Some(Decimal::from(10)),
            ..create_input()
        };
        let invoice = InvoiceLedger::default().create(&input, now()).unwrap();

        let paid = pay(&invoice, Decimal::from(90)).unwrap();
        assert_eq!(paid.outstanding_amount, Decimal::ZERO);
        assert_eq!(paid.status, InvoiceStatus::FullPayment);
        assert_eq!(paid.payment_history.len(), 1);
        assert_eq!(paid.payment_history[0].amount_paid, Decimal::from(90));
        assert_eq!(paid.payment_history[0].amount_balance, Decimal::ZERO);
        assert_eq!(paid.invoice_history.last().unwrap().action, InvoiceStatus::FullPayment);
    }

    #[test]
    fn test_partial_payment_scenario() {
        let mut invoice = created();
        invoice.amount = Decimal::from(90);
        invoice.outstanding_amount = Decimal::from(90);

        let paid = pay(&invoice, Decimal::from(50)).unwrap();
        assert_eq!(paid.outstanding_amount, Decimal::from(40));
        assert_eq!(paid.status, InvoiceStatus::PartialPayment);
        assert_eq!(paid.payment_history[0].amount_balance, Decimal::from(40));
    }

    #[test]
    fn test_overpayment_rejected() {
        let mut invoice = created();
        invoice.amount = Decimal::from(90);
        invoice.outstanding_amount = Decimal::from(90);

        let err = pay(&invoice, Decimal::from(100)).unwrap_err();
        match err {
            LedgerError::Overpayment { paid, outstanding } => {
                assert_eq!(paid, Decimal::from(100));
                assert_eq!(outstanding, Decimal::from(90));
            }
            other => panic!("expected overpayment, got {other:?}"),
        }
        assert_eq!(invoice.outstanding_amount, Decimal::from(90));
        assert!(invoice.payment_history.is_empty());
    }

    #[test]
    fn test_sequential_payments_reach_full_payment() {
        let mut invoice = created();
        for amount in ["12.34", "30", "7.66", "50"] {
            invoice = pay(&invoice, amount.parse().unwrap()).unwrap();
        }

        assert_eq!(invoice.outstanding_amount, Decimal::ZERO);
        assert_eq!(invoice.status, InvoiceStatus::FullPayment);
        assert_eq!(invoice.payment_history.len(), 4);
        assert_eq!(invoice.invoice_history.len(), 5);

        let balances: Vec<Decimal> = invoice
            .payment_history
            .iter()
            .map(|p| p.amount_balance)
            .collect();
        assert!(balances.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_payment_on_zero_balance_ignored() {
        let paid = pay(&created(), Decimal::from(100)).unwrap();
        let again = pay(&paid, Decimal::from(10)).unwrap();
        assert_eq!(again, paid);
    }

    #[test]
    fn test_non_positive_payment_rejected() {
        let err = pay(&created(), Decimal::ZERO).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_status_change_appends_history() {
        let invoice = created();
        let update = UpdateInvoice {
            status: Some(InvoiceStatus::Sent),
            ..Default::default()
        };
        let later = now() + Duration::minutes(5);
        let updated = InvoiceLedger::default().update(&invoice, &update, later).unwrap();

        assert_eq!(updated.status, InvoiceStatus::Sent);
        assert_eq!(updated.invoice_history.len(), 2);
        assert_eq!(updated.invoice_history[1].action, InvoiceStatus::Sent);
        assert_eq!(updated.invoice_history[1].action_date, later);
    }

    #[test]
    fn test_same_status_is_not_a_transition() {
        let invoice = created();
        let update = UpdateInvoice {
            status: Some(InvoiceStatus::Created),
            ..Default::default()
        };
        let updated = InvoiceLedger::default().update(&invoice, &update, now()).unwrap();
        assert_eq!(updated.invoice_history.len(), 1);
    }

    #[test]
    fn test_payment_overrides_status_in_same_call() {
        let update = UpdateInvoice {
            status: Some(InvoiceStatus::Sent),
            paid_amount: Some(Decimal::from(25)),
            ..Default::default()
        };
        let updated = InvoiceLedger::default().update(&created(), &update, now()).unwrap();

        assert_eq!(updated.status, InvoiceStatus::PartialPayment);
        let actions: Vec<InvoiceStatus> =
            updated.invoice_history.iter().map(|h| h.action).collect();
        assert_eq!(
            actions,
            vec![
                InvoiceStatus::Created,
                InvoiceStatus::Sent,
                InvoiceStatus::PartialPayment
            ]
        );
    }

    #[test]
    fn test_permissive_allows_reopening_paid_invoice() {
        let paid = pay(&created(), Decimal::from(100)).unwrap();
        let update = UpdateInvoice {
            status: Some(InvoiceStatus::Draft),
            ..Default::default()
        };
        let updated = InvoiceLedger::default().update(&paid, &update, now()).unwrap();
        assert_eq!(updated.status, InvoiceStatus::Draft);
    }

    #[test]
    fn test_forward_only_rejects_reopening_paid_invoice() {
        let ledger = InvoiceLedger::new(Arc::new(ForwardOnlyTransitions));
        let paid = pay(&created(), Decimal::from(100)).unwrap();
        let update = UpdateInvoice {
            status: Some(InvoiceStatus::Draft),
            ..Default::default()
        };
        let err = ledger.update(&paid, &update, now()).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_items_update_recomputes_amount() {
        let update = UpdateInvoice {
            items: Some(vec![item("Hours", 3, 50), item("Travel", 1, 20)]),
            ..Default::default()
        };
        let updated = InvoiceLedger::default().update(&created(), &update, now()).unwrap();
        assert_eq!(updated.amount, Decimal::from(170));
        assert_eq!(updated.outstanding_amount, Decimal::from(170));
        assert_eq!(updated.items.len(), 2);
    }

    #[test]
    fn test_discount_update_uses_stored_items() {
        let update = UpdateInvoice {
            is_discount: Some(true),
            discount_percentage: Some(Decimal::from(10)),
            ..Default::default()
        };
        let updated = InvoiceLedger::default().update(&created(), &update, now()).unwrap();
        assert_eq!(updated.amount, Decimal::from(90));
        assert!(updated.is_discount);
    }

    #[test]
    fn test_discount_percentage_retained_when_disabled() {
        let input = CreateInvoice {
            is_discount: true,
            discount_percentage: Some(Decimal::from(20)),
            ..create_input()
        };
        let ledger = InvoiceLedger::default();
        let invoice = ledger.create(&input, now()).unwrap();

        let off = ledger
            .update(
                &invoice,
                &UpdateInvoice {
                    is_discount: Some(false),
                    ..Default::default()
                },
                now(),
            )
            .unwrap();
        assert_eq!(off.amount, Decimal::from(100));
        assert_eq!(off.discount_percentage, Decimal::from(20));

        let on = ledger
            .update(
                &off,
                &UpdateInvoice {
                    is_discount: Some(true),
                    items: Some(vec![item("Hours", 4, 50)]),
                    ..Default::default()
                },
                now(),
            )
            .unwrap();
        assert_eq!(on.amount, Decimal::from(160));
    }

    #[test]
    fn test_items_locked_after_partial_payment() {
        let partial = pay(&created(), Decimal::from(40)).unwrap();
        let update = UpdateInvoice {
            items: Some(vec![item("Hours", 10, 50)]),
            is_discount: Some(true),
            discount_percentage: Some(Decimal::from(50)),
            ..Default::default()
        };
        let updated = InvoiceLedger::default().update(&partial, &update, now()).unwrap();
        assert_eq!(updated, partial);
    }

    #[test]
    fn test_items_locked_after_full_payment() {
        let paid = pay(&created(), Decimal::from(100)).unwrap();
        let update = UpdateInvoice {
            items: Some(vec![item("Hours", 1, 1)]),
            ..Default::default()
        };
        let updated = InvoiceLedger::default().update(&paid, &update, now()).unwrap();
        assert_eq!(updated.amount, Decimal::from(100));
        assert_eq!(updated.items, paid.items);
    }

    #[test]
    fn test_reprice_keeps_outstanding_within_amount() {
        // Partially paid, then moved back to SENT, which unlocks repricing.
        let partial = pay(&created(), Decimal::from(60)).unwrap();
        let ledger = InvoiceLedger::default();
        let sent = ledger
            .update(
                &partial,
                &UpdateInvoice {
                    status: Some(InvoiceStatus::Sent),
                    ..Default::default()
                },
                now(),
            )
            .unwrap();

        let cheaper = ledger
            .update(
                &sent,
                &UpdateInvoice {
                    items: Some(vec![item("Hours", 1, 50)]),
                    ..Default::default()
                },
                now(),
            )
            .unwrap();
        assert_eq!(cheaper.amount, Decimal::from(50));
        assert_eq!(cheaper.outstanding_amount, Decimal::ZERO);
    }

    #[test]
    fn test_due_date_change_revalidated() {
        let invoice = created();
        let ledger = InvoiceLedger::default();

        let past = UpdateInvoice {
            due_date: Some(days_from_now(-3)),
            ..Default::default()
        };
        assert!(matches!(
            ledger.update(&invoice, &past, now()),
            Err(LedgerError::InvalidDueDate(_))
        ));

        let later = UpdateInvoice {
            due_date: Some(days_from_now(30)),
            ..Default::default()
        };
        let updated = ledger.update(&invoice, &later, now()).unwrap();
        assert_eq!(updated.due_date, now().date_naive() + Duration::days(30));
        assert_eq!(updated.invoice_history.len(), 1);
    }

    #[test]
    fn test_unchanged_due_date_not_revalidated() {
        let invoice = created();
        let same = UpdateInvoice {
            due_date: Some(invoice.due_date.format("%Y-%m-%d").to_string()),
            ..Default::default()
        };
        // A month later the stored due date has passed, but it is not being changed.
        let updated = InvoiceLedger::default()
            .update(&invoice, &same, now() + Duration::days(30))
            .unwrap();
        assert_eq!(updated, invoice);
    }

    #[test]
    fn test_overpayment_reports_balance() {
        let invoice = created();
        let update = UpdateInvoice {
            status: Some(InvoiceStatus::Sent),
            note: Some("late".to_string()),
            paid_amount: Some(Decimal::from(500)),
            ..Default::default()
        };
        let err = InvoiceLedger::default().update(&invoice, &update, now()).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Overpayment { paid, outstanding }
                if paid == Decimal::from(500) && outstanding == Decimal::from(100)
        ));
    }

    #[test]
    fn test_flags_and_text_overwrite() {
        let update = UpdateInvoice {
            is_settled: Some(true),
            is_shared: Some(true),
            note: Some("Thanks for your business".to_string()),
            description: Some("March retainer".to_string()),
            customer_info: Some(CustomerInfo {
                name: "Grace Hopper".to_string(),
                email: "grace@example.com".to_string(),
                phone_number: String::new(),
            }),
            reminders: Some(vec![Reminder::DueDate]),
            ..Default::default()
        };
        let updated = InvoiceLedger::default().update(&created(), &update, now()).unwrap();

        assert!(updated.is_settled);
        assert!(updated.is_shared);
        assert_eq!(updated.note.as_deref(), Some("Thanks for your business"));
        assert_eq!(updated.description.as_deref(), Some("March retainer"));
        assert_eq!(updated.customer_info.name, "Grace Hopper");
        assert_eq!(updated.reminders, vec![Reminder::DueDate]);
        assert_eq!(updated.status, InvoiceStatus::Created);
    }

    #[test]
    fn test_history_stays_ordered_when_clock_steps_back() {
        let invoice = created();
        let update = UpdateInvoice {
            status: Some(InvoiceStatus::Sent),
            ..Default::default()
        };
        let earlier = now() - Duration::minutes(1);
        let updated = InvoiceLedger::default().update(&invoice, &update, earlier).unwrap();
        assert!(updated
            .invoice_history
            .windows(2)
            .all(|w| w[0].action_date <= w[1].action_date));
    }
}
