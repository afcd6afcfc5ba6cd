use rust_decimal::Decimal;

use crate::error::{LedgerError, Result};
use crate::models::Item;

/// Sum of quantity × unit price over every item.
pub fn subtotal(items: &[Item]) -> Result<Decimal> {
    items.iter().try_fold(Decimal::ZERO, |acc, item| {
        acc.checked_add(item.line_total()?)
            .ok_or_else(LedgerError::total_overflow)
    })
}

/// Computes the invoice amount from its items and discount inputs.
///
/// The discount is taken off the subtotal only when `is_discount` is set.
/// The result never goes below zero. Totals outside the decimal range are
/// rejected as a validation error.
pub fn compute_amount(
    items: &[Item],
    is_discount: bool,
    discount_percentage: Decimal,
) -> Result<Decimal> {
    let mut total = subtotal(items)?;
    if is_discount {
        let discount = discount_percentage
            .checked_div(Decimal::ONE_HUNDRED)
            .and_then(|rate| total.checked_mul(rate))
            .ok_or_else(LedgerError::total_overflow)?;
        total = total
            .checked_sub(discount)
            .ok_or_else(LedgerError::total_overflow)?;
    }
    Ok(total.max(Decimal::ZERO))
}

/// Rejects items with a blank name or a negative price.
///
/// Quantities are unsigned, so negative values never get past deserialization.
pub fn validate_items(items: &[Item]) -> Result<()> {
    for (idx, item) in items.iter().enumerate() {
        if item.name.trim().is_empty() {
            return Err(LedgerError::validation(format!("items[{idx}].name is required")));
        }
        if item.unit_price < Decimal::ZERO {
            return Err(LedgerError::validation(format!(
                "items[{idx}].unit_price must be greater than or equal to 0"
            )));
        }
    }
    Ok(())
}

pub fn validate_discount_percentage(percentage: Decimal) -> Result<()> {
    if percentage < Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
        return Err(LedgerError::validation(
            "discount_percentage must be between 0 and 100",
        ));
    }
    Ok(())
}
