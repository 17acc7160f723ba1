//! Cart math: pure functions of the item list, recomputed on every change.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{CartItem, Medicine, Money};

/// Orders above this subtotal ship free.
const FREE_SHIPPING_THRESHOLD: Money = 500_000;
const FLAT_SHIPPING_COST: Money = 30_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub sub_total: Money,
    pub shipping_cost: Money,
    pub tax: Money,
    pub grand_total: Money,
}

/// Compute all four figures from the item list. Only the tax figure rounds
/// (half-up); everything else is exact integer arithmetic.
pub fn compute_totals(items: &[CartItem]) -> CartTotals {
    let sub_total: Money = items
        .iter()
        .map(|item| item.price_snapshot * item.quantity as Money)
        .sum();

    let shipping_cost = if sub_total > FREE_SHIPPING_THRESHOLD {
        0
    } else {
        FLAT_SHIPPING_COST
    };

    let tax = tax_half_up(sub_total);

    CartTotals {
        sub_total,
        shipping_cost,
        tax,
        grand_total: sub_total + shipping_cost + tax,
    }
}

/// 10% tax, rounded half-up on the integer subtotal.
fn tax_half_up(sub_total: Money) -> Money {
    (sub_total + 5) / 10
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    #[error("quantity for {medicine_id} must be at least 1")]
    BelowMinimum { medicine_id: String },

    #[error("quantity {requested} for {medicine_id} exceeds the limit of {limit}")]
    AboveLimit {
        medicine_id: String,
        requested: u32,
        limit: u32,
    },
}

/// Enforce `1 <= quantity <= limit_quantity` (unbounded when no limit is
/// set).
pub fn validate_quantity(medicine: &Medicine, quantity: u32) -> Result<(), QuantityError> {
    if quantity < 1 {
        return Err(QuantityError::BelowMinimum {
            medicine_id: medicine.id.clone(),
        });
    }
    if let Some(limit) = medicine.limit_quantity {
        if quantity > limit {
            return Err(QuantityError::AboveLimit {
                medicine_id: medicine.id.clone(),
                requested: quantity,
                limit,
            });
        }
    }
    Ok(())
}
