//! Money arithmetic in minor units.
//!
//! Amounts are `i64` cents. Rates are basis points (1 bp = 0.01%).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 100% expressed in basis points.
pub const BASIS_POINTS_SCALE: i64 = 10_000;

/// Highest tax rate accepted anywhere in the system (50%).
pub const MAX_TAX_RATE_BPS: u32 = 5_000;

/// Largest single price accepted (1,000,000,000.00).
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount must not be negative: {0}")]
    Negative(i64),

    #[error("amount overflow")]
    Overflow,

    #[error("rate {0} bps exceeds the maximum of {max} bps", max = MAX_TAX_RATE_BPS)]
    RateTooHigh(u32),
}

/// Apply a basis-point rate to an amount, rounding half away from zero.
pub fn apply_rate(amount_cents: i64, rate_bps: u32) -> i64 {
    let product = amount_cents as i128 * rate_bps as i128;
    let scale = BASIS_POINTS_SCALE as i128;
    let half = scale / 2;
    let rounded = if product >= 0 {
        (product + half) / scale
    } else {
        (product - half) / scale
    };
    rounded as i64
}

pub fn validate_rate(rate_bps: u32) -> Result<u32, MoneyError> {
    if rate_bps > MAX_TAX_RATE_BPS {
        return Err(MoneyError::RateTooHigh(rate_bps));
    }
    Ok(rate_bps)
}

pub fn non_negative(amount_cents: i64) -> Result<i64, MoneyError> {
    if amount_cents < 0 {
        return Err(MoneyError::Negative(amount_cents));
    }
    Ok(amount_cents)
}

/// Sum amounts, failing instead of wrapping.
pub fn checked_sum<I: IntoIterator<Item = i64>>(amounts: I) -> Result<i64, MoneyError> {
    amounts
        .into_iter()
        .try_fold(0i64, |acc, v| acc.checked_add(v))
        .ok_or(MoneyError::Overflow)
}

/// Subtotal, tax and total for a taxable amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

impl Totals {
    pub fn with_tax(subtotal_cents: i64, tax_rate_bps: u32) -> Result<Self, MoneyError> {
        let tax_rate_bps = validate_rate(tax_rate_bps)?;
        let tax_cents = apply_rate(subtotal_cents, tax_rate_bps);
        let total_cents = subtotal_cents.checked_add(tax_cents).ok_or(MoneyError::Overflow)?;
        Ok(Self {
            subtotal_cents,
            tax_cents,
            total_cents,
        })
    }
}

/// Render cents as a plain decimal string, e.g. `-12.05`.
pub fn format_cents(amount_cents: i64) -> String {
    let sign = if amount_cents < 0 { "-" } else { "" };
    let abs = amount_cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}
