//! Invoice Entity

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Duration, Utc};
use dl_common::money::{checked_sum, MoneyError, Totals};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::tsid::TsidGenerator;
use crate::usecase::HasId;

/// Days between issue and due date.
pub const PAYMENT_TERMS_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceSource {
    SalesOrder,
    ServiceOrder,
}

impl InvoiceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceSource::SalesOrder => "SALES_ORDER",
            InvoiceSource::ServiceOrder => "SERVICE_ORDER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Issued,
    PartiallyPaid,
    Paid,
    Void,
}

impl InvoiceStatus {
    pub const OUTSTANDING: [InvoiceStatus; 2] = [InvoiceStatus::Issued, InvoiceStatus::PartiallyPaid];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Issued => "ISSUED",
            InvoiceStatus::PartiallyPaid => "PARTIALLY_PAID",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Void => "VOID",
        }
    }

    pub fn is_outstanding(&self) -> bool {
        Self::OUTSTANDING.contains(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub description: String,
    pub quantity: u32,
    /// Negative for credits such as discounts and trade-ins
    pub unit_price_cents: i64,
    pub amount_cents: i64,
}

impl InvoiceLine {
    pub fn new(description: impl Into<String>, quantity: u32, unit_price_cents: i64) -> Result<Self, MoneyError> {
        let amount_cents = unit_price_cents
            .checked_mul(quantity as i64)
            .ok_or(MoneyError::Overflow)?;
        Ok(Self {
            description: description.into(),
            quantity,
            unit_price_cents,
            amount_cents,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(rename = "_id")]
    pub id: String,

    /// Bumped by every commit; a stale write is rejected
    #[serde(default)]
    pub version: i64,

    /// `INV-<tsid>`
    pub invoice_number: String,

    pub customer_id: String,
    pub source_type: InvoiceSource,
    pub source_id: String,

    pub lines: Vec<InvoiceLine>,
    pub tax_rate_bps: u32,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub amount_paid_cents: i64,

    pub status: InvoiceStatus,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub issued_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub due_at: DateTime<Utc>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime_optional"
    )]
    pub paid_at: Option<DateTime<Utc>>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime_optional"
    )]
    pub voided_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub void_reason: Option<String>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Issue an invoice now; totals come from the lines and the tax rate.
    pub fn issue(
        customer_id: impl Into<String>,
        source_type: InvoiceSource,
        source_id: impl Into<String>,
        lines: Vec<InvoiceLine>,
        tax_rate_bps: u32,
    ) -> Result<Self, MoneyError> {
        let subtotal = checked_sum(lines.iter().map(|l| l.amount_cents))?;
        let totals = Totals::with_tax(subtotal, tax_rate_bps)?;
        let now = Utc::now();
        // Nothing to collect: settled on issue
        let (status, paid_at) = if totals.total_cents == 0 {
            (InvoiceStatus::Paid, Some(now))
        } else {
            (InvoiceStatus::Issued, None)
        };
        Ok(Self {
            id: TsidGenerator::generate(),
            version: 0,
            invoice_number: TsidGenerator::prefixed("INV"),
            customer_id: customer_id.into(),
            source_type,
            source_id: source_id.into(),
            lines,
            tax_rate_bps,
            subtotal_cents: totals.subtotal_cents,
            tax_cents: totals.tax_cents,
            total_cents: totals.total_cents,
            amount_paid_cents: 0,
            status,
            issued_at: now,
            due_at: now + Duration::days(PAYMENT_TERMS_DAYS),
            paid_at,
            voided_at: None,
            void_reason: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn balance_cents(&self) -> i64 {
        self.total_cents - self.amount_paid_cents
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status.is_outstanding() && now > self.due_at
    }

    /// Credit a payment. Callers check `0 < amount <= balance`.
    pub fn apply_payment(&mut self, amount_cents: i64) {
        self.amount_paid_cents += amount_cents;
        self.refresh_status();
    }

    /// Undo a refunded payment.
    pub fn reverse_payment(&mut self, amount_cents: i64) {
        self.amount_paid_cents = (self.amount_paid_cents - amount_cents).max(0);
        self.refresh_status();
    }

    pub fn void(&mut self, reason: impl Into<String>) {
        let now = Utc::now();
        self.status = InvoiceStatus::Void;
        self.void_reason = Some(reason.into());
        self.voided_at = Some(now);
        self.updated_at = now;
    }

    fn refresh_status(&mut self) {
        let now = Utc::now();
        if self.amount_paid_cents >= self.total_cents {
            self.status = InvoiceStatus::Paid;
            self.paid_at = Some(now);
        } else {
            self.status = if self.amount_paid_cents > 0 {
                InvoiceStatus::PartiallyPaid
            } else {
                InvoiceStatus::Issued
            };
            self.paid_at = None;
        }
        self.updated_at = now;
    }
}

impl HasId for Invoice {
    fn id(&self) -> &str {
        &self.id
    }

    fn collection_name() -> &'static str {
        "invoices"
    }

    fn version(&self) -> Option<i64> {
        Some(self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice() -> Invoice {
        let lines = vec![
            InvoiceLine::new("2021 Toyota Corolla", 1, 2_000_000).unwrap(),
            InvoiceLine::new("Discount", 1, -100_000).unwrap(),
        ];
        Invoice::issue("C1", InvoiceSource::SalesOrder, "SO1", lines, 1_000).unwrap()
    }

    #[test]
    fn test_totals_from_signed_lines() {
        let inv = invoice();
        assert!(inv.invoice_number.starts_with("INV-"));
        assert_eq!(inv.subtotal_cents, 1_900_000);
        assert_eq!(inv.tax_cents, 190_000);
        assert_eq!(inv.total_cents, 2_090_000);
        assert_eq!(inv.due_at - inv.issued_at, Duration::days(30));
    }

    #[test]
    fn test_payment_status_progression() {
        let mut inv = invoice();
        inv.apply_payment(90_000);
        assert_eq!(inv.status, InvoiceStatus::PartiallyPaid);
        assert_eq!(inv.balance_cents(), 2_000_000);

        inv.apply_payment(2_000_000);
        assert_eq!(inv.status, InvoiceStatus::Paid);
        assert!(inv.paid_at.is_some());

        inv.reverse_payment(2_090_000);
        assert_eq!(inv.status, InvoiceStatus::Issued);
        assert_eq!(inv.amount_paid_cents, 0);
        assert!(inv.paid_at.is_none());
    }

    #[test]
    fn test_overdue() {
        let mut inv = invoice();
        let later = inv.due_at + Duration::days(1);
        assert!(!inv.is_overdue(Utc::now()));
        assert!(inv.is_overdue(later));
        inv.apply_payment(inv.total_cents);
        assert!(!inv.is_overdue(later));
    }

    #[test]
    fn test_zero_total_is_settled_on_issue() {
        let lines = vec![
            InvoiceLine::new("2019 Honda Fit", 1, 900_000).unwrap(),
            InvoiceLine::new("Goodwill discount", 1, -900_000).unwrap(),
        ];
        let inv = Invoice::issue("C1", InvoiceSource::SalesOrder, "SO1", lines, 825).unwrap();
        assert_eq!(inv.total_cents, 0);
        assert_eq!(inv.status, InvoiceStatus::Paid);
        assert!(inv.paid_at.is_some());
        assert!(!inv.is_overdue(inv.due_at + Duration::days(1)));
    }
}
