//! Payment Entity

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::tsid::TsidGenerator;
use crate::usecase::HasId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    Financing,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Card => "CARD",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
            PaymentMethod::Financing => "FINANCING",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Completed,
    Refunded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(rename = "_id")]
    pub id: String,

    /// Bumped by every commit; a stale write is rejected
    #[serde(default)]
    pub version: i64,

    /// `PAY-<tsid>`
    pub payment_number: String,

    pub invoice_id: String,
    pub customer_id: String,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,

    /// Card authorization, transfer reference or lender contract number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Principal who took the payment
    pub received_by: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_reason: Option<String>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime_optional"
    )]
    pub refunded_at: Option<DateTime<Utc>>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(
        invoice_id: impl Into<String>,
        customer_id: impl Into<String>,
        amount_cents: i64,
        method: PaymentMethod,
        received_by: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TsidGenerator::generate(),
            version: 0,
            payment_number: TsidGenerator::prefixed("PAY"),
            invoice_id: invoice_id.into(),
            customer_id: customer_id.into(),
            amount_cents,
            method,
            status: PaymentStatus::Completed,
            reference: None,
            received_by: received_by.into(),
            refund_reason: None,
            refunded_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn refund(&mut self, reason: Option<String>) {
        let now = Utc::now();
        self.status = PaymentStatus::Refunded;
        self.refund_reason = reason;
        self.refunded_at = Some(now);
        self.updated_at = now;
    }
}

impl HasId for Payment {
    fn id(&self) -> &str {
        &self.id
    }

    fn collection_name() -> &'static str {
        "payments"
    }

    fn version(&self) -> Option<i64> {
        Some(self.version)
    }
}
