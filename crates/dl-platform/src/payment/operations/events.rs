//! Payment Domain Events

use serde::{Deserialize, Serialize};

use crate::impl_domain_event;
use crate::invoice::entity::{Invoice, InvoiceStatus};
use crate::payment::entity::{Payment, PaymentMethod};
use crate::usecase::{EventMetadata, ExecutionContext};

const DOMAIN: &str = "billing";
const AGGREGATE: &str = "payment";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecorded {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub payment_id: String,
    pub invoice_id: String,
    pub customer_id: String,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub invoice_status: InvoiceStatus,
    pub invoice_balance_cents: i64,
}

impl_domain_event!(PaymentRecorded);

impl PaymentRecorded {
    pub fn new(ctx: &ExecutionContext, payment: &Payment, invoice: &Invoice) -> Self {
        Self {
            metadata: EventMetadata::for_aggregate(ctx, DOMAIN, AGGREGATE, "recorded", &payment.id),
            payment_id: payment.id.clone(),
            invoice_id: invoice.id.clone(),
            customer_id: payment.customer_id.clone(),
            amount_cents: payment.amount_cents,
            method: payment.method,
            invoice_status: invoice.status,
            invoice_balance_cents: invoice.balance_cents(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRefunded {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub payment_id: String,
    pub invoice_id: String,
    pub amount_cents: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub invoice_status: InvoiceStatus,
    pub invoice_balance_cents: i64,
}

impl_domain_event!(PaymentRefunded);

impl PaymentRefunded {
    pub fn new(ctx: &ExecutionContext, payment: &Payment, invoice: &Invoice) -> Self {
        Self {
            metadata: EventMetadata::for_aggregate(ctx, DOMAIN, AGGREGATE, "refunded", &payment.id),
            payment_id: payment.id.clone(),
            invoice_id: invoice.id.clone(),
            amount_cents: payment.amount_cents,
            reason: payment.refund_reason.clone(),
            invoice_status: invoice.status,
            invoice_balance_cents: invoice.balance_cents(),
        }
    }
}
