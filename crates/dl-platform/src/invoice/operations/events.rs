//! Invoice Domain Events

use serde::{Deserialize, Serialize};

use crate::impl_domain_event;
use crate::invoice::entity::{Invoice, InvoiceSource};
use crate::usecase::{EventMetadata, ExecutionContext};

const DOMAIN: &str = "billing";
const AGGREGATE: &str = "invoice";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceIssued {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub invoice_id: String,
    pub invoice_number: String,
    pub customer_id: String,
    pub source_type: InvoiceSource,
    pub source_id: String,
    pub total_cents: i64,
}

impl_domain_event!(InvoiceIssued);

impl InvoiceIssued {
    pub fn new(ctx: &ExecutionContext, invoice: &Invoice) -> Self {
        Self {
            metadata: EventMetadata::for_aggregate(ctx, DOMAIN, AGGREGATE, "issued", &invoice.id),
            invoice_id: invoice.id.clone(),
            invoice_number: invoice.invoice_number.clone(),
            customer_id: invoice.customer_id.clone(),
            source_type: invoice.source_type,
            source_id: invoice.source_id.clone(),
            total_cents: invoice.total_cents,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceVoided {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub invoice_id: String,
    pub reason: String,
}

impl_domain_event!(InvoiceVoided);

impl InvoiceVoided {
    pub fn new(ctx: &ExecutionContext, invoice: &Invoice, reason: &str) -> Self {
        Self {
            metadata: EventMetadata::for_aggregate(ctx, DOMAIN, AGGREGATE, "voided", &invoice.id),
            invoice_id: invoice.id.clone(),
            reason: reason.to_string(),
        }
    }
}
