//! Void Invoice Use Case

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::events::InvoiceVoided;
use super::load_invoice;
use crate::invoice::entity::InvoiceStatus;
use crate::invoice::repository::InvoiceRepository;
use crate::mediator::Command;
use crate::shared::validation::required;
use crate::try_use_case;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoidInvoiceCommand {
    pub invoice_id: String,
    pub reason: String,
}

impl Command for VoidInvoiceCommand {
    type Output = InvoiceVoided;
}

pub struct VoidInvoiceUseCase<U: UnitOfWork> {
    invoices: Arc<InvoiceRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> VoidInvoiceUseCase<U> {
    pub fn new(invoices: Arc<InvoiceRepository>, unit_of_work: Arc<U>) -> Self {
        Self { invoices, unit_of_work }
    }

    pub async fn execute(&self, command: VoidInvoiceCommand, ctx: ExecutionContext) -> UseCaseResult<InvoiceVoided> {
        let reason = try_use_case!(required(&command.reason, "VOID_REASON_REQUIRED", "Void reason"));
        let mut invoice = try_use_case!(load_invoice(&self.invoices, &command.invoice_id).await);

        if invoice.status == InvoiceStatus::Void {
            return UseCaseResult::failure(UseCaseError::business_rule("ALREADY_VOID", "Invoice is already void"));
        }
        // Refund payments first so the money trail stays intact
        if invoice.amount_paid_cents > 0 {
            return UseCaseResult::failure(UseCaseError::business_rule(
                "INVOICE_HAS_PAYMENTS",
                "Refund all payments before voiding the invoice",
            ));
        }

        invoice.void(reason.as_str());
        let event = InvoiceVoided::new(&ctx, &invoice, &reason);
        self.unit_of_work.commit(&invoice, event, &command).await
    }
}

crate::impl_command_handler!(VoidInvoiceUseCase, VoidInvoiceCommand);
