//! Invoice Operations

pub mod events;
pub mod issue;
pub mod void;

pub use events::*;
pub use issue::{IssueSalesInvoiceCommand, IssueSalesInvoiceUseCase, IssueServiceInvoiceCommand, IssueServiceInvoiceUseCase};
pub use void::{VoidInvoiceCommand, VoidInvoiceUseCase};

use super::entity::Invoice;
use super::repository::InvoiceRepository;
use crate::usecase::UseCaseError;

pub(crate) async fn load_invoice(invoices: &InvoiceRepository, id: &str) -> Result<Invoice, UseCaseError> {
    invoices
        .find_by_id(id)
        .await?
        .ok_or_else(|| UseCaseError::not_found("INVOICE_NOT_FOUND", format!("Invoice '{}' not found", id)))
}
