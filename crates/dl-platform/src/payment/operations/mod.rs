//! Payment Operations
//!
//! Every payment write updates its invoice in the same commit.

pub mod events;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use events::*;

use crate::details;
use crate::invoice::entity::InvoiceStatus;
use crate::invoice::operations::load_invoice;
use crate::invoice::repository::InvoiceRepository;
use crate::mediator::Command;
use crate::payment::entity::{Payment, PaymentMethod, PaymentStatus};
use crate::payment::repository::PaymentRepository;
use crate::shared::validation::optional;
use crate::try_use_case;
use crate::usecase::{ExecutionContext, SerializableAggregate, UnitOfWork, UseCaseError, UseCaseResult};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentCommand {
    pub invoice_id: String,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    #[serde(default)]
    pub reference: Option<String>,
}

impl Command for RecordPaymentCommand {
    type Output = PaymentRecorded;
}

pub struct RecordPaymentUseCase<U: UnitOfWork> {
    invoices: Arc<InvoiceRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> RecordPaymentUseCase<U> {
    pub fn new(invoices: Arc<InvoiceRepository>, unit_of_work: Arc<U>) -> Self {
        Self { invoices, unit_of_work }
    }

    pub async fn execute(&self, command: RecordPaymentCommand, ctx: ExecutionContext) -> UseCaseResult<PaymentRecorded> {
        if command.amount_cents <= 0 {
            return UseCaseResult::failure(UseCaseError::validation(
                "INVALID_AMOUNT",
                "Payment amount must be positive",
            ));
        }

        let mut invoice = try_use_case!(load_invoice(&self.invoices, &command.invoice_id).await);
        match invoice.status {
            InvoiceStatus::Void => {
                return UseCaseResult::failure(UseCaseError::business_rule("INVOICE_VOID", "Invoice is void"))
            }
            InvoiceStatus::Paid => {
                return UseCaseResult::failure(UseCaseError::business_rule("INVOICE_PAID", "Invoice is already paid"))
            }
            InvoiceStatus::Issued | InvoiceStatus::PartiallyPaid => {}
        }

        let balance = invoice.balance_cents();
        if command.amount_cents > balance {
            return UseCaseResult::failure(UseCaseError::business_rule_with_details(
                "AMOUNT_EXCEEDS_BALANCE",
                "Payment is larger than the invoice balance",
                details! { "balanceCents" => balance, "amountCents" => command.amount_cents },
            ));
        }

        let mut payment = Payment::new(
            invoice.id.as_str(),
            invoice.customer_id.as_str(),
            command.amount_cents,
            command.method,
            ctx.principal_id.as_str(),
        );
        payment.reference = optional(command.reference.as_deref());
        invoice.apply_payment(command.amount_cents);

        let event = PaymentRecorded::new(&ctx, &payment, &invoice);
        let aggregates: Vec<Box<dyn SerializableAggregate>> = vec![Box::new(payment), Box::new(invoice)];
        self.unit_of_work.commit_all(aggregates, event, &command).await
    }
}

crate::impl_command_handler!(RecordPaymentUseCase, RecordPaymentCommand);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundPaymentCommand {
    pub payment_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl Command for RefundPaymentCommand {
    type Output = PaymentRefunded;
}

pub struct RefundPaymentUseCase<U: UnitOfWork> {
    payments: Arc<PaymentRepository>,
    invoices: Arc<InvoiceRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> RefundPaymentUseCase<U> {
    pub fn new(payments: Arc<PaymentRepository>, invoices: Arc<InvoiceRepository>, unit_of_work: Arc<U>) -> Self {
        Self {
            payments,
            invoices,
            unit_of_work,
        }
    }

    pub async fn execute(&self, command: RefundPaymentCommand, ctx: ExecutionContext) -> UseCaseResult<PaymentRefunded> {
        let Some(mut payment) = try_use_case!(self.payments.find_by_id(&command.payment_id).await) else {
            return UseCaseResult::failure(UseCaseError::not_found(
                "PAYMENT_NOT_FOUND",
                format!("Payment '{}' not found", command.payment_id),
            ));
        };
        if payment.status == PaymentStatus::Refunded {
            return UseCaseResult::failure(UseCaseError::business_rule(
                "ALREADY_REFUNDED",
                "Payment has already been refunded",
            ));
        }

        let mut invoice = try_use_case!(load_invoice(&self.invoices, &payment.invoice_id).await);
        payment.refund(optional(command.reason.as_deref()));
        invoice.reverse_payment(payment.amount_cents);

        let event = PaymentRefunded::new(&ctx, &payment, &invoice);
        let aggregates: Vec<Box<dyn SerializableAggregate>> = vec![Box::new(payment), Box::new(invoice)];
        self.unit_of_work.commit_all(aggregates, event, &command).await
    }
}

crate::impl_command_handler!(RefundPaymentUseCase, RefundPaymentCommand);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::entity::{Invoice, InvoiceLine, InvoiceSource};
    use crate::store::DocumentStore;
    use crate::test_support::{ctx, Memory};

    async fn seed_invoice(mem: &Memory, amount: i64) -> Invoice {
        let lines = vec![InvoiceLine::new("Service", 1, amount).unwrap()];
        let invoice = Invoice::issue("C1", InvoiceSource::ServiceOrder, "SVC1", lines, 0).unwrap();
        mem.put(&invoice).await;
        invoice
    }

    fn pay(invoice_id: &str, amount_cents: i64) -> RecordPaymentCommand {
        RecordPaymentCommand {
            invoice_id: invoice_id.into(),
            amount_cents,
            method: PaymentMethod::Card,
            reference: Some("AUTH-123".into()),
        }
    }

    #[tokio::test]
    async fn test_partial_then_full_payment() {
        let mem = Memory::new();
        let invoices = Arc::new(InvoiceRepository::new(mem.dyn_store()));
        let invoice = seed_invoice(&mem, 10_000).await;
        let uc = RecordPaymentUseCase::new(invoices.clone(), mem.uow.clone());

        let first = uc.execute(pay(&invoice.id, 4_000), ctx()).await.unwrap();
        assert_eq!(first.invoice_status, InvoiceStatus::PartiallyPaid);
        assert_eq!(first.invoice_balance_cents, 6_000);

        let over = uc.execute(pay(&invoice.id, 6_001), ctx()).await;
        assert_eq!(over.unwrap_err().code(), "AMOUNT_EXCEEDS_BALANCE");

        let last = uc.execute(pay(&invoice.id, 6_000), ctx()).await.unwrap();
        assert_eq!(last.invoice_status, InvoiceStatus::Paid);
        assert_eq!(uc.execute(pay(&invoice.id, 1), ctx()).await.unwrap_err().code(), "INVOICE_PAID");
        assert_eq!(uc.execute(pay(&invoice.id, 0), ctx()).await.unwrap_err().code(), "INVALID_AMOUNT");
    }

    #[tokio::test]
    async fn test_void_invoice_rejects_payment() {
        let mem = Memory::new();
        let invoices = Arc::new(InvoiceRepository::new(mem.dyn_store()));
        let mut invoice = seed_invoice(&mem, 10_000).await;
        invoice.void("duplicate");
        mem.put(&invoice).await;

        let uc = RecordPaymentUseCase::new(invoices, mem.uow.clone());
        assert_eq!(uc.execute(pay(&invoice.id, 100), ctx()).await.unwrap_err().code(), "INVOICE_VOID");
    }

    #[tokio::test]
    async fn test_refund_reverses_invoice() {
        let mem = Memory::new();
        let invoices = Arc::new(InvoiceRepository::new(mem.dyn_store()));
        let payments = Arc::new(PaymentRepository::new(mem.dyn_store()));
        let invoice = seed_invoice(&mem, 10_000).await;

        let record = RecordPaymentUseCase::new(invoices.clone(), mem.uow.clone());
        let paid = record.execute(pay(&invoice.id, 10_000), ctx()).await.unwrap();

        let refund = RefundPaymentUseCase::new(payments.clone(), invoices.clone(), mem.uow.clone());
        let cmd = RefundPaymentCommand {
            payment_id: paid.payment_id.clone(),
            reason: Some("Card dispute".into()),
        };
        let event = refund.execute(cmd.clone(), ctx()).await.unwrap();
        assert_eq!(event.invoice_status, InvoiceStatus::Issued);
        assert_eq!(event.invoice_balance_cents, 10_000);

        let stored = payments.find_by_id(&paid.payment_id).await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Refunded);
        assert_eq!(refund.execute(cmd, ctx()).await.unwrap_err().code(), "ALREADY_REFUNDED");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_full_payments_settle_once() {
        let mem = Memory::new();
        let invoices = Arc::new(InvoiceRepository::new(mem.dyn_store()));
        let invoice = seed_invoice(&mem, 10_000).await;
        let uc = Arc::new(RecordPaymentUseCase::new(invoices.clone(), mem.uow.clone()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let uc = uc.clone();
                let command = pay(&invoice.id, 10_000);
                tokio::spawn(async move { uc.execute(command, ctx()).await.into_result() })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(e) => assert!(
                    ["CONCURRENT_MODIFICATION", "INVOICE_PAID"].contains(&e.code()),
                    "unexpected rejection {}",
                    e
                ),
            }
        }
        assert_eq!(accepted, 1);

        let stored = invoices.find_by_id(&invoice.id).await.unwrap().unwrap();
        assert_eq!(stored.amount_paid_cents, 10_000);
        assert_eq!(stored.status, InvoiceStatus::Paid);
        assert_eq!(mem.store.count("payments", bson::doc! {}).await.unwrap(), 1);
    }
}
