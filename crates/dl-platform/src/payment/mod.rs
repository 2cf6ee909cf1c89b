//! Payments taken against invoices.

pub mod api;
pub mod entity;
pub mod operations;
pub mod queries;
pub mod repository;

use std::sync::Arc;

pub use entity::{Payment, PaymentMethod, PaymentStatus};
pub use repository::PaymentRepository;

use crate::mediator::Mediator;
use crate::usecase::UnitOfWork;
use crate::Repositories;
use operations::*;
use queries::{GetPaymentQuery, ListPaymentsQuery, PaymentQueries};

pub fn register<U: UnitOfWork + 'static>(mediator: &mut Mediator, repos: &Repositories, unit_of_work: &Arc<U>) {
    mediator.register_command::<RecordPaymentCommand, _>(Arc::new(RecordPaymentUseCase::new(
        repos.invoices.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<RefundPaymentCommand, _>(Arc::new(RefundPaymentUseCase::new(
        repos.payments.clone(),
        repos.invoices.clone(),
        unit_of_work.clone(),
    )));

    let queries = Arc::new(PaymentQueries::new(repos.payments.clone()));
    mediator.register_query::<GetPaymentQuery, _>(queries.clone());
    mediator.register_query::<ListPaymentsQuery, _>(queries);
}
