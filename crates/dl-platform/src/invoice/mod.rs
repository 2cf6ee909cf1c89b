//! Invoicing for sales and service orders.

pub mod api;
pub mod entity;
pub mod operations;
pub mod queries;
pub mod repository;

use std::sync::Arc;

pub use entity::{Invoice, InvoiceLine, InvoiceSource, InvoiceStatus};
pub use repository::{InvoiceFilter, InvoiceRepository};

use crate::mediator::Mediator;
use crate::usecase::UnitOfWork;
use crate::Repositories;
use operations::*;
use queries::{GetInvoiceQuery, InvoiceQueries, ListInvoicesQuery};

pub fn register<U: UnitOfWork + 'static>(mediator: &mut Mediator, repos: &Repositories, unit_of_work: &Arc<U>) {
    let invoices = &repos.invoices;
    mediator.register_command::<IssueSalesInvoiceCommand, _>(Arc::new(IssueSalesInvoiceUseCase::new(
        invoices.clone(),
        repos.sales_orders.clone(),
        repos.vehicles.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<IssueServiceInvoiceCommand, _>(Arc::new(IssueServiceInvoiceUseCase::new(
        invoices.clone(),
        repos.service_orders.clone(),
        unit_of_work.clone(),
    )));
    mediator.register_command::<VoidInvoiceCommand, _>(Arc::new(VoidInvoiceUseCase::new(
        invoices.clone(),
        unit_of_work.clone(),
    )));

    let queries = Arc::new(InvoiceQueries::new(invoices.clone()));
    mediator.register_query::<GetInvoiceQuery, _>(queries.clone());
    mediator.register_query::<ListInvoicesQuery, _>(queries);
}
