//! Management dashboard.

pub mod api;
pub mod queries;

use std::sync::Arc;

use crate::mediator::Mediator;
use crate::Repositories;
use queries::{DashboardQueries, GetDashboardSummaryQuery};

pub fn register(mediator: &mut Mediator, repos: &Repositories) {
    mediator.register_query::<GetDashboardSummaryQuery, _>(Arc::new(DashboardQueries::new(repos.clone())));
}
