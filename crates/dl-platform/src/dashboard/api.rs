//! Dashboard API

use axum::{extract::State, Json};
use utoipa_axum::{router::OpenApiRouter, routes};

use super::queries::{DashboardSummary, GetDashboardSummaryQuery};
use crate::shared::api_common::MediatorState;
use crate::shared::authorization::checks;
use crate::shared::error::PlatformError;
use crate::shared::middleware::Authenticated;
use crate::user::permissions;

/// Headline numbers for managers
#[utoipa::path(
    get,
    path = "/summary",
    tag = "dashboard",
    operation_id = "getApiDashboardSummary",
    responses(
        (status = 200, description = "Dashboard summary", body = DashboardSummary),
        (status = 403, description = "Missing dashboard:read")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_dashboard_summary(
    State(state): State<MediatorState>,
    auth: Authenticated,
) -> Result<Json<DashboardSummary>, PlatformError> {
    checks::require(&auth, permissions::DASHBOARD_READ)?;
    let summary = state.mediator.query(GetDashboardSummaryQuery::default()).await?;
    Ok(Json(summary))
}

pub fn dashboard_router(state: MediatorState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(get_dashboard_summary))
        .with_state(state)
}
