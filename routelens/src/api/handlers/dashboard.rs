//! HTTP handler for the dashboard summary endpoint.

use axum::{Json, extract::State};
use chrono::Utc;
use tracing::{debug, instrument};

use crate::{AppState, api::models::DashboardResponse, db::handlers::dashboard, errors::Result};

#[utoipa::path(
    get,
    path = "/dashboard_data",
    tag = "dashboard",
    summary = "Get dashboard summary",
    description = "Recomputes the full cost-analytics summary from the call-record store: totals, \
                   provider splits, savings, and the monthly and daily comparison windows.",
    responses(
        (status = 200, description = "Dashboard summary", body = DashboardResponse),
        (status = 500, description = "Database error"),
    )
)]
#[instrument(skip_all)]
pub async fn get_dashboard_data(State(state): State<AppState>) -> Result<Json<DashboardResponse>> {
    debug!("Dashboard data requested");

    let summary = dashboard::get_dashboard_summary(&state.db, Utc::now()).await?;

    Ok(Json(summary))
}
