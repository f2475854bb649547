//! Campaign report endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{error::AppResult, models::report::ReportResponse};

/// Report for every campaign
#[utoipa::path(
    get,
    path = "/api/report",
    tag = "reports",
    responses(
        (status = 200, description = "Campaign summaries", body = ReportResponse)
    )
)]
pub async fn get_report(State(state): State<crate::AppState>) -> AppResult<Json<ReportResponse>> {
    let rows = state.services.reports.all().await?;
    Ok(Json(ReportResponse { ok: true, rows }))
}

/// Report filtered to one campaign
#[utoipa::path(
    get,
    path = "/api/report/{campaign_name}",
    tag = "reports",
    params(("campaign_name" = String, Path, description = "Campaign name")),
    responses(
        (status = 200, description = "Campaign summary (empty rows when unknown)", body = ReportResponse)
    )
)]
pub async fn get_campaign_report(
    State(state): State<crate::AppState>,
    Path(campaign_name): Path<String>,
) -> AppResult<Json<ReportResponse>> {
    let rows = state.services.reports.for_campaign(&campaign_name).await?;
    Ok(Json(ReportResponse { ok: true, rows }))
}
