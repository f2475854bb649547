//! Campaign management endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppResult, ErrorResponse},
    models::{
        campaign::CreateCampaign,
        click::{ClickLogQuery, ClickLogResponse},
        report::CampaignCreatedResponse,
    },
};

use super::json_body;

/// Create a campaign with its UTM sources
#[utoipa::path(
    post,
    path = "/api/campaigns",
    tag = "campaigns",
    request_body = CreateCampaign,
    responses(
        (status = 201, description = "Campaign created", body = CampaignCreatedResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Campaign already exists", body = ErrorResponse)
    )
)]
pub async fn create_campaign(
    State(state): State<crate::AppState>,
    body: Result<Json<CreateCampaign>, JsonRejection>,
) -> AppResult<(StatusCode, Json<CampaignCreatedResponse>)> {
    let data = json_body(body)?;
    let campaign = state.services.campaigns.create(data).await?;
    let row = state.services.reports.row(&campaign);
    Ok((
        StatusCode::CREATED,
        Json(CampaignCreatedResponse {
            ok: true,
            campaign: row,
        }),
    ))
}

/// Recent click events of a campaign
#[utoipa::path(
    get,
    path = "/api/campaigns/{campaign_name}/clicks",
    tag = "campaigns",
    params(
        ("campaign_name" = String, Path, description = "Campaign name"),
        ClickLogQuery
    ),
    responses(
        (status = 200, description = "Click events, newest first", body = ClickLogResponse),
        (status = 404, description = "Unknown campaign", body = ErrorResponse)
    )
)]
pub async fn list_clicks(
    State(state): State<crate::AppState>,
    Path(campaign_name): Path<String>,
    Query(query): Query<ClickLogQuery>,
) -> AppResult<Json<ClickLogResponse>> {
    let clicks = state
        .services
        .campaigns
        .click_log(&campaign_name, query.limit)
        .await?;
    Ok(Json(ClickLogResponse { ok: true, clicks }))
}
