//! Campaign report rows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::campaign::Conversion;

/// Per-source detail of a report row
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CampaignerReport {
    pub utm_source: String,
    pub total_clicks: i64,
    pub unique_clicks: i64,
    /// Shareable tracking link carrying the referral token
    pub link: String,
    pub conversions: Vec<Conversion>,
}

/// Summary of one campaign
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportRow {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub campaign_name: String,
    pub link_code: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "totalClicks")]
    pub total_clicks: i64,
    #[serde(rename = "totalUniques")]
    pub total_uniques: i64,
    pub campaigners: Vec<CampaignerReport>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReportResponse {
    pub ok: bool,
    pub rows: Vec<ReportRow>,
}

/// Response of `POST /api/campaigns`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CampaignCreatedResponse {
    pub ok: bool,
    pub campaign: ReportRow,
}
