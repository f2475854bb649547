//! Click tracking models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Entry of the append-only click log
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ClickEvent {
    pub id: Uuid,
    pub link_code: String,
    pub utm_source: String,
    pub campaign_name: String,
    pub ip: String,
    pub user_agent: Option<String>,
    pub screen_width: Option<i32>,
    pub screen_height: Option<i32>,
    pub language: Option<String>,
    pub timezone: Option<String>,
    pub clicked_at: DateTime<Utc>,
}

/// Click event about to be appended to the log
#[derive(Debug, Clone)]
pub struct NewClickEvent {
    pub link_code: String,
    pub utm_source: String,
    pub campaign_name: String,
    pub ip: String,
    pub user_agent: Option<String>,
    pub screen_width: Option<i32>,
    pub screen_height: Option<i32>,
    pub language: Option<String>,
    pub timezone: Option<String>,
    pub clicked_at: DateTime<Utc>,
}

impl NewClickEvent {
    pub fn into_event(self, id: Uuid) -> ClickEvent {
        ClickEvent {
            id,
            link_code: self.link_code,
            utm_source: self.utm_source,
            campaign_name: self.campaign_name,
            ip: self.ip,
            user_agent: self.user_agent,
            screen_width: self.screen_width,
            screen_height: self.screen_height,
            language: self.language,
            timezone: self.timezone,
            clicked_at: self.clicked_at,
        }
    }
}

/// Body of `POST /api/track`
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackClickRequest {
    /// Referral token taken from the `?ref=` query of the shared link
    #[serde(rename = "ref")]
    pub ref_code: Option<String>,
    pub user_agent: Option<String>,
    pub screen_width: Option<i32>,
    pub screen_height: Option<i32>,
    pub language: Option<String>,
    pub timezone: Option<String>,
}

/// Response of `POST /api/track`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TrackClickResponse {
    pub ok: bool,
    pub message: String,
    #[serde(rename = "campaignName")]
    pub campaign_name: String,
    #[serde(rename = "campaignerName")]
    pub campaigner_name: String,
    pub utm_source: String,
    pub link_code: String,
    pub ip: String,
    pub total: i64,
    pub unique: i64,
}

/// Outcome of a hit on the legacy `/r/:code` path
#[derive(Debug, Clone)]
pub struct LegacyClick {
    pub campaign_name: String,
    /// Source labels of the campaign, with the campaigner name when set
    pub sources: Vec<String>,
    pub total: i64,
    pub unique: i64,
}

/// Query parameters for the click log
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ClickLogQuery {
    /// Maximum number of events (default 100, max 1000)
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClickLogResponse {
    pub ok: bool,
    pub clicks: Vec<ClickEvent>,
}
