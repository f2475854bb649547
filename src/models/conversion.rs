//! Lead conversion models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::campaign::Conversion;

/// Body of `POST /api/track/utm-campaign-lead`
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversion {
    pub client_name: Option<String>,
    /// Required; compared case-insensitively
    pub client_email: Option<String>,
    /// Stored as "Not Provided" when absent
    pub client_phone: Option<String>,
    /// Required; label of the UTM source the lead came from
    pub utm_source: Option<String>,
}

/// Conversion about to be persisted
#[derive(Debug, Clone)]
pub struct NewConversion {
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub booked_at: DateTime<Utc>,
}

/// Result of a conversion insert at the storage layer
#[derive(Debug, Clone)]
pub enum ConversionInsert {
    Created(Conversion),
    AlreadyExists,
}

/// Response of `POST /api/track/utm-campaign-lead`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResponse {
    pub ok: bool,
    pub message: String,
    pub already_exists: bool,
    pub campaign_name: String,
    pub utm_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion: Option<Conversion>,
}
