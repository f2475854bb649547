//! Campaign, UTM source and conversion models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Phone stored for leads that did not give one
pub const PHONE_NOT_PROVIDED: &str = "Not Provided";

/// Case-insensitive comparison used for source labels and lead emails
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Campaign document with its UTM sources and their conversions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub campaign_name: String,
    /// Short code served by the legacy `/r/:code` path
    pub link_code: String,
    /// Legacy campaign-level counters (only touched by `/r/:code`)
    pub total_clicks: i64,
    pub unique_clicks: i64,
    pub unique_ips: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub sources: Vec<UtmSource>,
}

impl Campaign {
    /// Find a source by label, ignoring case
    pub fn source(&self, label: &str) -> Option<&UtmSource> {
        self.sources
            .iter()
            .find(|s| eq_ignore_case(&s.utm_source, label))
    }

    /// Sum of per-source total clicks
    pub fn sources_total_clicks(&self) -> i64 {
        self.sources.iter().map(|s| s.total_clicks).sum()
    }

    /// Sum of per-source unique clicks
    pub fn sources_unique_clicks(&self) -> i64 {
        self.sources.iter().map(|s| s.unique_clicks).sum()
    }
}

/// UTM source tracked inside a campaign
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtmSource {
    pub id: Uuid,
    pub utm_source: String,
    pub campaigner_name: Option<String>,
    pub link_code: String,
    pub total_clicks: i64,
    pub unique_clicks: i64,
    pub unique_ips: Vec<String>,
    pub conversions: Vec<Conversion>,
    pub created_at: DateTime<Utc>,
}

impl UtmSource {
    /// Display name, falling back to the source label
    pub fn display_name(&self) -> &str {
        self.campaigner_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.utm_source)
    }

    pub fn has_conversion_for(&self, email: &str) -> bool {
        self.conversions
            .iter()
            .any(|c| eq_ignore_case(&c.client_email, email))
    }
}

/// Lead captured for a UTM source
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    pub id: Uuid,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub booked_at: DateTime<Utc>,
}

/// Counters returned after a click was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickCounts {
    pub total: i64,
    pub unique: i64,
}

/// Campaign ready to be persisted
#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub campaign_name: String,
    pub link_code: String,
    pub sources: Vec<NewUtmSource>,
}

#[derive(Debug, Clone)]
pub struct NewUtmSource {
    pub utm_source: String,
    pub campaigner_name: Option<String>,
    pub link_code: String,
}

/// Create campaign request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaign {
    #[validate(length(min = 1, max = 200, message = "campaignName must be 1-200 characters"))]
    pub campaign_name: String,
    #[validate(length(min = 1, message = "At least one UTM source is required"), nested)]
    pub sources: Vec<CreateUtmSource>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUtmSource {
    #[validate(length(min = 1, max = 200, message = "utmSource must be 1-200 characters"))]
    pub utm_source: String,
    pub campaigner_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(label: &str, total: i64, unique: i64) -> UtmSource {
        UtmSource {
            id: Uuid::new_v4(),
            utm_source: label.to_string(),
            campaigner_name: None,
            link_code: "abc".to_string(),
            total_clicks: total,
            unique_clicks: unique,
            unique_ips: Vec::new(),
            conversions: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_source_lookup_ignores_case() {
        let campaign = Campaign {
            id: Uuid::new_v4(),
            campaign_name: "SummerSale".to_string(),
            link_code: "summer".to_string(),
            total_clicks: 0,
            unique_clicks: 0,
            unique_ips: Vec::new(),
            created_at: Utc::now(),
            sources: vec![source("Alice", 5, 1), source("bob", 2, 2)],
        };

        assert_eq!(campaign.source("alice").map(|s| s.total_clicks), Some(5));
        assert!(campaign.source("carol").is_none());
        assert_eq!(campaign.sources_total_clicks(), 7);
        assert_eq!(campaign.sources_unique_clicks(), 3);
    }

    #[test]
    fn test_display_name_falls_back_to_label() {
        let mut s = source("alice", 0, 0);
        assert_eq!(s.display_name(), "alice");
        s.campaigner_name = Some("Alice Martin".to_string());
        assert_eq!(s.display_name(), "Alice Martin");
        s.campaigner_name = Some("  ".to_string());
        assert_eq!(s.display_name(), "alice");
    }
}
