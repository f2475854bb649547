//! Campaign creation and click log

use std::collections::HashSet;

use rand::{distributions::Alphanumeric, Rng};
use validator::Validate;

use crate::{
    config::TrackingConfig,
    error::{AppError, AppResult},
    models::{
        campaign::{CreateCampaign, NewCampaign, NewUtmSource},
        Campaign, ClickEvent,
    },
    repository::Repository,
};

const DEFAULT_CLICK_LOG_LIMIT: i64 = 100;
const MAX_CLICK_LOG_LIMIT: i64 = 1000;
const LINK_CODE_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct CampaignService {
    repository: Repository,
    tracking: TrackingConfig,
}

impl CampaignService {
    pub fn new(repository: Repository, tracking: TrackingConfig) -> Self {
        Self {
            repository,
            tracking,
        }
    }

    fn link_code(&self) -> String {
        let len = self.tracking.link_code_length.clamp(4, 64);
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }

    /// Create a campaign and its sources with fresh link codes
    pub async fn create(&self, data: CreateCampaign) -> AppResult<Campaign> {
        data.validate()?;

        let campaign_name = data.campaign_name.trim().to_string();
        if campaign_name.is_empty() {
            return Err(AppError::Validation("campaignName cannot be blank".to_string()));
        }

        let mut labels = HashSet::new();
        let mut sources = Vec::with_capacity(data.sources.len());
        for source in &data.sources {
            let label = source.utm_source.trim();
            if label.is_empty() {
                return Err(AppError::Validation("utmSource cannot be blank".to_string()));
            }
            if !labels.insert(label.to_lowercase()) {
                return Err(AppError::Validation(format!(
                    "Duplicate utmSource '{}' in campaign",
                    label
                )));
            }
            sources.push((
                label.to_string(),
                source
                    .campaigner_name
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string),
            ));
        }

        if self
            .repository
            .campaigns
            .find_by_name(&campaign_name)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "Campaign {} already exists",
                campaign_name
            )));
        }

        // Link codes are random; a clash with an existing code gets new ones
        let mut attempt = 0;
        loop {
            attempt += 1;
            let new_campaign = NewCampaign {
                campaign_name: campaign_name.clone(),
                link_code: self.link_code(),
                sources: sources
                    .iter()
                    .map(|(label, name)| NewUtmSource {
                        utm_source: label.clone(),
                        campaigner_name: name.clone(),
                        link_code: self.link_code(),
                    })
                    .collect(),
            };

            match self.repository.campaigns.create_campaign(new_campaign).await {
                Ok(campaign) => {
                    tracing::info!(
                        "Created campaign {} with {} source(s)",
                        campaign.campaign_name,
                        campaign.sources.len()
                    );
                    return Ok(campaign);
                }
                Err(AppError::Conflict(msg)) if attempt < LINK_CODE_ATTEMPTS => {
                    tracing::warn!("Campaign insert conflict ({}), retrying", msg);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Most recent click events of a campaign
    pub async fn click_log(&self, campaign_name: &str, limit: Option<i64>) -> AppResult<Vec<ClickEvent>> {
        let limit = limit
            .unwrap_or(DEFAULT_CLICK_LOG_LIMIT)
            .clamp(1, MAX_CLICK_LOG_LIMIT);

        if self
            .repository
            .campaigns
            .find_by_name(campaign_name)
            .await?
            .is_none()
        {
            return Err(AppError::CampaignNotFound(format!(
                "Campaign {} not found",
                campaign_name
            )));
        }

        self.repository
            .campaigns
            .list_click_events(campaign_name, limit)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::campaign::CreateUtmSource;

    fn request(name: &str, sources: &[&str]) -> CreateCampaign {
        CreateCampaign {
            campaign_name: name.to_string(),
            sources: sources
                .iter()
                .map(|s| CreateUtmSource {
                    utm_source: s.to_string(),
                    campaigner_name: None,
                })
                .collect(),
        }
    }

    fn service() -> CampaignService {
        CampaignService::new(Repository::memory(), TrackingConfig::default())
    }

    #[tokio::test]
    async fn test_create_generates_link_codes() {
        let service = service();
        let campaign = service
            .create(request("SummerSale", &["alice", "bob"]))
            .await
            .unwrap();

        assert_eq!(campaign.link_code.len(), 8);
        assert_eq!(campaign.sources.len(), 2);
        assert!(campaign
            .sources
            .iter()
            .all(|s| s.link_code.len() == 8 && s.link_code.chars().all(|c| c.is_ascii_alphanumeric())));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let service = service();

        assert!(matches!(
            service.create(request("SummerSale", &[])).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.create(request("SummerSale", &["alice", "ALICE"])).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.create(request("   ", &["alice"])).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_campaign() {
        let service = service();
        service.create(request("SummerSale", &["alice"])).await.unwrap();
        assert!(matches!(
            service.create(request("SummerSale", &["bob"])).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_click_log_for_unknown_campaign() {
        let service = service();
        assert!(matches!(
            service.click_log("Nope", None).await,
            Err(AppError::CampaignNotFound(_))
        ));
    }
}
