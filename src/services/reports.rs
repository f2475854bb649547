//! Campaign reports

use crate::{
    config::AppConfig,
    error::AppResult,
    models::{Campaign, CampaignerReport, ReportRow},
    referral,
    repository::Repository,
};

#[derive(Clone)]
pub struct ReportService {
    repository: Repository,
    config: AppConfig,
}

impl ReportService {
    pub fn new(repository: Repository, config: AppConfig) -> Self {
        Self { repository, config }
    }

    /// Summary rows for every campaign
    pub async fn all(&self) -> AppResult<Vec<ReportRow>> {
        let campaigns = self.repository.campaigns.list_campaigns().await?;
        Ok(campaigns.iter().map(|c| self.row(c)).collect())
    }

    /// Rows for a single campaign; empty when the name is unknown
    pub async fn for_campaign(&self, campaign_name: &str) -> AppResult<Vec<ReportRow>> {
        let campaign = self.repository.campaigns.find_by_name(campaign_name).await?;
        Ok(campaign.iter().map(|c| self.row(c)).collect())
    }

    /// Build the report row of one campaign
    pub fn row(&self, campaign: &Campaign) -> ReportRow {
        let campaigners = campaign
            .sources
            .iter()
            .map(|source| CampaignerReport {
                utm_source: source.utm_source.clone(),
                total_clicks: source.total_clicks,
                unique_clicks: source.unique_clicks,
                link: self.config.referral_link(&referral::encode(
                    &campaign.campaign_name,
                    &source.utm_source,
                )),
                conversions: source.conversions.clone(),
            })
            .collect();

        ReportRow {
            id: campaign.id,
            campaign_name: campaign.campaign_name.clone(),
            link_code: campaign.link_code.clone(),
            created_at: campaign.created_at,
            total_clicks: campaign.sources_total_clicks(),
            total_uniques: campaign.sources_unique_clicks(),
            campaigners,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        error::AppError,
        models::{
            campaign::{NewCampaign, NewUtmSource},
            NewClickEvent,
        },
        repository::MockCampaignStore,
    };

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.tracking.public_base_url = "https://jobs.example.com".to_string();
        config
    }

    #[tokio::test]
    async fn test_empty_store_gives_empty_report() {
        let service = ReportService::new(Repository::memory(), config());
        assert!(service.all().await.unwrap().is_empty());
        assert!(service.for_campaign("SummerSale").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_row_sums_sources_and_builds_links() {
        let repository = Repository::memory();
        let campaign = repository
            .campaigns
            .create_campaign(NewCampaign {
                campaign_name: "SummerSale".to_string(),
                link_code: "summer01".to_string(),
                sources: vec![
                    NewUtmSource {
                        utm_source: "alice".to_string(),
                        campaigner_name: None,
                        link_code: "alice001".to_string(),
                    },
                    NewUtmSource {
                        utm_source: "bob".to_string(),
                        campaigner_name: None,
                        link_code: "bob00001".to_string(),
                    },
                ],
            })
            .await
            .unwrap();

        for (source, ip) in [("alice", "1.1.1.1"), ("alice", "1.1.1.1"), ("bob", "2.2.2.2")] {
            let id = campaign.source(source).unwrap().id;
            repository
                .campaigns
                .record_source_click(
                    id,
                    NewClickEvent {
                        link_code: String::new(),
                        utm_source: source.to_string(),
                        campaign_name: "SummerSale".to_string(),
                        ip: ip.to_string(),
                        user_agent: None,
                        screen_width: None,
                        screen_height: None,
                        language: None,
                        timezone: None,
                        clicked_at: chrono::Utc::now(),
                    },
                )
                .await
                .unwrap();
        }

        let service = ReportService::new(repository, config());
        let rows = service.all().await.unwrap();
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.total_clicks, 3);
        assert_eq!(row.total_uniques, 2);
        assert_eq!(row.campaigners.len(), 2);

        let alice = &row.campaigners[0];
        assert_eq!(alice.utm_source, "alice");
        assert!(alice.conversions.is_empty());

        let token = alice.link.strip_prefix("https://jobs.example.com/?ref=").unwrap();
        let decoded = referral::decode(token).unwrap();
        assert_eq!(decoded.campaign_name, "SummerSale");
        assert_eq!(decoded.utm_source, "alice");
    }

    #[tokio::test]
    async fn test_storage_failure_is_propagated() {
        let mut store = MockCampaignStore::new();
        store
            .expect_list_campaigns()
            .returning(|| Err(AppError::Internal("pool timed out".to_string())));

        let service = ReportService::new(Repository::new(Arc::new(store)), config());
        assert!(matches!(service.all().await, Err(AppError::Internal(_))));
    }
}
