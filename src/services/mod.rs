//! Business logic services

pub mod campaigns;
pub mod reports;
pub mod tracking;

use crate::{config::AppConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub tracking: tracking::TrackingService,
    pub reports: reports::ReportService,
    pub campaigns: campaigns::CampaignService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        Self {
            tracking: tracking::TrackingService::new(repository.clone()),
            reports: reports::ReportService::new(repository.clone(), config.clone()),
            campaigns: campaigns::CampaignService::new(repository.clone(), config.tracking.clone()),
            repository,
        }
    }

    /// Check that the storage backend answers
    pub async fn ping_storage(&self) -> AppResult<()> {
        self.repository.campaigns.ping().await
    }
}
