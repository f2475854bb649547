//! Repository layer for campaign storage
//!
//! Every write goes through one `CampaignStore` call so that each backend
//! can apply it atomically: counters are incremented in place, IP sets and
//! conversions are only ever added to, and nothing is deleted.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        campaign::NewCampaign, Campaign, ClickCounts, ClickEvent, ConversionInsert,
        NewClickEvent, NewConversion,
    },
};

/// Storage interface for campaigns, their sources and the click log
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// Persist a new campaign with its sources
    async fn create_campaign(&self, campaign: NewCampaign) -> AppResult<Campaign>;

    /// All campaigns, oldest first
    async fn list_campaigns(&self) -> AppResult<Vec<Campaign>>;

    async fn find_by_name(&self, campaign_name: &str) -> AppResult<Option<Campaign>>;

    /// Campaign owning the legacy short code
    async fn find_by_link_code(&self, link_code: &str) -> AppResult<Option<Campaign>>;

    /// Oldest campaign holding a source with this label (case-insensitive)
    async fn find_by_source(&self, utm_source: &str) -> AppResult<Option<Campaign>>;

    /// Append the click event, bump the source's total counter and add the
    /// IP to its unique set. Either all of it happens or none of it.
    async fn record_source_click(
        &self,
        source_id: Uuid,
        event: NewClickEvent,
    ) -> AppResult<ClickCounts>;

    /// Same counting on the campaign-level legacy counters
    async fn record_campaign_click(&self, campaign_id: Uuid, ip: &str) -> AppResult<ClickCounts>;

    /// Insert unless the source already holds a conversion for the email
    async fn add_conversion(
        &self,
        source_id: Uuid,
        conversion: NewConversion,
    ) -> AppResult<ConversionInsert>;

    /// Most recent click events of a campaign, newest first
    async fn list_click_events(&self, campaign_name: &str, limit: i64)
        -> AppResult<Vec<ClickEvent>>;

    /// Check that the backend is reachable
    async fn ping(&self) -> AppResult<()>;
}

/// Main repository handle shared by all services
#[derive(Clone)]
pub struct Repository {
    pub campaigns: Arc<dyn CampaignStore>,
}

impl Repository {
    /// Create a repository over an arbitrary store
    pub fn new(campaigns: Arc<dyn CampaignStore>) -> Self {
        Self { campaigns }
    }

    /// Create a repository backed by PostgreSQL
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self::new(Arc::new(postgres::PgCampaignStore::new(pool)))
    }

    /// Create a repository backed by process memory
    pub fn memory() -> Self {
        Self::new(Arc::new(memory::MemoryCampaignStore::new()))
    }
}
