//! In-process campaign store
//!
//! Each operation runs under a single write lock, which makes the
//! read-modify-write on counters and IP sets atomic.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        campaign::{eq_ignore_case, NewCampaign},
        Campaign, ClickCounts, ClickEvent, Conversion, ConversionInsert, NewClickEvent,
        NewConversion, UtmSource,
    },
};

use super::CampaignStore;

#[derive(Default)]
struct MemoryState {
    campaigns: Vec<Campaign>,
    clicks: Vec<ClickEvent>,
}

impl MemoryState {
    fn source_mut(&mut self, source_id: Uuid) -> Option<&mut UtmSource> {
        self.campaigns
            .iter_mut()
            .flat_map(|c| c.sources.iter_mut())
            .find(|s| s.id == source_id)
    }

    // Campaign and source codes are unique per table, like the SQL schema
    fn campaign_code_taken(&self, code: &str) -> bool {
        self.campaigns.iter().any(|c| c.link_code == code)
    }

    fn source_code_taken(&self, code: &str) -> bool {
        self.campaigns
            .iter()
            .flat_map(|c| c.sources.iter())
            .any(|s| s.link_code == code)
    }
}

#[derive(Default)]
pub struct MemoryCampaignStore {
    state: RwLock<MemoryState>,
}

impl MemoryCampaignStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CampaignStore for MemoryCampaignStore {
    async fn create_campaign(&self, campaign: NewCampaign) -> AppResult<Campaign> {
        let mut state = self.state.write().await;

        if state
            .campaigns
            .iter()
            .any(|c| c.campaign_name == campaign.campaign_name)
        {
            return Err(AppError::Conflict(format!(
                "Campaign {} already exists",
                campaign.campaign_name
            )));
        }
        if state.campaign_code_taken(&campaign.link_code) {
            return Err(AppError::Conflict(format!(
                "Link code {} already in use",
                campaign.link_code
            )));
        }
        let mut fresh = HashSet::new();
        for source in &campaign.sources {
            let code = source.link_code.as_str();
            if !fresh.insert(code.to_string()) || state.source_code_taken(code) {
                return Err(AppError::Conflict(format!("Link code {} already in use", code)));
            }
        }

        let now = Utc::now();
        let created = Campaign {
            id: Uuid::new_v4(),
            campaign_name: campaign.campaign_name,
            link_code: campaign.link_code,
            total_clicks: 0,
            unique_clicks: 0,
            unique_ips: Vec::new(),
            created_at: now,
            sources: campaign
                .sources
                .into_iter()
                .map(|s| UtmSource {
                    id: Uuid::new_v4(),
                    utm_source: s.utm_source,
                    campaigner_name: s.campaigner_name,
                    link_code: s.link_code,
                    total_clicks: 0,
                    unique_clicks: 0,
                    unique_ips: Vec::new(),
                    conversions: Vec::new(),
                    created_at: now,
                })
                .collect(),
        };

        state.campaigns.push(created.clone());
        Ok(created)
    }

    async fn list_campaigns(&self) -> AppResult<Vec<Campaign>> {
        Ok(self.state.read().await.campaigns.clone())
    }

    async fn find_by_name(&self, campaign_name: &str) -> AppResult<Option<Campaign>> {
        let state = self.state.read().await;
        Ok(state
            .campaigns
            .iter()
            .find(|c| c.campaign_name == campaign_name)
            .cloned())
    }

    async fn find_by_link_code(&self, link_code: &str) -> AppResult<Option<Campaign>> {
        let state = self.state.read().await;
        Ok(state
            .campaigns
            .iter()
            .find(|c| c.link_code == link_code)
            .cloned())
    }

    async fn find_by_source(&self, utm_source: &str) -> AppResult<Option<Campaign>> {
        let state = self.state.read().await;
        Ok(state
            .campaigns
            .iter()
            .find(|c| c.sources.iter().any(|s| eq_ignore_case(&s.utm_source, utm_source)))
            .cloned())
    }

    async fn record_source_click(
        &self,
        source_id: Uuid,
        event: NewClickEvent,
    ) -> AppResult<ClickCounts> {
        let mut state = self.state.write().await;

        let source = state
            .source_mut(source_id)
            .ok_or_else(|| AppError::SourceNotFound(format!("UTM source {} not found", source_id)))?;

        source.total_clicks += 1;
        if !source.unique_ips.contains(&event.ip) {
            source.unique_ips.push(event.ip.clone());
        }
        source.unique_clicks = source.unique_ips.len() as i64;
        let counts = ClickCounts {
            total: source.total_clicks,
            unique: source.unique_clicks,
        };

        state.clicks.push(event.into_event(Uuid::new_v4()));
        Ok(counts)
    }

    async fn record_campaign_click(&self, campaign_id: Uuid, ip: &str) -> AppResult<ClickCounts> {
        let mut state = self.state.write().await;

        let campaign = state
            .campaigns
            .iter_mut()
            .find(|c| c.id == campaign_id)
            .ok_or_else(|| AppError::CampaignNotFound(format!("Campaign {} not found", campaign_id)))?;

        campaign.total_clicks += 1;
        if !campaign.unique_ips.iter().any(|known| known == ip) {
            campaign.unique_ips.push(ip.to_string());
        }
        campaign.unique_clicks = campaign.unique_ips.len() as i64;

        Ok(ClickCounts {
            total: campaign.total_clicks,
            unique: campaign.unique_clicks,
        })
    }

    async fn add_conversion(
        &self,
        source_id: Uuid,
        conversion: NewConversion,
    ) -> AppResult<ConversionInsert> {
        let mut state = self.state.write().await;

        let source = state
            .source_mut(source_id)
            .ok_or_else(|| AppError::SourceNotFound(format!("UTM source {} not found", source_id)))?;

        if source.has_conversion_for(&conversion.client_email) {
            return Ok(ConversionInsert::AlreadyExists);
        }

        let created = Conversion {
            id: Uuid::new_v4(),
            client_name: conversion.client_name,
            client_email: conversion.client_email,
            client_phone: conversion.client_phone,
            booked_at: conversion.booked_at,
        };
        source.conversions.push(created.clone());
        Ok(ConversionInsert::Created(created))
    }

    async fn list_click_events(
        &self,
        campaign_name: &str,
        limit: i64,
    ) -> AppResult<Vec<ClickEvent>> {
        let state = self.state.read().await;
        let mut events: Vec<ClickEvent> = state
            .clicks
            .iter()
            .filter(|e| e.campaign_name == campaign_name)
            .cloned()
            .collect();
        // newest first, ties keep reverse insertion order
        events.reverse();
        events.sort_by(|a, b| b.clicked_at.cmp(&a.clicked_at));
        events.truncate(limit.max(0) as usize);
        Ok(events)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
