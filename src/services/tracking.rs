//! Click and conversion recording

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{
        campaign::PHONE_NOT_PROVIDED,
        click::{LegacyClick, TrackClickRequest, TrackClickResponse},
        conversion::{ConversionResponse, CreateConversion},
        ConversionInsert, NewClickEvent, NewConversion,
    },
    referral,
    repository::Repository,
};

#[derive(Clone)]
pub struct TrackingService {
    repository: Repository,
}

/// Trimmed value, `None` when missing or blank
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl TrackingService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Record a click carried by a referral token
    pub async fn record_click(
        &self,
        request: TrackClickRequest,
        ip: String,
    ) -> AppResult<TrackClickResponse> {
        let ref_code = non_blank(request.ref_code)
            .ok_or_else(|| AppError::Validation("ref is required".to_string()))?;

        let referral = referral::decode(&ref_code)?;
        tracing::debug!(
            "Click for campaign '{}' source '{}' from {}",
            referral.campaign_name,
            referral.utm_source,
            ip
        );

        let campaign = self
            .repository
            .campaigns
            .find_by_name(&referral.campaign_name)
            .await?
            .ok_or_else(|| {
                tracing::warn!("Click for unknown campaign '{}'", referral.campaign_name);
                AppError::CampaignNotFound("Campaign not found".to_string())
            })?;

        let source = campaign.source(&referral.utm_source).ok_or_else(|| {
            tracing::warn!(
                "Click for unknown source '{}' in campaign '{}'",
                referral.utm_source,
                campaign.campaign_name
            );
            AppError::SourceNotFound("UTM source not found".to_string())
        })?;

        let event = NewClickEvent {
            link_code: source.link_code.clone(),
            utm_source: source.utm_source.clone(),
            campaign_name: campaign.campaign_name.clone(),
            ip: ip.clone(),
            user_agent: non_blank(request.user_agent),
            screen_width: request.screen_width,
            screen_height: request.screen_height,
            language: non_blank(request.language),
            timezone: non_blank(request.timezone),
            clicked_at: Utc::now(),
        };

        let counts = self
            .repository
            .campaigns
            .record_source_click(source.id, event)
            .await?;

        tracing::info!(
            "Tracked click {}/{}: total={} unique={}",
            campaign.campaign_name,
            source.utm_source,
            counts.total,
            counts.unique
        );

        Ok(TrackClickResponse {
            ok: true,
            message: "Click tracked".to_string(),
            campaign_name: campaign.campaign_name.clone(),
            campaigner_name: source.display_name().to_string(),
            utm_source: source.utm_source.clone(),
            link_code: source.link_code.clone(),
            ip,
            total: counts.total,
            unique: counts.unique,
        })
    }

    /// Count a hit on the legacy short code against the campaign-level counters
    pub async fn record_legacy_click(&self, link_code: &str, ip: &str) -> AppResult<LegacyClick> {
        let campaign = self
            .repository
            .campaigns
            .find_by_link_code(link_code)
            .await?
            .ok_or_else(|| AppError::CampaignNotFound("Campaign not found".to_string()))?;

        let counts = self
            .repository
            .campaigns
            .record_campaign_click(campaign.id, ip)
            .await?;

        tracing::info!(
            "Legacy click on {} ({}): total={} unique={}",
            link_code,
            campaign.campaign_name,
            counts.total,
            counts.unique
        );

        let sources = campaign
            .sources
            .iter()
            .map(|s| match s.display_name() {
                name if name == s.utm_source => name.to_string(),
                name => format!("{} ({})", s.utm_source, name),
            })
            .collect();

        Ok(LegacyClick {
            campaign_name: campaign.campaign_name,
            sources,
            total: counts.total,
            unique: counts.unique,
        })
    }

    /// Attach a lead to the UTM source it came from; repeated emails are a no-op
    pub async fn record_conversion(&self, data: CreateConversion) -> AppResult<ConversionResponse> {
        let utm_source = non_blank(data.utm_source)
            .ok_or_else(|| AppError::Validation("utmSource is required".to_string()))?;
        let client_email = non_blank(data.client_email)
            .ok_or_else(|| AppError::Validation("clientEmail is required".to_string()))?;

        let campaign = self
            .repository
            .campaigns
            .find_by_source(&utm_source)
            .await?
            .ok_or_else(|| {
                tracing::warn!("Conversion for unknown UTM source '{}'", utm_source);
                AppError::SourceNotFound("No campaign found for this UTM source".to_string())
            })?;

        let source = campaign.source(&utm_source).ok_or_else(|| {
            AppError::SourceNotFound("No campaign found for this UTM source".to_string())
        })?;

        if source.has_conversion_for(&client_email) {
            tracing::debug!("Conversion for {} already recorded on {}", client_email, source.utm_source);
            return Ok(Self::already_exists(&campaign.campaign_name, &source.utm_source));
        }

        let conversion = NewConversion {
            client_name: non_blank(data.client_name).unwrap_or_default(),
            client_email,
            client_phone: non_blank(data.client_phone)
                .unwrap_or_else(|| PHONE_NOT_PROVIDED.to_string()),
            booked_at: Utc::now(),
        };

        // The store re-checks the email, so a concurrent duplicate still lands here
        match self
            .repository
            .campaigns
            .add_conversion(source.id, conversion)
            .await?
        {
            ConversionInsert::Created(conversion) => {
                tracing::info!(
                    "Conversion recorded for {}/{}",
                    campaign.campaign_name,
                    source.utm_source
                );
                Ok(ConversionResponse {
                    ok: true,
                    message: "Conversion recorded".to_string(),
                    already_exists: false,
                    campaign_name: campaign.campaign_name.clone(),
                    utm_source: source.utm_source.clone(),
                    conversion: Some(conversion),
                })
            }
            ConversionInsert::AlreadyExists => Ok(Self::already_exists(
                &campaign.campaign_name,
                &source.utm_source,
            )),
        }
    }

    fn already_exists(campaign_name: &str, utm_source: &str) -> ConversionResponse {
        ConversionResponse {
            ok: true,
            message: "Conversion already exists for this email".to_string(),
            already_exists: true,
            campaign_name: campaign_name.to_string(),
            utm_source: utm_source.to_string(),
            conversion: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        models::campaign::{NewCampaign, NewUtmSource},
        repository::MockCampaignStore,
    };

    async fn seeded() -> (TrackingService, Repository) {
        let repository = Repository::memory();
        repository
            .campaigns
            .create_campaign(NewCampaign {
                campaign_name: "SummerSale".to_string(),
                link_code: "summer01".to_string(),
                sources: vec![NewUtmSource {
                    utm_source: "alice".to_string(),
                    campaigner_name: Some("Alice Martin".to_string()),
                    link_code: "alice001".to_string(),
                }],
            })
            .await
            .unwrap();
        (TrackingService::new(repository.clone()), repository)
    }

    fn track(token: &str) -> TrackClickRequest {
        TrackClickRequest {
            ref_code: Some(token.to_string()),
            user_agent: Some("Mozilla/5.0".to_string()),
            ..Default::default()
        }
    }

    fn lead(email: &str, phone: Option<&str>) -> CreateConversion {
        CreateConversion {
            client_name: Some("Bob".to_string()),
            client_email: Some(email.to_string()),
            client_phone: phone.map(str::to_string),
            utm_source: Some("alice".to_string()),
        }
    }

    #[tokio::test]
    async fn test_same_ip_counts_once_as_unique() {
        let (service, _) = seeded().await;
        let token = referral::encode("SummerSale", "alice");

        let first = service.record_click(track(&token), "1.1.1.1".into()).await.unwrap();
        let second = service.record_click(track(&token), "1.1.1.1".into()).await.unwrap();

        assert_eq!((first.total, first.unique), (1, 1));
        assert_eq!((second.total, second.unique), (2, 1));
        assert_eq!(second.campaigner_name, "Alice Martin");
        assert_eq!(second.link_code, "alice001");
    }

    #[tokio::test]
    async fn test_source_label_matches_case_insensitively() {
        let (service, _) = seeded().await;
        let token = referral::encode("SummerSale", "ALICE");

        let response = service.record_click(track(&token), "1.1.1.1".into()).await.unwrap();
        assert_eq!(response.utm_source, "alice");
    }

    #[tokio::test]
    async fn test_click_errors_are_distinct() {
        let (service, repository) = seeded().await;

        let missing = service
            .record_click(TrackClickRequest::default(), "1.1.1.1".into())
            .await
            .unwrap_err();
        assert!(matches!(missing, AppError::Validation(_)));

        let garbage = service.record_click(track("%%%"), "1.1.1.1".into()).await.unwrap_err();
        assert!(matches!(garbage, AppError::InvalidReferral(_)));

        let token = referral::encode("WinterSale", "alice");
        let campaign = service.record_click(track(&token), "1.1.1.1".into()).await.unwrap_err();
        assert!(matches!(campaign, AppError::CampaignNotFound(_)));

        let token = referral::encode("SummerSale", "carol");
        let source = service.record_click(track(&token), "1.1.1.1".into()).await.unwrap_err();
        assert!(matches!(source, AppError::SourceNotFound(_)));

        let stored = repository.campaigns.find_by_name("SummerSale").await.unwrap().unwrap();
        assert_eq!(stored.sources_total_clicks(), 0);
        assert!(repository
            .campaigns
            .list_click_events("SummerSale", 10)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_conversion_is_idempotent_per_email() {
        let (service, repository) = seeded().await;

        let created = service.record_conversion(lead("bob@x.com", None)).await.unwrap();
        assert!(!created.already_exists);
        let conversion = created.conversion.unwrap();
        assert_eq!(conversion.client_phone, "Not Provided");

        let repeat = service
            .record_conversion(lead("BOB@X.com", Some("+33 6 00 00 00 00")))
            .await
            .unwrap();
        assert!(repeat.already_exists);
        assert!(repeat.conversion.is_none());

        let stored = repository.campaigns.find_by_name("SummerSale").await.unwrap().unwrap();
        assert_eq!(stored.source("alice").unwrap().conversions.len(), 1);
    }

    #[tokio::test]
    async fn test_conversion_requires_email_and_source() {
        let (service, _) = seeded().await;

        let mut no_email = lead("bob@x.com", None);
        no_email.client_email = Some("   ".to_string());
        assert!(matches!(
            service.record_conversion(no_email).await,
            Err(AppError::Validation(_))
        ));

        let mut no_source = lead("bob@x.com", None);
        no_source.utm_source = None;
        assert!(matches!(
            service.record_conversion(no_source).await,
            Err(AppError::Validation(_))
        ));

        let mut unknown = lead("bob@x.com", None);
        unknown.utm_source = Some("carol".to_string());
        assert!(matches!(
            service.record_conversion(unknown).await,
            Err(AppError::SourceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_legacy_click_counts_on_campaign() {
        let (service, repository) = seeded().await;

        service.record_legacy_click("summer01", "1.1.1.1").await.unwrap();
        let hit = service.record_legacy_click("summer01", "1.1.1.1").await.unwrap();
        assert_eq!((hit.total, hit.unique), (2, 1));
        assert_eq!(hit.campaign_name, "SummerSale");
        assert_eq!(hit.sources, vec!["alice (Alice Martin)"]);

        let stored = repository.campaigns.find_by_name("SummerSale").await.unwrap().unwrap();
        assert_eq!(stored.sources_total_clicks(), 0);

        assert!(matches!(
            service.record_legacy_click("nope", "1.1.1.1").await,
            Err(AppError::CampaignNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces_as_error() {
        let mut store = MockCampaignStore::new();
        store
            .expect_find_by_name()
            .returning(|_| Err(AppError::Internal("connection refused".to_string())));
        store.expect_record_source_click().never();

        let service = TrackingService::new(Repository::new(Arc::new(store)));
        let token = referral::encode("SummerSale", "alice");
        let err = service.record_click(track(&token), "1.1.1.1".into()).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
