//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{campaigns, health, reports, tracking};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Campaign Tracker API",
        version = "1.0.0",
        description = "UTM campaign click, conversion and reporting API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Tracking
        tracking::track_click,
        tracking::legacy_redirect,
        tracking::track_conversion,
        // Reports
        reports::get_report,
        reports::get_campaign_report,
        // Campaigns
        campaigns::create_campaign,
        campaigns::list_clicks,
    ),
    components(
        schemas(
            // Tracking
            crate::models::click::TrackClickRequest,
            crate::models::click::TrackClickResponse,
            crate::models::conversion::CreateConversion,
            crate::models::conversion::ConversionResponse,
            crate::models::campaign::Conversion,
            // Reports
            crate::models::report::ReportResponse,
            crate::models::report::ReportRow,
            crate::models::report::CampaignerReport,
            // Campaigns
            crate::models::campaign::CreateCampaign,
            crate::models::campaign::CreateUtmSource,
            crate::models::report::CampaignCreatedResponse,
            crate::models::click::ClickEvent,
            crate::models::click::ClickLogQuery,
            crate::models::click::ClickLogResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "tracking", description = "Click and conversion tracking"),
        (name = "reports", description = "Campaign reports"),
        (name = "campaigns", description = "Campaign management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
