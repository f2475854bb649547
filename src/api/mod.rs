//! API handlers for the campaign tracker REST endpoints

pub mod campaigns;
pub mod extractors;
pub mod health;
pub mod openapi;
pub mod reports;
pub mod tracking;

use axum::{
    extract::rejection::JsonRejection,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    error::{AppError, AppResult},
    AppState,
};

/// Unwrap a JSON body, turning malformed payloads into a 400 with the usual error shape
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let routes = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Tracking
        .route("/api/track", post(tracking::track_click))
        .route("/api/track/utm-campaign-lead", post(tracking::track_conversion))
        .route("/r/:code", get(tracking::legacy_redirect))
        // Reports
        .route("/api/report", get(reports::get_report))
        .route("/api/report/:campaign_name", get(reports::get_campaign_report))
        // Campaigns
        .route("/api/campaigns", post(campaigns::create_campaign))
        .route("/api/campaigns/:campaign_name/clicks", get(campaigns::list_clicks))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(openapi::create_openapi_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
