//! Click and conversion tracking endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::{AppResult, ErrorResponse},
    models::{
        click::{TrackClickRequest, TrackClickResponse},
        conversion::{ConversionResponse, CreateConversion},
    },
};

use super::{extractors::ClientIp, json_body};

static LINK_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("valid link code regex"));

/// Record a click from a shared referral link
#[utoipa::path(
    post,
    path = "/api/track",
    tag = "tracking",
    request_body = TrackClickRequest,
    responses(
        (status = 200, description = "Click recorded", body = TrackClickResponse),
        (status = 400, description = "Missing ref", body = ErrorResponse),
        (status = 404, description = "Invalid referral, unknown campaign or source", body = ErrorResponse)
    )
)]
pub async fn track_click(
    State(state): State<crate::AppState>,
    ClientIp(ip): ClientIp,
    body: Result<Json<TrackClickRequest>, JsonRejection>,
) -> AppResult<Json<TrackClickResponse>> {
    let request = json_body(body)?;
    let response = state.services.tracking.record_click(request, ip).await?;
    Ok(Json(response))
}

/// Legacy short-code hit counted on the campaign itself
#[utoipa::path(
    get,
    path = "/r/{code}",
    tag = "tracking",
    params(("code" = String, Path, description = "Campaign link code")),
    responses(
        (status = 200, description = "Confirmation page", body = String, content_type = "text/html"),
        (status = 404, description = "Unknown code", body = String, content_type = "text/plain")
    )
)]
pub async fn legacy_redirect(
    State(state): State<crate::AppState>,
    ClientIp(ip): ClientIp,
    Path(code): Path<String>,
) -> Response {
    if !LINK_CODE_RE.is_match(&code) {
        tracing::debug!("Rejected malformed link code {:?}", code);
        return text_page(StatusCode::NOT_FOUND, "Campaign not found");
    }

    match state.services.tracking.record_legacy_click(&code, &ip).await {
        Ok(hit) => {
            let sources = hit
                .sources
                .iter()
                .map(|s| escape_html(s))
                .collect::<Vec<_>>()
                .join(", ");
            Html(format!(
                "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{name}</title></head>\n\
                 <body>\n<h1>Thanks for visiting {name}</h1>\n\
                 <p>Shared by: {sources}</p>\n\
                 <p>Unique visitors so far: {unique}</p>\n</body>\n</html>\n",
                name = escape_html(&hit.campaign_name),
                sources = sources,
                unique = hit.unique,
            ))
            .into_response()
        }
        Err(e) => {
            let status = e.status();
            text_page(status, &e.public_message())
        }
    }
}

/// Record a lead for the UTM source it came from
#[utoipa::path(
    post,
    path = "/api/track/utm-campaign-lead",
    tag = "tracking",
    request_body = CreateConversion,
    responses(
        (status = 201, description = "Conversion recorded", body = ConversionResponse),
        (status = 200, description = "Conversion already exists", body = ConversionResponse),
        (status = 400, description = "Missing clientEmail or utmSource", body = ErrorResponse),
        (status = 404, description = "No campaign holds this source", body = ErrorResponse)
    )
)]
pub async fn track_conversion(
    State(state): State<crate::AppState>,
    body: Result<Json<CreateConversion>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ConversionResponse>)> {
    let data = json_body(body)?;
    let response = state.services.tracking.record_conversion(data).await?;
    let status = if response.already_exists {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(response)))
}

fn text_page(status: StatusCode, message: &str) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        message.to_string(),
    )
        .into_response()
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>\"Q&A\"</b>"), "&lt;b&gt;&quot;Q&amp;A&quot;&lt;/b&gt;");
        assert_eq!(escape_html("SummerSale"), "SummerSale");
    }

    #[test]
    fn test_link_code_pattern() {
        assert!(LINK_CODE_RE.is_match("aZ09_-"));
        assert!(!LINK_CODE_RE.is_match("../etc"));
        assert!(!LINK_CODE_RE.is_match(""));
    }
}
