//! Referral tokens embedded in shareable links as `?ref=<token>`
//!
//! A token is the URL-safe, unpadded base64 of the JSON array
//! `[campaign_name, utm_source]`, so names may contain any character.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use crate::error::{AppError, AppResult};

/// Campaign and source identity carried by a referral token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Referral {
    pub campaign_name: String,
    pub utm_source: String,
}

/// Build the referral token for a campaign/source pair
pub fn encode(campaign_name: &str, utm_source: &str) -> String {
    // Serializing a pair of &str cannot fail
    let json = serde_json::to_vec(&(campaign_name, utm_source)).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

/// Decode a referral token back into its campaign/source pair
pub fn decode(token: &str) -> AppResult<Referral> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::InvalidReferral("Referral code is empty".to_string()));
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(token.trim_end_matches('='))
        .map_err(|_| AppError::InvalidReferral("Referral code is not valid base64".to_string()))?;

    let (campaign_name, utm_source): (String, String) = serde_json::from_slice(&bytes)
        .map_err(|_| AppError::InvalidReferral("Referral code payload is malformed".to_string()))?;

    if campaign_name.trim().is_empty() || utm_source.trim().is_empty() {
        return Err(AppError::InvalidReferral(
            "Referral code is missing the campaign or source".to_string(),
        ));
    }

    Ok(Referral {
        campaign_name,
        utm_source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn non_blank() -> impl Strategy<Value = String> {
        any::<String>().prop_filter("non-blank", |s| !s.trim().is_empty())
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(campaign in non_blank(), source in non_blank()) {
            let referral = decode(&encode(&campaign, &source)).unwrap();
            prop_assert_eq!(referral.campaign_name, campaign);
            prop_assert_eq!(referral.utm_source, source);
        }
    }

    #[test]
    fn test_round_trip() {
        for (campaign, source) in [
            ("SummerSale", "alice"),
            ("Rentrée 2026 | Paris", "linkedin/ads"),
            ("a\"b", "c,d]"),
        ] {
            let token = encode(campaign, source);
            let referral = decode(&token).unwrap();
            assert_eq!(referral.campaign_name, campaign);
            assert_eq!(referral.utm_source, source);
        }
    }

    #[test]
    fn test_token_is_url_safe() {
        let token = encode("Campaign ???>>>", "source ~~~");
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode(""), Err(AppError::InvalidReferral(_))));
        assert!(matches!(decode("!!!"), Err(AppError::InvalidReferral(_))));
        // valid base64, not a JSON pair
        let token = URL_SAFE_NO_PAD.encode(b"{\"a\":1}");
        assert!(matches!(decode(&token), Err(AppError::InvalidReferral(_))));
    }

    #[test]
    fn test_decode_rejects_empty_components() {
        let token = encode("SummerSale", "");
        assert!(matches!(decode(&token), Err(AppError::InvalidReferral(_))));
    }
}
