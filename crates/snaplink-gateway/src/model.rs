use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use snaplink_core::{ExpirationPolicy, ShortCode, ShortenerError, ShortLink, ShortenParams};

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    pub long_url: String,
    pub custom_code: Option<String>,
    /// Absolute expiration as an RFC 3339 timestamp.
    pub expires_at: Option<String>,
    /// Relative expiration in seconds from now. Mutually exclusive with
    /// `expires_at`.
    pub expires_in_secs: Option<u64>,
}

impl CreateLinkRequest {
    pub fn into_params(self) -> Result<ShortenParams, ShortenerError> {
        let custom_code = self.custom_code.map(ShortCode::new).transpose()?;

        let expiration = match (self.expires_at, self.expires_in_secs) {
            (Some(_), Some(_)) => {
                return Err(ShortenerError::InvalidExpiration(
                    "expires_at and expires_in_secs are mutually exclusive".to_string(),
                ))
            }
            (Some(at), None) => {
                let timestamp: Timestamp = at.parse().map_err(|e| {
                    ShortenerError::InvalidExpiration(format!("unparsable expires_at '{at}': {e}"))
                })?;
                ExpirationPolicy::AtTimestamp(timestamp)
            }
            (None, Some(secs)) => {
                ExpirationPolicy::AfterDuration(SignedDuration::from_secs(secs as i64))
            }
            (None, None) => ExpirationPolicy::Never,
        };

        Ok(ShortenParams {
            long_url: self.long_url,
            expiration,
            custom_code,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct CreateLinkResponse {
    pub short_code: String,
    pub short_url: String,
    pub long_url: String,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub long_url: String,
    pub clicks: u64,
}

/// One row of the recent-links listing.
#[derive(Debug, Serialize)]
pub struct LinkSummary {
    pub short_code: String,
    pub long_url: String,
    pub clicks: u64,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
}

impl From<ShortLink> for LinkSummary {
    fn from(link: ShortLink) -> Self {
        Self {
            short_code: link.short_code.to_string(),
            long_url: link.long_url,
            clicks: link.clicks,
            created_at: link.created_at,
            expires_at: link.expires_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
