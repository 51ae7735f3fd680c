//! HTTP client for the token service.
//!
//! The client is fail-closed: any transport or decoding problem during
//! validation is reported as an invalid token with a generic connectivity
//! message, never as an active one.

use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::foundation::error::PosterResult;
use crate::token::model::{MarkDownloadedRequest, MarkDownloadedResponse, ValidationResponse};

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
/// Message shown when the token service cannot be reached.
pub const CONNECTIVITY_ERROR: &str = "Server connection error. Please try again later.";

/// Client-observed view of a token's server-side state.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenCheck {
    /// Redeemable; customization and export may proceed.
    Active {
        /// Buyer email, for display.
        customer_email: Option<String>,
        /// Expiry timestamp.
        expires_at: Option<DateTime<Utc>>,
        /// Owning order.
        order_id: Option<String>,
    },
    /// Already consumed.
    Used {
        /// When the download happened.
        downloaded_at: Option<DateTime<Utc>>,
    },
    /// Past its expiry.
    Expired {
        /// The expiry that passed.
        expires_at: Option<DateTime<Utc>>,
    },
    /// Unknown token, malformed response, or connectivity failure.
    Invalid {
        /// User-facing explanation.
        message: String,
    },
}

/// Remote operations the gate depends on.
#[async_trait]
pub trait TokenApi: Send + Sync {
    /// Check a token against the store.
    async fn validate(&self, token: &str) -> TokenCheck;
    /// Report the completed download; returns whether the server recorded it.
    async fn mark_downloaded(&self, token: &str, poster_data: serde_json::Value) -> bool;
}

/// Reqwest-backed [`TokenApi`].
pub struct TokenApiClient {
    http: reqwest::Client,
    api_base: String,
}

impl TokenApiClient {
    /// Client for a token service rooted at `api_base`.
    pub fn new(api_base: impl Into<String>) -> PosterResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("build token http client")?;
        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_owned(),
        })
    }
}

/// Map a wire validation response onto the client state.
pub fn map_validation(resp: ValidationResponse) -> TokenCheck {
    match resp.status.as_str() {
        "active" if resp.valid => TokenCheck::Active {
            customer_email: resp.customer_email,
            expires_at: resp.expires_at,
            order_id: resp.order_id,
        },
        "used" => TokenCheck::Used {
            downloaded_at: resp.downloaded_at,
        },
        "expired" => TokenCheck::Expired {
            expires_at: resp.expires_at,
        },
        _ => TokenCheck::Invalid {
            message: resp.error.unwrap_or_else(|| "Token not found".into()),
        },
    }
}

#[async_trait]
impl TokenApi for TokenApiClient {
    async fn validate(&self, token: &str) -> TokenCheck {
        let url = format!("{}/api/tokens/{token}/validate", self.api_base);
        // Non-2xx responses still carry a meaningful body (used/expired/not
        // found), so the status code is ignored and the body decoded either
        // way.
        let response = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(err) => {
                tracing::warn!(%err, "token validation request failed");
                return TokenCheck::Invalid {
                    message: CONNECTIVITY_ERROR.into(),
                };
            }
        };
        match response.json::<ValidationResponse>().await {
            Ok(body) => map_validation(body),
            Err(err) => {
                tracing::warn!(%err, "token validation body unreadable");
                TokenCheck::Invalid {
                    message: CONNECTIVITY_ERROR.into(),
                }
            }
        }
    }

    async fn mark_downloaded(&self, token: &str, poster_data: serde_json::Value) -> bool {
        let url = format!("{}/api/tokens/mark-downloaded", self.api_base);
        let request = MarkDownloadedRequest {
            token: token.to_owned(),
            poster_data,
        };
        match self.http.post(&url).json(&request).send().await {
            Ok(response) => match response.json::<MarkDownloadedResponse>().await {
                Ok(body) => body.success,
                Err(err) => {
                    tracing::warn!(%err, "mark-downloaded body unreadable");
                    false
                }
            },
            Err(err) => {
                tracing::warn!(%err, "mark-downloaded request failed");
                false
            }
        }
    }
}
