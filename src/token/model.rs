//! Token and order records, minting, and the wire shapes of the service.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Days a freshly minted token stays redeemable.
pub const TOKEN_TTL_DAYS: i64 = 30;
/// Length of the minted token string.
pub const TOKEN_LEN: usize = 16;

/// Redundant status tag kept alongside the downloaded flag and expiry so the
/// store is greppable by hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStatus {
    /// Redeemable.
    Active,
    /// Download already consumed.
    Used,
    /// Past its expiry timestamp.
    Expired,
}

/// One purchased order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// E-commerce order id.
    pub order_id: String,
    /// Buyer email.
    pub customer_email: String,
    /// Buyer display name.
    pub customer_name: String,
    /// Intake timestamp.
    pub created_at: DateTime<Utc>,
    /// Payment transaction reference, when the webhook carried one.
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// One download link, minted together with its order.
///
/// Mutated exactly once (on the confirmed download) or never.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// The opaque token string.
    pub token: String,
    /// Owning order.
    pub order_id: String,
    /// Buyer email.
    pub customer_email: String,
    /// Mint timestamp.
    pub created_at: DateTime<Utc>,
    /// Mint timestamp plus the fixed TTL.
    pub expires_at: DateTime<Utc>,
    /// Whether the single download happened.
    pub downloaded: bool,
    /// When it happened.
    #[serde(default)]
    pub downloaded_at: Option<DateTime<Utc>>,
    /// Customization blob recorded at download time.
    #[serde(default)]
    pub poster_data: Option<serde_json::Value>,
    /// Redundant status tag.
    pub status: TokenStatus,
}

impl TokenRecord {
    /// Whether `now` is past this record's expiry.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Order-intake webhook payload.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OrderIntake {
    /// E-commerce order id; replays of the same id are idempotent.
    pub order_id: String,
    /// Buyer email address.
    pub buyer_email: String,
    /// Buyer display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Payment transaction reference.
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// Mint a fresh token: a v4 UUID with dashes stripped, truncated to
/// [`TOKEN_LEN`] and upper-cased.
pub fn mint_token() -> String {
    uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(TOKEN_LEN)
        .collect::<String>()
        .to_uppercase()
}

/// Expiry for a token minted at `created_at`.
pub fn expiry_for(created_at: DateTime<Utc>) -> DateTime<Utc> {
    created_at + Duration::days(TOKEN_TTL_DAYS)
}

// ---- wire shapes ----

/// Response body of the validate endpoint.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationResponse {
    /// Whether the token unlocks customization.
    pub valid: bool,
    /// `active` / `used` / `expired` / `invalid`.
    pub status: String,
    /// Human-readable error for non-active states.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Buyer email, on active tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    /// Expiry timestamp, on active/expired tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Owning order id, on active tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Download timestamp, on used tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloaded_at: Option<DateTime<Utc>>,
}

/// Request body of the mark-downloaded endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkDownloadedRequest {
    /// The token being consumed.
    pub token: String,
    /// Arbitrary customization blob describing what was generated.
    #[serde(default)]
    pub poster_data: serde_json::Value,
}

/// Response body of the mark-downloaded endpoint.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MarkDownloadedResponse {
    /// True only when this call performed the one meaningful transition.
    pub success: bool,
    /// Failure explanation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response body of the order-intake webhook.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WebhookResponse {
    /// Whether the order is now (or was already) provisioned.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
    /// The order's token (existing one on replays).
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_tokens_are_fixed_length_uppercase_hex() {
        for _ in 0..32 {
            let t = mint_token();
            assert_eq!(t.len(), TOKEN_LEN);
            assert!(t.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn consecutive_mints_differ() {
        assert_ne!(mint_token(), mint_token());
    }

    #[test]
    fn expiry_is_thirty_days_out() {
        let t0 = Utc::now();
        assert_eq!(expiry_for(t0) - t0, Duration::days(30));
    }

    #[test]
    fn validation_response_uses_camel_case_keys() {
        let resp = ValidationResponse {
            valid: true,
            status: "active".into(),
            customer_email: Some("a@b.c".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("customerEmail").is_some());
        assert!(json.get("customer_email").is_none());
    }
}
