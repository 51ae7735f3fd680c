//! Token lifecycle rules, independent of the HTTP surface.
//!
//! Three operations mirror the three endpoints: idempotent order intake,
//! read-only validation, and the at-most-once mark-downloaded transition.
//! All three take `now` explicitly so expiry behavior is testable.

use chrono::{DateTime, Utc};

use crate::foundation::error::PosterResult;
use crate::token::mail::Mailer;
use crate::token::model::{
    MarkDownloadedRequest, MarkDownloadedResponse, OrderIntake, OrderRecord, TokenRecord,
    TokenStatus, ValidationResponse, WebhookResponse, expiry_for, mint_token,
};
use crate::token::store::{MarkOutcome, TokenStore};

/// Provision an order: persist it, mint its token, trigger the email.
///
/// Replays of an already-seen order id return the existing token and perform
/// no writes.
pub fn process_order(
    store: &mut dyn TokenStore,
    mailer: &dyn Mailer,
    intake: &OrderIntake,
    now: DateTime<Utc>,
) -> PosterResult<WebhookResponse> {
    if store.order(&intake.order_id)?.is_some() {
        let existing = store
            .token_for_order(&intake.order_id)?
            .map(|t| t.token)
            .unwrap_or_default();
        tracing::info!(order_id = %intake.order_id, "order replayed, returning existing token");
        return Ok(WebhookResponse {
            success: true,
            message: "Order already processed".into(),
            token: existing,
        });
    }

    let customer_name = intake.name.clone().unwrap_or_else(|| "Customer".into());
    store.insert_order(OrderRecord {
        order_id: intake.order_id.clone(),
        customer_email: intake.buyer_email.clone(),
        customer_name: customer_name.clone(),
        created_at: now,
        transaction_id: intake.transaction_id.clone(),
    })?;

    let token = mint_token();
    store.insert_token(TokenRecord {
        token: token.clone(),
        order_id: intake.order_id.clone(),
        customer_email: intake.buyer_email.clone(),
        created_at: now,
        expires_at: expiry_for(now),
        downloaded: false,
        downloaded_at: None,
        poster_data: None,
        status: TokenStatus::Active,
    })?;

    mailer.send_creation_link(&intake.buyer_email, &customer_name, &token)?;
    tracing::info!(order_id = %intake.order_id, "order provisioned");

    Ok(WebhookResponse {
        success: true,
        message: "Order processed and email sent".into(),
        token,
    })
}

/// Map a token's stored state to its wire response.
///
/// The downloaded flag is checked before expiry, so a consumed token reports
/// `used` even after it also expired.
pub fn validate(
    store: &dyn TokenStore,
    token: &str,
    now: DateTime<Utc>,
) -> PosterResult<ValidationResponse> {
    let Some(record) = store.token(token)? else {
        return Ok(ValidationResponse {
            valid: false,
            status: "invalid".into(),
            error: Some("Token not found".into()),
            ..Default::default()
        });
    };

    if record.downloaded {
        return Ok(ValidationResponse {
            valid: false,
            status: "used".into(),
            error: Some("Poster already downloaded".into()),
            downloaded_at: record.downloaded_at,
            ..Default::default()
        });
    }

    if record.is_expired_at(now) {
        return Ok(ValidationResponse {
            valid: false,
            status: "expired".into(),
            error: Some("Link expired".into()),
            expires_at: Some(record.expires_at),
            ..Default::default()
        });
    }

    Ok(ValidationResponse {
        valid: true,
        status: "active".into(),
        customer_email: Some(record.customer_email),
        expires_at: Some(record.expires_at),
        order_id: Some(record.order_id),
        ..Default::default()
    })
}

/// Consume a token. A replay on an already-downloaded token does not flip
/// any state and is not reported as success.
pub fn mark_downloaded(
    store: &mut dyn TokenStore,
    request: &MarkDownloadedRequest,
    now: DateTime<Utc>,
) -> PosterResult<MarkDownloadedResponse> {
    match store.mark_downloaded(&request.token, now, request.poster_data.clone())? {
        MarkOutcome::Marked => {
            tracing::info!(token = %request.token, "download recorded");
            Ok(MarkDownloadedResponse {
                success: true,
                error: None,
            })
        }
        MarkOutcome::AlreadyDownloaded => Ok(MarkDownloadedResponse {
            success: false,
            error: Some("Poster already downloaded".into()),
        }),
        MarkOutcome::NotFound => Ok(MarkDownloadedResponse {
            success: false,
            error: Some("Token not found".into()),
        }),
    }
}
