use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;

use posterforge::token::client::{TokenApi, TokenApiClient, TokenCheck};
use posterforge::token::gate::{ExportOutcome, GateState, TokenGate};
use posterforge::token::mail::LogMailer;
use posterforge::token::model::{
    OrderIntake, TokenRecord, TokenStatus, WebhookResponse, expiry_for,
};
use posterforge::token::server::{TokenServerState, router};
use posterforge::token::store::{MemoryTokenStore, TokenStore};

async fn spawn_service(store: Box<dyn TokenStore>) -> SocketAddr {
    let state = TokenServerState::new(store, Arc::new(LogMailer::new("http://localhost:5173")));
    let app = router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn seeded_store(token: &str) -> MemoryTokenStore {
    let now = Utc::now();
    let mut store = MemoryTokenStore::new();
    store
        .insert_token(TokenRecord {
            token: token.into(),
            order_id: "ord-777".into(),
            customer_email: "buyer@example.com".into(),
            created_at: now,
            expires_at: expiry_for(now),
            downloaded: false,
            downloaded_at: None,
            poster_data: None,
            status: TokenStatus::Active,
        })
        .unwrap();
    store
}

#[tokio::test]
async fn full_single_use_flow_over_http() {
    let token = "A1B2C3D4E5F67890";
    let addr = spawn_service(Box::new(seeded_store(token))).await;
    let api = TokenApiClient::new(format!("http://{addr}")).unwrap();

    // Validation reports active with a ~30-day expiry.
    match api.validate(token).await {
        TokenCheck::Active { expires_at, .. } => {
            let expires = expires_at.expect("active tokens carry an expiry");
            let days = (expires - Utc::now()).num_days();
            assert!((29..=30).contains(&days), "expiry {days} days out");
        }
        other => panic!("expected active, got {other:?}"),
    }

    // Gated export: customize, export, report completion.
    let dir = tempfile::tempdir().unwrap();
    let out: PathBuf = dir.path().join("poster.png");
    let mut gate = TokenGate::new(
        Box::new(TokenApiClient::new(format!("http://{addr}")).unwrap()),
        token,
    );
    assert!(gate.validate().await.is_active());

    let out_clone = out.clone();
    let outcome = gate
        .export(
            || true,
            move || {
                std::fs::write(&out_clone, b"png bytes").unwrap();
                Ok(out_clone)
            },
            json!({"background": "custom", "radius": 12}),
        )
        .await;
    match outcome {
        ExportOutcome::Completed { tracked, path } => {
            assert!(tracked, "server should record the download");
            assert!(path.exists());
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    // The same token now validates as used, with the customization recorded.
    match api.validate(token).await {
        TokenCheck::Used { downloaded_at } => assert!(downloaded_at.is_some()),
        other => panic!("expected used, got {other:?}"),
    }
    assert!(!gate.can_export());

    // A replayed completion report is not treated as success.
    assert!(!api.mark_downloaded(token, json!({})).await);
}

#[tokio::test]
async fn webhook_is_idempotent_per_order() {
    let addr = spawn_service(Box::new(MemoryTokenStore::new())).await;
    let http = reqwest::Client::new();
    let url = format!("http://{addr}/api/webhooks/order");
    let intake = OrderIntake {
        order_id: "ord-42".into(),
        buyer_email: "buyer@example.com".into(),
        name: Some("Sam".into()),
        transaction_id: Some("tx-9".into()),
    };

    let first: WebhookResponse = http
        .post(&url)
        .json(&intake)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(first.success);
    assert_eq!(first.token.len(), 16);

    let replay: WebhookResponse = http
        .post(&url)
        .json(&intake)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(replay.token, first.token, "replay must return the same token");

    // The minted token validates as active.
    let api = TokenApiClient::new(format!("http://{addr}")).unwrap();
    assert!(matches!(
        api.validate(&first.token).await,
        TokenCheck::Active { .. }
    ));
}

#[tokio::test]
async fn expired_and_unknown_tokens_map_to_their_states() {
    let now = Utc::now();
    let mut store = MemoryTokenStore::new();
    store
        .insert_token(TokenRecord {
            token: "EXPIREDTOKEN0001".into(),
            order_id: "ord-1".into(),
            customer_email: "buyer@example.com".into(),
            created_at: now - Duration::days(60),
            expires_at: now - Duration::days(30),
            downloaded: false,
            downloaded_at: None,
            poster_data: None,
            status: TokenStatus::Active,
        })
        .unwrap();
    let addr = spawn_service(Box::new(store)).await;
    let api = TokenApiClient::new(format!("http://{addr}")).unwrap();

    assert!(matches!(
        api.validate("EXPIREDTOKEN0001").await,
        TokenCheck::Expired { .. }
    ));
    assert!(matches!(
        api.validate("DOESNOTEXIST0000").await,
        TokenCheck::Invalid { .. }
    ));

    // The raw status codes follow the store state too.
    let http = reqwest::Client::new();
    let resp = http
        .get(format!("http://{addr}/api/tokens/DOESNOTEXIST0000/validate"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unreachable_service_fails_closed_to_invalid() {
    // Nothing listens on this address.
    let api = TokenApiClient::new("http://127.0.0.1:9").unwrap();
    let mut gate = TokenGate::new(Box::new(api), "A1B2C3D4E5F67890");
    match gate.validate().await {
        GateState::Invalid { message } => {
            assert!(message.contains("connection"), "generic message, got {message}")
        }
        other => panic!("expected invalid, got {other:?}"),
    }
    assert!(!gate.can_export());
}
