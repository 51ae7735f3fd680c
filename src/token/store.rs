//! The authoritative order/token store.
//!
//! The interface is deliberately small: the collaborator behind it is an
//! opaque order/token store. The invariant that matters, at most one
//! successful mark-downloaded transition per token, is enforced here, not by
//! callers.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context as _;
use chrono::{DateTime, Utc};

use crate::foundation::error::{PosterError, PosterResult};
use crate::token::model::{OrderRecord, TokenRecord, TokenStatus};

/// Result of a mark-downloaded attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkOutcome {
    /// This call performed the one-time transition.
    Marked,
    /// The flag was already set; nothing changed.
    AlreadyDownloaded,
    /// No such token.
    NotFound,
}

/// Storage interface for orders and their download tokens.
pub trait TokenStore: Send + Sync {
    /// Look up an order by id.
    fn order(&self, order_id: &str) -> PosterResult<Option<OrderRecord>>;
    /// Look up a token record.
    fn token(&self, token: &str) -> PosterResult<Option<TokenRecord>>;
    /// Look up the token minted for an order.
    fn token_for_order(&self, order_id: &str) -> PosterResult<Option<TokenRecord>>;
    /// Persist a new order.
    fn insert_order(&mut self, order: OrderRecord) -> PosterResult<()>;
    /// Persist a new token record.
    fn insert_token(&mut self, record: TokenRecord) -> PosterResult<()>;
    /// Perform the at-most-once downloaded transition.
    fn mark_downloaded(
        &mut self,
        token: &str,
        now: DateTime<Utc>,
        poster_data: serde_json::Value,
    ) -> PosterResult<MarkOutcome>;
}

/// In-memory store, used by tests and as the backing of the JSON store.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct MemoryTokenStore {
    orders: HashMap<String, OrderRecord>,
    tokens: HashMap<String, TokenRecord>,
}

impl MemoryTokenStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of token records held.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

impl TokenStore for MemoryTokenStore {
    fn order(&self, order_id: &str) -> PosterResult<Option<OrderRecord>> {
        Ok(self.orders.get(order_id).cloned())
    }

    fn token(&self, token: &str) -> PosterResult<Option<TokenRecord>> {
        Ok(self.tokens.get(token).cloned())
    }

    fn token_for_order(&self, order_id: &str) -> PosterResult<Option<TokenRecord>> {
        Ok(self
            .tokens
            .values()
            .find(|t| t.order_id == order_id)
            .cloned())
    }

    fn insert_order(&mut self, order: OrderRecord) -> PosterResult<()> {
        self.orders.insert(order.order_id.clone(), order);
        Ok(())
    }

    fn insert_token(&mut self, record: TokenRecord) -> PosterResult<()> {
        self.tokens.insert(record.token.clone(), record);
        Ok(())
    }

    fn mark_downloaded(
        &mut self,
        token: &str,
        now: DateTime<Utc>,
        poster_data: serde_json::Value,
    ) -> PosterResult<MarkOutcome> {
        let Some(record) = self.tokens.get_mut(token) else {
            return Ok(MarkOutcome::NotFound);
        };
        if record.downloaded {
            return Ok(MarkOutcome::AlreadyDownloaded);
        }
        record.downloaded = true;
        record.downloaded_at = Some(now);
        record.poster_data = Some(poster_data);
        record.status = TokenStatus::Used;
        Ok(MarkOutcome::Marked)
    }
}

/// JSON-document store: the whole table serialized to one file, rewritten on
/// every mutation. Stands in for the original deployment's spreadsheet.
#[derive(Debug)]
pub struct JsonTokenStore {
    path: PathBuf,
    inner: MemoryTokenStore,
}

impl JsonTokenStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> PosterResult<Self> {
        let path = path.into();
        let inner = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("parse token store '{}'", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => MemoryTokenStore::new(),
            Err(e) => {
                return Err(PosterError::store(format!(
                    "read token store '{}': {e}",
                    path.display()
                )));
            }
        };
        Ok(Self { path, inner })
    }

    fn persist(&self) -> PosterResult<()> {
        let bytes = serde_json::to_vec_pretty(&self.inner).context("serialize token store")?;
        // Write-then-rename so a crash never leaves a half-written table.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes)
            .with_context(|| format!("write token store '{}'", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace token store '{}'", self.path.display()))?;
        Ok(())
    }
}

impl TokenStore for JsonTokenStore {
    fn order(&self, order_id: &str) -> PosterResult<Option<OrderRecord>> {
        self.inner.order(order_id)
    }

    fn token(&self, token: &str) -> PosterResult<Option<TokenRecord>> {
        self.inner.token(token)
    }

    fn token_for_order(&self, order_id: &str) -> PosterResult<Option<TokenRecord>> {
        self.inner.token_for_order(order_id)
    }

    fn insert_order(&mut self, order: OrderRecord) -> PosterResult<()> {
        self.inner.insert_order(order)?;
        self.persist()
    }

    fn insert_token(&mut self, record: TokenRecord) -> PosterResult<()> {
        self.inner.insert_token(record)?;
        self.persist()
    }

    fn mark_downloaded(
        &mut self,
        token: &str,
        now: DateTime<Utc>,
        poster_data: serde_json::Value,
    ) -> PosterResult<MarkOutcome> {
        let outcome = self.inner.mark_downloaded(token, now, poster_data)?;
        if outcome == MarkOutcome::Marked {
            self.persist()?;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::model::{expiry_for, mint_token};
    use serde_json::json;

    fn record(now: DateTime<Utc>) -> TokenRecord {
        TokenRecord {
            token: mint_token(),
            order_id: "ord-1".into(),
            customer_email: "buyer@example.com".into(),
            created_at: now,
            expires_at: expiry_for(now),
            downloaded: false,
            downloaded_at: None,
            poster_data: None,
            status: TokenStatus::Active,
        }
    }

    #[test]
    fn mark_downloaded_is_at_most_once() {
        let now = Utc::now();
        let mut store = MemoryTokenStore::new();
        let rec = record(now);
        let token = rec.token.clone();
        store.insert_token(rec).unwrap();

        assert_eq!(
            store
                .mark_downloaded(&token, now, json!({"radius": 12}))
                .unwrap(),
            MarkOutcome::Marked
        );
        let first = store.token(&token).unwrap().unwrap();
        assert!(first.downloaded);
        assert_eq!(first.status, TokenStatus::Used);

        let later = now + chrono::Duration::minutes(5);
        assert_eq!(
            store
                .mark_downloaded(&token, later, json!({"radius": 99}))
                .unwrap(),
            MarkOutcome::AlreadyDownloaded
        );
        // The original download record is untouched by the replay.
        let second = store.token(&token).unwrap().unwrap();
        assert_eq!(second.downloaded_at, first.downloaded_at);
        assert_eq!(second.poster_data, first.poster_data);
    }

    #[test]
    fn unknown_tokens_report_not_found() {
        let mut store = MemoryTokenStore::new();
        assert_eq!(
            store
                .mark_downloaded("NOPE", Utc::now(), json!({}))
                .unwrap(),
            MarkOutcome::NotFound
        );
    }

    #[test]
    fn json_store_round_trips_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let now = Utc::now();
        let rec = record(now);
        let token = rec.token.clone();

        {
            let mut store = JsonTokenStore::open(&path).unwrap();
            store.insert_token(rec.clone()).unwrap();
            store
                .mark_downloaded(&token, now, json!({"background": "flat_dark"}))
                .unwrap();
        }

        let reopened = JsonTokenStore::open(&path).unwrap();
        let loaded = reopened.token(&token).unwrap().unwrap();
        assert!(loaded.downloaded);
        assert_eq!(loaded.order_id, rec.order_id);
        assert_eq!(
            loaded.poster_data.unwrap()["background"],
            json!("flat_dark")
        );
    }

    #[test]
    fn token_for_order_finds_the_link() {
        let now = Utc::now();
        let mut store = MemoryTokenStore::new();
        let rec = record(now);
        let token = rec.token.clone();
        store.insert_token(rec).unwrap();
        assert_eq!(
            store.token_for_order("ord-1").unwrap().unwrap().token,
            token
        );
        assert!(store.token_for_order("ord-2").unwrap().is_none());
    }
}
