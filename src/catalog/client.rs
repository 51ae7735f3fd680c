//! HTTP catalog lookup client.
//!
//! The client owns its provider credentials and a cached bearer token with
//! expiry; callers construct one per process and share it. No ambient
//! globals.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use serde::Deserialize;

use crate::catalog::model::{CatalogItem, ItemKind, SubItem};
use crate::foundation::error::{PosterError, PosterResult};

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
/// Refresh the cached token this long before its reported expiry.
const TOKEN_EXPIRY_SLACK: Duration = Duration::from_secs(60);

/// Client-credentials material for the catalog provider.
#[derive(Clone, Debug)]
pub struct CatalogAuth {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Token endpoint URL.
    pub token_url: String,
}

impl CatalogAuth {
    /// Read credentials from `CATALOG_CLIENT_ID` / `CATALOG_CLIENT_SECRET` /
    /// `CATALOG_TOKEN_URL`.
    pub fn from_env() -> PosterResult<Self> {
        let var = |name: &str| {
            std::env::var(name)
                .map_err(|_| PosterError::validation(format!("{name} is not set")))
        };
        Ok(Self {
            client_id: var("CATALOG_CLIENT_ID")?,
            client_secret: var("CATALOG_CLIENT_SECRET")?,
            token_url: var("CATALOG_TOKEN_URL")?,
        })
    }
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Catalog lookup client with an owned, expiry-aware token cache.
pub struct CatalogClient {
    http: reqwest::Client,
    auth: CatalogAuth,
    api_base: String,
    cached: Mutex<Option<CachedToken>>,
}

#[derive(Deserialize)]
struct AuthResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct SearchResponse {
    albums: SearchPage,
}

#[derive(Deserialize)]
struct SearchPage {
    items: Vec<AlbumDto>,
}

#[derive(Deserialize)]
struct AlbumDto {
    id: String,
    name: String,
    #[serde(default)]
    artists: Vec<NamedDto>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    images: Vec<ImageDto>,
    #[serde(default)]
    tracks: Option<TrackPage>,
    #[serde(default)]
    label: Option<String>,
}

#[derive(Deserialize)]
struct NamedDto {
    name: String,
}

#[derive(Deserialize)]
struct ImageDto {
    url: String,
    #[serde(default)]
    width: Option<u32>,
}

#[derive(Deserialize)]
struct TrackPage {
    items: Vec<TrackDto>,
}

#[derive(Deserialize)]
struct TrackDto {
    #[serde(default)]
    track_number: Option<u32>,
    name: String,
    #[serde(default)]
    duration_ms: Option<u64>,
}

impl AlbumDto {
    fn into_item(self) -> CatalogItem {
        // Widest image first; providers usually order large -> small already.
        let artwork_url = self
            .images
            .iter()
            .max_by_key(|i| i.width.unwrap_or(0))
            .map(|i| i.url.clone())
            .or_else(|| self.images.first().map(|i| i.url.clone()));

        let sub_items = self
            .tracks
            .map(|t| {
                t.items
                    .into_iter()
                    .enumerate()
                    .map(|(idx, t)| SubItem {
                        number: t.track_number.unwrap_or(idx as u32 + 1),
                        title: t.name,
                        duration_ms: t.duration_ms,
                    })
                    .collect()
            })
            .unwrap_or_default();

        CatalogItem {
            id: self.id,
            title: self.name,
            kind: ItemKind::Album,
            contributors: self.artists.into_iter().map(|a| a.name).collect(),
            release_date: self.release_date,
            sub_items,
            artwork_url,
            descriptor: self.label,
        }
    }
}

impl CatalogClient {
    /// Build a client for `api_base` with the given credentials.
    pub fn new(api_base: impl Into<String>, auth: CatalogAuth) -> PosterResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("build catalog http client")?;
        Ok(Self {
            http,
            auth,
            api_base: api_base.into().trim_end_matches('/').to_owned(),
            cached: Mutex::new(None),
        })
    }

    /// Current bearer token, refreshed through the client-credentials flow
    /// when missing or within the expiry slack.
    pub async fn valid_token(&self) -> PosterResult<String> {
        {
            let cached = self
                .cached
                .lock()
                .map_err(|_| PosterError::validation("catalog token cache poisoned"))?;
            if let Some(tok) = cached.as_ref()
                && Instant::now() + TOKEN_EXPIRY_SLACK < tok.expires_at
            {
                return Ok(tok.value.clone());
            }
        }

        tracing::debug!(token_url = %self.auth.token_url, "refreshing catalog token");
        let response = self
            .http
            .post(&self.auth.token_url)
            .basic_auth(&self.auth.client_id, Some(&self.auth.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .context("catalog token request")?
            .error_for_status()
            .context("catalog token request rejected")?
            .json::<AuthResponse>()
            .await
            .context("catalog token response body")?;

        let value = response.access_token;
        let mut cached = self
            .cached
            .lock()
            .map_err(|_| PosterError::validation("catalog token cache poisoned"))?;
        *cached = Some(CachedToken {
            value: value.clone(),
            expires_at: Instant::now() + Duration::from_secs(response.expires_in),
        });
        Ok(value)
    }

    /// Search releases by free text, returning up to `limit` mapped records.
    pub async fn search(&self, query: &str, limit: u32) -> PosterResult<Vec<CatalogItem>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let token = self.valid_token().await?;
        let limit = limit.to_string();
        let response = self
            .http
            .get(format!("{}/search", self.api_base))
            .bearer_auth(token)
            .query(&[("q", query), ("type", "album"), ("limit", limit.as_str())])
            .send()
            .await
            .context("catalog search request")?
            .error_for_status()
            .context("catalog search rejected")?
            .json::<SearchResponse>()
            .await
            .context("catalog search response body")?;

        Ok(response
            .albums
            .items
            .into_iter()
            .map(AlbumDto::into_item)
            .collect())
    }

    /// Fetch a single release, including its full track listing.
    pub async fn item(&self, id: &str) -> PosterResult<CatalogItem> {
        let token = self.valid_token().await?;
        let dto = self
            .http
            .get(format!("{}/albums/{id}", self.api_base))
            .bearer_auth(token)
            .send()
            .await
            .context("catalog item request")?
            .error_for_status()
            .context("catalog item rejected")?
            .json::<AlbumDto>()
            .await
            .context("catalog item response body")?;
        Ok(dto.into_item())
    }
}

/// Fetch raw artwork bytes.
///
/// `http(s)` locations go through the wire; anything else is treated as a
/// local path so offline items can reference files on disk.
pub async fn fetch_artwork_bytes(http: &reqwest::Client, location: &str) -> PosterResult<Vec<u8>> {
    if location.starts_with("http://") || location.starts_with("https://") {
        let bytes = http
            .get(location)
            .send()
            .await
            .context("artwork request")?
            .error_for_status()
            .context("artwork request rejected")?
            .bytes()
            .await
            .context("artwork body")?;
        Ok(bytes.to_vec())
    } else {
        std::fs::read(location)
            .with_context(|| format!("read artwork file '{location}'"))
            .map_err(PosterError::from)
    }
}
