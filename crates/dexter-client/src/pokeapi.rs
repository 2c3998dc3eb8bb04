//! Client for the paged creatures API (PokeAPI and compatible servers).
//!
//! Listing pages look like:
//!
//! ```json
//! { "count": 1302, "next": "https://pokeapi.co/api/v2/pokemon?offset=20&limit=20",
//!   "previous": null, "results": [ { "name": "bulbasaur", "url": "https://pokeapi.co/api/v2/pokemon/1/" } ] }
//! ```
//!
//! Each `results[].url` points at a detail document carrying `id`, `name`,
//! `sprites` and `base_experience`.
//!
//! Requests are never retried here. Failures surface as network-class
//! [`AppError`]s and the pipeline decides what they mean.

use dexter_core::error::AppError;
use dexter_core::traits::{DetailFetcher, PageFetcher};
use dexter_core::{HttpConfig, Page, Record, Reference};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Listing page as returned by the upstream.
///
/// `results` is required: a 200 body without it is not a listing page.
#[derive(Deserialize, Debug)]
struct ListResponse {
    #[serde(default)]
    next: Option<String>,
    results: Vec<ListEntry>,
}

#[derive(Deserialize, Debug)]
struct ListEntry {
    #[serde(default)]
    url: Option<String>,
}

/// HTTP client for the creatures catalog.
///
/// # Examples
///
/// ```no_run
/// use dexter_client::PokeApiClient;
/// use dexter_core::PageFetcher;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = PokeApiClient::new("https://pokeapi.co/api/v2/pokemon")?;
/// let page = client.fetch_page(None).await?;
/// println!("{} items, more: {}", page.items.len(), page.next.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PokeApiClient {
    client: Client,
    start_url: Url,
    timeout_secs: u64,
}

impl PokeApiClient {
    /// Creates a client whose first page is `start_url`, with default HTTP settings.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidUrl` if `start_url` is not an absolute URL.
    /// Returns `AppError::ClientError` if the HTTP client cannot be built.
    pub fn new(start_url: &str) -> Result<Self, AppError> {
        Self::with_config(start_url, &HttpConfig::default())
    }

    pub fn with_config(start_url: &str, http_config: &HttpConfig) -> Result<Self, AppError> {
        let start_url =
            Url::parse(start_url).map_err(|_| AppError::InvalidUrl(start_url.to_string()))?;

        let client = Client::builder()
            .user_agent(http_config.user_agent.as_str())
            .timeout(http_config.timeout)
            .build()
            .map_err(|e| AppError::ClientError(e.to_string()))?;

        Ok(Self {
            client,
            start_url,
            timeout_secs: http_config.timeout.as_secs(),
        })
    }

    pub fn start_url(&self) -> &Url {
        &self.start_url
    }

    /// Resolves a reference against the start URL.
    ///
    /// Absolute URLs come back unchanged; relative ones are joined.
    fn resolve(&self, reference: &Reference) -> Result<Url, AppError> {
        self.start_url
            .join(reference.url.trim())
            .map_err(|_| AppError::InvalidUrl(reference.url.clone()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, AppError> {
        debug!(url = %url, "GET");

        let resp = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {}", e))
            } else {
                AppError::ClientError(e.to_string())
            }
        })?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::RateLimitExceeded);
        }
        if !status.is_success() {
            return Err(AppError::ClientError(format!(
                "HTTP {} from {}",
                status.as_u16(),
                url
            )));
        }

        resp.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else {
                AppError::ClientError(format!("Invalid response body from {}: {}", url, e))
            }
        })
    }

    /// Maps a listing body into a [`Page`].
    ///
    /// Entries without a URL carry nothing to fetch and are dropped before
    /// fan-out, so they are not counted as items. A missing, null or blank
    /// `next` ends the stream.
    fn into_page(response: ListResponse) -> Page {
        let items = response
            .results
            .into_iter()
            .filter_map(|entry| entry.url)
            .filter(|url| !url.trim().is_empty())
            .map(Reference::from)
            .collect();

        let next = response
            .next
            .filter(|next| !next.trim().is_empty())
            .map(Reference::from);

        Page { items, next }
    }

    /// Normalizes a detail document into a [`Record`].
    ///
    /// Returns `None` when `id` is missing, not an integer, or not positive.
    /// Other fields are optional; a missing `name` becomes an empty string.
    pub fn into_record(body: &Value) -> Option<Record> {
        let id = body.get("id")?.as_i64().filter(|id| *id > 0)?;

        let text = |v: Option<&Value>| v.and_then(Value::as_str).map(str::to_string);
        let sprites = body.get("sprites");

        Some(Record {
            id,
            name: text(body.get("name")).unwrap_or_default(),
            sprite_url: text(sprites.and_then(|s| s.get("front_default"))),
            artwork_url: text(
                sprites
                    .and_then(|s| s.get("other"))
                    .and_then(|o| o.get("official-artwork"))
                    .and_then(|a| a.get("front_default")),
            ),
            base_experience: body.get("base_experience").and_then(Value::as_i64),
        })
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl PageFetcher for PokeApiClient {
    async fn fetch_page(&self, cursor: Option<&Reference>) -> Result<Page, AppError> {
        let url = match cursor {
            Some(cursor) => self.resolve(cursor)?,
            None => self.start_url.clone(),
        };
        let response: ListResponse = self.get_json(url).await?;
        Ok(Self::into_page(response))
    }
}

impl DetailFetcher for PokeApiClient {
    async fn fetch_detail(&self, reference: &Reference) -> Result<Option<Record>, AppError> {
        let url = self.resolve(reference)?;
        let body: Value = self.get_json(url).await?;
        Ok(Self::into_record(&body))
    }
}
