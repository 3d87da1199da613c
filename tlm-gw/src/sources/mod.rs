//! Upstream search sources
//!
//! One source per media type, each owning its request and its reshaping of
//! the upstream payload into [`Candidate`]s. The registry maps media types
//! to sources; media types without one (music) are unsupported.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use tlm_common::{Candidate, MediaType};

use crate::config::GatewaySettings;
use crate::error::GatewayError;

pub mod bangumi;
pub mod google_books;
pub mod igdb;

pub use bangumi::BangumiSource;
pub use google_books::GoogleBooksSource;
pub use igdb::IgdbSource;

const USER_AGENT: &str = concat!(
    "tlm-gw/",
    env!("CARGO_PKG_VERSION"),
    " (tier list maker search gateway)"
);

/// A registered upstream
#[derive(Debug, Clone)]
pub enum SearchSource {
    Igdb(IgdbSource),
    GoogleBooks(GoogleBooksSource),
    Bangumi(BangumiSource),
}

impl SearchSource {
    pub fn name(&self) -> &'static str {
        match self {
            SearchSource::Igdb(_) => igdb::UPSTREAM,
            SearchSource::GoogleBooks(_) => google_books::UPSTREAM,
            SearchSource::Bangumi(_) => bangumi::UPSTREAM,
        }
    }

    async fn search(
        &self,
        client: &Client,
        query: &str,
        page_size: Option<u32>,
    ) -> Result<Vec<Candidate>, GatewayError> {
        match self {
            SearchSource::Igdb(source) => source.search(client, query, page_size).await,
            SearchSource::GoogleBooks(source) => source.search(client, query, page_size).await,
            SearchSource::Bangumi(source) => source.search(client, query, page_size).await,
        }
    }
}

/// Media type to source lookup, plus the shared HTTP client
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    client: Client,
    sources: HashMap<MediaType, SearchSource>,
}

impl SourceRegistry {
    /// Registry with no sources
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            sources: HashMap::new(),
        })
    }

    /// Registry with the IGDB, Google Books and Bangumi sources
    pub fn from_settings(settings: &GatewaySettings) -> Result<Self, reqwest::Error> {
        let credentials = &settings.credentials;
        let upstreams = &settings.upstreams;

        let mut registry = Self::new()?;
        registry.register(
            MediaType::Games,
            SearchSource::Igdb(IgdbSource::new(
                credentials.igdb_client_id.clone(),
                credentials.igdb_client_secret.clone(),
                &upstreams.twitch_token_url,
                &upstreams.igdb_base_url,
            )),
        );
        registry.register(
            MediaType::Books,
            SearchSource::GoogleBooks(GoogleBooksSource::new(
                credentials.google_books_api_key.clone(),
                &upstreams.google_books_base_url,
            )),
        );
        registry.register(
            MediaType::Anime,
            SearchSource::Bangumi(BangumiSource::new(
                credentials.bangumi_access_token.clone(),
                &upstreams.bangumi_base_url,
            )),
        );
        Ok(registry)
    }

    pub fn register(&mut self, media: MediaType, source: SearchSource) {
        debug!(media = %media, upstream = source.name(), "Registering search source");
        self.sources.insert(media, source);
    }

    pub fn get(&self, media: MediaType) -> Option<&SearchSource> {
        self.sources.get(&media)
    }

    /// Media types with a registered source, in declaration order
    pub fn media_types(&self) -> Vec<MediaType> {
        MediaType::ALL
            .into_iter()
            .filter(|m| self.sources.contains_key(m))
            .collect()
    }

    /// Run a search against the source registered for `media`
    pub async fn search(
        &self,
        media: MediaType,
        query: &str,
        page_size: Option<u32>,
    ) -> Result<Vec<Candidate>, GatewayError> {
        let source = self
            .get(media)
            .ok_or_else(|| GatewayError::UnsupportedMedia(media.to_string()))?;
        source.search(&self.client, query, page_size).await
    }
}

/// Send a request and decode a successful JSON answer
///
/// Transport failures, non-2xx statuses and undecodable bodies all become
/// [`GatewayError::Upstream`].
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    upstream: &'static str,
    request: RequestBuilder,
) -> Result<T, GatewayError> {
    let response = request
        .send()
        .await
        .map_err(|e| GatewayError::upstream(upstream, e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(GatewayError::upstream(upstream, format!("HTTP {}", status)));
    }

    response
        .json()
        .await
        .map_err(|e| GatewayError::upstream(upstream, format!("invalid response: {}", e)))
}

/// Require a configured credential
pub(crate) fn required<'a>(
    upstream: &'static str,
    value: &'a Option<String>,
) -> Result<&'a str, GatewayError> {
    value
        .as_deref()
        .ok_or(GatewayError::MissingCredentials(upstream))
}
