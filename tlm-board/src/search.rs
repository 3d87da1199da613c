//! Gateway search client and candidate selection

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info};

use tlm_common::media::https_url;
use tlm_common::{Candidate, ErrorResponse, MediaType, SearchRequest};

use crate::controller::BoardController;
use crate::error::{BoardError, SearchError};
use crate::model::{BucketKey, Item};
use crate::patch::Patch;
use crate::render::PLACEHOLDER_COVER;
use crate::storage::Storage;

/// Default gateway location
pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:3000";

/// Page size requested from the gateway
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;

const USER_AGENT: &str = concat!("tlm-board/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the search gateway
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SearchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SearchError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Search one media type through the gateway
    ///
    /// Blank queries are rejected without sending anything.
    pub async fn search(
        &self,
        media: MediaType,
        query: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Candidate>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        let mut body = SearchRequest::new(query);
        match media {
            MediaType::Books => body.max_results = Some(limit),
            MediaType::Anime => body.limit = Some(limit),
            MediaType::Games | MediaType::Music => {}
        }

        let url = format!("{}/search/{}", self.base_url, media);
        debug!(%url, query, "Searching gateway");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("error").to_string());
            return Err(SearchError::Gateway {
                status: status.as_u16(),
                message,
            });
        }

        let candidates: Vec<Candidate> = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        info!(media = %media, query, results = candidates.len(), "Search completed");
        Ok(candidates)
    }
}

/// Item for a chosen search result
pub fn candidate_to_item(media: MediaType, candidate: &Candidate) -> Item {
    let src = candidate
        .cover
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(https_url)
        .unwrap_or_else(|| PLACEHOLDER_COVER.to_string());

    Item {
        id: format!(
            "{}_{}_{}",
            media.id_prefix(),
            candidate.id,
            chrono::Utc::now().timestamp_millis()
        ),
        src,
        name: candidate.title.clone(),
        summary: Some(candidate.description.clone()),
        rating: Some(candidate.rating),
    }
}

/// Put a chosen search result at the front of `bucket`
pub fn select_candidate<S: Storage>(
    controller: &mut BoardController<S>,
    bucket: &BucketKey,
    media: MediaType,
    candidate: &Candidate,
) -> Result<Vec<Patch>, BoardError> {
    if !controller.board().has_bucket(bucket) {
        return Err(BoardError::UnknownBucket(bucket.to_string()));
    }
    let mut item = candidate_to_item(media, candidate);
    item.id = controller.board().fresh_item_id(&item.id);
    info!(item_id = %item.id, bucket = %bucket, "Search result added");
    Ok(controller.add_item(bucket, item))
}
