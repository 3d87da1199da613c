//! Bangumi (anime)
//!
//! Uses the v0 subject search restricted to subject type 2 (anime). The
//! access token is optional; anonymous searches are accepted upstream.

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use tlm_common::media::https_url;
use tlm_common::Candidate;

use super::fetch_json;
use crate::error::GatewayError;

pub const UPSTREAM: &str = "Bangumi";

pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 50;

const SUBJECT_TYPE_ANIME: u8 = 2;

#[derive(Clone)]
pub struct BangumiSource {
    access_token: Option<String>,
    base_url: String,
}

impl std::fmt::Debug for BangumiSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BangumiSource")
            .field("authenticated", &self.access_token.is_some())
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    data: Vec<Subject>,
}

#[derive(Debug, Deserialize)]
struct Subject {
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    name_cn: String,
    #[serde(default)]
    images: Option<Images>,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    rating: Option<Rating>,
}

#[derive(Debug, Deserialize)]
struct Images {
    #[serde(default)]
    large: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Rating {
    #[serde(default)]
    score: f64,
}

impl BangumiSource {
    pub fn new(access_token: Option<String>, base_url: &str) -> Self {
        Self {
            access_token,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn search(
        &self,
        client: &Client,
        query: &str,
        page_size: Option<u32>,
    ) -> Result<Vec<Candidate>, GatewayError> {
        let limit = page_size.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

        let mut request = client
            .post(format!("{}/v0/search/subjects", self.base_url))
            .query(&[("limit", limit)])
            .json(&json!({
                "keyword": query,
                "filter": {"type": [SUBJECT_TYPE_ANIME]}
            }));
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let page: SearchPage = fetch_json(UPSTREAM, request).await?;
        debug!(results = page.data.len(), "Bangumi search returned");
        Ok(page.data.into_iter().map(reshape).collect())
    }
}

fn reshape(subject: Subject) -> Candidate {
    let title = if subject.name_cn.is_empty() {
        subject.name
    } else {
        subject.name_cn
    };

    let mut candidate = Candidate::new(subject.id.to_string(), title);
    candidate.cover = subject
        .images
        .and_then(|i| i.large)
        .filter(|u| !u.is_empty())
        .map(|u| https_url(&u));
    candidate.description = subject.summary;
    candidate.rating = subject.rating.map_or(0.0, |r| r.score);
    candidate
}
