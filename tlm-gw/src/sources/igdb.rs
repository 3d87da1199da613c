//! IGDB (games)
//!
//! IGDB needs a Twitch client-credentials token. A fresh token is fetched
//! for every search and never cached.

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use tlm_common::media::https_url;
use tlm_common::Candidate;

use super::{fetch_json, required};
use crate::error::GatewayError;

pub const UPSTREAM: &str = "IGDB";

pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 500;

#[derive(Clone)]
pub struct IgdbSource {
    client_id: Option<String>,
    client_secret: Option<String>,
    token_url: String,
    base_url: String,
}

impl std::fmt::Debug for IgdbSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IgdbSource")
            .field("configured", &(self.client_id.is_some() && self.client_secret.is_some()))
            .field("token_url", &self.token_url)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct IgdbGame {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    cover: Option<IgdbCover>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    rating: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct IgdbCover {
    #[serde(default)]
    url: Option<String>,
}

impl IgdbSource {
    pub fn new(
        client_id: Option<String>,
        client_secret: Option<String>,
        token_url: &str,
        base_url: &str,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            token_url: token_url.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn search(
        &self,
        client: &Client,
        query: &str,
        page_size: Option<u32>,
    ) -> Result<Vec<Candidate>, GatewayError> {
        let client_id = required(UPSTREAM, &self.client_id)?;
        let client_secret = required(UPSTREAM, &self.client_secret)?;

        let token: TokenResponse = fetch_json(
            UPSTREAM,
            client.post(&self.token_url).form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("grant_type", "client_credentials"),
            ]),
        )
        .await?;
        debug!("IGDB access token obtained");

        let limit = page_size.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let games: Vec<IgdbGame> = fetch_json(
            UPSTREAM,
            client
                .post(format!("{}/games", self.base_url))
                .header("Client-ID", client_id)
                .bearer_auth(&token.access_token)
                .header(reqwest::header::ACCEPT, "application/json")
                .header(reqwest::header::CONTENT_TYPE, "text/plain")
                .body(search_query(query, limit)),
        )
        .await?;

        debug!(results = games.len(), "IGDB search returned");
        Ok(games.into_iter().filter_map(reshape).collect())
    }
}

/// Apicalypse query for a title search
pub fn search_query(query: &str, limit: u32) -> String {
    let escaped = query.replace('\\', "\\\\").replace('"', "\\\"");
    format!(
        "search \"{}\"; fields name,cover.url,summary,rating; limit {};",
        escaped, limit
    )
}

/// Games without a name or cover are dropped
fn reshape(game: IgdbGame) -> Option<Candidate> {
    let name = game.name.filter(|n| !n.is_empty())?;
    let cover = game.cover.and_then(|c| c.url).filter(|u| !u.is_empty())?;

    let mut candidate = Candidate::new(game.id.to_string(), name);
    candidate.cover = Some(https_url(&cover.replace("t_thumb", "t_cover_big")));
    candidate.description = game.summary.unwrap_or_default();
    candidate.rating = game.rating.unwrap_or(0.0);
    Some(candidate)
}
