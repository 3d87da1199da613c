//! Google Books (books)

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use tlm_common::media::https_url;
use tlm_common::Candidate;

use super::{fetch_json, required};
use crate::error::GatewayError;

pub const UPSTREAM: &str = "Google Books";

pub const DEFAULT_MAX_RESULTS: u32 = 20;
/// Google Books refuses pages larger than this
pub const MAX_RESULTS: u32 = 40;

const LANG_RESTRICT: &str = "zh";

#[derive(Clone)]
pub struct GoogleBooksSource {
    api_key: Option<String>,
    base_url: String,
}

impl std::fmt::Debug for GoogleBooksSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleBooksSource")
            .field("configured", &self.api_key.is_some())
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct Volumes {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    id: String,
    #[serde(default)]
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    authors: Option<Vec<String>>,
    image_links: Option<ImageLinks>,
    description: Option<String>,
    published_date: Option<String>,
    average_rating: Option<f64>,
    page_count: Option<u64>,
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageLinks {
    thumbnail: Option<String>,
}

impl GoogleBooksSource {
    pub fn new(api_key: Option<String>, base_url: &str) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn search(
        &self,
        client: &Client,
        query: &str,
        page_size: Option<u32>,
    ) -> Result<Vec<Candidate>, GatewayError> {
        let api_key = required(UPSTREAM, &self.api_key)?;
        let max_results = page_size
            .unwrap_or(DEFAULT_MAX_RESULTS)
            .clamp(1, MAX_RESULTS)
            .to_string();

        let volumes: Volumes = fetch_json(
            UPSTREAM,
            client.get(format!("{}/volumes", self.base_url)).query(&[
                ("q", query),
                ("key", api_key),
                ("maxResults", max_results.as_str()),
                ("langRestrict", LANG_RESTRICT),
            ]),
        )
        .await?;

        debug!(results = volumes.items.len(), "Google Books search returned");
        Ok(volumes.items.into_iter().map(reshape).collect())
    }
}

fn reshape(volume: Volume) -> Candidate {
    let info = volume.volume_info;
    let title = info
        .title
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Unknown title".to_string());

    let mut candidate = Candidate::new(volume.id, title);
    candidate.cover = info
        .image_links
        .and_then(|links| links.thumbnail)
        .map(|url| https_url(&url));
    candidate.description = info.description.unwrap_or_default();
    candidate.rating = info.average_rating.unwrap_or(0.0);

    let authors = info
        .authors
        .filter(|a| !a.is_empty())
        .map(|a| a.join(", "))
        .unwrap_or_else(|| "Unknown author".to_string());
    candidate.extra.insert("authors".into(), json!(authors));
    candidate
        .extra
        .insert("publishedDate".into(), json!(info.published_date.unwrap_or_default()));
    candidate
        .extra
        .insert("pageCount".into(), json!(info.page_count.unwrap_or(0)));
    candidate.extra.insert(
        "language".into(),
        json!(info.language.unwrap_or_else(|| LANG_RESTRICT.to_string())),
    );
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reshape_full_volume() {
        let volume: Volume = serde_json::from_value(json!({
            "id": "abc123",
            "volumeInfo": {
                "title": "三体",
                "authors": ["刘慈欣", "Ken Liu"],
                "imageLinks": {"thumbnail": "http://books.google.com/books/content?id=abc123"},
                "description": "Sci-fi",
                "publishedDate": "2008-01",
                "averageRating": 4.5,
                "pageCount": 302,
                "language": "zh-CN"
            }
        }))
        .unwrap();

        let candidate = reshape(volume);
        assert_eq!(candidate.title, "三体");
        assert_eq!(
            candidate.cover.as_deref(),
            Some("https://books.google.com/books/content?id=abc123")
        );
        assert_eq!(candidate.rating, 4.5);
        assert_eq!(candidate.extra["authors"], "刘慈欣, Ken Liu");
        assert_eq!(candidate.extra["pageCount"], 302);
    }

    #[test]
    fn test_reshape_fills_defaults() {
        let volume: Volume = serde_json::from_value(json!({"id": "x"})).unwrap();
        let candidate = reshape(volume);
        assert_eq!(candidate.title, "Unknown title");
        assert_eq!(candidate.cover, None);
        assert_eq!(candidate.rating, 0.0);
        assert_eq!(candidate.extra["authors"], "Unknown author");
        assert_eq!(candidate.extra["language"], "zh");
    }

    #[test]
    fn test_empty_result_has_no_items_field() {
        let volumes: Volumes = serde_json::from_value(json!({"totalItems": 0})).unwrap();
        assert!(volumes.items.is_empty());
    }
}
