//! Search types shared by the board and the gateway
//!
//! The gateway reshapes every upstream payload into a list of [`Candidate`]s
//! so the board only ever sees one shape, whatever the media type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Error;

/// Kind of media a search targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Games,
    Books,
    Anime,
    Music,
}

impl MediaType {
    pub const ALL: [MediaType; 4] = [
        MediaType::Games,
        MediaType::Books,
        MediaType::Anime,
        MediaType::Music,
    ];

    /// Path segment used by the gateway (`/search/{segment}`)
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Games => "games",
            MediaType::Books => "books",
            MediaType::Anime => "anime",
            MediaType::Music => "music",
        }
    }

    /// Prefix for item ids created from a candidate of this media type
    pub fn id_prefix(&self) -> &'static str {
        match self {
            MediaType::Games => "igdb",
            MediaType::Books => "gbooks",
            MediaType::Anime => "bangumi",
            MediaType::Music => "music",
        }
    }

    /// Heading shown above a search result list
    pub fn search_title(&self) -> &'static str {
        match self {
            MediaType::Games => "Search games",
            MediaType::Books => "Search books",
            MediaType::Anime => "Search anime",
            MediaType::Music => "Search music",
        }
    }

    /// Message shown when a search returns nothing
    pub fn no_results_text(&self) -> &'static str {
        match self {
            MediaType::Games => "No matching games found",
            MediaType::Books => "No matching books found",
            MediaType::Anime => "No matching anime found",
            MediaType::Music => "No matching music found",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MediaType::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown media type: {}", s)))
    }
}

/// Search request body accepted by every `/search/*` endpoint
///
/// `maxResults` is what the books endpoint documents and `limit` what the
/// anime endpoint documents; either one sizes the result page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }

    /// Trimmed search text, `None` when missing or blank
    pub fn search_text(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }

    /// Requested page size, `limit` taking precedence over `maxResults`
    pub fn page_size(&self) -> Option<u32> {
        self.limit.or(self.max_results)
    }
}

/// One search hit in the uniform shape returned by the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub title: String,

    /// Absolute https URL of the cover image, if the upstream has one
    #[serde(default)]
    pub cover: Option<String>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub rating: f64,

    /// Source specific fields (authors, publishedDate, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Candidate {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            cover: None,
            description: String::new(),
            rating: 0.0,
            extra: Map::new(),
        }
    }
}

/// Force an image URL to absolute https
///
/// Upstreams hand out protocol-relative (`//host/..`) and plain http links.
pub fn https_url(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("//") {
        format!("https://{}", rest)
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("https://{}", rest)
    } else {
        url.to_string()
    }
}

/// Error body returned with every non-2xx gateway response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
