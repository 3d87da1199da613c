//! Search endpoint
//!
//! `POST /search/{media}` with a JSON body `{query, maxResults?, limit?}`.
//! The query is checked before the media type or any upstream, so a blank
//! query is always a 400.

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use tracing::{debug, info};

use tlm_common::{Candidate, MediaType, SearchRequest};

use crate::error::GatewayError;
use crate::AppState;

/// POST /search/:media_type
pub async fn search(
    State(state): State<AppState>,
    Path(media_type): Path<String>,
    body: Bytes,
) -> Result<Json<Vec<Candidate>>, GatewayError> {
    // Unparseable bodies are treated like a missing query.
    let request: SearchRequest = serde_json::from_slice(&body).unwrap_or_else(|e| {
        debug!("Ignoring malformed search body: {}", e);
        SearchRequest::default()
    });
    let query = request.search_text().ok_or(GatewayError::EmptyQuery)?;

    let media: MediaType = media_type
        .parse()
        .map_err(|_| GatewayError::UnsupportedMedia(media_type.clone()))?;

    let page_size = request.page_size();
    debug!(media = %media, query, ?page_size, "Search request");

    let candidates = state.registry.search(media, query, page_size).await?;
    info!(media = %media, query, results = candidates.len(), "Search served");
    Ok(Json(candidates))
}
