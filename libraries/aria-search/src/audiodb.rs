//! TheAudioDB search provider
//!
//! Serves artist image lookups. The API answers with `null` instead of
//! an empty array when nothing matches, and uses empty strings for
//! absent image slots; both are normalized away here.

use crate::SearchError;
use aria_core::plugin::{ArtistImageSearchEnginePlugin, Plugin};
use aria_core::types::{ImageSearchResult, OperationResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const AUDIODB_PLUGIN_ID: &str = "audiodb";

const DEFAULT_BASE_URL: &str = "https://www.theaudiodb.com/api/v1/json/2";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ArtistResponse {
    artists: Option<Vec<AudioDbArtist>>,
}

#[derive(Debug, Deserialize)]
struct AudioDbArtist {
    #[serde(rename = "strArtistThumb")]
    thumb: Option<String>,
    #[serde(rename = "strArtistFanart")]
    fanart: Option<String>,
    #[serde(rename = "strArtistFanart2")]
    fanart2: Option<String>,
    #[serde(rename = "strArtistFanart3")]
    fanart3: Option<String>,
}

fn image_results(response: ArtistResponse) -> Vec<ImageSearchResult> {
    let Some(artists) = response.artists else {
        return Vec::new();
    };

    let mut results = Vec::new();
    for artist in artists {
        let urls = [artist.thumb, artist.fanart, artist.fanart2, artist.fanart3];
        for url in urls.into_iter().flatten() {
            if url.is_empty() {
                continue;
            }
            results.push(ImageSearchResult {
                from_plugin: AUDIODB_PLUGIN_ID.to_string(),
                rank: 0,
                url,
                width: None,
                height: None,
            });
        }
    }
    // earlier slots are the better images
    let count = results.len() as i32;
    for (i, result) in results.iter_mut().enumerate() {
        result.rank = count - i as i32;
    }
    results
}

/// TheAudioDB-backed artist image search plugin
pub struct AudioDbSearchPlugin {
    http: reqwest::Client,
    base_url: String,
}

impl AudioDbSearchPlugin {
    pub fn new() -> crate::Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> crate::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SearchError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    async fn search_artist(
        &self,
        artist: &str,
        cancel: &CancellationToken,
    ) -> crate::Result<ArtistResponse> {
        let url = format!("{}/search.php", self.base_url);
        tracing::debug!("Querying TheAudioDB: {url}");
        let request = self.http.get(&url).query(&[("s", artist)]).send();

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(SearchError::Cancelled),
            response = request => response.map_err(|e| SearchError::Network(e.to_string()))?,
        };

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))
    }
}

impl Plugin for AudioDbSearchPlugin {
    fn id(&self) -> &str {
        AUDIODB_PLUGIN_ID
    }

    fn display_name(&self) -> &str {
        "TheAudioDB"
    }
}

#[async_trait]
impl ArtistImageSearchEnginePlugin for AudioDbSearchPlugin {
    async fn do_artist_image_search(
        &self,
        query: &str,
        max_results: usize,
        cancel: &CancellationToken,
    ) -> OperationResult<Vec<ImageSearchResult>> {
        match self.search_artist(query, cancel).await {
            Ok(response) => {
                let mut results = image_results(response);
                results.truncate(max_results);
                OperationResult::ok(results)
            }
            Err(e) => OperationResult::error(format!("audiodb artist image search failed: {e}")),
        }
    }
}
