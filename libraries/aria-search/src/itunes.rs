//! iTunes Search API provider
//!
//! Serves album cover images and artist top-songs lookups. The API
//! returns 100x100 artwork thumbnails; the path encodes the size, so the
//! URL is rewritten to a 600x600 variant before it is returned.

use crate::SearchError;
use aria_core::plugin::{AlbumImageSearchEnginePlugin, ArtistTopSongsSearchEnginePlugin, Plugin};
use aria_core::types::{ImageSearchResult, OperationResult, SongSearchResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const ITUNES_PLUGIN_ID: &str = "itunes";

const DEFAULT_BASE_URL: &str = "https://itunes.apple.com";
const ARTWORK_SIZE: u32 = 600;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ItunesResponse<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItunesAlbum {
    artwork_url_100: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItunesSong {
    track_name: Option<String>,
    artist_name: Option<String>,
    track_time_millis: Option<u64>,
}

/// Rewrite a 100x100 artwork URL to the requested square size
fn upscale_artwork(url: &str, size: u32) -> String {
    url.replace("100x100", &format!("{size}x{size}"))
}

fn image_results(response: ItunesResponse<ItunesAlbum>) -> Vec<ImageSearchResult> {
    let count = response.results.len();
    response
        .results
        .into_iter()
        .filter_map(|album| album.artwork_url_100)
        .enumerate()
        .map(|(i, url)| ImageSearchResult {
            from_plugin: ITUNES_PLUGIN_ID.to_string(),
            rank: (count - i) as i32,
            url: upscale_artwork(&url, ARTWORK_SIZE),
            width: Some(ARTWORK_SIZE),
            height: Some(ARTWORK_SIZE),
        })
        .collect()
}

fn song_results(response: ItunesResponse<ItunesSong>) -> Vec<SongSearchResult> {
    let count = response.results.len();
    response
        .results
        .into_iter()
        .enumerate()
        .filter_map(|(i, song)| {
            Some(SongSearchResult {
                from_plugin: ITUNES_PLUGIN_ID.to_string(),
                rank: (count - i) as i32,
                title: song.track_name?,
                artist: song.artist_name,
                duration_ms: song.track_time_millis,
            })
        })
        .collect()
}

/// iTunes-backed album cover and top-songs search plugin
pub struct ItunesSearchPlugin {
    http: reqwest::Client,
    base_url: String,
}

impl ItunesSearchPlugin {
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

    async fn search<T: DeserializeOwned>(
        &self,
        params: &[(&str, String)],
        cancel: &CancellationToken,
    ) -> crate::Result<ItunesResponse<T>> {
        let url = format!("{}/search", self.base_url);
        tracing::debug!("Querying iTunes: {url}");
        let request = self.http.get(&url).query(params).send();

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

impl Plugin for ItunesSearchPlugin {
    fn id(&self) -> &str {
        ITUNES_PLUGIN_ID
    }

    fn display_name(&self) -> &str {
        "iTunes"
    }
}

#[async_trait]
impl AlbumImageSearchEnginePlugin for ItunesSearchPlugin {
    async fn do_album_image_search(
        &self,
        query: &str,
        max_results: usize,
        cancel: &CancellationToken,
    ) -> OperationResult<Vec<ImageSearchResult>> {
        let params = [
            ("term", query.to_string()),
            ("entity", "album".to_string()),
            ("limit", max_results.to_string()),
        ];
        match self.search::<ItunesAlbum>(&params, cancel).await {
            Ok(response) => OperationResult::ok(image_results(response)),
            Err(e) => OperationResult::error(format!("itunes album image search failed: {e}")),
        }
    }
}

#[async_trait]
impl ArtistTopSongsSearchEnginePlugin for ItunesSearchPlugin {
    async fn do_artist_top_songs_search(
        &self,
        artist: &str,
        max_results: usize,
        cancel: &CancellationToken,
    ) -> OperationResult<Vec<SongSearchResult>> {
        let params = [
            ("term", artist.to_string()),
            ("entity", "song".to_string()),
            ("attribute", "artistTerm".to_string()),
            ("limit", max_results.to_string()),
        ];
        match self.search::<ItunesSong>(&params, cancel).await {
            Ok(response) => OperationResult::ok(song_results(response)),
            Err(e) => OperationResult::error(format!("itunes top songs search failed: {e}")),
        }
    }
}
