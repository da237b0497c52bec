//! MusicBrainz search provider
//!
//! Queries the MusicBrainz WS/2 JSON API for artists and release groups.
//! MusicBrainz enforces one request per second per client; requests go
//! through a shared rate limiter. Cover URLs point at the Cover Art
//! Archive, which serves release-group front covers without a lookup.

use crate::SearchError;
use aria_core::plugin::{AlbumSearchEnginePlugin, ArtistSearchEnginePlugin, Plugin};
use aria_core::types::{AlbumSearchResult, ArtistSearchResult, PagedRequest, PagedResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

pub const MUSICBRAINZ_PLUGIN_ID: &str = "musicbrainz";

const DEFAULT_BASE_URL: &str = "https://musicbrainz.org/ws/2";
const COVER_ART_BASE_URL: &str = "https://coverartarchive.org";
const USER_AGENT: &str = "Aria/0.1.0 (https://github.com/aria-media/aria)";
const RATE_LIMIT_MS: u64 = 1000; // 1 request per second
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Enforces the provider's minimum interval between requests
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    async fn wait(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[derive(Debug, Deserialize)]
struct ArtistSearchResponse {
    #[serde(default)]
    artists: Vec<MbArtist>,
}

#[derive(Debug, Deserialize)]
struct MbArtist {
    id: String,
    name: String,
    #[serde(rename = "sort-name")]
    sort_name: Option<String>,
    #[serde(default)]
    score: i32,
}

#[derive(Debug, Deserialize)]
struct ReleaseGroupSearchResponse {
    #[serde(rename = "release-groups", default)]
    release_groups: Vec<MbReleaseGroup>,
}

#[derive(Debug, Deserialize)]
struct MbReleaseGroup {
    id: String,
    title: String,
    #[serde(rename = "first-release-date")]
    first_release_date: Option<String>,
    #[serde(rename = "artist-credit", default)]
    artist_credit: Vec<MbArtistCredit>,
    #[serde(default)]
    score: i32,
}

#[derive(Debug, Deserialize)]
struct MbArtistCredit {
    name: String,
}

fn artist_results(response: ArtistSearchResponse) -> Vec<ArtistSearchResult> {
    response
        .artists
        .into_iter()
        .map(|artist| ArtistSearchResult {
            from_plugin: MUSICBRAINZ_PLUGIN_ID.to_string(),
            rank: artist.score,
            name: artist.name,
            sort_name: artist.sort_name,
            musicbrainz_id: Some(artist.id),
            itunes_id: None,
            audiodb_id: None,
            image_urls: Vec::new(),
        })
        .collect()
}

fn album_results(response: ReleaseGroupSearchResponse) -> Vec<AlbumSearchResult> {
    response
        .release_groups
        .into_iter()
        .map(|group| {
            let year = group
                .first_release_date
                .as_deref()
                .and_then(|d| d.get(..4))
                .and_then(|y| y.parse().ok());
            let cover_url = format!("{COVER_ART_BASE_URL}/release-group/{}/front", group.id);
            AlbumSearchResult {
                from_plugin: MUSICBRAINZ_PLUGIN_ID.to_string(),
                rank: group.score,
                title: group.title,
                artist: group.artist_credit.into_iter().next().map(|c| c.name),
                year,
                musicbrainz_id: Some(group.id),
                itunes_id: None,
                cover_url: Some(cover_url),
            }
        })
        .collect()
}

/// MusicBrainz-backed artist and album search plugin
pub struct MusicBrainzSearchPlugin {
    http: reqwest::Client,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl MusicBrainzSearchPlugin {
    pub fn new() -> crate::Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Client against a non-default endpoint, e.g. a mirror
    pub fn with_base_url(base_url: impl Into<String>) -> crate::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SearchError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            rate_limiter: RateLimiter::new(RATE_LIMIT_MS),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        cancel: &CancellationToken,
    ) -> crate::Result<T> {
        self.rate_limiter.wait().await;

        let url = format!("{}/{path}", self.base_url);
        tracing::debug!("Querying MusicBrainz: {url}");
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

impl Plugin for MusicBrainzSearchPlugin {
    fn id(&self) -> &str {
        MUSICBRAINZ_PLUGIN_ID
    }

    fn display_name(&self) -> &str {
        "MusicBrainz"
    }
}

#[async_trait]
impl ArtistSearchEnginePlugin for MusicBrainzSearchPlugin {
    async fn do_artist_search(
        &self,
        query: &str,
        max_results: usize,
        cancel: &CancellationToken,
    ) -> PagedResult<ArtistSearchResult> {
        let params = [
            ("query", query.to_string()),
            ("limit", max_results.to_string()),
            ("fmt", "json".to_string()),
        ];
        match self
            .get_json::<ArtistSearchResponse>("artist", &params, cancel)
            .await
        {
            Ok(response) => {
                let items = artist_results(response);
                let total = items.len();
                PagedResult::ok(items, total, &PagedRequest::take_only(max_results))
            }
            Err(e) => PagedResult::error(format!("musicbrainz artist search failed: {e}")),
        }
    }
}

#[async_trait]
impl AlbumSearchEnginePlugin for MusicBrainzSearchPlugin {
    async fn do_album_search(
        &self,
        query: &str,
        max_results: usize,
        cancel: &CancellationToken,
    ) -> PagedResult<AlbumSearchResult> {
        let params = [
            ("query", query.to_string()),
            ("limit", max_results.to_string()),
            ("fmt", "json".to_string()),
        ];
        match self
            .get_json::<ReleaseGroupSearchResponse>("release-group", &params, cancel)
            .await
        {
            Ok(response) => {
                let items = album_results(response);
                let total = items.len();
                PagedResult::ok(items, total, &PagedRequest::take_only(max_results))
            }
            Err(e) => PagedResult::error(format!("musicbrainz album search failed: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTIST_JSON: &str = r#"{
        "created": "2026-01-01T00:00:00.000Z",
        "count": 2,
        "offset": 0,
        "artists": [
            {
                "id": "f6f2326f-6b25-4170-b89d-e235b25508e8",
                "score": 100,
                "name": "The Future Sound of London",
                "sort-name": "Future Sound of London, The"
            },
            {
                "id": "8f6bd1e4-fbe1-4f50-aa9b-94c450ec0f11",
                "score": 62,
                "name": "Future Sound"
            }
        ]
    }"#;

    const RELEASE_GROUP_JSON: &str = r#"{
        "release-groups": [
            {
                "id": "3f1c7f45-e4b8-3f8e-9d4c-2f7e1d5a9b01",
                "score": 100,
                "title": "Dead Cities",
                "first-release-date": "1996-10-28",
                "artist-credit": [
                    { "name": "The Future Sound of London" }
                ]
            }
        ]
    }"#;

    #[test]
    fn artist_response_maps_to_results() {
        let response: ArtistSearchResponse = serde_json::from_str(ARTIST_JSON).unwrap();
        let results = artist_results(response);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "The Future Sound of London");
        assert_eq!(results[0].rank, 100);
        assert_eq!(
            results[0].sort_name.as_deref(),
            Some("Future Sound of London, The")
        );
        assert_eq!(
            results[0].musicbrainz_id.as_deref(),
            Some("f6f2326f-6b25-4170-b89d-e235b25508e8")
        );
        assert_eq!(results[0].from_plugin, MUSICBRAINZ_PLUGIN_ID);
        // sort-name is optional in the wire format
        assert_eq!(results[1].sort_name, None);
    }

    #[test]
    fn release_group_response_maps_to_results() {
        let response: ReleaseGroupSearchResponse =
            serde_json::from_str(RELEASE_GROUP_JSON).unwrap();
        let results = album_results(response);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Dead Cities");
        assert_eq!(results[0].year, Some(1996));
        assert_eq!(
            results[0].artist.as_deref(),
            Some("The Future Sound of London")
        );
        assert_eq!(
            results[0].cover_url.as_deref(),
            Some("https://coverartarchive.org/release-group/3f1c7f45-e4b8-3f8e-9d4c-2f7e1d5a9b01/front")
        );
    }

    #[test]
    fn empty_response_yields_no_results() {
        let response: ArtistSearchResponse = serde_json::from_str("{}").unwrap();
        assert!(artist_results(response).is_empty());
    }

    #[tokio::test]
    async fn rate_limiter_spaces_requests() {
        let limiter = RateLimiter::new(200);
        let start = Instant::now();
        limiter.wait().await;
        assert!(start.elapsed() < Duration::from_millis(100));
        limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(180));
    }
}
