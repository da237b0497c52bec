//! Normalized search result types
//!
//! Provider-agnostic records returned by the search-engine aggregation
//! layer. Each carries the id of the plugin that produced it and a rank
//! (higher = preferred); merge ordering is left to the caller. Provider
//! specific identifiers are optional fields, absent when a provider does
//! not know them.

use serde::{Deserialize, Serialize};

/// One artist candidate from a search provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistSearchResult {
    /// Id of the plugin that produced this result
    pub from_plugin: String,

    /// Provider-assigned preference, higher is preferred
    pub rank: i32,

    /// Artist display name
    pub name: String,

    /// Name used for alphabetical sorting
    pub sort_name: Option<String>,

    /// MusicBrainz artist id
    pub musicbrainz_id: Option<String>,

    /// iTunes artist id
    pub itunes_id: Option<u64>,

    /// TheAudioDB artist id
    pub audiodb_id: Option<String>,

    /// Candidate artist image URLs
    pub image_urls: Vec<String>,
}

/// One album candidate from a search provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumSearchResult {
    /// Id of the plugin that produced this result
    pub from_plugin: String,

    /// Provider-assigned preference, higher is preferred
    pub rank: i32,

    /// Album title
    pub title: String,

    /// Credited artist name
    pub artist: Option<String>,

    /// Release year
    pub year: Option<i32>,

    /// MusicBrainz release id
    pub musicbrainz_id: Option<String>,

    /// iTunes collection id
    pub itunes_id: Option<u64>,

    /// Cover art URL
    pub cover_url: Option<String>,
}

/// One image candidate from a search provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSearchResult {
    /// Id of the plugin that produced this result
    pub from_plugin: String,

    /// Provider-assigned preference, higher is preferred
    pub rank: i32,

    /// Image URL
    pub url: String,

    /// Pixel width, if the provider reports it
    pub width: Option<u32>,

    /// Pixel height, if the provider reports it
    pub height: Option<u32>,
}

/// One song candidate from a search provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongSearchResult {
    /// Id of the plugin that produced this result
    pub from_plugin: String,

    /// Provider-assigned preference, higher is preferred
    pub rank: i32,

    /// Song title
    pub title: String,

    /// Credited artist name
    pub artist: Option<String>,

    /// Duration in milliseconds
    pub duration_ms: Option<u64>,
}
