//! Song types

use super::meta_tag::{find_tag, MetaTag, MetaTagIdentifier};
use super::FileInfo;
use serde::{Deserialize, Serialize};

/// One song inside an album
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    /// The media file carrying this song. For CUE-split releases several
    /// songs share the same file; songs assembled from an NFO track list
    /// may not have a resolved file yet.
    pub file: Option<FileInfo>,

    /// Song-level tags (Title, TrackNumber, Artist, ...)
    pub tags: Vec<MetaTag>,
}

impl Song {
    pub fn new(file: Option<FileInfo>, tags: Vec<MetaTag>) -> Self {
        Self { file, tags }
    }

    /// Song title, if tagged
    pub fn title(&self) -> Option<&str> {
        find_tag(&self.tags, MetaTagIdentifier::Title).map(|t| t.value.as_str())
    }

    /// Track number, if tagged with a parseable value
    pub fn track_number(&self) -> Option<i32> {
        find_tag(&self.tags, MetaTagIdentifier::TrackNumber).and_then(MetaTag::value_as_i32)
    }
}
