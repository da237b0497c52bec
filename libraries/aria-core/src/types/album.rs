//! Album aggregate
//!
//! The `Album` is the core aggregate produced by the pipeline: created by
//! a format parser or the tag-processor chain, mutated in place by each
//! subsequent plugin stage, and never mutated after the orchestrator
//! returns it to the caller.

use super::meta_tag::{count_tags, find_tag, MetaTag, MetaTagIdentifier};
use super::{DirectoryInfo, FileInfo, Song};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an album
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlbumStatus {
    /// Assembled but not yet validated
    #[default]
    New,

    /// Validated and ready for storage
    Ok,

    /// Validation failed; needs attention before storage
    Invalid,
}

/// One discovered release: tags, songs, images, status, provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    /// Lifecycle status, set by the validation stage
    pub status: AlbumStatus,

    /// Ids of the plugins that contributed to this album
    pub via_plugins: Vec<String>,

    /// Album-level tags
    pub tags: Vec<MetaTag>,

    /// Songs in track order as assembled
    pub songs: Vec<Song>,

    /// Image files associated with the album
    pub images: Vec<FileInfo>,

    /// The directory this album was assembled from
    pub original_directory: DirectoryInfo,
}

impl Album {
    /// Create an unvalidated album for a directory
    pub fn new(original_directory: DirectoryInfo) -> Self {
        Self {
            status: AlbumStatus::New,
            via_plugins: Vec::new(),
            tags: Vec::new(),
            songs: Vec::new(),
            images: Vec::new(),
            original_directory,
        }
    }

    /// Value of the first tag with the given identifier
    pub fn tag_value(&self, identifier: MetaTagIdentifier) -> Option<&str> {
        find_tag(&self.tags, identifier).map(|t| t.value.as_str())
    }

    /// Number of tags with the given identifier
    pub fn tag_count(&self, identifier: MetaTagIdentifier) -> usize {
        count_tags(&self.tags, identifier)
    }

    /// Add a tag, keeping any existing tags of the same identifier
    pub fn add_tag(&mut self, tag: MetaTag) {
        self.tags.push(tag);
    }

    /// Replace all tags of the identifier with a single value
    pub fn set_tag(&mut self, identifier: MetaTagIdentifier, value: impl Into<String>) {
        self.tags.retain(|t| t.identifier != identifier);
        self.tags.push(MetaTag::new(identifier, value));
    }

    /// Record that a plugin contributed to this album
    pub fn add_via_plugin(&mut self, plugin_id: impl Into<String>) {
        let id = plugin_id.into();
        if !self.via_plugins.contains(&id) {
            self.via_plugins.push(id);
        }
    }
}
