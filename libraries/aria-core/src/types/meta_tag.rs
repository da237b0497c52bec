//! Meta tag types
//!
//! A `MetaTag` is the canonical unit of extracted metadata. Identifiers
//! form a controlled vocabulary; many tags of different identifiers
//! compose one song or album. Uniqueness of certain identifiers (e.g.
//! exactly one Album tag) is a validation invariant, not enforced here.

use serde::{Deserialize, Serialize};

/// Controlled vocabulary of tag identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetaTagIdentifier {
    Album,
    AlbumArtist,
    Artist,
    Comment,
    DiscId,
    DiscNumber,
    DiscTotal,
    Genre,
    Isrc,
    OrigAlbumYear,
    SubTitle,
    Title,
    TrackNumber,
    TrackTotal,
}

/// Display styling hint attached to a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleClass {
    #[default]
    Normal,
    Warning,
}

/// A single extracted metadata value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaTag {
    /// What this tag describes
    pub identifier: MetaTagIdentifier,

    /// The extracted value, always carried as text
    pub value: String,

    /// Ordering hint for display (ascending)
    pub sort_order: i32,

    /// Display styling hint
    pub style_class: StyleClass,
}

impl MetaTag {
    /// Create a tag with default ordering and styling
    pub fn new(identifier: MetaTagIdentifier, value: impl Into<String>) -> Self {
        Self {
            identifier,
            value: value.into(),
            sort_order: 0,
            style_class: StyleClass::Normal,
        }
    }

    /// Set the sort order
    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }

    /// Parse the value as an integer, if it is one
    pub fn value_as_i32(&self) -> Option<i32> {
        self.value.trim().parse().ok()
    }
}

/// Find the first tag with the given identifier
pub fn find_tag(tags: &[MetaTag], identifier: MetaTagIdentifier) -> Option<&MetaTag> {
    tags.iter().find(|t| t.identifier == identifier)
}

/// Count tags with the given identifier
pub fn count_tags(tags: &[MetaTag], identifier: MetaTagIdentifier) -> usize {
    tags.iter().filter(|t| t.identifier == identifier).count()
}
