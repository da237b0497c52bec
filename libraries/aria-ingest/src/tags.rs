//! Metadata-tag processor plugins
//!
//! The tag chain runs per media file. Each plugin receives the
//! accumulated tag set and returns a new set; previously accumulated
//! tags are never lost by a well-behaved plugin. Filesystem writes are
//! out of contract here.

use aria_core::plugin::{MetaTagsProcessorPlugin, Plugin};
use aria_core::types::{DirectoryInfo, FileInfo, MetaTag, MetaTagIdentifier, OperationResult};
use async_trait::async_trait;
use lofty::{Accessor, TaggedFileExt};
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Plugin id recorded on albums assembled from embedded tags
pub const EMBEDDED_TAGS_PLUGIN_ID: &str = "embedded-tags";

/// Identifiers that describe one song rather than the whole album
pub const SONG_LEVEL_IDENTIFIERS: &[MetaTagIdentifier] = &[
    MetaTagIdentifier::Title,
    MetaTagIdentifier::TrackNumber,
    MetaTagIdentifier::Artist,
    MetaTagIdentifier::Isrc,
    MetaTagIdentifier::SubTitle,
];

/// Read embedded tags from a media file via lofty
pub fn read_embedded_tags(path: &Path) -> aria_core::Result<Vec<MetaTag>> {
    let tagged_file = lofty::read_from_path(path)
        .map_err(|e| aria_core::AriaError::parse(format!("{}: {e}", path.display())))?;

    let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.tags().first()) else {
        return Ok(Vec::new());
    };

    let mut tags = Vec::new();
    for item in tag.items() {
        let identifier = match item.key() {
            lofty::ItemKey::TrackTitle => MetaTagIdentifier::Title,
            lofty::ItemKey::TrackArtist => MetaTagIdentifier::Artist,
            lofty::ItemKey::AlbumTitle => MetaTagIdentifier::Album,
            lofty::ItemKey::AlbumArtist => MetaTagIdentifier::AlbumArtist,
            lofty::ItemKey::Genre => MetaTagIdentifier::Genre,
            lofty::ItemKey::Year | lofty::ItemKey::RecordingDate => {
                MetaTagIdentifier::OrigAlbumYear
            }
            lofty::ItemKey::TrackNumber => MetaTagIdentifier::TrackNumber,
            lofty::ItemKey::TrackTotal => MetaTagIdentifier::TrackTotal,
            lofty::ItemKey::DiscNumber => MetaTagIdentifier::DiscNumber,
            lofty::ItemKey::DiscTotal => MetaTagIdentifier::DiscTotal,
            lofty::ItemKey::Comment => MetaTagIdentifier::Comment,
            _ => continue,
        };
        if let Some(text) = item.value().text() {
            tags.push(MetaTag::new(identifier, text));
        }
    }

    // some formats only answer through the accessor API
    if tags
        .iter()
        .all(|t| t.identifier != MetaTagIdentifier::Title)
    {
        if let Some(title) = tag.title() {
            tags.push(MetaTag::new(MetaTagIdentifier::Title, title.as_ref()));
        }
    }

    Ok(tags)
}

/// Tag processor that merges a file's embedded tags into the
/// accumulated set. Accumulated tags win; only identifiers not yet
/// present are added.
pub struct EmbeddedTagsPlugin;

impl Plugin for EmbeddedTagsPlugin {
    fn id(&self) -> &str {
        EMBEDDED_TAGS_PLUGIN_ID
    }

    fn display_name(&self) -> &str {
        "Embedded Tag Reader"
    }

    fn sort_order(&self) -> i32 {
        10
    }
}

#[async_trait]
impl MetaTagsProcessorPlugin for EmbeddedTagsPlugin {
    async fn process_meta_tags(
        &self,
        directory: &DirectoryInfo,
        file: &FileInfo,
        mut tags: Vec<MetaTag>,
        _cancel: &CancellationToken,
    ) -> OperationResult<Vec<MetaTag>> {
        let path = file.full_name(directory);
        match read_embedded_tags(&path) {
            Ok(embedded) => {
                for tag in embedded {
                    if tags.iter().all(|t| t.identifier != tag.identifier) {
                        tags.push(tag);
                    }
                }
                OperationResult::ok(tags)
            }
            Err(e) => {
                // unreadable tags downgrade to a skipped file, not a failure
                tracing::warn!("Could not read embedded tags from {}: {e}", file.name);
                OperationResult::ok(tags)
            }
        }
    }
}

/// Tag cleanup pass: trims whitespace, collapses runs of spaces, drops
/// empty values, and title-cases bare ALL-CAPS artist/album values.
pub struct TagNormalizerPlugin;

impl Plugin for TagNormalizerPlugin {
    fn id(&self) -> &str {
        "tag-normalizer"
    }

    fn display_name(&self) -> &str {
        "Tag Normalizer"
    }

    fn sort_order(&self) -> i32 {
        20
    }
}

#[async_trait]
impl MetaTagsProcessorPlugin for TagNormalizerPlugin {
    async fn process_meta_tags(
        &self,
        _directory: &DirectoryInfo,
        _file: &FileInfo,
        tags: Vec<MetaTag>,
        _cancel: &CancellationToken,
    ) -> OperationResult<Vec<MetaTag>> {
        let normalized = tags
            .into_iter()
            .filter_map(|mut tag| {
                let mut value = collapse_whitespace(tag.value.trim());
                if value.is_empty() {
                    return None;
                }
                if should_title_case(tag.identifier) && is_all_caps(&value) {
                    value = title_case(&value);
                }
                tag.value = value;
                Some(tag)
            })
            .collect();
        OperationResult::ok(normalized)
    }
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn should_title_case(identifier: MetaTagIdentifier) -> bool {
    matches!(
        identifier,
        MetaTagIdentifier::Artist
            | MetaTagIdentifier::AlbumArtist
            | MetaTagIdentifier::Album
            | MetaTagIdentifier::Title
    )
}

fn is_all_caps(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_uppercase())
        && !value.chars().any(|c| c.is_ascii_lowercase())
}

fn title_case(value: &str) -> String {
    value
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
