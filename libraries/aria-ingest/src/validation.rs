//! Album validation and status computation
//!
//! A pure function over an assembled album: no I/O, no clock reads, so
//! validating the same album value twice yields identical results.

use aria_core::plugin::{Plugin, ValidationPlugin};
use aria_core::types::{
    Album, AlbumStatus, AttentionReason, MetaTagIdentifier, Severity, ValidationResult,
    ValidationResultMessage,
};
use std::collections::HashSet;

/// Plugin id of the standard validator
pub const ALBUM_VALIDATOR_ID: &str = "album-validator";

/// The standard album validator
pub struct AlbumValidator;

impl Plugin for AlbumValidator {
    fn id(&self) -> &str {
        ALBUM_VALIDATOR_ID
    }

    fn display_name(&self) -> &str {
        "Album Validator"
    }
}

impl ValidationPlugin for AlbumValidator {
    fn validate(&self, album: &Album) -> ValidationResult {
        validate_album(album)
    }
}

/// Compute status and needs-attention reasons for an album
pub fn validate_album(album: &Album) -> ValidationResult {
    let mut findings: Vec<(AttentionReason, Severity, String)> = Vec::new();

    if album.status == AlbumStatus::Invalid {
        // a parser already rejected this album; keep the rejection visible
        findings.push((
            AttentionReason::NoTags,
            Severity::Error,
            "album was marked invalid during assembly".to_string(),
        ));
    }

    if album.tags.is_empty() {
        findings.push((
            AttentionReason::NoTags,
            Severity::Error,
            "album has no tags".to_string(),
        ));
    } else {
        match album.tag_count(MetaTagIdentifier::Album) {
            0 => findings.push((
                AttentionReason::MissingAlbumTag,
                Severity::Error,
                "album title tag is missing".to_string(),
            )),
            1 => {}
            n => findings.push((
                AttentionReason::MultipleAlbumTags,
                Severity::Error,
                format!("album has {n} title tags, expected exactly one"),
            )),
        }

        if album.tag_count(MetaTagIdentifier::AlbumArtist) == 0 {
            findings.push((
                AttentionReason::MissingAlbumArtistTag,
                Severity::Warning,
                "album artist tag is missing".to_string(),
            ));
        }

        if album.tag_count(MetaTagIdentifier::OrigAlbumYear) == 0 {
            findings.push((
                AttentionReason::MissingYearTag,
                Severity::Warning,
                "original album year tag is missing".to_string(),
            ));
        }
    }

    if album.songs.is_empty() {
        findings.push((
            AttentionReason::NoSongs,
            Severity::Error,
            "album has no songs".to_string(),
        ));
    } else {
        if let Some(expected) = album
            .tag_value(MetaTagIdentifier::TrackTotal)
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            if expected != album.songs.len() {
                findings.push((
                    AttentionReason::TrackCountMismatch,
                    Severity::Warning,
                    format!(
                        "track total tag says {expected} but album has {} songs",
                        album.songs.len()
                    ),
                ));
            }
        }

        let mut seen = HashSet::new();
        let duplicated = album
            .songs
            .iter()
            .filter_map(|s| s.track_number())
            .any(|n| !seen.insert(n));
        if duplicated {
            findings.push((
                AttentionReason::DuplicateTrackNumbers,
                Severity::Error,
                "album has duplicate track numbers".to_string(),
            ));
        }

        if album.songs.iter().any(|s| s.title().is_none()) {
            findings.push((
                AttentionReason::MissingSongTitles,
                Severity::Warning,
                "one or more songs have no title".to_string(),
            ));
        }
    }

    let is_valid = findings.iter().all(|(_, severity, _)| *severity != Severity::Error);
    let album_status = if is_valid {
        AlbumStatus::Ok
    } else {
        AlbumStatus::Invalid
    };

    let reasons = findings.iter().map(|(reason, _, _)| *reason).collect();
    let messages = findings
        .into_iter()
        .enumerate()
        .map(|(i, (_, severity, message))| ValidationResultMessage {
            message,
            severity,
            sort_order: (i as i32 + 1) * 10,
        })
        .collect();

    ValidationResult {
        is_valid,
        album_status,
        reasons,
        messages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aria_core::types::{DirectoryInfo, MetaTag, Song};
    use std::path::PathBuf;

    fn test_dir() -> DirectoryInfo {
        DirectoryInfo {
            id: 0,
            parent_id: None,
            name: "release".to_string(),
            path: PathBuf::from("/tmp/release"),
            file_count: 0,
            image_count: 0,
            media_count: 0,
            metadata_count: 0,
        }
    }

    fn song(number: i32, title: &str) -> Song {
        Song::new(
            None,
            vec![
                MetaTag::new(MetaTagIdentifier::TrackNumber, number.to_string()),
                MetaTag::new(MetaTagIdentifier::Title, title),
            ],
        )
    }

    fn complete_album() -> Album {
        let mut album = Album::new(test_dir());
        album.add_tag(MetaTag::new(MetaTagIdentifier::Album, "Dead Cities"));
        album.add_tag(MetaTag::new(MetaTagIdentifier::AlbumArtist, "FSOL"));
        album.add_tag(MetaTag::new(MetaTagIdentifier::OrigAlbumYear, "1996"));
        album.songs.push(song(1, "Herd Killing"));
        album.songs.push(song(2, "Dead Cities"));
        album
    }

    #[test]
    fn complete_album_is_valid() {
        let result = validate_album(&complete_album());
        assert!(result.is_valid);
        assert_eq!(result.album_status, AlbumStatus::Ok);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn empty_album_is_invalid() {
        let album = Album::new(test_dir());
        let result = validate_album(&album);
        assert!(!result.is_valid);
        assert_eq!(result.album_status, AlbumStatus::Invalid);
        assert!(result.reasons.contains(&AttentionReason::NoTags));
        assert!(result.reasons.contains(&AttentionReason::NoSongs));
    }

    #[test]
    fn missing_year_is_attention_but_not_invalid() {
        let mut album = complete_album();
        album.tags.retain(|t| t.identifier != MetaTagIdentifier::OrigAlbumYear);
        let result = validate_album(&album);
        assert!(result.is_valid);
        assert!(result.reasons.contains(&AttentionReason::MissingYearTag));
    }

    #[test]
    fn duplicate_track_numbers_invalidate() {
        let mut album = complete_album();
        album.songs.push(song(2, "Duplicate"));
        let result = validate_album(&album);
        assert!(!result.is_valid);
        assert!(result.reasons.contains(&AttentionReason::DuplicateTrackNumbers));
    }

    #[test]
    fn track_total_mismatch_is_flagged() {
        let mut album = complete_album();
        album.add_tag(MetaTag::new(MetaTagIdentifier::TrackTotal, "5"));
        let result = validate_album(&album);
        assert!(result.reasons.contains(&AttentionReason::TrackCountMismatch));
    }

    #[test]
    fn multiple_album_tags_invalidate() {
        let mut album = complete_album();
        album.add_tag(MetaTag::new(MetaTagIdentifier::Album, "Another Title"));
        let result = validate_album(&album);
        assert!(!result.is_valid);
        assert!(result.reasons.contains(&AttentionReason::MultipleAlbumTags));
    }

    #[test]
    fn validation_is_deterministic() {
        let album = complete_album();
        let first = validate_album(&album);
        let second = validate_album(&album);
        assert_eq!(first, second);

        let mut broken = complete_album();
        broken.tags.clear();
        assert_eq!(validate_album(&broken), validate_album(&broken));
    }
}
