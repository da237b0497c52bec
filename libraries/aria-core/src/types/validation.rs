//! Validation result types

use super::album::AlbumStatus;
use serde::{Deserialize, Serialize};

/// Severity of a validation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// "Needs attention" reasons computed by the validation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttentionReason {
    MissingAlbumTag,
    MissingAlbumArtistTag,
    MissingYearTag,
    MultipleAlbumTags,
    NoTags,
    NoSongs,
    TrackCountMismatch,
    DuplicateTrackNumbers,
    MissingSongTitles,
}

/// One human-readable validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResultMessage {
    pub message: String,
    pub severity: Severity,
    pub sort_order: i32,
}

/// Output of the validation engine, consumed by the orchestrator to set
/// the album status; never stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Whether the album is storable as-is
    pub is_valid: bool,

    /// The status the album should take
    pub album_status: AlbumStatus,

    /// Reasons the album needs attention, empty when valid
    pub reasons: Vec<AttentionReason>,

    /// Findings, ordered by `sort_order`
    pub messages: Vec<ValidationResultMessage>,
}

impl ValidationResult {
    /// A passing result with no findings
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            album_status: AlbumStatus::Ok,
            reasons: Vec::new(),
            messages: Vec::new(),
        }
    }
}
