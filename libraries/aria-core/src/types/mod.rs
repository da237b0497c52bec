//! Core data model types

mod album;
mod fileinfo;
mod meta_tag;
mod results;
mod search;
mod song;
mod validation;

pub use album::{Album, AlbumStatus};
pub use fileinfo::{DirectoryInfo, FileInfo};
pub use meta_tag::{count_tags, find_tag, MetaTag, MetaTagIdentifier, StyleClass};
pub use results::{OperationResult, PagedRequest, PagedResult};
pub use search::{AlbumSearchResult, ArtistSearchResult, ImageSearchResult, SongSearchResult};
pub use song::Song;
pub use validation::{
    AttentionReason, Severity, ValidationResult, ValidationResultMessage,
};
