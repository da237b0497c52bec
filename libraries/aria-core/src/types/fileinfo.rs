//! Filesystem descriptor types
//!
//! These are immutable descriptors, never the filesystem object itself.
//! A `FileInfo` is only meaningful paired with the `DirectoryInfo` it was
//! discovered in; resolve it with [`FileInfo::full_name`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Identifier for a discovered directory, unique within one scan
pub type DirectoryId = usize;

/// Descriptor of a discovered directory with content tallies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryInfo {
    /// Synthetic id assigned during the scan
    pub id: DirectoryId,

    /// Synthetic back-reference to the parent directory in the same scan,
    /// `None` for the scan root
    pub parent_id: Option<DirectoryId>,

    /// Directory name (final path component)
    pub name: String,

    /// Absolute path of the directory
    pub path: PathBuf,

    /// Total number of files directly in this directory
    pub file_count: usize,

    /// Number of image files (jpg/png/gif/bmp/webp)
    pub image_count: usize,

    /// Number of media (audio) files
    pub media_count: usize,

    /// Number of metadata sidecar files (nfo/cue/sfv/m3u)
    pub metadata_count: usize,
}

impl DirectoryInfo {
    /// Whether the directory carries anything the pipeline can work with
    pub fn is_processable(&self) -> bool {
        self.media_count > 0 || self.metadata_count > 0
    }
}

/// Descriptor of a file inside a discovered directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    /// File name including extension
    pub name: String,

    /// File size in bytes
    pub size: u64,
}

impl FileInfo {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }

    /// Resolve this file against its directory context
    pub fn full_name(&self, directory: &DirectoryInfo) -> PathBuf {
        directory.path.join(&self.name)
    }

    /// Lowercased extension, if any
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir(path: &str) -> DirectoryInfo {
        DirectoryInfo {
            id: 0,
            parent_id: None,
            name: "album".to_string(),
            path: PathBuf::from(path),
            file_count: 0,
            image_count: 0,
            media_count: 0,
            metadata_count: 0,
        }
    }

    #[test]
    fn full_name_joins_directory_and_file() {
        let d = dir("/music/inbound/album");
        let f = FileInfo::new("01 - intro.mp3", 1024);
        assert_eq!(
            f.full_name(&d),
            PathBuf::from("/music/inbound/album/01 - intro.mp3")
        );
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(
            FileInfo::new("cover.JPG", 0).extension(),
            Some("jpg".to_string())
        );
        assert_eq!(FileInfo::new("no-extension", 0).extension(), None);
    }

    #[test]
    fn processable_requires_media_or_metadata() {
        let mut d = dir("/music");
        assert!(!d.is_processable());
        d.metadata_count = 1;
        assert!(d.is_processable());
    }
}
