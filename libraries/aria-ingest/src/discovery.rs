//! Directory discovery
//!
//! Recursively enumerates sub-directories top-down, tallying image,
//! media, and metadata file counts per directory. The paging/filter
//! request applies per directory level, not globally, which bounds
//! fan-out on pathological trees. The result carries a synthetic
//! parent-id back-reference so callers can rebuild the hierarchy
//! without cyclic references.

use aria_core::types::{DirectoryInfo, PagedRequest, PagedResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Image file extensions
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Media (audio) file extensions
const MEDIA_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "ogg", "wav", "aac", "m4a", "mp4", "opus", "wma", "ape",
];

/// Metadata sidecar extensions
const METADATA_EXTENSIONS: &[&str] = &["nfo", "cue", "sfv", "m3u"];

/// Classify a file by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    Image,
    Media,
    Metadata,
    Other,
}

/// Classification used for the per-directory tallies
pub fn classify(path: &Path) -> FileClass {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return FileClass::Other;
    };
    let ext = ext.to_lowercase();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        FileClass::Image
    } else if MEDIA_EXTENSIONS.contains(&ext.as_str()) {
        FileClass::Media
    } else if METADATA_EXTENSIONS.contains(&ext.as_str()) {
        FileClass::Metadata
    } else {
        FileClass::Other
    }
}

/// Whether a file name is a recognized media file
pub fn is_media_file(path: &Path) -> bool {
    classify(path) == FileClass::Media
}

#[derive(Debug, Default, Clone, Copy)]
struct Counts {
    files: usize,
    images: usize,
    media: usize,
    metadata: usize,
}

/// Discoverer over an inbound root directory
pub struct DirectoryDiscoverer;

impl DirectoryDiscoverer {
    /// Enumerate `root` and its sub-directories with per-level paging.
    ///
    /// A missing root yields an error-typed result; unreadable subtrees
    /// are logged and skipped, never fatal.
    pub fn directory_infos(root: &Path, request: &PagedRequest) -> PagedResult<DirectoryInfo> {
        if !root.is_dir() {
            return PagedResult::error(format!("{} is not a directory", root.display()));
        }

        let mut children: HashMap<PathBuf, Vec<PathBuf>> = HashMap::new();
        let mut counts: HashMap<PathBuf, Counts> = HashMap::new();
        counts.insert(root.to_path_buf(), Counts::default());

        let walker = WalkDir::new(root).sort_by_file_name();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    // unreadable subtrees are never fatal
                    tracing::warn!("Skipping unreadable entry: {e}");
                    continue;
                }
            };
            let path = entry.path();
            if entry.file_type().is_dir() {
                counts.entry(path.to_path_buf()).or_default();
                if let Some(parent) = path.parent().filter(|_| entry.depth() > 0) {
                    children
                        .entry(parent.to_path_buf())
                        .or_default()
                        .push(path.to_path_buf());
                }
            } else if let Some(parent) = path.parent() {
                let tally = counts.entry(parent.to_path_buf()).or_default();
                tally.files += 1;
                match classify(path) {
                    FileClass::Image => tally.images += 1,
                    FileClass::Media => tally.media += 1,
                    FileClass::Metadata => tally.metadata += 1,
                    FileClass::Other => {}
                }
            }
        }

        // Depth-first from the root, applying filter/skip/take per level.
        // total_count tallies filter matches before skip/take.
        let mut items = Vec::new();
        let mut total_count = 1usize;
        let mut queue: Vec<(PathBuf, Option<usize>)> = vec![(root.to_path_buf(), None)];

        while let Some((path, parent_id)) = queue.pop() {
            let id = items.len();
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            let tally = counts.get(&path).copied().unwrap_or_default();

            items.push(DirectoryInfo {
                id,
                parent_id,
                name,
                path: path.clone(),
                file_count: tally.files,
                image_count: tally.images,
                media_count: tally.media,
                metadata_count: tally.metadata,
            });

            let mut visible: Vec<&PathBuf> = children
                .get(&path)
                .map(|c| c.iter().collect())
                .unwrap_or_default();
            visible.retain(|child| {
                request.name_filter.as_deref().map_or(true, |pattern| {
                    child
                        .file_name()
                        .and_then(|n| n.to_str())
                        .map(|n| wildcard_match(pattern, n))
                        .unwrap_or(false)
                })
            });
            total_count += visible.len();

            for child in visible
                .into_iter()
                .skip(request.skip)
                .take(request.take)
                .rev()
            {
                queue.push((child.clone(), Some(id)));
            }
        }

        PagedResult::ok(items, total_count, request)
    }
}

/// Minimal `*`/`?` wildcard match, case-insensitive
fn wildcard_match(pattern: &str, name: &str) -> bool {
    fn inner(p: &[char], n: &[char]) -> bool {
        match (p.first(), n.first()) {
            (None, None) => true,
            (Some('*'), _) => inner(&p[1..], n) || (!n.is_empty() && inner(p, &n[1..])),
            (Some('?'), Some(_)) => inner(&p[1..], &n[1..]),
            (Some(pc), Some(nc)) => pc == nc && inner(&p[1..], &n[1..]),
            _ => false,
        }
    }
    let p: Vec<char> = pattern.to_lowercase().chars().collect();
    let n: Vec<char> = name.to_lowercase().chars().collect();
    inner(&p, &n)
}
