//! CUE sheet parser
//!
//! Line-oriented grammar: `PERFORMER`, `TITLE`, `FILE`, `TRACK`,
//! `INDEX mm:ss:ff`, `REM <key> <value>`, `FLAGS`, `ISRC`,
//! `PREGAP`/`POSTGAP`. Malformed or unknown lines are skipped with a
//! warning, never fatal. One `CueSheet` is constructed per discovered
//! `.cue` file and immediately converted into an album or discarded.

use crate::{ParseError, Result};
use aria_core::types::{
    Album, AlbumStatus, DirectoryInfo, FileInfo, MetaTag, MetaTagIdentifier, Song,
};
use std::path::Path;

/// Plugin id recorded on albums assembled from CUE sheets
pub const CUE_PLUGIN_ID: &str = "cue-parser";

/// REM keys mapped into meta tags; everything else is ignored
const REM_KEY_REGISTRY: &[(&str, MetaTagIdentifier)] = &[
    ("GENRE", MetaTagIdentifier::Genre),
    ("DATE", MetaTagIdentifier::OrigAlbumYear),
    ("DISCID", MetaTagIdentifier::DiscId),
    ("COMMENT", MetaTagIdentifier::Comment),
    ("DISCNUMBER", MetaTagIdentifier::DiscNumber),
    ("TOTALDISCS", MetaTagIdentifier::DiscTotal),
];

/// One `INDEX` mark inside a CUE sheet. Index 00 is the pregap, 01 the
/// song start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CueIndex {
    pub song_number: u32,
    pub index_number: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub frames: u32,
}

/// One `TRACK` block
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CueSong {
    pub number: u32,
    pub title: Option<String>,
    pub performer: Option<String>,
    pub isrc: Option<String>,
    pub indexes: Vec<CueIndex>,
}

/// A parsed CUE file: one media file, ordered index marks, and a tag set
#[derive(Debug, Clone)]
pub struct CueSheet {
    /// The physical media file referenced by `FILE`
    pub media_file: Option<FileInfo>,

    /// Directory context the sheet was discovered in
    pub directory: DirectoryInfo,

    /// One entry per `TRACK`
    pub songs: Vec<CueSong>,

    /// Album-level tags from `PERFORMER`/`TITLE`/`REM`
    pub tags: Vec<MetaTag>,
}

impl CueSheet {
    /// Parse the CUE file named by `file` inside `directory`
    pub fn parse(directory: &DirectoryInfo, file: &FileInfo) -> Result<Self> {
        let path = file.full_name(directory);
        let bytes = std::fs::read(&path)?;
        // Scene CUE files are frequently not valid UTF-8
        let content = String::from_utf8_lossy(&bytes);
        Ok(Self::parse_content(directory, &content))
    }

    /// Parse CUE text against a directory context
    pub fn parse_content(directory: &DirectoryInfo, content: &str) -> Self {
        let mut sheet = Self {
            media_file: None,
            directory: directory.clone(),
            songs: Vec::new(),
            tags: Vec::new(),
        };

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (command, rest) = match line.split_once(char::is_whitespace) {
                Some((c, r)) => (c.to_ascii_uppercase(), r.trim()),
                None => (line.to_ascii_uppercase(), ""),
            };

            match command.as_str() {
                "REM" => sheet.parse_rem(rest),
                "PERFORMER" => {
                    let value = unquote(rest);
                    match sheet.songs.last_mut() {
                        Some(song) => song.performer = Some(value),
                        None => sheet
                            .tags
                            .push(MetaTag::new(MetaTagIdentifier::AlbumArtist, value)),
                    }
                }
                "TITLE" => {
                    let value = unquote(rest);
                    match sheet.songs.last_mut() {
                        Some(song) => song.title = Some(value),
                        None => sheet.tags.push(MetaTag::new(MetaTagIdentifier::Album, value)),
                    }
                }
                "FILE" => {
                    let name = file_name_token(rest).to_string();
                    let size = Path::new(&name)
                        .file_name()
                        .map(|n| directory.path.join(n))
                        .and_then(|p| std::fs::metadata(p).ok())
                        .map_or(0, |m| m.len());
                    sheet.media_file = Some(FileInfo::new(name, size));
                }
                "TRACK" => match rest.split_whitespace().next().and_then(|n| n.parse().ok()) {
                    Some(number) => sheet.songs.push(CueSong {
                        number,
                        ..CueSong::default()
                    }),
                    None => tracing::warn!("Skipping malformed TRACK line: {line}"),
                },
                "INDEX" => sheet.parse_index(rest, line),
                "ISRC" => {
                    if let Some(song) = sheet.songs.last_mut() {
                        song.isrc = Some(unquote(rest));
                    }
                }
                // Recognized but not carried into the album
                "FLAGS" | "PREGAP" | "POSTGAP" | "CATALOG" | "CDTEXTFILE" | "SONGWRITER" => {}
                _ => tracing::warn!("Ignoring unknown CUE line: {line}"),
            }
        }

        sheet
    }

    fn parse_rem(&mut self, rest: &str) {
        let Some((key, value)) = rest.split_once(char::is_whitespace) else {
            return;
        };
        let key = key.to_ascii_uppercase();
        match REM_KEY_REGISTRY.iter().find(|(k, _)| *k == key) {
            Some((_, identifier)) => self.tags.push(MetaTag::new(*identifier, unquote(value))),
            None => tracing::debug!("Ignoring unmapped REM key: {key}"),
        }
    }

    fn parse_index(&mut self, rest: &str, line: &str) {
        let mut parts = rest.split_whitespace();
        let index_number = parts.next().and_then(|n| n.parse().ok());
        let timestamp = parts.next().map(|t| t.split(':').collect::<Vec<_>>());

        let (Some(index_number), Some(stamp)) = (index_number, timestamp) else {
            tracing::warn!("Skipping malformed INDEX line: {line}");
            return;
        };
        if stamp.len() != 3 {
            tracing::warn!("Skipping malformed INDEX timestamp: {line}");
            return;
        }
        let (Ok(minutes), Ok(seconds), Ok(frames)) =
            (stamp[0].parse(), stamp[1].parse(), stamp[2].parse())
        else {
            tracing::warn!("Skipping malformed INDEX timestamp: {line}");
            return;
        };

        match self.songs.last_mut() {
            Some(song) => song.indexes.push(CueIndex {
                song_number: song.number,
                index_number,
                minutes,
                seconds,
                frames,
            }),
            None => tracing::warn!("INDEX before any TRACK, skipping: {line}"),
        }
    }

    /// Validity contract: at least one song, at least one tag, exactly one
    /// each of Album/AlbumArtist/OrigAlbumYear, at least one index, and
    /// the referenced media file exists on disk.
    pub fn is_valid(&self) -> bool {
        use aria_core::types::count_tags;

        let media_file_exists = self
            .media_file
            .as_ref()
            .map(|f| f.full_name(&self.directory).exists())
            .unwrap_or(false);

        !self.songs.is_empty()
            && !self.tags.is_empty()
            && count_tags(&self.tags, MetaTagIdentifier::Album) == 1
            && count_tags(&self.tags, MetaTagIdentifier::AlbumArtist) == 1
            && count_tags(&self.tags, MetaTagIdentifier::OrigAlbumYear) == 1
            && self.songs.iter().any(|s| !s.indexes.is_empty())
            && media_file_exists
    }

    /// Convert the sheet into an album. An invalid sheet produces an
    /// `Invalid` album so the failure reason survives into validation.
    pub fn into_album(self) -> Album {
        let status = if self.is_valid() {
            AlbumStatus::New
        } else {
            AlbumStatus::Invalid
        };

        let mut album = Album::new(self.directory.clone());
        album.status = status;
        album.tags = self.tags;
        album.add_via_plugin(CUE_PLUGIN_ID);

        for cue_song in self.songs {
            let mut tags = vec![MetaTag::new(
                MetaTagIdentifier::TrackNumber,
                cue_song.number.to_string(),
            )];
            if let Some(title) = cue_song.title {
                tags.push(MetaTag::new(MetaTagIdentifier::Title, title));
            }
            if let Some(performer) = cue_song.performer {
                tags.push(MetaTag::new(MetaTagIdentifier::Artist, performer));
            }
            if let Some(isrc) = cue_song.isrc {
                tags.push(MetaTag::new(MetaTagIdentifier::Isrc, isrc));
            }
            album.songs.push(Song::new(self.media_file.clone(), tags));
        }

        album
    }
}

fn unquote(value: &str) -> String {
    value.trim().trim_matches('"').to_string()
}

/// The name portion of a `FILE "name" [type]` line. The type token
/// (WAVE, MP3, ...) is optional and never quoted, so a quoted name is
/// read up to its closing quote; an unquoted name only loses its last
/// token when that token is a known type keyword.
fn file_name_token(rest: &str) -> &str {
    let rest = rest.trim();
    if let Some(quoted) = rest.strip_prefix('"') {
        if let Some(end) = quoted.find('"') {
            return &quoted[..end];
        }
    }
    match rest.rsplit_once(char::is_whitespace) {
        Some((name, kind))
            if matches!(
                kind.to_ascii_uppercase().as_str(),
                "WAVE" | "MP3" | "AIFF" | "BINARY" | "MOTOROLA"
            ) =>
        {
            name.trim().trim_matches('"')
        }
        _ => rest.trim_matches('"'),
    }
}
