//! NFO dialect handler chain
//!
//! Handlers are tried in registration order; the first handler whose
//! content sniff matches consumes the file exclusively and no handler
//! after it runs. Deleting the original NFO (plus an adjacent known
//! cover image) is gated by `delete_originals` in the configuration and
//! applied by the chain, never by a handler.

use crate::Result;
use aria_core::types::{Album, DirectoryInfo, FileInfo, MetaTag, MetaTagIdentifier, Song};
use aria_core::IngestConfig;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Cover image filenames removed together with a consumed NFO
pub const KNOWN_COVER_NAMES: &[&str] = &["cover.jpg", "folder.jpg", "front.jpg"];

/// One NFO dialect handler
#[async_trait]
pub trait NfoHandler: Send + Sync {
    /// Stable handler id, recorded as album provenance
    fn id(&self) -> &str;

    /// Content sniff; `true` claims the file for this handler
    async fn is_handler_for_nfo(&self, directory: &DirectoryInfo, file: &FileInfo)
        -> Result<bool>;

    /// Build an album from the NFO, or `None` when the content turns out
    /// to be unusable after all
    async fn handle_nfo(
        &self,
        directory: &DirectoryInfo,
        file: &FileInfo,
    ) -> Result<Option<Album>>;
}

/// Ordered first-match-consumes chain
pub struct NfoHandlerChain {
    handlers: Vec<Arc<dyn NfoHandler>>,
}

impl NfoHandlerChain {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Chain with the built-in dialect handlers, scene dialect first
    pub fn with_default_handlers() -> Self {
        let mut chain = Self::new();
        chain.register(Arc::new(SceneNfoHandler));
        chain.register(Arc::new(LabelledNfoHandler));
        chain
    }

    pub fn register(&mut self, handler: Arc<dyn NfoHandler>) {
        self.handlers.push(handler);
    }

    /// Run the chain for one NFO file. A sniff failure skips that
    /// handler; a handler that claims the file ends the chain whatever
    /// its outcome.
    pub async fn handle(
        &self,
        directory: &DirectoryInfo,
        file: &FileInfo,
        config: &IngestConfig,
    ) -> Result<Option<Album>> {
        for handler in &self.handlers {
            match handler.is_handler_for_nfo(directory, file).await {
                Ok(true) => {
                    let album = handler.handle_nfo(directory, file).await?;
                    if album.is_some() && config.delete_originals {
                        delete_nfo_and_cover(directory, file);
                    }
                    return Ok(album);
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(
                        "NFO sniff failed in handler {} for {}: {e}",
                        handler.id(),
                        file.name
                    );
                }
            }
        }
        Ok(None)
    }
}

impl Default for NfoHandlerChain {
    fn default() -> Self {
        Self::with_default_handlers()
    }
}

fn delete_nfo_and_cover(directory: &DirectoryInfo, file: &FileInfo) {
    let nfo_path = file.full_name(directory);
    if let Err(e) = std::fs::remove_file(&nfo_path) {
        tracing::warn!("Could not delete consumed NFO {}: {e}", nfo_path.display());
    }
    for cover in KNOWN_COVER_NAMES {
        let cover_path = directory.path.join(cover);
        if cover_path.exists() {
            if let Err(e) = std::fs::remove_file(&cover_path) {
                tracing::warn!("Could not delete cover {}: {e}", cover_path.display());
            }
        }
    }
}

async fn read_lossy(directory: &DirectoryInfo, file: &FileInfo) -> Result<String> {
    // NFOs are frequently CP437, not UTF-8
    let bytes = tokio::fs::read(file.full_name(directory)).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Fields extracted from labelled NFO lines, keys lowercased
#[derive(Debug, Default)]
struct NfoFields {
    values: HashMap<String, String>,
    tracks: Vec<(u32, String)>,
}

impl NfoFields {
    fn parse(content: &str) -> Self {
        let mut fields = Self::default();
        for line in content.lines() {
            if let Some((key, value)) = parse_labelled_line(line) {
                fields.values.entry(key).or_insert(value);
            } else if let Some(track) = parse_track_line(line) {
                fields.tracks.push(track);
            }
        }
        fields
    }

    fn get(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .find_map(|k| self.values.get(*k))
            .map(String::as_str)
    }

    fn into_album(self, directory: &DirectoryInfo, plugin_id: &str) -> Option<Album> {
        let artist = self.get(&["artist", "band", "performer"])?.to_string();
        let title = self.get(&["album", "title", "release"])?.to_string();

        let mut album = Album::new(directory.clone());
        album.add_via_plugin(plugin_id);
        album.add_tag(MetaTag::new(MetaTagIdentifier::AlbumArtist, artist));
        album.add_tag(MetaTag::new(MetaTagIdentifier::Album, title));
        if let Some(year) = self.get(&["year", "date", "released"]).and_then(find_year) {
            album.add_tag(MetaTag::new(MetaTagIdentifier::OrigAlbumYear, year));
        }
        if let Some(genre) = self.get(&["genre", "style"]) {
            album.add_tag(MetaTag::new(MetaTagIdentifier::Genre, genre));
        }

        for (number, track_title) in self.tracks {
            album.songs.push(Song::new(
                None,
                vec![
                    MetaTag::new(MetaTagIdentifier::TrackNumber, number.to_string()),
                    MetaTag::new(MetaTagIdentifier::Title, track_title),
                ],
            ));
        }

        Some(album)
    }
}

/// Parse `Artist .....: Value` or `Artist: Value` into (key, value)
fn parse_labelled_line(line: &str) -> Option<(String, String)> {
    let (left, right) = line.split_once(':')?;
    let key = left.trim().trim_end_matches(['.', ' ']).to_lowercase();
    let value = right.trim();
    // keys are single short words; anything else is prose with a colon
    if key.is_empty() || key.len() > 16 || key.contains(char::is_whitespace) || value.is_empty() {
        return None;
    }
    Some((key, value.to_string()))
}

/// Parse `01. Title`, `01 - Title` or `1) Title`, stripping a trailing
/// `[mm:ss]` or `(mm:ss)` duration
fn parse_track_line(line: &str) -> Option<(u32, String)> {
    let trimmed = line.trim();
    let digits: String = trimmed.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() || digits.len() > 3 {
        return None;
    }
    let number: u32 = digits.parse().ok()?;
    let rest = trimmed[digits.len()..].trim_start();
    let rest = rest
        .strip_prefix('.')
        .or_else(|| rest.strip_prefix('-'))
        .or_else(|| rest.strip_prefix(')'))?;

    let mut title = rest.trim().to_string();
    for (open, close) in [('[', ']'), ('(', ')')] {
        if title.ends_with(close) {
            if let Some(idx) = title.rfind(open) {
                let inner = &title[idx + 1..title.len() - 1];
                if inner.contains(':') && inner.chars().all(|c| c.is_ascii_digit() || c == ':') {
                    title.truncate(idx);
                    title = title.trim_end().to_string();
                }
            }
        }
    }

    if title.is_empty() {
        None
    } else {
        Some((number, title))
    }
}

/// First four-digit run in a value like `1997` or `(c) 1997 Virgin`
fn find_year(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    let mut run_start = None;
    for (i, b) in bytes.iter().enumerate() {
        if b.is_ascii_digit() {
            let start = *run_start.get_or_insert(i);
            if i - start == 3 {
                return Some(value[start..=i].to_string());
            }
        } else {
            run_start = None;
        }
    }
    None
}

/// Scene-release dialect: dotted label fill (`Artist .....: Value`)
pub struct SceneNfoHandler;

#[async_trait]
impl NfoHandler for SceneNfoHandler {
    fn id(&self) -> &str {
        "nfo-scene"
    }

    async fn is_handler_for_nfo(
        &self,
        directory: &DirectoryInfo,
        file: &FileInfo,
    ) -> Result<bool> {
        let content = read_lossy(directory, file).await?;
        Ok(content.lines().any(|line| {
            line.split_once(':')
                .map(|(left, _)| left.contains(".."))
                .unwrap_or(false)
                && parse_labelled_line(line).is_some()
        }))
    }

    async fn handle_nfo(
        &self,
        directory: &DirectoryInfo,
        file: &FileInfo,
    ) -> Result<Option<Album>> {
        let content = read_lossy(directory, file).await?;
        Ok(NfoFields::parse(&content).into_album(directory, self.id()))
    }
}

/// Plain labelled dialect (`Artist: Value` without dotted fill)
pub struct LabelledNfoHandler;

#[async_trait]
impl NfoHandler for LabelledNfoHandler {
    fn id(&self) -> &str {
        "nfo-labelled"
    }

    async fn is_handler_for_nfo(
        &self,
        directory: &DirectoryInfo,
        file: &FileInfo,
    ) -> Result<bool> {
        let content = read_lossy(directory, file).await?;
        let fields = NfoFields::parse(&content);
        Ok(fields.get(&["artist", "band", "performer"]).is_some()
            && fields.get(&["album", "title", "release"]).is_some())
    }

    async fn handle_nfo(
        &self,
        directory: &DirectoryInfo,
        file: &FileInfo,
    ) -> Result<Option<Album>> {
        let content = read_lossy(directory, file).await?;
        Ok(NfoFields::parse(&content).into_album(directory, self.id()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    const SCENE_NFO: &str = "\
\u{2591}\u{2592}\u{2593} RELEASE INFO \u{2593}\u{2592}\u{2591}

  Artist .........: The Future Sound of London
  Album ..........: Dead Cities
  Year ...........: 1996
  Genre ..........: Electronic
  Label ..........: Virgin

  01. Herd Killing [04:01]
  02. Dead Cities [03:56]
";

    const PLAIN_NFO: &str = "\
Artist: Boards of Canada
Album: Geogaddi
Year: 2002

1) Ready Lets Go
2) Music Is Math
";

    fn dir_for(temp: &TempDir) -> DirectoryInfo {
        DirectoryInfo {
            id: 0,
            parent_id: None,
            name: "release".to_string(),
            path: temp.path().to_path_buf(),
            file_count: 1,
            image_count: 0,
            media_count: 0,
            metadata_count: 1,
        }
    }

    fn write_nfo(temp: &TempDir, content: &str) -> FileInfo {
        fs::write(temp.path().join("release.nfo"), content).unwrap();
        FileInfo::new("release.nfo", content.len() as u64)
    }

    struct AlwaysMatches {
        handled: AtomicBool,
    }

    #[async_trait]
    impl NfoHandler for AlwaysMatches {
        fn id(&self) -> &str {
            "always"
        }

        async fn is_handler_for_nfo(
            &self,
            _directory: &DirectoryInfo,
            _file: &FileInfo,
        ) -> Result<bool> {
            Ok(true)
        }

        async fn handle_nfo(
            &self,
            directory: &DirectoryInfo,
            _file: &FileInfo,
        ) -> Result<Option<Album>> {
            self.handled.store(true, Ordering::SeqCst);
            Ok(Some(Album::new(directory.clone())))
        }
    }

    #[tokio::test]
    async fn first_matching_handler_consumes_exclusively() {
        let temp = TempDir::new().unwrap();
        let dir = dir_for(&temp);
        let file = write_nfo(&temp, PLAIN_NFO);

        let first = Arc::new(AlwaysMatches {
            handled: AtomicBool::new(false),
        });
        let second = Arc::new(AlwaysMatches {
            handled: AtomicBool::new(false),
        });

        let mut chain = NfoHandlerChain::new();
        chain.register(first.clone());
        chain.register(second.clone());

        let album = chain
            .handle(&dir, &file, &IngestConfig::default())
            .await
            .unwrap();
        assert!(album.is_some());
        assert!(first.handled.load(Ordering::SeqCst));
        assert!(!second.handled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn scene_dialect_is_sniffed_and_parsed() {
        let temp = TempDir::new().unwrap();
        let dir = dir_for(&temp);
        let file = write_nfo(&temp, SCENE_NFO);

        let handler = SceneNfoHandler;
        assert!(handler.is_handler_for_nfo(&dir, &file).await.unwrap());

        let album = handler.handle_nfo(&dir, &file).await.unwrap().unwrap();
        assert_eq!(
            album.tag_value(MetaTagIdentifier::AlbumArtist),
            Some("The Future Sound of London")
        );
        assert_eq!(album.tag_value(MetaTagIdentifier::Album), Some("Dead Cities"));
        assert_eq!(album.tag_value(MetaTagIdentifier::OrigAlbumYear), Some("1996"));
        assert_eq!(album.songs.len(), 2);
        assert_eq!(album.songs[0].title(), Some("Herd Killing"));
        assert_eq!(album.songs[1].track_number(), Some(2));
        assert!(album.via_plugins.contains(&"nfo-scene".to_string()));
    }

    #[tokio::test]
    async fn plain_dialect_falls_through_to_second_handler() {
        let temp = TempDir::new().unwrap();
        let dir = dir_for(&temp);
        let file = write_nfo(&temp, PLAIN_NFO);

        // scene handler must not claim plain labels
        assert!(!SceneNfoHandler
            .is_handler_for_nfo(&dir, &file)
            .await
            .unwrap());

        let chain = NfoHandlerChain::with_default_handlers();
        let album = chain
            .handle(&dir, &file, &IngestConfig::default())
            .await
            .unwrap()
            .unwrap();
        assert!(album.via_plugins.contains(&"nfo-labelled".to_string()));
        assert_eq!(album.tag_value(MetaTagIdentifier::Album), Some("Geogaddi"));
        assert_eq!(album.songs.len(), 2);
    }

    #[tokio::test]
    async fn unrecognized_content_yields_none() {
        let temp = TempDir::new().unwrap();
        let dir = dir_for(&temp);
        let file = write_nfo(&temp, "just some prose about nothing\n");

        let chain = NfoHandlerChain::with_default_handlers();
        let album = chain
            .handle(&dir, &file, &IngestConfig::default())
            .await
            .unwrap();
        assert!(album.is_none());
    }

    #[tokio::test]
    async fn delete_originals_removes_nfo_and_known_cover() {
        let temp = TempDir::new().unwrap();
        let dir = dir_for(&temp);
        let file = write_nfo(&temp, PLAIN_NFO);
        fs::write(temp.path().join("cover.jpg"), b"jpeg").unwrap();
        fs::write(temp.path().join("unrelated.jpg"), b"jpeg").unwrap();

        let config = IngestConfig {
            delete_originals: true,
            ..IngestConfig::default()
        };
        let chain = NfoHandlerChain::with_default_handlers();
        let album = chain.handle(&dir, &file, &config).await.unwrap();
        assert!(album.is_some());
        assert!(!temp.path().join("release.nfo").exists());
        assert!(!temp.path().join("cover.jpg").exists());
        assert!(temp.path().join("unrelated.jpg").exists());
    }
}
