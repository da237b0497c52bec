//! End-to-end pipeline tests over real directory trees with hand-built
//! media fixtures.

use aria_core::plugin::{ConversionPlugin, Plugin};
use aria_core::types::{
    AlbumStatus, DirectoryInfo, FileInfo, MetaTagIdentifier, OperationResult,
};
use aria_core::IngestConfig;
use aria_ingest::pipeline::{PipelineOrchestrator, PluginSet};
use aria_ingest::tags::EmbeddedTagsPlugin;
use aria_ingest::validation::AlbumValidator;
use async_trait::async_trait;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn syncsafe(value: u32) -> [u8; 4] {
    [
        ((value >> 21) & 0x7F) as u8,
        ((value >> 14) & 0x7F) as u8,
        ((value >> 7) & 0x7F) as u8,
        (value & 0x7F) as u8,
    ]
}

fn text_frame(id: &[u8; 4], value: &str) -> Vec<u8> {
    let mut body = vec![0x03]; // UTF-8
    body.extend_from_slice(value.as_bytes());

    let mut frame = Vec::new();
    frame.extend_from_slice(id);
    frame.extend_from_slice(&syncsafe(body.len() as u32));
    frame.extend_from_slice(&[0x00, 0x00]);
    frame.extend_from_slice(&body);
    frame
}

/// An MP3 with an ID3v2.4 tag followed by two MPEG-1 Layer III frames
fn write_tagged_mp3(dir: &Path, name: &str, title: &str, artist: &str, album: &str, track: u32) {
    let mut frames = Vec::new();
    frames.extend(text_frame(b"TIT2", title));
    frames.extend(text_frame(b"TPE1", artist));
    frames.extend(text_frame(b"TALB", album));
    frames.extend(text_frame(b"TRCK", &track.to_string()));

    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"ID3");
    bytes.extend_from_slice(&[0x04, 0x00, 0x00]);
    bytes.extend_from_slice(&syncsafe(frames.len() as u32));
    bytes.extend_from_slice(&frames);
    for _ in 0..2 {
        // 417-byte frame at 128kbps/44.1kHz, header included
        bytes.extend_from_slice(&[0xFF, 0xFB, 0x90, 0x00]);
        bytes.extend_from_slice(&[0x00; 413]);
    }

    fs::write(dir.join(name), bytes).unwrap();
}

/// Conversion plugin that counts how often the pipeline consults it
struct CountingConversionPlugin {
    consulted: Arc<AtomicUsize>,
}

impl Plugin for CountingConversionPlugin {
    fn id(&self) -> &str {
        "counting"
    }

    fn display_name(&self) -> &str {
        "Counting"
    }
}

#[async_trait]
impl ConversionPlugin for CountingConversionPlugin {
    fn does_handle_file(&self, _directory: &DirectoryInfo, _file: &FileInfo) -> bool {
        self.consulted.fetch_add(1, Ordering::SeqCst);
        false
    }

    async fn process_file(
        &self,
        _directory: &DirectoryInfo,
        file: &FileInfo,
        _config: &IngestConfig,
        _cancel: &CancellationToken,
    ) -> OperationResult<FileInfo> {
        OperationResult::ok(file.clone())
    }
}

/// Conversion plugin that asks the chain to stop after its pass
struct StoppingConversionPlugin;

impl Plugin for StoppingConversionPlugin {
    fn id(&self) -> &str {
        "stopper"
    }

    fn display_name(&self) -> &str {
        "Stopper"
    }
}

#[async_trait]
impl ConversionPlugin for StoppingConversionPlugin {
    fn does_handle_file(&self, _directory: &DirectoryInfo, _file: &FileInfo) -> bool {
        false
    }

    async fn process_file(
        &self,
        _directory: &DirectoryInfo,
        file: &FileInfo,
        _config: &IngestConfig,
        _cancel: &CancellationToken,
    ) -> OperationResult<FileInfo> {
        OperationResult::ok(file.clone())
    }

    fn stop_processing(&self) -> bool {
        true
    }
}

/// Conversion plugin that fails for one directory by name
struct FailingConversionPlugin {
    directory_name: &'static str,
}

impl Plugin for FailingConversionPlugin {
    fn id(&self) -> &str {
        "failing"
    }

    fn display_name(&self) -> &str {
        "Failing"
    }
}

#[async_trait]
impl ConversionPlugin for FailingConversionPlugin {
    fn does_handle_file(&self, directory: &DirectoryInfo, _file: &FileInfo) -> bool {
        directory.name == self.directory_name
    }

    async fn process_file(
        &self,
        directory: &DirectoryInfo,
        _file: &FileInfo,
        _config: &IngestConfig,
        _cancel: &CancellationToken,
    ) -> OperationResult<FileInfo> {
        OperationResult::error(format!("injected failure in {}", directory.name))
    }
}

fn three_release_tree() -> TempDir {
    let temp = TempDir::new().unwrap();
    for (name, album) in [("a", "First"), ("b", "Second"), ("c", "Third")] {
        let dir = temp.path().join(name);
        fs::create_dir(&dir).unwrap();
        write_tagged_mp3(&dir, "01.mp3", "Opener", "Band", album, 1);
    }
    temp
}

#[tokio::test]
async fn directory_without_media_is_skipped_without_plugin_invocation() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("notes.txt"), b"not a release").unwrap();

    let consulted = Arc::new(AtomicUsize::new(0));
    let mut plugins = PluginSet::empty();
    plugins.conversions.register(Arc::new(CountingConversionPlugin {
        consulted: consulted.clone(),
    }));

    let orchestrator = PipelineOrchestrator::new(plugins);
    let (result, summary) = orchestrator
        .process_directory_with_summary(
            temp.path(),
            &IngestConfig::default(),
            &CancellationToken::new(),
        )
        .await;

    assert!(result.is_success());
    assert!(result.data.unwrap().is_empty());
    assert_eq!(summary.skipped, 1);
    assert_eq!(consulted.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn stop_processing_skips_remaining_conversion_plugins() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    write_tagged_mp3(temp.path(), "song.mp3", "Title", "Artist", "Album", 1);

    let consulted = Arc::new(AtomicUsize::new(0));
    let mut plugins = PluginSet::empty();
    plugins.conversions.register(Arc::new(StoppingConversionPlugin));
    plugins.conversions.register(Arc::new(CountingConversionPlugin {
        consulted: consulted.clone(),
    }));

    let orchestrator = PipelineOrchestrator::new(plugins);
    let result = orchestrator
        .process_directory(
            temp.path(),
            &IngestConfig::default(),
            &CancellationToken::new(),
        )
        .await;

    assert!(result.is_success(), "{:?}", result.errors);
    assert_eq!(result.data.unwrap().len(), 1);
    // the second plugin is never consulted once the first stops the chain
    assert_eq!(consulted.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn embedded_tags_only_release_yields_one_ok_album() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    write_tagged_mp3(
        temp.path(),
        "song.mp3",
        "Herd Killing",
        "The Future Sound of London",
        "Dead Cities",
        1,
    );

    let config = IngestConfig {
        do_continue_on_directory_processing_errors: true,
        ..IngestConfig::default()
    };
    let orchestrator = PipelineOrchestrator::standard();
    let result = orchestrator
        .process_directory(temp.path(), &config, &CancellationToken::new())
        .await;

    assert!(result.is_success(), "{:?}", result.errors);
    let albums = result.data.unwrap();
    assert_eq!(albums.len(), 1);

    let album = &albums[0];
    assert_eq!(album.status, AlbumStatus::Ok);
    assert!(!album.via_plugins.is_empty());
    assert_eq!(album.tag_value(MetaTagIdentifier::Album), Some("Dead Cities"));
    assert_eq!(
        album.tag_value(MetaTagIdentifier::AlbumArtist),
        Some("The Future Sound of London")
    );
    assert_eq!(album.songs.len(), 1);
    assert_eq!(album.songs[0].title(), Some("Herd Killing"));
    assert_eq!(album.songs[0].track_number(), Some(1));
}

fn failing_plugin_set() -> PluginSet {
    let mut plugins = PluginSet::empty();
    plugins.conversions.register(Arc::new(FailingConversionPlugin {
        directory_name: "b",
    }));
    plugins.meta_tags.register(Arc::new(EmbeddedTagsPlugin));
    plugins.validators.register(Arc::new(AlbumValidator));
    plugins
}

#[tokio::test]
async fn continue_on_error_processes_remaining_directories() {
    init_tracing();
    let temp = three_release_tree();

    let config = IngestConfig {
        do_continue_on_directory_processing_errors: true,
        ..IngestConfig::default()
    };
    let orchestrator = PipelineOrchestrator::new(failing_plugin_set());
    let (result, summary) = orchestrator
        .process_directory_with_summary(temp.path(), &config, &CancellationToken::new())
        .await;

    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("injected failure"));

    let albums = result.data.unwrap();
    let titles: Vec<Option<&str>> = albums
        .iter()
        .map(|a| a.tag_value(MetaTagIdentifier::Album))
        .collect();
    assert_eq!(titles, vec![Some("First"), Some("Third")]);

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].0.ends_with("b"));
}

#[tokio::test]
async fn batch_aborts_on_first_failure_by_default() {
    init_tracing();
    let temp = three_release_tree();

    let orchestrator = PipelineOrchestrator::new(failing_plugin_set());
    let (result, summary) = orchestrator
        .process_directory_with_summary(
            temp.path(),
            &IngestConfig::default(),
            &CancellationToken::new(),
        )
        .await;

    // partial result up to the failing directory, then the batch stops
    assert_eq!(result.errors.len(), 1);
    let albums = result.data.unwrap();
    assert_eq!(albums.len(), 1);
    assert_eq!(
        albums[0].tag_value(MetaTagIdentifier::Album),
        Some("First")
    );
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failed, 1);
}

#[tokio::test]
async fn pre_cancelled_token_reports_cancellation() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    write_tagged_mp3(temp.path(), "song.mp3", "Title", "Artist", "Album", 1);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let orchestrator = PipelineOrchestrator::standard();
    let (result, summary) = orchestrator
        .process_directory_with_summary(temp.path(), &IngestConfig::default(), &cancel)
        .await;

    assert!(!result.is_success());
    assert!(result.errors[0].contains("cancelled"));
    assert!(summary.cancelled);
    assert_eq!(summary.processed, 0);
}

#[tokio::test]
async fn max_processing_count_bounds_the_batch() {
    init_tracing();
    let temp = three_release_tree();

    let config = IngestConfig {
        max_processing_count: 2,
        do_continue_on_directory_processing_errors: true,
        ..IngestConfig::default()
    };
    let mut plugins = PluginSet::empty();
    plugins.meta_tags.register(Arc::new(EmbeddedTagsPlugin));
    plugins.validators.register(Arc::new(AlbumValidator));

    let orchestrator = PipelineOrchestrator::new(plugins);
    let (result, summary) = orchestrator
        .process_directory_with_summary(temp.path(), &config, &CancellationToken::new())
        .await;

    assert!(result.is_success());
    assert_eq!(result.data.unwrap().len(), 2);
    assert_eq!(summary.processed, 2);
}
