//! Batch orchestration and the per-directory state machine
//!
//! Directories advance through a fixed sequence of states; a failure at
//! any stage marks the directory `Failed` and, depending on
//! configuration, either moves on to the next directory or aborts the
//! batch with the partial result. Albums already assembled are always
//! returned to the caller.
//!
//! State order: `Discovered` → `PreScripted` → `Converted` →
//! `TagsProcessed` → `Validated` → `Done` | `Failed`.

use crate::convert::{AudioConvertPlugin, ImageConvertPlugin};
use crate::discovery::{classify, DirectoryDiscoverer, FileClass};
use crate::scripts::{ExternalScriptPlugin, ScriptHook};
use crate::validation::AlbumValidator;
use aria_core::plugin::{
    ConversionPlugin, MetaTagsProcessorPlugin, PluginRegistry, ScriptPlugin, ValidationPlugin,
};
use aria_core::types::{
    find_tag, Album, AlbumStatus, DirectoryInfo, FileInfo, MetaTag, MetaTagIdentifier,
    OperationResult, PagedRequest, Song,
};
use aria_core::IngestConfig;
use aria_parsers::cue::CueSheet;
use aria_parsers::nfo::NfoHandlerChain;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// The plugin chains one orchestrator runs with
pub struct PluginSet {
    pub conversions: PluginRegistry<dyn ConversionPlugin>,
    pub meta_tags: PluginRegistry<dyn MetaTagsProcessorPlugin>,
    pub pre_scripts: PluginRegistry<dyn ScriptPlugin>,
    pub post_scripts: PluginRegistry<dyn ScriptPlugin>,
    pub validators: PluginRegistry<dyn ValidationPlugin>,
}

impl PluginSet {
    /// A set with no plugins registered in any category
    pub fn empty() -> Self {
        Self {
            conversions: PluginRegistry::new(),
            meta_tags: PluginRegistry::new(),
            pre_scripts: PluginRegistry::new(),
            post_scripts: PluginRegistry::new(),
            validators: PluginRegistry::new(),
        }
    }

    /// The built-in plugin lineup
    pub fn standard() -> Self {
        let mut set = Self::empty();
        set.conversions.register(Arc::new(ImageConvertPlugin));
        set.conversions.register(Arc::new(AudioConvertPlugin));
        set.meta_tags.register(Arc::new(crate::tags::EmbeddedTagsPlugin));
        set.meta_tags.register(Arc::new(crate::tags::TagNormalizerPlugin));
        set.pre_scripts
            .register(Arc::new(ExternalScriptPlugin::new(ScriptHook::PreDiscovery)));
        set.post_scripts
            .register(Arc::new(ExternalScriptPlugin::new(ScriptHook::PostDiscovery)));
        set.validators.register(Arc::new(AlbumValidator));
        set
    }
}

/// Processing state of one directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirectoryState {
    Discovered,
    PreScripted,
    Converted,
    TagsProcessed,
    Validated,
}

impl fmt::Display for DirectoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Discovered => "discovered",
            Self::PreScripted => "pre-scripted",
            Self::Converted => "converted",
            Self::TagsProcessed => "tags-processed",
            Self::Validated => "validated",
        };
        f.write_str(label)
    }
}

/// Outcome counters for one batch run
#[derive(Debug, Default)]
pub struct ProcessSummary {
    /// Directories that produced an album
    pub processed: usize,

    /// Directories skipped without invoking any plugin
    pub skipped: usize,

    /// Directories that reached `Failed`
    pub failed: usize,

    /// One entry per failed directory
    pub errors: Vec<(PathBuf, String)>,

    /// Whether the run ended due to cancellation
    pub cancelled: bool,

    /// Wall-clock duration of the run
    pub duration: Duration,
}

/// Drives directories through the ingestion state machine
pub struct PipelineOrchestrator {
    plugins: PluginSet,
    nfo_chain: NfoHandlerChain,
}

impl PipelineOrchestrator {
    pub fn new(plugins: PluginSet) -> Self {
        Self {
            plugins,
            nfo_chain: NfoHandlerChain::with_default_handlers(),
        }
    }

    /// Orchestrator with the built-in plugin lineup
    pub fn standard() -> Self {
        Self::new(PluginSet::standard())
    }

    /// Process every processable directory under `root`
    pub async fn process_directory(
        &self,
        root: &Path,
        config: &IngestConfig,
        cancel: &CancellationToken,
    ) -> OperationResult<Vec<Album>> {
        self.process_directory_with_summary(root, config, cancel)
            .await
            .0
    }

    /// Process every processable directory under `root`, also returning
    /// run counters
    pub async fn process_directory_with_summary(
        &self,
        root: &Path,
        config: &IngestConfig,
        cancel: &CancellationToken,
    ) -> (OperationResult<Vec<Album>>, ProcessSummary) {
        let started = Instant::now();
        let mut summary = ProcessSummary::default();

        let discovered = DirectoryDiscoverer::directory_infos(root, &PagedRequest::default());
        if !discovered.is_success() {
            summary.duration = started.elapsed();
            let mut result = OperationResult::ok(Vec::new());
            for error in discovered.errors {
                result.push_error(error);
            }
            return (result, summary);
        }

        // directories without media or metadata never reach a plugin
        let mut directories: Vec<DirectoryInfo> = Vec::new();
        for directory in discovered.items {
            if directory.is_processable() {
                directories.push(directory);
            } else {
                tracing::debug!("Skipping {} (nothing to ingest)", directory.path.display());
                summary.skipped += 1;
            }
        }
        directories.truncate(config.max_processing_count);

        let mut albums = Vec::new();
        let mut errors = Vec::new();

        for directory in &directories {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                errors.push("processing cancelled".to_string());
                break;
            }

            match self.process_one(directory, config, cancel).await {
                Ok(album) => {
                    summary.processed += 1;
                    albums.push(album);
                }
                Err((state, message)) => {
                    summary.failed += 1;
                    let context = format!(
                        "{} failed in state {state}: {message}",
                        directory.path.display()
                    );
                    tracing::error!("{context}");
                    summary.errors.push((directory.path.clone(), message));
                    errors.push(context);
                    if !config.do_continue_on_directory_processing_errors {
                        break;
                    }
                }
            }
        }

        summary.duration = started.elapsed();
        tracing::info!(
            "Processed {} directories ({} skipped, {} failed) in {:?}",
            summary.processed,
            summary.skipped,
            summary.failed,
            summary.duration
        );

        let result = OperationResult {
            data: Some(albums),
            errors,
        };
        (result, summary)
    }

    /// Run one directory through the state machine
    async fn process_one(
        &self,
        directory: &DirectoryInfo,
        config: &IngestConfig,
        cancel: &CancellationToken,
    ) -> std::result::Result<Album, (DirectoryState, String)> {
        let mut state = DirectoryState::Discovered;
        tracing::debug!("Processing {}", directory.path.display());

        for plugin in self.plugins.pre_scripts.enabled(config) {
            let outcome = plugin.process(directory, config, cancel).await;
            if !outcome.is_success() {
                if config.script_failure_is_fatal {
                    return Err((state, outcome.errors.join("; ")));
                }
                tracing::warn!(
                    "Pre-script {} failed for {}: {}",
                    plugin.id(),
                    directory.path.display(),
                    outcome.errors.join("; ")
                );
            }
        }
        state = DirectoryState::PreScripted;

        let mut files = list_files(directory)
            .await
            .map_err(|e| (state, e.to_string()))?;

        'conversions: for plugin in self.plugins.conversions.enabled(config) {
            for file in &mut files {
                if cancel.is_cancelled() {
                    return Err((state, "processing cancelled".to_string()));
                }
                if !plugin.does_handle_file(directory, file) {
                    continue;
                }
                let converted = plugin.process_file(directory, file, config, cancel).await;
                if !converted.is_success() {
                    return Err((state, converted.errors.join("; ")));
                }
                let Some(produced) = converted.data else {
                    return Err((
                        state,
                        format!(
                            "conversion plugin {} reported success without a file (contract violation)",
                            plugin.id()
                        ),
                    ));
                };
                *file = produced;
            }
            if plugin.stop_processing() {
                tracing::debug!("Plugin {} requested stop-processing", plugin.id());
                break 'conversions;
            }
        }
        state = DirectoryState::Converted;

        let mut album = self.assemble_album(directory, &files, config).await;
        self.run_tag_chain(directory, &files, &mut album, config, cancel)
            .await
            .map_err(|message| (state, message))?;
        state = DirectoryState::TagsProcessed;

        let validators = self.plugins.validators.enabled(config);
        if !validators.is_empty() {
            // worst finding wins; a pre-set Invalid never improves
            let mut valid = album.status != AlbumStatus::Invalid;
            for validator in validators {
                let verdict = validator.validate(&album);
                for finding in &verdict.messages {
                    tracing::debug!(
                        "Validation [{}] {}: {}",
                        validator.id(),
                        directory.path.display(),
                        finding.message
                    );
                }
                valid = valid && verdict.is_valid;
            }
            album.status = if valid {
                AlbumStatus::Ok
            } else {
                AlbumStatus::Invalid
            };
        }
        state = DirectoryState::Validated;
        tracing::debug!("{} reached state {state}", directory.path.display());

        // post-script failure never withholds an assembled album
        for plugin in self.plugins.post_scripts.enabled(config) {
            let outcome = plugin.process(directory, config, cancel).await;
            if !outcome.is_success() {
                tracing::warn!(
                    "Post-script {} failed for {}: {}",
                    plugin.id(),
                    directory.path.display(),
                    outcome.errors.join("; ")
                );
            }
        }

        Ok(album)
    }

    /// Assemble the album skeleton: the first CUE sheet wins, then the
    /// NFO handler chain, then an empty album to be filled from embedded
    /// tags
    async fn assemble_album(
        &self,
        directory: &DirectoryInfo,
        files: &[FileInfo],
        config: &IngestConfig,
    ) -> Album {
        if let Some(cue) = files
            .iter()
            .find(|f| f.extension().as_deref() == Some("cue"))
        {
            match CueSheet::parse(directory, cue) {
                Ok(sheet) => return sheet.into_album(),
                Err(e) => {
                    tracing::warn!("Unreadable CUE sheet {}: {e}", cue.name);
                }
            }
        }

        for nfo in files
            .iter()
            .filter(|f| f.extension().as_deref() == Some("nfo"))
        {
            match self.nfo_chain.handle(directory, nfo, config).await {
                Ok(Some(album)) => return album,
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("NFO handling failed for {}: {e}", nfo.name);
                }
            }
        }

        Album::new(directory.clone())
    }

    /// Run each media file's accumulated tag set through the tag-plugin
    /// chain, folding album-level tags into the album and building songs
    /// when no parser supplied them
    async fn run_tag_chain(
        &self,
        directory: &DirectoryInfo,
        files: &[FileInfo],
        album: &mut Album,
        config: &IngestConfig,
        cancel: &CancellationToken,
    ) -> std::result::Result<(), String> {
        let tag_plugins = self.plugins.meta_tags.enabled(config);
        let build_songs = album.songs.is_empty();

        for file in files {
            match classify(Path::new(&file.name)) {
                FileClass::Media => {}
                FileClass::Image => {
                    album.images.push(file.clone());
                    continue;
                }
                _ => continue,
            }

            let mut tags: Vec<MetaTag> = Vec::new();
            for plugin in &tag_plugins {
                let outcome = plugin
                    .process_meta_tags(directory, file, tags, cancel)
                    .await;
                if !outcome.is_success() {
                    return Err(outcome.errors.join("; "));
                }
                tags = outcome.data.ok_or_else(|| {
                    format!(
                        "tag plugin {} reported success without a tag set (contract violation)",
                        plugin.id()
                    )
                })?;
                album.add_via_plugin(plugin.id());
            }

            let mut song_tags = Vec::new();
            for tag in tags {
                if crate::tags::SONG_LEVEL_IDENTIFIERS.contains(&tag.identifier) {
                    song_tags.push(tag);
                } else if album.tag_count(tag.identifier) == 0 {
                    // parser-supplied album tags take precedence
                    album.add_tag(tag);
                }
            }

            if build_songs {
                album.songs.push(Song::new(Some(file.clone()), song_tags));
            }
        }

        // a plain tagged release often carries only per-song artists
        if album.tag_count(MetaTagIdentifier::AlbumArtist) == 0 {
            let artist = album.songs.iter().find_map(|song| {
                find_tag(&song.tags, MetaTagIdentifier::Artist).map(|t| t.value.clone())
            });
            if let Some(artist) = artist {
                album.add_tag(MetaTag::new(MetaTagIdentifier::AlbumArtist, artist));
            }
        }

        Ok(())
    }
}

/// Direct children of the directory, files only, sorted by name
async fn list_files(directory: &DirectoryInfo) -> crate::Result<Vec<FileInfo>> {
    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(&directory.path).await?;
    while let Some(entry) = entries.next_entry().await? {
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            files.push(FileInfo::new(name, metadata.len()));
        }
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}
