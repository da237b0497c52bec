//! Plugin capability contracts and the ordered registry
//!
//! Each pipeline stage is a small capability trait rather than a deep
//! base class; a plugin implements whichever capabilities it supports.
//! Every category has a no-op variant so a chain can run with a stage
//! disabled without branching at call sites.
//!
//! Ordering invariant: plugins of one category run strictly by ascending
//! `sort_order`; ties break by registration order (stable sort).

use crate::config::IngestConfig;
use crate::types::{
    Album, AlbumSearchResult, ArtistSearchResult, DirectoryInfo, FileInfo, ImageSearchResult,
    MetaTag, OperationResult, PagedResult, SongSearchResult, ValidationResult,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Base capability every plugin exposes
pub trait Plugin: Send + Sync {
    /// Stable opaque identifier, not a display name
    fn id(&self) -> &str;

    /// Human-readable name
    fn display_name(&self) -> &str;

    /// Whether the plugin is enabled at all (configuration may further
    /// disable it per run)
    fn is_enabled(&self) -> bool {
        true
    }

    /// Ascending execution order within the plugin's category
    fn sort_order(&self) -> i32 {
        0
    }
}

/// A plugin that converts files in place (image/audio normalization)
#[async_trait]
pub trait ConversionPlugin: Plugin {
    /// Whether this plugin wants the file
    fn does_handle_file(&self, directory: &DirectoryInfo, file: &FileInfo) -> bool;

    /// Convert one file, returning the descriptor of the produced file
    async fn process_file(
        &self,
        directory: &DirectoryInfo,
        file: &FileInfo,
        config: &IngestConfig,
        cancel: &CancellationToken,
    ) -> OperationResult<FileInfo>;

    /// When true after a run, the remaining conversion plugins for the
    /// current directory are skipped
    fn stop_processing(&self) -> bool {
        false
    }
}

/// A plugin that transforms an accumulated tag set; pure with respect to
/// the filesystem, never deletes files
#[async_trait]
pub trait MetaTagsProcessorPlugin: Plugin {
    async fn process_meta_tags(
        &self,
        directory: &DirectoryInfo,
        file: &FileInfo,
        tags: Vec<MetaTag>,
        cancel: &CancellationToken,
    ) -> OperationResult<Vec<MetaTag>>;
}

/// A plugin that invokes an external script hook for a directory
#[async_trait]
pub trait ScriptPlugin: Plugin {
    /// Run the hook; `Ok(true)` means the script ran and exited zero.
    /// Script failure is reported in the envelope, never raised.
    async fn process(
        &self,
        directory: &DirectoryInfo,
        config: &IngestConfig,
        cancel: &CancellationToken,
    ) -> OperationResult<bool>;
}

/// A pure function over an assembled album
pub trait ValidationPlugin: Plugin {
    fn validate(&self, album: &Album) -> ValidationResult;
}

/// Artist search capability
#[async_trait]
pub trait ArtistSearchEnginePlugin: Plugin {
    async fn do_artist_search(
        &self,
        query: &str,
        max_results: usize,
        cancel: &CancellationToken,
    ) -> PagedResult<ArtistSearchResult>;
}

/// Album search capability
#[async_trait]
pub trait AlbumSearchEnginePlugin: Plugin {
    async fn do_album_search(
        &self,
        query: &str,
        max_results: usize,
        cancel: &CancellationToken,
    ) -> PagedResult<AlbumSearchResult>;
}

/// Album cover-image search capability
#[async_trait]
pub trait AlbumImageSearchEnginePlugin: Plugin {
    async fn do_album_image_search(
        &self,
        query: &str,
        max_results: usize,
        cancel: &CancellationToken,
    ) -> OperationResult<Vec<ImageSearchResult>>;
}

/// Artist image search capability
#[async_trait]
pub trait ArtistImageSearchEnginePlugin: Plugin {
    async fn do_artist_image_search(
        &self,
        query: &str,
        max_results: usize,
        cancel: &CancellationToken,
    ) -> OperationResult<Vec<ImageSearchResult>>;
}

/// Artist top-songs search capability
#[async_trait]
pub trait ArtistTopSongsSearchEnginePlugin: Plugin {
    async fn do_artist_top_songs_search(
        &self,
        artist: &str,
        max_results: usize,
        cancel: &CancellationToken,
    ) -> OperationResult<Vec<SongSearchResult>>;
}

/// Ordered plugin registry for one capability
///
/// Registration order is preserved; [`PluginRegistry::enabled`] returns
/// plugins stably sorted by `sort_order`, filtered by both the plugin's
/// own flag and the per-run configuration.
pub struct PluginRegistry<P: ?Sized> {
    plugins: Vec<Arc<P>>,
}

impl<P: Plugin + ?Sized> PluginRegistry<P> {
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Register a plugin; registration order is the tie-breaker
    pub fn register(&mut self, plugin: Arc<P>) {
        self.plugins.push(plugin);
    }

    /// All registered plugins in registration order
    pub fn all(&self) -> &[Arc<P>] {
        &self.plugins
    }

    /// Enabled plugins in execution order
    pub fn enabled(&self, config: &IngestConfig) -> Vec<Arc<P>> {
        let mut enabled: Vec<Arc<P>> = self
            .plugins
            .iter()
            .filter(|p| p.is_enabled() && config.is_plugin_enabled(p.id()))
            .cloned()
            .collect();
        // Vec::sort_by_key is stable, so registration order breaks ties
        enabled.sort_by_key(|p| p.sort_order());
        enabled
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl<P: Plugin + ?Sized> Default for PluginRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// No-op conversion plugin: handles nothing
pub struct NoopConversionPlugin;

impl Plugin for NoopConversionPlugin {
    fn id(&self) -> &str {
        "noop-conversion"
    }

    fn display_name(&self) -> &str {
        "No-op Conversion"
    }
}

#[async_trait]
impl ConversionPlugin for NoopConversionPlugin {
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
}

/// No-op tag processor: returns the tag set unchanged
pub struct NoopMetaTagsProcessorPlugin;

impl Plugin for NoopMetaTagsProcessorPlugin {
    fn id(&self) -> &str {
        "noop-metatags"
    }

    fn display_name(&self) -> &str {
        "No-op Tag Processor"
    }
}

#[async_trait]
impl MetaTagsProcessorPlugin for NoopMetaTagsProcessorPlugin {
    async fn process_meta_tags(
        &self,
        _directory: &DirectoryInfo,
        _file: &FileInfo,
        tags: Vec<MetaTag>,
        _cancel: &CancellationToken,
    ) -> OperationResult<Vec<MetaTag>> {
        OperationResult::ok(tags)
    }
}

/// No-op script plugin: reports success without spawning anything
pub struct NoopScriptPlugin;

impl Plugin for NoopScriptPlugin {
    fn id(&self) -> &str {
        "noop-script"
    }

    fn display_name(&self) -> &str {
        "No-op Script"
    }
}

#[async_trait]
impl ScriptPlugin for NoopScriptPlugin {
    async fn process(
        &self,
        _directory: &DirectoryInfo,
        _config: &IngestConfig,
        _cancel: &CancellationToken,
    ) -> OperationResult<bool> {
        OperationResult::ok(true)
    }
}

/// No-op validation plugin: everything passes
pub struct NoopValidationPlugin;

impl Plugin for NoopValidationPlugin {
    fn id(&self) -> &str {
        "noop-validation"
    }

    fn display_name(&self) -> &str {
        "No-op Validation"
    }
}

impl ValidationPlugin for NoopValidationPlugin {
    fn validate(&self, _album: &Album) -> ValidationResult {
        ValidationResult::valid()
    }
}
