//! Search aggregation
//!
//! Fans one query out to every enabled provider of a capability
//! concurrently and merges the results by rank. A provider failure is
//! recorded in the envelope's error list but never suppresses the other
//! providers' results. Fully successful answers are kept in an LRU
//! cache keyed by capability, query, and page size.

use crate::audiodb::AudioDbSearchPlugin;
use crate::itunes::ItunesSearchPlugin;
use crate::musicbrainz::MusicBrainzSearchPlugin;
use aria_core::plugin::{
    AlbumImageSearchEnginePlugin, AlbumSearchEnginePlugin, ArtistImageSearchEnginePlugin,
    ArtistSearchEnginePlugin, ArtistTopSongsSearchEnginePlugin, PluginRegistry,
};
use aria_core::types::{
    AlbumSearchResult, ArtistSearchResult, ImageSearchResult, OperationResult, PagedRequest,
    PagedResult, SongSearchResult,
};
use aria_core::IngestConfig;
use futures::future;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

const CACHE_CAPACITY: usize = 256;

/// Providers registered per search capability
pub struct SearchEngineSet {
    pub artists: PluginRegistry<dyn ArtistSearchEnginePlugin>,
    pub albums: PluginRegistry<dyn AlbumSearchEnginePlugin>,
    pub album_images: PluginRegistry<dyn AlbumImageSearchEnginePlugin>,
    pub artist_images: PluginRegistry<dyn ArtistImageSearchEnginePlugin>,
    pub artist_top_songs: PluginRegistry<dyn ArtistTopSongsSearchEnginePlugin>,
}

impl SearchEngineSet {
    /// A set with no providers registered
    pub fn empty() -> Self {
        Self {
            artists: PluginRegistry::new(),
            albums: PluginRegistry::new(),
            album_images: PluginRegistry::new(),
            artist_images: PluginRegistry::new(),
            artist_top_songs: PluginRegistry::new(),
        }
    }

    /// The built-in provider lineup
    pub fn standard() -> crate::Result<Self> {
        let mut set = Self::empty();

        let musicbrainz = Arc::new(MusicBrainzSearchPlugin::new()?);
        set.artists.register(musicbrainz.clone());
        set.albums.register(musicbrainz);

        let itunes = Arc::new(ItunesSearchPlugin::new()?);
        set.album_images.register(itunes.clone());
        set.artist_top_songs.register(itunes);

        set.artist_images
            .register(Arc::new(AudioDbSearchPlugin::new()?));

        Ok(set)
    }
}

#[derive(Clone)]
enum CachedEntry {
    Artists(Vec<ArtistSearchResult>),
    Albums(Vec<AlbumSearchResult>),
    Images(Vec<ImageSearchResult>),
    Songs(Vec<SongSearchResult>),
}

/// Fan-out query front for all registered search providers
pub struct SearchAggregator {
    engines: SearchEngineSet,
    cache: Mutex<LruCache<String, CachedEntry>>,
}

impl SearchAggregator {
    pub fn new(engines: SearchEngineSet) -> Self {
        let capacity = NonZeroUsize::new(CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            engines,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Aggregator over the built-in provider lineup
    pub fn standard() -> crate::Result<Self> {
        Ok(Self::new(SearchEngineSet::standard()?))
    }

    fn cache_get(&self, key: &str) -> Option<CachedEntry> {
        self.cache.lock().ok()?.get(key).cloned()
    }

    fn cache_put(&self, key: String, entry: CachedEntry) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key, entry);
        }
    }

    /// Search all enabled artist providers
    pub async fn search_artists(
        &self,
        query: &str,
        max_results: usize,
        config: &IngestConfig,
        cancel: &CancellationToken,
    ) -> PagedResult<ArtistSearchResult> {
        let key = format!("artists:{max_results}:{}", query.to_lowercase());
        if let Some(CachedEntry::Artists(items)) = self.cache_get(&key) {
            tracing::debug!("Artist search cache hit for '{query}'");
            let total = items.len();
            return PagedResult::ok(items, total, &PagedRequest::take_only(max_results));
        }

        let engines = self.engines.artists.enabled(config);
        let outcomes = future::join_all(
            engines
                .iter()
                .map(|e| e.do_artist_search(query, max_results, cancel)),
        )
        .await;

        let mut items = Vec::new();
        let mut errors = Vec::new();
        for (engine, outcome) in engines.iter().zip(outcomes) {
            if !outcome.is_success() {
                for error in &outcome.errors {
                    tracing::warn!("Artist search provider {} failed: {error}", engine.id());
                }
                errors.extend(outcome.errors);
            }
            items.extend(outcome.items);
        }
        items.sort_by(|a, b| b.rank.cmp(&a.rank));

        if errors.is_empty() {
            self.cache_put(key, CachedEntry::Artists(items.clone()));
        }
        let total = items.len();
        let mut result = PagedResult::ok(items, total, &PagedRequest::take_only(max_results));
        result.errors = errors;
        result
    }

    /// Search all enabled album providers
    pub async fn search_albums(
        &self,
        query: &str,
        max_results: usize,
        config: &IngestConfig,
        cancel: &CancellationToken,
    ) -> PagedResult<AlbumSearchResult> {
        let key = format!("albums:{max_results}:{}", query.to_lowercase());
        if let Some(CachedEntry::Albums(items)) = self.cache_get(&key) {
            tracing::debug!("Album search cache hit for '{query}'");
            let total = items.len();
            return PagedResult::ok(items, total, &PagedRequest::take_only(max_results));
        }

        let engines = self.engines.albums.enabled(config);
        let outcomes = future::join_all(
            engines
                .iter()
                .map(|e| e.do_album_search(query, max_results, cancel)),
        )
        .await;

        let mut items = Vec::new();
        let mut errors = Vec::new();
        for (engine, outcome) in engines.iter().zip(outcomes) {
            if !outcome.is_success() {
                for error in &outcome.errors {
                    tracing::warn!("Album search provider {} failed: {error}", engine.id());
                }
                errors.extend(outcome.errors);
            }
            items.extend(outcome.items);
        }
        items.sort_by(|a, b| b.rank.cmp(&a.rank));

        if errors.is_empty() {
            self.cache_put(key, CachedEntry::Albums(items.clone()));
        }
        let total = items.len();
        let mut result = PagedResult::ok(items, total, &PagedRequest::take_only(max_results));
        result.errors = errors;
        result
    }

    /// Search all enabled album cover providers
    pub async fn search_album_images(
        &self,
        query: &str,
        max_results: usize,
        config: &IngestConfig,
        cancel: &CancellationToken,
    ) -> OperationResult<Vec<ImageSearchResult>> {
        let key = format!("album-images:{max_results}:{}", query.to_lowercase());
        if let Some(CachedEntry::Images(items)) = self.cache_get(&key) {
            return OperationResult::ok(items);
        }

        let engines = self.engines.album_images.enabled(config);
        let outcomes = future::join_all(
            engines
                .iter()
                .map(|e| e.do_album_image_search(query, max_results, cancel)),
        )
        .await;
        self.merge_image_outcomes(key, engines.iter().map(|e| e.id().to_string()), outcomes)
    }

    /// Search all enabled artist image providers
    pub async fn search_artist_images(
        &self,
        query: &str,
        max_results: usize,
        config: &IngestConfig,
        cancel: &CancellationToken,
    ) -> OperationResult<Vec<ImageSearchResult>> {
        let key = format!("artist-images:{max_results}:{}", query.to_lowercase());
        if let Some(CachedEntry::Images(items)) = self.cache_get(&key) {
            return OperationResult::ok(items);
        }

        let engines = self.engines.artist_images.enabled(config);
        let outcomes = future::join_all(
            engines
                .iter()
                .map(|e| e.do_artist_image_search(query, max_results, cancel)),
        )
        .await;
        self.merge_image_outcomes(key, engines.iter().map(|e| e.id().to_string()), outcomes)
    }

    /// Search all enabled top-songs providers
    pub async fn search_artist_top_songs(
        &self,
        artist: &str,
        max_results: usize,
        config: &IngestConfig,
        cancel: &CancellationToken,
    ) -> OperationResult<Vec<SongSearchResult>> {
        let key = format!("top-songs:{max_results}:{}", artist.to_lowercase());
        if let Some(CachedEntry::Songs(items)) = self.cache_get(&key) {
            return OperationResult::ok(items);
        }

        let engines = self.engines.artist_top_songs.enabled(config);
        let outcomes = future::join_all(
            engines
                .iter()
                .map(|e| e.do_artist_top_songs_search(artist, max_results, cancel)),
        )
        .await;

        let mut items = Vec::new();
        let mut errors = Vec::new();
        for (engine, outcome) in engines.iter().zip(outcomes) {
            if !outcome.is_success() {
                for error in &outcome.errors {
                    tracing::warn!("Top-songs provider {} failed: {error}", engine.id());
                }
                errors.extend(outcome.errors);
            }
            items.extend(outcome.data.unwrap_or_default());
        }
        items.sort_by(|a, b| b.rank.cmp(&a.rank));

        if errors.is_empty() {
            self.cache_put(key, CachedEntry::Songs(items.clone()));
        }
        OperationResult {
            data: Some(items),
            errors,
        }
    }

    fn merge_image_outcomes(
        &self,
        key: String,
        engine_ids: impl Iterator<Item = String>,
        outcomes: Vec<OperationResult<Vec<ImageSearchResult>>>,
    ) -> OperationResult<Vec<ImageSearchResult>> {
        let mut items = Vec::new();
        let mut errors = Vec::new();
        for (engine_id, outcome) in engine_ids.zip(outcomes) {
            if !outcome.is_success() {
                for error in &outcome.errors {
                    tracing::warn!("Image search provider {engine_id} failed: {error}");
                }
                errors.extend(outcome.errors);
            }
            items.extend(outcome.data.unwrap_or_default());
        }
        items.sort_by(|a, b| b.rank.cmp(&a.rank));

        if errors.is_empty() {
            self.cache_put(key, CachedEntry::Images(items.clone()));
        }
        OperationResult {
            data: Some(items),
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aria_core::plugin::Plugin;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticArtistEngine {
        id: &'static str,
        rank: i32,
        fails: bool,
        calls: AtomicUsize,
    }

    impl StaticArtistEngine {
        fn new(id: &'static str, rank: i32, fails: bool) -> Arc<Self> {
            Arc::new(Self {
                id,
                rank,
                fails,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl Plugin for StaticArtistEngine {
        fn id(&self) -> &str {
            self.id
        }

        fn display_name(&self) -> &str {
            self.id
        }
    }

    #[async_trait]
    impl ArtistSearchEnginePlugin for StaticArtistEngine {
        async fn do_artist_search(
            &self,
            query: &str,
            max_results: usize,
            _cancel: &CancellationToken,
        ) -> PagedResult<ArtistSearchResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fails {
                return PagedResult::error(format!("{} is down", self.id));
            }
            let items = vec![ArtistSearchResult {
                from_plugin: self.id.to_string(),
                rank: self.rank,
                name: format!("{query} ({})", self.id),
                sort_name: None,
                musicbrainz_id: None,
                itunes_id: None,
                audiodb_id: None,
                image_urls: Vec::new(),
            }];
            PagedResult::ok(items, 1, &PagedRequest::take_only(max_results))
        }
    }

    fn aggregator_with(engines: &[Arc<StaticArtistEngine>]) -> SearchAggregator {
        let mut set = SearchEngineSet::empty();
        for engine in engines {
            set.artists.register(engine.clone());
        }
        SearchAggregator::new(set)
    }

    #[tokio::test]
    async fn failing_provider_does_not_suppress_the_others() {
        let good_one = StaticArtistEngine::new("one", 90, false);
        let broken = StaticArtistEngine::new("broken", 0, true);
        let good_two = StaticArtistEngine::new("two", 100, false);
        let aggregator =
            aggregator_with(&[good_one.clone(), broken.clone(), good_two.clone()]);

        let result = aggregator
            .search_artists(
                "aphex twin",
                10,
                &IngestConfig::default(),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("broken"));

        let plugins: Vec<&str> = result
            .items
            .iter()
            .map(|r| r.from_plugin.as_str())
            .collect();
        // merged by rank, every surviving provider tagged
        assert_eq!(plugins, vec!["two", "one"]);
    }

    #[tokio::test]
    async fn repeated_query_is_served_from_cache() {
        let engine = StaticArtistEngine::new("one", 50, false);
        let aggregator = aggregator_with(&[engine.clone()]);
        let config = IngestConfig::default();
        let cancel = CancellationToken::new();

        let first = aggregator
            .search_artists("autechre", 10, &config, &cancel)
            .await;
        let second = aggregator
            .search_artists("autechre", 10, &config, &cancel)
            .await;

        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.items, second.items);
    }

    #[tokio::test]
    async fn failed_answers_are_not_cached() {
        let flaky = StaticArtistEngine::new("flaky", 0, true);
        let aggregator = aggregator_with(&[flaky.clone()]);
        let config = IngestConfig::default();
        let cancel = CancellationToken::new();

        aggregator.search_artists("orbital", 10, &config, &cancel).await;
        aggregator.search_artists("orbital", 10, &config, &cancel).await;

        assert_eq!(flaky.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn a_disabled_provider_is_never_consulted() {
        let engine = StaticArtistEngine::new("one", 50, false);
        let aggregator = aggregator_with(&[engine.clone()]);

        let mut config = IngestConfig::default();
        config.plugin_enabled.insert("one".to_string(), false);

        let result = aggregator
            .search_artists("plaid", 10, &config, &CancellationToken::new())
            .await;
        assert!(result.items.is_empty());
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn image_search_merges_providers_by_rank() {
        struct StaticImageEngine {
            id: &'static str,
            rank: i32,
        }

        impl Plugin for StaticImageEngine {
            fn id(&self) -> &str {
                self.id
            }

            fn display_name(&self) -> &str {
                self.id
            }
        }

        #[async_trait]
        impl AlbumImageSearchEnginePlugin for StaticImageEngine {
            async fn do_album_image_search(
                &self,
                _query: &str,
                _max_results: usize,
                _cancel: &CancellationToken,
            ) -> OperationResult<Vec<ImageSearchResult>> {
                OperationResult::ok(vec![ImageSearchResult {
                    from_plugin: self.id.to_string(),
                    rank: self.rank,
                    url: format!("https://example.org/{}.jpg", self.id),
                    width: None,
                    height: None,
                }])
            }
        }

        let mut set = SearchEngineSet::empty();
        set.album_images
            .register(Arc::new(StaticImageEngine { id: "low", rank: 1 }));
        set.album_images
            .register(Arc::new(StaticImageEngine { id: "high", rank: 9 }));
        let aggregator = SearchAggregator::new(set);

        let result = aggregator
            .search_album_images(
                "dead cities",
                5,
                &IngestConfig::default(),
                &CancellationToken::new(),
            )
            .await;
        assert!(result.is_success());
        let images = result.data.unwrap();
        assert_eq!(images[0].from_plugin, "high");
        assert_eq!(images[1].from_plugin, "low");
    }
}
