//! Multi-provider music metadata search
//!
//! Each provider is a plugin implementing one or more search capability
//! traits; the [`aggregator::SearchAggregator`] fans a query out to every
//! enabled provider concurrently, isolates provider failures, and merges
//! the surviving results by rank.
//!
//! - `musicbrainz`: artist and album (release-group) search, rate limited
//! - `itunes`: album cover and artist top-songs search
//! - `audiodb`: artist image search
//! - `aggregator`: fan-out, failure isolation, and an LRU query cache

mod error;

pub mod aggregator;
pub mod audiodb;
pub mod itunes;
pub mod musicbrainz;

pub use aggregator::{SearchAggregator, SearchEngineSet};
pub use error::SearchError;

/// Re-export commonly used types
pub type Result<T> = std::result::Result<T, SearchError>;
