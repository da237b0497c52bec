//! Aria core types and plugin contracts
//!
//! This crate defines the shared data model of the ingestion pipeline
//! (tags, albums, result envelopes, filesystem descriptors, search
//! results) plus the plugin capability traits and the ordered registry
//! every other crate builds on.
//!
//! # Architecture
//!
//! - `types`: the data model (albums, tags, songs, envelopes, search results)
//! - `plugin`: capability traits, no-op variants, and the ordered registry
//! - `config`: the flat ingestion configuration with documented defaults
//! - `error`: the core error type

pub mod config;
mod error;
pub mod plugin;
pub mod types;

pub use config::IngestConfig;
pub use error::AriaError;

/// Re-export commonly used types
pub type Result<T> = std::result::Result<T, AriaError>;
