//! Aria ingestion pipeline
//!
//! Drives one inbound directory tree through discovery, script hooks,
//! conversion plugins, metadata-tag plugins, and validation, producing
//! normalized `Album` aggregates.
//!
//! # Architecture
//!
//! - `discovery`: recursive walk producing paged, counted directory descriptors
//! - `convert`: image → JPEG and audio → MP3 conversion plugins
//! - `scripts`: pre/post external script hook plugins
//! - `tags`: embedded-tag extraction and tag-processor plugins
//! - `validation`: album status and needs-attention computation
//! - `pipeline`: the per-directory state machine and batch orchestration

mod error;

pub mod convert;
pub mod discovery;
pub mod pipeline;
pub mod scripts;
pub mod tags;
pub mod validation;

pub use error::IngestError;
pub use pipeline::{PipelineOrchestrator, ProcessSummary};

/// Re-export commonly used types
pub type Result<T> = std::result::Result<T, IngestError>;
