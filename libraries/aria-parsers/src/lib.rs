//! Format parsers for the ingestion pipeline
//!
//! - `cue`: line-oriented CUE sheet parser producing a `CueSheet` that
//!   converts into an album
//! - `nfo`: vendor NFO dialect handler chain (first match consumes)
//! - `id3`: manual ID3v2 binary tag reader and in-place frame writer

mod error;

pub mod cue;
pub mod id3;
pub mod nfo;

pub use error::ParseError;

/// Re-export commonly used types
pub type Result<T> = std::result::Result<T, ParseError>;
