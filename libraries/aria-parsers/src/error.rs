//! Error types for the format parsers

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not an ID3v2 tag: {0}")]
    NotId3(String),

    #[error("Truncated ID3v2 data at offset {0}")]
    TruncatedTag(usize),

    #[error("Frame {id} not found")]
    FrameNotFound { id: String },

    #[error("Value for frame {id} is {value_len} bytes but the frame body holds {body_len}")]
    FrameValueTooLong {
        id: String,
        value_len: usize,
        body_len: usize,
    },

    #[error("Invalid CUE sheet: {0}")]
    InvalidCue(String),

    #[error("NFO error: {0}")]
    Nfo(String),
}
