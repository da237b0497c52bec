//! Error types for the ingestion pipeline

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("External process failed: {0}")]
    Process(String),

    #[error("Processing cancelled")]
    Cancelled,
}
